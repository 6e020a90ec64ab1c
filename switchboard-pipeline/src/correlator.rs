//! Correlates delegated action calls with the peer's out-of-band replies.
//!
//! The execution id is the only link between a request sent now and a reply
//! that may arrive late, out of order, or never. Each in-flight call is an
//! explicit [`DelegatedExecution`] entry in the pending map; removing the
//! entry is the single point of settlement, so a call resolves or rejects
//! exactly once no matter how completion, timeout, and disconnect interleave.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex};
use tokio::time::Instant;

use switchboard_core::action::ActionResult;
use switchboard_core::error::DelegationError;
use switchboard_core::wire::PeerMessage;

use crate::channel::PeerChannel;

type Settled = Result<ActionResult, DelegationError>;

/// An in-flight delegated call. Exactly one of completion, timeout, or
/// peer-disconnect removes it from the map and settles `resolve`.
struct DelegatedExecution {
    action_name: String,
    created_at: Instant,
    deadline: Duration,
    resolve: oneshot::Sender<Settled>,
    timer: tokio::task::JoinHandle<()>,
}

pub struct RemoteCorrelator {
    channel: Arc<dyn PeerChannel>,
    /// Disambiguates ids across correlator instances in one process.
    instance_id: uuid::Uuid,
    next_seq: AtomicU64,
    default_deadline: Duration,
    pending: Mutex<HashMap<String, DelegatedExecution>>,
}

impl RemoteCorrelator {
    pub fn new(channel: Arc<dyn PeerChannel>, default_deadline: Duration) -> Self {
        Self {
            channel,
            instance_id: uuid::Uuid::new_v4(),
            next_seq: AtomicU64::new(1),
            default_deadline,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Delegate one action to the peer and await its result, bounded by the
    /// default deadline.
    pub async fn call(
        self: &Arc<Self>,
        action_name: &str,
        args: serde_json::Value,
    ) -> Result<ActionResult, DelegationError> {
        self.call_with_deadline(action_name, args, self.default_deadline)
            .await
    }

    pub async fn call_with_deadline(
        self: &Arc<Self>,
        action_name: &str,
        args: serde_json::Value,
        deadline: Duration,
    ) -> Result<ActionResult, DelegationError> {
        let (execution_id, rx) = self
            .begin_delegated_call(action_name, args, deadline)
            .await?;
        match rx.await {
            Ok(settled) => settled,
            // Correlator dropped while the call was outstanding.
            Err(_) => Err(DelegationError::PeerDisconnected { execution_id }),
        }
    }

    /// Record a pending entry, emit the outbound `execute-action`, and arm
    /// the deadline timer. The entry is recorded before the request leaves
    /// the process, so a reply can never precede its bookkeeping.
    pub async fn begin_delegated_call(
        self: &Arc<Self>,
        action_name: &str,
        args: serde_json::Value,
        deadline: Duration,
    ) -> Result<(String, oneshot::Receiver<Settled>), DelegationError> {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let execution_id = format!("{}-{seq}", self.instance_id.simple());
        let (resolve, rx) = oneshot::channel();

        {
            let mut pending = self.pending.lock().await;
            let timer = tokio::spawn({
                let this = Arc::clone(self);
                let execution_id = execution_id.clone();
                async move {
                    tokio::time::sleep(deadline).await;
                    this.expire(&execution_id).await;
                }
            });
            pending.insert(
                execution_id.clone(),
                DelegatedExecution {
                    action_name: action_name.to_string(),
                    created_at: Instant::now(),
                    deadline,
                    resolve,
                    timer,
                },
            );
        }

        tracing::debug!(
            execution_id = %execution_id,
            action = action_name,
            "delegated_call_started"
        );

        let outbound = PeerMessage::ExecuteAction {
            execution_id: execution_id.clone(),
            action_name: action_name.to_string(),
            args,
        };
        if let Err(err) = self.channel.send(outbound).await {
            if let Some(entry) = self.take(&execution_id).await {
                entry.timer.abort();
            }
            tracing::warn!(
                execution_id = %execution_id,
                error = %err,
                "delegated_call_send_failed"
            );
            return Err(DelegationError::PeerDisconnected { execution_id });
        }

        Ok((execution_id, rx))
    }

    /// Resolve the matching pending call. Unknown, duplicate, or post-timeout
    /// ids are silently discarded: a late reply must not resurrect a call
    /// whose outcome already settled.
    pub async fn complete_delegated_call(&self, execution_id: &str, result: ActionResult) -> bool {
        let Some(entry) = self.take(execution_id).await else {
            tracing::debug!(
                execution_id = execution_id,
                "discarding completion for unknown or settled execution"
            );
            return false;
        };

        entry.timer.abort();
        tracing::debug!(
            execution_id = execution_id,
            action = %entry.action_name,
            success = result.success,
            elapsed_ms = entry.created_at.elapsed().as_millis() as u64,
            "delegated_call_completed"
        );
        let _ = entry.resolve.send(Ok(result));
        true
    }

    /// Reject every outstanding call, bypassing deadline timers. Used on
    /// peer disconnect and on session-level cancellation.
    pub async fn fail_all_peer_disconnected(&self) {
        let drained: Vec<(String, DelegatedExecution)> = {
            let mut pending = self.pending.lock().await;
            pending.drain().collect()
        };
        if drained.is_empty() {
            return;
        }

        tracing::warn!(count = drained.len(), "rejecting_outstanding_delegated_calls");
        for (execution_id, entry) in drained {
            entry.timer.abort();
            let _ = entry
                .resolve
                .send(Err(DelegationError::PeerDisconnected { execution_id }));
        }
    }

    pub async fn outstanding(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Deadline timer body: reject the call if it is still pending.
    async fn expire(&self, execution_id: &str) {
        let Some(entry) = self.take(execution_id).await else {
            return;
        };

        tracing::warn!(
            execution_id = execution_id,
            action = %entry.action_name,
            deadline_ms = entry.deadline.as_millis() as u64,
            "delegated_call_timed_out"
        );
        let _ = entry.resolve.send(Err(DelegationError::Timeout {
            execution_id: execution_id.to_string(),
            deadline: entry.deadline,
        }));
    }

    async fn take(&self, execution_id: &str) -> Option<DelegatedExecution> {
        self.pending.lock().await.remove(execution_id)
    }
}

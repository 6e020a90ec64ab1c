//! Duplex channel boundary with the remote execution peer.
//!
//! Outbound traffic goes through [`PeerChannel::send`]; inbound traffic is
//! consumed by a single subscriber, the result router, which translates
//! `action-result` messages into correlator completions.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use switchboard_core::action::ActionResult;
use switchboard_core::error::ChannelClosed;
use switchboard_core::wire::PeerMessage;

use crate::correlator::RemoteCorrelator;

#[async_trait]
pub trait PeerChannel: Send + Sync {
    async fn send(&self, message: PeerMessage) -> Result<(), ChannelClosed>;
}

/// In-process channel half backed by a tokio mpsc sender. The transport that
/// feeds the real UI process (WebSocket, stdio, ...) lives outside this crate;
/// it only has to drain the paired receiver.
pub struct MpscPeerChannel {
    tx: mpsc::Sender<PeerMessage>,
}

impl MpscPeerChannel {
    pub fn new(tx: mpsc::Sender<PeerMessage>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl PeerChannel for MpscPeerChannel {
    async fn send(&self, message: PeerMessage) -> Result<(), ChannelClosed> {
        self.tx
            .send(message)
            .await
            .map_err(|err| ChannelClosed(err.to_string()))
    }
}

/// Spawn the sole inbound subscriber: forwards `action-result` messages to
/// the correlator and rejects every outstanding call once the peer stream
/// closes.
pub fn spawn_result_router(
    correlator: Arc<RemoteCorrelator>,
    mut inbound: mpsc::Receiver<PeerMessage>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = inbound.recv().await {
            match message {
                PeerMessage::ActionResult {
                    execution_id,
                    success,
                    result,
                    error,
                } => {
                    let outcome = if success {
                        ActionResult::ok(result.unwrap_or(serde_json::Value::Null))
                    } else {
                        ActionResult::fail(
                            error.unwrap_or_else(|| "peer reported failure".to_string()),
                        )
                    };
                    correlator
                        .complete_delegated_call(&execution_id, outcome)
                        .await;
                }
                other => {
                    tracing::warn!(message = ?other, "ignoring unexpected inbound peer message");
                }
            }
        }

        tracing::warn!("peer channel closed, rejecting outstanding delegated calls");
        correlator.fail_all_peer_disconnected().await;
    })
}

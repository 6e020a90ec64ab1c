//! Per-session pipeline: Decision → (action dispatch) → Conversation.

use std::sync::Arc;
use std::time::Instant;

use switchboard_core::action::ActionResult;
use switchboard_core::error::SwitchboardError;
use switchboard_core::turn::{ConversationTurn, SessionState};

use crate::registry::ActionRegistry;
use crate::stage::{ConversationStage, DecisionStage};

/// Owns one conversation's history and sequences the pipeline for each
/// inbound utterance. `&mut self` on [`handle_utterance`] enforces the
/// one-utterance-at-a-time contract per session; callers with concurrent
/// input must queue or reject it themselves.
///
/// [`handle_utterance`]: SessionOrchestrator::handle_utterance
pub struct SessionOrchestrator {
    session: SessionState,
    decision: DecisionStage,
    conversation: ConversationStage,
    registry: Arc<ActionRegistry>,
}

impl SessionOrchestrator {
    pub fn new(
        session: SessionState,
        decision: DecisionStage,
        conversation: ConversationStage,
        registry: Arc<ActionRegistry>,
    ) -> Self {
        Self {
            session,
            decision,
            conversation,
            registry,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Process one utterance and return the agent's reply.
    ///
    /// Backend failure in either stage propagates to the caller; the user
    /// turn appended in step 1 is retained so the history reflects what was
    /// actually asked. Action-level failures never abort the turn; they
    /// arrive at the conversation stage as failed outcomes to narrate.
    pub async fn handle_utterance(&mut self, text: &str) -> Result<String, SwitchboardError> {
        let turn_id = uuid::Uuid::new_v4();
        let started_at = Instant::now();
        tracing::info!(
            session_id = %self.session.session_id,
            turn_id = %turn_id,
            utterance_chars = text.len(),
            "turn_started"
        );

        self.session.push_turn(ConversationTurn::user(text));

        let actions = self.decision.decide(&self.session).await?;

        let reply = if actions.is_empty() {
            self.conversation.reply(&self.session, None).await?
        } else {
            // Dispatch sequentially: outcome order is request order, not
            // completion order.
            let mut outcomes = Vec::with_capacity(actions.len());
            for request in &actions {
                tracing::debug!(
                    session_id = %self.session.session_id,
                    turn_id = %turn_id,
                    action = %request.name,
                    "dispatching_action"
                );
                let result = self.registry.dispatch(request).await;
                outcomes.push((request.name.clone(), result));
            }

            let context = summarize_outcomes(&outcomes);
            self.conversation.reply(&self.session, Some(&context)).await?
        };

        self.session.push_turn(ConversationTurn::agent(reply.clone()));
        self.session.apply_retention();

        tracing::info!(
            session_id = %self.session.session_id,
            turn_id = %turn_id,
            duration_ms = started_at.elapsed().as_millis() as u64,
            "turn_finished"
        );
        Ok(reply)
    }
}

/// Synthetic context turn describing action outcomes, in request order.
fn summarize_outcomes(outcomes: &[(String, ActionResult)]) -> String {
    let body = outcomes
        .iter()
        .map(|(name, result)| {
            if result.success {
                format!("{name}: completed ({})", result.payload)
            } else {
                format!(
                    "{name}: failed ({})",
                    result.error.as_deref().unwrap_or("unknown error")
                )
            }
        })
        .collect::<Vec<_>>()
        .join("; ");
    format!("[action outcomes] {body}")
}

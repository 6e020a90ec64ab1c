//! The two inference stages. Router mode decides whether actions are needed;
//! responder mode produces the natural-language reply.

use std::sync::Arc;

use switchboard_core::action::{ActionRequest, ActionSpec};
use switchboard_core::error::BackendError;
use switchboard_core::turn::{ConversationTurn, SessionState};

use crate::backend::ChatBackend;

/// Router-mode stage: given the running conversation and the registered
/// action specs, returns zero or more requested actions. An empty list is
/// the normal conversational path.
pub struct DecisionStage {
    backend: Arc<dyn ChatBackend>,
    available_actions: Vec<ActionSpec>,
}

impl DecisionStage {
    pub fn new(backend: Arc<dyn ChatBackend>, available_actions: Vec<ActionSpec>) -> Self {
        Self {
            backend,
            available_actions,
        }
    }

    pub async fn decide(
        &self,
        session: &SessionState,
    ) -> Result<Vec<ActionRequest>, BackendError> {
        let reply = self
            .backend
            .chat(
                &session.system_instruction,
                session.turns(),
                Some(&self.available_actions),
            )
            .await?;

        tracing::debug!(
            session_id = %session.session_id,
            requested = reply.actions.len(),
            "decision_stage_completed"
        );
        Ok(reply.actions)
    }
}

/// Responder-mode stage: produces the final reply text, optionally
/// conditioned on a synthetic action-outcome context turn. The session
/// itself is never mutated here.
pub struct ConversationStage {
    backend: Arc<dyn ChatBackend>,
}

impl ConversationStage {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }

    pub async fn reply(
        &self,
        session: &SessionState,
        action_context: Option<&str>,
    ) -> Result<String, BackendError> {
        let reply = match action_context {
            Some(context) => {
                let mut turns = session.turns().to_vec();
                turns.push(ConversationTurn::user(context));
                self.backend
                    .chat(&session.system_instruction, &turns, None)
                    .await?
            }
            None => {
                self.backend
                    .chat(&session.system_instruction, session.turns(), None)
                    .await?
            }
        };

        reply
            .text
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| BackendError::InvalidResponse {
                reason: "conversation stage returned no text".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendReply, MockChatBackend};

    #[tokio::test]
    async fn decision_stage_returns_requested_actions() {
        let backend = Arc::new(MockChatBackend::scripted(vec![BackendReply {
            text: None,
            actions: vec![ActionRequest {
                name: "changeBackgroundColor".into(),
                args: serde_json::json!({"color": "blue"}),
                call_id: None,
            }],
        }]));
        let stage = DecisionStage::new(backend, Vec::new());
        let session = SessionState::new("router", 40);

        let actions = stage.decide(&session).await.unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name, "changeBackgroundColor");
        assert!(session.turns().is_empty());
    }

    #[tokio::test]
    async fn conversation_stage_rejects_empty_text() {
        let backend = Arc::new(MockChatBackend::scripted(vec![BackendReply {
            text: None,
            actions: Vec::new(),
        }]));
        let stage = ConversationStage::new(backend);
        let session = SessionState::new("responder", 40);

        let err = stage.reply(&session, None).await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidResponse { .. }));
    }
}

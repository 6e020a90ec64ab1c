//! Model backend boundary: `chat(turns, available_actions?) -> {text, actions?}`.

use async_trait::async_trait;

use switchboard_core::action::{ActionRequest, ActionSpec};
use switchboard_core::error::BackendError;
use switchboard_core::turn::{ConversationTurn, TurnRole};

/// One backend completion. `actions` may be empty; that is the normal
/// conversational path, not an error.
#[derive(Debug, Clone)]
pub struct BackendReply {
    pub text: Option<String>,
    pub actions: Vec<ActionRequest>,
}

impl BackendReply {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            actions: Vec::new(),
        }
    }

    pub fn has_actions(&self) -> bool {
        !self.actions.is_empty()
    }
}

/// Abstraction over the model backend used by both pipeline stages.
/// `available_actions` is supplied only in router (decision) mode.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(
        &self,
        system_instruction: &str,
        turns: &[ConversationTurn],
        available_actions: Option<&[ActionSpec]>,
    ) -> Result<BackendReply, BackendError>;
}

/// A ChatBackend backed by a rig CompletionModel.
pub struct RigChatBackend<M: rig::completion::CompletionModel> {
    model: M,
}

impl<M: rig::completion::CompletionModel> RigChatBackend<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }
}

#[async_trait]
impl<M> ChatBackend for RigChatBackend<M>
where
    M: rig::completion::CompletionModel + Send + Sync + 'static,
    M::Response: Send + Sync,
{
    async fn chat(
        &self,
        system_instruction: &str,
        turns: &[ConversationTurn],
        available_actions: Option<&[ActionSpec]>,
    ) -> Result<BackendReply, BackendError> {
        let (prompt, history) = split_prompt_and_history(turns);
        let definitions = available_actions
            .map(specs_to_rig_definitions)
            .unwrap_or_default();

        let request = self
            .model
            .completion_request(prompt)
            .preamble(system_instruction.to_string())
            .messages(history)
            .tools(definitions)
            .build();

        let response = self
            .model
            .completion(request)
            .await
            .map_err(|e| BackendError::Unreachable {
                reason: e.to_string(),
            })?;

        let mut text = None;
        let mut actions = Vec::new();
        for content in response.choice.iter() {
            match content {
                rig::message::AssistantContent::Text(t) => {
                    text = Some(t.text.clone());
                }
                rig::message::AssistantContent::ToolCall(tc) => {
                    actions.push(ActionRequest {
                        name: tc.function.name.clone(),
                        args: tc.function.arguments.clone(),
                        call_id: Some(tc.id.clone()),
                    });
                }
                _ => {} // reasoning and other content kinds are not part of this boundary
            }
        }

        Ok(BackendReply { text, actions })
    }
}

/// The most recent user turn becomes the prompt; everything before it is
/// chat history.
fn split_prompt_and_history(
    turns: &[ConversationTurn],
) -> (String, Vec<rig::completion::Message>) {
    let split_at = match turns.last() {
        Some(last) if last.role == TurnRole::User => turns.len() - 1,
        _ => turns.len(),
    };

    let prompt = turns
        .get(split_at)
        .map(|turn| turn.text.clone())
        .unwrap_or_default();

    let history = turns[..split_at]
        .iter()
        .map(|turn| match turn.role {
            TurnRole::User => rig::completion::Message::user(turn.text.clone()),
            TurnRole::Agent => rig::completion::Message::assistant(turn.text.clone()),
        })
        .collect();

    (prompt, history)
}

fn specs_to_rig_definitions(specs: &[ActionSpec]) -> Vec<rig::completion::ToolDefinition> {
    specs
        .iter()
        .map(|spec| rig::completion::ToolDefinition {
            name: spec.name.clone(),
            description: spec.description.clone(),
            parameters: spec.parameters_schema.clone(),
        })
        .collect()
}

/// Scripted backend for tests. Items are consumed in order; once exhausted,
/// a plain text reply is returned.
pub struct MockChatBackend {
    items: std::sync::Mutex<Vec<Result<BackendReply, BackendError>>>,
}

impl MockChatBackend {
    pub fn new(items: Vec<Result<BackendReply, BackendError>>) -> Self {
        Self {
            items: std::sync::Mutex::new(items),
        }
    }

    pub fn scripted(replies: Vec<BackendReply>) -> Self {
        Self::new(replies.into_iter().map(Ok).collect())
    }
}

#[async_trait]
impl ChatBackend for MockChatBackend {
    async fn chat(
        &self,
        _system_instruction: &str,
        _turns: &[ConversationTurn],
        _available_actions: Option<&[ActionSpec]>,
    ) -> Result<BackendReply, BackendError> {
        let mut items = self.items.lock().expect("mock backend lock");
        if items.is_empty() {
            Ok(BackendReply::text_only("no more scripted replies"))
        } else {
            items.remove(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_uses_last_user_turn_as_prompt() {
        let turns = vec![
            ConversationTurn::user("first"),
            ConversationTurn::agent("reply"),
            ConversationTurn::user("what now"),
        ];
        let (prompt, history) = split_prompt_and_history(&turns);
        assert_eq!(prompt, "what now");
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn split_keeps_everything_in_history_when_last_turn_is_agent() {
        let turns = vec![
            ConversationTurn::user("question"),
            ConversationTurn::agent("answer"),
        ];
        let (prompt, history) = split_prompt_and_history(&turns);
        assert_eq!(prompt, "");
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn mock_backend_consumes_items_in_order() {
        let backend = MockChatBackend::scripted(vec![
            BackendReply::text_only("one"),
            BackendReply::text_only("two"),
        ]);
        let first = backend.chat("sys", &[], None).await.unwrap();
        let second = backend.chat("sys", &[], None).await.unwrap();
        assert_eq!(first.text.as_deref(), Some("one"));
        assert_eq!(second.text.as_deref(), Some("two"));
    }
}

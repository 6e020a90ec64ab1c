//! Action registry: named bindings that either run in-process or delegate
//! to the remote peer. Adding an action is a registration, not a new branch.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use switchboard_core::action::{ActionRequest, ActionResult, ActionSpec};
use switchboard_core::error::ActionError;

use crate::correlator::RemoteCorrelator;

/// An in-process action handler. Errors are returned as messages and never
/// escape the registry boundary.
#[async_trait]
pub trait LocalAction: Send + Sync {
    async fn run(&self, args: serde_json::Value) -> Result<serde_json::Value, String>;
}

enum ActionBinding {
    Local(Arc<dyn LocalAction>),
    Delegated,
}

struct RegisteredAction {
    spec: ActionSpec,
    binding: ActionBinding,
}

pub struct ActionRegistry {
    actions: HashMap<String, RegisteredAction>,
    correlator: Arc<RemoteCorrelator>,
}

impl ActionRegistry {
    pub fn new(correlator: Arc<RemoteCorrelator>) -> Self {
        Self {
            actions: HashMap::new(),
            correlator,
        }
    }

    pub fn register_local(&mut self, spec: ActionSpec, handler: Arc<dyn LocalAction>) {
        self.actions.insert(
            spec.name.clone(),
            RegisteredAction {
                spec,
                binding: ActionBinding::Local(handler),
            },
        );
    }

    pub fn register_delegated(&mut self, spec: ActionSpec) {
        self.actions.insert(
            spec.name.clone(),
            RegisteredAction {
                spec,
                binding: ActionBinding::Delegated,
            },
        );
    }

    /// Specs advertised to the decision backend.
    pub fn specs(&self) -> Vec<ActionSpec> {
        self.actions
            .values()
            .map(|registered| registered.spec.clone())
            .collect()
    }

    /// Execute one requested action. Every failure mode (unknown name,
    /// invalid arguments, handler error, delegation timeout or disconnect)
    /// degrades to a failed `ActionResult` so the turn can narrate it.
    pub async fn dispatch(&self, request: &ActionRequest) -> ActionResult {
        let Some(registered) = self.actions.get(&request.name) else {
            tracing::warn!(action = %request.name, "unknown_action_requested");
            return ActionResult::fail(
                ActionError::UnknownAction {
                    name: request.name.clone(),
                }
                .to_string(),
            );
        };

        if let Err(reason) = validate_args(&registered.spec, &request.args) {
            tracing::warn!(action = %request.name, reason = %reason, "invalid_action_arguments");
            return ActionResult::fail(
                ActionError::InvalidArguments {
                    name: request.name.clone(),
                    reason,
                }
                .to_string(),
            );
        }

        match &registered.binding {
            ActionBinding::Local(handler) => match handler.run(request.args.clone()).await {
                Ok(payload) => ActionResult::ok(payload),
                Err(message) => ActionResult::fail(message),
            },
            ActionBinding::Delegated => {
                match self.correlator.call(&request.name, request.args.clone()).await {
                    Ok(result) => result,
                    Err(err) => ActionResult::fail(err.to_string()),
                }
            }
        }
    }
}

/// Check required fields and declared primitive kinds against the action's
/// parameter schema before any handler sees the arguments.
fn validate_args(spec: &ActionSpec, args: &serde_json::Value) -> Result<(), String> {
    let Some(schema) = spec.parameters_schema.as_object() else {
        return Ok(());
    };

    let required: Vec<&str> = schema
        .get("required")
        .and_then(|value| value.as_array())
        .map(|names| names.iter().filter_map(|name| name.as_str()).collect())
        .unwrap_or_default();

    let fields = match args.as_object() {
        Some(fields) => fields,
        None if required.is_empty() => return Ok(()),
        None => return Err("arguments must be an object".to_string()),
    };

    for name in &required {
        if !fields.contains_key(*name) {
            return Err(format!("missing required field '{name}'"));
        }
    }

    let Some(properties) = schema.get("properties").and_then(|value| value.as_object()) else {
        return Ok(());
    };
    for (name, value) in fields {
        let Some(declared) = properties
            .get(name)
            .and_then(|prop| prop.get("type"))
            .and_then(|kind| kind.as_str())
        else {
            continue;
        };
        if !kind_matches(declared, value) {
            return Err(format!("field '{name}' must be of type {declared}"));
        }
    }

    Ok(())
}

fn kind_matches(declared: &str, value: &serde_json::Value) -> bool {
    match declared {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::channel::PeerChannel;
    use switchboard_core::error::ChannelClosed;
    use switchboard_core::wire::PeerMessage;

    struct SilentPeer;

    #[async_trait]
    impl PeerChannel for SilentPeer {
        async fn send(&self, _message: PeerMessage) -> Result<(), ChannelClosed> {
            Ok(())
        }
    }

    struct Echo;

    #[async_trait]
    impl LocalAction for Echo {
        async fn run(&self, args: serde_json::Value) -> Result<serde_json::Value, String> {
            Ok(serde_json::json!({ "echo": args }))
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl LocalAction for AlwaysFails {
        async fn run(&self, _args: serde_json::Value) -> Result<serde_json::Value, String> {
            Err("handler exploded".to_string())
        }
    }

    fn color_spec() -> ActionSpec {
        ActionSpec {
            name: "changeBackgroundColor".into(),
            description: "Change the UI background color".into(),
            parameters_schema: serde_json::json!({
                "type": "object",
                "properties": { "color": { "type": "string" } },
                "required": ["color"],
            }),
        }
    }

    fn registry_with_deadline(deadline: Duration) -> ActionRegistry {
        let correlator = Arc::new(RemoteCorrelator::new(Arc::new(SilentPeer), deadline));
        ActionRegistry::new(correlator)
    }

    fn request(name: &str, args: serde_json::Value) -> ActionRequest {
        ActionRequest {
            name: name.into(),
            args,
            call_id: None,
        }
    }

    #[tokio::test]
    async fn unknown_action_fails_without_dispatching() {
        let registry = registry_with_deadline(Duration::from_secs(10));
        let result = registry.dispatch(&request("warpDrive", serde_json::json!({}))).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("unknown action: warpDrive"));
    }

    #[tokio::test]
    async fn missing_required_field_short_circuits() {
        let mut registry = registry_with_deadline(Duration::from_secs(10));
        registry.register_delegated(color_spec());

        let result = registry
            .dispatch(&request("changeBackgroundColor", serde_json::json!({})))
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("missing required field 'color'"));
    }

    #[tokio::test]
    async fn wrong_field_kind_short_circuits() {
        let mut registry = registry_with_deadline(Duration::from_secs(10));
        registry.register_delegated(color_spec());

        let result = registry
            .dispatch(&request("changeBackgroundColor", serde_json::json!({"color": 7})))
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("must be of type string"));
    }

    #[tokio::test]
    async fn local_handler_success_passes_through() {
        let mut registry = registry_with_deadline(Duration::from_secs(10));
        registry.register_local(
            ActionSpec {
                name: "echo".into(),
                description: "echo args".into(),
                parameters_schema: serde_json::json!({"type": "object"}),
            },
            Arc::new(Echo),
        );

        let result = registry
            .dispatch(&request("echo", serde_json::json!({"n": 1})))
            .await;
        assert!(result.success);
        assert_eq!(result.payload, serde_json::json!({"echo": {"n": 1}}));
    }

    #[tokio::test]
    async fn local_handler_error_becomes_failed_result() {
        let mut registry = registry_with_deadline(Duration::from_secs(10));
        registry.register_local(
            ActionSpec {
                name: "boom".into(),
                description: "always fails".into(),
                parameters_schema: serde_json::json!({"type": "object"}),
            },
            Arc::new(AlwaysFails),
        );

        let result = registry.dispatch(&request("boom", serde_json::json!({}))).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("handler exploded"));
    }

    #[tokio::test(start_paused = true)]
    async fn delegated_timeout_becomes_failed_result() {
        let mut registry = registry_with_deadline(Duration::from_secs(1));
        registry.register_delegated(color_spec());

        let result = registry
            .dispatch(&request(
                "changeBackgroundColor",
                serde_json::json!({"color": "blue"}),
            ))
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("timed out"));
    }
}

use serde::{Deserialize, Serialize};

/// Specification of an action advertised to the decision backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionSpec {
    pub name: String,
    pub description: String,
    /// JSON-schema object describing the argument mapping.
    pub parameters_schema: serde_json::Value,
}

/// An action requested by the decision stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    pub name: String,
    pub args: serde_json::Value,
    /// Call id assigned by the model backend, when it provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
}

/// Terminal outcome of an action, local or delegated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    pub fn ok(payload: serde_json::Value) -> Self {
        Self {
            success: true,
            payload,
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: serde_json::Value::Null,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_result_carries_error_only() {
        let result = ActionResult::fail("unknown action: warp_drive");
        assert!(!result.success);
        assert_eq!(result.payload, serde_json::Value::Null);
        assert_eq!(result.error.as_deref(), Some("unknown action: warp_drive"));
    }
}

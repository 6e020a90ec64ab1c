use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Pipeline configuration loaded from TOML. File discovery and watching are
/// the host process's concern; this type only parses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Turn-count bound for session history retention.
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,

    /// Deadline for a single delegated peer call, in seconds.
    #[serde(default = "default_delegation_deadline_secs")]
    pub delegation_deadline_secs: u64,

    /// Model slot used in router mode.
    #[serde(default)]
    pub decision_model: Option<String>,

    /// Model slot used in responder mode.
    #[serde(default)]
    pub conversation_model: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_history_turns: default_max_history_turns(),
            delegation_deadline_secs: default_delegation_deadline_secs(),
            decision_model: None,
            conversation_model: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn delegation_deadline(&self) -> Duration {
        Duration::from_secs(self.delegation_deadline_secs)
    }
}

fn default_max_history_turns() -> usize {
    40
}

fn default_delegation_deadline_secs() -> u64 {
    10
}

//! Conversation turns and per-session history with bounded retention.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type SessionId = uuid::Uuid;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Agent,
}

/// One utterance in a session's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Agent,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Mutable context of one conversation. Exclusively owned by the session's
/// orchestrator; never shared across sessions.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub session_id: SessionId,
    pub system_instruction: String,
    turns: Vec<ConversationTurn>,
    max_turns: usize,
}

impl SessionState {
    pub fn new(system_instruction: impl Into<String>, max_turns: usize) -> Self {
        Self {
            session_id: SessionId::new_v4(),
            system_instruction: system_instruction.into(),
            turns: Vec::new(),
            max_turns,
        }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn push_turn(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    /// Drop oldest turns once the count exceeds the bound. The most recent
    /// turns survive in their original order.
    pub fn apply_retention(&mut self) {
        if self.turns.len() > self.max_turns {
            let excess = self.turns.len() - self.max_turns;
            self.turns.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retention_keeps_most_recent_turns_in_order() {
        let mut session = SessionState::new("sys", 4);
        for i in 0..5 {
            session.push_turn(ConversationTurn::user(format!("u{i}")));
            session.push_turn(ConversationTurn::agent(format!("a{i}")));
        }
        session.apply_retention();

        assert_eq!(session.turns().len(), 4);
        let texts: Vec<&str> = session.turns().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["u3", "a3", "u4", "a4"]);
    }

    #[test]
    fn retention_is_noop_under_bound() {
        let mut session = SessionState::new("sys", 10);
        session.push_turn(ConversationTurn::user("hello"));
        session.apply_retention();
        assert_eq!(session.turns().len(), 1);
    }
}

//! Assistant state values and the transitions allowed between them.

use serde::{Deserialize, Serialize};

/// Process-wide assistant state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssistantState {
    #[default]
    Idle,
    /// Capturing a spoken command.
    Listening,
    /// Waiting on the gateway (including tool execution).
    Thinking,
    /// Playing the synthesized reply.
    Speaking,
    /// Failed; recovers to `Idle` after a delay.
    Error,
}

impl AssistantState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Thinking => "thinking",
            Self::Speaking => "speaking",
            Self::Error => "error",
        }
    }

    pub fn is_idle(self) -> bool {
        self == Self::Idle
    }

    /// Whether the state machine permits `self -> next`.
    pub fn can_transition_to(self, next: Self) -> bool {
        use AssistantState::{Error, Idle, Listening, Speaking, Thinking};
        matches!(
            (self, next),
            (Idle, Listening)
                | (Listening, Thinking)
                | (Thinking, Speaking)
                | (Speaking, Idle)
                | (Listening | Thinking | Speaking, Error)
                | (Error, Idle)
                | (Listening | Thinking, Idle)
        )
    }
}

impl std::fmt::Display for AssistantState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

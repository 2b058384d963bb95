//! Turn-by-turn transcript of a realtime conversation.

use serde::Serialize;

/// One completed exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TranscriptTurn {
    pub user: String,
    pub model: String,
}

/// Session-local accumulators for the turn in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnAccumulator {
    input: String,
    output: String,
}

impl TurnAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_input(&mut self, fragment: &str) {
        self.input.push_str(fragment);
    }

    pub fn push_output(&mut self, fragment: &str) {
        self.output.push_str(fragment);
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    /// Close the turn: return its text and start empty.
    pub fn complete(&mut self) -> TranscriptTurn {
        TranscriptTurn {
            user: std::mem::take(&mut self.input),
            model: std::mem::take(&mut self.output),
        }
    }
}

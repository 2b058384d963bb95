//! Per-activation conversation history.

use crate::gateway::{FunctionCall, Turn};

/// Ordered turns of the current activation cycle. Cleared on every new cycle.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.turns.clear();
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::user(text));
    }

    pub fn push_model(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::model(text));
    }

    /// Record a dispatched call and its result as two distinct turns.
    pub fn push_function_round(&mut self, call: FunctionCall, result: serde_json::Value) {
        let name = call.name.clone();
        self.turns.push(Turn::function_call(call));
        self.turns.push(Turn::function_response(name, result));
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

//! Voice assistant: wake phrase, command capture, tool dispatch and speech.
//!
//! The flow for one activation cycle is
//! `idle -> listening -> thinking -> speaking -> idle`, with `error`
//! reachable from every active state. See [`AssistantCoordinator`].

mod coordinator;
mod history;
mod state;
pub mod tools;
mod wake;

pub use coordinator::{Activation, AssistantCoordinator, AssistantHandle};
pub use history::ConversationHistory;
pub use state::AssistantState;
pub use tools::{Tool, ToolContext, ToolRegistry, ToolResult};
pub use wake::find_wake_phrase;

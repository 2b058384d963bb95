//! Tools the assistant can call on the desktop.
//!
//! Each tool declares a name, a description and a JSON schema, and executes
//! against a [`ToolContext`]. The [`ToolRegistry`] maps model-issued function
//! names to tools, so adding a command never touches the dispatcher.

mod answer_question;
mod close_app;
mod create_folder;
mod open_app;
mod set_theme;

pub use answer_question::AnswerQuestionTool;
pub use close_app::CloseAppTool;
pub use create_folder::CreateFolderTool;
pub use open_app::OpenAppTool;
pub use set_theme::SetThemeTool;

use crate::desktop::Desktop;
use crate::error::{DesktopError, Result};
use crate::gateway::{AiGateway, ToolDefinition};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;

/// Outcome of a tool execution, reported back to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub success: bool,
    /// Confirmation text on success, explanation on failure.
    pub content: String,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            success: true,
            content: content.into(),
        }
    }

    pub fn failure(content: impl Into<String>) -> Self {
        Self {
            success: false,
            content: content.into(),
        }
    }

    /// Function-response payload appended to the conversation history.
    pub fn to_response(&self) -> serde_json::Value {
        if self.success {
            serde_json::json!({ "result": self.content })
        } else {
            serde_json::json!({ "error": self.content })
        }
    }
}

/// What a tool may touch while executing.
#[derive(Clone)]
pub struct ToolContext {
    pub desktop: Arc<Desktop>,
    pub gateway: Arc<dyn AiGateway>,
}

/// A command the model can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Function name as declared to the model (e.g. `"openApp"`).
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema for the arguments.
    fn schema(&self) -> serde_json::Value;

    /// Run the tool.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when the arguments do not match the schema. Business
    /// failures (unknown app, name collision, ...) are returned as
    /// [`ToolResult::failure`] so the model can explain them.
    async fn execute(&self, ctx: &ToolContext, args: serde_json::Value) -> Result<ToolResult>;
}

/// Decode tool arguments into their typed form.
pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, args: serde_json::Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|e| DesktopError::InvalidInput(format!("invalid arguments for {tool}: {e}")))
}

/// Name -> tool lookup.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in desktop tool.
    pub fn with_desktop_tools() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(OpenAppTool::new()));
        registry.register(Arc::new(CloseAppTool::new()));
        registry.register(Arc::new(CreateFolderTool::new()));
        registry.register(Arc::new(SetThemeTool::new()));
        registry.register(Arc::new(AnswerQuestionTool::new()));
        registry
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_owned(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Sorted tool names.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Declarations for the gateway, sorted by name for stable prompts.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|t| ToolDefinition::new(t.name(), t.description(), t.schema()))
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Look up and run `name`. Unknown names and argument errors become
    /// failure results rather than errors.
    pub async fn dispatch(
        &self,
        ctx: &ToolContext,
        name: &str,
        args: serde_json::Value,
    ) -> ToolResult {
        let Some(tool) = self.get(name) else {
            tracing::warn!(tool = name, "model requested unknown tool");
            return ToolResult::failure(format!("Unknown function '{name}'."));
        };
        match tool.execute(ctx, args).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool execution failed");
                ToolResult::failure(e.to_string())
            }
        }
    }
}

//! `openApp`: launch an application by its spoken name.

use super::{Tool, ToolContext, ToolResult, parse_args};
use crate::error::Result;
use crate::window::WindowData;
use crate::window::catalog::{app_names_for_prompt, find_app_by_name};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenAppArgs {
    app_name: String,
}

/// Opens (or focuses) the named application.
pub struct OpenAppTool {
    description: String,
}

impl OpenAppTool {
    pub fn new() -> Self {
        Self {
            description: format!(
                "Opens an application on the desktop. Available apps: {}.",
                app_names_for_prompt()
            ),
        }
    }
}

impl Default for OpenAppTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for OpenAppTool {
    fn name(&self) -> &str {
        "openApp"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "appName": {
                    "type": "string",
                    "description": format!(
                        "The name of the application to open, e.g. one of: {}",
                        app_names_for_prompt()
                    )
                }
            },
            "required": ["appName"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, args: serde_json::Value) -> Result<ToolResult> {
        let args: OpenAppArgs = parse_args(self.name(), args)?;
        let Some(app) = find_app_by_name(&args.app_name) else {
            return Ok(ToolResult::failure(format!(
                "I couldn't find an app called '{}'.",
                args.app_name.trim()
            )));
        };
        match ctx.desktop.windows().open_app(app.id, WindowData::new()) {
            Some(id) => {
                tracing::info!(app = app.id, window = %id, "assistant opened app");
                Ok(ToolResult::success(format!("Opened {}.", app.name)))
            }
            None => Ok(ToolResult::failure(format!("{} could not be opened.", app.name))),
        }
    }
}

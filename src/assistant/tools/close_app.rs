//! `closeApp`: close an application's windows, or every window.

use super::{Tool, ToolContext, ToolResult, parse_args};
use crate::error::Result;
use crate::window::catalog::find_app_by_name;
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CloseAppArgs {
    app_name: String,
}

pub struct CloseAppTool;

impl CloseAppTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CloseAppTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CloseAppTool {
    fn name(&self) -> &str {
        "closeApp"
    }

    fn description(&self) -> &str {
        "Closes an open application. Use 'all' to close every open window."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "appName": {
                    "type": "string",
                    "description": "The name of the application to close, or 'all' to close all applications."
                }
            },
            "required": ["appName"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, args: serde_json::Value) -> Result<ToolResult> {
        let args: CloseAppArgs = parse_args(self.name(), args)?;
        let windows = ctx.desktop.windows();

        if args.app_name.trim().eq_ignore_ascii_case("all") {
            let closed = windows.close_all();
            return Ok(match closed {
                0 => ToolResult::success("There were no open applications to close."),
                1 => ToolResult::success("Closed 1 window."),
                n => ToolResult::success(format!("Closed all {n} windows.")),
            });
        }

        let Some(app) = find_app_by_name(&args.app_name) else {
            return Ok(ToolResult::failure(format!(
                "I couldn't find an app called '{}'.",
                args.app_name.trim()
            )));
        };
        if windows.close_app(app.id) == 0 {
            return Ok(ToolResult::failure(format!("{} is not open.", app.name)));
        }
        tracing::info!(app = app.id, "assistant closed app");
        Ok(ToolResult::success(format!("Closed {}.", app.name)))
    }
}

//! `setSystemTheme`: switch between light and dark mode.

use super::{Tool, ToolContext, ToolResult, parse_args};
use crate::error::Result;
use crate::settings::Theme;
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SetThemeArgs {
    theme: String,
}

pub struct SetThemeTool;

impl SetThemeTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SetThemeTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for SetThemeTool {
    fn name(&self) -> &str {
        "setSystemTheme"
    }

    fn description(&self) -> &str {
        "Sets the system theme to light or dark mode."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "theme": {
                    "type": "string",
                    "enum": ["light", "dark"],
                    "description": "The theme to apply."
                }
            },
            "required": ["theme"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, args: serde_json::Value) -> Result<ToolResult> {
        let args: SetThemeArgs = parse_args(self.name(), args)?;
        let Some(theme) = Theme::parse(&args.theme) else {
            return Ok(ToolResult::failure(format!(
                "'{}' is not a theme. Choose light or dark.",
                args.theme.trim()
            )));
        };
        ctx.desktop.set_theme(theme);
        Ok(ToolResult::success(format!("Switched to {theme} mode.")))
    }
}

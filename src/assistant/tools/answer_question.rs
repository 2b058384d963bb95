//! `answerGeneralQuestion`: delegate open questions to the fast model.

use super::{Tool, ToolContext, ToolResult, parse_args};
use crate::error::Result;
use crate::gateway::ModelTier;
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct AnswerArgs {
    query: String,
}

pub struct AnswerQuestionTool;

impl AnswerQuestionTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AnswerQuestionTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for AnswerQuestionTool {
    fn name(&self) -> &str {
        "answerGeneralQuestion"
    }

    fn description(&self) -> &str {
        "Answers a general knowledge question or engages in conversation when no other tool applies."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The user's question or statement."
                }
            },
            "required": ["query"]
        })
    }

    // Gateway failures are reported in-band so the model can still phrase a
    // reply for the user.
    async fn execute(&self, ctx: &ToolContext, args: serde_json::Value) -> Result<ToolResult> {
        let args: AnswerArgs = parse_args(self.name(), args)?;
        match ctx.gateway.chat(&args.query, ModelTier::Fast).await {
            Ok(answer) => Ok(ToolResult::success(answer)),
            Err(e) => {
                tracing::warn!(error = %e, "general question lookup failed");
                Ok(ToolResult::failure(format!(
                    "I couldn't look that up right now ({e})."
                )))
            }
        }
    }
}

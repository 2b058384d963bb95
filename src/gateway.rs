//! AI gateway capability consumed by the assistant and the realtime session.
//!
//! The gateway is an external collaborator (cloud chat, tool calling,
//! text-to-speech and a duplex realtime audio endpoint). This module only
//! defines its shape; concrete clients live in the embedding application and
//! fakes live in the tests.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Model class for plain chat calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// Low-latency model.
    #[default]
    Fast,
    /// Higher quality, slower.
    Pro,
}

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
    /// Result of a function call, fed back to the model.
    Tool,
}

/// A function call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// Payload of a single turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnPart {
    Text { text: String },
    FunctionCall { call: FunctionCall },
    FunctionResponse { name: String, response: serde_json::Value },
}

/// One entry of the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    #[serde(flatten)]
    pub part: TurnPart,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            part: TurnPart::Text { text: text.into() },
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            part: TurnPart::Text { text: text.into() },
        }
    }

    pub fn function_call(call: FunctionCall) -> Self {
        Self {
            role: Role::Model,
            part: TurnPart::FunctionCall { call },
        }
    }

    pub fn function_response(name: impl Into<String>, response: serde_json::Value) -> Self {
        Self {
            role: Role::Tool,
            part: TurnPart::FunctionResponse {
                name: name.into(),
                response,
            },
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.part {
            TurnPart::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// A tool definition provided to the model for function calling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema of the arguments.
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Reply to a tool-enabled request. At most one function call per round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub text: Option<String>,
    pub function_call: Option<FunctionCall>,
}

impl ToolResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            function_call: None,
        }
    }

    pub fn call(name: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            text: None,
            function_call: Some(FunctionCall {
                name: name.into(),
                args,
            }),
        }
    }
}

/// Parameters for opening a realtime session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeSessionConfig {
    pub system_instruction: String,
    /// Ask the server to transcribe the user's speech.
    pub input_transcription: bool,
    /// Ask the server to transcribe its own speech.
    pub output_transcription: bool,
    /// Sample rate of returned audio.
    pub output_sample_rate: u32,
}

/// Outbound microphone frame in wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioFrame {
    /// Base64 of little-endian PCM16 mono samples.
    pub data: String,
    pub mime_type: String,
}

/// Inbound realtime message. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerMessage {
    /// Fragment of the user's speech transcript.
    pub input_transcription: Option<String>,
    /// Fragment of the model's speech transcript.
    pub output_transcription: Option<String>,
    pub turn_complete: bool,
    /// Base64 PCM16 audio at the configured output rate.
    pub audio: Option<String>,
}

/// Lifecycle and data events of a realtime connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealtimeEvent {
    Opened,
    Message(ServerMessage),
    Error(String),
    Closed,
}

/// Send half of an open realtime session.
#[async_trait]
pub trait RealtimeConnection: Send + Sync {
    async fn send_audio(&self, frame: AudioFrame) -> Result<()>;

    /// Close the session. Must tolerate being called more than once.
    async fn close(&self);
}

/// A realtime session as returned by [`AiGateway::open_realtime`].
pub struct RealtimeChannel {
    pub connection: Box<dyn RealtimeConnection>,
    pub events: mpsc::Receiver<RealtimeEvent>,
}

/// The AI backend.
#[async_trait]
pub trait AiGateway: Send + Sync {
    /// Plain chat completion.
    async fn chat(&self, prompt: &str, tier: ModelTier) -> Result<String>;

    /// Respond to `history`, optionally requesting one function call.
    async fn respond_with_tools(
        &self,
        history: &[Turn],
        tools: &[ToolDefinition],
    ) -> Result<ToolResponse>;

    /// Synthesize `text` into little-endian PCM16 mono at the output rate.
    async fn text_to_speech(&self, text: &str) -> Result<Vec<u8>>;

    /// Open a duplex realtime session.
    async fn open_realtime(&self, config: RealtimeSessionConfig) -> Result<RealtimeChannel>;
}

//! Runtime events emitted by the desktop core for the UI layer.
//!
//! Events are lightweight notifications; observers re-read the relevant
//! snapshot (windows, file-system tree, appearance) when they receive one.

use crate::assistant::AssistantState;
use crate::realtime::TranscriptTurn;
use crate::settings::Appearance;
use crate::window::WindowId;
use serde::Serialize;

/// Events describing what changed in the shared desktop state.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum DesktopEvent {
    /// The window collection was replaced.
    WindowsChanged {
        active_window_id: Option<WindowId>,
        count: usize,
    },
    /// The file-system tree was replaced.
    FileSystemChanged { revision: u64 },
    /// Theme, wallpaper or accent changed.
    AppearanceChanged(Appearance),
    /// Assistant state machine moved to a new state.
    AssistantState { state: AssistantState },
    /// Partial transcript captured by the assistant's command capture.
    AssistantTranscript { text: String },
    /// Agent tool call dispatched by the assistant.
    ToolCall { name: String, input_json: String },
    /// Agent tool result.
    ToolResult {
        name: String,
        success: bool,
        output_text: String,
    },
    /// Realtime session active flag changed.
    RealtimeActive { active: bool },
    /// Realtime partial input/output text changed.
    RealtimePartial { input: String, output: String },
    /// Realtime turn completed and was appended to the transcript log.
    RealtimeTurn(TranscriptTurn),
    /// Message the UI should show inline (alert-equivalent).
    Alert { code: String, message: String },
}

impl DesktopEvent {
    /// Stable wire name used by the host bridge event envelopes.
    pub fn name(&self) -> &'static str {
        match self {
            Self::WindowsChanged { .. } => "windows.changed",
            Self::FileSystemChanged { .. } => "fs.changed",
            Self::AppearanceChanged(_) => "settings.changed",
            Self::AssistantState { .. } => "assistant.state",
            Self::AssistantTranscript { .. } => "assistant.transcript",
            Self::ToolCall { .. } => "assistant.tool_call",
            Self::ToolResult { .. } => "assistant.tool_result",
            Self::RealtimeActive { .. } => "realtime.active",
            Self::RealtimePartial { .. } => "realtime.partial",
            Self::RealtimeTurn(_) => "realtime.turn",
            Self::Alert { .. } => "alert",
        }
    }
}

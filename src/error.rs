//! Error types for the desktop core.
//!
//! Every variant carries a stable error code (SCREAMING_SNAKE_CASE) accessible
//! via [`DesktopError::code()`]. The host bridge forwards these codes to the UI
//! layer so it can pick the right inline message without parsing text.

/// Stable error codes for programmatic error handling.
pub mod error_codes {
    /// A path segment was missing or was not a folder.
    pub const PATH_NOT_FOUND: &str = "PATH_NOT_FOUND";
    /// A sibling with the same (case-insensitive) name already exists.
    pub const NAME_COLLISION: &str = "NAME_COLLISION";
    /// Input was rejected before any state was touched.
    pub const INVALID_INPUT: &str = "INVALID_INPUT";
    /// Microphone or capture permission was refused.
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    /// An AI gateway call failed.
    pub const GATEWAY_ERROR: &str = "GATEWAY_ERROR";
    /// Another voice modality currently owns the microphone.
    pub const VOICE_BUSY: &str = "VOICE_BUSY";
    /// Audio decode or playback failure.
    pub const AUDIO_ERROR: &str = "AUDIO_ERROR";
    /// Invalid or unreadable configuration.
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";
    /// Filesystem I/O failure (config persistence only).
    pub const IO_ERROR: &str = "IO_ERROR";
    /// Internal channel closed or full.
    pub const CHANNEL_ERROR: &str = "CHANNEL_ERROR";
    /// The session the operation belonged to was torn down.
    pub const SESSION_CLOSED: &str = "SESSION_CLOSED";
}

/// Top-level error type for the desktop core.
#[derive(Debug, thiserror::Error)]
pub enum DesktopError {
    /// File-system path resolution failed. Callers fall back to the root.
    #[error("path not found: {0}")]
    PathNotFound(String),

    /// Create or rename would produce two siblings with the same name.
    #[error("name collision: {0}")]
    NameCollision(String),

    /// Rejected input (empty name, path separator in a name, bad argument).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Microphone access was refused.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// AI gateway call failure.
    #[error("gateway error: {0}")]
    Gateway(String),

    /// A voice modality could not start because the other one is active.
    #[error("voice busy: {0}")]
    VoiceBusy(String),

    /// Audio decode/playback error.
    #[error("audio error: {0}")]
    Audio(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),

    /// The owning session was stopped while the operation was in flight.
    #[error("session closed: {0}")]
    SessionClosed(String),
}

impl DesktopError {
    /// Returns the stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PathNotFound(_) => error_codes::PATH_NOT_FOUND,
            Self::NameCollision(_) => error_codes::NAME_COLLISION,
            Self::InvalidInput(_) => error_codes::INVALID_INPUT,
            Self::PermissionDenied(_) => error_codes::PERMISSION_DENIED,
            Self::Gateway(_) => error_codes::GATEWAY_ERROR,
            Self::VoiceBusy(_) => error_codes::VOICE_BUSY,
            Self::Audio(_) => error_codes::AUDIO_ERROR,
            Self::Config(_) => error_codes::CONFIG_INVALID,
            Self::Io(_) => error_codes::IO_ERROR,
            Self::Channel(_) => error_codes::CHANNEL_ERROR,
            Self::SessionClosed(_) => error_codes::SESSION_CLOSED,
        }
    }

    /// Whether the error should be shown to the user as an inline message
    /// (alert-equivalent) rather than only logged.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::PathNotFound(_)
                | Self::NameCollision(_)
                | Self::InvalidInput(_)
                | Self::PermissionDenied(_)
                | Self::VoiceBusy(_)
        )
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, DesktopError>;

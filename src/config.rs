//! Configuration types for the desktop core.

use crate::settings::{AccentColor, Theme};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration for the desktop core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopConfig {
    /// Window placement and sizing.
    pub windows: WindowConfig,
    /// Virtual file-system settings.
    pub filesystem: FileSystemConfig,
    /// Voice assistant (wake word + command capture) settings.
    pub assistant: AssistantConfig,
    /// Realtime duplex voice session settings.
    pub realtime: RealtimeConfig,
    /// Initial appearance.
    pub appearance: AppearanceConfig,
}

/// Window placement configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Width of a freshly opened window.
    pub default_width: f64,
    /// Height of a freshly opened window.
    pub default_height: f64,
    /// Top-left coordinate of the first cascaded window (both axes).
    pub cascade_origin: f64,
    /// Offset applied per existing window when cascading.
    pub cascade_step: f64,
    /// Number of cascade positions before wrapping back to the origin.
    pub cascade_wrap: usize,
    /// Width floor applied by resize gestures.
    pub min_width: f64,
    /// Height floor applied by resize gestures.
    pub min_height: f64,
    /// Open the "about" window at startup.
    pub open_about_on_start: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            default_width: 800.0,
            default_height: 600.0,
            cascade_origin: 100.0,
            cascade_step: 20.0,
            cascade_wrap: 10,
            min_width: 300.0,
            min_height: 200.0,
            open_about_on_start: true,
        }
    }
}

/// Virtual file-system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSystemConfig {
    /// Name of the root volume node.
    pub root_label: String,
    /// Populate the default user folders and sample files.
    pub seed_user_folders: bool,
}

impl Default for FileSystemConfig {
    fn default() -> Self {
        Self {
            root_label: "C:".to_owned(),
            seed_user_folders: true,
        }
    }
}

/// Voice assistant configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Enable continuous wake-phrase listening while idle.
    pub wake_word_enabled: bool,
    /// Trigger phrase matched against live transcripts (case-insensitive).
    pub wake_phrase: String,
    /// Delay before restarting the wake listener after a transient error.
    pub wake_restart_delay_ms: u64,
    /// Minimum gap between two wake detections.
    pub wake_cooldown_ms: u64,
    /// Delay before the `error` state recovers to `idle`.
    pub error_recovery_ms: u64,
    /// Spoken when manual activation is refused during a realtime session.
    pub busy_message: String,
    /// Spoken when the pipeline fails.
    pub error_message: String,
    /// Spoken when the gateway returns neither text nor a function call.
    pub fallback_reply: String,
    /// Folder (under the user's home) used when `createFolder` has no location.
    pub default_folder_location: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            wake_word_enabled: true,
            wake_phrase: "hey durgas".to_owned(),
            wake_restart_delay_ms: 100,
            wake_cooldown_ms: 1500,
            error_recovery_ms: 3000,
            busy_message: "The live assistant is active. Please end that session first.".to_owned(),
            error_message: "Sorry, something went wrong.".to_owned(),
            fallback_reply: "Sorry, I didn't catch that.".to_owned(),
            default_folder_location: "Desktop".to_owned(),
        }
    }
}

/// Realtime duplex session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Microphone capture rate in Hz.
    pub input_sample_rate: u32,
    /// Sample rate of audio returned by the gateway.
    pub output_sample_rate: u32,
    /// Samples per outbound frame.
    pub frame_samples: usize,
    /// MIME type attached to each outbound frame.
    pub input_mime_type: String,
    /// System instruction sent when the session opens.
    pub system_instruction: String,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            input_sample_rate: 16_000,
            output_sample_rate: 24_000,
            frame_samples: 4096,
            input_mime_type: "audio/pcm;rate=16000".to_owned(),
            system_instruction: "You are Durgas, the helpful AI assistant for DurgasOS.".to_owned(),
        }
    }
}

/// Initial appearance configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    pub theme: Theme,
    pub wallpaper: String,
    pub accent: AccentColor,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            wallpaper: "https://images.unsplash.com/photo-1620121692029-d088224ddc74".to_owned(),
            accent: AccentColor::default(),
        }
    }
}

impl DesktopConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::DesktopError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::DesktopError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/durgas/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("durgas").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("durgas")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/durgas-config/config.toml")
        }
    }
}

//! Appearance state: theme, wallpaper and accent colour.

use serde::{Deserialize, Serialize};

/// System colour theme.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    /// Parse `"light"` / `"dark"` (case-insensitive, surrounding whitespace ignored).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named accent colour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccentColor {
    pub name: String,
    pub hex: String,
}

impl Default for AccentColor {
    fn default() -> Self {
        Self {
            name: "Default Blue".to_owned(),
            hex: "#0078D4".to_owned(),
        }
    }
}

/// Current appearance of the desktop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appearance {
    pub theme: Theme,
    pub wallpaper: String,
    pub accent: AccentColor,
}

impl Appearance {
    pub fn from_config(config: &crate::config::AppearanceConfig) -> Self {
        Self {
            theme: config.theme,
            wallpaper: config.wallpaper.clone(),
            accent: config.accent.clone(),
        }
    }
}

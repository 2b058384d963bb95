//! Static catalog of installable applications.

use serde::Serialize;

/// How repeated launches of an app are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchPolicy {
    /// Reuse the visible window if there is one.
    Singleton,
    /// Like `Singleton`, except a launch carrying a target path always opens
    /// a new window.
    NewWindowForPath,
}

/// One installable application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub launch: LaunchPolicy,
}

impl AppDefinition {
    const fn singleton(id: &'static str, name: &'static str) -> Self {
        Self {
            id,
            name,
            launch: LaunchPolicy::Singleton,
        }
    }
}

pub const ABOUT: &str = "about";
pub const FILE_EXPLORER: &str = "fileExplorer";
pub const NOTEPAD: &str = "notepad";
pub const TERMINAL: &str = "terminal";
pub const VIDEO_PLAYER: &str = "videoPlayer";

/// Window data key carrying a folder path for the file explorer.
pub const INITIAL_PATH_KEY: &str = "initialPath";

pub static APPS: [AppDefinition; 11] = [
    AppDefinition::singleton(ABOUT, "About Me"),
    AppDefinition::singleton("portfolio", "Portfolio"),
    AppDefinition::singleton("browser", "Gemini Browser"),
    AppDefinition::singleton("chat", "Gemini Chat"),
    AppDefinition::singleton("creator", "Creator Studio"),
    AppDefinition::singleton("live", "Live Assistant"),
    AppDefinition {
        id: FILE_EXPLORER,
        name: "File Explorer",
        launch: LaunchPolicy::NewWindowForPath,
    },
    AppDefinition::singleton("settings", "Settings"),
    AppDefinition::singleton(NOTEPAD, "Notepad"),
    AppDefinition::singleton(TERMINAL, "Terminal"),
    AppDefinition::singleton(VIDEO_PLAYER, "Video Player"),
];

/// Exact id lookup.
pub fn find_app(id: &str) -> Option<&'static AppDefinition> {
    APPS.iter().find(|app| app.id == id)
}

/// Lenient lookup used for spoken app names: matches the id or display name
/// ignoring case, spaces, hyphens and underscores.
pub fn find_app_by_name(query: &str) -> Option<&'static AppDefinition> {
    let wanted = normalize(query);
    if wanted.is_empty() {
        return None;
    }
    APPS.iter()
        .find(|app| normalize(app.id) == wanted || normalize(app.name) == wanted)
        .or_else(|| {
            // "explorer" -> "File Explorer", but only when unambiguous.
            let mut partial = APPS
                .iter()
                .filter(|app| normalize(app.name).contains(&wanted));
            match (partial.next(), partial.next()) {
                (Some(app), None) => Some(app),
                _ => None,
            }
        })
}

/// Start-menu filter: display names containing `query` (case-insensitive).
pub fn search_apps(query: &str) -> Vec<&'static AppDefinition> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    APPS.iter()
        .filter(|app| app.name.to_lowercase().contains(&needle))
        .collect()
}

/// Comma-separated lowercase names, for the assistant tool description.
pub fn app_names_for_prompt() -> String {
    APPS.iter()
        .map(|app| app.name.to_lowercase())
        .collect::<Vec<_>>()
        .join(", ")
}

fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

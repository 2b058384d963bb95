//! The desktop controller.
//!
//! [`Desktop`] owns every piece of shared state (windows, file system,
//! appearance, the voice arbiter) and the event channel they publish on.
//! The host bridge, the assistant and the realtime session all act through
//! an `Arc<Desktop>`.

use crate::config::DesktopConfig;
use crate::error::{DesktopError, Result};
use crate::runtime::DesktopEvent;
use crate::settings::{AccentColor, Appearance, Theme};
use crate::vfs::{NodeKind, SearchHit, VfsPath, VirtualFileSystem};
use crate::voice::VoiceArbiter;
use crate::window::catalog::{FILE_EXPLORER, INITIAL_PATH_KEY, NOTEPAD, VIDEO_PLAYER};
use crate::window::{WindowData, WindowId, WindowManager};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Capacity of the desktop event channel. Slow observers skip ahead.
const EVENT_CAPACITY: usize = 256;

/// Text shown by the notepad for a file with no content.
const EMPTY_FILE_TEXT: &str = "This file is empty.";

pub struct Desktop {
    config: DesktopConfig,
    windows: WindowManager,
    fs: VirtualFileSystem,
    appearance: Mutex<Arc<Appearance>>,
    voice: VoiceArbiter,
    events: broadcast::Sender<DesktopEvent>,
}

impl Desktop {
    /// Boot a desktop from `config`: seeded file system, the startup windows
    /// and the configured appearance.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when the seeded tree is malformed.
    pub fn new(config: DesktopConfig) -> Result<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let windows =
            WindowManager::with_default_windows(config.windows.clone()).with_events(events.clone());
        let fs = VirtualFileSystem::from_config(&config.filesystem)?.with_events(events.clone());
        let appearance = Mutex::new(Arc::new(Appearance::from_config(&config.appearance)));
        info!(
            windows = windows.windows().len(),
            nodes = fs.snapshot().node_count(),
            "desktop ready"
        );
        Ok(Self {
            config,
            windows,
            fs,
            appearance,
            voice: VoiceArbiter::new(),
            events,
        })
    }

    pub fn config(&self) -> &DesktopConfig {
        &self.config
    }

    pub fn windows(&self) -> &WindowManager {
        &self.windows
    }

    pub fn fs(&self) -> &VirtualFileSystem {
        &self.fs
    }

    pub fn voice(&self) -> &VoiceArbiter {
        &self.voice
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<DesktopEvent> {
        self.events.subscribe()
    }

    /// Sender half, for components that publish on their own.
    pub fn event_sender(&self) -> broadcast::Sender<DesktopEvent> {
        self.events.clone()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: DesktopEvent) {
        debug!(event = event.name(), "publishing");
        let _ = self.events.send(event);
    }

    /// Show an inline message in the UI.
    pub fn alert(&self, code: &str, message: impl Into<String>) {
        self.publish(DesktopEvent::Alert {
            code: code.to_owned(),
            message: message.into(),
        });
    }

    // ── Appearance ──────────────────────────────────────────────────

    pub fn appearance(&self) -> Arc<Appearance> {
        Arc::clone(&self.appearance.lock().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn set_theme(&self, theme: Theme) -> Arc<Appearance> {
        self.update_appearance(|a| a.theme = theme)
    }

    pub fn set_wallpaper(&self, wallpaper: impl Into<String>) -> Result<Arc<Appearance>> {
        let wallpaper = wallpaper.into();
        if wallpaper.trim().is_empty() {
            return Err(DesktopError::InvalidInput("wallpaper must not be empty".into()));
        }
        Ok(self.update_appearance(|a| a.wallpaper = wallpaper))
    }

    pub fn set_accent(&self, accent: AccentColor) -> Result<Arc<Appearance>> {
        if !is_hex_color(&accent.hex) {
            return Err(DesktopError::InvalidInput(format!(
                "accent colour must look like #RRGGBB, got {}",
                accent.hex
            )));
        }
        Ok(self.update_appearance(|a| a.accent = accent))
    }

    fn update_appearance(&self, change: impl FnOnce(&mut Appearance)) -> Arc<Appearance> {
        let mut guard = self.appearance.lock().unwrap_or_else(|e| e.into_inner());
        let mut next = Appearance::clone(&guard);
        change(&mut next);
        if next == **guard {
            return Arc::clone(&guard);
        }
        let next = Arc::new(next);
        *guard = Arc::clone(&next);
        drop(guard);
        info!(theme = %next.theme, accent = %next.accent.hex, "appearance changed");
        self.publish(DesktopEvent::AppearanceChanged(Appearance::clone(&next)));
        next
    }

    // ── Opening things ──────────────────────────────────────────────

    /// Open the node at `path` the way a double-click would: folders in a
    /// new file explorer, videos in the video player, anything else in the
    /// notepad.
    ///
    /// # Errors
    ///
    /// `PathNotFound` when nothing exists at `path`.
    pub fn open_path(&self, path: &VfsPath) -> Result<Option<WindowId>> {
        let node = self.fs.resolve(path)?;
        let mut data = WindowData::new();
        let app = match node.kind {
            NodeKind::Folder => {
                data.insert(INITIAL_PATH_KEY.to_owned(), path.to_slash_string().into());
                FILE_EXPLORER
            }
            NodeKind::File => {
                let content = node.content.unwrap_or_default();
                let app = if is_video(&node.name) {
                    data.insert("content".to_owned(), content.into());
                    VIDEO_PLAYER
                } else {
                    let text = if content.is_empty() {
                        EMPTY_FILE_TEXT.to_owned()
                    } else {
                        content
                    };
                    data.insert("content".to_owned(), text.into());
                    NOTEPAD
                };
                data.insert("title".to_owned(), node.name.into());
                app
            }
        };
        Ok(self.windows.open_app(app, data))
    }

    /// Open the child `name` of the folder at `folder`.
    pub fn open_file(&self, folder: &VfsPath, name: &str) -> Result<Option<WindowId>> {
        self.open_path(&folder.join(name))
    }

    /// Open a start-menu search hit in a file explorer. File hits open their
    /// containing folder.
    pub fn open_search_hit(&self, hit: &SearchHit) -> Option<WindowId> {
        let folder = match hit.kind {
            NodeKind::Folder => hit.location.clone(),
            NodeKind::File => hit.location.parent().unwrap_or_default(),
        };
        let mut data = WindowData::new();
        data.insert(INITIAL_PATH_KEY.to_owned(), folder.to_slash_string().into());
        self.windows.open_app(FILE_EXPLORER, data)
    }
}

fn is_video(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".mp4") || lower.ends_with(".webm")
}

fn is_hex_color(raw: &str) -> bool {
    raw.len() == 7
        && raw.starts_with('#')
        && raw[1..].chars().all(|c| c.is_ascii_hexdigit())
}

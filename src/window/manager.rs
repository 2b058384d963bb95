//! Window collection, z-order and interaction state.
//!
//! The collection is an `Arc<Vec<WindowInstance>>` replaced wholesale on every
//! change. The z-index counter and the collection share one lock, so every
//! issued z-index is unique and strictly increasing.

use super::catalog::{self, AppDefinition, INITIAL_PATH_KEY, LaunchPolicy};
use super::gesture::{Geometry, Gesture, HitTarget, Point};
use crate::config::WindowConfig;
use crate::runtime::DesktopEvent;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Opaque per-window data handed to the hosted app.
pub type WindowData = serde_json::Map<String, serde_json::Value>;

/// Window identifier (`win-<n>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(String);

impl WindowId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    fn from_seq(seq: u64) -> Self {
        Self(format!("win-{seq}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One open window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowInstance {
    pub id: WindowId,
    pub app_id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub z_index: u64,
    pub is_minimized: bool,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub data: WindowData,
}

impl WindowInstance {
    pub fn geometry(&self) -> Geometry {
        Geometry {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// Merge-patch for [`WindowManager::update`]. Absent fields are untouched.
///
/// The z-index is not patchable; use [`WindowManager::focus`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WindowPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub is_minimized: Option<bool>,
    pub data: Option<WindowData>,
}

impl WindowPatch {
    pub fn geometry(g: Geometry) -> Self {
        Self {
            x: Some(g.x),
            y: Some(g.y),
            width: Some(g.width),
            height: Some(g.height),
            ..Self::default()
        }
    }

    fn apply(&self, window: &mut WindowInstance) {
        if let Some(x) = self.x {
            window.x = x;
        }
        if let Some(y) = self.y {
            window.y = y;
        }
        if let Some(width) = self.width {
            window.width = width;
        }
        if let Some(height) = self.height {
            window.height = height;
        }
        if let Some(minimized) = self.is_minimized {
            window.is_minimized = minimized;
        }
        if let Some(data) = &self.data {
            window.data = data.clone();
        }
    }
}

/// Id of the non-minimized window with the highest z-index.
pub fn active_window_id(windows: &[WindowInstance]) -> Option<WindowId> {
    windows
        .iter()
        .filter(|w| !w.is_minimized)
        .max_by_key(|w| w.z_index)
        .map(|w| w.id.clone())
}

struct ActiveGesture {
    window_id: WindowId,
    gesture: Gesture,
}

struct WindowState {
    windows: Arc<Vec<WindowInstance>>,
    next_z: u64,
    next_seq: u64,
    gesture: Option<ActiveGesture>,
}

/// Owner of the window collection.
pub struct WindowManager {
    config: WindowConfig,
    state: Mutex<WindowState>,
    events: Option<broadcast::Sender<DesktopEvent>>,
}

impl WindowManager {
    /// Empty desktop. The first issued z-index is 1.
    pub fn new(config: WindowConfig) -> Self {
        Self {
            config,
            state: Mutex::new(WindowState {
                windows: Arc::new(Vec::new()),
                next_z: 1,
                next_seq: 1,
                gesture: None,
            }),
            events: None,
        }
    }

    /// Desktop as it looks after boot: the `about` window when configured.
    pub fn with_default_windows(config: WindowConfig) -> Self {
        let open_about = config.open_about_on_start;
        let manager = Self::new(config);
        if open_about {
            let mut state = manager.lock();
            let id = WindowId::from_seq(state.next_seq);
            state.next_seq += 1;
            let z_index = state.next_z;
            state.next_z += 1;
            state.windows = Arc::new(vec![WindowInstance {
                id,
                app_id: catalog::ABOUT.to_owned(),
                x: 150.0,
                y: 150.0,
                width: 600.0,
                height: 400.0,
                z_index,
                is_minimized: false,
                data: WindowData::new(),
            }]);
        }
        manager
    }

    /// Publish [`DesktopEvent::WindowsChanged`] on every commit.
    #[must_use]
    pub fn with_events(mut self, events: broadcast::Sender<DesktopEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Current collection in creation order.
    pub fn windows(&self) -> Arc<Vec<WindowInstance>> {
        Arc::clone(&self.lock().windows)
    }

    pub fn get(&self, id: &WindowId) -> Option<WindowInstance> {
        self.lock().windows.iter().find(|w| &w.id == id).cloned()
    }

    pub fn active_window_id(&self) -> Option<WindowId> {
        active_window_id(&self.lock().windows)
    }

    /// Open `app_id` or bring its visible window to the front.
    ///
    /// Returns the window that ends up focused, or `None` for an unknown app.
    pub fn open_app(&self, app_id: &str, data: WindowData) -> Option<WindowId> {
        let Some(app) = catalog::find_app(app_id) else {
            warn!(app_id, "open requested for unknown app, ignoring");
            return None;
        };
        let force_new = app.launch == LaunchPolicy::NewWindowForPath
            && data
                .get(INITIAL_PATH_KEY)
                .is_some_and(|v| !v.is_null() && v.as_str() != Some(""));

        let mut state = self.lock();
        let existing = state
            .windows
            .iter()
            .find(|w| w.app_id == app.id && !w.is_minimized)
            .map(|w| w.id.clone());

        let id = match existing {
            Some(id) if !force_new => {
                let z_index = state.issue_z();
                let next = state.map_window(&id, |w| {
                    w.z_index = z_index;
                    w.is_minimized = false;
                });
                debug!(app_id = app.id, window = %id, z_index, "raised existing window");
                self.commit(&mut state, next);
                id
            }
            _ => {
                let window = self.new_window(&mut state, app, data);
                let id = window.id.clone();
                info!(app_id = app.id, window = %id, z_index = window.z_index, "window opened");
                let mut next = state.windows.as_ref().clone();
                next.push(window);
                self.commit(&mut state, next);
                id
            }
        };
        Some(id)
    }

    /// Remove a window. Returns `false` if it was not open.
    pub fn close(&self, id: &WindowId) -> bool {
        self.retain(|w| &w.id != id) > 0
    }

    /// Close every window of `app_id`. Returns how many were closed.
    pub fn close_app(&self, app_id: &str) -> usize {
        self.retain(|w| w.app_id != app_id)
    }

    /// Close everything. Returns how many were closed.
    pub fn close_all(&self) -> usize {
        self.retain(|_| false)
    }

    pub fn minimize(&self, id: &WindowId) -> bool {
        let mut state = self.lock();
        if !state.contains(id) {
            return false;
        }
        let next = state.map_window(id, |w| w.is_minimized = true);
        self.commit(&mut state, next);
        true
    }

    /// Bring a window to the front and un-minimize it.
    ///
    /// A window that already holds the newest z-index is not re-stacked, so
    /// repeated focus clicks do not consume counter values.
    pub fn focus(&self, id: &WindowId) -> bool {
        let mut state = self.lock();
        let Some(window) = state.windows.iter().find(|w| &w.id == id) else {
            return false;
        };
        let holds_top = window.z_index + 1 == state.next_z;
        let minimized = window.is_minimized;
        if !holds_top {
            let z_index = state.issue_z();
            let next = state.map_window(id, |w| {
                w.z_index = z_index;
                w.is_minimized = false;
            });
            self.commit(&mut state, next);
        } else if minimized {
            let next = state.map_window(id, |w| w.is_minimized = false);
            self.commit(&mut state, next);
        }
        true
    }

    /// Merge `patch` into a window. No validation happens here.
    pub fn update(&self, id: &WindowId, patch: &WindowPatch) -> bool {
        let mut state = self.lock();
        if !state.contains(id) {
            return false;
        }
        let next = state.map_window(id, |w| patch.apply(w));
        self.commit(&mut state, next);
        true
    }

    /// Pointer-down on a window. Always focuses it; starts a move or resize
    /// when the hit target calls for one. Returns whether a gesture started.
    pub fn pointer_down(&self, id: &WindowId, target: HitTarget, pointer: Point) -> bool {
        if !self.focus(id) {
            return false;
        }
        let mut state = self.lock();
        let Some(start) = state
            .windows
            .iter()
            .find(|w| &w.id == id)
            .map(WindowInstance::geometry)
        else {
            return false;
        };
        state.gesture = Gesture::begin(target, pointer, start).map(|gesture| ActiveGesture {
            window_id: id.clone(),
            gesture,
        });
        state.gesture.is_some()
    }

    /// Pointer-move anywhere on the desktop.
    pub fn pointer_move(&self, pointer: Point) {
        let mut state = self.lock();
        let Some(active) = &state.gesture else {
            return;
        };
        let window_id = active.window_id.clone();
        let geometry =
            active
                .gesture
                .geometry_at(pointer, self.config.min_width, self.config.min_height);
        if !state.contains(&window_id) {
            state.gesture = None;
            return;
        }
        let patch = WindowPatch::geometry(geometry);
        let next = state.map_window(&window_id, |w| patch.apply(w));
        self.commit(&mut state, next);
    }

    /// Pointer-up anywhere ends the gesture.
    pub fn pointer_up(&self) {
        self.lock().gesture = None;
    }

    pub fn gesture_active(&self) -> bool {
        self.lock().gesture.is_some()
    }

    fn new_window(
        &self,
        state: &mut WindowState,
        app: &AppDefinition,
        data: WindowData,
    ) -> WindowInstance {
        let wrap = self.config.cascade_wrap.max(1);
        let offset = (state.windows.len() % wrap) as f64 * self.config.cascade_step;
        let seq = state.next_seq;
        state.next_seq += 1;
        WindowInstance {
            id: WindowId::from_seq(seq),
            app_id: app.id.to_owned(),
            x: self.config.cascade_origin + offset,
            y: self.config.cascade_origin + offset,
            width: self.config.default_width,
            height: self.config.default_height,
            z_index: state.issue_z(),
            is_minimized: false,
            data,
        }
    }

    fn retain(&self, keep: impl Fn(&WindowInstance) -> bool) -> usize {
        let mut state = self.lock();
        let next: Vec<_> = state.windows.iter().filter(|w| keep(w)).cloned().collect();
        let removed = state.windows.len() - next.len();
        if removed > 0 {
            info!(removed, "windows closed");
            self.commit(&mut state, next);
        }
        removed
    }

    fn commit(&self, state: &mut WindowState, next: Vec<WindowInstance>) {
        let active_window_id = active_window_id(&next);
        let count = next.len();
        state.windows = Arc::new(next);
        if let Some(events) = &self.events {
            let _ = events.send(DesktopEvent::WindowsChanged {
                active_window_id,
                count,
            });
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl WindowState {
    fn issue_z(&mut self) -> u64 {
        let z = self.next_z;
        self.next_z += 1;
        z
    }

    fn contains(&self, id: &WindowId) -> bool {
        self.windows.iter().any(|w| &w.id == id)
    }

    fn map_window(&self, id: &WindowId, f: impl FnOnce(&mut WindowInstance)) -> Vec<WindowInstance> {
        let mut next = self.windows.as_ref().clone();
        if let Some(window) = next.iter_mut().find(|w| &w.id == id) {
            f(window);
        }
        next
    }
}

//! Window management: app catalog, window collection and pointer gestures.

pub mod catalog;
pub mod gesture;
mod manager;

pub use catalog::{AppDefinition, LaunchPolicy, find_app, find_app_by_name, search_apps};
pub use gesture::{Geometry, Gesture, GestureKind, HitTarget, Point, ResizeEdge, resize_geometry};
pub use manager::{
    WindowData, WindowId, WindowInstance, WindowManager, WindowPatch, active_window_id,
};

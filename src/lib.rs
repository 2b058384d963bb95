//! Durgas: state core for the DurgasOS simulated desktop.
//!
//! The crate owns everything a desktop UI renders from, without rendering
//! anything itself:
//!
//! - **Windows**: app catalog, z-ordered window collection, drag and resize
//!   gestures
//! - **File system**: an in-memory tree with copy-on-write snapshots and a
//!   small terminal over it
//! - **Voice assistant**: wake phrase, command capture, a two-round tool
//!   calling exchange with an AI gateway, spoken replies
//! - **Realtime sessions**: duplex streaming voice with transcripts
//!
//! A [`Desktop`] holds the shared state and publishes [`DesktopEvent`]s; the
//! [`host`] module exposes it over newline-delimited JSON. AI, speech and
//! audio are reached through the traits in [`gateway`] and [`platform`].

pub mod assistant;
pub mod config;
pub mod desktop;
pub mod error;
pub mod gateway;
pub mod host;
pub mod platform;
pub mod realtime;
pub mod runtime;
pub mod settings;
pub mod shell;
pub mod vfs;
pub mod voice;
pub mod window;

pub use assistant::{AssistantCoordinator, AssistantHandle, AssistantState};
pub use config::DesktopConfig;
pub use desktop::Desktop;
pub use error::{DesktopError, Result};
pub use realtime::RealtimeSessionManager;
pub use runtime::DesktopEvent;

//! Integration tests, consolidated into a single binary.

// Allow unwrap/expect in test code
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod helpers;

mod assistant_flow;
mod config_roundtrip;
mod desktop_properties;
mod host_bridge;
mod realtime_session;

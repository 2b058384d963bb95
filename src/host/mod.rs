//! Host bridge: versioned JSON envelopes between the desktop core and a UI
//! shell, with a stdio transport.

pub mod channel;
pub mod contract;
pub mod handler;
pub mod stdio;

pub use channel::{HostCommandClient, HostCommandServer, command_channel, event_envelope};
pub use contract::{CommandEnvelope, CommandName, EventEnvelope, ResponseEnvelope};
pub use handler::DesktopHost;
pub use stdio::run_stdio_bridge;

//! Host command channel: request/response plumbing plus forwarding of
//! desktop events as [`EventEnvelope`]s.

use crate::error::{DesktopError, Result};
use crate::host::contract::{CommandEnvelope, EventEnvelope, ResponseEnvelope};
use crate::host::handler::DesktopHost;
use crate::runtime::DesktopEvent;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, warn};

struct HostCommandRequest {
    envelope: CommandEnvelope,
    response_tx: oneshot::Sender<ResponseEnvelope>,
}

#[derive(Clone)]
pub struct HostCommandClient {
    request_tx: mpsc::Sender<HostCommandRequest>,
    event_tx: broadcast::Sender<EventEnvelope>,
}

impl HostCommandClient {
    /// Validate `envelope`, hand it to the server and wait for the response.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a malformed envelope, `Channel` when the server is
    /// gone.
    pub async fn send(&self, envelope: CommandEnvelope) -> Result<ResponseEnvelope> {
        envelope.validate().map_err(|e| {
            DesktopError::InvalidInput(format!(
                "invalid host command envelope {}: {}",
                envelope.request_id, e
            ))
        })?;

        let (response_tx, response_rx) = oneshot::channel();
        self.request_tx
            .send(HostCommandRequest {
                envelope,
                response_tx,
            })
            .await
            .map_err(|e| DesktopError::Channel(format!("failed to send host command request: {e}")))?;

        response_rx
            .await
            .map_err(|e| DesktopError::Channel(format!("host command response dropped: {e}")))
    }

    #[must_use]
    pub fn subscribe_events(&self) -> broadcast::Receiver<EventEnvelope> {
        self.event_tx.subscribe()
    }
}

pub struct HostCommandServer {
    request_rx: mpsc::Receiver<HostCommandRequest>,
    event_tx: broadcast::Sender<EventEnvelope>,
    desktop_events: broadcast::Receiver<DesktopEvent>,
    host: Arc<DesktopHost>,
}

#[must_use]
pub fn command_channel(
    request_capacity: usize,
    event_capacity: usize,
    host: Arc<DesktopHost>,
) -> (HostCommandClient, HostCommandServer) {
    let (request_tx, request_rx) = mpsc::channel(request_capacity.max(1));
    let (event_tx, _event_rx) = broadcast::channel(event_capacity.max(1));
    let desktop_events = host.desktop().subscribe();

    (
        HostCommandClient {
            request_tx,
            event_tx: event_tx.clone(),
        },
        HostCommandServer {
            request_rx,
            event_tx,
            desktop_events,
            host,
        },
    )
}

impl HostCommandServer {
    /// Serve requests in arrival order and forward desktop events until
    /// every client is dropped.
    pub async fn run(mut self) {
        let mut forwarding = true;
        loop {
            tokio::select! {
                request = self.request_rx.recv() => {
                    let Some(request) = request else { break };
                    let response = self.route(&request.envelope).await;
                    let _ = request.response_tx.send(response);
                }
                event = self.desktop_events.recv(), if forwarding => match event {
                    Ok(event) => self.emit_event(&event),
                    Err(RecvError::Lagged(n)) => {
                        warn!(lagged = n, "desktop event forwarder lagged; events dropped");
                    }
                    Err(RecvError::Closed) => {
                        debug!("desktop event channel closed");
                        forwarding = false;
                    }
                },
            }
        }
    }

    pub async fn route(&self, envelope: &CommandEnvelope) -> ResponseEnvelope {
        self.host.route(envelope).await
    }

    fn emit_event(&self, event: &DesktopEvent) {
        match event_envelope(event) {
            Ok(envelope) => {
                // No subscribers is fine.
                let _ = self.event_tx.send(envelope);
            }
            Err(e) => warn!(event = event.name(), error = %e, "failed to encode desktop event"),
        }
    }
}

/// Wrap a desktop event in a v1 envelope with a fresh id.
pub fn event_envelope(event: &DesktopEvent) -> Result<EventEnvelope> {
    let mut value = serde_json::to_value(event)
        .map_err(|e| DesktopError::Channel(format!("failed to serialize event: {e}")))?;
    let payload = value
        .get_mut("payload")
        .map(serde_json::Value::take)
        .unwrap_or(serde_json::Value::Null);
    Ok(EventEnvelope::new(
        uuid::Uuid::new_v4().to_string(),
        event.name(),
        payload,
    ))
}

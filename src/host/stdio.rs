//! Stdin/stdout JSON bridge for the host command channel.
//!
//! Reads newline-delimited JSON `CommandEnvelope` messages from stdin,
//! dispatches them through the `HostCommandServer` router, and writes
//! `ResponseEnvelope` and `EventEnvelope` messages as newline-delimited
//! JSON to stdout.
//!
//! Stdout is reserved for the protocol; tracing goes to stderr.

use crate::error::{DesktopError, Result};
use crate::host::channel::{HostCommandClient, command_channel};
use crate::host::contract::{CommandEnvelope, CommandName, ResponseEnvelope};
use crate::host::handler::DesktopHost;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::Mutex;
use tokio::sync::broadcast::error::RecvError;

const REQUEST_CAPACITY: usize = 64;
const EVENT_CAPACITY: usize = 256;

type SharedWriter = Arc<Mutex<BufWriter<tokio::io::Stdout>>>;

/// Run the bridge until stdin closes or `host.shutdown` is handled.
///
/// The reader runs on the calling task; the router and the event forwarder
/// are spawned. Dropping the client when the reader returns stops the
/// router.
pub async fn run_stdio_bridge(host: Arc<DesktopHost>) -> Result<()> {
    let (client, server) = command_channel(REQUEST_CAPACITY, EVENT_CAPACITY, host);
    let writer: SharedWriter = Arc::new(Mutex::new(BufWriter::new(tokio::io::stdout())));

    let server_handle = tokio::spawn(server.run());

    let event_writer = Arc::clone(&writer);
    let mut event_rx = client.subscribe_events();
    let event_handle = tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(envelope) => match serde_json::to_string(&envelope) {
                    Ok(json) => {
                        let mut w = event_writer.lock().await;
                        if let Err(e) = write_line(&mut *w, &json).await {
                            tracing::warn!(error = %e, "stdout closed; stopping event forwarder");
                            break;
                        }
                    }
                    Err(e) => tracing::error!(error = %e, "failed to serialize event envelope"),
                },
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "event forwarder lagged; some events were dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let reader_result = run_reader(client, Arc::clone(&writer)).await;

    event_handle.abort();
    let _ = event_handle.await;
    let _ = server_handle.await;

    reader_result
}

async fn run_reader(client: HostCommandClient, writer: SharedWriter) -> Result<()> {
    let mut reader = BufReader::new(tokio::io::stdin());
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader
            .read_line(&mut line)
            .await
            .map_err(|e| DesktopError::Channel(format!("failed to read from stdin: {e}")))?;
        if bytes_read == 0 {
            tracing::info!("stdin closed; shutting down stdio bridge");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let (response, is_shutdown) = match parse_command(trimmed) {
            Ok(envelope) => {
                let is_shutdown = envelope.command == CommandName::HostShutdown;
                let request_id = envelope.request_id.clone();
                let response = client.send(envelope).await.unwrap_or_else(|e| {
                    tracing::error!(error = %e, "host command dispatch failed");
                    ResponseEnvelope::from_error(request_id, &e)
                });
                (response, is_shutdown)
            }
            Err(response) => (response, false),
        };

        let json = serde_json::to_string(&response)
            .map_err(|e| DesktopError::Channel(format!("failed to serialize response: {e}")))?;
        {
            let mut w = writer.lock().await;
            write_line(&mut *w, &json).await?;
        }

        if is_shutdown {
            tracing::info!("host.shutdown received; stopping stdio bridge");
            break;
        }
    }

    Ok(())
}

/// Parse one stdin line, or build the error response for it.
fn parse_command(raw: &str) -> std::result::Result<CommandEnvelope, ResponseEnvelope> {
    serde_json::from_str(raw).map_err(|e| {
        tracing::warn!(error = %e, raw_line = %raw, "failed to parse command envelope");
        ResponseEnvelope::error("parse-error", format!("failed to parse command envelope: {e}"))
    })
}

/// Write one JSON line and flush.
async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, json: &str) -> Result<()> {
    writer
        .write_all(json.as_bytes())
        .await
        .map_err(|e| DesktopError::Channel(format!("failed to write to stdout: {e}")))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| DesktopError::Channel(format!("failed to write newline to stdout: {e}")))?;
    writer
        .flush()
        .await
        .map_err(|e| DesktopError::Channel(format!("failed to flush stdout: {e}")))
}

//! The TCP ingest server.
//!
//! Accepts connections from sensor nodes, decodes one wire message per
//! connection and enqueues the canonical row for the single durable writer
//! (see [`writer`]). Handler fan-out is bounded by a semaphore so a
//! connection burst cannot exhaust the process; each handler performs at
//! most one deadline-bounded read, parses, enqueues and unconditionally
//! closes its socket.
//!
//! Per-connection decode errors are logged and never affect the listener or
//! other in-flight handlers.

pub mod writer;

pub use writer::{RowSender, WriterHandle, WriterMessage};

use crate::config::ServerSettings;
use crate::error::{Result, ThermologError};
use crate::reading::WireReading;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Semaphore};
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, warn};

/// Fixed receive buffer; oversized payloads are truncated and fail to parse.
pub const RECV_BUFFER_BYTES: usize = 1024;

pub struct IngestServer {
    listener: TcpListener,
    rows: RowSender,
    handler_permits: Arc<Semaphore>,
    read_timeout: Duration,
}

impl IngestServer {
    /// Bind the listening endpoint. A failure here is fatal to startup.
    pub async fn bind(settings: &ServerSettings, rows: RowSender) -> Result<Self> {
        let addr = format!("{}:{}", settings.bind_addr, settings.port);
        let listener = TcpListener::bind(&addr).await?;
        info!(%addr, "ingest server listening");

        Ok(Self {
            listener,
            rows,
            handler_permits: Arc::new(Semaphore::new(settings.max_connections)),
            read_timeout: Duration::from_millis(settings.read_timeout_ms),
        })
    }

    /// The bound address (useful when binding port 0).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept loop. Returns when the shutdown signal fires; in-flight
    /// handlers finish on their own and the writer drains afterwards.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((socket, addr)) => self.spawn_handler(socket, addr).await,
                        Err(e) => error!("accept error: {e}"),
                    }
                }

                _ = shutdown.changed() => {
                    info!("shutdown requested, closing listener");
                    return Ok(());
                }
            }
        }
    }

    async fn spawn_handler(&self, socket: TcpStream, addr: SocketAddr) {
        // bounds concurrent handlers; accept waits when all permits are out
        let permit = match self.handler_permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return, // semaphore closed, shutting down
        };

        let rows = self.rows.clone();
        let read_timeout = self.read_timeout;

        tokio::spawn(async move {
            let _permit = permit;
            if let Err(e) = handle_connection(socket, addr, rows, read_timeout).await {
                warn!(%addr, "connection error: {e}");
            }
        });
    }
}

/// Read at most one receive buffer, decode one wire message, enqueue the
/// row. The socket closes when it drops, whatever the outcome.
async fn handle_connection(
    mut socket: TcpStream,
    addr: SocketAddr,
    rows: RowSender,
    read_timeout: Duration,
) -> Result<()> {
    debug!(%addr, "connection accepted");

    let mut buf = vec![0u8; RECV_BUFFER_BYTES];
    let n = timeout(read_timeout, socket.read(&mut buf))
        .await
        .map_err(|_| ThermologError::Parse(format!("read from {addr} timed out")))??;

    let row = parse_wire_message(&buf[..n])?;
    debug!(%addr, %row, "queued row");
    enqueue_row(&rows, row)
}

/// Hand a row to the writer queue. The unbounded send only fails when the
/// writer is already gone, a race that exists only during shutdown.
fn enqueue_row(rows: &RowSender, row: String) -> Result<()> {
    rows.send(WriterMessage::Row(row))
        .map_err(|_| ThermologError::WriterQueueClosed)
}

/// Decode one wire message: a JSON array containing exactly one reading
/// object. Returns the canonical log row.
pub fn parse_wire_message(data: &[u8]) -> Result<String> {
    if data.is_empty() {
        return Err(ThermologError::Parse("empty message".to_string()));
    }

    let readings: Vec<WireReading> = serde_json::from_slice(data)
        .map_err(|e| ThermologError::Parse(e.to_string()))?;

    match readings.as_slice() {
        [reading] => Ok(reading.to_row()),
        other => Err(ThermologError::Parse(format!(
            "expected exactly one reading record, got {}",
            other.len()
        ))),
    }
}

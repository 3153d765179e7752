//! The durable log writer.
//!
//! A single dedicated task drains an unbounded FIFO queue of serialized
//! rows and appends them to the log file. Connection handlers never touch
//! the file; only this task does, so rows can never interleave and no file
//! locking is needed. The order rows land in the file is the order they were
//! enqueued.
//!
//! Each row is written under a scoped file handle: open for append, write
//! row plus terminator in one call, flush, drop. A failed write is logged
//! and the row dropped; the writer carries on with the next item.
//!
//! Shutdown is a graceful drain: the stop sentinel is enqueued behind any
//! pending rows, so everything queued ahead of it is written before the
//! task exits.

use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// An item handed to the writer queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriterMessage {
    /// One serialized log row, without the trailing newline.
    Row(String),
    /// Stop sentinel: drain no further and exit.
    Shutdown,
}

/// Sending half of the writer queue, cloned into every connection handler.
pub type RowSender = mpsc::UnboundedSender<WriterMessage>;

/// Owns the writer task and its queue.
pub struct WriterHandle {
    sender: RowSender,
    task: JoinHandle<()>,
}

impl WriterHandle {
    /// Spawn the writer task appending to `log_path`.
    pub fn spawn(log_path: PathBuf) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_writer(log_path, receiver));
        Self { sender, task }
    }

    /// A cloneable sender for enqueueing rows.
    pub fn sender(&self) -> RowSender {
        self.sender.clone()
    }

    /// Enqueue the stop sentinel and wait for the writer to finish draining
    /// everything queued ahead of it.
    pub async fn shutdown(self) {
        let _ = self.sender.send(WriterMessage::Shutdown);
        if let Err(e) = self.task.await {
            error!("writer task failed to join: {e}");
        }
    }
}

async fn run_writer(log_path: PathBuf, mut receiver: mpsc::UnboundedReceiver<WriterMessage>) {
    info!(log = %log_path.display(), "writer task started");

    while let Some(message) = receiver.recv().await {
        match message {
            WriterMessage::Shutdown => {
                info!("writer received stop sentinel");
                break;
            }
            WriterMessage::Row(row) => match append_row(&log_path, &row).await {
                Ok(()) => debug!(%row, "wrote row"),
                // transient failure: drop the row, keep the writer alive
                Err(e) => warn!(%row, "write failed, row dropped: {e}"),
            },
        }
    }

    info!("writer task stopped");
}

/// Append one row with a scoped file handle, released before returning.
async fn append_row(log_path: &Path, row: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .await?;

    // single write call for the whole line, so a row can never be split
    let mut line = String::with_capacity(row.len() + 1);
    line.push_str(row);
    line.push('\n');
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}

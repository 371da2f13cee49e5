//! Output ingest loop.
//!
//! One long-lived task drains the shared PTY byte channel into the
//! virtual screen. Reader threads come and go with each child process;
//! this task outlives them all and only exits on cancellation. When a
//! child dies, its reader thread ends at EOF and the channel simply
//! goes quiet until a restart installs a new reader.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::bridge::session::Session;
use crate::bridge::supervisor::OutputChunk;

/// Drain PTY output into the session screen until cancellation.
pub async fn run(
    session: Arc<Session>,
    mut output_rx: mpsc::UnboundedReceiver<OutputChunk>,
    cancel: CancellationToken,
) {
    debug!("ingest loop started");
    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!("ingest loop cancelled");
                break;
            }
            chunk = output_rx.recv() => {
                match chunk {
                    Some(chunk) => {
                        trace!(len = chunk.bytes.len(), "ingesting child output");
                        session.feed(chunk).await;
                    }
                    // All senders dropped; nothing more will arrive.
                    None => {
                        debug!("pty output channel closed; ingest loop exiting");
                        break;
                    }
                }
            }
        }
    }
}

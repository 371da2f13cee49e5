//! Shared session state.
//!
//! One `Session` instance is shared (via `Arc`) by the ingest loop, the
//! aggregator, and the command router. Concurrency follows a
//! single-writer-per-field discipline: the ingest loop writes
//! `last_output` and the screen, the aggregator writes `last_sent`, and
//! the router writes the mode, force-flush flag, and launch
//! configuration. Timestamps are milliseconds since session start on an
//! atomic, so readers never block writers.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, info};

use crate::bridge::launch::LaunchConfig;
use crate::bridge::screen::VirtualScreen;
use crate::bridge::supervisor::{ChildSupervisor, OutputChunk};
use crate::config::GlobalConfig;
use crate::Result;

/// Shared state for the single bridged session.
pub struct Session {
    /// Validated global configuration.
    pub config: GlobalConfig,
    start: Instant,
    screen: Mutex<VirtualScreen>,
    supervisor: Mutex<ChildSupervisor>,
    launch: RwLock<LaunchConfig>,
    /// Restart counter; output chunks tagged with an older value come
    /// from a torn-down child and are discarded.
    generation: AtomicU64,
    /// Milliseconds since `start` when the screen last changed.
    last_output_ms: AtomicU64,
    /// Milliseconds since `start` when a snapshot was last emitted.
    last_sent_ms: AtomicU64,
    /// `true` = streaming mode, `false` = silent mode.
    streaming: AtomicBool,
    /// One-shot fast-path flag raised after operator input.
    force_flush: AtomicBool,
}

impl Session {
    /// Build a session around the shared PTY output channel.
    #[must_use]
    pub fn new(config: GlobalConfig, output_tx: mpsc::UnboundedSender<OutputChunk>) -> Self {
        let screen = VirtualScreen::new(config.screen.cols, config.screen.rows);
        let supervisor = ChildSupervisor::new(
            config.program.clone(),
            config.screen.cols,
            config.screen.rows,
            output_tx,
        );
        Self {
            config,
            start: Instant::now(),
            screen: Mutex::new(screen),
            supervisor: Mutex::new(supervisor),
            launch: RwLock::new(LaunchConfig::Base),
            generation: AtomicU64::new(0),
            last_output_ms: AtomicU64::new(0),
            last_sent_ms: AtomicU64::new(0),
            // Silent is the default; /mode switches to streaming.
            streaming: AtomicBool::new(false),
            force_flush: AtomicBool::new(false),
        }
    }

    /// Milliseconds elapsed since session start.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Feed one chunk of child output into the screen and stamp
    /// `last_output`.
    ///
    /// Chunks tagged with a generation other than the current one were
    /// produced by a torn-down child and are discarded, so output
    /// still in flight across a restart never repaints the fresh
    /// screen.
    pub async fn feed(&self, chunk: OutputChunk) {
        if chunk.generation != self.generation.load(Ordering::Relaxed) {
            debug!(
                generation = chunk.generation,
                len = chunk.bytes.len(),
                "discarding output from previous child"
            );
            return;
        }
        self.screen.lock().await.feed(&chunk.bytes);
        self.last_output_ms.store(self.now_ms(), Ordering::Relaxed);
    }

    /// Rendered screen rows (trailing whitespace trimmed per row).
    pub async fn screen_rows(&self) -> Vec<String> {
        self.screen.lock().await.rows()
    }

    /// When the screen last changed, in ms since session start.
    #[must_use]
    pub fn last_output_ms(&self) -> u64 {
        self.last_output_ms.load(Ordering::Relaxed)
    }

    /// When a snapshot was last emitted, in ms since session start.
    #[must_use]
    pub fn last_sent_ms(&self) -> u64 {
        self.last_sent_ms.load(Ordering::Relaxed)
    }

    /// Advance `last_sent` to now. Called by the aggregator on every
    /// emit decision, even when the filtered snapshot turns out empty.
    pub fn note_sent(&self) {
        self.last_sent_ms.store(self.now_ms(), Ordering::Relaxed);
    }

    /// Whether streaming mode is active.
    #[must_use]
    pub fn streaming(&self) -> bool {
        self.streaming.load(Ordering::Relaxed)
    }

    /// Flip between streaming and silent mode; returns the new value.
    #[must_use]
    pub fn toggle_mode(&self) -> bool {
        !self.streaming.fetch_xor(true, Ordering::Relaxed)
    }

    /// Whether the one-shot force-flush flag is raised.
    #[must_use]
    pub fn force_flush(&self) -> bool {
        self.force_flush.load(Ordering::Relaxed)
    }

    /// Raise the force-flush flag (after operator input to the child).
    pub fn raise_force_flush(&self) {
        self.force_flush.store(true, Ordering::Relaxed);
    }

    /// Clear the force-flush flag (consumed by an emit).
    pub fn clear_force_flush(&self) {
        self.force_flush.store(false, Ordering::Relaxed);
    }

    /// The launch configuration the child is currently running with.
    pub async fn current_launch(&self) -> LaunchConfig {
        self.launch.read().await.clone()
    }

    /// Restart the child under a new launch configuration.
    ///
    /// Advances the output generation first, so any chunks the old
    /// child still has in flight are discarded by [`feed`](Self::feed),
    /// then resets the virtual screen and (re)starts the supervisor.
    /// Runs entirely within one command-handling flow, so restarts
    /// never overlap.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Spawn` if the child fails to launch; the
    /// session is left with no running child.
    pub async fn restart(&self, launch: LaunchConfig) -> Result<()> {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        info!(launch = %launch, generation, "restarting child");
        self.screen.lock().await.reset();
        let now = self.now_ms();
        self.last_output_ms.store(now, Ordering::Relaxed);
        self.last_sent_ms.store(now, Ordering::Relaxed);
        self.clear_force_flush();
        *self.launch.write().await = launch.clone();
        self.supervisor.lock().await.start(&launch, generation)
    }

    /// Write raw bytes to the child's terminal.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Pty` if no child is running or the write fails.
    pub async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.supervisor.lock().await.write(bytes)
    }

    /// Deliver Ctrl+C to the child.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Pty` if no child is running.
    pub async fn interrupt(&self) -> Result<()> {
        self.supervisor.lock().await.interrupt()
    }

    /// Whether the child process is currently alive.
    pub async fn is_running(&self) -> bool {
        self.supervisor.lock().await.is_running()
    }

    /// Process id of the running child, if any.
    pub async fn pid(&self) -> Option<u32> {
        self.supervisor.lock().await.pid()
    }

    /// Kill the child and release the PTY. Used at shutdown.
    pub async fn shutdown(&self) {
        self.supervisor.lock().await.terminate_and_wait();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::config::GlobalConfig;

    fn test_session() -> Session {
        // A program name that cannot resolve, so restart spawn attempts
        // fail deterministically instead of launching anything.
        let config = GlobalConfig::from_toml_str(
            "program = \"claude-bridge-no-such-binary\"\n[telegram]\nchat_id = 42\n",
        )
        .unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        Session::new(config, tx)
    }

    #[tokio::test]
    async fn feed_updates_screen_and_timestamp() {
        let session = test_session();
        assert_eq!(session.last_output_ms(), 0);
        session.feed(OutputChunk::new(0, b"hello".to_vec())).await;
        assert_eq!(session.screen_rows().await[0], "hello");
    }

    #[tokio::test]
    async fn new_session_starts_in_silent_mode() {
        let session = test_session();
        assert!(!session.streaming());
    }

    #[tokio::test]
    async fn mode_toggle_round_trips() {
        let session = test_session();
        assert!(!session.streaming());
        assert!(session.toggle_mode());
        assert!(session.streaming());
        assert!(!session.toggle_mode());
        assert!(!session.streaming());
    }

    #[tokio::test]
    async fn restart_discards_output_from_previous_child() {
        let session = test_session();
        session
            .feed(OutputChunk::new(0, b"old session secret".to_vec()))
            .await;
        assert_eq!(session.screen_rows().await[0], "old session secret");

        // Spawn fails (nonexistent binary), but the generation bump
        // and screen reset still happen.
        assert!(session.restart(LaunchConfig::Base).await.is_err());
        let stamped = session.last_output_ms();

        // A chunk the old child left in flight is dropped and does
        // not touch the screen or the output timestamp.
        session
            .feed(OutputChunk::new(0, b"old session secret".to_vec()))
            .await;
        assert!(session.screen_rows().await.iter().all(String::is_empty));
        assert_eq!(session.last_output_ms(), stamped);

        // Output tagged with the new generation is accepted.
        session
            .feed(OutputChunk::new(1, b"fresh output".to_vec()))
            .await;
        assert_eq!(session.screen_rows().await[0], "fresh output");
    }

    #[tokio::test]
    async fn force_flush_is_one_shot() {
        let session = test_session();
        assert!(!session.force_flush());
        session.raise_force_flush();
        assert!(session.force_flush());
        session.clear_force_flush();
        assert!(!session.force_flush());
    }

    #[tokio::test]
    async fn write_without_child_is_rejected() {
        let session = test_session();
        assert!(session.write_bytes(b"hi").await.is_err());
        assert!(session.interrupt().await.is_err());
        assert!(!session.is_running().await);
        assert_eq!(session.pid().await, None);
    }
}

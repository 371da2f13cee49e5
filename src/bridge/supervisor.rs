//! Child process supervisor.
//!
//! Owns the pseudo-terminal pair and the child process lifecycle. At
//! most one child and one PTY pair are live at any time: `start` always
//! fully tears down the previous process (best-effort) before
//! allocating fresh handles.

use std::io::{Read, Write};

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::bridge::launch::LaunchConfig;
use crate::{AppError, Result};

/// Chunk size for blocking PTY reads.
const READ_CHUNK: usize = 4096;

/// Interrupt control byte (Ctrl+C).
pub const INTERRUPT_BYTE: u8 = 0x03;

/// One read's worth of child output, tagged with the generation of the
/// child that produced it.
///
/// The tag lets the session discard chunks a torn-down child left in
/// flight across a restart; without it, stale output would repaint the
/// freshly reset screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    /// Restart generation of the producing child.
    pub generation: u64,
    /// Raw bytes read from the PTY master.
    pub bytes: Vec<u8>,
}

impl OutputChunk {
    /// Tag a chunk of output with its producing generation.
    #[must_use]
    pub fn new(generation: u64, bytes: Vec<u8>) -> Self {
        Self { generation, bytes }
    }
}

/// Supervisor for the single pseudo-terminal-backed child process.
pub struct ChildSupervisor {
    program: String,
    cols: u16,
    rows: u16,
    /// Shared channel into the ingest loop. Each child gets its own
    /// blocking reader task forwarding into this sender; the task ends
    /// at EOF when the child dies.
    output_tx: mpsc::UnboundedSender<OutputChunk>,
    master: Option<Box<dyn MasterPty + Send>>,
    writer: Option<Box<dyn Write + Send>>,
    child: Option<Box<dyn Child + Send>>,
    pid: Option<u32>,
}

impl ChildSupervisor {
    /// Create a supervisor with no running child.
    #[must_use]
    pub fn new(
        program: impl Into<String>,
        cols: u16,
        rows: u16,
        output_tx: mpsc::UnboundedSender<OutputChunk>,
    ) -> Self {
        Self {
            program: program.into(),
            cols,
            rows,
            output_tx,
            master: None,
            writer: None,
            child: None,
            pid: None,
        }
    }

    /// Start (or restart) the child with the given launch configuration.
    ///
    /// Tears down any existing child and PTY pair first, then allocates
    /// a fresh pair, spawns the child with stdin/stdout/stderr on the
    /// slave side, and closes the slave in the parent. The new child's
    /// reader tags every chunk with `generation` so the session can
    /// tell its output apart from a predecessor's.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Spawn` if the PTY cannot be allocated or the
    /// child fails to launch; the supervisor is left with no running
    /// child in that case.
    pub fn start(&mut self, launch: &LaunchConfig, generation: u64) -> Result<()> {
        self.terminate_and_wait();

        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: self.rows,
                cols: self.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|err| AppError::Spawn(format!("failed to open pty: {err}")))?;

        let argv = launch.argv(&self.program);
        let mut cmd = CommandBuilder::new(&argv[0]);
        cmd.args(&argv[1..]);

        // CommandBuilder starts with an empty environment; inherit the
        // parent's, then add the terminal hints.
        for (key, value) in std::env::vars() {
            cmd.env(key, value);
        }
        cmd.env("TERM", "xterm-256color");
        cmd.env("COLUMNS", self.cols.to_string());
        cmd.env("LINES", self.rows.to_string());

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|err| AppError::Spawn(format!("failed to spawn {}: {err}", self.program)))?;

        // Parent side no longer needs the slave descriptor.
        drop(pair.slave);

        let writer = pair
            .master
            .take_writer()
            .map_err(|err| AppError::Spawn(format!("failed to take pty writer: {err}")))?;
        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|err| AppError::Spawn(format!("failed to clone pty reader: {err}")))?;

        let pid = child.process_id();
        info!(
            pid,
            generation,
            command = %launch.command_line(&self.program),
            "child process started"
        );

        // Detached on purpose; the task ends itself at EOF.
        let _reader_task = spawn_reader(reader, generation, self.output_tx.clone());

        self.master = Some(pair.master);
        self.writer = Some(writer);
        self.child = Some(child);
        self.pid = pid;
        Ok(())
    }

    /// Write raw bytes to the PTY master side.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Pty` if no child is running or the write fails.
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| AppError::Pty("no child process running".into()))?;
        writer
            .write_all(bytes)
            .and_then(|()| writer.flush())
            .map_err(|err| AppError::Pty(format!("pty write failed: {err}")))?;
        debug!(len = bytes.len(), "wrote to pty");
        Ok(())
    }

    /// Deliver a keyboard interrupt (Ctrl+C) to the child.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Pty` if no child is running.
    pub fn interrupt(&mut self) -> Result<()> {
        self.write(&[INTERRUPT_BYTE])
    }

    /// Kill the current child (if any) and release the PTY pair.
    ///
    /// Teardown is best-effort: errors are logged, never propagated.
    pub fn terminate_and_wait(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(err) = child.kill() {
                warn!(%err, "failed to kill child (may have already exited)");
            }
            // Reap so the old process cannot linger as a zombie.
            if let Err(err) = child.wait() {
                warn!(%err, "failed to wait for child exit");
            }
            info!(pid = self.pid, "child process terminated");
        }
        // Dropping the handles closes the master descriptor; the reader
        // task for the old child ends at EOF.
        drop(self.writer.take());
        drop(self.master.take());
        self.pid = None;
    }

    /// Whether a child is currently running.
    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            None => false,
            Some(child) => match child.try_wait() {
                Ok(None) => true,
                Ok(Some(_)) | Err(_) => false,
            },
        }
    }

    /// Process id of the current child, if one is running.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }
}

impl Drop for ChildSupervisor {
    fn drop(&mut self) {
        self.terminate_and_wait();
    }
}

/// Forward blocking PTY reads into the ingest channel.
///
/// Runs on the blocking thread pool; exits at EOF or read error (both
/// mean the child side is gone) or when the ingest loop has shut down.
fn spawn_reader(
    mut reader: Box<dyn Read + Send>,
    generation: u64,
    tx: mpsc::UnboundedSender<OutputChunk>,
) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let mut buf = [0u8; READ_CHUNK];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => {
                    debug!("pty reader reached eof");
                    break;
                }
                Ok(n) => {
                    if tx.send(OutputChunk::new(generation, buf[..n].to_vec())).is_err() {
                        debug!("ingest channel closed; pty reader exiting");
                        break;
                    }
                }
                Err(err) => {
                    debug!(%err, "pty read failed; reader exiting");
                    break;
                }
            }
        }
    })
}

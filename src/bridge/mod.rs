//! Terminal bridging core.
//!
//! Owns the pseudo-terminal-backed child process, feeds its raw output
//! into a virtual terminal emulator, and decides when accumulated
//! screen state should be flushed to the operator as a snapshot.

pub mod aggregator;
pub mod ingest;
pub mod launch;
pub mod router;
pub mod screen;
pub mod session;
pub mod supervisor;

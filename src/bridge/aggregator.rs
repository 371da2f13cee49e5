//! Output aggregation policy engine.
//!
//! A fixed-interval tick loop decides when the accumulated screen state
//! is worth sending as a snapshot. The decision itself is a pure
//! function of the timestamps and mode flags so the policy can be
//! tested without a clock or a child process.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::bridge::session::Session;
use crate::config::TimingConfig;
use crate::telegram::OutboundMessage;

/// Marker prefixed to a snapshot whose head was truncated away.
const TRUNCATION_MARKER: &str = "...\n";

/// Outcome of one aggregation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Nothing to send this tick.
    Skip,
    /// Emit a snapshot now.
    Emit {
        /// Whether the one-shot force-flush flag should be cleared.
        clear_force: bool,
    },
}

/// Decide whether a snapshot should be emitted at `now_ms`.
///
/// All timestamps are milliseconds on the same monotonic clock.
/// Streaming mode emits once output has been quiet for the debounce
/// window, with a max-wait heartbeat so continuous output still
/// produces periodic snapshots. Silent mode emits only when output has
/// been idle past the threshold, except that the force-flush flag
/// (raised after operator input) lowers the bar to the settle window
/// once.
#[must_use]
pub fn decide(
    now_ms: u64,
    last_output_ms: u64,
    last_sent_ms: u64,
    streaming: bool,
    force_flush: bool,
    timing: &TimingConfig,
) -> Decision {
    // Nothing new since the last send.
    if last_output_ms <= last_sent_ms {
        return Decision::Skip;
    }
    let silence = now_ms.saturating_sub(last_output_ms);
    let since_send = now_ms.saturating_sub(last_sent_ms);

    if streaming {
        if silence >= timing.debounce_ms || since_send >= timing.max_wait_ms {
            return Decision::Emit {
                clear_force: force_flush,
            };
        }
        return Decision::Skip;
    }
    if force_flush {
        if silence >= timing.settle_ms {
            return Decision::Emit { clear_force: true };
        }
        return Decision::Skip;
    }
    if silence >= timing.idle_threshold_ms {
        return Decision::Emit { clear_force: false };
    }
    Decision::Skip
}

/// Join screen rows into snapshot text, dropping blank rows and rows
/// matching any noise rule (case-insensitive substring match).
#[must_use]
pub fn filter_rows(rows: &[String], noise_substrings: &[String]) -> String {
    let lowered: Vec<String> = noise_substrings
        .iter()
        .map(|s| s.to_lowercase())
        .collect();
    rows.iter()
        .filter(|row| !row.is_empty())
        .filter(|row| {
            let row = row.to_lowercase();
            !lowered.iter().any(|noise| row.contains(noise.as_str()))
        })
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keep the trailing `max_chars` characters, prefixing a marker when
/// anything was cut. The most recent output lives at the bottom of the
/// screen, so the tail is the part worth keeping.
#[must_use]
pub fn truncate_tail(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_owned();
    }
    let tail: String = text.chars().skip(total - max_chars).collect();
    format!("{TRUNCATION_MARKER}{tail}")
}

/// Tick loop: evaluate the policy and hand snapshots to the outbound
/// queue until cancellation.
pub async fn run(
    session: Arc<Session>,
    outbound: mpsc::Sender<OutboundMessage>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(session.config.timing.tick());
    debug!(tick_ms = session.config.timing.tick_ms, "aggregator started");
    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!("aggregator cancelled");
                break;
            }
            _ = ticker.tick() => {
                let decision = decide(
                    session.now_ms(),
                    session.last_output_ms(),
                    session.last_sent_ms(),
                    session.streaming(),
                    session.force_flush(),
                    &session.config.timing,
                );
                let Decision::Emit { clear_force } = decision else {
                    continue;
                };

                let rows = session.screen_rows().await;
                // Advance last_sent unconditionally so a noise-only
                // frame is not re-examined every tick.
                session.note_sent();
                if clear_force {
                    session.clear_force_flush();
                }

                let text = filter_rows(&rows, &session.config.filter.noise_substrings);
                if text.is_empty() {
                    trace!("snapshot filtered to empty, suppressing send");
                    continue;
                }
                let text = truncate_tail(&text, session.config.max_message_chars);
                if outbound.send(OutboundMessage::preformatted(text)).await.is_err() {
                    debug!("outbound queue closed; aggregator exiting");
                    break;
                }
            }
        }
    }
}

//! Telegram transport boundary.
//!
//! All Bot API traffic goes through this module: outbound delivery via
//! a queued worker, inbound updates via a dispatcher with an
//! authorization guard.

pub mod client;
pub mod dispatch;

pub use client::{OutboundMessage, RenderMode, TelegramService};

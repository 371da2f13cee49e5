//! Outbound Telegram delivery.
//!
//! A single worker drains the outbound queue so messages reach the chat
//! in order. Delivery failures are logged and the message dropped; the
//! next snapshot supersedes a lost one, so there is no retry.

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::html;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::{AppError, Result};

/// How a message body is rendered in the chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Plain conversational text (confirmations, status, help).
    Styled,
    /// Monospace block, HTML-escaped and wrapped in `<pre>`.
    Preformatted,
}

/// A message queued for delivery to the authorized chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Message body before transport encoding.
    pub text: String,
    /// Rendering treatment.
    pub render: RenderMode,
}

impl OutboundMessage {
    /// Plain conversational message.
    #[must_use]
    pub fn styled(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            render: RenderMode::Styled,
        }
    }

    /// Monospace terminal-snapshot message.
    #[must_use]
    pub fn preformatted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            render: RenderMode::Preformatted,
        }
    }
}

/// Owns the Bot API client and the destination chat.
pub struct TelegramService {
    bot: Bot,
    chat: ChatId,
}

impl TelegramService {
    /// Build the service from the bot token and authorized chat id.
    #[must_use]
    pub fn new(bot_token: &str, chat_id: i64) -> Self {
        Self {
            bot: Bot::new(bot_token),
            chat: ChatId(chat_id),
        }
    }

    /// A clone of the underlying bot, for the inbound dispatcher.
    #[must_use]
    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    /// Deliver one message to the authorized chat.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Telegram` if the Bot API call fails.
    pub async fn send(&self, message: &OutboundMessage) -> Result<()> {
        match message.render {
            RenderMode::Styled => {
                self.bot
                    .send_message(self.chat, message.text.clone())
                    .await
            }
            RenderMode::Preformatted => {
                let body = format!("<pre>{}</pre>", html::escape(&message.text));
                self.bot
                    .send_message(self.chat, body)
                    .parse_mode(ParseMode::Html)
                    .await
            }
        }
        .map_err(|err| AppError::Telegram(format!("send_message failed: {err}")))?;
        Ok(())
    }

    /// Drain the outbound queue until cancellation.
    pub async fn run_outbound(
        &self,
        mut outbound_rx: mpsc::Receiver<OutboundMessage>,
        cancel: CancellationToken,
    ) {
        debug!("outbound worker started");
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("outbound worker cancelled");
                    break;
                }
                message = outbound_rx.recv() => {
                    let Some(message) = message else {
                        debug!("outbound queue closed");
                        break;
                    };
                    if let Err(err) = self.send(&message).await {
                        error!(%err, render = ?message.render, "dropping undeliverable message");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_render_mode() {
        assert_eq!(OutboundMessage::styled("hi").render, RenderMode::Styled);
        assert_eq!(
            OutboundMessage::preformatted("hi").render,
            RenderMode::Preformatted
        );
    }
}

//! Session command router.
//!
//! Maps the chat command surface onto session operations. The router is
//! transport-agnostic: authorization happens at the Telegram boundary
//! before anything reaches `handle`, and replies come back as plain
//! outbound messages for the transport to render.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::bridge::aggregator::truncate_tail;
use crate::bridge::launch::LaunchConfig;
use crate::bridge::session::Session;
use crate::i18n::{Lang, Msg};
use crate::telegram::OutboundMessage;

/// Escape sequence for the up-arrow key.
const KEY_UP: &[u8] = b"\x1b[A";
/// Escape sequence for the down-arrow key.
const KEY_DOWN: &[u8] = b"\x1b[B";
/// Carriage return, what the child's line editor treats as Enter.
const KEY_ENTER: &[u8] = b"\r";

/// Pause between free text and the trailing Enter, so the child's UI
/// registers the text before the submit keystroke.
const TEXT_SUBMIT_PAUSE: Duration = Duration::from_millis(100);

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start` greeting.
    Start,
    /// `/help`, optionally with the advanced section.
    Help {
        /// `true` for `/help admin`.
        admin: bool,
    },
    /// `/mode` toggles streaming vs silent.
    ToggleMode,
    /// `/screen` dumps the raw screen.
    Screen,
    /// `/enter` sends Enter.
    Enter,
    /// `/up` arrow key.
    Up,
    /// `/down` arrow key.
    Down,
    /// `/status` report.
    Status,
    /// `/resume` with optional query (`list` is special-cased).
    Resume {
        /// Session query, `list`, or nothing for `--continue`.
        arg: Option<String>,
    },
    /// `/new` fresh session.
    New,
    /// `/model` with optional model name.
    Model {
        /// Requested model, validated against the allow-list.
        name: Option<String>,
    },
    /// `/restart` relaunches with the current arguments.
    Restart,
    /// `/ctrlc` delivers a keyboard interrupt.
    CtrlC,
    /// `/language` with optional language code.
    Language {
        /// Requested language code.
        code: Option<String>,
    },
    /// Bare text, forwarded to the child followed by Enter.
    Text(String),
}

impl Command {
    /// Parse a chat message into a command.
    ///
    /// Returns `None` for empty messages and unrecognized slash
    /// commands (which are silently ignored, matching a bot that
    /// registers no handler for them). A `@botname` suffix on the
    /// command token is stripped.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            if trimmed.is_empty() {
                return None;
            }
            return Some(Self::Text(trimmed.to_owned()));
        };

        let (head, tail) = match rest.split_once(char::is_whitespace) {
            Some((head, tail)) => (head, tail.trim()),
            None => (rest, ""),
        };
        let name = head.split('@').next().unwrap_or(head).to_ascii_lowercase();
        let arg = (!tail.is_empty()).then(|| tail.to_owned());

        let command = match name.as_str() {
            "start" => Self::Start,
            "help" => Self::Help {
                admin: tail.split_whitespace().any(|word| word == "admin"),
            },
            "mode" => Self::ToggleMode,
            "screen" => Self::Screen,
            "enter" => Self::Enter,
            "up" => Self::Up,
            "down" => Self::Down,
            "status" => Self::Status,
            "resume" => Self::Resume { arg },
            "new" => Self::New,
            "model" => Self::Model { name: arg },
            "restart" => Self::Restart,
            "ctrlc" => Self::CtrlC,
            "language" | "lang" => Self::Language { code: arg },
            _ => return None,
        };
        Some(command)
    }
}

/// Routes commands to session operations and renders localized replies.
pub struct Router {
    session: Arc<Session>,
    lang: RwLock<Lang>,
}

impl Router {
    /// Build a router over the shared session.
    #[must_use]
    pub fn new(session: Arc<Session>, lang: Lang) -> Self {
        Self {
            session,
            lang: RwLock::new(lang),
        }
    }

    /// Currently active reply language.
    pub async fn language(&self) -> Lang {
        *self.lang.read().await
    }

    /// Execute a command against the session; replies in order.
    pub async fn handle(&self, command: Command) -> Vec<OutboundMessage> {
        debug!(?command, "handling command");
        let lang = self.language().await;
        match command {
            Command::Start => vec![styled(Msg::Connected, lang)],
            Command::Help { admin } => {
                let mode = self.mode_name(lang);
                vec![styled(Msg::Help { admin, mode: &mode }, lang)]
            }
            Command::ToggleMode => {
                let streaming = self.session.toggle_mode();
                let mode = if streaming {
                    Msg::ModeStreaming.render(lang)
                } else {
                    Msg::ModeSilent.render(lang)
                };
                vec![styled(Msg::ModeChanged(&mode), lang)]
            }
            Command::Screen => self.screen_dump(lang).await,
            Command::Enter => self.send_key(KEY_ENTER, Msg::EnterSent, lang).await,
            Command::Up => self.send_key(KEY_UP, Msg::ArrowUp, lang).await,
            Command::Down => self.send_key(KEY_DOWN, Msg::ArrowDown, lang).await,
            Command::Status => vec![self.status(lang).await],
            Command::Resume { arg } => self.resume(arg, lang).await,
            Command::New => {
                let mut replies = vec![styled(Msg::NewSession, lang)];
                self.restart_into(LaunchConfig::Base, lang, &mut replies)
                    .await;
                replies
            }
            Command::Model { name } => self.change_model(name, lang).await,
            Command::Restart => {
                let mut replies = vec![styled(Msg::Restarting, lang)];
                let launch = self.session.current_launch().await;
                if self.restart_into(launch, lang, &mut replies).await {
                    replies.push(styled(Msg::Restarted, lang));
                }
                replies
            }
            Command::CtrlC => match self.session.interrupt().await {
                Ok(()) => vec![styled(Msg::InterruptSent, lang)],
                Err(err) => {
                    warn!(%err, "interrupt with no child");
                    Vec::new()
                }
            },
            Command::Language { code } => self.change_language(code, lang).await,
            Command::Text(text) => {
                self.forward_text(&text).await;
                Vec::new()
            }
        }
    }

    fn mode_name(&self, lang: Lang) -> String {
        if self.session.streaming() {
            Msg::ModeStreaming.render(lang)
        } else {
            Msg::ModeSilent.render(lang)
        }
    }

    /// Write key bytes and raise the force-flush flag so the resulting
    /// screen change reaches the operator quickly even in silent mode.
    async fn send_key(&self, bytes: &[u8], ack: Msg<'_>, lang: Lang) -> Vec<OutboundMessage> {
        match self.session.write_bytes(bytes).await {
            Ok(()) => {
                self.session.raise_force_flush();
                vec![styled(ack, lang)]
            }
            Err(err) => {
                warn!(%err, "key press with no child");
                Vec::new()
            }
        }
    }

    async fn forward_text(&self, text: &str) {
        if let Err(err) = self.session.write_bytes(text.as_bytes()).await {
            warn!(%err, "text input with no child");
            return;
        }
        // Let the UI register the text before submitting it.
        tokio::time::sleep(TEXT_SUBMIT_PAUSE).await;
        if let Err(err) = self.session.write_bytes(KEY_ENTER).await {
            warn!(%err, "child died between text and enter");
            return;
        }
        self.session.raise_force_flush();
    }

    async fn screen_dump(&self, lang: Lang) -> Vec<OutboundMessage> {
        let rows = self.session.screen_rows().await;
        let non_blank: Vec<&str> = rows
            .iter()
            .filter(|row| !row.is_empty())
            .map(String::as_str)
            .collect();
        let body = if non_blank.is_empty() {
            Msg::EmptyScreen.render(lang)
        } else {
            truncate_tail(
                &non_blank.join("\n"),
                self.session.config.max_message_chars,
            )
        };
        vec![
            styled(Msg::RawScreen, lang),
            OutboundMessage::preformatted(body),
        ]
    }

    async fn status(&self, lang: Lang) -> OutboundMessage {
        let running = self.session.is_running().await;
        let command_line = self
            .session
            .current_launch()
            .await
            .command_line(&self.session.config.program);
        let pid = self
            .session
            .pid()
            .await
            .map_or_else(|| "N/A".to_owned(), |pid| pid.to_string());
        let now = self.session.now_ms();
        let output_age = age_secs(now, self.session.last_output_ms());
        let sent_age = age_secs(now, self.session.last_sent_ms());
        styled(
            Msg::Status {
                running,
                command_line: &command_line,
                pid: &pid,
                output_age: &output_age,
                sent_age: &sent_age,
            },
            lang,
        )
    }

    async fn resume(&self, arg: Option<String>, lang: Lang) -> Vec<OutboundMessage> {
        let (launch, ack) = match arg {
            None => (LaunchConfig::Continue, styled(Msg::ResumingLast, lang)),
            Some(query) if query.trim().eq_ignore_ascii_case("list") => {
                (LaunchConfig::ResumeList, styled(Msg::ListingSessions, lang))
            }
            Some(query) => {
                let ack = styled(Msg::ResumingSession(&query), lang);
                (LaunchConfig::ResumeById(query), ack)
            }
        };
        let mut replies = vec![ack];
        self.restart_into(launch, lang, &mut replies).await;
        replies
    }

    async fn change_model(&self, name: Option<String>, lang: Lang) -> Vec<OutboundMessage> {
        let options = self.session.config.allowed_models.join(", ");
        let Some(name) = name else {
            return vec![styled(Msg::SpecifyModel(&options), lang)];
        };
        let model = name.to_lowercase();
        if self.session.config.ensure_allowed_model(&model).is_err() {
            return vec![styled(Msg::InvalidModel(&options), lang)];
        }
        let mut replies = vec![styled(Msg::RestartingModel(&model), lang)];
        if self
            .restart_into(LaunchConfig::WithModel(model.clone()), lang, &mut replies)
            .await
        {
            replies.push(styled(Msg::RestartedModel(&model), lang));
        }
        replies
    }

    async fn change_language(&self, code: Option<String>, lang: Lang) -> Vec<OutboundMessage> {
        let available = Lang::CODES.join(", ");
        let Some(code) = code else {
            return vec![styled(
                Msg::LanguagePrompt {
                    current: lang.code(),
                    available: &available,
                },
                lang,
            )];
        };
        match code.parse::<Lang>() {
            Ok(new_lang) => {
                *self.lang.write().await = new_lang;
                // Confirm in the language just switched to.
                vec![styled(Msg::LanguageChanged(new_lang.code()), new_lang)]
            }
            Err(_) => vec![styled(Msg::InvalidLanguage(&available), lang)],
        }
    }

    /// Restart the child; on failure append a spawn-failure reply.
    /// Returns whether the restart succeeded.
    async fn restart_into(
        &self,
        launch: LaunchConfig,
        lang: Lang,
        replies: &mut Vec<OutboundMessage>,
    ) -> bool {
        match self.session.restart(launch).await {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, "child restart failed");
                replies.push(styled(Msg::SpawnFailed(&err.to_string()), lang));
                false
            }
        }
    }
}

fn styled(msg: Msg<'_>, lang: Lang) -> OutboundMessage {
    OutboundMessage::styled(msg.render(lang))
}

#[allow(clippy::cast_precision_loss)]
fn age_secs(now_ms: u64, then_ms: u64) -> String {
    format!("{:.1}", now_ms.saturating_sub(then_ms) as f64 / 1000.0)
}

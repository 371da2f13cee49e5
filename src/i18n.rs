//! Localized user-facing strings.
//!
//! The catalog is consulted only by the command router and the
//! Telegram layer; the bridging core never produces user-visible text.

use std::fmt;
use std::str::FromStr;

use crate::AppError;

/// Supported reply languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lang {
    /// English (fallback).
    #[default]
    En,
    /// Spanish.
    Es,
    /// Chinese.
    Zh,
}

impl Lang {
    /// All supported language codes, for validation messages.
    pub const CODES: [&'static str; 3] = ["en", "es", "zh"];

    /// The two-letter code for this language.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
            Self::Zh => "zh",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Lang {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "es" => Ok(Self::Es),
            "zh" => Ok(Self::Zh),
            other => Err(AppError::InvalidInput(format!(
                "unsupported language: {other}"
            ))),
        }
    }
}

/// A user-visible message, rendered per language by [`Msg::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg<'a> {
    /// Greeting after `/start`.
    Connected,
    /// Restart in progress.
    Restarting,
    /// Restart finished.
    Restarted,
    /// Ctrl+C delivered to the child.
    InterruptSent,
    /// Enter delivered to the child.
    EnterSent,
    /// Up-arrow acknowledgment.
    ArrowUp,
    /// Down-arrow acknowledgment.
    ArrowDown,
    /// Raw screen dump header.
    RawScreen,
    /// Placeholder when the screen has no content.
    EmptyScreen,
    /// Continuing the most recent child session.
    ResumingLast,
    /// Child will present its interactive session picker.
    ListingSessions,
    /// Resuming a session matching the query.
    ResumingSession(&'a str),
    /// Starting a fresh child session.
    NewSession,
    /// `/model` called without an argument; payload is the allow-list.
    SpecifyModel(&'a str),
    /// `/model` called with a name outside the allow-list.
    InvalidModel(&'a str),
    /// Restarting with an explicit model.
    RestartingModel(&'a str),
    /// Restart with an explicit model finished.
    RestartedModel(&'a str),
    /// Mode toggled; payload is the rendered mode name.
    ModeChanged(&'a str),
    /// Streaming mode display name.
    ModeStreaming,
    /// Silent mode display name.
    ModeSilent,
    /// Language switched.
    LanguageChanged(&'a str),
    /// Unknown language code; payload is the supported list.
    InvalidLanguage(&'a str),
    /// `/language` without argument; payloads are current code and options.
    LanguagePrompt {
        /// Currently active language code.
        current: &'a str,
        /// Comma-separated supported codes.
        available: &'a str,
    },
    /// Child failed to (re)start; payload is the error text.
    SpawnFailed(&'a str),
    /// `/status` report.
    Status {
        /// Whether the child process is alive.
        running: bool,
        /// Command line the child runs with.
        command_line: &'a str,
        /// Child pid, pre-rendered (`"N/A"` when absent).
        pid: &'a str,
        /// Seconds since last output, pre-rendered with one decimal.
        output_age: &'a str,
        /// Seconds since last snapshot send, pre-rendered.
        sent_age: &'a str,
    },
    /// `/help` text; the advanced section is gated behind `admin`.
    Help {
        /// Show the advanced command section.
        admin: bool,
        /// Rendered current mode name.
        mode: &'a str,
    },
}

impl Msg<'_> {
    /// Render this message in the given language.
    #[must_use]
    #[allow(clippy::too_many_lines)] // One arm per (language, message) pair.
    pub fn render(&self, lang: Lang) -> String {
        match lang {
            Lang::En => match self {
                Self::Connected => "🚀 Claude Bridge connected.\nUse /help to see commands.".into(),
                Self::Restarting => "🔄 Restarting Claude...".into(),
                Self::Restarted => "✅ Restarted.".into(),
                Self::InterruptSent => "keyboard interrupt sent (Ctrl+C)".into(),
                Self::EnterSent => "Enter sent (\\r)".into(),
                Self::ArrowUp => "⬆️".into(),
                Self::ArrowDown => "⬇️".into(),
                Self::RawScreen => "📺 Raw screen".into(),
                Self::EmptyScreen => "[empty screen]".into(),
                Self::ResumingLast => "🔄 Resuming last session...".into(),
                Self::ListingSessions => {
                    "📋 Listing sessions.\nUse /up, /down and /enter to select, \
                     or copy an ID into /resume <id>."
                        .into()
                }
                Self::ResumingSession(query) => {
                    format!("🔄 Searching and resuming session: {query}...")
                }
                Self::NewSession => "🆕 Starting new session...".into(),
                Self::SpecifyModel(options) => format!(
                    "⚠️ You must specify the model.\nOptions: {options}\nExample: /model haiku"
                ),
                Self::InvalidModel(options) => format!("❌ Invalid model. Use: {options}"),
                Self::RestartingModel(model) => {
                    format!("🔄 Restarting Claude with model {model}...")
                }
                Self::RestartedModel(model) => format!("✅ Restarted in {model} mode."),
                Self::ModeChanged(mode) => format!("Mode changed to: {mode}"),
                Self::ModeStreaming => "🌊 Streaming".into(),
                Self::ModeSilent => "🤫 Silent".into(),
                Self::LanguageChanged(code) => format!("🌐 Language changed to: {code}"),
                Self::InvalidLanguage(available) => {
                    format!("❌ Invalid language. Available: {available}")
                }
                Self::LanguagePrompt { current, available } => format!(
                    "🌐 Current language: {current}\nOptions: {available}\nExample: /language es"
                ),
                Self::SpawnFailed(err) => format!("❌ Failed to start process: {err}"),
                Self::Status {
                    running,
                    command_line,
                    pid,
                    output_age,
                    sent_age,
                } => {
                    let state = if *running { "🟢 Running" } else { "🔴 Stopped" };
                    format!(
                        "📊 Bot Status\nClaude process: {state}\nCommand: {command_line}\n\
                         PID: {pid}\nLast output received: {output_age}s ago\n\
                         Last sent to Telegram: {sent_age}s ago"
                    )
                }
                Self::Help { admin, mode } => {
                    let mut text = format!(
                        "🤖 Available Commands\n\nCurrent mode: {mode}\n\n\
                         📝 Basics:\n\
                         /start - Start the bot\n\
                         /help - See this help\n\
                         /mode - Toggle Silent/Streaming mode\n\
                         /screen - View current screen (useful in silent mode)\n\
                         /enter - Send ENTER key\n\
                         /up /down - Navigation arrows (for menus)\n\
                         /status - Process status\n\
                         /resume [query|list] - Resume session (last, search or list)\n\
                         /new - Start new session\n\
                         /language [code] - Change language (en, es, zh)\n"
                    );
                    if *admin {
                        text.push_str(
                            "\n⚠️ Advanced:\n\
                             /model [name] - Change model (restarts)\n\
                             /restart - Restart process\n\
                             /ctrlc - Send Interrupt (Ctrl+C)\n",
                        );
                    } else {
                        text.push_str("\n(Use /help admin for more commands)");
                    }
                    text
                }
            },
            Lang::Es => match self {
                Self::Connected => {
                    "🚀 Puente Claude conectado.\nUsa /help para ver comandos.".into()
                }
                Self::Restarting => "🔄 Reiniciando Claude...".into(),
                Self::Restarted => "✅ Reiniciado.".into(),
                Self::InterruptSent => "interrupción enviada (Ctrl+C)".into(),
                Self::EnterSent => "Enter enviado (\\r)".into(),
                Self::ArrowUp => "⬆️".into(),
                Self::ArrowDown => "⬇️".into(),
                Self::RawScreen => "📺 Pantalla cruda".into(),
                Self::EmptyScreen => "[pantalla vacía]".into(),
                Self::ResumingLast => "🔄 Resumiendo última sesión...".into(),
                Self::ListingSessions => {
                    "📋 Listando sesiones.\nUsa /up, /down y /enter para seleccionar, \
                     o copia un ID en /resume <id>."
                        .into()
                }
                Self::ResumingSession(query) => {
                    format!("🔄 Buscando y resumiendo sesión: {query}...")
                }
                Self::NewSession => "🆕 Iniciando nueva sesión...".into(),
                Self::SpecifyModel(options) => format!(
                    "⚠️ Debes especificar el modelo.\nOpciones: {options}\nEjemplo: /model haiku"
                ),
                Self::InvalidModel(options) => format!("❌ Modelo inválido. Usa: {options}"),
                Self::RestartingModel(model) => {
                    format!("🔄 Reiniciando Claude con modelo {model}...")
                }
                Self::RestartedModel(model) => format!("✅ Reiniciado en modo {model}."),
                Self::ModeChanged(mode) => format!("Modo cambiado a: {mode}"),
                Self::ModeStreaming => "🌊 Streaming".into(),
                Self::ModeSilent => "🤫 Silencioso".into(),
                Self::LanguageChanged(code) => format!("🌐 Idioma cambiado a: {code}"),
                Self::InvalidLanguage(available) => {
                    format!("❌ Idioma inválido. Disponibles: {available}")
                }
                Self::LanguagePrompt { current, available } => format!(
                    "🌐 Idioma actual: {current}\nOpciones: {available}\nEjemplo: /language es"
                ),
                Self::SpawnFailed(err) => format!("❌ Error al iniciar el proceso: {err}"),
                Self::Status {
                    running,
                    command_line,
                    pid,
                    output_age,
                    sent_age,
                } => {
                    let state = if *running {
                        "🟢 Ejecutando"
                    } else {
                        "🔴 Detenido"
                    };
                    format!(
                        "📊 Estado del Bot\nProceso Claude: {state}\nComando: {command_line}\n\
                         PID: {pid}\nÚltimo output recibido: {output_age}s atrás\n\
                         Último envío a Telegram: {sent_age}s atrás"
                    )
                }
                Self::Help { admin, mode } => {
                    let mut text = format!(
                        "🤖 Comandos Disponibles\n\nModo actual: {mode}\n\n\
                         📝 Básicos:\n\
                         /start - Iniciar el bot\n\
                         /help - Ver esta ayuda\n\
                         /mode - Cambiar modo Silencioso/Streaming\n\
                         /screen - Ver pantalla actual (útil en modo silencioso)\n\
                         /enter - Enviar tecla ENTER\n\
                         /up /down - Flechas de navegación (para menús)\n\
                         /status - Estado del proceso\n\
                         /resume [query|list] - Resumir sesión (última, búsqueda o lista)\n\
                         /new - Iniciar nueva sesión\n\
                         /language [code] - Cambiar idioma (en, es, zh)\n"
                    );
                    if *admin {
                        text.push_str(
                            "\n⚠️ Avanzados:\n\
                             /model [name] - Cambiar modelo (reinicia)\n\
                             /restart - Reiniciar proceso\n\
                             /ctrlc - Enviar Interrupción (Ctrl+C)\n",
                        );
                    } else {
                        text.push_str("\n(Usa /help admin para más comandos)");
                    }
                    text
                }
            },
            Lang::Zh => match self {
                Self::Connected => "🚀 Claude Bridge 已连接。\n使用 /help 查看命令。".into(),
                Self::Restarting => "🔄 正在重启 Claude...".into(),
                Self::Restarted => "✅ 已重启。".into(),
                Self::InterruptSent => "中断信号已发送 (Ctrl+C)".into(),
                Self::EnterSent => "Enter 已发送 (\\r)".into(),
                Self::ArrowUp => "⬆️".into(),
                Self::ArrowDown => "⬇️".into(),
                Self::RawScreen => "📺 原始屏幕".into(),
                Self::EmptyScreen => "[空屏幕]".into(),
                Self::ResumingLast => "🔄 恢复上次会话...".into(),
                Self::ListingSessions => {
                    "📋 列出会话。\n使用 /up、/down 和 /enter 选择，\
                     或复制 ID 用于 /resume <id>。"
                        .into()
                }
                Self::ResumingSession(query) => format!("🔄 搜索并恢复会话: {query}..."),
                Self::NewSession => "🆕 开始新会话...".into(),
                Self::SpecifyModel(options) => {
                    format!("⚠️ 必须指定模型。\n选项: {options}\n示例: /model haiku")
                }
                Self::InvalidModel(options) => format!("❌ 无效模型。请使用: {options}"),
                Self::RestartingModel(model) => format!("🔄 正在使用模型 {model} 重启 Claude..."),
                Self::RestartedModel(model) => format!("✅ 已在 {model} 模式下重启。"),
                Self::ModeChanged(mode) => format!("模式已更改为: {mode}"),
                Self::ModeStreaming => "🌊 流式 (Streaming)".into(),
                Self::ModeSilent => "🤫 静默 (Silent)".into(),
                Self::LanguageChanged(code) => format!("🌐 语言已更改为: {code}"),
                Self::InvalidLanguage(available) => format!("❌ 无效语言。可用: {available}"),
                Self::LanguagePrompt { current, available } => {
                    format!("🌐 当前语言: {current}\n选项: {available}\n示例: /language es")
                }
                Self::SpawnFailed(err) => format!("❌ 启动进程失败: {err}"),
                Self::Status {
                    running,
                    command_line,
                    pid,
                    output_age,
                    sent_age,
                } => {
                    let state = if *running { "🟢 运行中" } else { "🔴 已停止" };
                    format!(
                        "📊 Bot 状态\nClaude 进程: {state}\n命令: {command_line}\n\
                         PID: {pid}\n上次接收输出: {output_age}秒前\n\
                         上次发送到 Telegram: {sent_age}秒前"
                    )
                }
                Self::Help { admin, mode } => {
                    let mut text = format!(
                        "🤖 可用命令\n\n当前模式: {mode}\n\n\
                         📝 基础:\n\
                         /start - 启动机器人\n\
                         /help - 查看此帮助\n\
                         /mode - 切换 静默/流式 模式\n\
                         /screen - 查看当前屏幕 (静默模式下有用)\n\
                         /enter - 发送 ENTER 键\n\
                         /up /down - 导航箭头 (用于菜单)\n\
                         /status - 进程状态\n\
                         /resume [query|list] - 恢复会话 (上次, 搜索 或 列表)\n\
                         /new - 开始新会话\n\
                         /language [code] - 更改语言 (en, es, zh)\n"
                    );
                    if *admin {
                        text.push_str(
                            "\n⚠️ 高级:\n\
                             /model [name] - 更改模型 (需重启)\n\
                             /restart - 重启进程\n\
                             /ctrlc - 发送中断 (Ctrl+C)\n",
                        );
                    } else {
                        text.push_str("\n(使用 /help admin 查看更多命令)");
                    }
                    text
                }
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn language_codes_round_trip() {
        for code in Lang::CODES {
            let lang: Lang = code.parse().expect("known code must parse");
            assert_eq!(lang.code(), code);
        }
    }

    #[test]
    fn unknown_language_rejected() {
        assert!("fr".parse::<Lang>().is_err());
        assert!("".parse::<Lang>().is_err());
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("ES".parse::<Lang>().ok(), Some(Lang::Es));
    }

    #[test]
    fn help_advanced_section_is_gated() {
        let mode = Msg::ModeStreaming.render(Lang::En);
        let basic = Msg::Help {
            admin: false,
            mode: &mode,
        }
        .render(Lang::En);
        assert!(!basic.contains("/restart"));
        assert!(basic.contains("/help admin"));

        let full = Msg::Help {
            admin: true,
            mode: &mode,
        }
        .render(Lang::En);
        assert!(full.contains("/restart"));
        assert!(full.contains("/ctrlc"));
        assert!(full.contains("/model"));
    }

    #[test]
    fn placeholders_are_substituted() {
        let msg = Msg::ResumingSession("abc123").render(Lang::En);
        assert!(msg.contains("abc123"));
        let msg = Msg::InvalidModel("sonnet, opus").render(Lang::Zh);
        assert!(msg.contains("sonnet, opus"));
    }
}

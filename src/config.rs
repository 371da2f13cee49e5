//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::i18n::Lang;
use crate::{AppError, Result};

/// Nested Telegram configuration.
///
/// The bot token is loaded at runtime via OS keychain or environment
/// variable, not from the TOML config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TelegramConfig {
    /// The single authorized Telegram user. Commands from any other
    /// identity are silently dropped, and terminal snapshots are
    /// delivered to this chat.
    pub chat_id: i64,
    /// Bot API token (populated at runtime).
    #[serde(skip)]
    pub bot_token: String,
}

/// Virtual screen dimensions, also exported to the child via
/// `COLUMNS` / `LINES`.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ScreenConfig {
    /// Terminal width in columns.
    #[serde(default = "default_cols")]
    pub cols: u16,
    /// Terminal height in rows.
    #[serde(default = "default_rows")]
    pub rows: u16,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            cols: default_cols(),
            rows: default_rows(),
        }
    }
}

fn default_cols() -> u16 {
    120
}

fn default_rows() -> u16 {
    40
}

/// Timing constants for the output-aggregation policy, in milliseconds.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[allow(clippy::struct_field_names)]
pub struct TimingConfig {
    /// Quiet period after the last terminal change before a streaming-mode emit.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Quiet period treated as "output finished" in silent mode.
    #[serde(default = "default_idle_threshold_ms")]
    pub idle_threshold_ms: u64,
    /// Upper bound on time between emits under continuous streaming output.
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,
    /// Short settle window used by the force-flush fast path.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    /// Aggregator tick interval.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            idle_threshold_ms: default_idle_threshold_ms(),
            max_wait_ms: default_max_wait_ms(),
            settle_ms: default_settle_ms(),
            tick_ms: default_tick_ms(),
        }
    }
}

impl TimingConfig {
    /// Tick interval as a [`Duration`]. The policy windows stay in
    /// milliseconds; only the aggregator's interval timer needs a
    /// `Duration`.
    #[must_use]
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_idle_threshold_ms() -> u64 {
    3000
}

fn default_max_wait_ms() -> u64 {
    5000
}

fn default_settle_ms() -> u64 {
    500
}

fn default_tick_ms() -> u64 {
    500
}

/// Noise-row filter applied to emitted snapshots.
///
/// The rules are configuration rather than hardcoded literals because
/// they are coupled to the child program's terminal UI, which changes
/// independently of the bridge.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct FilterConfig {
    /// A rendered row containing any of these substrings
    /// (case-insensitive) is dropped from snapshots.
    #[serde(default = "default_noise_substrings")]
    pub noise_substrings: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            noise_substrings: default_noise_substrings(),
        }
    }
}

fn default_noise_substrings() -> Vec<String> {
    vec![
        "ctrl+g".to_owned(),
        "esc to undo".to_owned(),
        "──────".to_owned(),
    ]
}

fn default_program() -> String {
    "claude".to_owned()
}

fn default_allowed_models() -> Vec<String> {
    vec!["sonnet".to_owned(), "opus".to_owned(), "haiku".to_owned()]
}

fn default_language() -> String {
    "en".to_owned()
}

fn default_max_message_chars() -> usize {
    4000
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Telegram connectivity and authorization.
    pub telegram: TelegramConfig,
    /// Child binary driven through the pseudo-terminal.
    #[serde(default = "default_program")]
    pub program: String,
    /// Virtual screen dimensions.
    #[serde(default)]
    pub screen: ScreenConfig,
    /// Aggregation policy timing constants.
    #[serde(default)]
    pub timing: TimingConfig,
    /// Snapshot noise filter rules.
    #[serde(default)]
    pub filter: FilterConfig,
    /// Model names accepted by the `/model` command.
    #[serde(default = "default_allowed_models")]
    pub allowed_models: Vec<String>,
    /// Initial reply language (`en`, `es`, `zh`).
    #[serde(default = "default_language")]
    pub language: String,
    /// Trailing-character cap for outgoing messages.
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the Telegram bot token from OS keychain with env-var fallback.
    ///
    /// Tries the `claude-bridge` keyring service first, then falls back
    /// to the `TELEGRAM_TOKEN` environment variable.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if neither keychain nor env var
    /// provide the token.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.telegram.bot_token = load_credential("telegram_bot_token", "TELEGRAM_TOKEN").await?;
        Ok(())
    }

    /// Initial language parsed from the config.
    #[must_use]
    pub fn initial_language(&self) -> Lang {
        // validate() already rejected unknown codes.
        self.language.parse().unwrap_or_default()
    }

    /// Validate that a model name is in the allow-list.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` naming the allowed models.
    pub fn ensure_allowed_model(&self, model: &str) -> Result<()> {
        if self.allowed_models.iter().any(|m| m == model) {
            Ok(())
        } else {
            Err(AppError::InvalidInput(format!(
                "model must be one of: {}",
                self.allowed_models.join(", ")
            )))
        }
    }

    fn validate(&self) -> Result<()> {
        if self.telegram.chat_id == 0 {
            return Err(AppError::Config("telegram.chat_id must be set".into()));
        }
        if self.program.is_empty() {
            return Err(AppError::Config("program must not be empty".into()));
        }
        if self.screen.cols == 0 || self.screen.rows == 0 {
            return Err(AppError::Config(
                "screen dimensions must be greater than zero".into(),
            ));
        }
        if self.timing.tick_ms == 0 {
            return Err(AppError::Config(
                "timing.tick_ms must be greater than zero".into(),
            ));
        }
        if self.language.parse::<Lang>().is_err() {
            return Err(AppError::Config(format!(
                "unsupported language: {}",
                self.language
            )));
        }
        if self.max_message_chars == 0 {
            return Err(AppError::Config(
                "max_message_chars must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<String> {
    let key = keyring_key.to_owned();

    // Try OS keychain first via spawn_blocking (keyring is synchronous I/O).
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new("claude-bridge", &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(value),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    // Fallback to environment variable.
    env::var(env_key).map_err(|_| {
        AppError::Config(format!(
            "credential {keyring_key} not found in keychain or {env_key} env var"
        ))
    })
}

//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Telegram API or delivery failure.
    Telegram(String),
    /// Child process launch failure.
    Spawn(String),
    /// Pseudo-terminal read/write failure (usually "no child running").
    Pty(String),
    /// User input failed validation (bad model name, unknown language).
    InvalidInput(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Telegram(msg) => write!(f, "telegram: {msg}"),
            Self::Spawn(msg) => write!(f, "spawn: {msg}"),
            Self::Pty(msg) => write!(f, "pty: {msg}"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

#![forbid(unsafe_code)]

pub mod bridge;
pub mod config;
pub mod errors;
pub mod i18n;
pub mod telegram;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};

#![forbid(unsafe_code)]

//! `claude-bridge` — Telegram-to-PTY bridge binary.
//!
//! Bootstraps configuration, starts the child process under a
//! pseudo-terminal, and wires the ingest loop, aggregation policy,
//! outbound worker, and Telegram dispatcher together.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use claude_bridge::bridge::launch::LaunchConfig;
use claude_bridge::bridge::router::Router;
use claude_bridge::bridge::session::Session;
use claude_bridge::bridge::{aggregator, ingest};
use claude_bridge::config::GlobalConfig;
use claude_bridge::telegram::{dispatch, TelegramService};
use claude_bridge::{AppError, Result};

/// Depth of the outbound delivery queue.
const OUTBOUND_QUEUE_DEPTH: usize = 64;

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "claude-bridge", about = "Telegram bridge to a PTY-driven CLI agent", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("claude-bridge bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    config.load_credentials().await?;
    let initial_lang = config.initial_language();
    info!(program = %config.program, "configuration loaded");

    // ── Build shared session state ──────────────────────
    let (output_tx, output_rx) = mpsc::unbounded_channel();
    let telegram = Arc::new(TelegramService::new(
        &config.telegram.bot_token,
        config.telegram.chat_id,
    ));
    let authorized_chat = config.telegram.chat_id;
    let session = Arc::new(Session::new(config, output_tx));
    let router = Arc::new(Router::new(Arc::clone(&session), initial_lang));

    // ── Launch the child ────────────────────────────────
    // A boot-time spawn failure is not fatal: the operator can fix the
    // environment and /restart from chat.
    if let Err(err) = session.restart(LaunchConfig::Base).await {
        error!(%err, "initial child launch failed; waiting for /restart");
    }

    // ── Start background tasks ──────────────────────────
    let ct = CancellationToken::new();
    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_DEPTH);

    let ingest_handle = tokio::spawn(ingest::run(
        Arc::clone(&session),
        output_rx,
        ct.clone(),
    ));
    let aggregator_handle = tokio::spawn(aggregator::run(
        Arc::clone(&session),
        outbound_tx.clone(),
        ct.clone(),
    ));
    let outbound_service = Arc::clone(&telegram);
    let outbound_ct = ct.clone();
    let outbound_handle = tokio::spawn(async move {
        outbound_service.run_outbound(outbound_rx, outbound_ct).await;
    });
    let dispatch_handle = tokio::spawn(dispatch::run(
        telegram.bot(),
        router,
        outbound_tx,
        authorized_chat,
        ct.clone(),
    ));

    info!("claude-bridge ready");

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    session.shutdown().await;

    let _ = tokio::join!(
        ingest_handle,
        aggregator_handle,
        outbound_handle,
        dispatch_handle
    );
    info!("claude-bridge shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}

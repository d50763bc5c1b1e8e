#![forbid(unsafe_code)]

//! `chat-commander` binary entry point.
//!
//! Bootstraps configuration, the database, the retention service and the
//! console chat gateway, then dispatches chat events until shutdown.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use chat_commander::commands::{Dispatcher, Services};
use chat_commander::config::GlobalConfig;
use chat_commander::config_watcher::ChannelWatcher;
use chat_commander::gateway::console::ConsoleConnector;
use chat_commander::gateway::{ChatGateway, ConnectionManager, Identity};
use chat_commander::models::channel::{normalize_channel, Channel};
use chat_commander::persistence::channel_repo::ChannelRepo;
use chat_commander::persistence::{db, retention};
use chat_commander::services::{OpenAiGenerator, StreamDjClient, YouTubeSearch};
use chat_commander::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "chat-commander", about = "Chat command bot", version, long_about = None)]
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
    info!("chat-commander bootstrap");

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
    let config = Arc::new(config);
    info!("configuration loaded");

    // ── Initialize database ─────────────────────────────
    let db = Arc::new(db::connect(&config.database_path).await?);
    let channels = ChannelRepo::new(Arc::clone(&db));
    for name in &config.channels {
        let channel = Channel::new(name);
        if channel.name.is_empty() {
            continue;
        }
        if channels.insert_if_absent(&channel).await? {
            info!(channel = %channel.name, "channel registered");
        }
    }
    info!("database connected");

    // ── Start retention service ──────────────────────────
    let ct = CancellationToken::new();
    let retention_handle =
        retention::spawn_retention_task(Arc::clone(&db), config.retention_days, ct.clone());

    // ── Connect chat gateway ────────────────────────────
    let identity = Identity {
        username: config.bot.username.clone(),
        oauth_token: config.bot.oauth_token.clone(),
    };
    let (manager, events) = ConnectionManager::new(Arc::new(ConsoleConnector::stdin()), identity);
    let manager = Arc::new(manager);

    let services = Services {
        generator: Arc::new(OpenAiGenerator::new(&config.generation)?),
        playlist: Arc::new(StreamDjClient::new(&config.playlist)),
        search: Arc::new(YouTubeSearch::new(&config.video_search)),
    };
    let gateway: Arc<dyn ChatGateway> = Arc::clone(&manager) as Arc<dyn ChatGateway>;
    let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&db), gateway, services, &config));
    let event_handle = dispatcher.spawn_event_loop(events, ct.clone());

    let joined: Vec<String> = channels
        .list_enabled()
        .await?
        .into_iter()
        .map(|channel| channel.name)
        .collect();
    manager.connect(joined).await?;

    // ── Watch channel list ──────────────────────────────
    let seed: Vec<String> = config.channels.iter().map(|c| normalize_channel(c)).collect();
    let (_watcher, reload_handle) = match ChannelWatcher::new(&args.config, seed) {
        Ok(watcher) => {
            let handle = spawn_channel_reload(
                watcher.subscribe(),
                channels,
                Arc::clone(&manager),
                ct.clone(),
            );
            (Some(watcher), Some(handle))
        }
        Err(err) => {
            warn!(%err, "channel hot-reload disabled");
            (None, None)
        }
    };

    info!("chat-commander ready");

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();
    manager.disconnect().await;

    let _ = tokio::join!(event_handle, retention_handle);
    if let Some(handle) = reload_handle {
        let _ = handle.await;
    }
    info!("chat-commander shut down");

    Ok(())
}

/// Reconnect the gateway whenever the configured channel list changes.
fn spawn_channel_reload(
    mut updates: watch::Receiver<Vec<String>>,
    channels: ChannelRepo,
    manager: Arc<ConnectionManager>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut previous = updates.borrow_and_update().clone();
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }

            let next = updates.borrow_and_update().clone();
            match channels.apply_list_change(&previous, &next).await {
                Ok(enabled) => {
                    if let Err(err) = manager.reconnect(enabled).await {
                        error!(%err, "reconnect after channel change failed");
                    }
                }
                Err(err) => error!(%err, "failed to apply channel list change"),
            }
            previous = next;
        }
        info!("channel reload task shutting down");
    })
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
    // stdout carries chat output from the console gateway.
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

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

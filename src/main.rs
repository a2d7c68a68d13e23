#![forbid(unsafe_code)]

//! `wordtrack-session`: starts the WordTrack proxy, the add-in debugging
//! session and the dev server, then watches over them until Ctrl+C.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use wordtrack_session::{AppError, Result, SessionConfig, SessionSupervisor};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "wordtrack-session", about = "WordTrack development session supervisor", version, long_about = None)]
struct Cli {
    /// Optional TOML file overriding the built-in settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory the proxy, launcher and dev server run in.
    #[arg(long)]
    workdir: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Do not watch for the word processor closing.
    #[arg(long)]
    no_rescue: bool,
}

fn main() -> ExitCode {
    let args = Cli::parse();
    if let Err(err) = init_tracing(args.log_format) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(%err, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    let code = runtime.block_on(run(args));

    // The rescue watcher is detached; do not wait on it.
    runtime.shutdown_timeout(Duration::from_secs(1));
    ExitCode::from(code)
}

async fn run(args: Cli) -> u8 {
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "invalid configuration");
            return 1;
        }
    };
    info!(work_dir = %config.work_dir.display(), "configuration loaded");

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received");
        signal_token.cancel();
    });

    let mut supervisor = SessionSupervisor::new(config);
    supervisor.run(shutdown).await.exit_code()
}

fn load_config(args: &Cli) -> Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::load_from_path(path)?,
        None => SessionConfig::default(),
    };
    if let Some(dir) = &args.workdir {
        config.work_dir.clone_from(dir);
    }
    if args.no_rescue {
        config.rescue.enabled = false;
    }
    config.validate()?;
    Ok(config)
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    result = ctrl_c => {
                        if let Err(err) = result {
                            tracing::error!(%err, "ctrl-c signal handler failed");
                        }
                    }
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                if let Err(err) = ctrl_c.await {
                    tracing::error!(%err, "ctrl-c signal handler failed");
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
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

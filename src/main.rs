//! freegate CLI - OpenAI-compatible gateway with provider fallback.

use clap::{Parser, Subcommand};
use freegate::api::{create_router_with_state, AppState};
use freegate::config::{Config, LogVerbosity};
use freegate::keys::ApiKeyStore;
use std::path::PathBuf;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "freegate")]
#[command(about = "OpenAI-compatible gateway that falls back across free providers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Log verbosity level (defaults to app.log_verbosity)
        #[arg(short, long, value_enum)]
        log_level: Option<LogLevel>,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show current configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Manage client API keys
    Keys {
        #[command(subcommand)]
        action: KeysAction,

        /// Config file path
        #[arg(short, long, global = true)]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum KeysAction {
    /// List stored keys
    List,
    /// Generate a new key
    Create {
        /// Free-form note stored with the key
        #[arg(short, long)]
        remark: Option<String>,
    },
    /// Delete a key
    Revoke { key: String },
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum LogLevel {
    Minimal,
    Compact,
    Verbose,
}

impl From<LogLevel> for LogVerbosity {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Minimal => LogVerbosity::Minimal,
            LogLevel::Compact => LogVerbosity::Compact,
            LogLevel::Verbose => LogVerbosity::Verbose,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve {
            port,
            host,
            log_level,
            config,
        }) => {
            run_server(port, host, log_level, config).await?;
        }
        Some(Commands::Config { path }) => {
            show_config(path)?;
        }
        Some(Commands::Keys { action, config }) => {
            manage_keys(action, config)?;
        }
        None => {
            // Default: run server
            run_server(None, None, None, None).await?;
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>) -> anyhow::Result<Config> {
    let config = match config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config.with_env_overrides())
}

async fn run_server(
    port_override: Option<u16>,
    host_override: Option<String>,
    log_level: Option<LogLevel>,
    config_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let mut config = load_config(config_path)?;
    if let Some(level) = log_level {
        config.app.log_verbosity = level.into();
    }

    let host = host_override.unwrap_or_else(|| config.gateway.host.clone());
    let port = port_override.unwrap_or(config.gateway.port);
    let addr = format!("{}:{}", host, port);

    let state = AppState::from_config(&config)?;
    if state.admin_key.is_none() {
        tracing::warn!("No admin key configured; admin endpoints are disabled");
    }

    let app = create_router_with_state(state);

    // Print startup message
    let verbosity = &config.app.log_verbosity;
    match verbosity {
        LogVerbosity::Minimal => {
            println!("freegate:{}", port);
        }
        LogVerbosity::Compact => {
            println!("→ freegate starting on http://{}", addr);
            println!("→ Upstream: {}", config.upstream.base_url);
        }
        LogVerbosity::Verbose => {
            println!("────────────────────────────────────────");
            println!("freegate v{}", env!("CARGO_PKG_VERSION"));
            println!("────────────────────────────────────────");
            println!("Gateway:    http://{}", addr);
            println!("Chat:       http://{}/v1/chat/completions", addr);
            println!("Health:     http://{}/health", addr);
            println!("Upstream:   {}", config.upstream.base_url);
            println!("Key store:  {}", config.auth.database.display());
            println!("Format:     {:?}", config.gateway.response_format);
            println!("────────────────────────────────────────");
            println!("Log Level:  {:?}", verbosity);
            println!("────────────────────────────────────────");
        }
    }

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Gateway listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("\nGateway stopped.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

fn show_config(show_path: bool) -> anyhow::Result<()> {
    if show_path {
        println!("{}", Config::default_path().display());
        return Ok(());
    }

    let config = Config::load()?.with_env_overrides();
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn manage_keys(action: KeysAction, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let store = ApiKeyStore::open(&config.auth.database)?;

    match action {
        KeysAction::List => {
            let keys = store.list()?;
            if keys.is_empty() {
                println!("No API keys in {}", config.auth.database.display());
            }
            for key in keys {
                println!(
                    "{}  {:<8}  {:>6} requests  {}  {}",
                    key.key,
                    if key.active { "active" } else { "disabled" },
                    key.used_requests,
                    key.created_at.format("%Y-%m-%d %H:%M"),
                    key.remark.unwrap_or_default()
                );
            }
        }
        KeysAction::Create { remark } => {
            let key = store.generate(remark.as_deref())?;
            println!("{}", key.key);
        }
        KeysAction::Revoke { key } => {
            if store.revoke(&key)? {
                println!("Revoked {}", key);
            } else {
                anyhow::bail!("No such API key: {}", key);
            }
        }
    }

    Ok(())
}

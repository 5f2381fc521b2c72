//! CLI entry point, grounded on `crates/abp-daemon::main`: parse args,
//! initialize tracing, assemble collaborators, serve. Mirrors the
//! teacher's `--bind`/`--host-root`/`--receipts-dir`/`--debug` flag set as
//! `--bind`/`--config`/`--storage-dir`/`--debug` (distilled §6, [ADDED]).

use std::path::PathBuf;
use std::sync::Arc;

use adcp_config::GatewayConfig;
use adcp_daemon::{build_app, build_collaborators, ensure_default_tenant};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "adcp-daemon", version, about = "Multi-tenant ad-sales gateway exposing AdCP over MCP and A2A")]
struct Args {
    /// Bind address. Overrides the config file's `bind` when set.
    #[arg(long)]
    bind: Option<String>,

    /// Path to a TOML config file (see `adcp_config::GatewayConfig`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Storage root directory. Overrides the config file's `storage_dir`
    /// when set; only meaningful with the `json_file` storage backend.
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Enable verbose request/response debug logging.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GatewayConfig::from_file(path).with_context(|| format!("load config {}", path.display()))?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(storage_dir) = args.storage_dir {
        config.storage_dir = storage_dir;
    }

    let warnings = config.validate().context("validate config")?;

    let filter = if args.debug { EnvFilter::new("adcp=debug,tower_http=debug") } else { EnvFilter::new(config.log_level.clone()) };
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    for warning in &warnings {
        tracing::warn!(%warning, "configuration warning");
    }

    let collaborators = Arc::new(build_collaborators(config.clone()));
    ensure_default_tenant(collaborators.storage.as_ref()).await.context("seed default tenant")?;

    let base_url = format!("http://{}", config.bind);
    let app = build_app(collaborators, base_url);

    let listener = tokio::net::TcpListener::bind(&config.bind).await.with_context(|| format!("bind {}", config.bind))?;
    info!(bind = %config.bind, storage_dir = %config.storage_dir.display(), "adcp-daemon listening");

    axum::serve(listener, app).await.context("serve")
}

//! Lantern server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use lantern_cache::{KvStore, MemoryKvStore};
use lantern_core::AppConfig;
use lantern_db::{ContentStore, MySqlContentStore};
use lantern_llm::{AnthropicChatClient, ChatClient};
use lantern_retrieval::{HttpSearchClient, SearchClient};
use lantern_server::{create_router, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Lantern - explains why content does or does not appear
#[derive(Parser, Debug)]
#[command(name = "lanternd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "LANTERN_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,lantern=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config: AppConfig = Figment::new()
        .merge(Toml::file(&args.config))
        .merge(Env::prefixed("LANTERN_").split("__"))
        .extract()
        .with_context(|| format!("failed to load configuration from {}", args.config))?;

    tracing::info!(
        environment = %config.server.environment,
        default_tenant = %config.tenancy.default_tenant,
        "starting lantern"
    );

    let pool = lantern_db::connect(&config.database)
        .await
        .context("failed to connect to the content database")?;
    let store: Arc<dyn ContentStore> = Arc::new(MySqlContentStore::new(pool));
    let kv: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
    let search: Arc<dyn SearchClient> =
        Arc::new(HttpSearchClient::new(&config.search).context("failed to build search client")?);
    let chat: Arc<dyn ChatClient> =
        Arc::new(AnthropicChatClient::new(&config.llm).context("failed to build model client")?);

    let bind = config.server.bind.clone();
    let state = AppState::new(config, store, kv, search, chat);
    let router = create_router(state);

    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address {bind}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install shutdown handler");
        return;
    }
    tracing::info!("shutting down");
}

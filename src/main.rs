//! Account Transfer Ledger
//!
//! One binary, two roles:
//!
//! ```text
//! ┌────────────┐  HTTP   ┌────────────┐  gRPC + correlation_id  ┌────────────┐
//! │   client   │───────▶│    edge    │───────────────────────▶│    core    │──▶ PostgreSQL
//! └────────────┘         │ (--edge)   │                         │ (--core)   │
//!                        └────────────┘                         └────────────┘
//! ```
//!
//! Usage: `account_transfer --core|--edge [--env dev] [--listen ADDR]`

use std::sync::Arc;

use anyhow::Context;

use account_transfer::account::{AccountService, PgAccountRepository};
use account_transfer::cache::{AccountCache, MemoryAccountCache};
use account_transfer::config::AppConfig;
use account_transfer::correlation::SnowflakeGenerator;
use account_transfer::correlation::idgen::MAX_NODE_ID;
use account_transfer::db::{Database, init_schema};
use account_transfer::gateway::{self, EdgeState, GrpcCoreClient};
use account_transfer::ledger::{PgLedgerBackend, TransferEngine};
use account_transfer::retry::RetryPolicy;
use account_transfer::rpc::{
    AccountServiceServer, LedgerRpcHandler, TransferServiceServer, correlation_interceptor,
};
use account_transfer::transfer::TransferService;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Listen address override from command line (--listen argument)
fn get_listen_override() -> Option<String> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--listen" && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

fn use_core_mode() -> bool {
    std::env::args().any(|a| a == "--core")
}

fn use_edge_mode() -> bool {
    std::env::args().any(|a| a == "--edge")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn run_core(config: &AppConfig) -> anyhow::Result<()> {
    let url = config
        .postgres_url
        .as_deref()
        .context("postgres_url is not configured (set it in YAML or LEDGER_POSTGRES_URL)")?;

    let db = Database::connect(url, config.core.max_connections)
        .await
        .context("failed to connect to PostgreSQL")?;
    db.health_check().await?;
    init_schema(db.pool()).await?;
    let pool = db.pool().clone();

    let retry = RetryPolicy::from(&config.retry);
    let cache: Arc<dyn AccountCache> = Arc::new(MemoryAccountCache::new());

    let accounts = Arc::new(AccountService::new(
        Arc::new(PgAccountRepository::new(pool.clone())),
        cache.clone(),
        retry,
    ));

    // Barrier: no RPC is served against a cold existence index
    let warmed = accounts
        .warm_up_cache()
        .await
        .context("account cache warm-up failed")?;
    tracing::info!(accounts = warmed, "Cache warm-up complete");

    let engine = TransferEngine::new(Arc::new(PgLedgerBackend::new(pool)));
    let transfers = Arc::new(TransferService::new(engine, cache, retry));
    let handler = LedgerRpcHandler::new(accounts, transfers, config.timeouts.request());

    let listen = get_listen_override().unwrap_or_else(|| config.core.listen_addr.clone());
    let addr: std::net::SocketAddr = listen
        .parse()
        .with_context(|| format!("invalid core listen address {}", listen))?;

    tracing::info!(%addr, "Core RPC server listening");
    tonic::transport::Server::builder()
        .add_service(AccountServiceServer::with_interceptor(
            handler.clone(),
            correlation_interceptor,
        ))
        .add_service(TransferServiceServer::with_interceptor(
            handler,
            correlation_interceptor,
        ))
        .serve_with_shutdown(addr, shutdown_signal())
        .await?;
    Ok(())
}

async fn run_edge(config: &AppConfig) -> anyhow::Result<()> {
    let ids = SnowflakeGenerator::new(config.edge.node_id).with_context(|| {
        format!(
            "edge.node_id {} out of range (max {})",
            config.edge.node_id, MAX_NODE_ID
        )
    })?;
    let core = GrpcCoreClient::connect_lazy(&config.edge.core_endpoint, config.timeouts.request())?;
    let state = Arc::new(EdgeState::new(Arc::new(core), Arc::new(ids)));

    let listen = get_listen_override().unwrap_or_else(|| config.edge.listen_addr.clone());
    gateway::run_server(&listen, state).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (core_mode, edge_mode) = (use_core_mode(), use_edge_mode());
    if core_mode == edge_mode {
        anyhow::bail!("usage: account_transfer --core|--edge [--env dev] [--listen ADDR]");
    }
    let service = if core_mode { "core" } else { "edge" };

    let env = get_env();
    let app_config = AppConfig::load(&env)?;
    let _log_guard = account_transfer::logging::init_logging(&app_config, service);

    tracing::info!("Starting account_transfer {} in {} mode", service, env);

    let result = if core_mode {
        run_core(&app_config).await
    } else {
        run_edge(&app_config).await
    };

    if let Err(e) = &result {
        tracing::error!(error = %format!("{:#}", e), "{} stopped with error", service);
    }
    result
}

use anyhow::Result;
use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

mod abi;
mod api;
mod artifact;
mod blockchain;
mod config;
mod relay;
mod signature;
mod types;
mod wallet;

use blockchain::resolver::RegistryResolver;
use blockchain::retry::RetryPolicy;
use blockchain::submitter::TransactionSubmitter;
use config::Config;
use relay::UpdateRelay;
use signature::SignatureVerifier;

// Startup connectivity probe policy (distinct from per-call read retries)
const CONNECT_MAX_ATTEMPTS: u32 = 20;
const CONNECT_DELAY: Duration = Duration::from_secs(3);

pub struct AppState {
    pub config: Config,
    pub relay: UpdateRelay,
    pub chain_id: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("update_relay=debug".parse()?),
        )
        .json()
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!("Starting update-relay v{}", env!("CARGO_PKG_VERSION"));
    info!("RPC endpoint: {}", config.rpc_url);
    info!("Registry address: {:?}", config.registry_address);
    info!(
        "Wallet mode: {} (account: {:?})",
        config.key_mode().as_str(),
        config.credentials.account
    );

    // Fail closed before serving anything: the node must be reachable and
    // the manufacturer key must load.
    let chain_id =
        blockchain::connect_with_retry(&config.rpc_url, CONNECT_MAX_ATTEMPTS, CONNECT_DELAY)
            .await?;

    let verifier = SignatureVerifier::from_pem_file(&config.manufacturer_pubkey_path)?;
    info!(
        "Manufacturer public key loaded from {}",
        config.manufacturer_pubkey_path.display()
    );

    let resolver = RegistryResolver::new(config.rpc_url.clone(), config.registry_address);
    let submitter = TransactionSubmitter::new(
        config.rpc_url.clone(),
        config.credentials.clone(),
        config.receipt_timeout,
    );
    let relay = UpdateRelay::new(
        verifier,
        resolver,
        submitter,
        config.rpc_url.clone(),
        RetryPolicy::default(),
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        relay,
        chain_id,
    });

    if config.api_key.is_some() {
        info!("API key authentication enabled");
    } else {
        info!("API key authentication disabled (open mode)");
    }

    // Build router: writes behind the API-key gate, reads public
    let protected_routes = Router::new()
        .nest("/updates", api::routes::register_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::middleware::require_api_key,
        ));

    let app = Router::new()
        .route("/health", get(api::handlers::health))
        .nest("/updates", api::routes::read_routes())
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server with graceful shutdown
    let addr = format!("0.0.0.0:{}", config.port);
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        }
    }
}

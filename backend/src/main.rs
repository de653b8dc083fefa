use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tokoboost_backend::{
    logging, routes, AppState, Config, CreditEngine, GeneratorClient, JwksClient, LedgerStore,
    MidtransClient,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting TokoBoost backend");

    // Initialize components
    let jwks_client = JwksClient::new(&config.auth.issuer, &config.auth.audience).await?;
    let generator_client = Arc::new(GeneratorClient::new(
        &config.generator.base_url,
        config.generator.timeout_secs,
    ));
    let midtrans_client = MidtransClient::new(
        &config.midtrans.server_key,
        &config.midtrans.snap_base_url,
        &config.midtrans.api_base_url,
    );
    let ledger = Arc::new(LedgerStore::new(&config.database.url)?);
    let credits = CreditEngine::new(ledger.clone());

    let state = Arc::new(AppState {
        config: config.clone(),
        jwks_client,
        generator_client,
        midtrans_client,
        ledger,
        credits,
    });

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .merge(routes::health::router())
        .merge(routes::generate::router(state.clone()))
        .merge(routes::account::router(state.clone()))
        .merge(routes::topup::router(state.clone()))
        .layer(axum::middleware::from_fn(logging::request_logger))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! tarot-lumina HTTP Server
//!
//! Axum-based server for the tarot reading app: coin balance API, paid
//! streaming readings, Stripe checkout and settlement webhooks.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coin_ledger::{
    CoinLedger, CreditRelay, CreditService, MemoryBalanceStore, ProcessedEvents,
    SessionVerifier, StripeCheckout, WebhookVerifier,
};
use tarot_core::InterpretationProvider;
use tarot_runtime::OpenAiProvider;

use crate::config::ServerConfig;
use crate::handlers::api_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    // Fail fast on missing payment secrets
    let config = ServerConfig::from_env()?;

    // Initialize the interpretation provider
    let provider = Arc::new(OpenAiProvider::from_env()?);
    match provider.health_check().await {
        Ok(true) => tracing::info!("✓ Interpretation provider reachable"),
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ Interpretation provider unreachable - readings will fail");
            tracing::warn!("  Check OPENAI_API_KEY and OPENAI_BASE_URL");
        }
    }

    // Wire the ledger and settlement pipeline
    let ledger = Arc::new(CoinLedger::new(Arc::new(MemoryBalanceStore::new())));
    let credit = Arc::new(CreditService::new(ledger.clone(), &config.internal_key));
    let relay = Arc::new(CreditRelay::new(
        credit.clone(),
        &config.internal_key,
        Arc::new(ProcessedEvents::new()),
    ));

    tracing::info!("✓ Stripe configured ({} coin packs)", config.catalog.packs().len());

    // Build application state
    let state = AppState {
        ledger,
        provider,
        checkout: Arc::new(StripeCheckout::new(&config.stripe_secret_key)),
        webhook: Arc::new(WebhookVerifier::new(&config.webhook_secret)),
        relay,
        credit,
        sessions: Arc::new(SessionVerifier::new(&config.session_signing_key)),
        catalog: Arc::new(config.catalog.clone()),
        reading_cost: config.reading_cost,
        welcome_coins: config.welcome_coins,
        public_base_url: config.public_base_url.clone(),
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router: API routes plus the static WASM frontend
    let app = api_router(state)
        .nest_service("/", tower_http::services::ServeDir::new("static"))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🔮 tarot-lumina server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health             - Health check");
    tracing::info!("  GET  /api/balance        - Coin balance (welcome grant on first read)");
    tracing::info!("  POST /api/coins/spend    - Debit coins");
    tracing::info!("  POST /api/fortune        - Paid streaming reading");
    tracing::info!("  POST /api/checkout       - Create Stripe checkout");
    tracing::info!("  POST /internal/add-coins - Credit coins (internal key)");
    tracing::info!("  POST /webhook/stripe     - Payment settlement");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}

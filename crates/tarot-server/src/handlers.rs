//! HTTP Handlers
//!
//! Money-path ordering rules enforced here:
//! - a reading debits coins and confirms the debit before the
//!   interpretation stream is opened, never the reverse;
//! - the webhook handler verifies the Stripe signature over the raw body
//!   bytes before anything is parsed;
//! - settlement failures after a verified payment are logged loudly but
//!   acknowledged to Stripe, so delivery retries don't storm.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use coin_ledger::{
    normalize_spend_amount, CheckoutIntent, EventData, LedgerError, UserId, SIGNATURE_HEADER,
};
use tarot_core::ReadingRequest;

use crate::state::AppState;

/// Header carrying the internal shared credential
const INTERNAL_KEY_HEADER: &str = "x-internal-key";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider_connected: bool,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub coins: u64,
}

#[derive(Debug, Deserialize)]
pub struct SpendRequest {
    #[serde(default)]
    pub amount: Option<i64>,
}

#[derive(Serialize)]
pub struct SpendResponse {
    #[serde(rename = "newCoins")]
    pub new_coins: u64,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    #[serde(rename = "priceId", default)]
    pub price_id: String,
    #[serde(default)]
    pub uid: String,
    /// Advisory only; the coin amount is always derived from the catalog
    #[serde(rename = "coinAmount", default)]
    pub coin_amount: Option<u64>,
}

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Event-shaped body accepted by the internal credit endpoint
#[derive(Debug, Deserialize)]
struct AddCoinsEnvelope {
    data: EventData,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

fn ledger_error(e: &LedgerError) -> ApiError {
    match e {
        LedgerError::Unauthenticated(_) => {
            api_error(StatusCode::UNAUTHORIZED, e.user_message(), "unauthenticated")
        }
        LedgerError::InsufficientBalance { .. } => {
            api_error(StatusCode::BAD_REQUEST, e.user_message(), "failed-precondition")
        }
        LedgerError::InvalidParameters(_) => {
            api_error(StatusCode::BAD_REQUEST, e.user_message(), "invalid-argument")
        }
        LedgerError::Unauthorized(_) => {
            api_error(StatusCode::UNAUTHORIZED, e.user_message(), "unauthorized")
        }
        _ => api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            e.user_message(),
            "internal",
        ),
    }
}

// ============================================================================
// Authentication
// ============================================================================

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Derive the caller's uid from a verified session token. Client-supplied
/// body fields never name the account on authenticated routes.
fn authenticated_user(state: &AppState, headers: &HeaderMap) -> Result<UserId, ApiError> {
    let token = bearer_token(headers).ok_or_else(|| {
        api_error(StatusCode::UNAUTHORIZED, "Sign-in required", "unauthenticated")
    })?;

    state.sessions.verify(token).map_err(|e| {
        tracing::debug!("session verification failed: {e}");
        api_error(StatusCode::UNAUTHORIZED, e.user_message(), "unauthenticated")
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider_connected = state.provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider_connected,
    })
}

/// Current balance; creates the account with the welcome grant on first
/// contact
pub async fn get_balance(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BalanceResponse>, ApiError> {
    let uid = authenticated_user(&state, &headers)?;

    let coins = state
        .ledger
        .ensure_account(&uid, state.welcome_coins)
        .await
        .map_err(|e| ledger_error(&e))?;

    Ok(Json(BalanceResponse { coins }))
}

/// Debit coins from the authenticated caller's balance
pub async fn spend_coins(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SpendRequest>,
) -> Result<Json<SpendResponse>, ApiError> {
    let uid = authenticated_user(&state, &headers)?;
    let amount = normalize_spend_amount(payload.amount);

    let new_coins = state
        .ledger
        .debit(&uid, amount)
        .await
        .map_err(|e| ledger_error(&e))?;

    Ok(Json(SpendResponse { new_coins }))
}

/// Run a paid reading: debit first, then stream the interpretation
pub async fn fortune(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ReadingRequest>,
) -> Result<Response, ApiError> {
    let uid = authenticated_user(&state, &headers)?;

    request.validate().map_err(|e| {
        api_error(StatusCode::BAD_REQUEST, e.user_message(), "invalid-argument")
    })?;

    // Payment precedes service. The debit is atomic and final: if the
    // stream fails past this point the coins stay spent.
    let remaining = state
        .ledger
        .debit(&uid, state.reading_cost)
        .await
        .map_err(|e| ledger_error(&e))?;

    let stream = match state.provider.stream_reading(&request).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!(
                uid = %uid,
                cost = state.reading_cost,
                remaining,
                "debit applied but interpretation failed to start: {e}"
            );
            return Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                e.user_message(),
                "provider-error",
            ));
        }
    };

    let body = Body::from_stream(stream.filter_map(|frame| {
        futures::future::ready(match frame {
            Ok(chunk) if chunk.delta.is_empty() => None,
            Ok(chunk) => Some(Ok(Bytes::from(chunk.delta))),
            Err(e) => {
                tracing::error!("interpretation stream broke mid-reading: {e}");
                Some(Err(e))
            }
        })
    }));

    let mut response = Response::new(body);
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    Ok(response)
}

/// Create a Stripe checkout session for a coin pack
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    if payload.price_id.is_empty() || payload.uid.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Missing required parameters",
            "invalid-argument",
        ));
    }

    let Some(pack) = state.catalog.lookup(&payload.price_id) else {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("Unknown priceId {}", payload.price_id),
            "invalid-argument",
        ));
    };

    // The catalog is the only source of truth for the coin amount; a
    // client that disagrees is logged and overridden.
    if let Some(claimed) = payload.coin_amount {
        if claimed != pack.coins {
            tracing::warn!(
                uid = %payload.uid,
                price_id = %payload.price_id,
                claimed,
                catalog = pack.coins,
                "client-claimed coin amount ignored"
            );
        }
    }

    let intent = CheckoutIntent {
        uid: UserId::from(payload.uid),
        pack: pack.clone(),
        success_url: format!("{}/", state.public_base_url),
        cancel_url: format!("{}/", state.public_base_url),
    };

    let session = state.checkout.create_coin_session(&intent).await.map_err(|e| {
        tracing::error!("checkout session creation failed: {e}");
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            e.user_message(),
            "stripe-error",
        )
    })?;

    Ok(Json(CheckoutResponse { url: session.url }))
}

/// Internal credit endpoint, gated by the shared `X-INTERNAL-KEY`
/// credential, never by end-user tokens
pub async fn add_coins(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    let presented = headers
        .get(INTERNAL_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    // Grant extraction failures surface as InvalidParameters from the
    // service, keeping the credential check strictly first.
    let grant = serde_json::from_value::<AddCoinsEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.data.object.coin_grant().ok());
    let (uid, coins) = grant
        .map(|g| (g.uid.as_str().to_string(), g.coins))
        .unwrap_or_default();

    match state.credit.credit(presented, &uid, coins).await {
        Ok(new_balance) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": format!("granted {coins} coins, balance {new_balance}"),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })),
        ),
        Err(LedgerError::Unauthorized(_)) => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "Authentication failed"})),
        ),
        Err(LedgerError::InvalidParameters(_)) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Missing required parameters"})),
        ),
        Err(e) => {
            tracing::error!("internal credit failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Internal server error"})),
            )
        }
    }
}

/// Stripe webhook endpoint
///
/// The body arrives as raw bytes; signature verification runs on those
/// exact bytes before any JSON parsing.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<serde_json::Value>) {
    let timestamp = chrono::Utc::now().to_rfc3339();

    let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
        tracing::warn!("webhook delivery without signature header");
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "Missing Stripe signature",
                "timestamp": timestamp,
            })),
        );
    };

    let event = match state.webhook.verify(&body, signature) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("webhook rejected: {e}");
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": format!("Webhook signature verification failed: {e}"),
                    "timestamp": timestamp,
                })),
            );
        }
    };

    let acknowledged = serde_json::json!({
        "received": true,
        "eventId": event.id,
        "eventType": event.event_type,
        "timestamp": timestamp,
    });

    if !event.is_payment_succeeded() {
        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            "ignoring non-settlement event"
        );
        return (StatusCode::OK, Json(acknowledged));
    }

    let grant = match event.coin_grant() {
        Ok(grant) => grant,
        Err(e) => {
            tracing::error!(event_id = %event.id, "settlement event unusable: {e}");
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "Missing required metadata (uid or coinAmount)",
                    "eventId": event.id,
                    "timestamp": timestamp,
                })),
            );
        }
    };

    // Relay failure means "payment taken, coins not yet granted". Log it
    // for alerting, but acknowledge the delivery itself so Stripe's retry
    // loop doesn't hammer an error that isn't about delivery.
    if let Err(e) = state.relay.deliver(&event.id, &grant).await {
        tracing::error!(
            event_id = %event.id,
            uid = %grant.uid,
            coins = grant.coins,
            "payment settled but credit failed, needs reconciliation: {e}"
        );
    }

    (StatusCode::OK, Json(acknowledged))
}

// ============================================================================
// Router
// ============================================================================

/// API routes over shared state; static assets and middleware are layered
/// on in `main`
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/balance", get(get_balance))
        .route("/api/coins/spend", post(spend_coins))
        .route("/api/fortune", post(fortune))
        .route("/api/checkout", post(create_checkout))
        .route("/internal/add-coins", post(add_coins))
        .route("/webhook/stripe", post(stripe_webhook))
        .with_state(state)
}

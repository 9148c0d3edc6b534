//! Application State

use std::sync::Arc;

use coin_ledger::{
    CoinCatalog, CoinLedger, CreditRelay, CreditService, SessionVerifier, StripeCheckout,
    WebhookVerifier,
};
use tarot_core::InterpretationProvider;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The only object allowed to mutate balances
    pub ledger: Arc<CoinLedger>,

    /// Interpretation generator backend
    pub provider: Arc<dyn InterpretationProvider>,

    /// Stripe checkout session issuer
    pub checkout: Arc<StripeCheckout>,

    /// Webhook signature verifier
    pub webhook: Arc<WebhookVerifier>,

    /// Webhook-to-credit settlement relay
    pub relay: Arc<CreditRelay>,

    /// Internal-credential-gated credit service
    pub credit: Arc<CreditService>,

    /// End-user session token verifier
    pub sessions: Arc<SessionVerifier>,

    /// Server-trusted coin pack price list
    pub catalog: Arc<CoinCatalog>,

    /// Coins debited per reading
    pub reading_cost: u64,

    /// One-time grant for a brand-new account
    pub welcome_coins: u64,

    /// Public origin for checkout redirects
    pub public_base_url: String,
}

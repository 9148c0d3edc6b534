//! Stripe Checkout Integration
//!
//! Creates hosted checkout sessions for coin purchases. The target user id
//! and coin amount ride along as metadata on both the session and the
//! payment intent, so the settlement webhook can recover them from either
//! event shape Stripe emits. No balance is mutated here; money has not
//! moved until the webhook confirms it.

use std::collections::HashMap;

use stripe::{
    CheckoutSession as StripeCheckoutSession, CheckoutSessionMode, Client,
    CreateCheckoutSession, CreateCheckoutSessionLineItems,
    CreateCheckoutSessionPaymentIntentData, CreateCheckoutSessionPaymentMethodTypes,
};

use crate::catalog::CoinPack;
use crate::error::{LedgerError, Result};
use crate::store::UserId;

/// Metadata keys that must round-trip unchanged from session creation to
/// webhook delivery.
pub(crate) const META_UID: &str = "uid";
pub(crate) const META_COIN_AMOUNT: &str = "coinAmount";

/// A validated purchase attempt: who buys which pack
#[derive(Clone, Debug)]
pub struct CheckoutIntent {
    pub uid: UserId,
    pub pack: CoinPack,
    pub success_url: String,
    pub cancel_url: String,
}

/// Result of creating a checkout session
#[derive(Clone, Debug)]
pub struct CheckoutSession {
    /// Stripe session id
    pub id: String,

    /// Hosted checkout page to redirect the user to
    pub url: String,
}

/// Stripe client wrapper for coin purchases
pub struct StripeCheckout {
    client: Client,
}

impl StripeCheckout {
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: Client::new(secret_key),
        }
    }

    /// Create a hosted checkout session for a coin pack purchase.
    ///
    /// Returns the URL of Stripe's checkout page, or a descriptive error if
    /// the processor call fails.
    pub async fn create_coin_session(&self, intent: &CheckoutIntent) -> Result<CheckoutSession> {
        let metadata = grant_metadata(&intent.uid, intent.pack.coins);

        let mut params = CreateCheckoutSession::new();
        params.mode = Some(CheckoutSessionMode::Payment);
        params.payment_method_types = Some(vec![CreateCheckoutSessionPaymentMethodTypes::Card]);
        params.success_url = Some(&intent.success_url);
        params.cancel_url = Some(&intent.cancel_url);
        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            price: Some(intent.pack.price_id.clone()),
            quantity: Some(1),
            ..Default::default()
        }]);
        // Redundant embedding: the settlement webhook reads the payment
        // intent, but keep the session annotated as well.
        params.metadata = Some(metadata.clone());
        params.payment_intent_data = Some(CreateCheckoutSessionPaymentIntentData {
            metadata: Some(metadata),
            ..Default::default()
        });

        let session = StripeCheckoutSession::create(&self.client, params)
            .await
            .map_err(|e| LedgerError::Stripe(e.to_string()))?;

        let url = session
            .url
            .ok_or_else(|| LedgerError::Stripe("no checkout URL returned".into()))?;

        tracing::info!(
            session_id = %session.id,
            uid = %intent.uid,
            coins = intent.pack.coins,
            "created checkout session"
        );

        Ok(CheckoutSession {
            id: session.id.to_string(),
            url,
        })
    }
}

/// Build the `{uid, coinAmount}` metadata attached to a purchase
fn grant_metadata(uid: &UserId, coins: u64) -> HashMap<String, String> {
    let mut metadata = HashMap::new();
    metadata.insert(META_UID.to_string(), uid.as_str().to_string());
    metadata.insert(META_COIN_AMOUNT.to_string(), coins.to_string());
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_round_trips_uid_and_amount() {
        let metadata = grant_metadata(&UserId::from("user-42"), 1120);
        assert_eq!(metadata.get(META_UID).map(String::as_str), Some("user-42"));
        assert_eq!(
            metadata.get(META_COIN_AMOUNT).map(String::as_str),
            Some("1120")
        );
    }
}

//! Credit Settlement
//!
//! `CreditService` is the secret-gated increment operation; it accepts the
//! internal shared credential and nothing else, never an end-user token.
//! `CreditRelay` sits between the verified webhook and the service: it
//! de-duplicates event ids and forwards the grant with the credential
//! attached. The hop is a direct in-process call; the HTTP endpoint stays
//! up for out-of-process callers.

use std::sync::Arc;

use crate::error::{LedgerError, Result};
use crate::events::ProcessedEvents;
use crate::ledger::CoinLedger;
use crate::store::UserId;
use crate::webhook::CoinGrant;

/// Secret-gated coin increment
pub struct CreditService {
    ledger: Arc<CoinLedger>,
    internal_key: String,
}

impl CreditService {
    pub fn new(ledger: Arc<CoinLedger>, internal_key: impl Into<String>) -> Self {
        Self {
            ledger,
            internal_key: internal_key.into(),
        }
    }

    /// Credit `coins` to `uid`. The presented credential is checked before
    /// storage is touched; a bad key mutates nothing.
    pub async fn credit(
        &self,
        presented_key: Option<&str>,
        uid: &str,
        coins: u64,
    ) -> Result<u64> {
        match presented_key {
            Some(key) if key == self.internal_key => {}
            _ => {
                tracing::warn!("credit attempt with missing or mismatched internal key");
                return Err(LedgerError::Unauthorized(
                    "internal credential rejected".into(),
                ));
            }
        }

        if uid.is_empty() || coins == 0 {
            return Err(LedgerError::InvalidParameters(
                "uid and a positive coinAmount are required".into(),
            ));
        }

        self.ledger.credit(&UserId::from(uid), coins).await
    }
}

/// Outcome of relaying one verified payment event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelayOutcome {
    Credited { new_balance: u64 },
    /// Event id already settled within the retention window
    Duplicate,
}

/// Forwards verified `{uid, coinAmount}` grants to the credit service
pub struct CreditRelay {
    credit: Arc<CreditService>,
    internal_key: String,
    processed: Arc<ProcessedEvents>,
}

impl CreditRelay {
    pub fn new(
        credit: Arc<CreditService>,
        internal_key: impl Into<String>,
        processed: Arc<ProcessedEvents>,
    ) -> Self {
        Self {
            credit,
            internal_key: internal_key.into(),
            processed,
        }
    }

    /// Settle one verified payment event. Re-delivery of a known event id
    /// is a no-op success.
    pub async fn deliver(&self, event_id: &str, grant: &CoinGrant) -> Result<RelayOutcome> {
        if !self.processed.first_time(event_id) {
            tracing::info!(event_id, uid = %grant.uid, "duplicate webhook delivery, already settled");
            return Ok(RelayOutcome::Duplicate);
        }

        let new_balance = self
            .credit
            .credit(Some(&self.internal_key), grant.uid.as_str(), grant.coins)
            .await?;

        tracing::info!(
            event_id,
            uid = %grant.uid,
            coins = grant.coins,
            new_balance,
            "payment settled, coins granted"
        );
        Ok(RelayOutcome::Credited { new_balance })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBalanceStore;

    const KEY: &str = "internal-test-key";

    fn service() -> (Arc<CoinLedger>, Arc<CreditService>) {
        let ledger = Arc::new(CoinLedger::new(Arc::new(MemoryBalanceStore::new())));
        let credit = Arc::new(CreditService::new(ledger.clone(), KEY));
        (ledger, credit)
    }

    #[tokio::test]
    async fn wrong_key_never_mutates() {
        let (ledger, credit) = service();
        let uid = UserId::from("u1");

        for key in [None, Some("nope"), Some("")] {
            let err = credit.credit(key, "u1", 3000).await.unwrap_err();
            assert!(matches!(err, LedgerError::Unauthorized(_)));
        }
        assert_eq!(ledger.balance(&uid).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn valid_key_credits() {
        let (_ledger, credit) = service();
        assert_eq!(credit.credit(Some(KEY), "u1", 3000).await.unwrap(), 3000);
        assert_eq!(credit.credit(Some(KEY), "u1", 100).await.unwrap(), 3100);
    }

    #[tokio::test]
    async fn invalid_parameters_rejected_after_auth() {
        let (ledger, credit) = service();
        assert!(credit.credit(Some(KEY), "", 100).await.is_err());
        assert!(credit.credit(Some(KEY), "u1", 0).await.is_err());
        assert_eq!(ledger.balance(&UserId::from("u1")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn relay_is_idempotent_per_event_id() {
        let (ledger, credit) = service();
        let relay = CreditRelay::new(credit, KEY, Arc::new(ProcessedEvents::new()));
        let grant = CoinGrant {
            uid: UserId::from("u1"),
            coins: 3000,
        };

        assert_eq!(
            relay.deliver("evt_1", &grant).await.unwrap(),
            RelayOutcome::Credited { new_balance: 3000 }
        );
        // Stripe retries the same event id: no second credit.
        assert_eq!(
            relay.deliver("evt_1", &grant).await.unwrap(),
            RelayOutcome::Duplicate
        );
        assert_eq!(ledger.balance(&UserId::from("u1")).await.unwrap(), 3000);

        // A different payment settles normally.
        relay.deliver("evt_2", &grant).await.unwrap();
        assert_eq!(ledger.balance(&UserId::from("u1")).await.unwrap(), 6000);
    }
}

//! Coin Ledger
//!
//! The two balance mutation entry points: debit-on-use and
//! credit-on-payment. Nothing else in the workspace writes a balance.

use std::sync::Arc;

use crate::error::{LedgerError, Result};
use crate::store::{BalanceStore, UserId};

/// Normalize a client-supplied spend amount: defaults to 1 when absent or
/// not a positive number.
pub fn normalize_spend_amount(raw: Option<i64>) -> u64 {
    match raw {
        Some(n) if n > 0 => n as u64,
        _ => 1,
    }
}

/// Server-authoritative coin ledger over a balance store
pub struct CoinLedger {
    store: Arc<dyn BalanceStore>,
}

impl CoinLedger {
    pub fn new(store: Arc<dyn BalanceStore>) -> Self {
        Self { store }
    }

    /// Current balance for display; 0 for an absent record
    pub async fn balance(&self, uid: &UserId) -> Result<u64> {
        self.store.balance(uid).await
    }

    /// Debit `amount` coins. The sufficiency check and the decrement are a
    /// single atomic storage operation, so concurrent debits can never
    /// overdraft. Returns the new balance.
    pub async fn debit(&self, uid: &UserId, amount: u64) -> Result<u64> {
        if amount == 0 {
            return Err(LedgerError::InvalidParameters(
                "debit amount must be positive".into(),
            ));
        }

        let remaining = self.store.try_debit(uid, amount).await?;
        tracing::info!(uid = %uid, amount, remaining, "debited coins");
        Ok(remaining)
    }

    /// Credit `amount` coins as an atomic add, creating the record if
    /// absent. Returns the new balance.
    pub async fn credit(&self, uid: &UserId, amount: u64) -> Result<u64> {
        if amount == 0 {
            return Err(LedgerError::InvalidParameters(
                "credit amount must be positive".into(),
            ));
        }

        let balance = self.store.credit(uid, amount).await?;
        tracing::info!(uid = %uid, amount, balance, "credited coins");
        Ok(balance)
    }

    /// Create the account at `starting` coins on first contact; no-op for
    /// existing accounts. Returns the current balance.
    pub async fn ensure_account(&self, uid: &UserId, starting: u64) -> Result<u64> {
        self.store.ensure_account(uid, starting).await
    }
}

//! Balance Storage
//!
//! Durable per-user coin balance records. A missing record reads as 0.
//! The trait deliberately offers no plain write: the only mutations are an
//! atomic conditional decrement and an atomic add, so application code can
//! never reintroduce a read-modify-write race on a balance.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{LedgerError, Result};

/// Opaque user identifier, assigned by the external identity provider
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Balance storage trait
///
/// `try_debit` and `credit` must be atomic with respect to each other and to
/// themselves: concurrent calls may interleave in any order but each call
/// either fully applies or not at all, and a balance can never be observed
/// below zero.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Current balance; 0 if no record exists
    async fn balance(&self, uid: &UserId) -> Result<u64>;

    /// Atomically check sufficiency and decrement. Returns the new balance,
    /// or `InsufficientBalance` with no mutation.
    async fn try_debit(&self, uid: &UserId, amount: u64) -> Result<u64>;

    /// Atomically add `amount`, creating the record at `amount` if absent.
    /// Returns the new balance.
    async fn credit(&self, uid: &UserId, amount: u64) -> Result<u64>;

    /// Create the record at `starting` if absent. Returns the balance either
    /// way. Used for the one-time welcome grant.
    async fn ensure_account(&self, uid: &UserId, starting: u64) -> Result<u64>;
}

/// In-memory balance store (for development and tests)
///
/// Atomicity comes from performing each check-and-mutate inside a single
/// write-lock critical section.
pub struct MemoryBalanceStore {
    coins: RwLock<HashMap<UserId, u64>>,
}

impl Default for MemoryBalanceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBalanceStore {
    pub fn new() -> Self {
        Self {
            coins: RwLock::new(HashMap::new()),
        }
    }

    /// Seed a balance directly (tests and dev tooling only)
    pub fn with_balance(uid: impl Into<UserId>, coins: u64) -> Self {
        let store = Self::new();
        store.coins.write().unwrap().insert(uid.into(), coins);
        store
    }
}

#[async_trait]
impl BalanceStore for MemoryBalanceStore {
    async fn balance(&self, uid: &UserId) -> Result<u64> {
        let coins = self.coins.read().unwrap();
        Ok(coins.get(uid).copied().unwrap_or(0))
    }

    async fn try_debit(&self, uid: &UserId, amount: u64) -> Result<u64> {
        let mut coins = self.coins.write().unwrap();
        let current = coins.get(uid).copied().unwrap_or(0);

        if current < amount {
            return Err(LedgerError::InsufficientBalance {
                available: current,
                requested: amount,
            });
        }

        let remaining = current - amount;
        coins.insert(uid.clone(), remaining);
        Ok(remaining)
    }

    async fn credit(&self, uid: &UserId, amount: u64) -> Result<u64> {
        let mut coins = self.coins.write().unwrap();
        let entry = coins.entry(uid.clone()).or_insert(0);
        *entry = entry.checked_add(amount).ok_or_else(|| {
            LedgerError::Storage(format!("balance overflow for {uid}"))
        })?;
        Ok(*entry)
    }

    async fn ensure_account(&self, uid: &UserId, starting: u64) -> Result<u64> {
        let mut coins = self.coins.write().unwrap();
        Ok(*coins.entry(uid.clone()).or_insert(starting))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn absent_record_reads_as_zero() {
        let store = MemoryBalanceStore::new();
        assert_eq!(store.balance(&UserId::from("nobody")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn debit_rejects_without_mutation() {
        let store = MemoryBalanceStore::with_balance("u1", 50);
        let uid = UserId::from("u1");

        let err = store.try_debit(&uid, 51).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientBalance {
                available: 50,
                requested: 51
            }
        ));
        assert_eq!(store.balance(&uid).await.unwrap(), 50);
    }

    #[tokio::test]
    async fn credit_creates_record() {
        let store = MemoryBalanceStore::new();
        let uid = UserId::from("fresh");
        assert_eq!(store.credit(&uid, 3000).await.unwrap(), 3000);
        assert_eq!(store.balance(&uid).await.unwrap(), 3000);
    }

    #[tokio::test]
    async fn ensure_account_is_one_time() {
        let store = MemoryBalanceStore::new();
        let uid = UserId::from("newbie");
        assert_eq!(store.ensure_account(&uid, 500).await.unwrap(), 500);
        store.try_debit(&uid, 100).await.unwrap();
        // Second call must not re-grant
        assert_eq!(store.ensure_account(&uid, 500).await.unwrap(), 400);
    }
}

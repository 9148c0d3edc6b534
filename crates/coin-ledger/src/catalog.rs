//! Coin Pack Catalog
//!
//! The server-trusted price list. A checkout always derives its coin amount
//! from the pack looked up by Stripe price id; a client-supplied amount is
//! never trusted.

use serde::Serialize;

use crate::error::{LedgerError, Result};

/// A purchasable bundle of coins tied to a Stripe price
#[derive(Clone, Debug, Serialize)]
pub struct CoinPack {
    /// Stripe price id the pack is sold under
    pub price_id: String,

    /// Coins granted when the payment settles
    pub coins: u64,
}

/// Fixed catalog of coin packs
#[derive(Clone, Debug)]
pub struct CoinCatalog {
    packs: Vec<CoinPack>,
}

impl CoinCatalog {
    pub fn new(packs: Vec<CoinPack>) -> Self {
        Self { packs }
    }

    /// Development catalog matching the storefront's four pack sizes
    pub fn builtin() -> Self {
        Self::new(vec![
            CoinPack {
                price_id: "price_coins_3000".into(),
                coins: 3000,
            },
            CoinPack {
                price_id: "price_coins_1120".into(),
                coins: 1120,
            },
            CoinPack {
                price_id: "price_coins_380".into(),
                coins: 380,
            },
            CoinPack {
                price_id: "price_coins_100".into(),
                coins: 100,
            },
        ])
    }

    /// Parse a catalog from a `price_id:coins` comma list, e.g.
    /// `price_1Abc:3000,price_2Def:100`.
    pub fn from_spec(spec: &str) -> Result<Self> {
        let mut packs = Vec::new();

        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (price_id, coins) = entry.split_once(':').ok_or_else(|| {
                LedgerError::Config(format!("malformed coin pack entry '{entry}'"))
            })?;

            let coins: u64 = coins.trim().parse().map_err(|_| {
                LedgerError::Config(format!("non-numeric coin count in '{entry}'"))
            })?;
            if coins == 0 || price_id.trim().is_empty() {
                return Err(LedgerError::Config(format!(
                    "coin pack entry '{entry}' must have a price id and a positive coin count"
                )));
            }

            packs.push(CoinPack {
                price_id: price_id.trim().to_string(),
                coins,
            });
        }

        if packs.is_empty() {
            return Err(LedgerError::Config("coin catalog is empty".into()));
        }
        Ok(Self::new(packs))
    }

    pub fn lookup(&self, price_id: &str) -> Option<&CoinPack> {
        self.packs.iter().find(|p| p.price_id == price_id)
    }

    pub fn packs(&self) -> &[CoinPack] {
        &self.packs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookup() {
        let catalog = CoinCatalog::builtin();
        assert_eq!(catalog.lookup("price_coins_3000").unwrap().coins, 3000);
        assert!(catalog.lookup("price_unknown").is_none());
    }

    #[test]
    fn parses_spec_pairs() {
        let catalog = CoinCatalog::from_spec("price_a:100, price_b:380").unwrap();
        assert_eq!(catalog.packs().len(), 2);
        assert_eq!(catalog.lookup("price_b").unwrap().coins, 380);
    }

    #[test]
    fn rejects_malformed_spec() {
        assert!(CoinCatalog::from_spec("").is_err());
        assert!(CoinCatalog::from_spec("price_a").is_err());
        assert!(CoinCatalog::from_spec("price_a:zero").is_err());
        assert!(CoinCatalog::from_spec("price_a:0").is_err());
        assert!(CoinCatalog::from_spec(":100").is_err());
    }
}

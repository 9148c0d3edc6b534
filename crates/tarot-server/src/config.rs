//! Server Configuration
//!
//! All payment secrets are required at startup. A deployment missing one
//! refuses to boot rather than failing on the first request that needs it.

use anyhow::Context;
use coin_ledger::CoinCatalog;

/// Environment-derived server configuration
pub struct ServerConfig {
    pub bind_addr: String,

    /// Public origin used for checkout success/cancel redirects
    pub public_base_url: String,

    pub stripe_secret_key: String,
    pub webhook_secret: String,
    pub internal_key: String,
    pub session_signing_key: String,

    /// Coins debited per reading
    pub reading_cost: u64,

    /// One-time grant for a brand-new account
    pub welcome_coins: u64,

    pub catalog: CoinCatalog,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let catalog = match std::env::var("COIN_PACKS") {
            Ok(spec) => CoinCatalog::from_spec(&spec).context("parsing COIN_PACKS")?,
            Err(_) => CoinCatalog::builtin(),
        };

        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into()),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            stripe_secret_key: require("STRIPE_SECRET_KEY")?,
            webhook_secret: require("STRIPE_WEBHOOK_SECRET")?,
            internal_key: require("INTERNAL_WEBHOOK_KEY")?,
            session_signing_key: require("SESSION_SIGNING_KEY")?,
            reading_cost: parse_or("READING_COST", 100)?,
            welcome_coins: parse_or("WELCOME_COINS", 500)?,
            catalog,
        })
    }
}

fn require(name: &str) -> anyhow::Result<String> {
    let value =
        std::env::var(name).with_context(|| format!("required secret {name} is not set"))?;
    anyhow::ensure!(!value.is_empty(), "required secret {name} is empty");
    Ok(value)
}

fn parse_or(name: &str, default: u64) -> anyhow::Result<u64> {
    match std::env::var(name) {
        Ok(raw) => raw.parse().with_context(|| format!("{name} must be a positive integer")),
        Err(_) => Ok(default),
    }
}

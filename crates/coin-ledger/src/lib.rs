//! # coin-ledger
//!
//! Coin balance ledger and payment settlement for tarot-lumina.
//!
//! The app sells "coins" (a single integer currency) that are debited when a
//! user requests a reading and credited when a Stripe payment settles. This
//! crate owns the only two paths that may mutate a balance:
//!
//! ```text
//! ┌──────────┐  debit   ┌────────────┐  credit  ┌─────────────┐
//! │  Reading │─────────▶│ CoinLedger │◀─────────│ CreditRelay │
//! │  handler │          │ (atomic)   │          │ (webhook)   │
//! └──────────┘          └────────────┘          └─────────────┘
//! ```
//!
//! Both mutations are atomic at the storage layer: a debit is a single
//! check-and-decrement (two concurrent debits can never overdraft), and a
//! credit is a single add that creates the record if absent. Payment
//! settlement is fed by Stripe webhooks whose signatures are verified over
//! the exact raw request bytes before anything else happens.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use coin_ledger::{CoinLedger, MemoryBalanceStore, UserId};
//!
//! let ledger = CoinLedger::new(Arc::new(MemoryBalanceStore::new()));
//! let remaining = ledger.debit(&UserId::from("uid-1"), 100).await?;
//! ```

mod catalog;
mod checkout;
mod credit;
mod error;
mod events;
mod ledger;
mod session;
mod store;
mod webhook;

pub use catalog::{CoinCatalog, CoinPack};
pub use checkout::{CheckoutIntent, CheckoutSession, StripeCheckout};
pub use credit::{CreditRelay, CreditService, RelayOutcome};
pub use error::{LedgerError, Result};
pub use events::ProcessedEvents;
pub use ledger::{normalize_spend_amount, CoinLedger};
pub use session::SessionVerifier;
pub use store::{BalanceStore, MemoryBalanceStore, UserId};
pub use webhook::{
    signature_header, CoinGrant, EventData, EventObject, PaymentEvent, WebhookVerifier,
    SIGNATURE_HEADER,
};

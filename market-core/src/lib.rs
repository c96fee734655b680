//! Marketplace Ledger Core
//!
//! Deterministic, idempotent state transitions over a two-partition
//! key-value ledger: per-org account balances, private inventories, and a
//! public market with atomic purchase settlement.
//!
//! # Architecture
//!
//! - **Two partitions**: a globally visible keyspace for accounts and
//!   listings, and one private keyspace per organization for unlisted
//!   inventory
//! - **Single transaction per operation**: every call stages its writes
//!   and commits them as one batch, or not at all
//! - **Explicit identity**: the caller's org is resolved once at the
//!   boundary and threaded through as a parameter
//!
//! # Invariants
//!
//! - Balances and counts are never negative in committed state
//! - A public listing exists only while it holds at least one unit
//! - A purchase conserves total balance across buyer and seller
//! - Units move between pools; they are never created or destroyed
//!   outside initial stocking

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod accounts;
pub mod config;
pub mod error;
pub mod identity;
pub mod inventory;
pub mod ledger;
pub mod market;
pub mod storage;
pub mod txn;
pub mod types;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use identity::{IdentityResolver, StaticIdentity};
pub use ledger::{
    AddBalanceRequest, AddItemRequest, AddToMarketRequest, BuyRequest, MarketLedger,
};
pub use storage::{EventSink, LedgerStore, LogSink, Partition, RocksStore};
pub use txn::Transaction;
pub use types::{Account, Item, ListingKey, MarketEvent, OrgId, EVENT_ITEM_ADDED};

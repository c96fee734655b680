//! Operation facade
//!
//! This module ties together storage, identity, and the transition
//! modules into the public operation surface: resolve the caller once,
//! stage the transition in a single transaction, commit atomically.
//! Read-only operations never commit.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use market_core::{Config, MarketLedger, OrgId, StaticIdentity};
//!
//! fn main() -> market_core::Result<()> {
//!     let identity = Arc::new(StaticIdentity::new(OrgId::new("Org1MSP")));
//!     let ledger = MarketLedger::open(Config::default(), identity)?;
//!     ledger.init_ledger()?;
//!     Ok(())
//! }
//! ```

use crate::{
    accounts,
    error::Result,
    identity::IdentityResolver,
    inventory, market,
    storage::{EventSink, RocksStore},
    txn::Transaction,
    types::{Item, ListingKey, OrgId},
    Config,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Input for `AddBalance`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddBalanceRequest {
    /// Amount to credit; must be non-negative
    pub amount: i64,
}

/// Input for `AddItem`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddItemRequest {
    /// Item name
    pub name: String,
    /// Initial unit count; must be non-negative
    pub count: i64,
    /// Unit price; must be non-negative
    pub price: i64,
}

/// Input for `AddToMarket`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddToMarketRequest {
    /// Name of the private item to list
    pub name: String,
    /// Listing price; ignored when restocking an existing listing
    pub price: i64,
}

/// Input for `BuyFromMarket`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyRequest {
    /// Encoded composite id of the listing
    pub listing_id: String,
}

/// Main marketplace ledger interface
pub struct MarketLedger {
    /// Backing store; shared between facades acting for different orgs
    store: Arc<RocksStore>,

    /// Caller identity collaborator
    identity: Arc<dyn IdentityResolver>,
}

impl MarketLedger {
    /// Open the ledger with configuration
    pub fn open(config: Config, identity: Arc<dyn IdentityResolver>) -> Result<Self> {
        let store = Arc::new(RocksStore::open(&config)?);
        Ok(Self { store, identity })
    }

    /// Build a facade over an already-open store
    pub fn with_store(store: Arc<RocksStore>, identity: Arc<dyn IdentityResolver>) -> Self {
        Self { store, identity }
    }

    /// Register an additional domain-event sink
    pub fn register_sink(&self, sink: Box<dyn EventSink>) {
        self.store.register_sink(sink);
    }

    fn caller(&self) -> Result<OrgId> {
        self.identity.resolve_caller_org()
    }

    fn begin(&self) -> Transaction<'_> {
        Transaction::new(self.store.as_ref())
    }

    /// Idempotently create the caller's account with zero balance
    pub fn init_ledger(&self) -> Result<()> {
        let org = self.caller()?;
        let mut txn = self.begin();
        accounts::initialize(&mut txn, &org)?;
        txn.commit()
    }

    /// Credit the caller's account
    pub fn add_balance(&self, req: AddBalanceRequest) -> Result<()> {
        let org = self.caller()?;
        let mut txn = self.begin();
        accounts::credit(&mut txn, &org, req.amount)?;
        txn.commit()
    }

    /// Create a new private item in the caller's inventory
    pub fn add_item(&self, req: AddItemRequest) -> Result<()> {
        let org = self.caller()?;
        let mut txn = self.begin();
        inventory::add_item(&mut txn, &org, &req.name, req.count, req.price)?;
        txn.commit()
    }

    /// Current balance of the caller's account
    pub fn get_balance(&self) -> Result<i64> {
        let org = self.caller()?;
        let txn = self.begin();
        accounts::balance(&txn, &org)
    }

    /// Full snapshot of the caller's private inventory
    pub fn get_items(&self) -> Result<Vec<Item>> {
        let org = self.caller()?;
        let txn = self.begin();
        inventory::list(&txn, &org)
    }

    /// Move one unit of the caller's item onto the public market
    pub fn add_to_market(&self, req: AddToMarketRequest) -> Result<()> {
        let org = self.caller()?;
        let mut txn = self.begin();
        market::add_to_market(&mut txn, &org, &req.name, req.price)?;
        txn.commit()
    }

    /// All items currently listed, across every org
    pub fn get_items_in_market(&self) -> Result<Vec<Item>> {
        let txn = self.begin();
        market::listings(&txn)
    }

    /// Purchase one unit of a listing, settling buyer and seller balances
    pub fn buy_from_market(&self, req: BuyRequest) -> Result<()> {
        let org = self.caller()?;
        let key = ListingKey::parse(&req.listing_id)?;
        let mut txn = self.begin();
        market::buy(&mut txn, &org, &key)?;
        txn.commit()
    }
}

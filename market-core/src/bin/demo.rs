//! Scripted two-org walkthrough of the marketplace ledger

use market_core::{
    AddBalanceRequest, AddItemRequest, AddToMarketRequest, BuyRequest, Config, MarketLedger,
    OrgId, RocksStore, StaticIdentity,
};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting marketplace ledger demo");

    let config = Config::from_env()?;
    let store = Arc::new(RocksStore::open(&config)?);

    let org1 = OrgId::new("Org1MSP");
    let org2 = OrgId::new("Org2MSP");
    let as_org1 =
        MarketLedger::with_store(store.clone(), Arc::new(StaticIdentity::new(org1.clone())));
    let as_org2 =
        MarketLedger::with_store(store.clone(), Arc::new(StaticIdentity::new(org2.clone())));

    as_org1.init_ledger()?;
    as_org2.init_ledger()?;
    as_org1.add_balance(AddBalanceRequest { amount: 100 })?;

    as_org2.add_item(AddItemRequest {
        name: "widget".to_string(),
        count: 3,
        price: 30,
    })?;
    as_org2.add_to_market(AddToMarketRequest {
        name: "widget".to_string(),
        price: 30,
    })?;

    for item in as_org1.get_items_in_market()? {
        tracing::info!(id = %item.id, count = item.count, price = item.price, "Listed");
    }

    as_org1.buy_from_market(BuyRequest {
        listing_id: "Org2MSP_widget".to_string(),
    })?;

    tracing::info!(
        org1_balance = as_org1.get_balance()?,
        org2_balance = as_org2.get_balance()?,
        "Settlement complete"
    );

    Ok(())
}

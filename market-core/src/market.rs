//! Market manager: listing, restock, and purchase settlement
//!
//! Each composite id is an independent little state machine moving single
//! units between the owning org's private pool and the public listing.
//! Settlement debits the buyer and credits the seller inside the same
//! transaction, so total balance is conserved by construction.

use crate::{
    accounts,
    error::{Error, Result},
    storage::Partition,
    txn::Transaction,
    types::{Item, ListingKey, MarketEvent, OrgId, EVENT_ITEM_ADDED},
};

/// Move one unit of the caller's item from private inventory to the
/// public market.
///
/// Creates the listing with the supplied price when it is new; on restock
/// the existing listing keeps its first-listed price and the argument is
/// ignored. Emits [`EVENT_ITEM_ADDED`] with the resulting listing either
/// way.
pub fn add_to_market(
    txn: &mut Transaction<'_>,
    org: &OrgId,
    name: &str,
    price: i64,
) -> Result<Item> {
    if price < 0 {
        return Err(Error::InvalidArgument(
            "cannot have negative price".to_string(),
        ));
    }

    let key = ListingKey::new(org.clone(), name)?;
    let id = key.encode();
    let private = Partition::Private(org.clone());

    let mut item: Item = txn
        .get(&private, &id)?
        .ok_or_else(|| Error::NotFound(format!("item {id} not found in inventory")))?;

    // A zero-count record can only come from initial stocking; there is
    // no unit to move.
    if item.count == 0 {
        return Err(Error::Conflict(format!("no units of item {id} left in inventory")));
    }

    item.count -= 1;
    if item.count == 0 {
        txn.delete(&private, &id);
    } else {
        txn.put(&private, &id, &item)?;
    }

    let listing = match txn.get::<Item>(&Partition::Public, &id)? {
        None => Item {
            id: id.clone(),
            name: key.name().to_string(),
            org: org.display_name().to_string(),
            count: 1,
            price,
        },
        Some(mut listing) => {
            // Restock keeps the first-listed price
            listing.count += 1;
            listing
        }
    };
    txn.put(&Partition::Public, &id, &listing)?;
    txn.emit(MarketEvent::new(EVENT_ITEM_ADDED, &listing)?);

    tracing::debug!(org = %org, id = %id, listed = listing.count, "Unit moved to market");
    Ok(listing)
}

/// All listed items across every org, in key order.
///
/// Account records share the public partition and are skipped by key
/// shape: bare org identifiers carry no separator and fail to parse.
pub fn listings(txn: &Transaction<'_>) -> Result<Vec<Item>> {
    let entries = txn.range_scan(&Partition::Public, "", "")?;

    let mut items = Vec::new();
    for (key, bytes) in entries {
        if ListingKey::parse(&key).is_err() {
            continue;
        }
        items.push(serde_json::from_slice(&bytes)?);
    }
    Ok(items)
}

/// Purchase one unit of the listing identified by `key`, settling
/// balances between buyer and seller.
///
/// The whole purchase is one transaction: if the seller's account turns
/// out to be missing after the debit and listing decrement were staged,
/// nothing is committed.
pub fn buy(txn: &mut Transaction<'_>, buyer: &OrgId, key: &ListingKey) -> Result<Item> {
    let id = key.encode();

    let mut listing: Item = txn
        .get(&Partition::Public, &id)?
        .ok_or_else(|| Error::Conflict("item not available in market".to_string()))?;

    let mut buyer_account = accounts::load(txn, buyer)?;
    if buyer_account.balance < listing.price {
        return Err(Error::Conflict(
            "insufficient balance in account".to_string(),
        ));
    }

    buyer_account.balance -= listing.price;
    accounts::save(txn, &buyer_account)?;

    listing.count -= 1;
    if listing.count == 0 {
        txn.delete(&Partition::Public, &id);
    } else {
        txn.put(&Partition::Public, &id, &listing)?;
    }

    // Seller org is the parsed key component. When buyer == seller this
    // reload observes the staged debit, so the credit nets to zero.
    let mut seller_account = accounts::load(txn, key.org())?;
    seller_account.balance += listing.price;
    accounts::save(txn, &seller_account)?;

    tracing::debug!(
        buyer = %buyer,
        seller = %key.org(),
        id = %id,
        price = listing.price,
        "Purchase settled"
    );
    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{inventory, storage::RocksStore, Config};
    use tempfile::TempDir;

    fn test_store() -> (RocksStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (RocksStore::open(&config).unwrap(), temp_dir)
    }

    fn org1() -> OrgId {
        OrgId::new("Org1MSP")
    }

    fn org2() -> OrgId {
        OrgId::new("Org2MSP")
    }

    /// Seller org2 with 3 widgets at price 30; buyer org1 with `balance`.
    fn seed(store: &RocksStore, balance: i64) {
        let mut txn = Transaction::new(store);
        accounts::initialize(&mut txn, &org1()).unwrap();
        accounts::initialize(&mut txn, &org2()).unwrap();
        accounts::credit(&mut txn, &org1(), balance).unwrap();
        inventory::add_item(&mut txn, &org2(), "widget", 3, 30).unwrap();
        txn.commit().unwrap();
    }

    fn private_count(store: &RocksStore, org: &OrgId, id: &str) -> Option<i64> {
        let txn = Transaction::new(store);
        txn.get::<Item>(&Partition::Private(org.clone()), id)
            .unwrap()
            .map(|item| item.count)
    }

    fn listing(store: &RocksStore, id: &str) -> Option<Item> {
        let txn = Transaction::new(store);
        txn.get(&Partition::Public, id).unwrap()
    }

    #[test]
    fn test_add_to_market_moves_one_unit() {
        let (store, _temp) = test_store();
        seed(&store, 0);

        let mut txn = Transaction::new(&store);
        add_to_market(&mut txn, &org2(), "widget", 30).unwrap();
        txn.commit().unwrap();

        assert_eq!(private_count(&store, &org2(), "Org2MSP_widget"), Some(2));
        assert_eq!(listing(&store, "Org2MSP_widget").unwrap().count, 1);

        // Two more moves drain the private record entirely
        for _ in 0..2 {
            let mut txn = Transaction::new(&store);
            add_to_market(&mut txn, &org2(), "widget", 30).unwrap();
            txn.commit().unwrap();
        }
        assert_eq!(private_count(&store, &org2(), "Org2MSP_widget"), None);
        assert_eq!(listing(&store, "Org2MSP_widget").unwrap().count, 3);
    }

    #[test]
    fn test_restock_keeps_first_price() {
        let (store, _temp) = test_store();
        seed(&store, 0);

        let mut txn = Transaction::new(&store);
        add_to_market(&mut txn, &org2(), "widget", 30).unwrap();
        txn.commit().unwrap();

        let mut txn = Transaction::new(&store);
        add_to_market(&mut txn, &org2(), "widget", 999).unwrap();
        txn.commit().unwrap();

        let listed = listing(&store, "Org2MSP_widget").unwrap();
        assert_eq!(listed.count, 2);
        assert_eq!(listed.price, 30);
    }

    #[test]
    fn test_add_to_market_requires_inventory() {
        let (store, _temp) = test_store();
        seed(&store, 0);

        let mut txn = Transaction::new(&store);
        let err = add_to_market(&mut txn, &org2(), "gizmo", 10).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let mut txn = Transaction::new(&store);
        assert!(matches!(
            add_to_market(&mut txn, &org2(), "widget", -1),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_add_to_market_zero_count_record() {
        let (store, _temp) = test_store();
        let mut txn = Transaction::new(&store);
        inventory::add_item(&mut txn, &org2(), "empty", 0, 5).unwrap();
        txn.commit().unwrap();

        let mut txn = Transaction::new(&store);
        let err = add_to_market(&mut txn, &org2(), "empty", 5).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_listings_skip_account_records() {
        let (store, _temp) = test_store();
        seed(&store, 100);

        let mut txn = Transaction::new(&store);
        add_to_market(&mut txn, &org2(), "widget", 30).unwrap();
        txn.commit().unwrap();

        let txn = Transaction::new(&store);
        let listed = listings(&txn).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "Org2MSP_widget");
    }

    #[test]
    fn test_buy_settles_both_accounts() {
        let (store, _temp) = test_store();
        seed(&store, 100);

        let mut txn = Transaction::new(&store);
        add_to_market(&mut txn, &org2(), "widget", 30).unwrap();
        add_to_market(&mut txn, &org2(), "widget", 30).unwrap();
        txn.commit().unwrap();

        let key = ListingKey::parse("Org2MSP_widget").unwrap();
        let mut txn = Transaction::new(&store);
        buy(&mut txn, &org1(), &key).unwrap();
        txn.commit().unwrap();

        let txn = Transaction::new(&store);
        assert_eq!(accounts::balance(&txn, &org1()).unwrap(), 70);
        assert_eq!(accounts::balance(&txn, &org2()).unwrap(), 30);
        assert_eq!(listing(&store, "Org2MSP_widget").unwrap().count, 1);
    }

    #[test]
    fn test_buying_last_unit_removes_listing() {
        let (store, _temp) = test_store();
        seed(&store, 100);

        let mut txn = Transaction::new(&store);
        add_to_market(&mut txn, &org2(), "widget", 30).unwrap();
        txn.commit().unwrap();

        let key = ListingKey::parse("Org2MSP_widget").unwrap();
        let mut txn = Transaction::new(&store);
        buy(&mut txn, &org1(), &key).unwrap();
        txn.commit().unwrap();

        assert!(listing(&store, "Org2MSP_widget").is_none());

        // Second purchase finds nothing on the market
        let mut txn = Transaction::new(&store);
        let err = buy(&mut txn, &org1(), &key).unwrap_err();
        assert_eq!(err.to_string(), "item not available in market");
    }

    #[test]
    fn test_buy_insufficient_balance_mutates_nothing() {
        let (store, _temp) = test_store();
        seed(&store, 10);

        let mut txn = Transaction::new(&store);
        add_to_market(&mut txn, &org2(), "widget", 30).unwrap();
        txn.commit().unwrap();

        let key = ListingKey::parse("Org2MSP_widget").unwrap();
        let mut txn = Transaction::new(&store);
        let err = buy(&mut txn, &org1(), &key).unwrap_err();
        assert_eq!(err.to_string(), "insufficient balance in account");
        drop(txn);

        let txn = Transaction::new(&store);
        assert_eq!(accounts::balance(&txn, &org1()).unwrap(), 10);
        assert_eq!(accounts::balance(&txn, &org2()).unwrap(), 0);
        assert_eq!(listing(&store, "Org2MSP_widget").unwrap().count, 1);
    }

    #[test]
    fn test_buy_without_account() {
        let (store, _temp) = test_store();
        seed(&store, 100);

        let mut txn = Transaction::new(&store);
        add_to_market(&mut txn, &org2(), "widget", 30).unwrap();
        txn.commit().unwrap();

        let key = ListingKey::parse("Org2MSP_widget").unwrap();
        let stranger = OrgId::new("Org9MSP");
        let mut txn = Transaction::new(&store);
        let err = buy(&mut txn, &stranger, &key).unwrap_err();
        assert_eq!(err.to_string(), "account does not exist");
    }

    #[test]
    fn test_missing_seller_aborts_whole_purchase() {
        let (store, _temp) = test_store();

        // Buyer exists and is funded; seller org2 never initialized
        let mut txn = Transaction::new(&store);
        accounts::initialize(&mut txn, &org1()).unwrap();
        accounts::credit(&mut txn, &org1(), 100).unwrap();
        inventory::add_item(&mut txn, &org2(), "widget", 1, 30).unwrap();
        txn.commit().unwrap();

        let mut txn = Transaction::new(&store);
        add_to_market(&mut txn, &org2(), "widget", 30).unwrap();
        txn.commit().unwrap();

        let key = ListingKey::parse("Org2MSP_widget").unwrap();
        let mut txn = Transaction::new(&store);
        let err = buy(&mut txn, &org1(), &key).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        drop(txn);

        // Neither the debit nor the listing decrement became durable
        let txn = Transaction::new(&store);
        assert_eq!(accounts::balance(&txn, &org1()).unwrap(), 100);
        assert_eq!(listing(&store, "Org2MSP_widget").unwrap().count, 1);
    }

    #[test]
    fn test_self_purchase_conserves_balance() {
        let (store, _temp) = test_store();

        let mut txn = Transaction::new(&store);
        accounts::initialize(&mut txn, &org2()).unwrap();
        accounts::credit(&mut txn, &org2(), 50).unwrap();
        inventory::add_item(&mut txn, &org2(), "widget", 1, 30).unwrap();
        txn.commit().unwrap();

        let mut txn = Transaction::new(&store);
        add_to_market(&mut txn, &org2(), "widget", 30).unwrap();
        txn.commit().unwrap();

        let key = ListingKey::parse("Org2MSP_widget").unwrap();
        let mut txn = Transaction::new(&store);
        buy(&mut txn, &org2(), &key).unwrap();
        txn.commit().unwrap();

        // Debit and credit of the same account cancel out
        let txn = Transaction::new(&store);
        assert_eq!(accounts::balance(&txn, &org2()).unwrap(), 50);
        assert!(listing(&store, "Org2MSP_widget").is_none());
    }
}

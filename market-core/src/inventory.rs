//! Private inventory management
//!
//! Each org's unlisted items live in that org's private partition, keyed
//! by composite id. Inventory only flows outward: counts are decremented
//! by the market manager and never incremented after creation.

use crate::{
    error::{Error, Result},
    storage::Partition,
    txn::Transaction,
    types::{Item, ListingKey, OrgId},
};

/// Strict create of a private item. No upsert or merge semantics.
pub fn add_item(
    txn: &mut Transaction<'_>,
    org: &OrgId,
    name: &str,
    count: i64,
    price: i64,
) -> Result<Item> {
    if count < 0 {
        return Err(Error::InvalidArgument(
            "cannot stock a negative count".to_string(),
        ));
    }
    if price < 0 {
        return Err(Error::InvalidArgument(
            "cannot have negative price".to_string(),
        ));
    }

    let key = ListingKey::new(org.clone(), name)?;
    let id = key.encode();
    let partition = Partition::Private(org.clone());

    if txn.get::<Item>(&partition, &id)?.is_some() {
        return Err(Error::AlreadyExists(format!("item {id} already exists")));
    }

    let item = Item {
        id: id.clone(),
        name: key.name().to_string(),
        org: org.display_name().to_string(),
        count,
        price,
    };
    txn.put(&partition, &id, &item)?;

    tracing::debug!(org = %org, id = %id, count, price, "Item stocked");
    Ok(item)
}

/// Complete snapshot of the org's private items, in key order.
pub fn list(txn: &Transaction<'_>, org: &OrgId) -> Result<Vec<Item>> {
    let partition = Partition::Private(org.clone());

    txn.range_scan(&partition, "", "")?
        .into_iter()
        .map(|(_, bytes)| serde_json::from_slice(&bytes).map_err(Error::from))
        .collect()
}

//! Core types for the marketplace ledger
//!
//! Records are serialized as JSON. Field names (`ID`, `Org`, `Balance`,
//! `Name`, `Count`, `Price`) are the stable wire format shared with other
//! deployments and must round-trip exactly; unknown fields are tolerated
//! on read for forward compatibility.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Separator between the org component and the item name in a listing key.
///
/// Account keys are bare org identifiers and never contain it, which is
/// what lets listings and accounts share the public partition.
pub const KEY_SEPARATOR: char = '_';

/// Fixed suffix carried by org identifiers ("Org1MSP" -> "Org1").
const ORG_ID_SUFFIX: &str = "MSP";

/// Event name emitted when a unit is listed or restocked on the market.
pub const EVENT_ITEM_ADDED: &str = "item_added";

/// Organization identifier
///
/// Doubles as the account storage key in the public partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrgId(String);

impl OrgId {
    /// Create new org ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable name: the identifier with its fixed suffix stripped.
    pub fn display_name(&self) -> &str {
        self.0.strip_suffix(ORG_ID_SUFFIX).unwrap_or(&self.0)
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Composite id of an item: org component plus item name.
///
/// The seller org of a listing is recovered by parsing this key, never by
/// fixed-offset slicing of the raw string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingKey {
    org: OrgId,
    name: String,
}

impl ListingKey {
    /// Build a key from its components.
    ///
    /// The org component must be non-empty and free of the separator so
    /// that `parse` can split unambiguously; the name must be non-empty.
    pub fn new(org: OrgId, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if org.as_str().is_empty() || org.as_str().contains(KEY_SEPARATOR) {
            return Err(Error::InvalidArgument(format!(
                "invalid org component in listing key: {:?}",
                org.as_str()
            )));
        }
        if name.is_empty() {
            return Err(Error::InvalidArgument("item name is empty".to_string()));
        }
        Ok(Self { org, name })
    }

    /// Parse an encoded key, splitting on the first separator.
    pub fn parse(raw: &str) -> Result<Self> {
        let (org, name) = raw.split_once(KEY_SEPARATOR).ok_or_else(|| {
            Error::InvalidArgument(format!("malformed listing key: {raw:?}"))
        })?;
        if org.is_empty() || name.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "malformed listing key: {raw:?}"
            )));
        }
        Ok(Self {
            org: OrgId::new(org),
            name: name.to_string(),
        })
    }

    /// Owning org component
    pub fn org(&self) -> &OrgId {
        &self.org
    }

    /// Item name component
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Encode as the storage key string
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.org, KEY_SEPARATOR, self.name)
    }
}

impl fmt::Display for ListingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.org, KEY_SEPARATOR, self.name)
    }
}

/// One balance record per organization
///
/// Created once (idempotently), mutated by credits and settlement, never
/// deleted. Invariant: `balance >= 0` in committed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Storage key: the org identifier
    #[serde(rename = "ID")]
    pub id: OrgId,

    /// Display name derived from the identifier
    #[serde(rename = "Org")]
    pub org: String,

    /// Current balance
    #[serde(rename = "Balance")]
    pub balance: i64,
}

impl Account {
    /// Fresh account with zero balance
    pub fn new(org: &OrgId) -> Self {
        Self {
            id: org.clone(),
            org: org.display_name().to_string(),
            balance: 0,
        }
    }
}

/// Inventory or listing record
///
/// The private pool and the public listing of an item share this shape and
/// the same composite id; the partition a record sits in decides which
/// pool it belongs to. Invariants: `count >= 0` in the private partition,
/// `count >= 1` while a public listing exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Encoded composite id (org + separator + name)
    #[serde(rename = "ID")]
    pub id: String,

    /// Item name
    #[serde(rename = "Name")]
    pub name: String,

    /// Owning org display name
    #[serde(rename = "Org")]
    pub org: String,

    /// Units in this pool
    #[serde(rename = "Count")]
    pub count: i64,

    /// Unit price
    #[serde(rename = "Price")]
    pub price: i64,
}

/// Domain event delivered fire-and-forget after a write set commits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketEvent {
    /// Unique event ID (UUIDv7 for time-ordering)
    pub event_id: Uuid,

    /// Event name (e.g. [`EVENT_ITEM_ADDED`])
    pub name: String,

    /// JSON payload, usually the record the event is about
    pub payload: serde_json::Value,

    /// Emission timestamp
    pub emitted_at: DateTime<Utc>,
}

impl MarketEvent {
    /// Build an event around a serializable payload
    pub fn new<T: Serialize>(name: &str, payload: &T) -> Result<Self> {
        Ok(Self {
            event_id: Uuid::now_v7(),
            name: name.to_string(),
            payload: serde_json::to_value(payload)?,
            emitted_at: Utc::now(),
        })
    }
}

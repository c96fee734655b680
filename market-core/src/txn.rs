//! Single-operation transaction staging
//!
//! Every public operation stages its read-modify-write work here and
//! commits once at the end; on any failure the staged writes are simply
//! dropped. This is what makes a purchase all-or-nothing: a failed seller
//! lookup aborts the operation before the buyer debit ever becomes
//! durable. Reads observe the transaction's own staged writes, so settling
//! a self-purchase nets out to zero.

use crate::{
    error::Result,
    storage::{LedgerStore, Partition, WriteOp, WriteSet},
    types::MarketEvent,
};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;

/// Read-your-writes overlay over the committed store state
pub struct Transaction<'a> {
    store: &'a dyn LedgerStore,
    /// `Some(bytes)` = staged put, `None` = staged delete
    staged: BTreeMap<(Partition, String), Option<Vec<u8>>>,
    events: Vec<MarketEvent>,
}

impl<'a> Transaction<'a> {
    /// Start a transaction against `store`
    pub fn new(store: &'a dyn LedgerStore) -> Self {
        Self {
            store,
            staged: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// Raw read: staged state first, committed state second
    pub fn get_raw(&self, partition: &Partition, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(staged) = self.staged.get(&(partition.clone(), key.to_string())) {
            return Ok(staged.clone());
        }
        self.store.get(partition, key)
    }

    /// Typed read of a JSON record
    pub fn get<T: DeserializeOwned>(&self, partition: &Partition, key: &str) -> Result<Option<T>> {
        match self.get_raw(partition, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Stage a typed put
    pub fn put<T: Serialize>(&mut self, partition: &Partition, key: &str, record: &T) -> Result<()> {
        let bytes = serde_json::to_vec(record)?;
        self.staged
            .insert((partition.clone(), key.to_string()), Some(bytes));
        Ok(())
    }

    /// Stage a delete
    pub fn delete(&mut self, partition: &Partition, key: &str) {
        self.staged.insert((partition.clone(), key.to_string()), None);
    }

    /// Buffer a domain event for delivery after commit
    pub fn emit(&mut self, event: MarketEvent) {
        self.events.push(event);
    }

    /// Ordered scan of `[start, end)` with staged writes folded in;
    /// empty bounds mean the whole partition
    pub fn range_scan(
        &self,
        partition: &Partition,
        start: &str,
        end: &str,
    ) -> Result<Vec<(String, Vec<u8>)>> {
        let mut merged: BTreeMap<String, Vec<u8>> = self
            .store
            .range_scan(partition, start, end)?
            .into_iter()
            .collect();

        for ((p, key), staged) in &self.staged {
            if p != partition {
                continue;
            }
            if !start.is_empty() && key.as_str() < start {
                continue;
            }
            if !end.is_empty() && key.as_str() >= end {
                continue;
            }
            match staged {
                Some(bytes) => {
                    merged.insert(key.clone(), bytes.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        Ok(merged.into_iter().collect())
    }

    /// Hand the staged write set to the store for atomic commit
    pub fn commit(self) -> Result<()> {
        let ops = self
            .staged
            .into_iter()
            .map(|((partition, key), staged)| match staged {
                Some(value) => WriteOp::Put {
                    partition,
                    key,
                    value,
                },
                None => WriteOp::Delete { partition, key },
            })
            .collect();

        self.store.commit(WriteSet {
            ops,
            events: self.events,
        })
    }
}

//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `public` - globally visible partition: account records (bare org-id
//!   keys) and market listings (composite keys) share one keyspace
//! - `private` - every org's private inventory; keys are prefixed with the
//!   owning org identifier and a NUL byte, so one org's partition is a
//!   contiguous, byte-ordered key range

use crate::{
    error::{Error, Result},
    types::{MarketEvent, OrgId},
    Config,
};
use parking_lot::RwLock;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB,
};
use std::sync::Arc;

/// Column family names
const CF_PUBLIC: &str = "public";
const CF_PRIVATE: &str = "private";

/// Byte separating the org prefix from the logical key in `private`.
/// Org identifiers are UTF-8 and never contain NUL.
const PRIVATE_PREFIX_SEP: u8 = 0;

/// Storage scope of a record
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Partition {
    /// Globally visible: accounts and market listings
    Public,
    /// Visible only to the owning org: unlisted inventory
    Private(OrgId),
}

/// One staged mutation
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Upsert a record
    Put {
        /// Target partition
        partition: Partition,
        /// Logical key within the partition
        key: String,
        /// Serialized record
        value: Vec<u8>,
    },
    /// Remove a record
    Delete {
        /// Target partition
        partition: Partition,
        /// Logical key within the partition
        key: String,
    },
}

/// Write set produced by one operation, committed all-or-nothing
#[derive(Debug, Default)]
pub struct WriteSet {
    /// Staged mutations, at most one per (partition, key)
    pub ops: Vec<WriteOp>,
    /// Events delivered only after the mutations are durable
    pub events: Vec<MarketEvent>,
}

/// Sink for domain events delivered after commit (fire-and-forget)
pub trait EventSink: Send + Sync {
    /// Receive one committed event
    fn publish(&self, event: &MarketEvent);
}

/// Default sink: one structured log line per event
pub struct LogSink;

impl EventSink for LogSink {
    fn publish(&self, event: &MarketEvent) {
        tracing::info!(
            event_id = %event.event_id,
            name = %event.name,
            payload = %event.payload,
            "market event"
        );
    }
}

/// Key-value ledger behind the transition engine
///
/// Single-key reads and scans observe committed state; all writes of one
/// operation arrive together through [`LedgerStore::commit`].
pub trait LedgerStore: Send + Sync {
    /// Point lookup; `None` when the key is absent
    fn get(&self, partition: &Partition, key: &str) -> Result<Option<Vec<u8>>>;

    /// Ordered scan of `[start, end)`; empty bounds mean the whole partition
    fn range_scan(
        &self,
        partition: &Partition,
        start: &str,
        end: &str,
    ) -> Result<Vec<(String, Vec<u8>)>>;

    /// Apply the whole write set atomically, then deliver its events
    fn commit(&self, writes: WriteSet) -> Result<()>;
}

/// RocksDB-backed store
pub struct RocksStore {
    db: Arc<DB>,
    sinks: RwLock<Vec<Box<dyn EventSink>>>,
}

impl RocksStore {
    /// Open or create the database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_PUBLIC, Self::cf_options_public()),
            ColumnFamilyDescriptor::new(CF_PRIVATE, Self::cf_options_private()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = %path.display(), "Opened RocksDB ledger store");

        Ok(Self {
            db: Arc::new(db),
            sinks: RwLock::new(vec![Box::new(LogSink)]),
        })
    }

    fn cf_options_public() -> Options {
        let mut opts = Options::default();
        // Accounts and listings are frequently read, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_private() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        // Point lookups by composite id benefit from bloom filters
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    /// Register an additional event sink
    pub fn register_sink(&self, sink: Box<dyn EventSink>) {
        self.sinks.write().push(sink);
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    fn cf_name(partition: &Partition) -> &'static str {
        match partition {
            Partition::Public => CF_PUBLIC,
            Partition::Private(_) => CF_PRIVATE,
        }
    }

    /// Prefix that scopes keys of `partition` within its column family
    fn partition_prefix(partition: &Partition) -> Vec<u8> {
        match partition {
            Partition::Public => Vec::new(),
            Partition::Private(org) => {
                let mut prefix = org.as_str().as_bytes().to_vec();
                prefix.push(PRIVATE_PREFIX_SEP);
                prefix
            }
        }
    }

    fn physical_key(partition: &Partition, key: &str) -> Vec<u8> {
        let mut physical = Self::partition_prefix(partition);
        physical.extend_from_slice(key.as_bytes());
        physical
    }
}

impl LedgerStore for RocksStore {
    fn get(&self, partition: &Partition, key: &str) -> Result<Option<Vec<u8>>> {
        let cf = self.cf_handle(Self::cf_name(partition))?;
        let value = self.db.get_cf(cf, Self::physical_key(partition, key))?;
        Ok(value)
    }

    fn range_scan(
        &self,
        partition: &Partition,
        start: &str,
        end: &str,
    ) -> Result<Vec<(String, Vec<u8>)>> {
        let cf = self.cf_handle(Self::cf_name(partition))?;
        let prefix = Self::partition_prefix(partition);
        let scan_start = Self::physical_key(partition, start);

        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&scan_start, Direction::Forward));

        let mut entries = Vec::new();
        for item in iter {
            let (key, value) = item?;

            // Past the end of this partition's key range
            if !key.starts_with(&prefix) {
                break;
            }

            let logical = std::str::from_utf8(&key[prefix.len()..])
                .map_err(|_| Error::Storage("non-UTF-8 key in ledger store".to_string()))?;

            if !end.is_empty() && logical >= end {
                break;
            }

            entries.push((logical.to_string(), value.to_vec()));
        }

        Ok(entries)
    }

    fn commit(&self, writes: WriteSet) -> Result<()> {
        let mut batch = WriteBatch::default();

        for op in &writes.ops {
            match op {
                WriteOp::Put {
                    partition,
                    key,
                    value,
                } => {
                    let cf = self.cf_handle(Self::cf_name(partition))?;
                    batch.put_cf(cf, Self::physical_key(partition, key), value);
                }
                WriteOp::Delete { partition, key } => {
                    let cf = self.cf_handle(Self::cf_name(partition))?;
                    batch.delete_cf(cf, Self::physical_key(partition, key));
                }
            }
        }

        // Atomic commit
        self.db.write(batch)?;

        tracing::debug!(
            ops = writes.ops.len(),
            events = writes.events.len(),
            "Write set committed"
        );

        // Events are delivered only once the writes are durable
        let sinks = self.sinks.read();
        for event in &writes.events {
            for sink in sinks.iter() {
                sink.publish(event);
            }
        }

        Ok(())
    }
}

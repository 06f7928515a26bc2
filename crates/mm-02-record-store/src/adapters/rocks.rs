//! # RocksDB Store Adapter
//!
//! Production implementation of the store port.
//!
//! ## Features
//!
//! - One column family per [`Table`]
//! - Atomic commits via `WriteBatch`
//! - Snappy compression, bloom filters, block cache
//! - Single writer enforced with a mutex held for the transaction lifetime
//!
//! Write transactions buffer their writes in an ordered overlay so reads
//! inside the transaction observe uncommitted state, then flush the overlay
//! into one `WriteBatch` on commit.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use parking_lot::{Mutex, MutexGuard};
use rocksdb::{ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::errors::StoreError;
use crate::ports::store::{ReadTransaction, RecordStore, Table, WriteTransaction};

/// RocksDB configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksDbConfig {
    /// Path to the database directory.
    pub path: String,
    /// Block cache size in bytes (default: 128MB).
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 32MB).
    pub write_buffer_size: usize,
    /// Enable fsync after each commit (default: true).
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: "./data/meshmarket".to_string(),
            block_cache_size: 128 * 1024 * 1024,
            write_buffer_size: 32 * 1024 * 1024,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Config for tests (small buffers, no fsync).
    pub fn for_testing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            sync_writes: false,
        }
    }
}

/// RocksDB-backed record store.
pub struct RocksDbStore {
    db: DB,
    config: RocksDbConfig,
    writer: Mutex<()>,
}

impl RocksDbStore {
    /// Open or create the database with all column families.
    pub fn open(config: RocksDbConfig) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = Table::ALL
            .iter()
            .map(|table| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(rocksdb::DBCompressionType::Snappy);
                ColumnFamilyDescriptor::new(table.name(), cf_opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&opts, &config.path, cf_descriptors).map_err(|e| {
            StoreError::Io {
                message: format!("failed to open rocksdb: {}", e),
            }
        })?;

        debug!(path = %config.path, "record store opened");

        Ok(Self {
            db,
            config,
            writer: Mutex::new(()),
        })
    }

    /// Open at a path with default settings.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open(RocksDbConfig {
            path: path.as_ref().to_string_lossy().to_string(),
            ..Default::default()
        })
    }

    fn cf(&self, table: Table) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db
            .cf_handle(table.name())
            .ok_or(StoreError::UnknownTable { name: table.name() })
    }

    fn db_get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.db
            .get_cf(self.cf(table)?, key)
            .map_err(|e| StoreError::Io {
                message: format!("rocksdb get failed: {}", e),
            })
    }

    fn db_scan(&self, table: Table, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let cf = self.cf(table)?;
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward));

        let mut results = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Io {
                message: format!("rocksdb scan failed: {}", e),
            })?;
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }
        Ok(results)
    }
}

impl RecordStore for RocksDbStore {
    fn begin_read(&self) -> Result<Box<dyn ReadTransaction + '_>, StoreError> {
        Ok(Box::new(RocksRead { store: self }))
    }

    fn begin_write(&self) -> Result<Box<dyn WriteTransaction + '_>, StoreError> {
        Ok(Box::new(RocksWrite {
            store: self,
            _writer: self.writer.lock(),
            overlay: HashMap::new(),
        }))
    }
}

struct RocksRead<'a> {
    store: &'a RocksDbStore,
}

impl ReadTransaction for RocksRead<'_> {
    fn get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.store.db_get(table, key)
    }

    fn scan_prefix(&self, table: Table, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        self.store.db_scan(table, prefix)
    }

    fn last_in_prefix(
        &self,
        table: Table,
        prefix: &[u8],
    ) -> Result<Option<(Vec<u8>, Vec<u8>)>, StoreError> {
        Ok(self.store.db_scan(table, prefix)?.pop())
    }
}

struct RocksWrite<'a> {
    store: &'a RocksDbStore,
    _writer: MutexGuard<'a, ()>,
    overlay: HashMap<Table, BTreeMap<Vec<u8>, Option<Vec<u8>>>>,
}

impl ReadTransaction for RocksWrite<'_> {
    fn get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(pending) = self.overlay.get(&table).and_then(|m| m.get(key)) {
            return Ok(pending.clone());
        }
        self.store.db_get(table, key)
    }

    fn scan_prefix(&self, table: Table, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let mut merged: BTreeMap<Vec<u8>, Option<Vec<u8>>> = self
            .store
            .db_scan(table, prefix)?
            .into_iter()
            .map(|(k, v)| (k, Some(v)))
            .collect();
        if let Some(pending) = self.overlay.get(&table) {
            for (k, v) in pending {
                if k.starts_with(prefix) {
                    merged.insert(k.clone(), v.clone());
                }
            }
        }
        Ok(merged
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k, v)))
            .collect())
    }

    fn last_in_prefix(
        &self,
        table: Table,
        prefix: &[u8],
    ) -> Result<Option<(Vec<u8>, Vec<u8>)>, StoreError> {
        Ok(self.scan_prefix(table, prefix)?.pop())
    }
}

impl WriteTransaction for RocksWrite<'_> {
    fn put(&mut self, table: Table, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.overlay
            .entry(table)
            .or_default()
            .insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, table: Table, key: &[u8]) -> Result<(), StoreError> {
        self.overlay
            .entry(table)
            .or_default()
            .insert(key.to_vec(), None);
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut batch = WriteBatch::default();
        for (table, pending) in &self.overlay {
            let cf = self.store.cf(*table)?;
            for (k, v) in pending {
                match v {
                    Some(value) => batch.put_cf(cf, k, value),
                    None => batch.delete_cf(cf, k),
                }
            }
        }

        let mut write_opts = rocksdb::WriteOptions::default();
        write_opts.set_sync(self.store.config.sync_writes);

        self.store
            .db
            .write_opt(batch, &write_opts)
            .map_err(|e| StoreError::Io {
                message: format!("rocksdb commit failed: {}", e),
            })
    }
}

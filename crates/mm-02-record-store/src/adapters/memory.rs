//! # In-Memory Store
//!
//! BTreeMap-backed implementation of the store port. Same transaction
//! semantics as the RocksDB adapter (buffered writes, atomic commit, single
//! writer) so tests exercise the real contract.

use std::collections::{BTreeMap, HashMap};

use parking_lot::{Mutex, MutexGuard};

use crate::domain::errors::StoreError;
use crate::ports::store::{ReadTransaction, RecordStore, Table, WriteTransaction};

type Tables = HashMap<Table, BTreeMap<Vec<u8>, Vec<u8>>>;

/// In-memory record store.
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let mut tables = HashMap::new();
        for table in Table::ALL {
            tables.insert(table, BTreeMap::new());
        }
        Self {
            tables: Mutex::new(tables),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    fn begin_read(&self) -> Result<Box<dyn ReadTransaction + '_>, StoreError> {
        Ok(Box::new(MemoryRead {
            guard: self.tables.lock(),
        }))
    }

    fn begin_write(&self) -> Result<Box<dyn WriteTransaction + '_>, StoreError> {
        // Holding the table lock for the transaction's lifetime is the
        // single-writer guarantee.
        Ok(Box::new(MemoryWrite {
            guard: self.tables.lock(),
            overlay: HashMap::new(),
        }))
    }
}

struct MemoryRead<'a> {
    guard: MutexGuard<'a, Tables>,
}

impl ReadTransaction for MemoryRead<'_> {
    fn get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(table_ref(&self.guard, table)?.get(key).cloned())
    }

    fn scan_prefix(&self, table: Table, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        Ok(scan_map(table_ref(&self.guard, table)?, prefix))
    }

    fn last_in_prefix(
        &self,
        table: Table,
        prefix: &[u8],
    ) -> Result<Option<(Vec<u8>, Vec<u8>)>, StoreError> {
        Ok(scan_map(table_ref(&self.guard, table)?, prefix).pop())
    }
}

/// Write transaction. Buffers writes in an overlay per table; `None` marks a
/// delete. Reads merge the overlay over the committed state.
struct MemoryWrite<'a> {
    guard: MutexGuard<'a, Tables>,
    overlay: HashMap<Table, BTreeMap<Vec<u8>, Option<Vec<u8>>>>,
}

impl ReadTransaction for MemoryWrite<'_> {
    fn get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(pending) = self.overlay.get(&table).and_then(|m| m.get(key)) {
            return Ok(pending.clone());
        }
        Ok(table_ref(&self.guard, table)?.get(key).cloned())
    }

    fn scan_prefix(&self, table: Table, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let mut merged: BTreeMap<Vec<u8>, Option<Vec<u8>>> =
            scan_map(table_ref(&self.guard, table)?, prefix)
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

impl WriteTransaction for MemoryWrite<'_> {
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

    fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        for (table, pending) in std::mem::take(&mut self.overlay) {
            let map = self
                .guard
                .get_mut(&table)
                .ok_or(StoreError::UnknownTable { name: table.name() })?;
            for (k, v) in pending {
                match v {
                    Some(value) => {
                        map.insert(k, value);
                    }
                    None => {
                        map.remove(&k);
                    }
                }
            }
        }
        Ok(())
    }
}

fn table_ref<'a>(tables: &'a Tables, table: Table) -> Result<&'a BTreeMap<Vec<u8>, Vec<u8>>, StoreError> {
    tables
        .get(&table)
        .ok_or(StoreError::UnknownTable { name: table.name() })
}

fn scan_map(map: &BTreeMap<Vec<u8>, Vec<u8>>, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
    map.range(prefix.to_vec()..)
        .take_while(|(k, _)| k.starts_with(prefix))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::keys;

    #[test]
    fn test_put_get_commit() {
        let store = MemoryStore::new();
        {
            let mut txn = store.begin_write().unwrap();
            txn.put(Table::Members, b"k1", b"v1").unwrap();
            // Read-your-writes before commit.
            assert_eq!(txn.get(Table::Members, b"k1").unwrap(), Some(b"v1".to_vec()));
            txn.commit().unwrap();
        }
        let read = store.begin_read().unwrap();
        assert_eq!(read.get(Table::Members, b"k1").unwrap(), Some(b"v1".to_vec()));
    }

    #[test]
    fn test_dropped_transaction_discards_writes() {
        let store = MemoryStore::new();
        {
            let mut txn = store.begin_write().unwrap();
            txn.put(Table::Members, b"k1", b"v1").unwrap();
            // No commit.
        }
        let read = store.begin_read().unwrap();
        assert_eq!(read.get(Table::Members, b"k1").unwrap(), None);
    }

    #[test]
    fn test_delete_within_transaction() {
        let store = MemoryStore::new();
        {
            let mut txn = store.begin_write().unwrap();
            txn.put(Table::Accounts, b"a", b"1").unwrap();
            txn.commit().unwrap();
        }
        {
            let mut txn = store.begin_write().unwrap();
            txn.delete(Table::Accounts, b"a").unwrap();
            assert_eq!(txn.get(Table::Accounts, b"a").unwrap(), None);
            txn.commit().unwrap();
        }
        let read = store.begin_read().unwrap();
        assert!(!read.exists(Table::Accounts, b"a").unwrap());
    }

    #[test]
    fn test_last_in_prefix_is_checkpoint() {
        let store = MemoryStore::new();
        {
            let mut txn = store.begin_write().unwrap();
            for n in [1u64, 5, 3, 200] {
                txn.put(Table::Blocks, &keys::block_key("main", n), &n.to_be_bytes())
                    .unwrap();
            }
            // Another namespace must not leak into the scan.
            txn.put(Table::Blocks, &keys::block_key("other", 999), b"x")
                .unwrap();
            txn.commit().unwrap();
        }
        let read = store.begin_read().unwrap();
        let (key, _) = read
            .last_in_prefix(Table::Blocks, &keys::block_prefix("main"))
            .unwrap()
            .unwrap();
        assert_eq!(keys::block_number_from_key(&key), Some(200));
    }

    #[test]
    fn test_scan_prefix_merges_overlay() {
        let store = MemoryStore::new();
        {
            let mut txn = store.begin_write().unwrap();
            txn.put(Table::Blocks, &keys::block_key("m", 1), b"a").unwrap();
            txn.put(Table::Blocks, &keys::block_key("m", 2), b"b").unwrap();
            txn.commit().unwrap();
        }
        let mut txn = store.begin_write().unwrap();
        txn.put(Table::Blocks, &keys::block_key("m", 3), b"c").unwrap();
        txn.delete(Table::Blocks, &keys::block_key("m", 1)).unwrap();
        let entries = txn
            .scan_prefix(Table::Blocks, &keys::block_prefix("m"))
            .unwrap();
        let numbers: Vec<u64> = entries
            .iter()
            .filter_map(|(k, _)| keys::block_number_from_key(k))
            .collect();
        assert_eq!(numbers, vec![2, 3]);
    }
}

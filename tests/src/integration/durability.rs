//! # Checkpoint Durability
//!
//! The scanner's checkpoint is nothing but the highest block key in its
//! namespace, so recovery after a restart is a prefix scan over the
//! reopened database. These tests run the scanner against RocksDB and
//! restart it mid-chain.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use primitive_types::U256;
    use tempfile::TempDir;

    use mm_02_record_store::{keys, ReadTransaction, RecordStore, RocksDbConfig, RocksDbStore, Table};
    use mm_03_ledger_client::domain::events::encode::{self, LogMeta};
    use mm_03_ledger_client::MockLedger;
    use mm_04_chain_sync::{ChainScanner, EventRegistry, ScannerConfig};

    fn open(dir: &TempDir) -> Arc<RocksDbStore> {
        crate::init_tracing();
        let config = RocksDbConfig::for_testing(dir.path().to_string_lossy().to_string());
        Arc::new(RocksDbStore::open(config).unwrap())
    }

    fn scanner(ledger: &MockLedger, store: &Arc<RocksDbStore>) -> ChainScanner {
        ChainScanner::new(
            Arc::new(ledger.clone()),
            Arc::clone(store) as Arc<dyn RecordStore>,
            Arc::new(EventRegistry::standard()),
            ScannerConfig::for_testing("main"),
        )
    }

    fn meta(tx: u8) -> LogMeta {
        LogMeta {
            address: [0xaa; 20],
            block_number: 0,
            block_hash: [0u8; 32],
            tx_hash: [tx; 32],
            log_index: 0,
        }
    }

    #[tokio::test]
    async fn test_checkpoint_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let ledger = MockLedger::new();
        ledger.push_block(vec![]);
        ledger.push_block(vec![encode::transfer(
            meta(0x11),
            &[1u8; 20],
            &[2u8; 20],
            U256::from(7),
        )]);

        {
            let store = open(&dir);
            scanner(&ledger, &store).scan_available().await.unwrap();
            assert_eq!(
                ChainScanner::checkpoint(store.as_ref(), "main").unwrap(),
                Some(2)
            );
        }

        // Restart: the chain grew while we were down.
        ledger.push_block(vec![]);
        let store = open(&dir);
        assert_eq!(
            ChainScanner::checkpoint(store.as_ref(), "main").unwrap(),
            Some(2)
        );

        scanner(&ledger, &store).scan_available().await.unwrap();
        assert_eq!(
            ChainScanner::checkpoint(store.as_ref(), "main").unwrap(),
            Some(3)
        );

        // The pre-restart projection is still there.
        let read = store.begin_read().unwrap();
        assert!(read
            .get(Table::TokenTransfers, &keys::tx_key(&[0x11; 32]))
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_restart_does_not_reapply_events() {
        let dir = TempDir::new().unwrap();
        let ledger = MockLedger::new();
        ledger.push_block(vec![encode::member_registered(
            meta(0x21),
            &[7u8; 20],
            10,
            "h1:eula",
            "",
            1,
        )]);

        {
            let store = open(&dir);
            scanner(&ledger, &store).scan_available().await.unwrap();
        }

        let store = open(&dir);
        let s = scanner(&ledger, &store);
        s.scan_available().await.unwrap();

        // The fresh scanner instance saw nothing to do.
        assert_eq!(s.status().blocks_scanned, 0);
        assert_eq!(s.status().events_applied, 0);
    }

    #[tokio::test]
    async fn test_halted_block_resumes_after_reopen() {
        let dir = TempDir::new().unwrap();
        let ledger = MockLedger::new();
        ledger.push_block(vec![]);
        ledger.push_block(vec![]);
        ledger.fail_logs_at(2, 1);

        {
            let store = open(&dir);
            // The failing block halts the pass; checkpoint stays at 1.
            assert!(scanner(&ledger, &store).scan_available().await.is_err());
            assert_eq!(
                ChainScanner::checkpoint(store.as_ref(), "main").unwrap(),
                Some(1)
            );
        }

        // After the restart the transient failure is gone and the scanner
        // picks up exactly where it stopped.
        let store = open(&dir);
        scanner(&ledger, &store).scan_available().await.unwrap();
        assert_eq!(
            ChainScanner::checkpoint(store.as_ref(), "main").unwrap(),
            Some(2)
        );
    }
}

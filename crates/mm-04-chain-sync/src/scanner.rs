//! # Chain Scanner
//!
//! The block-by-block synchronizer. Each instance owns one checkpoint
//! namespace and one contract-address filter; instances never share a
//! checkpoint. The loop:
//!
//! 1. Recover the checkpoint (highest block key in the namespace).
//! 2. Ask the ledger for its head.
//! 3. For every missing block, strictly ascending: fetch that block's logs,
//!    decode, dispatch through the registry, and commit the BlockRecord plus
//!    all projected records in ONE transaction. The checkpoint advances only
//!    when the whole block committed.
//! 4. Sleep until the poll interval elapses, a scan is triggered, or
//!    shutdown is requested.
//!
//! A block that fails is retried from the same checkpoint on the next pass
//! when `halt_on_failed_block` is set (the default). With it cleared the
//! scanner logs the failure, records the block with whatever applied before
//! the error, and moves on; re-scans cannot repair a block skipped this way,
//! so that mode trades completeness for liveness.

use std::sync::Arc;
use std::time::Duration;

use mm_02_record_store::{
    encode_record, keys, BlockRecord, ReadTransaction, RecordStore, Table, WriteTransaction,
};
use mm_03_ledger_client::{decode_log, LedgerRpc, Log, LogFilter};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared_types::Address;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::errors::SyncError;
use crate::registry::{Applied, EventRegistry};

/// Scanner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Checkpoint namespace. Every scanner instance needs its own.
    pub namespace: String,
    /// Contract addresses to include in log filters; empty means all.
    pub contracts: Vec<Address>,
    /// First block to scan when the namespace has no checkpoint yet.
    pub start_block: u64,
    /// Idle time between polls of the ledger head.
    pub poll_interval: Duration,
    /// Retry a failed block from the same checkpoint instead of skipping
    /// past it.
    pub halt_on_failed_block: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            namespace: "main".to_string(),
            contracts: Vec::new(),
            start_block: 1,
            poll_interval: Duration::from_secs(5),
            halt_on_failed_block: true,
        }
    }
}

impl ScannerConfig {
    /// Tight polling for tests.
    pub fn for_testing(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            contracts: Vec::new(),
            start_block: 1,
            poll_interval: Duration::from_millis(10),
            halt_on_failed_block: true,
        }
    }
}

/// Progress counters, shared with the handle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannerStatus {
    /// Last block fully applied, if any.
    pub checkpoint: Option<u64>,
    /// Ledger head at the last poll.
    pub head: u64,
    /// Blocks committed since start.
    pub blocks_scanned: u64,
    /// Events inserted since start (duplicates not counted).
    pub events_applied: u64,
    /// Most recent scan error, cleared by the next successful block.
    pub last_error: Option<String>,
}

/// What one committed block pass produced.
struct BlockOutcome {
    /// Events inserted (duplicates excluded).
    applied: u64,
    /// Skip mode only: the error that cut the block short. The events
    /// counted in `applied` stayed committed.
    failure: Option<SyncError>,
}

/// One scanner instance.
pub struct ChainScanner {
    rpc: Arc<dyn LedgerRpc>,
    store: Arc<dyn RecordStore>,
    registry: Arc<EventRegistry>,
    config: ScannerConfig,
    status: Arc<Mutex<ScannerStatus>>,
}

/// Control handle for a spawned scanner.
pub struct ScannerHandle {
    shutdown: watch::Sender<bool>,
    trigger: Arc<Notify>,
    status: Arc<Mutex<ScannerStatus>>,
    join: JoinHandle<()>,
}

impl ScannerHandle {
    /// Wake the scan loop immediately instead of waiting out the poll
    /// interval.
    pub fn trigger_scan(&self) {
        self.trigger.notify_one();
    }

    pub fn status(&self) -> ScannerStatus {
        self.status.lock().clone()
    }

    /// Request shutdown and wait for the loop to finish its current block.
    pub async fn stop(self) {
        // Receivers gone means the loop already exited.
        let _ = self.shutdown.send(true);
        if let Err(e) = self.join.await {
            error!(error = %e, "scanner task panicked");
        }
    }
}

impl ChainScanner {
    pub fn new(
        rpc: Arc<dyn LedgerRpc>,
        store: Arc<dyn RecordStore>,
        registry: Arc<EventRegistry>,
        config: ScannerConfig,
    ) -> Self {
        Self {
            rpc,
            store,
            registry,
            config,
            status: Arc::new(Mutex::new(ScannerStatus::default())),
        }
    }

    pub fn status(&self) -> ScannerStatus {
        self.status.lock().clone()
    }

    /// Spawn the scan loop onto the runtime.
    pub fn spawn(self) -> ScannerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let trigger = Arc::new(Notify::new());
        let trigger_loop = Arc::clone(&trigger);
        let status = Arc::clone(&self.status);

        info!(namespace = %self.config.namespace, "scanner starting");

        let join = tokio::spawn(async move {
            loop {
                if let Err(e) = self.scan_available().await {
                    warn!(namespace = %self.config.namespace, error = %e, "scan pass failed");
                    self.status.lock().last_error = Some(e.to_string());
                }

                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = trigger_loop.notified() => {}
                    _ = tokio::time::sleep(self.config.poll_interval) => {}
                }
            }
            info!(namespace = %self.config.namespace, "scanner stopped");
        });

        ScannerHandle {
            shutdown: shutdown_tx,
            trigger,
            status,
            join,
        }
    }

    /// Recover the checkpoint for a namespace.
    pub fn checkpoint(
        store: &dyn RecordStore,
        namespace: &str,
    ) -> Result<Option<u64>, SyncError> {
        let read = store.begin_read()?;
        let last = read.last_in_prefix(Table::Blocks, &keys::block_prefix(namespace))?;
        Ok(last.and_then(|(key, _)| keys::block_number_from_key(&key)))
    }

    /// One scan pass: apply every block between the checkpoint and the
    /// current head.
    pub async fn scan_available(&self) -> Result<(), SyncError> {
        let head = self.rpc.block_number().await?;
        self.status.lock().head = head;

        let checkpoint = Self::checkpoint(self.store.as_ref(), &self.config.namespace)?;
        let mut next = checkpoint.map(|n| n + 1).unwrap_or(self.config.start_block);

        while next <= head {
            match self.process_block(next).await {
                Ok(outcome) => {
                    let mut status = self.status.lock();
                    status.checkpoint = Some(next);
                    status.blocks_scanned += 1;
                    status.events_applied += outcome.applied;
                    status.last_error = outcome.failure.map(|e| e.to_string());
                }
                Err(e) if self.config.halt_on_failed_block => {
                    // Checkpoint untouched; this block is retried next pass.
                    self.status.lock().last_error = Some(e.to_string());
                    return Err(e);
                }
                Err(e) => {
                    // The block itself was unavailable (header or logs), so
                    // nothing was decoded and the skipped record carries a
                    // zero count.
                    warn!(
                        namespace = %self.config.namespace,
                        block = next,
                        error = %e,
                        "skipping failed block"
                    );
                    self.record_skipped_block(next).await?;
                    let mut status = self.status.lock();
                    status.checkpoint = Some(next);
                    status.blocks_scanned += 1;
                    status.last_error = Some(e.to_string());
                }
            }
            next += 1;
        }
        Ok(())
    }

    /// Apply one block: fetch logs, project events, commit the BlockRecord
    /// and all projections atomically. In halt mode an event failure aborts
    /// the whole block (nothing commits); in skip mode the events applied
    /// before the failing one commit together with a BlockRecord counting
    /// exactly them, and the failure is reported in the outcome.
    async fn process_block(&self, number: u64) -> Result<BlockOutcome, SyncError> {
        let header = self
            .rpc
            .block_header(number)
            .await?
            .ok_or(SyncError::Ledger(
                mm_03_ledger_client::LedgerError::BlockNotFound { number },
            ))?;

        let filter = LogFilter::for_block(number, self.config.contracts.clone());
        let logs = self.rpc.get_logs(&filter).await?;

        let mut txn = self.store.begin_write()?;
        let mut applied = 0u64;
        let mut failure = None;

        for log in &logs {
            match self.apply_log(number, log, txn.as_mut()) {
                Ok(true) => applied += 1,
                Ok(false) => {}
                Err(e) if self.config.halt_on_failed_block => return Err(e),
                Err(e) => {
                    // Keep what already applied, drop the rest of the
                    // block. A re-scan cannot repair it.
                    warn!(
                        namespace = %self.config.namespace,
                        block = number,
                        error = %e,
                        "event failed mid-block; keeping earlier events, skipping the rest"
                    );
                    failure = Some(e);
                    break;
                }
            }
        }

        let record = BlockRecord {
            number,
            timestamp: header.timestamp,
            cnt_events: applied as u32,
        };
        txn.put(
            Table::Blocks,
            &keys::block_key(&self.config.namespace, number),
            &encode_record(&record)?,
        )?;
        txn.commit()?;

        if applied > 0 {
            info!(
                namespace = %self.config.namespace,
                block = number,
                events = applied,
                "block applied"
            );
        }
        Ok(BlockOutcome { applied, failure })
    }

    /// Decode and dispatch one log. `Ok(true)` means a new record was
    /// inserted.
    fn apply_log(
        &self,
        number: u64,
        log: &Log,
        txn: &mut dyn WriteTransaction,
    ) -> Result<bool, SyncError> {
        let Some(event) = decode_log(log)? else {
            return Ok(false);
        };
        debug!(
            namespace = %self.config.namespace,
            block = number,
            event = event.name(),
            "applying event"
        );
        Ok(self.registry.apply(&event, log, txn)? == Applied::Inserted)
    }

    /// Advance the checkpoint over a block that could not be applied
    /// (skip mode only).
    async fn record_skipped_block(&self, number: u64) -> Result<(), SyncError> {
        let timestamp = self
            .rpc
            .block_header(number)
            .await
            .ok()
            .flatten()
            .map(|h| h.timestamp)
            .unwrap_or(0);
        let record = BlockRecord {
            number,
            timestamp,
            cnt_events: 0,
        };
        let mut txn = self.store.begin_write()?;
        txn.put(
            Table::Blocks,
            &keys::block_key(&self.config.namespace, number),
            &encode_record(&record)?,
        )?;
        txn.commit()?;
        Ok(())
    }
}

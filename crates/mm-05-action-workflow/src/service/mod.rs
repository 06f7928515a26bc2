//! # Action Workflow Service
//!
//! The two-phase orchestrator. `create_*` authenticates the caller's typed
//! signature, captures an immutable payload under a fresh oid, and sends a
//! one-time code over the out-of-band channel. `verify_*` checks the code,
//! applies the local side effects and the status transition in one store
//! transaction, and only then performs the ledger write.
//!
//! Every public call holds a minimum wall-clock floor across all branches,
//! so response timing does not reveal which usernames, emails or wallets
//! exist.

mod catalog;
mod market;
mod member;

use std::sync::Arc;
use std::time::Duration;

use mm_01_signature_verification::SignatureVerifier;
use mm_02_record_store::{
    decode_record, encode_record, keys, Account, ActionKind, ActionStatus, ReadTransaction,
    RecordStore, Table, VerificationAction, WriteTransaction,
};
use mm_03_ledger_client::ContractCall;
use shared_types::{now_ns, Address, Oid, Timestamp, TxHash};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::codes::generate_activation_code;
use crate::config::WorkflowConfig;
use crate::errors::{map_revert, WorkflowError};
use crate::ports::{ChainWriter, NotificationGateway};

/// The verified action workflow.
pub struct ActionWorkflow<G: NotificationGateway, W: ChainWriter> {
    store: Arc<dyn RecordStore>,
    verifier: SignatureVerifier,
    gateway: G,
    writer: W,
    config: WorkflowConfig,
}

impl<G: NotificationGateway, W: ChainWriter> ActionWorkflow<G, W> {
    pub fn new(store: Arc<dyn RecordStore>, gateway: G, writer: W, config: WorkflowConfig) -> Self {
        Self {
            store,
            verifier: SignatureVerifier,
            gateway,
            writer,
            config,
        }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Shared plumbing
    // ------------------------------------------------------------------

    /// Sleep out the remainder of the per-call floor.
    pub(crate) async fn hold_floor(&self, started: Instant) {
        let floor = Duration::from_millis(self.config.min_call_ms);
        let elapsed = started.elapsed();
        if elapsed < floor {
            tokio::time::sleep(floor - elapsed).await;
        }
    }

    pub(crate) fn verifier(&self) -> &SignatureVerifier {
        &self.verifier
    }

    pub(crate) fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub(crate) fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Persist a fresh pending action and deliver its code. Returns the oid
    /// and creation timestamp.
    pub(crate) async fn persist_action(
        &self,
        kind: ActionKind,
        payload: Vec<u8>,
        notify_email: &str,
    ) -> Result<(Oid, Timestamp), WorkflowError> {
        let oid = Uuid::new_v4();
        let code = generate_activation_code();
        let created = now_ns();
        let action = VerificationAction {
            oid,
            kind,
            status: ActionStatus::Pending,
            code: code.clone(),
            created,
            payload,
        };

        let mut txn = self.store.begin_write()?;
        txn.put(Table::Actions, &keys::oid_key(&oid), &encode_record(&action)?)?;
        txn.commit()?;

        debug!(kind = kind.as_str(), oid = %oid, "verification action created");
        if let Err(e) = self
            .gateway
            .send_verification(notify_email, kind, &oid, &code)
            .await
        {
            // An undelivered code can never be typed back, so the pending
            // record would only linger until the TTL. Discard it.
            warn!(
                kind = kind.as_str(),
                oid = %oid,
                error = %e,
                "code delivery failed; discarding pending action"
            );
            let mut txn = self.store.begin_write()?;
            txn.delete(Table::Actions, &keys::oid_key(&oid))?;
            txn.commit()?;
            return Err(e);
        }
        Ok((oid, created))
    }

    /// Load a pending action of the expected kind. A missing oid and a kind
    /// mismatch are indistinguishable to the caller.
    pub(crate) fn load_pending<R: ReadTransaction + ?Sized>(
        &self,
        txn: &R,
        oid: &Oid,
        kind: ActionKind,
    ) -> Result<VerificationAction, WorkflowError> {
        let bytes = txn
            .get(Table::Actions, &keys::oid_key(oid))?
            .ok_or(WorkflowError::NoSuchAction)?;
        let action: VerificationAction = decode_record(&bytes)?;
        if action.kind != kind {
            return Err(WorkflowError::NoSuchAction);
        }
        if action.status != ActionStatus::Pending {
            return Err(WorkflowError::AlreadyProcessed);
        }
        Ok(action)
    }

    /// Expiry then exact-match code check. A wrong code leaves the action
    /// pending for another attempt.
    pub(crate) fn check_code(
        &self,
        action: &VerificationAction,
        code: &str,
    ) -> Result<(), WorkflowError> {
        // A ttl of zero disables expiry.
        let ttl_ns = self.config.action_ttl_secs.saturating_mul(1_000_000_000);
        if ttl_ns > 0 && now_ns().saturating_sub(action.created) > ttl_ns {
            return Err(WorkflowError::Expired);
        }
        if action.code != code {
            return Err(WorkflowError::InvalidActivationCode);
        }
        Ok(())
    }

    /// Move an action to a new status in its own transaction.
    pub(crate) fn mark_action(
        &self,
        action: &VerificationAction,
        to: ActionStatus,
    ) -> Result<(), WorkflowError> {
        let mut updated = action.clone();
        updated.status = action.status.transition(to)?;
        let mut txn = self.store.begin_write()?;
        txn.put(
            Table::Actions,
            &keys::oid_key(&action.oid),
            &encode_record(&updated)?,
        )?;
        txn.commit()?;
        Ok(())
    }

    /// Submit the ledger write for a verified action and record the
    /// outcome. The local Verified state is never rolled back on a ledger
    /// rejection; that asymmetry is deliberate and logged.
    pub(crate) async fn submit_and_mark(
        &self,
        action: &VerificationAction,
        call: &ContractCall,
    ) -> Result<TxHash, WorkflowError> {
        match self.writer.submit(call).await {
            Ok(tx_hash) => {
                self.mark_action(action, ActionStatus::Submitted)?;
                info!(
                    kind = action.kind.as_str(),
                    oid = %action.oid,
                    "action submitted to ledger"
                );
                Ok(tx_hash)
            }
            Err(e) => {
                warn!(
                    kind = action.kind.as_str(),
                    oid = %action.oid,
                    error = %e,
                    "ledger rejected action; local state stays verified"
                );
                self.mark_action(action, ActionStatus::Failed)?;
                Err(map_revert(e))
            }
        }
    }

    // ------------------------------------------------------------------
    // Account lookups
    // ------------------------------------------------------------------

    pub(crate) fn account_by_oid<R: ReadTransaction + ?Sized>(
        &self,
        txn: &R,
        oid: &Oid,
    ) -> Result<Option<Account>, WorkflowError> {
        match txn.get(Table::Accounts, &keys::oid_key(oid))? {
            Some(bytes) => Ok(Some(decode_record(&bytes)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn account_by_wallet<R: ReadTransaction + ?Sized>(
        &self,
        txn: &R,
        wallet: &Address,
    ) -> Result<Option<Account>, WorkflowError> {
        let Some(oid_bytes) = txn.get(Table::IdxWallets, &keys::address_key(wallet))? else {
            return Ok(None);
        };
        let oid = Uuid::from_slice(&oid_bytes).map_err(|_| WorkflowError::InvalidRequest {
            message: "corrupt wallet index entry".to_string(),
        })?;
        self.account_by_oid(txn, &oid)
    }

    pub(crate) fn account_by_email<R: ReadTransaction + ?Sized>(
        &self,
        txn: &R,
        email: &str,
    ) -> Result<Option<Account>, WorkflowError> {
        let Some(oid_bytes) = txn.get(Table::IdxEmails, &keys::string_index_key(email))? else {
            return Ok(None);
        };
        let oid = Uuid::from_slice(&oid_bytes).map_err(|_| WorkflowError::InvalidRequest {
            message: "corrupt email index entry".to_string(),
        })?;
        self.account_by_oid(txn, &oid)
    }

    pub(crate) fn username_taken<R: ReadTransaction + ?Sized>(
        &self,
        txn: &R,
        username: &str,
    ) -> Result<bool, WorkflowError> {
        Ok(txn.exists(Table::IdxUsernames, &keys::string_index_key(username))?)
    }
}

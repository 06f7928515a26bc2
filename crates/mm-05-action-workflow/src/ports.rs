//! # Workflow Ports
//!
//! The out-of-band notification channel and the ledger write seam. The
//! mail sink is not test-gated: development deployments run with it and
//! read codes from the log.

use async_trait::async_trait;
use mm_02_record_store::ActionKind;
use mm_03_ledger_client::{ContractCall, LedgerError, LedgerRpc, TransactionSubmitter};
use parking_lot::Mutex;
use shared_types::{Oid, TxHash};
use std::sync::Arc;
use tracing::info;

use crate::errors::WorkflowError;

/// Out-of-band confirmation channel (email in production).
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// Deliver the one-time code for a pending action.
    async fn send_verification(
        &self,
        email: &str,
        kind: ActionKind,
        oid: &Oid,
        code: &str,
    ) -> Result<(), WorkflowError>;

    /// Tell an address that a login was attempted with a wallet we do not
    /// know. Sent instead of a code, so the caller cannot tell the
    /// difference.
    async fn send_login_denied(&self, email: &str) -> Result<(), WorkflowError>;
}

/// The ledger write seam. One submission attempt per call.
#[async_trait]
pub trait ChainWriter: Send + Sync {
    async fn submit(&self, call: &ContractCall) -> Result<TxHash, LedgerError>;
}

#[async_trait]
impl<R: LedgerRpc> ChainWriter for TransactionSubmitter<R> {
    async fn submit(&self, call: &ContractCall) -> Result<TxHash, LedgerError> {
        TransactionSubmitter::submit(self, call).await
    }
}

/// One captured notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentMail {
    Verification {
        email: String,
        kind: ActionKind,
        oid: Oid,
        code: String,
    },
    LoginDenied {
        email: String,
    },
}

/// Gateway that logs instead of sending. Tests read the captured codes;
/// development deployments grep the log.
#[derive(Clone, Default)]
pub struct TestMailSink {
    sent: Arc<Mutex<Vec<SentMail>>>,
    fail_sends: Arc<Mutex<u32>>,
}

impl TestMailSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().clone()
    }

    /// Make the next `times` deliveries fail.
    pub fn fail_sends(&self, times: u32) {
        *self.fail_sends.lock() = times;
    }

    fn take_failure(&self) -> Result<(), WorkflowError> {
        let mut remaining = self.fail_sends.lock();
        if *remaining > 0 {
            *remaining -= 1;
            return Err(WorkflowError::NotificationFailed {
                message: "mail sink scripted to fail".to_string(),
            });
        }
        Ok(())
    }

    /// The code of the most recent verification mail to `email`.
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent.lock().iter().rev().find_map(|mail| match mail {
            SentMail::Verification {
                email: to, code, ..
            } if to == email => Some(code.clone()),
            _ => None,
        })
    }
}

#[async_trait]
impl NotificationGateway for TestMailSink {
    async fn send_verification(
        &self,
        email: &str,
        kind: ActionKind,
        oid: &Oid,
        code: &str,
    ) -> Result<(), WorkflowError> {
        self.take_failure()?;
        info!(
            email,
            kind = kind.as_str(),
            oid = %oid,
            code,
            "verification mail (sink)"
        );
        self.sent.lock().push(SentMail::Verification {
            email: email.to_string(),
            kind,
            oid: *oid,
            code: code.to_string(),
        });
        Ok(())
    }

    async fn send_login_denied(&self, email: &str) -> Result<(), WorkflowError> {
        self.take_failure()?;
        info!(email, "login denied mail (sink)");
        self.sent.lock().push(SentMail::LoginDenied {
            email: email.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_sink_captures_codes() {
        let sink = TestMailSink::new();
        let oid = Uuid::new_v4();
        sink.send_verification("a@x.io", ActionKind::OnboardMember, &oid, "AAAA-BBBB-CCCC-DDDD")
            .await
            .unwrap();
        sink.send_verification("a@x.io", ActionKind::LoginMember, &oid, "EEEE-FFFF-GGGG-HHHH")
            .await
            .unwrap();

        assert_eq!(sink.sent().len(), 2);
        assert_eq!(
            sink.last_code_for("a@x.io").as_deref(),
            Some("EEEE-FFFF-GGGG-HHHH")
        );
        assert_eq!(sink.last_code_for("b@x.io"), None);
    }
}

//! # Member Flows
//!
//! Onboarding and login. Onboarding with an already-known wallet or email
//! silently becomes a login submission with the same result shape; login
//! with an unknown wallet sends a denial mail and returns a throwaway oid,
//! again with the same shape. Neither branch is distinguishable from
//! success by the caller.

use mm_01_signature_verification::{MemberLogin, MemberRegister};
use mm_02_record_store::{
    encode_record, keys, Account, ActionKind, ActionStatus, Table, UserKey, WriteTransaction,
};
use mm_03_ledger_client::register_member_for;
use shared_types::{now_ns, Oid};
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::codes::alternative_username;
use crate::errors::WorkflowError;
use crate::payloads::{
    CreateActionResult, LoginMemberRequest, LoginPayload, LoginVerified, OnboardMemberRequest,
    OnboardPayload, OnboardVerified,
};
use crate::ports::{ChainWriter, NotificationGateway};

use super::ActionWorkflow;

impl<G: NotificationGateway, W: ChainWriter> ActionWorkflow<G, W> {
    // ------------------------------------------------------------------
    // Onboard
    // ------------------------------------------------------------------

    pub async fn create_onboard_member(
        &self,
        req: OnboardMemberRequest,
    ) -> Result<CreateActionResult, WorkflowError> {
        let started = Instant::now();
        let result = self.create_onboard_member_inner(req).await;
        self.hold_floor(started).await;
        result
    }

    async fn create_onboard_member_inner(
        &self,
        req: OnboardMemberRequest,
    ) -> Result<CreateActionResult, WorkflowError> {
        validate_username(&req.username)?;
        validate_email(&req.email)?;
        if shared_types::WalletType::from_u8(req.wallet_type).is_none() {
            return Err(WorkflowError::InvalidRequest {
                message: format!("unknown wallet type {}", req.wallet_type),
            });
        }
        if req.eula.is_empty() {
            return Err(WorkflowError::InvalidRequest {
                message: "eula hash must not be empty".to_string(),
            });
        }

        let action = MemberRegister {
            chain_id: self.config().chain_id,
            verifying_contract: self.config().verifying_contract,
            member: req.member,
            registered: req.registered,
            eula: req.eula.clone(),
            profile: req.profile.clone(),
        };
        self.verifier().verify(&action, &req.member, &req.signature)?;

        let (wallet_account, email_account) = {
            let read = self.store().begin_read()?;
            (
                self.account_by_wallet(read.as_ref(), &req.member)?,
                self.account_by_email(read.as_ref(), &req.email)?,
            )
        };
        // A wallet that already has an account is not an error: the caller
        // proved control of it, so the call degrades into a login submission.
        if let Some(account) = wallet_account {
            info!(oid = %account.oid, "onboard for known wallet, falling back to login");
            return self
                .submit_login_action(&account, req.client_pubkey)
                .await;
        }
        // An email bound to a different wallet gets its owner warned; the
        // caller sees the same shape as a genuine login submission.
        if let Some(account) = email_account {
            info!(oid = %account.oid, "onboard email bound to another wallet");
            self.gateway().send_login_denied(&account.email).await?;
            return Ok(CreateActionResult {
                action: "login_member",
                vaction_oid: Uuid::new_v4(),
                timestamp: now_ns(),
            });
        }

        let username_collision = {
            let read = self.store().begin_read()?;
            self.username_taken(read.as_ref(), &req.username)?
        };
        if username_collision {
            return Err(WorkflowError::UsernameExists {
                alternative: alternative_username(&req.username),
                username: req.username,
            });
        }

        let payload = OnboardPayload {
            username: req.username,
            email: req.email.clone(),
            member: req.member,
            wallet_type: req.wallet_type,
            registered: req.registered,
            eula: req.eula,
            profile: req.profile,
            client_pubkey: req.client_pubkey,
            signature: req.signature.as_bytes().to_vec(),
        };
        let (oid, timestamp) = self
            .persist_action(ActionKind::OnboardMember, encode_record(&payload)?, &req.email)
            .await?;
        Ok(CreateActionResult {
            action: "onboard_member",
            vaction_oid: oid,
            timestamp,
        })
    }

    pub async fn verify_onboard_member(
        &self,
        oid: &Oid,
        code: &str,
    ) -> Result<OnboardVerified, WorkflowError> {
        let started = Instant::now();
        let result = self.verify_onboard_member_inner(oid, code).await;
        self.hold_floor(started).await;
        result
    }

    async fn verify_onboard_member_inner(
        &self,
        oid: &Oid,
        code: &str,
    ) -> Result<OnboardVerified, WorkflowError> {
        let mut txn = self.store().begin_write()?;
        let action = self.load_pending(txn.as_ref(), oid, ActionKind::OnboardMember)?;
        if let Err(e) = self.check_code(&action, code) {
            drop(txn);
            if e == WorkflowError::Expired {
                self.mark_action(&action, ActionStatus::Failed)?;
            }
            return Err(e);
        }
        let payload: OnboardPayload = mm_02_record_store::decode_record(&action.payload)?;

        // Time has passed since create; the username may have been taken in
        // between.
        if self.username_taken(txn.as_ref(), &payload.username)? {
            drop(txn);
            self.mark_action(&action, ActionStatus::Failed)?;
            return Err(WorkflowError::UsernameExists {
                alternative: alternative_username(&payload.username),
                username: payload.username,
            });
        }

        // Account, first key, all three identity indexes and the status
        // transition commit atomically.
        let member_oid = Uuid::new_v4();
        let created = now_ns();
        let account = Account {
            oid: member_oid,
            username: payload.username.clone(),
            email: payload.email.clone(),
            wallet_address: payload.member,
            wallet_type: payload.wallet_type,
            created,
            registered: payload.registered,
            eula: payload.eula.clone(),
            profile: payload.profile.clone(),
        };
        let user_key = UserKey {
            pubkey: payload.client_pubkey,
            owner: member_oid,
            created,
        };
        let mut verified = action.clone();
        verified.status = action.status.transition(ActionStatus::Verified)?;

        txn.put(Table::Accounts, &keys::oid_key(&member_oid), &encode_record(&account)?)?;
        txn.put(Table::UserKeys, &payload.client_pubkey, &encode_record(&user_key)?)?;
        txn.put(
            Table::IdxUsernames,
            &keys::string_index_key(&payload.username),
            member_oid.as_bytes(),
        )?;
        txn.put(
            Table::IdxEmails,
            &keys::string_index_key(&payload.email),
            member_oid.as_bytes(),
        )?;
        txn.put(
            Table::IdxWallets,
            &keys::address_key(&payload.member),
            member_oid.as_bytes(),
        )?;
        txn.put(Table::Actions, &keys::oid_key(oid), &encode_record(&verified)?)?;
        txn.commit()?;

        info!(member_oid = %member_oid, "account created");

        let call = register_member_for(
            &self.config().contracts.network,
            &payload.member,
            payload.registered,
            &payload.eula,
            &payload.profile,
            &payload.signature,
        );
        let tx_hash = self.submit_and_mark(&verified, &call).await?;

        Ok(OnboardVerified {
            member_oid,
            created,
            tx_hash,
        })
    }

    // ------------------------------------------------------------------
    // Login
    // ------------------------------------------------------------------

    pub async fn create_login_member(
        &self,
        req: LoginMemberRequest,
    ) -> Result<CreateActionResult, WorkflowError> {
        let started = Instant::now();
        let result = self.create_login_member_inner(req).await;
        self.hold_floor(started).await;
        result
    }

    async fn create_login_member_inner(
        &self,
        req: LoginMemberRequest,
    ) -> Result<CreateActionResult, WorkflowError> {
        validate_email(&req.member_email)?;

        let action = MemberLogin {
            chain_id: self.config().chain_id,
            verifying_contract: self.config().verifying_contract,
            member: req.member,
            logged_in: req.logged_in,
            timestamp: req.timestamp,
            member_email: req.member_email.clone(),
            client_pubkey: req.client_pubkey,
        };
        self.verifier().verify(&action, &req.member, &req.signature)?;

        let account = {
            let read = self.store().begin_read()?;
            self.account_by_wallet(read.as_ref(), &req.member)?
        };
        let Some(account) = account else {
            // Unknown wallet. Notify the supplied address and return a
            // throwaway oid so the response is shaped exactly like success.
            self.gateway().send_login_denied(&req.member_email).await?;
            return Ok(CreateActionResult {
                action: "login_member",
                vaction_oid: Uuid::new_v4(),
                timestamp: now_ns(),
            });
        };

        self.submit_login_action(&account, req.client_pubkey).await
    }

    /// Create a pending login action for a known account. Shared by login
    /// itself and the onboard fallback.
    pub(crate) async fn submit_login_action(
        &self,
        account: &Account,
        client_pubkey: [u8; 32],
    ) -> Result<CreateActionResult, WorkflowError> {
        let payload = LoginPayload {
            account_oid: account.oid,
            member: account.wallet_address,
            member_email: account.email.clone(),
            client_pubkey,
        };
        // The code goes to the registered address, not whatever the caller
        // supplied.
        let (oid, timestamp) = self
            .persist_action(ActionKind::LoginMember, encode_record(&payload)?, &account.email)
            .await?;
        Ok(CreateActionResult {
            action: "login_member",
            vaction_oid: oid,
            timestamp,
        })
    }

    pub async fn verify_login_member(
        &self,
        oid: &Oid,
        code: &str,
    ) -> Result<LoginVerified, WorkflowError> {
        let started = Instant::now();
        let result = self.verify_login_member_inner(oid, code).await;
        self.hold_floor(started).await;
        result
    }

    async fn verify_login_member_inner(
        &self,
        oid: &Oid,
        code: &str,
    ) -> Result<LoginVerified, WorkflowError> {
        let mut txn = self.store().begin_write()?;
        let action = self.load_pending(txn.as_ref(), oid, ActionKind::LoginMember)?;
        if let Err(e) = self.check_code(&action, code) {
            drop(txn);
            if e == WorkflowError::Expired {
                self.mark_action(&action, ActionStatus::Failed)?;
            }
            return Err(e);
        }
        let payload: LoginPayload = mm_02_record_store::decode_record(&action.payload)?;

        if self.account_by_oid(txn.as_ref(), &payload.account_oid)?.is_none() {
            drop(txn);
            self.mark_action(&action, ActionStatus::Failed)?;
            return Err(WorkflowError::NoSuchEntity { entity: "account" });
        }

        let user_key = UserKey {
            pubkey: payload.client_pubkey,
            owner: payload.account_oid,
            created: now_ns(),
        };
        let mut verified = action.clone();
        verified.status = action.status.transition(ActionStatus::Verified)?;

        txn.put(Table::UserKeys, &payload.client_pubkey, &encode_record(&user_key)?)?;
        txn.put(Table::Actions, &keys::oid_key(oid), &encode_record(&verified)?)?;
        txn.commit()?;

        // Login grants a key and nothing else; there is no ledger write.
        info!(member_oid = %payload.account_oid, "client key granted");

        Ok(LoginVerified {
            member_oid: payload.account_oid,
            client_pubkey: payload.client_pubkey,
        })
    }
}

fn validate_username(username: &str) -> Result<(), WorkflowError> {
    let ok = !username.is_empty()
        && username.len() <= 64
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(WorkflowError::InvalidRequest {
            message: "username must be 1-64 ascii alphanumeric/underscore characters".to_string(),
        })
    }
}

fn validate_email(email: &str) -> Result<(), WorkflowError> {
    if email.contains('@') && email.len() <= 254 {
        Ok(())
    } else {
        Err(WorkflowError::InvalidRequest {
            message: "invalid email address".to_string(),
        })
    }
}

//! # Market Flows
//!
//! Market creation and joining. The read-model is consulted for the
//! conflict rules: one market per maker wallet, and owners cannot join
//! their own market.

use mm_01_signature_verification::{MarketCreate, MarketJoin};
use mm_02_record_store::{
    decode_record, encode_record, keys, ActionKind, ActionStatus, MarketRecord, ReadTransaction,
    Table, WriteTransaction,
};
use mm_03_ledger_client::{create_market_for, join_market_for};
use shared_types::{ActorType, Oid};
use tokio::time::Instant;

use crate::errors::WorkflowError;
use crate::payloads::{
    CreateActionResult, CreateMarketPayload, CreateMarketRequest, JoinMarketPayload,
    JoinMarketRequest, JoinVerified, MarketVerified,
};
use crate::ports::{ChainWriter, NotificationGateway};

use super::ActionWorkflow;

impl<G: NotificationGateway, W: ChainWriter> ActionWorkflow<G, W> {
    // ------------------------------------------------------------------
    // Create market
    // ------------------------------------------------------------------

    pub async fn create_create_market(
        &self,
        req: CreateMarketRequest,
    ) -> Result<CreateActionResult, WorkflowError> {
        let started = Instant::now();
        let result = self.create_create_market_inner(req).await;
        self.hold_floor(started).await;
        result
    }

    async fn create_create_market_inner(
        &self,
        req: CreateMarketRequest,
    ) -> Result<CreateActionResult, WorkflowError> {
        if req.market_id == [0u8; 16] {
            return Err(WorkflowError::InvalidRequest {
                message: "market id must not be zero".to_string(),
            });
        }
        if req.maker == shared_types::ZERO_ADDRESS {
            return Err(WorkflowError::InvalidRequest {
                message: "maker address must not be zero".to_string(),
            });
        }

        let action = MarketCreate {
            chain_id: self.config().chain_id,
            verifying_contract: self.config().verifying_contract,
            member: req.member,
            created: req.created,
            market_id: req.market_id,
            coin: req.coin,
            terms: req.terms.clone(),
            meta: req.meta.clone(),
            maker: req.maker,
            provider_security: req.provider_security,
            consumer_security: req.consumer_security,
            market_fee: req.market_fee,
        };
        self.verifier().verify(&action, &req.member, &req.signature)?;

        let account = {
            let read = self.store().begin_read()?;
            self.account_by_wallet(read.as_ref(), &req.member)?
                .ok_or(WorkflowError::NoSuchEntity { entity: "member" })?
        };

        let payload = CreateMarketPayload {
            member: req.member,
            created: req.created,
            market_id: req.market_id,
            coin: req.coin,
            terms: req.terms,
            meta: req.meta,
            maker: req.maker,
            provider_security: req.provider_security,
            consumer_security: req.consumer_security,
            market_fee: req.market_fee,
            signature: req.signature.as_bytes().to_vec(),
        };
        let (oid, timestamp) = self
            .persist_action(
                ActionKind::CreateMarket,
                encode_record(&payload)?,
                &account.email,
            )
            .await?;
        Ok(CreateActionResult {
            action: "create_market",
            vaction_oid: oid,
            timestamp,
        })
    }

    pub async fn verify_create_market(
        &self,
        oid: &Oid,
        code: &str,
    ) -> Result<MarketVerified, WorkflowError> {
        let started = Instant::now();
        let result = self.verify_create_market_inner(oid, code).await;
        self.hold_floor(started).await;
        result
    }

    async fn verify_create_market_inner(
        &self,
        oid: &Oid,
        code: &str,
    ) -> Result<MarketVerified, WorkflowError> {
        let mut txn = self.store().begin_write()?;
        let action = self.load_pending(txn.as_ref(), oid, ActionKind::CreateMarket)?;
        if let Err(e) = self.check_code(&action, code) {
            drop(txn);
            if e == WorkflowError::Expired {
                self.mark_action(&action, ActionStatus::Failed)?;
            }
            return Err(e);
        }
        let payload: CreateMarketPayload = decode_record(&action.payload)?;

        // One market per maker. The index holds both synced markets and
        // makers pre-claimed by earlier verified actions.
        if let Some(bound) = txn.get(Table::IdxMakers, &keys::maker_index_key(&payload.maker))? {
            if bound != payload.market_id {
                drop(txn);
                self.mark_action(&action, ActionStatus::Failed)?;
                return Err(WorkflowError::MakerAlreadyWorking);
            }
        }

        let mut verified = action.clone();
        verified.status = action.status.transition(ActionStatus::Verified)?;
        txn.put(
            Table::IdxMakers,
            &keys::maker_index_key(&payload.maker),
            &payload.market_id,
        )?;
        txn.put(Table::Actions, &keys::oid_key(oid), &encode_record(&verified)?)?;
        txn.commit()?;

        let call = create_market_for(
            &self.config().contracts.market,
            &payload.member,
            payload.created,
            &payload.market_id,
            &payload.coin,
            &payload.terms,
            &payload.meta,
            &payload.maker,
            payload.provider_security,
            payload.consumer_security,
            payload.market_fee,
            &payload.signature,
        );
        let tx_hash = self.submit_and_mark(&verified, &call).await?;

        Ok(MarketVerified {
            market_id: payload.market_id,
            tx_hash,
        })
    }

    // ------------------------------------------------------------------
    // Join market
    // ------------------------------------------------------------------

    pub async fn create_join_market(
        &self,
        req: JoinMarketRequest,
    ) -> Result<CreateActionResult, WorkflowError> {
        let started = Instant::now();
        let result = self.create_join_market_inner(req).await;
        self.hold_floor(started).await;
        result
    }

    async fn create_join_market_inner(
        &self,
        req: JoinMarketRequest,
    ) -> Result<CreateActionResult, WorkflowError> {
        if ActorType::from_u8(req.actor_type).is_none() {
            return Err(WorkflowError::InvalidRequest {
                message: format!("unknown actor type {}", req.actor_type),
            });
        }

        let action = MarketJoin {
            chain_id: self.config().chain_id,
            verifying_contract: self.config().verifying_contract,
            member: req.member,
            joined: req.joined,
            market_id: req.market_id,
            actor_type: req.actor_type,
            meta: req.meta.clone(),
        };
        self.verifier().verify(&action, &req.member, &req.signature)?;

        let (account, market) = {
            let read = self.store().begin_read()?;
            let account = self
                .account_by_wallet(read.as_ref(), &req.member)?
                .ok_or(WorkflowError::NoSuchEntity { entity: "member" })?;
            let market = load_market(read.as_ref(), &req.market_id)?;
            (account, market)
        };
        if market.owner == req.member {
            return Err(WorkflowError::SenderIsOwner);
        }

        let payload = JoinMarketPayload {
            member: req.member,
            joined: req.joined,
            market_id: req.market_id,
            actor_type: req.actor_type,
            meta: req.meta,
            signature: req.signature.as_bytes().to_vec(),
        };
        let (oid, timestamp) = self
            .persist_action(
                ActionKind::JoinMarket,
                encode_record(&payload)?,
                &account.email,
            )
            .await?;
        Ok(CreateActionResult {
            action: "join_market",
            vaction_oid: oid,
            timestamp,
        })
    }

    pub async fn verify_join_market(
        &self,
        oid: &Oid,
        code: &str,
    ) -> Result<JoinVerified, WorkflowError> {
        let started = Instant::now();
        let result = self.verify_join_market_inner(oid, code).await;
        self.hold_floor(started).await;
        result
    }

    async fn verify_join_market_inner(
        &self,
        oid: &Oid,
        code: &str,
    ) -> Result<JoinVerified, WorkflowError> {
        let mut txn = self.store().begin_write()?;
        let action = self.load_pending(txn.as_ref(), oid, ActionKind::JoinMarket)?;
        if let Err(e) = self.check_code(&action, code) {
            drop(txn);
            if e == WorkflowError::Expired {
                self.mark_action(&action, ActionStatus::Failed)?;
            }
            return Err(e);
        }
        let payload: JoinMarketPayload = decode_record(&action.payload)?;

        // The ownership rule is rechecked; the market may only have synced
        // since create.
        let market = load_market(txn.as_ref(), &payload.market_id)?;
        if market.owner == payload.member {
            drop(txn);
            self.mark_action(&action, ActionStatus::Failed)?;
            return Err(WorkflowError::SenderIsOwner);
        }

        let mut verified = action.clone();
        verified.status = action.status.transition(ActionStatus::Verified)?;
        txn.put(Table::Actions, &keys::oid_key(oid), &encode_record(&verified)?)?;
        txn.commit()?;

        let call = join_market_for(
            &self.config().contracts.market,
            &payload.member,
            payload.joined,
            &payload.market_id,
            payload.actor_type,
            &payload.meta,
            &payload.signature,
        );
        let tx_hash = self.submit_and_mark(&verified, &call).await?;

        Ok(JoinVerified {
            market_id: payload.market_id,
            actor_type: payload.actor_type,
            tx_hash,
        })
    }
}

fn load_market<R: ReadTransaction + ?Sized>(
    txn: &R,
    market_id: &[u8; 16],
) -> Result<MarketRecord, WorkflowError> {
    let bytes = txn
        .get(Table::Markets, &keys::id16_key(market_id))?
        .ok_or(WorkflowError::NoSuchEntity { entity: "market" })?;
    Ok(decode_record(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::super::testkit::{fixture, member_keypair, Fixture};
    use super::*;
    use k256::ecdsa::SigningKey;
    use mm_01_signature_verification::testing::sign_typed;
    use mm_01_signature_verification::{MemberRegister, Signature65};
    use mm_02_record_store::RecordStore;
    use primitive_types::U256;
    use shared_types::Address;

    use crate::payloads::OnboardMemberRequest;

    async fn onboard(fx: &Fixture, sk: &SigningKey, member: Address, username: &str, email: &str) {
        let config = fx.workflow.config();
        let action = MemberRegister {
            chain_id: config.chain_id,
            verifying_contract: config.verifying_contract,
            member,
            registered: 10,
            eula: "h1:eula".into(),
            profile: String::new(),
        };
        let req = OnboardMemberRequest {
            username: username.into(),
            email: email.into(),
            member,
            wallet_type: 1,
            registered: 10,
            eula: "h1:eula".into(),
            profile: String::new(),
            client_pubkey: [0x55; 32],
            signature: sign_typed(&action, sk),
        };
        let created = fx.workflow.create_onboard_member(req).await.unwrap();
        let code = fx.mail.last_code_for(email).unwrap();
        fx.workflow
            .verify_onboard_member(&created.vaction_oid, &code)
            .await
            .unwrap();
    }

    fn market_request(
        fx: &Fixture,
        sk: &SigningKey,
        member: Address,
        market_id: [u8; 16],
        maker: Address,
    ) -> CreateMarketRequest {
        let config = fx.workflow.config();
        let action = MarketCreate {
            chain_id: config.chain_id,
            verifying_contract: config.verifying_contract,
            member,
            created: 20,
            market_id,
            coin: config.contracts.token,
            terms: "h1:terms".into(),
            meta: "h1:meta".into(),
            maker,
            provider_security: U256::from(100),
            consumer_security: U256::from(100),
            market_fee: U256::from(5),
        };
        CreateMarketRequest {
            member,
            created: 20,
            market_id,
            coin: config.contracts.token,
            terms: "h1:terms".into(),
            meta: "h1:meta".into(),
            maker,
            provider_security: U256::from(100),
            consumer_security: U256::from(100),
            market_fee: U256::from(5),
            signature: sign_typed(&action, sk),
        }
    }

    fn join_request(
        fx: &Fixture,
        sk: &SigningKey,
        member: Address,
        market_id: [u8; 16],
        actor_type: u8,
    ) -> JoinMarketRequest {
        let config = fx.workflow.config();
        let action = MarketJoin {
            chain_id: config.chain_id,
            verifying_contract: config.verifying_contract,
            member,
            joined: 30,
            market_id,
            actor_type,
            meta: "h1:actormeta".into(),
        };
        JoinMarketRequest {
            member,
            joined: 30,
            market_id,
            actor_type,
            meta: "h1:actormeta".into(),
            signature: sign_typed(&action, sk),
        }
    }

    /// Plant a synced market record, as the scanner would have.
    fn plant_market(fx: &Fixture, market_id: [u8; 16], owner: Address, maker: Address) {
        let record = MarketRecord {
            market_id,
            owner,
            coin: [0x04; 20],
            terms: "h1:terms".into(),
            meta: "h1:meta".into(),
            maker,
            provider_security: [0u8; 32],
            consumer_security: [0u8; 32],
            market_fee: [0u8; 32],
            created: 20,
            tx_hash: [0xaa; 32],
        };
        let mut txn = fx.store.begin_write().unwrap();
        txn.put(
            Table::Markets,
            &keys::id16_key(&market_id),
            &encode_record(&record).unwrap(),
        )
        .unwrap();
        txn.put(Table::IdxMakers, &keys::maker_index_key(&maker), &market_id)
            .unwrap();
        txn.commit().unwrap();
    }

    #[tokio::test]
    async fn test_create_market_end_to_end() {
        let fx = fixture();
        let (sk, member) = member_keypair();
        onboard(&fx, &sk, member, "alice", "alice@x.io").await;

        let created = fx
            .workflow
            .create_create_market(market_request(&fx, &sk, member, [9u8; 16], [0x0a; 20]))
            .await
            .unwrap();
        assert_eq!(created.action, "create_market");

        let code = fx.mail.last_code_for("alice@x.io").unwrap();
        let verified = fx
            .workflow
            .verify_create_market(&created.vaction_oid, &code)
            .await
            .unwrap();
        assert_eq!(verified.market_id, [9u8; 16]);
        assert_ne!(verified.tx_hash, [0u8; 32]);
    }

    #[tokio::test]
    async fn test_maker_already_bound_fails_at_verify() {
        let fx = fixture();
        let (sk, member) = member_keypair();
        onboard(&fx, &sk, member, "alice", "alice@x.io").await;

        let maker = [0x0a; 20];
        let first = fx
            .workflow
            .create_create_market(market_request(&fx, &sk, member, [9u8; 16], maker))
            .await
            .unwrap();
        let code = fx.mail.last_code_for("alice@x.io").unwrap();
        fx.workflow
            .verify_create_market(&first.vaction_oid, &code)
            .await
            .unwrap();

        // Same maker, different market.
        let second = fx
            .workflow
            .create_create_market(market_request(&fx, &sk, member, [8u8; 16], maker))
            .await
            .unwrap();
        let code = fx.mail.last_code_for("alice@x.io").unwrap();
        let err = fx
            .workflow
            .verify_create_market(&second.vaction_oid, &code)
            .await
            .unwrap_err();
        assert_eq!(err, WorkflowError::MakerAlreadyWorking);
        assert_eq!(err.code(), "mesh.error.maker_already_working_for_other_market");
    }

    #[tokio::test]
    async fn test_create_market_requires_account() {
        let fx = fixture();
        let (sk, member) = member_keypair();
        let err = fx
            .workflow
            .create_create_market(market_request(&fx, &sk, member, [9u8; 16], [0x0a; 20]))
            .await
            .unwrap_err();
        assert_eq!(err, WorkflowError::NoSuchEntity { entity: "member" });
    }

    #[tokio::test]
    async fn test_join_market_end_to_end() {
        let fx = fixture();
        let (owner_sk, owner) = member_keypair();
        let (sk, member) = member_keypair();
        onboard(&fx, &owner_sk, owner, "owner", "owner@x.io").await;
        onboard(&fx, &sk, member, "bob", "bob@x.io").await;
        plant_market(&fx, [9u8; 16], owner, [0x0a; 20]);

        let created = fx
            .workflow
            .create_join_market(join_request(&fx, &sk, member, [9u8; 16], 1))
            .await
            .unwrap();
        let code = fx.mail.last_code_for("bob@x.io").unwrap();
        let verified = fx
            .workflow
            .verify_join_market(&created.vaction_oid, &code)
            .await
            .unwrap();
        assert_eq!(verified.actor_type, 1);
    }

    #[tokio::test]
    async fn test_cannot_join_own_market() {
        let fx = fixture();
        let (sk, owner) = member_keypair();
        onboard(&fx, &sk, owner, "owner", "owner@x.io").await;
        plant_market(&fx, [9u8; 16], owner, [0x0a; 20]);

        let err = fx
            .workflow
            .create_join_market(join_request(&fx, &sk, owner, [9u8; 16], 2))
            .await
            .unwrap_err();
        assert_eq!(err, WorkflowError::SenderIsOwner);
        assert_eq!(err.code(), "mesh.error.sender_is_owner");
    }

    #[tokio::test]
    async fn test_join_unknown_market() {
        let fx = fixture();
        let (sk, member) = member_keypair();
        onboard(&fx, &sk, member, "bob", "bob@x.io").await;

        let err = fx
            .workflow
            .create_join_market(join_request(&fx, &sk, member, [0x42; 16], 1))
            .await
            .unwrap_err();
        assert_eq!(err, WorkflowError::NoSuchEntity { entity: "market" });
    }

    #[tokio::test]
    async fn test_ledger_revert_maps_to_domain_error() {
        let fx = fixture();
        let (sk, member) = member_keypair();
        onboard(&fx, &sk, member, "alice", "alice@x.io").await;

        fx.ledger.set_revert("MAKER_ALREADY_WORKING_FOR_OTHER_MARKET");
        let created = fx
            .workflow
            .create_create_market(market_request(&fx, &sk, member, [9u8; 16], [0x0a; 20]))
            .await
            .unwrap();
        let code = fx.mail.last_code_for("alice@x.io").unwrap();
        let err = fx
            .workflow
            .verify_create_market(&created.vaction_oid, &code)
            .await
            .unwrap_err();
        assert_eq!(err, WorkflowError::MakerAlreadyWorking);
    }

    #[tokio::test]
    async fn test_market_rejects_tampered_signature() {
        let fx = fixture();
        let (sk, member) = member_keypair();
        onboard(&fx, &sk, member, "alice", "alice@x.io").await;

        let mut req = market_request(&fx, &sk, member, [9u8; 16], [0x0a; 20]);
        req.market_fee = U256::from(999);
        let err = fx.workflow.create_create_market(req).await.unwrap_err();
        assert_eq!(err.code(), "mesh.error.invalid_signature");

        let mut req = market_request(&fx, &sk, member, [9u8; 16], [0x0a; 20]);
        req.signature = Signature65([1u8; 65]);
        let err = fx.workflow.create_create_market(req).await.unwrap_err();
        assert_eq!(err.code(), "mesh.error.invalid_signature");
    }
}

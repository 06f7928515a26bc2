//! # Action Lifecycle Choreography
//!
//! Exercises the full control-plane loop: a signed request enters the
//! action workflow, the verified write goes to the (mock) ledger, the
//! ledger emits the corresponding event, and the chain scanner projects it
//! into the shared record store, where the next workflow call reads it.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use k256::ecdsa::SigningKey;
    use primitive_types::U256;

    use mm_01_signature_verification::testing::{address_of, generate_keypair, sign_typed};
    use mm_01_signature_verification::{
        ApiPublish, CatalogCreate, MarketCreate, MarketJoin, MemberRegister,
    };
    use mm_02_record_store::{
        decode_record, keys, MarketActor, MarketRecord, MemberRecord, MemoryStore,
        ReadTransaction, RecordStore, Table,
    };
    use mm_03_ledger_client::domain::events::encode::{self, LogMeta};
    use mm_03_ledger_client::{MockLedger, SubmitterConfig, TransactionSubmitter};
    use mm_04_chain_sync::{ChainScanner, EventRegistry, ScannerConfig};
    use mm_05_action_workflow::codes::content_hash;
    use mm_05_action_workflow::{
        ActionWorkflow, CreateCatalogRequest, CreateMarketRequest, JoinMarketRequest,
        OnboardMemberRequest, PublishApiRequest, TestMailSink, WorkflowConfig, WorkflowError,
    };
    use shared_types::Address;

    type TestWorkflow = ActionWorkflow<TestMailSink, TransactionSubmitter<MockLedger>>;

    /// One assembled control plane: shared store, shared mock chain.
    struct Mesh {
        store: Arc<MemoryStore>,
        ledger: MockLedger,
        mail: TestMailSink,
        workflow: TestWorkflow,
        scanner: ChainScanner,
    }

    fn mesh() -> Mesh {
        crate::init_tracing();
        let store = Arc::new(MemoryStore::new());
        let ledger = MockLedger::new();
        let mail = TestMailSink::new();
        let (hot_wallet, _) = generate_keypair();
        let submitter = TransactionSubmitter::new(
            ledger.clone(),
            hot_wallet,
            SubmitterConfig {
                chain_id: 1337,
                ..Default::default()
            },
        );
        let workflow = ActionWorkflow::new(
            Arc::clone(&store) as Arc<dyn RecordStore>,
            mail.clone(),
            submitter,
            WorkflowConfig::for_testing(),
        );
        let scanner = ChainScanner::new(
            Arc::new(ledger.clone()),
            Arc::clone(&store) as Arc<dyn RecordStore>,
            Arc::new(EventRegistry::standard()),
            ScannerConfig::for_testing("main"),
        );
        Mesh {
            store,
            ledger,
            mail,
            workflow,
            scanner,
        }
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

    fn member_keypair() -> (SigningKey, Address) {
        let (sk, vk) = generate_keypair();
        (sk, address_of(&vk))
    }

    // ------------------------------------------------------------------
    // Request builders
    // ------------------------------------------------------------------

    async fn onboard(m: &Mesh, sk: &SigningKey, member: Address, username: &str, email: &str) {
        let config = m.workflow.config();
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
        let created = m.workflow.create_onboard_member(req).await.unwrap();
        let code = m.mail.last_code_for(email).unwrap();
        m.workflow
            .verify_onboard_member(&created.vaction_oid, &code)
            .await
            .unwrap();
    }

    fn market_request(
        m: &Mesh,
        sk: &SigningKey,
        member: Address,
        market_id: [u8; 16],
        maker: Address,
    ) -> CreateMarketRequest {
        let config = m.workflow.config();
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
        m: &Mesh,
        sk: &SigningKey,
        member: Address,
        market_id: [u8; 16],
        actor_type: u8,
    ) -> JoinMarketRequest {
        let config = m.workflow.config();
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

    // ------------------------------------------------------------------
    // Scenarios
    // ------------------------------------------------------------------

    /// The central choreography: create market through the workflow, let
    /// the chain confirm it, sync, and have a second member join based on
    /// the synced read-model.
    #[tokio::test]
    async fn test_market_lifecycle_action_to_read_model() {
        let m = mesh();
        let (owner_sk, owner) = member_keypair();
        onboard(&m, &owner_sk, owner, "owner", "owner@x.io").await;

        let market_id = [9u8; 16];
        let maker = [0x0a; 20];
        let created = m
            .workflow
            .create_create_market(market_request(&m, &owner_sk, owner, market_id, maker))
            .await
            .unwrap();
        let code = m.mail.last_code_for("owner@x.io").unwrap();
        m.workflow
            .verify_create_market(&created.vaction_oid, &code)
            .await
            .unwrap();

        // Onboard register + market create both reached the ledger.
        assert_eq!(m.ledger.submitted().len(), 2);

        // Joining before the chain confirmed the market fails: the
        // read-model has no market yet.
        let (bob_sk, bob) = member_keypair();
        onboard(&m, &bob_sk, bob, "bob", "bob@x.io").await;
        let err = m
            .workflow
            .create_join_market(join_request(&m, &bob_sk, bob, market_id, 1))
            .await
            .unwrap_err();
        assert_eq!(err, WorkflowError::NoSuchEntity { entity: "market" });

        // The chain confirms; the scanner projects the market.
        m.ledger.push_block(vec![encode::market_created(
            meta(0x21),
            &market_id,
            &owner,
            20,
            &m.workflow.config().contracts.token,
            "h1:terms",
            "h1:meta",
            &maker,
            U256::from(100),
            U256::from(100),
            U256::from(5),
        )]);
        m.scanner.scan_available().await.unwrap();

        let read = m.store.begin_read().unwrap();
        let bytes = read
            .get(Table::Markets, &keys::id16_key(&market_id))
            .unwrap()
            .unwrap();
        let market: MarketRecord = decode_record(&bytes).unwrap();
        assert_eq!(market.owner, owner);
        assert_eq!(market.maker, maker);
        drop(read);

        // Now the join goes through end to end.
        let created = m
            .workflow
            .create_join_market(join_request(&m, &bob_sk, bob, market_id, 1))
            .await
            .unwrap();
        let code = m.mail.last_code_for("bob@x.io").unwrap();
        let joined = m
            .workflow
            .verify_join_market(&created.vaction_oid, &code)
            .await
            .unwrap();
        assert_eq!(joined.market_id, market_id);

        // And the chain-confirmed join lands in the actors table.
        m.ledger.push_block(vec![encode::actor_joined(
            meta(0x22),
            &market_id,
            &bob,
            1,
            30,
            U256::from(100),
            "h1:actormeta",
        )]);
        m.scanner.scan_available().await.unwrap();

        let read = m.store.begin_read().unwrap();
        let bytes = read
            .get(Table::Actors, &keys::actor_key(&market_id, &bob, 1))
            .unwrap()
            .unwrap();
        let actor: MarketActor = decode_record(&bytes).unwrap();
        assert_eq!(actor.actor, bob);
        assert_eq!(actor.actor_type, 1);
    }

    /// The one-market-per-maker rule holds across the subsystem boundary:
    /// a maker bound by a synced chain event blocks a workflow request.
    #[tokio::test]
    async fn test_maker_rule_spans_sync_and_workflow() {
        let m = mesh();
        let maker = [0x0a; 20];
        let (_, stranger) = member_keypair();

        m.ledger.push_block(vec![encode::market_created(
            meta(0x31),
            &[0x11; 16],
            &stranger,
            5,
            &[0x04; 20],
            "h1:t",
            "h1:m",
            &maker,
            U256::zero(),
            U256::zero(),
            U256::zero(),
        )]);
        m.scanner.scan_available().await.unwrap();

        let (sk, member) = member_keypair();
        onboard(&m, &sk, member, "alice", "alice@x.io").await;
        let created = m
            .workflow
            .create_create_market(market_request(&m, &sk, member, [0x12; 16], maker))
            .await
            .unwrap();
        let code = m.mail.last_code_for("alice@x.io").unwrap();
        let err = m
            .workflow
            .verify_create_market(&created.vaction_oid, &code)
            .await
            .unwrap_err();
        assert_eq!(err, WorkflowError::MakerAlreadyWorking);
    }

    /// The chain-side member registry and the off-chain account live in
    /// different tables and are filled by different subsystems.
    #[tokio::test]
    async fn test_member_projection_complements_account() {
        let m = mesh();
        let (sk, member) = member_keypair();
        onboard(&m, &sk, member, "alice", "alice@x.io").await;

        // The account exists, the chain-side member record does not yet.
        let read = m.store.begin_read().unwrap();
        assert!(read
            .get(Table::Members, &keys::address_key(&member))
            .unwrap()
            .is_none());
        assert!(read
            .get(Table::IdxWallets, &keys::address_key(&member))
            .unwrap()
            .is_some());
        drop(read);

        m.ledger.push_block(vec![encode::member_registered(
            meta(0x41),
            &member,
            10,
            "h1:eula",
            "",
            1,
        )]);
        m.scanner.scan_available().await.unwrap();

        let read = m.store.begin_read().unwrap();
        let bytes = read
            .get(Table::Members, &keys::address_key(&member))
            .unwrap()
            .unwrap();
        let record: MemberRecord = decode_record(&bytes).unwrap();
        assert_eq!(record.registered, 10);
        assert_eq!(record.eula, "h1:eula");
    }

    /// Re-scanning the chain after workflow writes changes nothing: the
    /// projection is insert-if-absent and the workflow tables are not
    /// touched by the scanner.
    #[tokio::test]
    async fn test_rescan_is_idempotent_alongside_workflow_state() {
        let m = mesh();
        let (sk, owner) = member_keypair();
        onboard(&m, &sk, owner, "owner", "owner@x.io").await;

        let market_id = [9u8; 16];
        let maker = [0x0a; 20];
        m.ledger.push_block(vec![encode::market_created(
            meta(0x51),
            &market_id,
            &owner,
            20,
            &[0x04; 20],
            "h1:terms",
            "h1:meta",
            &maker,
            U256::from(100),
            U256::from(100),
            U256::from(5),
        )]);
        m.scanner.scan_available().await.unwrap();
        let first = m
            .store
            .begin_read()
            .unwrap()
            .get(Table::Markets, &keys::id16_key(&market_id))
            .unwrap()
            .unwrap();

        // Nothing new on chain; a second pass is a no-op.
        m.scanner.scan_available().await.unwrap();
        let second = m
            .store
            .begin_read()
            .unwrap()
            .get(Table::Markets, &keys::id16_key(&market_id))
            .unwrap()
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(
            ChainScanner::checkpoint(m.store.as_ref(), "main").unwrap(),
            Some(1)
        );
    }

    /// Catalog and API publication across the full loop, including the
    /// content-hash gate on the off-chain blobs.
    #[tokio::test]
    async fn test_catalog_and_api_lifecycle() {
        let m = mesh();
        let (sk, member) = member_keypair();
        onboard(&m, &sk, member, "alice", "alice@x.io").await;
        let config = m.workflow.config().clone();

        let catalog_id = [7u8; 16];
        let blob = br#"{"title":"weather"}"#.to_vec();
        let meta_hash = content_hash(&blob);
        let action = CatalogCreate {
            chain_id: config.chain_id,
            verifying_contract: config.verifying_contract,
            member,
            created: 40,
            catalog_id,
            terms: "h1:terms".into(),
            meta: meta_hash.clone(),
        };
        let created = m
            .workflow
            .create_create_catalog(CreateCatalogRequest {
                member,
                created: 40,
                catalog_id,
                terms: "h1:terms".into(),
                meta: meta_hash.clone(),
                attributes: Some(blob),
                signature: sign_typed(&action, &sk),
            })
            .await
            .unwrap();
        let code = m.mail.last_code_for("alice@x.io").unwrap();
        m.workflow
            .verify_create_catalog(&created.vaction_oid, &code)
            .await
            .unwrap();

        // Publishing into the catalog requires it in the read-model first.
        let api_id = [8u8; 16];
        let schema_blob = br#"{"openapi":"3.0"}"#.to_vec();
        let schema_hash = content_hash(&schema_blob);
        let publish = |m: &Mesh| {
            let action = ApiPublish {
                chain_id: config.chain_id,
                verifying_contract: config.verifying_contract,
                member,
                published: 50,
                catalog_id,
                api_id,
                schema: schema_hash.clone(),
                meta: "h1:apimeta".into(),
            };
            PublishApiRequest {
                member,
                published: 50,
                catalog_id,
                api_id,
                schema: schema_hash.clone(),
                meta: "h1:apimeta".into(),
                schema_blob: Some(schema_blob.clone()),
                signature: sign_typed(&action, &sk),
            }
        };
        let err = m.workflow.create_publish_api(publish(&m)).await.unwrap_err();
        assert_eq!(err, WorkflowError::NoSuchEntity { entity: "catalog" });

        m.ledger.push_block(vec![encode::catalog_created(
            meta(0x61),
            &catalog_id,
            &member,
            40,
            "h1:terms",
            &meta_hash,
        )]);
        m.scanner.scan_available().await.unwrap();

        let created = m.workflow.create_publish_api(publish(&m)).await.unwrap();
        let code = m.mail.last_code_for("alice@x.io").unwrap();
        let verified = m
            .workflow
            .verify_publish_api(&created.vaction_oid, &code)
            .await
            .unwrap();
        assert_eq!(verified.api_id, api_id);

        m.ledger.push_block(vec![encode::api_published(
            meta(0x62),
            &catalog_id,
            &api_id,
            &member,
            50,
            &schema_hash,
            "h1:apimeta",
        )]);
        m.scanner.scan_available().await.unwrap();

        let read = m.store.begin_read().unwrap();
        assert!(read
            .get(Table::Apis, &keys::id16_key(&api_id))
            .unwrap()
            .is_some());
    }

    /// Probing for existing identities yields the same response shape as
    /// the genuine calls.
    #[tokio::test]
    async fn test_enumeration_probes_get_uniform_shape() {
        let m = mesh();
        let (sk, member) = member_keypair();
        onboard(&m, &sk, member, "alice", "alice@x.io").await;

        // Re-onboarding a known wallet silently degrades to login.
        let config = m.workflow.config();
        let action = MemberRegister {
            chain_id: config.chain_id,
            verifying_contract: config.verifying_contract,
            member,
            registered: 10,
            eula: "h1:eula".into(),
            profile: String::new(),
        };
        let probe = m
            .workflow
            .create_onboard_member(OnboardMemberRequest {
                username: "other".into(),
                email: "other@x.io".into(),
                member,
                wallet_type: 1,
                registered: 10,
                eula: "h1:eula".into(),
                profile: String::new(),
                client_pubkey: [0x66; 32],
                signature: sign_typed(&action, &sk),
            })
            .await
            .unwrap();
        assert_eq!(probe.action, "login_member");

        // No mail leaked to the probing address.
        assert!(m.mail.last_code_for("other@x.io").is_none());
    }
}

//! # Catalog and API Flows
//!
//! Catalog creation and API publication. Both carry off-chain blobs whose
//! content hash must match the hash inside the signed tuple before the
//! action is accepted.

use mm_01_signature_verification::{ApiPublish, CatalogCreate};
use mm_02_record_store::{
    decode_record, encode_record, keys, ActionKind, ActionStatus, CatalogRecord, ReadTransaction,
    Table, WriteTransaction,
};
use mm_03_ledger_client::{create_catalog_for, publish_api_for};
use shared_types::Oid;
use tokio::time::Instant;

use crate::codes::content_hash_matches;
use crate::errors::WorkflowError;
use crate::payloads::{
    ApiVerified, CatalogVerified, CreateActionResult, CreateCatalogPayload, CreateCatalogRequest,
    PublishApiPayload, PublishApiRequest,
};
use crate::ports::{ChainWriter, NotificationGateway};

use super::ActionWorkflow;

impl<G: NotificationGateway, W: ChainWriter> ActionWorkflow<G, W> {
    // ------------------------------------------------------------------
    // Create catalog
    // ------------------------------------------------------------------

    pub async fn create_create_catalog(
        &self,
        req: CreateCatalogRequest,
    ) -> Result<CreateActionResult, WorkflowError> {
        let started = Instant::now();
        let result = self.create_create_catalog_inner(req).await;
        self.hold_floor(started).await;
        result
    }

    async fn create_create_catalog_inner(
        &self,
        req: CreateCatalogRequest,
    ) -> Result<CreateActionResult, WorkflowError> {
        if req.catalog_id == [0u8; 16] {
            return Err(WorkflowError::InvalidRequest {
                message: "catalog id must not be zero".to_string(),
            });
        }
        if let Some(blob) = &req.attributes {
            if !content_hash_matches(blob, &req.meta) {
                return Err(WorkflowError::ContentHashMismatch { field: "meta" });
            }
        }

        let action = CatalogCreate {
            chain_id: self.config().chain_id,
            verifying_contract: self.config().verifying_contract,
            member: req.member,
            created: req.created,
            catalog_id: req.catalog_id,
            terms: req.terms.clone(),
            meta: req.meta.clone(),
        };
        self.verifier().verify(&action, &req.member, &req.signature)?;

        let account = {
            let read = self.store().begin_read()?;
            self.account_by_wallet(read.as_ref(), &req.member)?
                .ok_or(WorkflowError::NoSuchEntity { entity: "member" })?
        };

        let payload = CreateCatalogPayload {
            member: req.member,
            created: req.created,
            catalog_id: req.catalog_id,
            terms: req.terms,
            meta: req.meta,
            signature: req.signature.as_bytes().to_vec(),
        };
        let (oid, timestamp) = self
            .persist_action(
                ActionKind::CreateCatalog,
                encode_record(&payload)?,
                &account.email,
            )
            .await?;
        Ok(CreateActionResult {
            action: "create_catalog",
            vaction_oid: oid,
            timestamp,
        })
    }

    pub async fn verify_create_catalog(
        &self,
        oid: &Oid,
        code: &str,
    ) -> Result<CatalogVerified, WorkflowError> {
        let started = Instant::now();
        let result = self.verify_create_catalog_inner(oid, code).await;
        self.hold_floor(started).await;
        result
    }

    async fn verify_create_catalog_inner(
        &self,
        oid: &Oid,
        code: &str,
    ) -> Result<CatalogVerified, WorkflowError> {
        let mut txn = self.store().begin_write()?;
        let action = self.load_pending(txn.as_ref(), oid, ActionKind::CreateCatalog)?;
        if let Err(e) = self.check_code(&action, code) {
            drop(txn);
            if e == WorkflowError::Expired {
                self.mark_action(&action, ActionStatus::Failed)?;
            }
            return Err(e);
        }
        let payload: CreateCatalogPayload = decode_record(&action.payload)?;

        let mut verified = action.clone();
        verified.status = action.status.transition(ActionStatus::Verified)?;
        txn.put(Table::Actions, &keys::oid_key(oid), &encode_record(&verified)?)?;
        txn.commit()?;

        let call = create_catalog_for(
            &self.config().contracts.catalog,
            &payload.member,
            payload.created,
            &payload.catalog_id,
            &payload.terms,
            &payload.meta,
            &payload.signature,
        );
        let tx_hash = self.submit_and_mark(&verified, &call).await?;

        Ok(CatalogVerified {
            catalog_id: payload.catalog_id,
            tx_hash,
        })
    }

    // ------------------------------------------------------------------
    // Publish API
    // ------------------------------------------------------------------

    pub async fn create_publish_api(
        &self,
        req: PublishApiRequest,
    ) -> Result<CreateActionResult, WorkflowError> {
        let started = Instant::now();
        let result = self.create_publish_api_inner(req).await;
        self.hold_floor(started).await;
        result
    }

    async fn create_publish_api_inner(
        &self,
        req: PublishApiRequest,
    ) -> Result<CreateActionResult, WorkflowError> {
        if req.api_id == [0u8; 16] {
            return Err(WorkflowError::InvalidRequest {
                message: "api id must not be zero".to_string(),
            });
        }
        if let Some(blob) = &req.schema_blob {
            if !content_hash_matches(blob, &req.schema) {
                return Err(WorkflowError::ContentHashMismatch { field: "schema" });
            }
        }

        let action = ApiPublish {
            chain_id: self.config().chain_id,
            verifying_contract: self.config().verifying_contract,
            member: req.member,
            published: req.published,
            catalog_id: req.catalog_id,
            api_id: req.api_id,
            schema: req.schema.clone(),
            meta: req.meta.clone(),
        };
        self.verifier().verify(&action, &req.member, &req.signature)?;

        let account = {
            let read = self.store().begin_read()?;
            let account = self
                .account_by_wallet(read.as_ref(), &req.member)?
                .ok_or(WorkflowError::NoSuchEntity { entity: "member" })?;
            // The target catalog must exist and belong to the publisher.
            let catalog = load_catalog(read.as_ref(), &req.catalog_id)?;
            if catalog.owner != req.member {
                return Err(WorkflowError::InvalidRequest {
                    message: "catalog is owned by another member".to_string(),
                });
            }
            account
        };

        let payload = PublishApiPayload {
            member: req.member,
            published: req.published,
            catalog_id: req.catalog_id,
            api_id: req.api_id,
            schema: req.schema,
            meta: req.meta,
            signature: req.signature.as_bytes().to_vec(),
        };
        let (oid, timestamp) = self
            .persist_action(
                ActionKind::PublishApi,
                encode_record(&payload)?,
                &account.email,
            )
            .await?;
        Ok(CreateActionResult {
            action: "publish_api",
            vaction_oid: oid,
            timestamp,
        })
    }

    pub async fn verify_publish_api(
        &self,
        oid: &Oid,
        code: &str,
    ) -> Result<ApiVerified, WorkflowError> {
        let started = Instant::now();
        let result = self.verify_publish_api_inner(oid, code).await;
        self.hold_floor(started).await;
        result
    }

    async fn verify_publish_api_inner(
        &self,
        oid: &Oid,
        code: &str,
    ) -> Result<ApiVerified, WorkflowError> {
        let mut txn = self.store().begin_write()?;
        let action = self.load_pending(txn.as_ref(), oid, ActionKind::PublishApi)?;
        if let Err(e) = self.check_code(&action, code) {
            drop(txn);
            if e == WorkflowError::Expired {
                self.mark_action(&action, ActionStatus::Failed)?;
            }
            return Err(e);
        }
        let payload: PublishApiPayload = decode_record(&action.payload)?;

        let mut verified = action.clone();
        verified.status = action.status.transition(ActionStatus::Verified)?;
        txn.put(Table::Actions, &keys::oid_key(oid), &encode_record(&verified)?)?;
        txn.commit()?;

        let call = publish_api_for(
            &self.config().contracts.catalog,
            &payload.member,
            payload.published,
            &payload.catalog_id,
            &payload.api_id,
            &payload.schema,
            &payload.meta,
            &payload.signature,
        );
        let tx_hash = self.submit_and_mark(&verified, &call).await?;

        Ok(ApiVerified {
            catalog_id: payload.catalog_id,
            api_id: payload.api_id,
            tx_hash,
        })
    }
}

fn load_catalog<R: ReadTransaction + ?Sized>(
    txn: &R,
    catalog_id: &[u8; 16],
) -> Result<CatalogRecord, WorkflowError> {
    let bytes = txn
        .get(Table::Catalogs, &keys::id16_key(catalog_id))?
        .ok_or(WorkflowError::NoSuchEntity { entity: "catalog" })?;
    Ok(decode_record(&bytes)?)
}

//! Contract record store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use pactum_core::{ContractRecord, ContractStatus, RiskReport};
use tokio::sync::Mutex;
use tracing::info;

use crate::StoreError;

/// Persistence interface for contract records.
#[async_trait]
pub trait ContractStore: Send + Sync {
    async fn get(&self, contract_id: &str) -> Result<ContractRecord, StoreError>;

    /// Upsert the full record, refreshing `updated_at`.
    async fn put(&self, record: ContractRecord) -> Result<(), StoreError>;

    async fn set_status(
        &self,
        contract_id: &str,
        status: ContractStatus,
    ) -> Result<(), StoreError>;

    /// Append a risk report to the record's analysis history.
    async fn attach_report(
        &self,
        contract_id: &str,
        report: RiskReport,
    ) -> Result<(), StoreError>;

    async fn list_by_user(
        &self,
        user_id: &str,
        status: Option<ContractStatus>,
    ) -> Result<Vec<ContractRecord>, StoreError>;
}

/// In-memory [`ContractStore`].
#[derive(Default)]
pub struct MemoryContractStore {
    records: Mutex<HashMap<String, ContractRecord>>,
}

impl MemoryContractStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a record and verify ownership.
    pub async fn get_for_user(
        &self,
        contract_id: &str,
        user_id: &str,
    ) -> Result<ContractRecord, StoreError> {
        let record = self.get(contract_id).await?;
        if record.user_id != user_id {
            return Err(StoreError::AccessDenied {
                user_id: user_id.to_string(),
                resource: format!("contract {contract_id}"),
            });
        }
        Ok(record)
    }
}

#[async_trait]
impl ContractStore for MemoryContractStore {
    async fn get(&self, contract_id: &str) -> Result<ContractRecord, StoreError> {
        self.records
            .lock()
            .await
            .get(contract_id)
            .cloned()
            .ok_or_else(|| StoreError::ContractNotFound(contract_id.to_string()))
    }

    async fn put(&self, mut record: ContractRecord) -> Result<(), StoreError> {
        if record.contract_id.is_empty() {
            return Err(StoreError::Validation("contract_id must not be empty".into()));
        }
        record.updated_at = Utc::now();
        self.records
            .lock()
            .await
            .insert(record.contract_id.clone(), record);
        Ok(())
    }

    async fn set_status(
        &self,
        contract_id: &str,
        status: ContractStatus,
    ) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(contract_id)
            .ok_or_else(|| StoreError::ContractNotFound(contract_id.to_string()))?;
        record.status = status;
        record.updated_at = Utc::now();
        info!(contract_id, status = status.as_str(), "contract status updated");
        Ok(())
    }

    async fn attach_report(
        &self,
        contract_id: &str,
        report: RiskReport,
    ) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(contract_id)
            .ok_or_else(|| StoreError::ContractNotFound(contract_id.to_string()))?;
        record.reports.push(report);
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        status: Option<ContractStatus>,
    ) -> Result<Vec<ContractRecord>, StoreError> {
        let records = self.records.lock().await;
        let mut matching: Vec<ContractRecord> = records
            .values()
            .filter(|r| r.user_id == user_id)
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(matching)
    }
}

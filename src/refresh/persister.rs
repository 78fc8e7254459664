use crate::domain::ValidatorCommissionAmount;
use crate::store::CommissionStore;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Writes commission snapshots through the store's upsert path. No retries.
#[derive(Clone)]
pub struct CommissionPersister {
    store: Arc<dyn CommissionStore>,
}

impl CommissionPersister {
    pub fn new(store: Arc<dyn CommissionStore>) -> Self {
        Self { store }
    }

    pub async fn persist(&self, record: ValidatorCommissionAmount) -> Result<()> {
        let operator = record.operator_address().to_owned();
        let height = record.height();
        self.store
            .save_validator_commission_amount(record)
            .await
            .with_context(|| {
                format!("error while saving commission of validator {operator} at height {height}")
            })
    }
}

use crate::domain::{Validator, ValidatorCommissionAmount};
use crate::rpc::CommissionQueryClient;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Turns a height-pinned ledger query into a [`ValidatorCommissionAmount`].
#[derive(Clone)]
pub struct CommissionFetcher {
    client: Arc<dyn CommissionQueryClient>,
}

impl CommissionFetcher {
    pub fn new(client: Arc<dyn CommissionQueryClient>) -> Self {
        Self { client }
    }

    pub async fn fetch(
        &self,
        height: u64,
        validator: &Validator,
    ) -> Result<ValidatorCommissionAmount> {
        let coins = self
            .client
            .validator_commission(validator.operator_address(), height)
            .await
            .with_context(|| {
                format!(
                    "error while getting commission of validator {} at height {height}",
                    validator.operator_address()
                )
            })?;

        Ok(ValidatorCommissionAmount::new(validator, coins, height))
    }
}

use crate::domain::{Validator, ValidatorCommissionAmount};
use crate::store::CommissionStore;
use anyhow::{anyhow, bail, Result};
use futures::future::BoxFuture;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// How a commission write treats an already stored record for the same validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteOrdering {
    /// Every write replaces the stored record, whatever its height.
    #[default]
    LastWriteWins,
    /// Writes older than the stored record are dropped.
    MonotonicHeight,
}

/// In-memory registry and commission table.
///
/// Clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
    ordering: WriteOrdering,
}

#[derive(Debug, Default)]
struct MemoryInner {
    validators: BTreeMap<String, Validator>,
    commissions: HashMap<String, ValidatorCommissionAmount>,
    write_attempts: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ordering(ordering: WriteOrdering) -> Self {
        Self {
            inner: Arc::default(),
            ordering,
        }
    }

    pub fn ordering(&self) -> WriteOrdering {
        self.ordering
    }

    /// Inserts or replaces a registry entry keyed by operator address.
    pub fn upsert_validator(&self, validator: Validator) -> Result<()> {
        let mut inner = self.write_guard()?;
        inner
            .validators
            .insert(validator.operator_address().to_owned(), validator);
        Ok(())
    }

    pub fn validator_commission(
        &self,
        operator_address: &str,
    ) -> Result<Option<ValidatorCommissionAmount>> {
        let inner = self.read_guard()?;
        Ok(inner.commissions.get(operator_address).cloned())
    }

    pub fn commission_count(&self) -> Result<usize> {
        Ok(self.read_guard()?.commissions.len())
    }

    /// Number of save calls that reached the table, including dropped stale writes.
    pub fn write_attempts(&self) -> Result<u64> {
        Ok(self.read_guard()?.write_attempts)
    }

    fn store_commission(&self, amount: ValidatorCommissionAmount) -> Result<()> {
        let mut inner = self.write_guard()?;
        inner.write_attempts = inner.write_attempts.saturating_add(1);

        if !inner.validators.contains_key(amount.operator_address()) {
            bail!(
                "validator {} is not registered; refusing commission write",
                amount.operator_address()
            );
        }

        if self.ordering == WriteOrdering::MonotonicHeight {
            if let Some(existing) = inner.commissions.get(amount.operator_address()) {
                if existing.height() > amount.height() {
                    tracing::trace!(
                        validator = amount.operator_address(),
                        stored_height = existing.height(),
                        incoming_height = amount.height(),
                        "dropping commission write older than stored snapshot"
                    );
                    return Ok(());
                }
            }
        }

        inner
            .commissions
            .insert(amount.operator_address().to_owned(), amount);
        Ok(())
    }

    fn read_guard(&self) -> Result<RwLockReadGuard<'_, MemoryInner>> {
        self.inner
            .read()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }

    fn write_guard(&self) -> Result<RwLockWriteGuard<'_, MemoryInner>> {
        self.inner
            .write()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

impl CommissionStore for MemoryStore {
    fn get_validators(&self) -> BoxFuture<'_, Result<Vec<Validator>>> {
        Box::pin(async move {
            let inner = self.read_guard()?;
            Ok(inner.validators.values().cloned().collect())
        })
    }

    fn has_validator_commission(&self) -> BoxFuture<'_, Result<bool>> {
        Box::pin(async move { Ok(!self.read_guard()?.commissions.is_empty()) })
    }

    fn save_validator_commission_amount(
        &self,
        amount: ValidatorCommissionAmount,
    ) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move { self.store_commission(amount) })
    }
}

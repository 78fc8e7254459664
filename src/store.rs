//! Persistence contract for the validator registry and commission snapshots,
//! together with an in-process implementation.

pub mod memory;

use crate::domain::{Validator, ValidatorCommissionAmount};
use anyhow::Result;
use futures::future::BoxFuture;

pub use memory::{MemoryStore, WriteOrdering};

/// Typed read/write operations the refresh job needs from the database.
///
/// Implementations are shared across every concurrently running refresh task
/// and must tolerate concurrent calls on their own.
pub trait CommissionStore: Send + Sync {
    /// Returns every validator currently present in the registry.
    fn get_validators(&self) -> BoxFuture<'_, Result<Vec<Validator>>>;

    /// Reports whether a commission snapshot exists for at least one validator.
    fn has_validator_commission(&self) -> BoxFuture<'_, Result<bool>>;

    /// Upserts the snapshot keyed by the record's operator address.
    fn save_validator_commission_amount(
        &self,
        amount: ValidatorCommissionAmount,
    ) -> BoxFuture<'_, Result<()>>;
}

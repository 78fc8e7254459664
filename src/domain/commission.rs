use crate::domain::validator::Validator;
use serde::{Deserialize, Serialize};

/// A single denomination of accrued commission, with the amount kept as the
/// decimal string reported by the ledger so no precision is lost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecCoin {
    pub denom: String,
    pub amount: String,
}

impl DecCoin {
    pub fn new(denom: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }
}

/// Snapshot of a validator's accrued commission as of a specific height.
///
/// Records are built once per successful fetch and never mutated; the store
/// keeps one record per operator address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorCommissionAmount {
    operator_address: String,
    self_delegate_address: String,
    amount: Vec<DecCoin>,
    height: u64,
}

impl ValidatorCommissionAmount {
    pub fn new(validator: &Validator, amount: Vec<DecCoin>, height: u64) -> Self {
        Self {
            operator_address: validator.operator_address().to_owned(),
            self_delegate_address: validator.self_delegate_address().to_owned(),
            amount,
            height,
        }
    }

    /// Record carrying the validator identity and height but no coins. Written
    /// in place of a fetched record when the fetch fails and the refresh is
    /// configured to mark the validator as stale.
    pub fn zero_value(validator: &Validator, height: u64) -> Self {
        Self::new(validator, Vec::new(), height)
    }

    pub fn operator_address(&self) -> &str {
        &self.operator_address
    }

    pub fn self_delegate_address(&self) -> &str {
        &self.self_delegate_address
    }

    pub fn amount(&self) -> &[DecCoin] {
        &self.amount
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.amount.is_empty()
    }
}

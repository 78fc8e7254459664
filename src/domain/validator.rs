use serde::{Deserialize, Serialize};

/// Identity of a validator as supplied by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Validator {
    operator_address: String,
    self_delegate_address: String,
}

impl Validator {
    pub fn new(
        operator_address: impl Into<String>,
        self_delegate_address: impl Into<String>,
    ) -> Self {
        Self {
            operator_address: operator_address.into(),
            self_delegate_address: self_delegate_address.into(),
        }
    }

    /// Stable registry key (`cosmosvaloper1...`).
    pub fn operator_address(&self) -> &str {
        &self.operator_address
    }

    pub fn self_delegate_address(&self) -> &str {
        &self.self_delegate_address
    }
}

//! Domain records shared by the ledger client, the commission store, and the
//! refresh job.

pub mod commission;
pub mod validator;

pub use commission::{DecCoin, ValidatorCommissionAmount};
pub use validator::Validator;

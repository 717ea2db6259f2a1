//! Validation rules for consensus
//!
//! Headers and bodies are first checked in isolation, then against the DAG
//! context. Transaction rules in UTXO context only decide acceptance.

pub mod block_validator;
pub mod contextual;
pub mod header_validator;
pub mod transaction_validator;

pub use block_validator::BlockValidator;
pub use contextual::{ContextualValidator, ExpectedHeaderFields};
pub use header_validator::HeaderValidator;
pub use transaction_validator::{TransactionValidator, TxRuleError};

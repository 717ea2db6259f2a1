use thiserror::Error;

use crate::tx::TransactionOutpoint;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UtxoAlgebraError {
    #[error("outpoint {0} both in base and in added entries")]
    DuplicateAddPoint(TransactionOutpoint),

    #[error("outpoint {0} both in base and in removed entries")]
    DuplicateRemovePoint(TransactionOutpoint),

    #[error("outpoint {0} removed twice")]
    DoubleRemoval(TransactionOutpoint),
}

pub type UtxoResult<T> = std::result::Result<T, UtxoAlgebraError>;

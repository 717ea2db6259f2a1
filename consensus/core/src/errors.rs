use thiserror::Error;

use crate::{
    reachability::ReachabilityError,
    tx::{TransactionId, TransactionOutpoint},
    utxo::UtxoAlgebraError,
    BlueWorkType, Hash,
};

/// Consensus rule violations of a submitted block
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("wrong block version: got {0}")]
    WrongBlockVersion(u16),

    #[error("block has no parents")]
    NoParents,

    #[error("block has too many parents: got {0} when the limit is {1}")]
    TooManyParents(usize, usize),

    #[error("block has duplicate parent {0}")]
    DuplicateParents(Hash),

    #[error("block hash does not meet its target")]
    InvalidPoW,

    #[error("header claims hash {0} but hashes to {1}")]
    BadHeaderHash(Hash, Hash),

    #[error("expected header merkle root {0} but got {1}")]
    BadMerkleRoot(Hash, Hash),

    #[error("block has no transactions")]
    NoTransactions,

    #[error("first transaction in block is not a coinbase")]
    FirstTxNotCoinbase,

    #[error("block has a second coinbase at index {0}")]
    MultipleCoinbases(usize),

    #[error("block has duplicate transaction {0}")]
    DuplicateTransactions(TransactionId),

    #[error("block spends outpoint {0} more than once")]
    DoubleSpendInSameBlock(TransactionOutpoint),

    #[error("transaction {0} spends outputs of a transaction placed at or after it in the same block")]
    TxMissingInputs(TransactionId),

    #[error("coinbase pays {0} which is above the subsidy {1}")]
    BadCoinbaseAmount(u64, u64),

    #[error("block mass {0} exceeds the limit {1}")]
    ExceedsMaxBlockMass(u64, u64),

    #[error("transaction {0} is not finalized at lock time {1}")]
    UnfinalizedTransaction(TransactionId, u64),

    #[error("expected blue score {0} but got {1}")]
    UnexpectedBlueScore(u64, u64),

    #[error("expected blue work {0} but got {1}")]
    UnexpectedBlueWork(BlueWorkType, BlueWorkType),

    #[error("expected DAA score {0} but got {1}")]
    UnexpectedDaaScore(u64, u64),

    #[error("expected header pruning point {0} but got {1}")]
    WrongHeaderPruningPoint(Hash, Hash),

    #[error("parent {0} is invalid")]
    InvalidParent(Hash),

    #[error("parent {0} is an ancestor of parent {1}")]
    InvalidParentsRelation(Hash, Hash),

    #[error("block is missing parents: {0:?}")]
    MissingParents(Vec<Hash>),

    #[error("block timestamp {0} is too far into the future, max allowed is {1}")]
    TimeTooFarIntoTheFuture(u64, u64),

    #[error("expected difficulty bits {0:#010x} but got {1:#010x}")]
    UnexpectedDifficulty(u32, u32),

    #[error("block timestamp {0} is not after past median time {1}")]
    TimeTooOld(u64, u64),

    #[error("block violates the bounded merge depth")]
    ViolatingBoundedMergeDepth,

    #[error("block chain does not contain the finality point {0}")]
    ViolatingFinality(Hash),

    #[error("selected parent {0} is disqualified from chain")]
    DisqualifiedSelectedParent(Hash),

    #[error("block {0} is known to be invalid")]
    KnownInvalid(Hash),
}

impl RuleError {
    /// Valid-but-disqualified violations. The block is stored with status `DisqualifiedFromChain`.
    pub fn is_context_rule(&self) -> bool {
        matches!(
            self,
            RuleError::UnexpectedDifficulty(..)
                | RuleError::TimeTooOld(..)
                | RuleError::ViolatingBoundedMergeDepth
                | RuleError::ViolatingFinality(_)
                | RuleError::DisqualifiedSelectedParent(_)
        )
    }

    /// Errors which leave no trace in storage
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RuleError::MissingParents(_)
                | RuleError::TimeTooFarIntoTheFuture(..)
                | RuleError::KnownInvalid(_)
                | RuleError::BadHeaderHash(..)
        )
    }

    /// Violations which make the block permanently `Invalid`
    pub fn is_structural(&self) -> bool {
        !self.is_context_rule() && !self.is_transient()
    }
}

pub type BlockProcessResult<T> = std::result::Result<T, RuleError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("{0}")]
    Rule(#[from] RuleError),

    #[error("unknown block {0}")]
    UnknownBlock(Hash),

    #[error("missing GHOSTDAG data of block {0}")]
    MissingGhostdagData(Hash),

    #[error("reachability error: {0}")]
    Reachability(#[from] ReachabilityError),

    #[error("utxo algebra error: {0}")]
    UtxoAlgebra(#[from] UtxoAlgebraError),

    #[error("database error: {0}")]
    Db(String),

    #[error("expected pruning point {0} but got {1}")]
    UnexpectedPruningPoint(Hash, Hash),

    #[error("{0} is not in the selected chain of {1}")]
    BadLocatorQuery(Hash, Hash),

    #[error("invalid consensus params: {0}")]
    InvalidParams(String),

    #[error("{0}")]
    General(String),
}

pub type ConsensusResult<T> = std::result::Result<T, ConsensusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_classification() {
        assert!(RuleError::TimeTooOld(1, 2).is_context_rule());
        assert!(!RuleError::TimeTooOld(1, 2).is_structural());
        assert!(RuleError::InvalidPoW.is_structural());
        assert!(RuleError::MissingParents(vec![]).is_transient());
        // The claimed hash names some other block, which must not be marked
        assert!(RuleError::BadHeaderHash(Hash::default(), Hash::default()).is_transient());
        assert!(!RuleError::TimeTooFarIntoTheFuture(5, 1).is_structural());
        assert!(RuleError::WrongHeaderPruningPoint(Hash::default(), Hash::default()).is_structural());
    }

    #[test]
    fn test_rule_error_converts_into_consensus_error() {
        let err: ConsensusError = RuleError::NoParents.into();
        assert_eq!(err, ConsensusError::Rule(RuleError::NoParents));
        assert_eq!(err.to_string(), "block has no parents");
    }
}

//! Body processor for consensus
//!
//! Checks block bodies and stages them. A body is only accepted once every
//! parent has its body, so the set of blocks with bodies stays closed under past.

use crate::consensus::services::ConsensusServices;
use crate::consensus::storage::ConsensusStorage;
use crate::consensus::validation::TransactionValidator;
use consensus_core::block::Block;
use consensus_core::errors::{BlockProcessResult, ConsensusResult, RuleError};
use consensus_core::header::Header;
use consensus_core::tx::Transaction;
use consensus_core::Hash;
use database::StagingArea;
use std::sync::Arc;

pub struct BodyProcessor {
    storage: Arc<ConsensusStorage>,
    services: Arc<ConsensusServices>,
}

impl BodyProcessor {
    pub fn new(storage: Arc<ConsensusStorage>, services: Arc<ConsensusServices>) -> Self {
        Self { storage, services }
    }

    pub fn validate_body_in_isolation(&self, block: &Block) -> BlockProcessResult<()> {
        self.services.block_validator.validate_body_in_isolation(block)
    }

    /// Whether the transactions are the ones the header commits to
    pub fn check_body_matches_header(&self, block: &Block) -> BlockProcessResult<()> {
        self.services.block_validator.check_merkle_root(block)
    }

    /// Lock times are checked against the block's own DAA score and past median time
    pub fn validate_body_in_context(&self, block: &Block, daa_score: u64, past_median_time: u64) -> BlockProcessResult<()> {
        TransactionValidator::check_transactions_finalized(&block.transactions, daa_score, past_median_time)
    }

    pub fn check_parent_bodies_exist(&self, staging: &StagingArea, header: &Header) -> ConsensusResult<BlockProcessResult<()>> {
        let mut missing = Vec::new();
        for &parent in header.direct_parents() {
            if !self.storage.block_transactions.has(staging, parent)? {
                missing.push(parent);
            }
        }
        if missing.is_empty() {
            Ok(Ok(()))
        } else {
            Ok(Err(RuleError::MissingParents(missing)))
        }
    }

    /// Stores the transactions without touching body tips
    pub fn stage_transactions(&self, staging: &mut StagingArea, hash: Hash, transactions: Arc<Vec<Transaction>>) -> ConsensusResult<()> {
        Ok(self.storage.block_transactions.insert(staging, hash, transactions)?)
    }

    /// Stores the transactions and makes the block a body tip in place of its parents
    pub fn stage_body(&self, staging: &mut StagingArea, header: &Header, transactions: Arc<Vec<Transaction>>) -> ConsensusResult<()> {
        self.stage_transactions(staging, header.hash, transactions)?;
        let mut body_tips = self.storage.metadata.get_body_tips(staging)?.as_ref().clone();
        for parent in header.direct_parents() {
            body_tips.remove(parent);
        }
        body_tips.insert(header.hash);
        self.storage.metadata.set_body_tips(staging, body_tips)?;
        Ok(())
    }
}

//! Sync support queries
//!
//! Read-only traversals a syncing peer asks for: which bodies are still
//! missing, which blocks lie between two points, and block locators along the
//! headers selected chain.

use crate::consensus::dag::ReachabilityService;
use crate::consensus::ghostdag::GhostdagManager;
use consensus_core::errors::{ConsensusError, ConsensusResult};
use consensus_core::{BlockHashSet, Hash};
use database::stores::{BlockTransactionsStore, GhostdagStore, MetadataStore, RelationsStore};
use database::{StagingArea, StoreResultExtensions};
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Clone)]
pub struct SyncManager {
    ghostdag_manager: GhostdagManager,
    ghostdag_store: GhostdagStore,
    relations_store: RelationsStore,
    block_transactions_store: BlockTransactionsStore,
    metadata_store: MetadataStore,
    reachability: Arc<dyn ReachabilityService>,
}

impl SyncManager {
    pub fn new(
        ghostdag_manager: GhostdagManager,
        ghostdag_store: GhostdagStore,
        relations_store: RelationsStore,
        block_transactions_store: BlockTransactionsStore,
        metadata_store: MetadataStore,
        reachability: Arc<dyn ReachabilityService>,
    ) -> Self {
        Self { ghostdag_manager, ghostdag_store, relations_store, block_transactions_store, metadata_store, reachability }
    }

    fn parents(&self, staging: &StagingArea, hash: Hash) -> ConsensusResult<Arc<Vec<Hash>>> {
        self.relations_store.get_parents(staging, hash).optional()?.ok_or(ConsensusError::UnknownBlock(hash))
    }

    /// Blocks in the past of `high` (inclusive) whose bodies are missing, in topological order.
    /// Blocks below the pruning point never get bodies again and are not reported.
    pub fn get_missing_block_body_hashes(&self, staging: &StagingArea, high: Hash) -> ConsensusResult<Vec<Hash>> {
        let pruning_point = self.metadata_store.get_pruning_point(staging)?;
        let mut queue = VecDeque::from([high]);
        let mut visited = BlockHashSet::from([high]);
        let mut missing = Vec::new();

        while let Some(block) = queue.pop_front() {
            if self.block_transactions_store.has(staging, block)? {
                continue;
            }
            if self.reachability.is_dag_ancestor_of(staging, block, pruning_point)? {
                continue;
            }
            missing.push(block);
            for &parent in self.parents(staging, block)?.iter() {
                if visited.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }
        self.ghostdag_manager.sort_blocks(staging, missing)
    }

    /// Blocks in `past(high) ∪ {high}` outside `past(low) ∪ {low}`, ordered by blue work.
    /// Returns at most `max_blocks` of them and the highest one returned, or `low` when none.
    pub fn get_hashes_between(&self, staging: &StagingArea, low: Hash, high: Hash, max_blocks: usize) -> ConsensusResult<(Vec<Hash>, Hash)> {
        if !self.relations_store.has(staging, low)? {
            return Err(ConsensusError::UnknownBlock(low));
        }
        let mut queue = VecDeque::from([high]);
        let mut visited = BlockHashSet::from([high]);
        let mut between = Vec::new();

        while let Some(block) = queue.pop_front() {
            if self.reachability.is_dag_ancestor_of(staging, block, low)? {
                continue;
            }
            between.push(block);
            for &parent in self.parents(staging, block)?.iter() {
                if visited.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }

        let mut sorted = self.ghostdag_manager.sort_blocks(staging, between)?;
        sorted.truncate(max_blocks);
        let highest = sorted.last().copied().unwrap_or(low);
        Ok((sorted, highest))
    }

    /// Selected chain hashes from `high` down to `low` with exponentially growing blue score steps.
    /// `low` must be a chain ancestor of `high`.
    pub fn create_selected_chain_block_locator(&self, staging: &StagingArea, low: Hash, high: Hash) -> ConsensusResult<Vec<Hash>> {
        if !self.reachability.is_chain_ancestor_of(staging, low, high)? {
            return Err(ConsensusError::BadLocatorQuery(low, high));
        }
        let low_blue_score = self.blue_score(staging, low)?;

        let mut locator = Vec::new();
        let mut current = high;
        let mut step = 1u64;
        loop {
            locator.push(current);
            if current == low {
                break;
            }
            let target = self.blue_score(staging, current)?.saturating_sub(step);
            if target <= low_blue_score {
                current = low;
            } else {
                while self.blue_score(staging, current)? > target {
                    current = self.ghostdag_store.get_selected_parent(staging, current)?;
                }
            }
            step = step.saturating_mul(2);
        }
        Ok(locator)
    }

    fn blue_score(&self, staging: &StagingArea, hash: Hash) -> ConsensusResult<u64> {
        self.ghostdag_store.get_blue_score(staging, hash).optional()?.ok_or(ConsensusError::MissingGhostdagData(hash))
    }
}

//! Pruning point management
//!
//! The pruning point is a selected chain block `pruning_depth` below the virtual,
//! aligned to finality windows. Every header commits to the pruning point expected
//! from its selected parent's view. When the point moves, the pruning UTXO set is
//! rolled forward and block data in its past may be deleted.

use crate::consensus::dag::ReachabilityService;
use crate::process::depth::DepthManager;
use consensus_core::blockstatus::BlockStatus;
use consensus_core::errors::{ConsensusError, ConsensusResult};
use consensus_core::ghostdag::GhostdagData;
use consensus_core::tx::{TransactionOutpoint, UtxoEntry};
use consensus_core::{BlockHashSet, Hash, ORIGIN, ZERO_HASH};
use database::stores::{
    AcceptanceDataStore, BlockTransactionsStore, GhostdagStore, HeaderStore, MetadataStore, RelationsStore, StatusesStore,
    UtxoDiffsStore, UtxoSetStore,
};
use database::{StagingArea, StoreResultExtensions};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct PruningManager {
    genesis_hash: Hash,
    finality_depth: u64,
    pruning_depth: u64,
    enable_pruning: bool,

    depth_manager: DepthManager,
    reachability: Arc<dyn ReachabilityService>,

    headers_store: HeaderStore,
    ghostdag_store: GhostdagStore,
    relations_store: RelationsStore,
    statuses_store: StatusesStore,
    metadata_store: MetadataStore,
    block_transactions_store: BlockTransactionsStore,
    utxo_diffs_store: UtxoDiffsStore,
    acceptance_data_store: AcceptanceDataStore,
    pruning_utxo_set: UtxoSetStore,
}

impl PruningManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        genesis_hash: Hash,
        finality_depth: u64,
        pruning_depth: u64,
        enable_pruning: bool,
        depth_manager: DepthManager,
        reachability: Arc<dyn ReachabilityService>,
        headers_store: HeaderStore,
        ghostdag_store: GhostdagStore,
        relations_store: RelationsStore,
        statuses_store: StatusesStore,
        metadata_store: MetadataStore,
        block_transactions_store: BlockTransactionsStore,
        utxo_diffs_store: UtxoDiffsStore,
        acceptance_data_store: AcceptanceDataStore,
        pruning_utxo_set: UtxoSetStore,
    ) -> Self {
        Self {
            genesis_hash,
            finality_depth,
            pruning_depth,
            enable_pruning,
            depth_manager,
            reachability,
            headers_store,
            ghostdag_store,
            relations_store,
            statuses_store,
            metadata_store,
            block_transactions_store,
            utxo_diffs_store,
            acceptance_data_store,
            pruning_utxo_set,
        }
    }

    fn blue_score(&self, staging: &StagingArea, hash: Hash) -> ConsensusResult<u64> {
        self.ghostdag_store.get_blue_score(staging, hash).optional()?.ok_or(ConsensusError::MissingGhostdagData(hash))
    }

    /// The pruning point a block with this GHOSTDAG data must carry in its header
    pub fn expected_header_pruning_point(&self, staging: &StagingArea, ghostdag_data: &GhostdagData) -> ConsensusResult<Hash> {
        let Some(target) = self.depth_manager.finality_window_target(ghostdag_data.blue_score, self.pruning_depth) else {
            return Ok(self.genesis_hash);
        };
        let selected_parent = ghostdag_data.selected_parent;
        if selected_parent == ORIGIN {
            return Ok(self.genesis_hash);
        }

        let start = if selected_parent == self.genesis_hash {
            self.genesis_hash
        } else {
            let pruning_point = self.headers_store.get_header(staging, selected_parent)?.pruning_point;
            if pruning_point == ZERO_HASH {
                self.genesis_hash
            } else {
                pruning_point
            }
        };
        self.depth_manager.first_chain_block_at_or_above(staging, start, selected_parent, target)
    }

    /// Advances the stored pruning point to the one expected by the virtual, if higher
    pub fn find_next_pruning_point(&self, staging: &mut StagingArea, virtual_ghostdag_data: &GhostdagData) -> ConsensusResult<()> {
        let current = self.metadata_store.get_pruning_point(staging)?;
        let candidate = self.expected_header_pruning_point(staging, virtual_ghostdag_data)?;
        if candidate == current || self.blue_score(staging, candidate)? <= self.blue_score(staging, current)? {
            return Ok(());
        }
        if !self.reachability.is_chain_ancestor_of(staging, current, candidate)? {
            debug!("pruning point candidate {} is not in the selected chain of {}", candidate, current);
            return Ok(());
        }

        self.advance_pruning_utxo_set(staging, current, candidate)?;
        if self.enable_pruning {
            self.prune_block_data(staging, current, candidate)?;
        }
        self.metadata_store.set_pruning_point(staging, candidate)?;
        info!("pruning point moved from {} to {}", current, candidate);
        Ok(())
    }

    /// Applies the UTXO diffs of the chain blocks in `(from, to]` onto the pruning UTXO set
    fn advance_pruning_utxo_set(&self, staging: &mut StagingArea, from: Hash, to: Hash) -> ConsensusResult<()> {
        let position = self.metadata_store.get_pruning_utxoset_position(staging)?;
        if position != from {
            return Err(ConsensusError::General(format!("pruning UTXO set is at {position} but the pruning point is {from}")));
        }
        let chain = self.reachability.forward_chain(staging, from, to)?;
        for &block in chain.iter().skip(1) {
            let diff = self.utxo_diffs_store.read(staging, block)?;
            self.pruning_utxo_set.write_diff(staging, &diff)?;
        }
        self.metadata_store.set_pruning_utxoset_position(staging, to)?;
        Ok(())
    }

    /// Deletes bodies, UTXO diffs and acceptance data of `past(new) \ past(old)`. Headers,
    /// relations, GHOSTDAG and reachability data are kept.
    fn prune_block_data(&self, staging: &mut StagingArea, old_pruning_point: Hash, new_pruning_point: Hash) -> ConsensusResult<()> {
        let parents = self.relations_store.get_parents(staging, new_pruning_point)?;
        let mut queue: VecDeque<Hash> = parents.iter().copied().collect();
        let mut visited: BlockHashSet = queue.iter().copied().collect();
        let mut pruned = 0usize;

        while let Some(block) = queue.pop_front() {
            if block != old_pruning_point && self.reachability.is_dag_ancestor_of(staging, block, old_pruning_point)? {
                continue;
            }
            self.block_transactions_store.delete(staging, block)?;
            self.utxo_diffs_store.delete(staging, block)?;
            self.acceptance_data_store.delete(staging, block)?;
            pruned += 1;

            for &parent in self.relations_store.get_parents(staging, block)?.iter() {
                if visited.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }
        debug!("pruned block data of {} blocks below {}", pruned, new_pruning_point);
        Ok(())
    }

    /// Whether `hash` may serve as a pruning point given the current sink
    pub fn is_valid_pruning_point(&self, staging: &StagingArea, hash: Hash, sink: Hash) -> ConsensusResult<bool> {
        match self.statuses_store.get_optional(staging, hash)? {
            None | Some(BlockStatus::StatusInvalid) => return Ok(false),
            Some(_) => {}
        }

        let current = self.metadata_store.get_pruning_point(staging)?;
        if hash == current {
            return Ok(true);
        }
        if !self.reachability.is_chain_ancestor_of(staging, hash, sink)? {
            return Ok(false);
        }

        let blue_score = self.blue_score(staging, hash)?;
        if self.blue_score(staging, sink)?.saturating_sub(blue_score) < self.pruning_depth {
            return Ok(false);
        }
        if blue_score < self.blue_score(staging, current)? || !self.reachability.is_chain_ancestor_of(staging, current, hash)? {
            return Ok(false);
        }
        self.is_window_aligned(staging, hash, blue_score)
    }

    /// A pruning point opens a finality window: its selected parent is below the window start
    fn is_window_aligned(&self, staging: &StagingArea, hash: Hash, blue_score: u64) -> ConsensusResult<bool> {
        if hash == self.genesis_hash {
            return Ok(true);
        }
        let window_start = blue_score / self.finality_depth * self.finality_depth;
        let selected_parent = self.ghostdag_store.get_selected_parent(staging, hash)?;
        Ok(self.blue_score(staging, selected_parent)? < window_start)
    }

    /// A page of the pruning point UTXO set in outpoint order, strictly after `from_outpoint`
    pub fn get_pruning_point_utxos(
        &self,
        staging: &StagingArea,
        expected_pruning_point: Hash,
        from_outpoint: Option<TransactionOutpoint>,
        chunk_size: usize,
    ) -> ConsensusResult<Vec<(TransactionOutpoint, UtxoEntry)>> {
        let pruning_point = self.metadata_store.get_pruning_point(staging)?;
        if expected_pruning_point != pruning_point {
            return Err(ConsensusError::UnexpectedPruningPoint(pruning_point, expected_pruning_point));
        }

        let mut entries = self.pruning_utxo_set.iterate_from(from_outpoint.as_ref(), chunk_size.saturating_add(1))?;
        if let (Some(from), Some((first, _))) = (from_outpoint, entries.first()) {
            if *first == from {
                entries.remove(0);
            }
        }
        entries.truncate(chunk_size);
        Ok(entries)
    }
}

//! Virtual processor for consensus
//!
//! Resolves the virtual block after every body insertion: picks the sink among
//! the body tips, moves the sink UTXO set along the selected chain, and stages
//! the new virtual state together with the finality and pruning points.

use crate::consensus::services::ConsensusServices;
use crate::consensus::storage::{ConsensusStorage, StoreUtxoView};
use consensus_core::blockstatus::BlockStatus;
use consensus_core::errors::{ConsensusError, ConsensusResult};
use consensus_core::ghostdag::{GhostdagData, SortableBlock};
use consensus_core::utxo::{ComposedUtxoView, UtxoDiff};
use consensus_core::Hash;
use database::stores::VirtualState;
use database::{StagingArea, StoreResultExtensions};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct VirtualProcessor {
    storage: Arc<ConsensusStorage>,
    services: Arc<ConsensusServices>,
}

impl VirtualProcessor {
    pub fn new(storage: Arc<ConsensusStorage>, services: Arc<ConsensusServices>) -> Self {
        Self { storage, services }
    }

    fn blue_score(&self, staging: &StagingArea, hash: Hash) -> ConsensusResult<u64> {
        self.storage.ghostdag.get_blue_score(staging, hash).optional()?.ok_or(ConsensusError::MissingGhostdagData(hash))
    }

    /// Re-evaluates the sink and the virtual state. Returns the new sink.
    pub fn resolve_virtual(&self, staging: &mut StagingArea) -> ConsensusResult<Hash> {
        let prev_sink = self.storage.virtual_state.get(staging)?.sink();
        let virtual_finality_point = self.storage.metadata.get_virtual_finality_point(staging)?;

        let (sink, tips) = self.select_sink(staging, prev_sink, virtual_finality_point)?;
        if sink != prev_sink {
            self.move_sink(staging, prev_sink, sink)?;
        }

        let virtual_ghostdag_data = self.update_virtual_state(staging, sink, tips)?;

        let finality_point = self.services.depth_manager.calc_finality_point(staging, &virtual_ghostdag_data)?;
        if self.blue_score(staging, finality_point)? > self.blue_score(staging, virtual_finality_point)? {
            debug!("virtual finality point moved from {} to {}", virtual_finality_point, finality_point);
            self.storage.metadata.set_virtual_finality_point(staging, finality_point)?;
        }
        self.services.pruning_manager.find_next_pruning_point(staging, &virtual_ghostdag_data)?;
        self.services.reachability_manager.hint_virtual_selected_parent(staging, sink)?;

        if sink != prev_sink {
            info!("sink moved from {} to {} (blue score {})", prev_sink, sink, self.blue_score(staging, sink)?);
        }
        Ok(sink)
    }

    /// The chain-eligible body tip with the most blue work whose chain holds the
    /// virtual finality point. Tips failing finality are disqualified on the way.
    fn select_sink(&self, staging: &mut StagingArea, prev_sink: Hash, virtual_finality_point: Hash) -> ConsensusResult<(Hash, Vec<Hash>)> {
        let mut body_tips = self.storage.metadata.get_body_tips(staging)?.as_ref().clone();
        let mut candidates = Vec::with_capacity(body_tips.len());
        for &tip in body_tips.iter() {
            let blue_work = self.storage.ghostdag.get_blue_work(staging, tip)?;
            candidates.push(SortableBlock::new(tip, blue_work));
        }
        candidates.sort_by(|a, b| b.cmp(a));

        let mut eligible = Vec::with_capacity(candidates.len());
        let mut disqualified = false;
        for SortableBlock { hash, .. } in candidates {
            if !self.storage.statuses.get(staging, hash)?.is_chain_eligible() {
                continue;
            }
            if !self.services.reachability_service.is_chain_ancestor_of(staging, virtual_finality_point, hash)? {
                warn!("body tip {} violates finality point {} and is disqualified from chain", hash, virtual_finality_point);
                self.storage.statuses.set(staging, hash, BlockStatus::StatusDisqualifiedFromChain)?;
                body_tips.remove(&hash);
                disqualified = true;
                continue;
            }
            eligible.push(hash);
        }
        if disqualified {
            self.storage.metadata.set_body_tips(staging, body_tips)?;
        }

        let sink = eligible.first().copied().unwrap_or(prev_sink);
        Ok((sink, eligible))
    }

    /// Moves the sink UTXO set from `prev_sink` to `new_sink` through their common chain ancestor.
    /// Chain blocks reached for the first time get their UTXO diff and acceptance data computed.
    fn move_sink(&self, staging: &mut StagingArea, prev_sink: Hash, new_sink: Hash) -> ConsensusResult<()> {
        let reachability = &self.services.reachability_service;
        let mut diff = UtxoDiff::default();

        let mut current = prev_sink;
        let mut removed = 0usize;
        while !reachability.is_chain_ancestor_of(staging, current, new_sink)? {
            let block_diff = self.storage.utxo_diffs.read(staging, current)?;
            diff.with_diff_in_place(&block_diff.as_reversed())?;
            self.storage.statuses.set(staging, current, BlockStatus::StatusUTXOPendingVerification)?;
            current = self.storage.ghostdag.get_selected_parent(staging, current)?;
            removed += 1;
        }

        let added = reachability.forward_chain(staging, current, new_sink)?;
        for &block in added.iter().skip(1) {
            let block_diff = match self.storage.utxo_diffs.get(staging, block)? {
                Some(block_diff) => block_diff,
                None => self.calc_chain_block_diff(staging, block, &diff)?,
            };
            diff.with_diff_in_place(&block_diff)?;
            self.storage.statuses.set(staging, block, BlockStatus::StatusUTXOValid)?;
        }
        if removed > 0 {
            debug!("reorg through {}: {} chain blocks removed, {} added", current, removed, added.len() - 1);
        }

        self.storage.sink_utxo_set.write_diff(staging, &diff)?;
        Ok(())
    }

    /// Stages the UTXO diff and acceptance data of a new chain block. `pending` is the
    /// diff from the sink UTXO set to the block's selected parent.
    fn calc_chain_block_diff(&self, staging: &mut StagingArea, block: Hash, pending: &UtxoDiff) -> ConsensusResult<Arc<UtxoDiff>> {
        let ghostdag_data = self.storage.ghostdag.get_data(staging, block)?;
        let daa_score = self.storage.headers.get_daa_score(staging, block)?;
        let past_median_time = self.services.past_median_time_manager.calc_past_median_time(staging, &ghostdag_data)?;
        let acceptance = {
            let sink_view = StoreUtxoView::new(&self.storage.sink_utxo_set, staging);
            let view = ComposedUtxoView::new(&sink_view, pending);
            self.services.acceptance_manager.calc_mergeset_acceptance(staging, &ghostdag_data, daa_score, past_median_time, &view)?
        };
        let block_diff = Arc::new(acceptance.utxo_diff);
        self.storage.utxo_diffs.insert(staging, block, block_diff.clone())?;
        self.storage.acceptance.insert(staging, block, Arc::new(acceptance.acceptance_data))?;
        Ok(block_diff)
    }

    /// Stages the virtual state over the sink and the given tips. The sink UTXO set must
    /// already be at `sink`.
    pub fn update_virtual_state(&self, staging: &mut StagingArea, sink: Hash, tips: Vec<Hash>) -> ConsensusResult<GhostdagData> {
        let services = &self.services;
        let parents = services.parents_builder.pick_virtual_parents(staging, sink, tips)?;
        let ghostdag_data = services.ghostdag_manager.ghostdag_for_virtual(staging, &parents)?;
        let (bits, daa_score, _) = services.difficulty_manager.calc_difficulty_and_daa(staging, &ghostdag_data)?;
        let past_median_time = services.past_median_time_manager.calc_past_median_time(staging, &ghostdag_data)?;
        let acceptance = {
            let sink_view = StoreUtxoView::new(&self.storage.sink_utxo_set, staging);
            services.acceptance_manager.calc_mergeset_acceptance(staging, &ghostdag_data, daa_score, past_median_time, &sink_view)?
        };

        let state = VirtualState {
            parents,
            ghostdag_data: ghostdag_data.clone(),
            daa_score,
            bits,
            past_median_time,
            accepted_tx_ids: acceptance.accepted_tx_ids(),
            utxo_diff: acceptance.utxo_diff,
        };
        self.storage.virtual_state.set(staging, state)?;
        Ok(ghostdag_data)
    }
}

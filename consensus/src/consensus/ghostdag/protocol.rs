//! GHOSTDAG coloring.
//!
//! The selected parent is the parent with the highest blue work. The merge set
//! (the past of the block not in the past of the selected parent) is visited
//! in ascending (blue work, hash) order; each candidate is colored blue unless
//! that would give it, or some blue in its anticone, more than `k` blue blocks
//! in the anticone.

use crate::consensus::dag::ReachabilityService;
use consensus_core::difficulty::calc_work;
use consensus_core::errors::{ConsensusError, ConsensusResult};
use consensus_core::ghostdag::{GhostdagData, SortableBlock};
use consensus_core::{BlockHashMap, BlueWorkType, Hash, KType, ORIGIN};
use database::stores::{GhostdagStore, HeaderStore, RelationsStore};
use database::{StagingArea, StoreResultExtensions};
use std::sync::Arc;

#[derive(Clone)]
pub struct GhostdagManager {
    genesis_hash: Hash,
    pub(super) k: KType,
    pub(super) ghostdag_store: GhostdagStore,
    pub(super) relations_store: RelationsStore,
    headers_store: HeaderStore,
    pub(super) reachability: Arc<dyn ReachabilityService>,
}

/// Chain block visited while checking a blue candidate. The block being colored has no hash yet.
struct ChainBlock<'a> {
    hash: Option<Hash>,
    data: ChainBlockData<'a>,
}

enum ChainBlockData<'a> {
    New(&'a GhostdagData),
    Stored(Arc<GhostdagData>),
}

impl ChainBlockData<'_> {
    fn get(&self) -> &GhostdagData {
        match self {
            ChainBlockData::New(data) => data,
            ChainBlockData::Stored(data) => data,
        }
    }
}

enum ColoringState {
    Blue,
    Red,
    Pending,
}

enum ColoringOutput {
    Blue(KType, BlockHashMap<KType>),
    Red,
}

impl GhostdagManager {
    pub fn new(
        genesis_hash: Hash,
        k: KType,
        ghostdag_store: GhostdagStore,
        relations_store: RelationsStore,
        headers_store: HeaderStore,
        reachability: Arc<dyn ReachabilityService>,
    ) -> Self {
        Self { genesis_hash, k, ghostdag_store, relations_store, headers_store, reachability }
    }

    pub fn genesis_ghostdag_data(&self) -> GhostdagData {
        GhostdagData::genesis()
    }

    pub fn k(&self) -> KType {
        self.k
    }

    pub(super) fn blue_work(&self, staging: &StagingArea, hash: Hash) -> ConsensusResult<BlueWorkType> {
        self.ghostdag_store.get_blue_work(staging, hash).optional()?.ok_or(ConsensusError::MissingGhostdagData(hash))
    }

    pub(super) fn data(&self, staging: &StagingArea, hash: Hash) -> ConsensusResult<Arc<GhostdagData>> {
        self.ghostdag_store.get_data(staging, hash).optional()?.ok_or(ConsensusError::MissingGhostdagData(hash))
    }

    /// Parent with max blue work; ties go to the smaller hash
    pub fn find_selected_parent(&self, staging: &StagingArea, parents: impl IntoIterator<Item = Hash>) -> ConsensusResult<Hash> {
        let mut best: Option<SortableBlock> = None;
        for parent in parents {
            let candidate = SortableBlock::new(parent, self.blue_work(staging, parent)?);
            if best.map_or(true, |b| candidate > b) {
                best = Some(candidate);
            }
        }
        best.map(|b| b.hash).ok_or_else(|| ConsensusError::General("cannot select a parent from an empty set".to_string()))
    }

    /// Runs GHOSTDAG over `parents`. The parents need not belong to a stored block,
    /// which is how the virtual block is colored.
    pub fn ghostdag(&self, staging: &StagingArea, parents: &[Hash]) -> ConsensusResult<GhostdagData> {
        let selected_parent = self.find_selected_parent(staging, parents.iter().copied())?;
        let mut new_block_data = GhostdagData::new_with_selected_parent(selected_parent, self.k);
        let ordered_mergeset = self.ordered_mergeset_without_selected_parent(staging, selected_parent, parents)?;

        for blue_candidate in ordered_mergeset {
            match self.check_blue_candidate(staging, &new_block_data, blue_candidate)? {
                ColoringOutput::Blue(blue_anticone_size, blues_anticone_sizes) => {
                    new_block_data.add_blue(blue_candidate, blue_anticone_size, &blues_anticone_sizes)
                }
                ColoringOutput::Red => new_block_data.add_red(blue_candidate),
            }
        }

        let selected_parent_data = self.data(staging, selected_parent)?;
        let blue_score = selected_parent_data.blue_score + new_block_data.mergeset_blues.len() as u64;
        let mut added_blue_work = BlueWorkType::ZERO;
        for blue in new_block_data.mergeset_blues.iter() {
            added_blue_work += calc_work(self.headers_store.get_bits(staging, *blue)?);
        }
        new_block_data.finalize_score_and_work(blue_score, selected_parent_data.blue_work + added_blue_work);
        Ok(new_block_data)
    }

    /// Colors the virtual block over `virtual_parents`. Every parent must carry stored data.
    pub fn ghostdag_for_virtual(&self, staging: &StagingArea, virtual_parents: &[Hash]) -> ConsensusResult<GhostdagData> {
        for &parent in virtual_parents {
            if !self.ghostdag_store.has(staging, parent)? {
                return Err(ConsensusError::MissingGhostdagData(parent));
            }
        }
        self.ghostdag(staging, virtual_parents)
    }

    fn check_blue_candidate(
        &self,
        staging: &StagingArea,
        new_block_data: &GhostdagData,
        blue_candidate: Hash,
    ) -> ConsensusResult<ColoringOutput> {
        // The selected parent is among the blues, hence k + 1
        if new_block_data.mergeset_blues.len() as KType == self.k + 1 {
            return Ok(ColoringOutput::Red);
        }

        let mut candidate_blues_anticone_sizes = BlockHashMap::<KType>::with_capacity(self.k as usize);
        let mut candidate_blue_anticone_size: KType = 0;
        let mut chain_block = ChainBlock { hash: None, data: ChainBlockData::New(new_block_data) };

        loop {
            let state = self.check_blue_candidate_with_chain_block(
                staging,
                new_block_data,
                &chain_block,
                blue_candidate,
                &mut candidate_blues_anticone_sizes,
                &mut candidate_blue_anticone_size,
            )?;

            match state {
                ColoringState::Blue => return Ok(ColoringOutput::Blue(candidate_blue_anticone_size, candidate_blues_anticone_sizes)),
                ColoringState::Red => return Ok(ColoringOutput::Red),
                ColoringState::Pending => {}
            }

            let next = chain_block.data.get().selected_parent;
            chain_block = ChainBlock { hash: Some(next), data: ChainBlockData::Stored(self.data(staging, next)?) };
        }
    }

    fn check_blue_candidate_with_chain_block(
        &self,
        staging: &StagingArea,
        new_block_data: &GhostdagData,
        chain_block: &ChainBlock,
        blue_candidate: Hash,
        candidate_blues_anticone_sizes: &mut BlockHashMap<KType>,
        candidate_blue_anticone_size: &mut KType,
    ) -> ConsensusResult<ColoringState> {
        // Once the candidate is in the future of a chain block, every remaining blue is in its past
        if let Some(hash) = chain_block.hash {
            if self.reachability.is_dag_ancestor_of(staging, hash, blue_candidate)? {
                return Ok(ColoringState::Blue);
            }
        }

        for &block in chain_block.data.get().mergeset_blues.iter() {
            if self.reachability.is_dag_ancestor_of(staging, block, blue_candidate)? {
                continue;
            }

            let block_blue_anticone_size = self.blue_anticone_size(staging, block, new_block_data)?;
            candidate_blues_anticone_sizes.insert(block, block_blue_anticone_size);

            *candidate_blue_anticone_size += 1;
            if *candidate_blue_anticone_size > self.k {
                // The candidate's own blue anticone would exceed k
                return Ok(ColoringState::Red);
            }

            if block_blue_anticone_size == self.k {
                // A blue in the candidate's anticone already has k blues in its anticone
                return Ok(ColoringState::Red);
            }

            if block_blue_anticone_size > self.k {
                return Err(ConsensusError::General(format!("blue block {block} has an anticone larger than k")));
            }
        }

        Ok(ColoringState::Pending)
    }

    /// Blue anticone size of `block` in the worldview of `context`. `block` must be in the blue set of `context`.
    fn blue_anticone_size(&self, staging: &StagingArea, block: Hash, context: &GhostdagData) -> ConsensusResult<KType> {
        if let Some(size) = context.blues_anticone_sizes.get(&block) {
            return Ok(*size);
        }
        let mut current_selected_parent = context.selected_parent;
        loop {
            if current_selected_parent == self.genesis_hash || current_selected_parent == ORIGIN {
                return Err(ConsensusError::General(format!("block {block} is not in the blue set of the given context")));
            }
            let current = self.data(staging, current_selected_parent)?;
            if let Some(size) = current.blues_anticone_sizes.get(&block) {
                return Ok(*size);
            }
            current_selected_parent = current.selected_parent;
        }
    }
}

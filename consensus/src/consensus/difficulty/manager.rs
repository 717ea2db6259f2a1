//! Difficulty manager for consensus
//!
//! Derives the required target of a block from its difficulty window, and the
//! block's DAA score from the part of its mergeset that lands in that window.

use super::window::{BlockWindowHeap, BlockWindowManager};
use consensus_core::difficulty::{compact_to_target, target_to_compact};
use consensus_core::errors::{ConsensusError, ConsensusResult};
use consensus_core::ghostdag::GhostdagData;
use consensus_core::Hash;
use database::stores::{DaaStore, GhostdagStore, HeaderStore};
use database::{StagingArea, StoreResultExtensions};
use primitive_types::{U256, U512};

#[derive(Clone)]
pub struct DifficultyManager {
    headers_store: HeaderStore,
    ghostdag_store: GhostdagStore,
    daa_store: DaaStore,
    window_manager: BlockWindowManager,
    genesis_bits: u32,
    target_time_per_block: u64,
    max_difficulty_target: U256,
    disable_difficulty_adjustment: bool,
}

impl DifficultyManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        headers_store: HeaderStore,
        ghostdag_store: GhostdagStore,
        daa_store: DaaStore,
        window_manager: BlockWindowManager,
        genesis_bits: u32,
        target_time_per_block: u64,
        max_difficulty_target: U256,
        disable_difficulty_adjustment: bool,
    ) -> Self {
        Self {
            headers_store,
            ghostdag_store,
            daa_store,
            window_manager,
            genesis_bits,
            target_time_per_block,
            max_difficulty_target,
            disable_difficulty_adjustment,
        }
    }

    /// Required bits of a stored block
    pub fn required_difficulty(&self, staging: &StagingArea, hash: Hash) -> ConsensusResult<u32> {
        let ghostdag_data = self.ghostdag_store.get_data(staging, hash).optional()?.ok_or(ConsensusError::MissingGhostdagData(hash))?;
        let window = self.window_manager.difficulty_window(staging, &ghostdag_data)?;
        self.calculate_difficulty_bits(staging, &window)
    }

    /// Required bits, DAA score and DAA added blocks of a block (or of the virtual).
    /// Walks the difficulty window once.
    pub fn calc_difficulty_and_daa(
        &self,
        staging: &StagingArea,
        ghostdag_data: &GhostdagData,
    ) -> ConsensusResult<(u32, u64, Vec<Hash>)> {
        let window = self.window_manager.difficulty_window(staging, ghostdag_data)?;
        let bits = self.calculate_difficulty_bits(staging, &window)?;
        let (daa_score, added_blocks) = self.calc_daa_score_and_added_blocks(staging, &window, ghostdag_data)?;
        Ok((bits, daa_score, added_blocks))
    }

    pub fn stage_daa_added_blocks(&self, staging: &mut StagingArea, hash: Hash, added_blocks: Vec<Hash>) -> ConsensusResult<()> {
        Ok(self.daa_store.insert(staging, hash, added_blocks)?)
    }

    /// DAA score is the selected parent's score plus the number of mergeset blocks inside the window
    pub fn calc_daa_score_and_added_blocks(
        &self,
        staging: &StagingArea,
        window: &BlockWindowHeap,
        ghostdag_data: &GhostdagData,
    ) -> ConsensusResult<(u64, Vec<Hash>)> {
        let added_blocks: Vec<Hash> = ghostdag_data.consensus_ordered_mergeset().filter(|hash| window.contains(hash)).collect();
        let selected_parent_daa_score = self.headers_store.get_daa_score(staging, ghostdag_data.selected_parent)?;
        Ok((selected_parent_daa_score + added_blocks.len() as u64, added_blocks))
    }

    pub fn calculate_difficulty_bits(&self, staging: &StagingArea, window: &BlockWindowHeap) -> ConsensusResult<u32> {
        if self.disable_difficulty_adjustment || window.len() < 2 {
            return Ok(self.genesis_bits);
        }

        let mut samples = Vec::with_capacity(window.len());
        for block in window.iter() {
            samples.push((*block, self.headers_store.get_timestamp(staging, block.hash)?, self.headers_store.get_bits(staging, block.hash)?));
        }
        // Heap iteration order is arbitrary
        samples.sort_by(|a, b| a.0.cmp(&b.0));

        let (min_index, min_ts) = samples
            .iter()
            .enumerate()
            .fold((0, u64::MAX), |(index, min), (i, (_, ts, _))| if *ts < min { (i, *ts) } else { (index, min) });
        let max_ts = samples.iter().map(|(_, ts, _)| *ts).max().unwrap_or(min_ts);

        // The min timestamp block is the outlier left out of the average
        samples.remove(min_index);

        let count = samples.len() as u64;
        let targets_sum = samples.iter().fold(U512::zero(), |sum, (_, _, bits)| sum + U512::from(compact_to_target(*bits)));
        let average_target = targets_sum / U512::from(count);

        let timespan = max_ts.saturating_sub(min_ts).max(1);
        let new_target =
            average_target * U512::from(timespan) / (U512::from(self.target_time_per_block) * U512::from(count));

        let max_target = U512::from(self.max_difficulty_target);
        let new_target = if new_target > max_target { max_target } else { new_target };
        let new_target = U256::try_from(new_target).unwrap_or(self.max_difficulty_target);
        Ok(target_to_compact(new_target))
    }
}

use super::protocol::GhostdagManager;
use consensus_core::errors::{ConsensusError, ConsensusResult};
use consensus_core::ghostdag::SortableBlock;
use consensus_core::{BlockHashSet, Hash};
use database::{StagingArea, StoreResultExtensions};
use std::collections::VecDeque;

impl GhostdagManager {
    /// Blocks in the past of `parents` which are not in the past of `selected_parent`
    pub fn unordered_mergeset_without_selected_parent(
        &self,
        staging: &StagingArea,
        selected_parent: Hash,
        parents: &[Hash],
    ) -> ConsensusResult<BlockHashSet> {
        let mut queue: VecDeque<Hash> = parents.iter().copied().filter(|p| *p != selected_parent).collect();
        let mut mergeset: BlockHashSet = queue.iter().copied().collect();
        let mut selected_parent_past = BlockHashSet::new();

        while let Some(current) = queue.pop_front() {
            let current_parents =
                self.relations_store.get_parents(staging, current).optional()?.ok_or(ConsensusError::UnknownBlock(current))?;

            for &parent in current_parents.iter() {
                if mergeset.contains(&parent) || selected_parent_past.contains(&parent) {
                    continue;
                }
                if self.reachability.is_dag_ancestor_of(staging, parent, selected_parent)? {
                    selected_parent_past.insert(parent);
                    continue;
                }
                mergeset.insert(parent);
                queue.push_back(parent);
            }
        }

        Ok(mergeset)
    }

    pub fn ordered_mergeset_without_selected_parent(
        &self,
        staging: &StagingArea,
        selected_parent: Hash,
        parents: &[Hash],
    ) -> ConsensusResult<Vec<Hash>> {
        let mergeset = self.unordered_mergeset_without_selected_parent(staging, selected_parent, parents)?;
        self.sort_blocks(staging, mergeset)
    }

    /// Ascending (blue work, reversed hash) order
    pub fn sort_blocks(&self, staging: &StagingArea, blocks: impl IntoIterator<Item = Hash>) -> ConsensusResult<Vec<Hash>> {
        let mut sorted = blocks
            .into_iter()
            .map(|hash| Ok(SortableBlock::new(hash, self.blue_work(staging, hash)?)))
            .collect::<ConsensusResult<Vec<_>>>()?;
        sorted.sort();
        Ok(sorted.into_iter().map(|block| block.hash).collect())
    }
}

//! Block window
//!
//! The window of a block is the set of `size` blocks with the highest blue work in
//! its past, collected by walking the selected chain and folding in the mergeset
//! blues of every chain block on the way.

use consensus_core::errors::{ConsensusError, ConsensusResult};
use consensus_core::ghostdag::{GhostdagData, SortableBlock};
use consensus_core::{BlueWorkType, Hash, ORIGIN};
use database::stores::GhostdagStore;
use database::{StagingArea, StoreResultExtensions};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

/// Min-heap over sortable blocks which never grows above `size_bound`
pub struct BoundedSizeBlockHeap {
    binary_heap: BinaryHeap<Reverse<SortableBlock>>,
    size_bound: usize,
}

impl BoundedSizeBlockHeap {
    pub fn new(size_bound: usize) -> Self {
        Self { binary_heap: BinaryHeap::with_capacity(size_bound), size_bound }
    }

    pub fn reached_size_bound(&self) -> bool {
        self.binary_heap.len() >= self.size_bound
    }

    /// Pushes the block, evicting the current minimum when full. Returns false
    /// (and leaves the heap untouched) if the heap is full and the block is below its minimum.
    pub fn try_push(&mut self, hash: Hash, blue_work: BlueWorkType) -> bool {
        let block = Reverse(SortableBlock::new(hash, blue_work));
        if self.reached_size_bound() {
            match self.binary_heap.peek() {
                Some(min) if *min < block => return false,
                None => return false,
                _ => {}
            }
            self.binary_heap.pop();
        }
        self.binary_heap.push(block);
        true
    }

    pub fn len(&self) -> usize {
        self.binary_heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.binary_heap.is_empty()
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.binary_heap.iter().any(|block| block.0.hash == *hash)
    }

    /// Window blocks in ascending (blue work, reversed hash) order
    pub fn into_sorted_vec(self) -> Vec<SortableBlock> {
        // Sorting `Reverse` ascending yields descending blocks
        let mut blocks: Vec<SortableBlock> = self.binary_heap.into_iter().map(|block| block.0).collect();
        blocks.sort();
        blocks
    }

    pub fn iter(&self) -> impl Iterator<Item = &SortableBlock> {
        self.binary_heap.iter().map(|block| &block.0)
    }
}

pub type BlockWindowHeap = BoundedSizeBlockHeap;

#[derive(Clone)]
pub struct BlockWindowManager {
    ghostdag_store: GhostdagStore,
    difficulty_window_size: usize,
    past_median_time_window_size: usize,
}

impl BlockWindowManager {
    pub fn new(ghostdag_store: GhostdagStore, difficulty_window_size: usize, past_median_time_window_size: usize) -> Self {
        Self { ghostdag_store, difficulty_window_size, past_median_time_window_size }
    }

    /// Window used by difficulty adjustment and the DAA score: `difficulty_window_size + 1` blocks
    pub fn difficulty_window(&self, staging: &StagingArea, ghostdag_data: &GhostdagData) -> ConsensusResult<BlockWindowHeap> {
        self.block_window(staging, ghostdag_data, self.difficulty_window_size + 1)
    }

    pub fn past_median_time_window(&self, staging: &StagingArea, ghostdag_data: &GhostdagData) -> ConsensusResult<BlockWindowHeap> {
        self.block_window(staging, ghostdag_data, self.past_median_time_window_size)
    }

    /// Collects the window of a block (or of the virtual) from its GHOSTDAG data.
    /// The block itself is never part of its own window.
    pub fn block_window(&self, staging: &StagingArea, ghostdag_data: &GhostdagData, window_size: usize) -> ConsensusResult<BlockWindowHeap> {
        let mut window_heap = BoundedSizeBlockHeap::new(window_size);
        if window_size == 0 {
            return Ok(window_heap);
        }

        let mut current: Option<Arc<GhostdagData>> = None;
        loop {
            let current_data: &GhostdagData = current.as_deref().unwrap_or(ghostdag_data);
            if current_data.selected_parent == ORIGIN {
                break;
            }
            let selected_parent = current_data.selected_parent;
            let parent_data = self
                .ghostdag_store
                .get_data(staging, selected_parent)
                .optional()?
                .ok_or(ConsensusError::MissingGhostdagData(selected_parent))?;

            if !window_heap.try_push(selected_parent, parent_data.blue_work) {
                break;
            }

            // Mergeset blues without the selected parent, highest blue work first
            for &blue in current_data.mergeset_blues.iter().skip(1).rev() {
                let blue_work =
                    self.ghostdag_store.get_blue_work(staging, blue).optional()?.ok_or(ConsensusError::MissingGhostdagData(blue))?;
                if !window_heap.try_push(blue, blue_work) {
                    break;
                }
            }

            current = Some(parent_data);
        }

        Ok(window_heap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::test_helpers::{h, GhostdagTestDag};

    #[test]
    fn test_bounded_heap_keeps_highest_blue_work() {
        let mut heap = BoundedSizeBlockHeap::new(2);
        assert!(heap.try_push(h(1), 5u64.into()));
        assert!(heap.try_push(h(2), 7u64.into()));
        assert!(!heap.try_push(h(3), 1u64.into()));
        assert!(heap.try_push(h(4), 9u64.into()));
        assert!(heap.reached_size_bound());
        let hashes: Vec<Hash> = heap.into_sorted_vec().into_iter().map(|b| b.hash).collect();
        assert_eq!(hashes, vec![h(2), h(4)]);
    }

    #[test]
    fn test_window_of_chain_is_the_most_recent_ancestors() {
        let genesis = h(100);
        let mut dag = GhostdagTestDag::new(genesis, 18);
        let mut parent = genesis;
        for i in 1..=10 {
            dag.add(h(i), &[parent]);
            parent = h(i);
        }
        let manager = BlockWindowManager::new(dag.ghostdag_store.clone(), 3, 5);
        let tip = dag.data(h(10));

        let window = manager.difficulty_window(&dag.staging, &tip).unwrap();
        let hashes: Vec<Hash> = window.into_sorted_vec().into_iter().map(|b| b.hash).collect();
        assert_eq!(hashes, vec![h(6), h(7), h(8), h(9)]);

        // Near genesis the window holds the whole past
        let window = manager.past_median_time_window(&dag.staging, &dag.data(h(2))).unwrap();
        assert_eq!(window.len(), 2);
        assert!(window.contains(&genesis) && window.contains(&h(1)));
        assert!(manager.block_window(&dag.staging, &dag.data(genesis), 5).unwrap().is_empty());
    }

    #[test]
    fn test_window_folds_in_merged_blues() {
        let genesis = h(100);
        let mut dag = GhostdagTestDag::new(genesis, 18);
        dag.add(h(1), &[genesis]);
        dag.add(h(2), &[genesis]);
        let merge = dag.add(h(3), &[h(1), h(2)]);
        assert_eq!(merge.mergeset_blues.len(), 2);
        let child = dag.add(h(4), &[h(3)]);

        let manager = BlockWindowManager::new(dag.ghostdag_store.clone(), 10, 5);
        let window = manager.difficulty_window(&dag.staging, &child).unwrap();
        assert_eq!(window.len(), 4);
        for hash in [genesis, h(1), h(2), h(3)] {
            assert!(window.contains(&hash));
        }
    }
}

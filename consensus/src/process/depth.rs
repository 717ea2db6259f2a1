//! Finality point, merge depth root and the bounded merge depth rule.
//!
//! Both anchors are cached per block in the depth store, and each block's anchors
//! are found by walking forward from its selected parent's anchors.

use crate::consensus::dag::ReachabilityService;
use consensus_core::errors::{BlockProcessResult, ConsensusError, ConsensusResult, RuleError};
use consensus_core::ghostdag::GhostdagData;
use consensus_core::{Hash, ORIGIN};
use database::stores::{DepthStore, GhostdagStore};
use database::{StagingArea, StoreResultExtensions};
use std::sync::Arc;

#[derive(Clone)]
pub struct DepthManager {
    genesis_hash: Hash,
    finality_depth: u64,
    merge_depth: u64,
    ghostdag_store: GhostdagStore,
    depth_store: DepthStore,
    reachability: Arc<dyn ReachabilityService>,
}

impl DepthManager {
    pub fn new(
        genesis_hash: Hash,
        finality_depth: u64,
        merge_depth: u64,
        ghostdag_store: GhostdagStore,
        depth_store: DepthStore,
        reachability: Arc<dyn ReachabilityService>,
    ) -> Self {
        Self { genesis_hash, finality_depth, merge_depth, ghostdag_store, depth_store, reachability }
    }

    fn blue_score(&self, staging: &StagingArea, hash: Hash) -> ConsensusResult<u64> {
        self.ghostdag_store.get_blue_score(staging, hash).optional()?.ok_or(ConsensusError::MissingGhostdagData(hash))
    }

    /// First blue score of the finality window `depth` below `blue_score`
    pub fn finality_window_target(&self, blue_score: u64, depth: u64) -> Option<u64> {
        let finality_depth = self.finality_depth;
        blue_score.checked_sub(depth).map(|below| below / finality_depth * finality_depth)
    }

    /// Finality point of a block (or of the virtual) given its GHOSTDAG data
    pub fn calc_finality_point(&self, staging: &StagingArea, ghostdag_data: &GhostdagData) -> ConsensusResult<Hash> {
        let Some(target) = self.finality_window_target(ghostdag_data.blue_score, self.finality_depth) else {
            return Ok(self.genesis_hash);
        };
        let selected_parent = ghostdag_data.selected_parent;
        if selected_parent == ORIGIN {
            return Ok(self.genesis_hash);
        }
        let start = self.depth_store.finality_point(staging, selected_parent)?;
        self.first_chain_block_at_or_above(staging, start, selected_parent, target)
    }

    /// Walks the chain of `tip` forward from `start` to the first block with blue score at least `target`
    pub(crate) fn first_chain_block_at_or_above(&self, staging: &StagingArea, start: Hash, tip: Hash, target: u64) -> ConsensusResult<Hash> {
        let mut current = start;
        while current != tip && self.blue_score(staging, current)? < target {
            current = self.reachability.get_next_chain_ancestor(staging, tip, current)?;
        }
        Ok(current)
    }

    /// Last chain block at least `merge_depth` blue score below the block, or genesis
    pub fn calc_merge_depth_root(&self, staging: &StagingArea, ghostdag_data: &GhostdagData) -> ConsensusResult<Hash> {
        let Some(max_root_score) = ghostdag_data.blue_score.checked_sub(self.merge_depth) else {
            return Ok(self.genesis_hash);
        };
        let selected_parent = ghostdag_data.selected_parent;
        if selected_parent == ORIGIN {
            return Ok(self.genesis_hash);
        }

        let mut current = self.depth_store.merge_depth_root(staging, selected_parent)?;
        while current != selected_parent {
            let next = self.reachability.get_next_chain_ancestor(staging, selected_parent, current)?;
            if self.blue_score(staging, next)? > max_root_score {
                break;
            }
            current = next;
        }
        Ok(current)
    }

    /// Blues of the mergeset which are in the future of the merge depth root
    pub fn kosherizing_blues(&self, staging: &StagingArea, ghostdag_data: &GhostdagData, merge_depth_root: Hash) -> ConsensusResult<Vec<Hash>> {
        let mut kosherizing = Vec::new();
        for &blue in ghostdag_data.mergeset_blues.iter() {
            if self.reachability.is_dag_ancestor_of(staging, merge_depth_root, blue)? {
                kosherizing.push(blue);
            }
        }
        Ok(kosherizing)
    }

    /// Every red outside the future of the merge depth root must be in the past of a kosherizing blue
    pub fn check_bounded_merge_depth(
        &self,
        staging: &StagingArea,
        ghostdag_data: &GhostdagData,
        merge_depth_root: Hash,
    ) -> ConsensusResult<BlockProcessResult<()>> {
        let kosherizing = self.kosherizing_blues(staging, ghostdag_data, merge_depth_root)?;
        for &red in ghostdag_data.mergeset_reds.iter() {
            if self.reachability.is_dag_ancestor_of(staging, merge_depth_root, red)? {
                continue;
            }
            if !self.reachability.is_dag_ancestor_of_any(staging, red, &kosherizing)? {
                return Ok(Err(RuleError::ViolatingBoundedMergeDepth));
            }
        }
        Ok(Ok(()))
    }

    pub fn finality_point(&self, staging: &StagingArea, hash: Hash) -> ConsensusResult<Hash> {
        Ok(self.depth_store.finality_point(staging, hash)?)
    }

    pub fn merge_depth_root(&self, staging: &StagingArea, hash: Hash) -> ConsensusResult<Hash> {
        Ok(self.depth_store.merge_depth_root(staging, hash)?)
    }

    pub fn stage_depth_info(&self, staging: &mut StagingArea, hash: Hash, merge_depth_root: Hash, finality_point: Hash) -> ConsensusResult<()> {
        Ok(self.depth_store.insert(staging, hash, merge_depth_root, finality_point)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::test_helpers::{h, GhostdagTestDag};

    struct DepthDag {
        dag: GhostdagTestDag,
        manager: DepthManager,
        depth_store: DepthStore,
    }

    impl DepthDag {
        fn new(k: u16, finality_depth: u64, merge_depth: u64) -> Self {
            let genesis = h(1000);
            let mut dag = GhostdagTestDag::new(genesis, k);
            let depth_store = DepthStore::new(dag.database(), 100);
            let manager = DepthManager::new(
                genesis,
                finality_depth,
                merge_depth,
                dag.ghostdag_store.clone(),
                depth_store.clone(),
                Arc::new(dag.reachability.clone()),
            );
            depth_store.insert(&mut dag.staging, genesis, genesis, genesis).unwrap();
            Self { dag, manager, depth_store }
        }

        fn add(&mut self, hash: Hash, parents: &[Hash]) -> Arc<GhostdagData> {
            let data = self.dag.add(hash, parents);
            let mdr = self.manager.calc_merge_depth_root(&self.dag.staging, &data).unwrap();
            let fp = self.manager.calc_finality_point(&self.dag.staging, &data).unwrap();
            self.depth_store.insert(&mut self.dag.staging, hash, mdr, fp).unwrap();
            data
        }
    }

    #[test]
    fn test_finality_point_moves_in_whole_windows() {
        let mut dag = DepthDag::new(3, 4, 4);
        let genesis = h(1000);
        let mut parent = genesis;
        for i in 1..=13 {
            dag.add(h(i), &[parent]);
            parent = h(i);
        }
        let staging = &dag.dag.staging;
        // Chain blue score equals height
        assert_eq!(dag.manager.finality_point(staging, h(3)).unwrap(), genesis);
        // bs 4: target 0, genesis already qualifies
        assert_eq!(dag.manager.finality_point(staging, h(4)).unwrap(), genesis);
        // bs 8..11: target 4
        assert_eq!(dag.manager.finality_point(staging, h(8)).unwrap(), h(4));
        assert_eq!(dag.manager.finality_point(staging, h(11)).unwrap(), h(4));
        // bs 12: target 8
        assert_eq!(dag.manager.finality_point(staging, h(12)).unwrap(), h(8));
        assert_eq!(dag.manager.finality_point(staging, h(13)).unwrap(), h(8));
    }

    #[test]
    fn test_merge_depth_root_is_last_block_deep_enough() {
        let mut dag = DepthDag::new(3, 4, 3);
        let genesis = h(1000);
        let mut parent = genesis;
        for i in 1..=10 {
            dag.add(h(i), &[parent]);
            parent = h(i);
        }
        let staging = &dag.dag.staging;
        assert_eq!(dag.manager.merge_depth_root(staging, h(2)).unwrap(), genesis);
        assert_eq!(dag.manager.merge_depth_root(staging, h(3)).unwrap(), genesis);
        assert_eq!(dag.manager.merge_depth_root(staging, h(4)).unwrap(), h(1));
        assert_eq!(dag.manager.merge_depth_root(staging, h(10)).unwrap(), h(7));
    }

    #[test]
    fn test_bounded_merge_depth_rejects_deep_red_merge() {
        // k = 1 so that a second side branch turns red
        let mut dag = DepthDag::new(1, 100, 3);
        let genesis = h(1000);

        // Two side blocks off genesis and a long main chain
        dag.add(h(500), &[genesis]);
        dag.add(h(501), &[genesis]);
        let mut parent = genesis;
        for i in 1..=6 {
            dag.add(h(i), &[parent]);
            parent = h(i);
        }

        // Merging both side blocks directly: they are red and no kosherizing blue covers them
        let data = dag.dag.ghostdag.ghostdag(&dag.dag.staging, &[h(6), h(500), h(501)]).unwrap();
        assert!(!data.mergeset_reds.is_empty());
        let mdr = dag.manager.calc_merge_depth_root(&dag.dag.staging, &data).unwrap();
        assert_eq!(mdr, h(4));
        assert_eq!(
            dag.manager.check_bounded_merge_depth(&dag.dag.staging, &data, mdr).unwrap(),
            Err(RuleError::ViolatingBoundedMergeDepth)
        );

        // A shallow merge passes
        dag.add(h(7), &[genesis]);
        let data = dag.dag.ghostdag.ghostdag(&dag.dag.staging, &[h(2), h(7)]).unwrap();
        let mdr = dag.manager.calc_merge_depth_root(&dag.dag.staging, &data).unwrap();
        assert_eq!(mdr, genesis);
        assert_eq!(dag.manager.check_bounded_merge_depth(&dag.dag.staging, &data, mdr).unwrap(), Ok(()));
    }
}

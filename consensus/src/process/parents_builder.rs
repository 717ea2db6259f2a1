//! Virtual parent selection
//!
//! The virtual's parents are the sink plus up to `max_block_parents - 1` further
//! tips, taken by descending blue work. A tip is kept only if the virtual still
//! passes the bounded merge depth rule with it.

use crate::consensus::ghostdag::GhostdagManager;
use crate::process::depth::DepthManager;
use consensus_core::errors::{ConsensusError, ConsensusResult};
use consensus_core::ghostdag::SortableBlock;
use consensus_core::Hash;
use database::stores::GhostdagStore;
use database::{StagingArea, StoreResultExtensions};
use tracing::trace;

#[derive(Clone)]
pub struct ParentsBuilder {
    max_block_parents: usize,
    ghostdag_manager: GhostdagManager,
    ghostdag_store: GhostdagStore,
    depth_manager: DepthManager,
}

impl ParentsBuilder {
    pub fn new(max_block_parents: usize, ghostdag_manager: GhostdagManager, ghostdag_store: GhostdagStore, depth_manager: DepthManager) -> Self {
        Self { max_block_parents, ghostdag_manager, ghostdag_store, depth_manager }
    }

    /// Picks the virtual parents among `tips`. The sink always comes first.
    pub fn pick_virtual_parents(&self, staging: &StagingArea, sink: Hash, tips: impl IntoIterator<Item = Hash>) -> ConsensusResult<Vec<Hash>> {
        let mut candidates = Vec::new();
        for tip in tips.into_iter().filter(|&tip| tip != sink) {
            let blue_work = self.ghostdag_store.get_blue_work(staging, tip).optional()?.ok_or(ConsensusError::MissingGhostdagData(tip))?;
            candidates.push(SortableBlock::new(tip, blue_work));
        }
        candidates.sort_by(|a, b| b.cmp(a));

        let mut parents = vec![sink];
        for candidate in candidates {
            if parents.len() >= self.max_block_parents {
                break;
            }
            parents.push(candidate.hash);
            let ghostdag_data = self.ghostdag_manager.ghostdag_for_virtual(staging, &parents)?;
            let merge_depth_root = self.depth_manager.calc_merge_depth_root(staging, &ghostdag_data)?;
            if self.depth_manager.check_bounded_merge_depth(staging, &ghostdag_data, merge_depth_root)?.is_err() {
                trace!("tip {} left out of the virtual parents: bounded merge depth", candidate.hash);
                parents.pop();
            }
        }
        Ok(parents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::test_helpers::{h, GhostdagTestDag};
    use database::stores::DepthStore;
    use std::sync::Arc;

    fn builder(dag: &mut GhostdagTestDag, genesis: Hash, max_parents: usize, merge_depth: u64) -> (ParentsBuilder, DepthManager) {
        let depth_store = DepthStore::new(dag.database(), 100);
        let depth_manager = DepthManager::new(
            genesis,
            100,
            merge_depth,
            dag.ghostdag_store.clone(),
            depth_store,
            Arc::new(dag.reachability.clone()),
        );
        depth_manager.stage_depth_info(&mut dag.staging, genesis, genesis, genesis).unwrap();
        let builder = ParentsBuilder::new(max_parents, dag.ghostdag.clone(), dag.ghostdag_store.clone(), depth_manager.clone());
        (builder, depth_manager)
    }

    fn add(dag: &mut GhostdagTestDag, depth: &DepthManager, hash: Hash, parents: &[Hash]) {
        let data = dag.add(hash, parents);
        let mdr = depth.calc_merge_depth_root(&dag.staging, &data).unwrap();
        let fp = depth.calc_finality_point(&dag.staging, &data).unwrap();
        depth.stage_depth_info(&mut dag.staging, hash, mdr, fp).unwrap();
    }

    #[test]
    fn test_parents_are_capped_and_ordered_by_blue_work() {
        let genesis = h(100);
        let mut dag = GhostdagTestDag::new(genesis, 18);
        let (builder, depth) = builder(&mut dag, genesis, 3, 100);
        for i in 1..=4 {
            add(&mut dag, &depth, h(i), &[genesis]);
        }
        add(&mut dag, &depth, h(5), &[h(1)]);

        let parents = builder.pick_virtual_parents(&dag.staging, h(5), [h(2), h(3), h(4), h(5)]).unwrap();
        assert_eq!(parents.len(), 3);
        assert_eq!(parents[0], h(5));
        // Equal blue work: smaller hashes first
        assert_eq!(&parents[1..], &[h(2), h(3)]);
    }

    #[test]
    fn test_deep_red_tip_is_left_out() {
        let genesis = h(100);
        let mut dag = GhostdagTestDag::new(genesis, 1);
        let (builder, depth) = builder(&mut dag, genesis, 10, 3);
        add(&mut dag, &depth, h(500), &[genesis]);
        add(&mut dag, &depth, h(501), &[genesis]);
        let mut parent = genesis;
        for i in 1..=6 {
            add(&mut dag, &depth, h(i), &[parent]);
            parent = h(i);
        }

        let parents = builder.pick_virtual_parents(&dag.staging, h(6), [h(6), h(500), h(501)]).unwrap();
        // Both side tips would be red merges below the merge depth root
        assert_eq!(parents, vec![h(6)]);
    }
}

#[cfg(test)]
mod integration_tests {
    use crate::consensus::dag::{DagTopologyManager, ReachabilityManager, ReachabilityService};
    use crate::consensus::test_helpers::{temp_db, GhostdagTestDag};
    use consensus_core::{BlockHashSet, Hash, ORIGIN};
    use database::stores::{MetadataStore, ReachabilityStore, RelationsStore};
    use database::StagingArea;
    use proptest::prelude::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;

    fn h(i: u64) -> Hash {
        Hash::from_le_u64([i, 0, 0, 0])
    }

    #[test]
    fn test_dag_integration() {
        let (_dir, db) = temp_db();
        let reachability = ReachabilityManager::new(ReachabilityStore::new(db.clone(), 100), 100, 1 << 12);
        let topology = DagTopologyManager::new(
            RelationsStore::new(db.clone(), 100),
            MetadataStore::new(db.clone()),
            Arc::new(reachability.clone()),
        );

        let mut staging = StagingArea::new();
        reachability.init(&mut staging, u64::MAX - 1).unwrap();

        // genesis <- 1 <- 2, genesis <- 3, and 4 merging 2 and 3 with 2 as selected parent
        let genesis = h(100);
        topology.set_parents(&mut staging, genesis, &[]).unwrap();
        reachability.add_block(&mut staging, genesis, ORIGIN, &[]).unwrap();
        for (block, parents, sp, mergeset) in [
            (h(1), vec![genesis], genesis, vec![]),
            (h(2), vec![h(1)], h(1), vec![]),
            (h(3), vec![genesis], genesis, vec![]),
            (h(4), vec![h(2), h(3)], h(2), vec![h(3)]),
        ] {
            topology.set_parents(&mut staging, block, &parents).unwrap();
            reachability.add_block(&mut staging, block, sp, &mergeset).unwrap();
        }

        // Everything is visible after commit too
        db.commit(staging).unwrap();
        let staging = StagingArea::new();

        assert_eq!(topology.tips(&staging).unwrap(), BlockHashSet::from([h(4)]));
        assert_eq!(topology.parents(&staging, h(4)).unwrap().as_ref(), &vec![h(2), h(3)]);

        assert!(reachability.is_chain_ancestor_of(&staging, genesis, h(4)).unwrap());
        assert!(reachability.is_chain_ancestor_of(&staging, h(1), h(4)).unwrap());
        assert!(!reachability.is_chain_ancestor_of(&staging, h(3), h(4)).unwrap());
        assert!(reachability.is_dag_ancestor_of(&staging, h(3), h(4)).unwrap());
        assert!(!reachability.is_dag_ancestor_of(&staging, h(3), h(2)).unwrap());
        assert!(topology.is_ancestor_of(&staging, genesis, h(3)).unwrap());

        assert_eq!(reachability.forward_chain(&staging, genesis, h(4)).unwrap(), vec![genesis, h(1), h(2), h(4)]);
        assert_eq!(reachability.get_next_chain_ancestor(&staging, h(4), h(1)).unwrap(), h(2));
    }

    /// Block `i` of a generated DAG. Index 0 is genesis.
    fn block_hash(i: usize) -> Hash {
        h(i as u64 + 1)
    }

    /// A random DAG over recent blocks: each entry picks up to three parents among the
    /// last eight blocks, reduced to an antichain. Returns the parents and the strict past
    /// of every block.
    fn generate_dag(choices: &[(usize, usize, usize, usize)]) -> (Vec<Vec<usize>>, Vec<HashSet<usize>>) {
        let mut parents: Vec<Vec<usize>> = vec![vec![]];
        let mut past: Vec<HashSet<usize>> = vec![HashSet::new()];
        for (i, &(a, b, c, count)) in choices.iter().enumerate() {
            let i = i + 1;
            let window = i.min(8);
            let mut candidates: Vec<usize> = [a, b, c].iter().take(count).map(|x| i - 1 - x % window).collect();
            candidates.sort_unstable();
            candidates.dedup();
            let antichain: Vec<usize> =
                candidates.iter().copied().filter(|&p| !candidates.iter().any(|&q| past[q].contains(&p))).collect();

            let mut block_past = HashSet::new();
            for &p in antichain.iter() {
                block_past.insert(p);
                block_past.extend(past[p].iter().copied());
            }
            parents.push(antichain);
            past.push(block_past);
        }
        (parents, past)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn test_reachability_and_ghostdag_match_dfs(
            choices in prop::collection::vec((0usize..8, 0usize..8, 0usize..8, 1usize..=3), 1..200),
            k in 1u16..5,
        ) {
            let (parents, past) = generate_dag(&choices);
            // Tiny capacity and slack force reindexing along the way
            let mut dag = GhostdagTestDag::with_reachability_params(block_hash(0), k, 1 << 14, 8, 4);
            let index_of: HashMap<Hash, usize> = (0..parents.len()).map(|i| (block_hash(i), i)).collect();

            let mut selected_parent = vec![0usize; parents.len()];
            for i in 1..parents.len() {
                let parent_hashes: Vec<Hash> = parents[i].iter().map(|&p| block_hash(p)).collect();
                let data = dag.add(block_hash(i), &parent_hashes);
                selected_parent[i] = index_of[&data.selected_parent];
            }

            for i in 1..parents.len() {
                let data = dag.data(block_hash(i));
                let sp = selected_parent[i];
                let sp_data = dag.data(block_hash(sp));

                prop_assert!(parents[i].contains(&sp));
                for &p in parents[i].iter() {
                    prop_assert!(dag.data(block_hash(p)).blue_work <= sp_data.blue_work);
                }
                prop_assert_eq!(data.mergeset_blues[0], block_hash(sp));
                prop_assert_eq!(data.blue_score, sp_data.blue_score + data.mergeset_blues.len() as u64);
                prop_assert!(data.mergeset_blues.len() <= k as usize + 1);
                prop_assert!(data.blues_anticone_sizes.values().all(|&size| size <= k));

                let mergeset: HashSet<usize> =
                    data.mergeset_blues.iter().chain(data.mergeset_reds.iter()).map(|hash| index_of[hash]).collect();
                let expected: HashSet<usize> = past[i].difference(&past[sp]).copied().collect();
                prop_assert_eq!(mergeset, expected);
            }

            for i in 0..parents.len() {
                let mut chain = HashSet::from([i]);
                let mut current = i;
                while current != 0 {
                    current = selected_parent[current];
                    chain.insert(current);
                }
                for j in 0..parents.len() {
                    let (this, queried) = (block_hash(j), block_hash(i));
                    prop_assert_eq!(dag.reachability.is_dag_ancestor_of(&dag.staging, this, queried).unwrap(), j == i || past[i].contains(&j));
                    prop_assert_eq!(dag.reachability.is_chain_ancestor_of(&dag.staging, this, queried).unwrap(), chain.contains(&j));
                }
            }
        }
    }
}

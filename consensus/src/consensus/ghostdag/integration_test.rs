#[cfg(test)]
mod integration_tests {
    use crate::consensus::test_helpers::{h, GhostdagTestDag};
    use consensus_core::difficulty::calc_work;
    use consensus_core::errors::ConsensusError;
    use consensus_core::BlueWorkType;

    fn work(blocks: u64) -> BlueWorkType {
        let mut total = BlueWorkType::ZERO;
        for _ in 0..blocks {
            total += calc_work(GhostdagTestDag::BITS);
        }
        total
    }

    #[test]
    fn test_ghostdag_integration() {
        let genesis = h(100);
        let mut dag = GhostdagTestDag::new(genesis, 18);

        let block1 = dag.add(h(1), &[genesis]);
        let block2 = dag.add(h(2), &[h(1)]);
        assert_eq!(block1.selected_parent, genesis);
        assert_eq!(block1.blue_score, 1);
        assert_eq!(block1.blue_work, work(1));
        assert_eq!(block2.selected_parent, h(1));
        assert_eq!(block2.blue_score, 2);

        // Fork and merge
        let block3 = dag.add(h(3), &[genesis]);
        assert_eq!(block3.blue_score, 1);
        let merge = dag.add(h(4), &[h(3), h(2)]);
        assert_eq!(merge.selected_parent, h(2));
        assert_eq!(merge.mergeset_blues, vec![h(2), h(3)]);
        assert!(merge.mergeset_reds.is_empty());
        assert_eq!(merge.blue_score, 4);
        assert_eq!(merge.blue_work, work(4));
        // h(3) is in the anticone of both h(1) and h(2)
        assert_eq!(merge.blues_anticone_sizes[&h(3)], 2);
        assert_eq!(merge.blues_anticone_sizes[&h(2)], 1);
        assert_eq!(merge.blues_anticone_sizes[&h(1)], 1);
    }

    #[test]
    fn test_selected_parent_tie_breaks_on_smaller_hash() {
        let genesis = h(100);
        let mut dag = GhostdagTestDag::new(genesis, 18);
        dag.add(h(7), &[genesis]);
        dag.add(h(5), &[genesis]);
        assert_eq!(dag.ghostdag.find_selected_parent(&dag.staging, [h(7), h(5)]).unwrap(), h(5));
        assert_eq!(dag.ghostdag.sort_blocks(&dag.staging, [h(5), h(7), genesis]).unwrap(), vec![genesis, h(7), h(5)]);
    }

    #[test]
    fn test_k_cluster_colors_excess_blocks_red() {
        let genesis = h(100);
        let mut dag = GhostdagTestDag::new(genesis, 1);
        dag.add(h(1), &[genesis]);
        dag.add(h(2), &[genesis]);
        dag.add(h(3), &[genesis]);

        // Selected parent h(1); candidates visited as h(3) then h(2). Once two blues are in the mergeset
        // the k + 1 bound paints the rest red.
        let merge = dag.add(h(4), &[h(1), h(2), h(3)]);
        assert_eq!(merge.selected_parent, h(1));
        assert_eq!(merge.mergeset_blues, vec![h(1), h(3)]);
        assert_eq!(merge.mergeset_reds, vec![h(2)]);
        assert_eq!(merge.blue_score, 3);
        assert_eq!(merge.consensus_ordered_mergeset().collect::<Vec<_>>(), vec![h(1), h(3), h(2)]);
    }

    #[test]
    fn test_blue_anticone_bound_holds_on_wide_dag() {
        let genesis = h(100);
        let k = 2;
        let mut dag = GhostdagTestDag::new(genesis, k);

        // Layers of four parallel blocks, each layer merging the whole previous one
        let mut previous = vec![genesis];
        let mut next_id = 1;
        for _ in 0..5 {
            let mut layer = Vec::new();
            for _ in 0..4 {
                dag.add(h(next_id), &previous);
                layer.push(h(next_id));
                next_id += 1;
            }
            previous = layer;
        }

        for id in 1..next_id {
            let data = dag.data(h(id));
            assert!(data.mergeset_blues.len() <= k as usize + 1);
            assert_eq!(data.mergeset_blues[0], data.selected_parent);
            for blue in data.mergeset_blues.iter() {
                assert!(data.blues_anticone_sizes[blue] <= k);
            }
            let sp = dag.data(data.selected_parent);
            assert_eq!(data.blue_score, sp.blue_score + data.mergeset_blues.len() as u64);
            assert!(data.blue_work > sp.blue_work);
        }
    }

    #[test]
    fn test_virtual_coloring_does_not_store() {
        let genesis = h(100);
        let mut dag = GhostdagTestDag::new(genesis, 18);
        dag.add(h(1), &[genesis]);
        dag.add(h(2), &[genesis]);
        let virtual_data = dag.ghostdag.ghostdag_for_virtual(&dag.staging, &[h(1), h(2)]).unwrap();
        assert_eq!(virtual_data.selected_parent, h(1));
        assert_eq!(virtual_data.mergeset_size(), 2);
        assert_eq!(virtual_data.blue_score, 3);
        assert!(!dag.ghostdag_store.has(&dag.staging, h(3)).unwrap());

        assert!(matches!(
            dag.ghostdag.ghostdag_for_virtual(&dag.staging, &[h(1), h(3)]),
            Err(ConsensusError::MissingGhostdagData(missing)) if missing == h(3)
        ));
    }
}

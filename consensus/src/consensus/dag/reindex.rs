//! Interval reallocation for the reachability tree.
//!
//! Triggered when a tree parent has no capacity left for a new child, and when
//! the reindex root advances. Blocks below the reindex root on the selected
//! chain keep `slack` spare slots on each side, so most reindexing only has to
//! reclaim slack along the chain instead of relabeling the whole subtree.

use super::reachability::{
    get_next_chain_ancestor_unchecked, interval_remaining_after, interval_remaining_before, is_strict_chain_ancestor_of,
    split_children,
};
use consensus_core::reachability::{Interval, ReachabilityError, ReachabilityResult};
use consensus_core::{BlockHashMap, Hash, ORIGIN};
use database::stores::ReachabilityStore;
use database::StagingArea;
use std::collections::VecDeque;

fn overflow(what: &str) -> ReachabilityError {
    ReachabilityError::DataOverflow(format!("interval arithmetic overflow while {what}"))
}

pub(super) struct ReindexOperationContext<'a> {
    store: &'a ReachabilityStore,
    staging: &'a mut StagingArea,
    subtree_sizes: BlockHashMap<u64>,
    slack: u64,
}

impl<'a> ReindexOperationContext<'a> {
    pub(super) fn new(store: &'a ReachabilityStore, staging: &'a mut StagingArea, slack: u64) -> Self {
        Self { store, staging, subtree_sizes: BlockHashMap::new(), slack }
    }

    fn interval(&self, block: Hash) -> ReachabilityResult<Interval> {
        Ok(self.store.get_interval(self.staging, block)?)
    }

    fn children(&self, block: Hash) -> ReachabilityResult<Vec<Hash>> {
        Ok(self.store.get_children(self.staging, block)?)
    }

    fn parent(&self, block: Hash) -> ReachabilityResult<Hash> {
        Ok(self.store.get_parent(self.staging, block)?)
    }

    fn set_interval(&mut self, block: Hash, interval: Interval) -> ReachabilityResult<()> {
        Ok(self.store.set_interval(self.staging, block, interval)?)
    }

    fn subtree_size(&self, block: Hash) -> ReachabilityResult<u64> {
        self.subtree_sizes
            .get(&block)
            .copied()
            .ok_or_else(|| ReachabilityError::DataInconsistency(format!("subtree size of {block} was not counted")))
    }

    /// Climbs from `new_child` to the first ancestor whose interval fits its subtree and
    /// re-propagates from there. Below the reindex root, slack is reclaimed instead.
    pub(super) fn reindex_intervals(&mut self, new_child: Hash, reindex_root: Hash) -> ReachabilityResult<()> {
        let mut current = new_child;

        loop {
            let current_interval = self.interval(current)?;
            self.count_subtrees(current)?;
            let current_size = self.subtree_size(current)?;

            if current_interval.size() >= current_size {
                break;
            }

            if current == ORIGIN {
                return Err(ReachabilityError::DataOverflow(format!(
                    "reachability root is out of capacity for a subtree of {current_size} blocks"
                )));
            }

            if current == reindex_root {
                return Err(ReachabilityError::DataOverflow(format!("reindex root {reindex_root} is out of capacity")));
            }

            let parent = self.parent(current)?;
            if is_strict_chain_ancestor_of(self.store, self.staging, parent, reindex_root)? {
                // The chain toward the reindex root holds slack; reclaim it rather than
                // relabeling the root's subtree. Requesting the subtree size doubles
                // the capacity of `current`.
                return self.reindex_intervals_earlier_than_root(current, reindex_root, parent, current_size);
            }

            current = parent;
        }

        self.propagate_interval(current)
    }

    /// Counts the subtree size of every block under `block` (inclusive).
    /// Iterative since the tree is linearly deep.
    fn count_subtrees(&mut self, block: Hash) -> ReachabilityResult<()> {
        if self.subtree_sizes.contains_key(&block) {
            return Ok(());
        }

        let mut queue = VecDeque::from([block]);
        let mut counts = BlockHashMap::<u64>::new();

        while let Some(mut current) = queue.pop_front() {
            let children = self.children(current)?;
            if children.is_empty() {
                self.subtree_sizes.insert(current, 1);
            } else if !self.subtree_sizes.contains_key(&current) {
                queue.extend(children);
                continue;
            }

            // `current` is a leaf or already counted, push the count up
            while current != block {
                current = self.parent(current)?;
                let children = self.children(current)?;
                let count = counts.entry(current).or_insert(0);
                *count += 1;
                if *count < children.len() as u64 {
                    break;
                }

                let mut sum = 1u64;
                for child in children.iter() {
                    sum = sum.checked_add(self.subtree_size(*child)?).ok_or_else(|| overflow("counting subtrees"))?;
                }
                self.subtree_sizes.insert(current, sum);
            }
        }

        Ok(())
    }

    /// BFS relabeling of the subtree of `block` by exponential split of each node's children capacity
    fn propagate_interval(&mut self, block: Hash) -> ReachabilityResult<()> {
        self.count_subtrees(block)?;

        let mut queue = VecDeque::from([block]);
        while let Some(current) = queue.pop_front() {
            let children = self.children(current)?;
            if children.is_empty() {
                continue;
            }
            let sizes = children.iter().map(|c| self.subtree_size(*c)).collect::<ReachabilityResult<Vec<u64>>>()?;
            let capacity = self.interval(current)?.children_capacity();
            if capacity.size() < sizes.iter().sum::<u64>() {
                return Err(ReachabilityError::DataOverflow(format!("{current} cannot fit the subtrees of its children")));
            }
            for (child, interval) in children.iter().copied().zip(capacity.split_exponential(&sizes)) {
                self.set_interval(child, interval)?;
            }
            queue.extend(children);
        }
        Ok(())
    }

    /// Allocates `required_allocation` more slots to `allocation_block`, a child of
    /// `common_ancestor` which is itself a strict chain ancestor of the reindex root
    fn reindex_intervals_earlier_than_root(
        &mut self,
        allocation_block: Hash,
        reindex_root: Hash,
        common_ancestor: Hash,
        required_allocation: u64,
    ) -> ReachabilityResult<()> {
        // Child of `common_ancestor` on the chain to the reindex root (possibly the root itself)
        let chosen_child = get_next_chain_ancestor_unchecked(self.store, self.staging, reindex_root, common_ancestor)?;
        let block_interval = self.interval(allocation_block)?;
        let chosen_interval = self.interval(chosen_child)?;

        if block_interval.start < chosen_interval.start {
            self.reclaim_interval(allocation_block, common_ancestor, chosen_child, reindex_root, required_allocation, Side::Before)
        } else {
            self.reclaim_interval(allocation_block, common_ancestor, chosen_child, reindex_root, required_allocation, Side::After)
        }
    }

    fn reclaim_interval(
        &mut self,
        allocation_block: Hash,
        common_ancestor: Hash,
        chosen_child: Hash,
        reindex_root: Hash,
        required_allocation: u64,
        side: Side,
    ) -> ReachabilityResult<()> {
        let mut slack_sum = 0u64;
        let mut path_len = 0u64;
        let mut path_slack_alloc = 0u64;
        let mut current = chosen_child;

        // Walk up the chain toward the reindex root collecting slack
        loop {
            if current == reindex_root {
                // The root has capacity to spare; also re-reserve slack for the traversed chain
                let offset = self
                    .slack
                    .checked_mul(path_len)
                    .and_then(|s| s.checked_add(required_allocation))
                    .and_then(|s| s.checked_sub(slack_sum))
                    .ok_or_else(|| overflow("reclaiming slack at the reindex root"))?;
                self.apply_interval_op_and_propagate(current, offset, side.shrink_op())?;
                self.offset_siblings(allocation_block, current, offset, side)?;
                path_slack_alloc = self.slack;
                break;
            }

            let slack_of_current = side.remaining(self.store, self.staging, current)?.size();
            slack_sum = slack_sum.checked_add(slack_of_current).ok_or_else(|| overflow("summing slack"))?;

            if slack_sum >= required_allocation {
                // Take just enough
                let offset = slack_of_current - (slack_sum - required_allocation);
                self.apply_interval_op(current, offset, side.shrink_op())?;
                self.offset_siblings(allocation_block, current, offset, side)?;
                break;
            }

            current = get_next_chain_ancestor_unchecked(self.store, self.staging, reindex_root, current)?;
            path_len += 1;
        }

        // Walk back down to the common ancestor passing the reclaimed space along
        loop {
            current = self.parent(current)?;
            if current == common_ancestor {
                break;
            }
            let slack_of_current = side.remaining(self.store, self.staging, current)?.size();
            let offset = slack_of_current.checked_sub(path_slack_alloc).ok_or_else(|| overflow("passing slack down the chain"))?;
            self.apply_interval_op(current, offset, side.shrink_op())?;
            self.offset_siblings(allocation_block, current, offset, side)?;
        }

        Ok(())
    }

    /// Shifts the siblings between `current` and `allocation_block` by `offset`, and grows
    /// `allocation_block` into the freed slots
    fn offset_siblings(&mut self, allocation_block: Hash, current: Hash, offset: u64, side: Side) -> ReachabilityResult<()> {
        let parent = self.parent(current)?;
        let children = self.children(parent)?;
        let (before, after) = split_children(&children, current)?;

        let siblings: Vec<Hash> = match side {
            Side::Before => before.iter().rev().copied().collect(),
            Side::After => after.to_vec(),
        };
        for sibling in siblings {
            if sibling == allocation_block {
                self.apply_interval_op_and_propagate(allocation_block, offset, side.grow_op())?;
                break;
            }
            self.apply_interval_op_and_propagate(sibling, offset, side.shift_op())?;
        }
        Ok(())
    }

    fn apply_interval_op(&mut self, block: Hash, offset: u64, op: fn(&Interval, u64) -> Interval) -> ReachabilityResult<()> {
        let interval = self.interval(block)?;
        self.set_interval(block, op(&interval, offset))
    }

    fn apply_interval_op_and_propagate(&mut self, block: Hash, offset: u64, op: fn(&Interval, u64) -> Interval) -> ReachabilityResult<()> {
        self.apply_interval_op(block, offset, op)?;
        self.propagate_interval(block)
    }

    /// Tightens the siblings of `child` against the edges of `parent` (leaving `slack`)
    /// and hands the space in between to `child`
    pub(super) fn concentrate_interval(&mut self, parent: Hash, child: Hash, is_final_reindex_root: bool) -> ReachabilityResult<()> {
        let children = self.children(parent)?;
        let (before, after) = split_children(&children, child)?;
        let (before, after) = (before.to_vec(), after.to_vec());

        let before_sum = self.tighten_intervals_before(parent, &before)?;
        let after_sum = self.tighten_intervals_after(parent, &after)?;
        self.expand_interval_to_chosen(parent, child, before_sum, after_sum, is_final_reindex_root)
    }

    fn subtree_sizes_of(&mut self, blocks: &[Hash]) -> ReachabilityResult<Vec<u64>> {
        blocks
            .iter()
            .map(|&block| {
                self.count_subtrees(block)?;
                self.subtree_size(block)
            })
            .collect()
    }

    fn tighten_intervals_before(&mut self, parent: Hash, children_before: &[Hash]) -> ReachabilityResult<u64> {
        let sizes = self.subtree_sizes_of(children_before)?;
        let sum: u64 = sizes.iter().sum();
        let interval = self.interval(parent)?;
        let start = interval.start.checked_add(self.slack).ok_or_else(|| overflow("tightening"))?;
        let end = start.checked_add(sum).ok_or_else(|| overflow("tightening"))?;
        if end > interval.children_capacity().end {
            return Err(overflow("tightening siblings before the chosen child"));
        }

        for (child, interval) in children_before.iter().copied().zip(Interval::new(start, end).split_exact(&sizes)) {
            self.set_interval(child, interval)?;
            self.propagate_interval(child)?;
        }
        Ok(sum)
    }

    fn tighten_intervals_after(&mut self, parent: Hash, children_after: &[Hash]) -> ReachabilityResult<u64> {
        let sizes = self.subtree_sizes_of(children_after)?;
        let sum: u64 = sizes.iter().sum();
        let capacity = self.interval(parent)?.children_capacity();
        let end = capacity.end.checked_sub(self.slack).ok_or_else(|| overflow("tightening"))?;
        let start = end.checked_sub(sum).ok_or_else(|| overflow("tightening"))?;
        if start < capacity.start {
            return Err(overflow("tightening siblings after the chosen child"));
        }

        for (child, interval) in children_after.iter().copied().zip(Interval::new(start, end).split_exact(&sizes)) {
            self.set_interval(child, interval)?;
            self.propagate_interval(child)?;
        }
        Ok(sum)
    }

    fn expand_interval_to_chosen(
        &mut self,
        parent: Hash,
        child: Hash,
        before_sum: u64,
        after_sum: u64,
        is_final_reindex_root: bool,
    ) -> ReachabilityResult<()> {
        let capacity = self.interval(parent)?.children_capacity();
        let start = capacity.start.checked_add(before_sum).and_then(|s| s.checked_add(self.slack));
        let end = capacity.end.checked_sub(after_sum).and_then(|e| e.checked_sub(self.slack));
        let allocation = match (start, end) {
            (Some(start), Some(end)) if start <= end => Interval::new(start, end),
            _ => return Err(overflow("expanding the chosen child")),
        };
        let current = self.interval(child)?;

        // Relabel only below the final root, and only if the new interval does not already cover the old one
        if is_final_reindex_root && !allocation.contains(current) {
            // Keep slack on both sides so the next root move will likely find `current` covered
            self.count_subtrees(child)?;
            let required = self.subtree_size(child)?;
            let narrowed = match self.slack.checked_mul(2).and_then(|s| s.checked_add(required)) {
                Some(needed) if allocation.size() > needed => {
                    Interval::new(allocation.start + self.slack, allocation.end - self.slack)
                }
                _ => allocation,
            };
            self.set_interval(child, narrowed)?;
            self.propagate_interval(child)?;
        }

        self.set_interval(child, allocation)
    }
}

#[derive(Clone, Copy)]
enum Side {
    Before,
    After,
}

impl Side {
    fn remaining(self, store: &ReachabilityStore, staging: &StagingArea, block: Hash) -> ReachabilityResult<Interval> {
        match self {
            Side::Before => interval_remaining_before(store, staging, block),
            Side::After => interval_remaining_after(store, staging, block),
        }
    }

    /// Gives up slots on this side of a chain block
    fn shrink_op(self) -> fn(&Interval, u64) -> Interval {
        match self {
            Side::Before => Interval::increase_start,
            Side::After => Interval::decrease_end,
        }
    }

    /// Moves a sibling toward the freed slots
    fn shift_op(self) -> fn(&Interval, u64) -> Interval {
        match self {
            Side::Before => Interval::increase,
            Side::After => Interval::decrease,
        }
    }

    /// Grows the allocation block into the freed slots
    fn grow_op(self) -> fn(&Interval, u64) -> Interval {
        match self {
            Side::Before => Interval::increase_end,
            Side::After => Interval::decrease_start,
        }
    }
}

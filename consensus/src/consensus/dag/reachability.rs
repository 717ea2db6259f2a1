//! Reachability: O(1) chain-ancestry and O(log n) DAG-ancestry queries.
//!
//! Every block gets an interval in the tree formed by selected-parent links.
//! A node owns the last slot of its half-open interval and hands out the rest
//! to its children, so chain ancestry is interval containment. DAG ancestry
//! additionally consults the future covering set (FCS) of the queried
//! ancestor: the blocks that merged it, ordered by interval start.

use super::reindex::ReindexOperationContext;
use consensus_core::reachability::{Interval, ReachabilityError, ReachabilityResult};
use consensus_core::{Hash, ORIGIN};
use database::stores::ReachabilityStore;
use database::StagingArea;
use tracing::{debug, info};

/// Tree parent of the reachability root
pub(crate) const NONE: Hash = Hash::from_bytes([0xff; 32]);

/// Read-only reachability queries. Consumers hold this trait so tests may swap in their own oracle.
pub trait ReachabilityService: Send + Sync {
    /// Whether `this` is in the selected chain of `queried`. Reflexive.
    fn is_chain_ancestor_of(&self, staging: &StagingArea, this: Hash, queried: Hash) -> ReachabilityResult<bool>;

    /// Whether `this ∈ past(queried) ∪ {queried}`
    fn is_dag_ancestor_of(&self, staging: &StagingArea, this: Hash, queried: Hash) -> ReachabilityResult<bool>;

    /// The child of `ancestor` on the tree path down to `descendant`
    fn get_next_chain_ancestor(&self, staging: &StagingArea, descendant: Hash, ancestor: Hash) -> ReachabilityResult<Hash>;

    fn is_dag_ancestor_of_any(&self, staging: &StagingArea, this: Hash, queried: &[Hash]) -> ReachabilityResult<bool> {
        for &hash in queried {
            if self.is_dag_ancestor_of(staging, this, hash)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn is_any_dag_ancestor(&self, staging: &StagingArea, list: &[Hash], queried: Hash) -> ReachabilityResult<bool> {
        for &hash in list {
            if self.is_dag_ancestor_of(staging, hash, queried)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Selected chain from `from` up to `to`, both included. `from` must be a chain ancestor of `to`.
    fn forward_chain(&self, staging: &StagingArea, from: Hash, to: Hash) -> ReachabilityResult<Vec<Hash>> {
        if !self.is_chain_ancestor_of(staging, from, to)? {
            return Err(ReachabilityError::BadQuery);
        }
        let mut chain = vec![from];
        let mut current = from;
        while current != to {
            current = self.get_next_chain_ancestor(staging, to, current)?;
            chain.push(current);
        }
        Ok(chain)
    }
}

/// Owns every reachability mutation: insertion, reindexing and reindex-root advancement
#[derive(Clone)]
pub struct ReachabilityManager {
    store: ReachabilityStore,
    reindex_depth: u64,
    reindex_slack: u64,
}

impl ReachabilityManager {
    pub fn new(store: ReachabilityStore, reindex_depth: u64, reindex_slack: u64) -> Self {
        Self { store, reindex_depth, reindex_slack }
    }

    /// Stages the reachability root `ORIGIN` with interval `[1, 1 + capacity)`. No-op if already initialized.
    pub fn init(&self, staging: &mut StagingArea, capacity: u64) -> ReachabilityResult<()> {
        if self.store.has(staging, ORIGIN)? {
            return Ok(());
        }
        if capacity < 2 {
            return Err(ReachabilityError::DataOverflow(format!("root capacity {capacity} is too small")));
        }
        self.store.insert(staging, ORIGIN, NONE, Interval::new(1, capacity.saturating_add(1)), 0)?;
        self.store.set_reindex_root(staging, ORIGIN)?;
        Ok(())
    }

    /// Adds `block` as a tree child of `selected_parent` and registers it in the FCS
    /// of each block in `mergeset_without_selected_parent`.
    pub fn add_block(
        &self,
        staging: &mut StagingArea,
        block: Hash,
        selected_parent: Hash,
        mergeset_without_selected_parent: &[Hash],
    ) -> ReachabilityResult<()> {
        self.add_tree_block(staging, block, selected_parent)?;
        for &merged in mergeset_without_selected_parent {
            self.insert_to_future_covering_set(staging, merged, block)?;
        }
        Ok(())
    }

    fn add_tree_block(&self, staging: &mut StagingArea, block: Hash, parent: Hash) -> ReachabilityResult<()> {
        let remaining = interval_remaining_after(&self.store, staging, parent)?;
        let height = self.store.get_height(staging, parent)?.checked_add(1).ok_or(ReachabilityError::BadQuery)?;
        self.store.append_child(staging, parent, block)?;

        if remaining.is_empty() {
            self.store.insert(staging, block, parent, remaining, height)?;
            let reindex_root = self.store.get_reindex_root(staging)?;
            debug!("reachability capacity of {} exhausted, reindexing from {}", parent, block);
            let mut ctx = ReindexOperationContext::new(&self.store, staging, self.reindex_slack);
            ctx.reindex_intervals(block, reindex_root)?;
        } else {
            let (allocated, _) = remaining.split_half();
            self.store.insert(staging, block, parent, allocated, height)?;
        }
        Ok(())
    }

    fn insert_to_future_covering_set(&self, staging: &mut StagingArea, merged_block: Hash, new_block: Hash) -> ReachabilityResult<()> {
        let fcs = self.store.get_future_covering_set(staging, merged_block)?;
        match binary_search_descendant(&self.store, staging, &fcs, new_block)? {
            // A chain ancestor of `new_block` in FCS(merged_block) would put `merged_block`
            // in the past of the selected parent, which contradicts it being merged
            SearchOutput::Found(hash, _) => Err(ReachabilityError::DataInconsistency(format!(
                "{hash} in future covering set of {merged_block} is a chain ancestor of {new_block}"
            ))),
            SearchOutput::NotFound(index) => Ok(self.store.insert_future_covering_item(staging, merged_block, new_block, index)?),
        }
    }

    /// Moves the reindex root toward `hint` (the new sink) once it lags `reindex_depth` behind,
    /// concentrating interval capacity on the selected chain.
    pub fn hint_virtual_selected_parent(&self, staging: &mut StagingArea, hint: Hash) -> ReachabilityResult<()> {
        let current = self.store.get_reindex_root(staging)?;
        let (mut ancestor, next) = self.find_next_reindex_root(staging, current, hint)?;
        if current == next {
            return Ok(());
        }

        while ancestor != next {
            let child = get_next_chain_ancestor_unchecked(&self.store, staging, next, ancestor)?;
            let mut ctx = ReindexOperationContext::new(&self.store, staging, self.reindex_slack);
            ctx.concentrate_interval(ancestor, child, child == next)?;
            ancestor = child;
        }

        info!("reachability reindex root moved from {} to {}", current, next);
        self.store.set_reindex_root(staging, next)?;
        Ok(())
    }

    fn find_next_reindex_root(&self, staging: &StagingArea, current: Hash, hint: Hash) -> ReachabilityResult<(Hash, Hash)> {
        let mut ancestor = current;
        let mut next = current;
        let hint_height = self.store.get_height(staging, hint)?;

        if !is_chain_ancestor_of(&self.store, staging, current, hint)? {
            // Switch chains only after a `reindex_slack` height lead, so alternating reorgs
            // do not keep moving the root
            let current_height = self.store.get_height(staging, current)?;
            if hint_height < current_height || hint_height - current_height < self.reindex_slack {
                return Ok((current, current));
            }
            let common = self.find_common_tree_ancestor(staging, hint, current)?;
            ancestor = common;
            next = common;
        }

        while next != hint {
            let child = get_next_chain_ancestor_unchecked(&self.store, staging, hint, next)?;
            let child_height = self.store.get_height(staging, child)?;
            if hint_height < child_height {
                return Err(ReachabilityError::DataInconsistency(format!("{child} is higher than its descendant {hint}")));
            }
            if hint_height - child_height < self.reindex_depth {
                break;
            }
            next = child;
        }

        Ok((ancestor, next))
    }

    fn find_common_tree_ancestor(&self, staging: &StagingArea, block: Hash, reindex_root: Hash) -> ReachabilityResult<Hash> {
        let mut current = block;
        loop {
            if is_chain_ancestor_of(&self.store, staging, current, reindex_root)? {
                return Ok(current);
            }
            current = self.store.get_parent(staging, current)?;
        }
    }

    pub fn get_reindex_root(&self, staging: &StagingArea) -> ReachabilityResult<Hash> {
        Ok(self.store.get_reindex_root(staging)?)
    }

    pub fn get_interval(&self, staging: &StagingArea, hash: Hash) -> ReachabilityResult<Interval> {
        Ok(self.store.get_interval(staging, hash)?)
    }
}

impl ReachabilityService for ReachabilityManager {
    fn is_chain_ancestor_of(&self, staging: &StagingArea, this: Hash, queried: Hash) -> ReachabilityResult<bool> {
        is_chain_ancestor_of(&self.store, staging, this, queried)
    }

    fn is_dag_ancestor_of(&self, staging: &StagingArea, this: Hash, queried: Hash) -> ReachabilityResult<bool> {
        if is_chain_ancestor_of(&self.store, staging, this, queried)? {
            return Ok(true);
        }
        let fcs = self.store.get_future_covering_set(staging, this)?;
        Ok(matches!(binary_search_descendant(&self.store, staging, &fcs, queried)?, SearchOutput::Found(..)))
    }

    fn get_next_chain_ancestor(&self, staging: &StagingArea, descendant: Hash, ancestor: Hash) -> ReachabilityResult<Hash> {
        if descendant == ancestor || !is_strict_chain_ancestor_of(&self.store, staging, ancestor, descendant)? {
            return Err(ReachabilityError::BadQuery);
        }
        get_next_chain_ancestor_unchecked(&self.store, staging, descendant, ancestor)
    }
}

pub(super) fn is_chain_ancestor_of(store: &ReachabilityStore, staging: &StagingArea, this: Hash, queried: Hash) -> ReachabilityResult<bool> {
    Ok(store.get_interval(staging, this)?.contains(store.get_interval(staging, queried)?))
}

pub(super) fn is_strict_chain_ancestor_of(
    store: &ReachabilityStore,
    staging: &StagingArea,
    this: Hash,
    queried: Hash,
) -> ReachabilityResult<bool> {
    Ok(store.get_interval(staging, this)?.strictly_contains(store.get_interval(staging, queried)?))
}

pub(super) fn get_next_chain_ancestor_unchecked(
    store: &ReachabilityStore,
    staging: &StagingArea,
    descendant: Hash,
    ancestor: Hash,
) -> ReachabilityResult<Hash> {
    let children = store.get_children(staging, ancestor)?;
    match binary_search_descendant(store, staging, &children, descendant)? {
        SearchOutput::Found(hash, _) => Ok(hash),
        SearchOutput::NotFound(_) => Err(ReachabilityError::BadQuery),
    }
}

/// Capacity of `block` before its first child, or all of it when childless
pub(super) fn interval_remaining_before(store: &ReachabilityStore, staging: &StagingArea, block: Hash) -> ReachabilityResult<Interval> {
    let capacity = store.get_interval(staging, block)?.children_capacity();
    match store.get_children(staging, block)?.first() {
        Some(first) => Ok(Interval::new(capacity.start, store.get_interval(staging, *first)?.start)),
        None => Ok(capacity),
    }
}

/// Capacity of `block` after its last child, or all of it when childless
pub(super) fn interval_remaining_after(store: &ReachabilityStore, staging: &StagingArea, block: Hash) -> ReachabilityResult<Interval> {
    let capacity = store.get_interval(staging, block)?.children_capacity();
    match store.get_children(staging, block)?.last() {
        Some(last) => Ok(Interval::new(store.get_interval(staging, *last)?.end, capacity.end)),
        None => Ok(capacity),
    }
}

/// Splits `children` around `pivot`, excluding it
pub(super) fn split_children(children: &[Hash], pivot: Hash) -> ReachabilityResult<(&[Hash], &[Hash])> {
    match children.iter().position(|&c| c == pivot) {
        Some(index) => Ok((&children[..index], &children[index + 1..])),
        None => Err(ReachabilityError::DataInconsistency(format!("{pivot} is not a tree child of its parent"))),
    }
}

pub(super) enum SearchOutput {
    NotFound(usize),
    Found(Hash, usize),
}

/// Searches `ordered_hashes` (sorted by interval start, pairwise disjoint) for a chain ancestor
/// of `descendant`. On a miss, returns the index at which `descendant` keeps the order.
pub(super) fn binary_search_descendant(
    store: &ReachabilityStore,
    staging: &StagingArea,
    ordered_hashes: &[Hash],
    descendant: Hash,
) -> ReachabilityResult<SearchOutput> {
    let point = store.get_interval(staging, descendant)?.own_slot();

    // First index whose interval starts after `point`
    let (mut low, mut high) = (0usize, ordered_hashes.len());
    while low < high {
        let mid = low + (high - low) / 2;
        if store.get_interval(staging, ordered_hashes[mid])?.start <= point {
            low = mid + 1;
        } else {
            high = mid;
        }
    }

    if low > 0 && is_chain_ancestor_of(store, staging, ordered_hashes[low - 1], descendant)? {
        Ok(SearchOutput::Found(ordered_hashes[low - 1], low - 1))
    } else {
        Ok(SearchOutput::NotFound(low))
    }
}

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{BlockHashMap, BlueWorkType, Hash, KType, ORIGIN};

/// GHOSTDAG output for a single block
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GhostdagData {
    pub blue_score: u64,
    pub blue_work: BlueWorkType,
    pub selected_parent: Hash,
    /// Selected parent first, then the remaining blues in ascending (blue work, hash) order
    pub mergeset_blues: Vec<Hash>,
    pub mergeset_reds: Vec<Hash>,
    /// Anticone size of each mergeset blue within the blue set of this block
    pub blues_anticone_sizes: BlockHashMap<KType>,
}

impl GhostdagData {
    pub fn new(
        blue_score: u64,
        blue_work: BlueWorkType,
        selected_parent: Hash,
        mergeset_blues: Vec<Hash>,
        mergeset_reds: Vec<Hash>,
        blues_anticone_sizes: BlockHashMap<KType>,
    ) -> Self {
        Self { blue_score, blue_work, selected_parent, mergeset_blues, mergeset_reds, blues_anticone_sizes }
    }

    /// Starts a fresh coloring on top of `selected_parent`
    pub fn new_with_selected_parent(selected_parent: Hash, k: KType) -> Self {
        let mut mergeset_blues: Vec<Hash> = Vec::with_capacity(k as usize + 1);
        let mut blues_anticone_sizes: BlockHashMap<KType> = BlockHashMap::with_capacity(k as usize);
        mergeset_blues.push(selected_parent);
        blues_anticone_sizes.insert(selected_parent, 0);

        Self {
            blue_score: 0,
            blue_work: BlueWorkType::ZERO,
            selected_parent,
            mergeset_blues,
            mergeset_reds: Vec::new(),
            blues_anticone_sizes,
        }
    }

    /// GHOSTDAG data of genesis
    pub fn genesis() -> Self {
        Self { selected_parent: ORIGIN, ..Default::default() }
    }

    pub fn mergeset_size(&self) -> usize {
        self.mergeset_blues.len() + self.mergeset_reds.len()
    }

    /// Blues (selected parent first) followed by reds
    pub fn consensus_ordered_mergeset(&self) -> impl Iterator<Item = Hash> + '_ {
        self.mergeset_blues.iter().chain(self.mergeset_reds.iter()).copied()
    }

    /// Mergeset without the selected parent
    pub fn unordered_mergeset_without_selected_parent(&self) -> impl Iterator<Item = Hash> + '_ {
        self.mergeset_blues.iter().skip(1).chain(self.mergeset_reds.iter()).copied()
    }

    pub fn add_blue(&mut self, block: Hash, blue_anticone_size: KType, block_blues_anticone_sizes: &BlockHashMap<KType>) {
        self.mergeset_blues.push(block);
        self.blues_anticone_sizes.insert(block, blue_anticone_size);
        for (blue, size) in block_blues_anticone_sizes {
            self.blues_anticone_sizes.insert(*blue, size + 1);
        }
    }

    pub fn add_red(&mut self, block: Hash) {
        self.mergeset_reds.push(block);
    }

    pub fn finalize_score_and_work(&mut self, blue_score: u64, blue_work: BlueWorkType) {
        self.blue_score = blue_score;
        self.blue_work = blue_work;
    }

    pub fn to_compact(&self) -> CompactGhostdagData {
        CompactGhostdagData { blue_score: self.blue_score, blue_work: self.blue_work, selected_parent: self.selected_parent }
    }
}

/// The subset of GHOSTDAG data needed by traversals
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactGhostdagData {
    pub blue_score: u64,
    pub blue_work: BlueWorkType,
    pub selected_parent: Hash,
}

/// Block hash with its blue work, ordered by blue work and then by hash descending,
/// so that among equal blue work the smaller hash is considered greater.
#[derive(Eq, Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SortableBlock {
    pub hash: Hash,
    pub blue_work: BlueWorkType,
}

impl SortableBlock {
    pub fn new(hash: Hash, blue_work: BlueWorkType) -> Self {
        Self { hash, blue_work }
    }
}

impl PartialEq for SortableBlock {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl PartialOrd for SortableBlock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortableBlock {
    fn cmp(&self, other: &Self) -> Ordering {
        self.blue_work.cmp(&other.blue_work).then_with(|| other.hash.cmp(&self.hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sortable_block_tie_breaks_towards_smaller_hash() {
        let a = SortableBlock::new(Hash::from_u64_word(1), 10u64.into());
        let b = SortableBlock::new(Hash::from_u64_word(2), 10u64.into());
        let c = SortableBlock::new(Hash::from_u64_word(3), 11u64.into());
        assert!(a > b);
        assert!(c > a);
        let mut v = vec![c, a, b];
        v.sort();
        assert_eq!(v.iter().map(|s| s.hash).collect::<Vec<_>>(), vec![b.hash, a.hash, c.hash]);
    }

    #[test]
    fn test_add_blue_propagates_anticone_sizes() {
        let sp = Hash::from_u64_word(1);
        let mut data = GhostdagData::new_with_selected_parent(sp, 3);
        let mut sizes = BlockHashMap::new();
        sizes.insert(sp, 0);
        data.add_blue(Hash::from_u64_word(2), 1, &sizes);
        assert_eq!(data.blues_anticone_sizes[&sp], 1);
        assert_eq!(data.blues_anticone_sizes[&Hash::from_u64_word(2)], 1);
        assert_eq!(data.mergeset_blues.len(), 2);
        assert_eq!(data.unordered_mergeset_without_selected_parent().count(), 1);
    }
}

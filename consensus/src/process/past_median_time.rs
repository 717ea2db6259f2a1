//! Past median time
//!
//! The median timestamp over the past median time window of a block. Block
//! timestamps must exceed it, and time-based lock times are compared against it.

use crate::consensus::difficulty::{BlockWindowHeap, BlockWindowManager};
use consensus_core::errors::{ConsensusError, ConsensusResult};
use consensus_core::ghostdag::GhostdagData;
use consensus_core::Hash;
use database::stores::{GhostdagStore, HeaderStore};
use database::{StagingArea, StoreResultExtensions};

#[derive(Clone)]
pub struct PastMedianTimeManager {
    headers_store: HeaderStore,
    ghostdag_store: GhostdagStore,
    window_manager: BlockWindowManager,
    genesis_timestamp: u64,
}

impl PastMedianTimeManager {
    pub fn new(
        headers_store: HeaderStore,
        ghostdag_store: GhostdagStore,
        window_manager: BlockWindowManager,
        genesis_timestamp: u64,
    ) -> Self {
        Self { headers_store, ghostdag_store, window_manager, genesis_timestamp }
    }

    /// Past median time of a stored block
    pub fn past_median_time(&self, staging: &StagingArea, hash: Hash) -> ConsensusResult<u64> {
        let ghostdag_data = self.ghostdag_store.get_data(staging, hash).optional()?.ok_or(ConsensusError::MissingGhostdagData(hash))?;
        self.calc_past_median_time(staging, &ghostdag_data)
    }

    /// Past median time of a block (or of the virtual) given its GHOSTDAG data
    pub fn calc_past_median_time(&self, staging: &StagingArea, ghostdag_data: &GhostdagData) -> ConsensusResult<u64> {
        let window = self.window_manager.past_median_time_window(staging, ghostdag_data)?;
        self.calc_past_median_time_for_window(staging, &window)
    }

    pub fn calc_past_median_time_for_window(&self, staging: &StagingArea, window: &BlockWindowHeap) -> ConsensusResult<u64> {
        let mut timestamps = Vec::with_capacity(window.len());
        for block in window.iter() {
            timestamps.push(self.headers_store.get_timestamp(staging, block.hash)?);
        }
        Ok(median(timestamps).unwrap_or(self.genesis_timestamp))
    }
}

/// Median of the values; even counts average the two middle values
fn median(mut values: Vec<u64>) -> Option<u64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let len = values.len();
    if len % 2 == 1 {
        Some(values[len / 2])
    } else {
        let (low, high) = (values[len / 2 - 1], values[len / 2]);
        Some(low + (high - low) / 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::test_helpers::{h, temp_db};
    use consensus_core::header::Header;
    use std::sync::Arc;

    #[test]
    fn test_median() {
        assert_eq!(median(vec![]), None);
        assert_eq!(median(vec![5, 1, 3]), Some(3));
        assert_eq!(median(vec![4, 1, 2, 10]), Some(3));
        assert_eq!(median(vec![7, 8]), Some(7));
    }

    #[test]
    fn test_median_of_window_and_genesis_fallback() {
        let (_dir, db) = temp_db();
        let headers = HeaderStore::new(db.clone(), 10);
        let ghostdag = GhostdagStore::new(db, 10);
        let manager = PastMedianTimeManager::new(headers.clone(), ghostdag.clone(), BlockWindowManager::new(ghostdag, 5, 5), 42);

        let mut staging = StagingArea::new();
        let mut window = BlockWindowHeap::new(5);
        assert_eq!(manager.calc_past_median_time_for_window(&staging, &window).unwrap(), 42);

        for (i, ts) in [(1u64, 100u64), (2, 300), (3, 200)] {
            let mut header = Header::from_precomputed_hash(h(i), vec![]);
            header.timestamp = ts;
            headers.insert(&mut staging, Arc::new(header)).unwrap();
            window.try_push(h(i), i.into());
        }
        assert_eq!(manager.calc_past_median_time_for_window(&staging, &window).unwrap(), 200);
    }
}

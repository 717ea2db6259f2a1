use crate::access::{CachedDbAccess, CachedDbItem};
use crate::db::CF_REACHABILITY;
use crate::{Database, DbResult, StagingArea};
use consensus_core::reachability::{Interval, ReachabilityData};
use consensus_core::Hash;
use std::sync::Arc;

const REINDEX_ROOT_KEY: &str = "reachability-reindex-root";

/// Reachability tree labels. Every mutation is a staged read-modify-write of the block record.
#[derive(Clone)]
pub struct ReachabilityStore {
    access: CachedDbAccess<Hash, ReachabilityData>,
    reindex_root: CachedDbItem<Hash>,
}

impl ReachabilityStore {
    pub fn new(db: Arc<Database>, cache_size: usize) -> Self {
        Self {
            access: CachedDbAccess::new(db.clone(), CF_REACHABILITY, cache_size),
            reindex_root: CachedDbItem::new(db, REINDEX_ROOT_KEY),
        }
    }

    pub fn insert(&self, staging: &mut StagingArea, hash: Hash, parent: Hash, interval: Interval, height: u64) -> DbResult<()> {
        self.access.write(staging, hash, ReachabilityData::new(parent, interval, height))
    }

    pub fn has(&self, staging: &StagingArea, hash: Hash) -> DbResult<bool> {
        self.access.has(staging, &hash)
    }

    pub fn get_data(&self, staging: &StagingArea, hash: Hash) -> DbResult<Arc<ReachabilityData>> {
        self.access.read(staging, &hash)
    }

    pub fn get_interval(&self, staging: &StagingArea, hash: Hash) -> DbResult<Interval> {
        Ok(self.get_data(staging, hash)?.interval)
    }

    pub fn get_parent(&self, staging: &StagingArea, hash: Hash) -> DbResult<Hash> {
        Ok(self.get_data(staging, hash)?.parent)
    }

    pub fn get_children(&self, staging: &StagingArea, hash: Hash) -> DbResult<Vec<Hash>> {
        Ok(self.get_data(staging, hash)?.children.clone())
    }

    pub fn get_future_covering_set(&self, staging: &StagingArea, hash: Hash) -> DbResult<Vec<Hash>> {
        Ok(self.get_data(staging, hash)?.future_covering_set.clone())
    }

    pub fn get_height(&self, staging: &StagingArea, hash: Hash) -> DbResult<u64> {
        Ok(self.get_data(staging, hash)?.height)
    }

    fn update(&self, staging: &mut StagingArea, hash: Hash, f: impl FnOnce(&mut ReachabilityData)) -> DbResult<()> {
        let mut data = self.get_data(staging, hash)?.as_ref().clone();
        f(&mut data);
        self.access.write(staging, hash, data)
    }

    pub fn set_interval(&self, staging: &mut StagingArea, hash: Hash, interval: Interval) -> DbResult<()> {
        self.update(staging, hash, |data| data.interval = interval)
    }

    pub fn append_child(&self, staging: &mut StagingArea, hash: Hash, child: Hash) -> DbResult<()> {
        self.update(staging, hash, |data| data.children.push(child))
    }

    pub fn insert_future_covering_item(&self, staging: &mut StagingArea, hash: Hash, fci: Hash, insertion_index: usize) -> DbResult<()> {
        self.update(staging, hash, |data| data.future_covering_set.insert(insertion_index, fci))
    }

    pub fn get_reindex_root(&self, staging: &StagingArea) -> DbResult<Hash> {
        Ok(*self.reindex_root.read(staging)?)
    }

    pub fn set_reindex_root(&self, staging: &mut StagingArea, root: Hash) -> DbResult<()> {
        self.reindex_root.write(staging, root)
    }
}

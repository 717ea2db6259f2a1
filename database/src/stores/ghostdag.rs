use crate::access::CachedDbAccess;
use crate::db::CF_GHOSTDAG;
use crate::{Database, DbResult, StagingArea};
use consensus_core::ghostdag::{CompactGhostdagData, GhostdagData};
use consensus_core::{BlueWorkType, Hash};
use std::sync::Arc;

#[derive(Clone)]
pub struct GhostdagStore {
    access: CachedDbAccess<Hash, GhostdagData>,
}

impl GhostdagStore {
    pub fn new(db: Arc<Database>, cache_size: usize) -> Self {
        Self { access: CachedDbAccess::new(db, CF_GHOSTDAG, cache_size) }
    }

    pub fn insert(&self, staging: &mut StagingArea, hash: Hash, data: Arc<GhostdagData>) -> DbResult<()> {
        self.access.write_arc(staging, hash, data)
    }

    pub fn get_data(&self, staging: &StagingArea, hash: Hash) -> DbResult<Arc<GhostdagData>> {
        self.access.read(staging, &hash)
    }

    pub fn get_compact_data(&self, staging: &StagingArea, hash: Hash) -> DbResult<CompactGhostdagData> {
        Ok(self.get_data(staging, hash)?.to_compact())
    }

    pub fn get_blue_score(&self, staging: &StagingArea, hash: Hash) -> DbResult<u64> {
        Ok(self.get_data(staging, hash)?.blue_score)
    }

    pub fn get_blue_work(&self, staging: &StagingArea, hash: Hash) -> DbResult<BlueWorkType> {
        Ok(self.get_data(staging, hash)?.blue_work)
    }

    pub fn get_selected_parent(&self, staging: &StagingArea, hash: Hash) -> DbResult<Hash> {
        Ok(self.get_data(staging, hash)?.selected_parent)
    }

    pub fn has(&self, staging: &StagingArea, hash: Hash) -> DbResult<bool> {
        self.access.has(staging, &hash)
    }
}

use crate::access::CachedDbAccess;
use crate::db::CF_STATUSES;
use crate::errors::StoreResultExtensions;
use crate::{Database, DbResult, StagingArea};
use consensus_core::blockstatus::BlockStatus;
use consensus_core::Hash;
use std::sync::Arc;

#[derive(Clone)]
pub struct StatusesStore {
    access: CachedDbAccess<Hash, BlockStatus>,
}

impl StatusesStore {
    pub fn new(db: Arc<Database>, cache_size: usize) -> Self {
        Self { access: CachedDbAccess::new(db, CF_STATUSES, cache_size) }
    }

    pub fn set(&self, staging: &mut StagingArea, hash: Hash, status: BlockStatus) -> DbResult<()> {
        self.access.write(staging, hash, status)
    }

    pub fn get(&self, staging: &StagingArea, hash: Hash) -> DbResult<BlockStatus> {
        Ok(*self.access.read(staging, &hash)?)
    }

    pub fn get_optional(&self, staging: &StagingArea, hash: Hash) -> DbResult<Option<BlockStatus>> {
        self.get(staging, hash).optional()
    }

    pub fn has(&self, staging: &StagingArea, hash: Hash) -> DbResult<bool> {
        self.access.has(staging, &hash)
    }
}

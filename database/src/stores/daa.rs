use crate::access::CachedDbAccess;
use crate::db::CF_DAA_ADDED;
use crate::{Database, DbResult, StagingArea};
use consensus_core::Hash;
use std::sync::Arc;

/// Per block, the mergeset blocks which entered its difficulty window
/// and therefore contributed to its DAA score
#[derive(Clone)]
pub struct DaaStore {
    access: CachedDbAccess<Hash, Vec<Hash>>,
}

impl DaaStore {
    pub fn new(db: Arc<Database>, cache_size: usize) -> Self {
        Self { access: CachedDbAccess::new(db, CF_DAA_ADDED, cache_size) }
    }

    pub fn insert(&self, staging: &mut StagingArea, hash: Hash, added_blocks: Vec<Hash>) -> DbResult<()> {
        self.access.write(staging, hash, added_blocks)
    }

    pub fn get_added_blocks(&self, staging: &StagingArea, hash: Hash) -> DbResult<Arc<Vec<Hash>>> {
        self.access.read(staging, &hash)
    }
}

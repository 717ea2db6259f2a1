use crate::access::CachedDbAccess;
use crate::db::CF_ACCEPTANCE;
use crate::{Database, DbResult, StagingArea};
use consensus_core::acceptance_data::AcceptanceData;
use consensus_core::Hash;
use std::sync::Arc;

#[derive(Clone)]
pub struct AcceptanceDataStore {
    access: CachedDbAccess<Hash, AcceptanceData>,
}

impl AcceptanceDataStore {
    pub fn new(db: Arc<Database>, cache_size: usize) -> Self {
        Self { access: CachedDbAccess::new(db, CF_ACCEPTANCE, cache_size) }
    }

    pub fn insert(&self, staging: &mut StagingArea, hash: Hash, data: Arc<AcceptanceData>) -> DbResult<()> {
        self.access.write_arc(staging, hash, data)
    }

    pub fn get(&self, staging: &StagingArea, hash: Hash) -> DbResult<Option<Arc<AcceptanceData>>> {
        self.access.get(staging, &hash)
    }

    pub fn delete(&self, staging: &mut StagingArea, hash: Hash) -> DbResult<()> {
        self.access.delete(staging, hash)
    }
}

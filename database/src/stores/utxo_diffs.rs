use crate::access::CachedDbAccess;
use crate::db::CF_UTXO_DIFFS;
use crate::{Database, DbResult, StagingArea};
use consensus_core::utxo::UtxoDiff;
use consensus_core::Hash;
use std::sync::Arc;

/// The UTXO diff each chain block applied over its selected parent
#[derive(Clone)]
pub struct UtxoDiffsStore {
    access: CachedDbAccess<Hash, UtxoDiff>,
}

impl UtxoDiffsStore {
    pub fn new(db: Arc<Database>, cache_size: usize) -> Self {
        Self { access: CachedDbAccess::new(db, CF_UTXO_DIFFS, cache_size) }
    }

    pub fn insert(&self, staging: &mut StagingArea, hash: Hash, diff: Arc<UtxoDiff>) -> DbResult<()> {
        self.access.write_arc(staging, hash, diff)
    }

    pub fn get(&self, staging: &StagingArea, hash: Hash) -> DbResult<Option<Arc<UtxoDiff>>> {
        self.access.get(staging, &hash)
    }

    pub fn read(&self, staging: &StagingArea, hash: Hash) -> DbResult<Arc<UtxoDiff>> {
        self.access.read(staging, &hash)
    }

    pub fn delete(&self, staging: &mut StagingArea, hash: Hash) -> DbResult<()> {
        self.access.delete(staging, hash)
    }
}

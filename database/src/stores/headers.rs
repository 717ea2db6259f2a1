use crate::access::CachedDbAccess;
use crate::db::CF_HEADERS;
use crate::{Database, DbResult, StagingArea};
use consensus_core::header::Header;
use consensus_core::Hash;
use std::sync::Arc;

#[derive(Clone)]
pub struct HeaderStore {
    access: CachedDbAccess<Hash, Header>,
}

impl HeaderStore {
    pub fn new(db: Arc<Database>, cache_size: usize) -> Self {
        Self { access: CachedDbAccess::new(db, CF_HEADERS, cache_size) }
    }

    pub fn insert(&self, staging: &mut StagingArea, header: Arc<Header>) -> DbResult<()> {
        self.access.write_arc(staging, header.hash, header)
    }

    pub fn get_header(&self, staging: &StagingArea, hash: Hash) -> DbResult<Arc<Header>> {
        self.access.read(staging, &hash)
    }

    pub fn has(&self, staging: &StagingArea, hash: Hash) -> DbResult<bool> {
        self.access.has(staging, &hash)
    }

    pub fn get_timestamp(&self, staging: &StagingArea, hash: Hash) -> DbResult<u64> {
        Ok(self.get_header(staging, hash)?.timestamp)
    }

    pub fn get_bits(&self, staging: &StagingArea, hash: Hash) -> DbResult<u32> {
        Ok(self.get_header(staging, hash)?.bits)
    }

    pub fn get_daa_score(&self, staging: &StagingArea, hash: Hash) -> DbResult<u64> {
        Ok(self.get_header(staging, hash)?.daa_score)
    }
}

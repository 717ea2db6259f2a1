use crate::access::CachedDbAccess;
use crate::db::CF_DEPTH;
use crate::{Database, DbResult, StagingArea};
use consensus_core::Hash;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Depth anchors of a block on its selected chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDepthInfo {
    pub merge_depth_root: Hash,
    pub finality_point: Hash,
}

#[derive(Clone)]
pub struct DepthStore {
    access: CachedDbAccess<Hash, BlockDepthInfo>,
}

impl DepthStore {
    pub fn new(db: Arc<Database>, cache_size: usize) -> Self {
        Self { access: CachedDbAccess::new(db, CF_DEPTH, cache_size) }
    }

    pub fn insert(&self, staging: &mut StagingArea, hash: Hash, merge_depth_root: Hash, finality_point: Hash) -> DbResult<()> {
        self.access.write(staging, hash, BlockDepthInfo { merge_depth_root, finality_point })
    }

    pub fn merge_depth_root(&self, staging: &StagingArea, hash: Hash) -> DbResult<Hash> {
        Ok(self.access.read(staging, &hash)?.merge_depth_root)
    }

    pub fn finality_point(&self, staging: &StagingArea, hash: Hash) -> DbResult<Hash> {
        Ok(self.access.read(staging, &hash)?.finality_point)
    }

    pub fn get(&self, staging: &StagingArea, hash: Hash) -> DbResult<Option<Arc<BlockDepthInfo>>> {
        self.access.get(staging, &hash)
    }
}

use crate::access::CachedDbAccess;
use crate::db::CF_BLOCK_TRANSACTIONS;
use crate::{Database, DbResult, StagingArea};
use consensus_core::tx::Transaction;
use consensus_core::Hash;
use std::sync::Arc;

/// Block bodies. Deleted for blocks below the pruning point.
#[derive(Clone)]
pub struct BlockTransactionsStore {
    access: CachedDbAccess<Hash, Vec<Transaction>>,
}

impl BlockTransactionsStore {
    pub fn new(db: Arc<Database>, cache_size: usize) -> Self {
        Self { access: CachedDbAccess::new(db, CF_BLOCK_TRANSACTIONS, cache_size) }
    }

    pub fn insert(&self, staging: &mut StagingArea, hash: Hash, transactions: Arc<Vec<Transaction>>) -> DbResult<()> {
        self.access.write_arc(staging, hash, transactions)
    }

    pub fn get(&self, staging: &StagingArea, hash: Hash) -> DbResult<Arc<Vec<Transaction>>> {
        self.access.read(staging, &hash)
    }

    pub fn has(&self, staging: &StagingArea, hash: Hash) -> DbResult<bool> {
        self.access.has(staging, &hash)
    }

    pub fn delete(&self, staging: &mut StagingArea, hash: Hash) -> DbResult<()> {
        self.access.delete(staging, hash)
    }
}

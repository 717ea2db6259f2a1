use crate::access::CachedDbAccess;
use crate::{Database, DbResult, StagingArea};
use consensus_core::tx::{TransactionOutpoint, UtxoEntry};
use consensus_core::utxo::{UtxoCollection, UtxoDiff};
use std::sync::Arc;

/// A materialized UTXO set. Used for the sink set and the pruning point set.
#[derive(Clone)]
pub struct UtxoSetStore {
    access: CachedDbAccess<TransactionOutpoint, UtxoEntry>,
}

impl UtxoSetStore {
    pub fn new(db: Arc<Database>, cf: &'static str, cache_size: usize) -> Self {
        Self { access: CachedDbAccess::new(db, cf, cache_size) }
    }

    pub fn get(&self, staging: &StagingArea, outpoint: &TransactionOutpoint) -> DbResult<Option<UtxoEntry>> {
        Ok(self.access.get(staging, outpoint)?.map(|entry| entry.as_ref().clone()))
    }

    pub fn has(&self, staging: &StagingArea, outpoint: &TransactionOutpoint) -> DbResult<bool> {
        self.access.has(staging, outpoint)
    }

    /// Stages the removals then the additions of `diff`
    pub fn write_diff(&self, staging: &mut StagingArea, diff: &UtxoDiff) -> DbResult<()> {
        for outpoint in diff.remove.keys() {
            self.access.delete(staging, *outpoint)?;
        }
        for (outpoint, entry) in diff.add.iter() {
            self.access.write(staging, *outpoint, entry.clone())?;
        }
        Ok(())
    }

    /// Committed entries in outpoint order, starting at `from` inclusive
    pub fn iterate_from(&self, from: Option<&TransactionOutpoint>, limit: usize) -> DbResult<Vec<(TransactionOutpoint, UtxoEntry)>> {
        Ok(self.access.iterate_from(from, limit)?.into_iter().map(|(k, v)| (k, v.as_ref().clone())).collect())
    }

    pub fn to_collection(&self, staging: &StagingArea) -> DbResult<UtxoCollection> {
        Ok(self.access.iterate_all(staging)?.into_iter().map(|(k, v)| (k, v.as_ref().clone())).collect())
    }

    /// Stages replacing the whole set with `collection`
    pub fn replace(&self, staging: &mut StagingArea, collection: &UtxoCollection) -> DbResult<()> {
        self.access.delete_all(staging)?;
        for (outpoint, entry) in collection.iter() {
            self.access.write(staging, *outpoint, entry.clone())?;
        }
        Ok(())
    }
}

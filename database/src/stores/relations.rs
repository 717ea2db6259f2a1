use crate::access::CachedDbAccess;
use crate::db::{CF_RELATIONS_CHILDREN, CF_RELATIONS_PARENTS};
use crate::{Database, DbResult, StagingArea};
use consensus_core::Hash;
use std::sync::Arc;

/// Direct DAG parents and children of every block
#[derive(Clone)]
pub struct RelationsStore {
    parents: CachedDbAccess<Hash, Vec<Hash>>,
    children: CachedDbAccess<Hash, Vec<Hash>>,
}

impl RelationsStore {
    pub fn new(db: Arc<Database>, cache_size: usize) -> Self {
        Self {
            parents: CachedDbAccess::new(db.clone(), CF_RELATIONS_PARENTS, cache_size),
            children: CachedDbAccess::new(db, CF_RELATIONS_CHILDREN, cache_size),
        }
    }

    /// Stages `hash` with its parents and registers it as a child of each parent
    pub fn insert(&self, staging: &mut StagingArea, hash: Hash, parents: Vec<Hash>) -> DbResult<()> {
        for parent in parents.iter().copied() {
            let mut children = self.children.get(staging, &parent)?.map(|c| c.as_ref().clone()).unwrap_or_default();
            if !children.contains(&hash) {
                children.push(hash);
            }
            self.children.write(staging, parent, children)?;
        }
        if !self.children.has(staging, &hash)? {
            self.children.write(staging, hash, Vec::new())?;
        }
        self.parents.write(staging, hash, parents)
    }

    pub fn get_parents(&self, staging: &StagingArea, hash: Hash) -> DbResult<Arc<Vec<Hash>>> {
        self.parents.read(staging, &hash)
    }

    pub fn get_children(&self, staging: &StagingArea, hash: Hash) -> DbResult<Arc<Vec<Hash>>> {
        self.children.read(staging, &hash)
    }

    pub fn has(&self, staging: &StagingArea, hash: Hash) -> DbResult<bool> {
        self.parents.has(staging, &hash)
    }
}

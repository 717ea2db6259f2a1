use super::reachability::ReachabilityService;
use consensus_core::errors::{ConsensusError, ConsensusResult};
use consensus_core::{BlockHashSet, Hash};
use database::stores::{MetadataStore, RelationsStore};
use database::{StagingArea, StoreResultExtensions};
use std::sync::Arc;

/// Parent/child relations, DAG tips, and ancestry through reachability
#[derive(Clone)]
pub struct DagTopologyManager {
    relations: RelationsStore,
    metadata: MetadataStore,
    reachability: Arc<dyn ReachabilityService>,
}

impl DagTopologyManager {
    pub fn new(relations: RelationsStore, metadata: MetadataStore, reachability: Arc<dyn ReachabilityService>) -> Self {
        Self { relations, metadata, reachability }
    }

    pub fn parents(&self, staging: &StagingArea, hash: Hash) -> ConsensusResult<Arc<Vec<Hash>>> {
        self.relations.get_parents(staging, hash).optional()?.ok_or(ConsensusError::UnknownBlock(hash))
    }

    pub fn children(&self, staging: &StagingArea, hash: Hash) -> ConsensusResult<Arc<Vec<Hash>>> {
        self.relations.get_children(staging, hash).optional()?.ok_or(ConsensusError::UnknownBlock(hash))
    }

    pub fn has(&self, staging: &StagingArea, hash: Hash) -> ConsensusResult<bool> {
        Ok(self.relations.has(staging, hash)?)
    }

    pub fn is_parent_of(&self, staging: &StagingArea, this: Hash, queried: Hash) -> ConsensusResult<bool> {
        Ok(self.parents(staging, queried)?.contains(&this))
    }

    /// Strict DAG ancestry: `this ∈ past(queried)`
    pub fn is_ancestor_of(&self, staging: &StagingArea, this: Hash, queried: Hash) -> ConsensusResult<bool> {
        Ok(this != queried && self.reachability.is_dag_ancestor_of(staging, this, queried)?)
    }

    pub fn is_ancestor_of_any(&self, staging: &StagingArea, this: Hash, queried: &[Hash]) -> ConsensusResult<bool> {
        for &hash in queried {
            if self.is_ancestor_of(staging, this, hash)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Registers `hash` as a child of each of `parents` and as a new tip
    pub fn set_parents(&self, staging: &mut StagingArea, hash: Hash, parents: &[Hash]) -> ConsensusResult<()> {
        if self.relations.has(staging, hash)? {
            return Err(ConsensusError::General(format!("relations of {hash} are already set")));
        }
        self.relations.insert(staging, hash, parents.to_vec())?;

        let mut tips = self.tips(staging)?;
        for parent in parents {
            tips.remove(parent);
        }
        tips.insert(hash);
        self.metadata.set_tips(staging, tips)?;
        Ok(())
    }

    /// Blocks without children
    pub fn tips(&self, staging: &StagingArea) -> ConsensusResult<BlockHashSet> {
        Ok(self.metadata.get_tips(staging).optional()?.map(|tips| tips.as_ref().clone()).unwrap_or_default())
    }
}

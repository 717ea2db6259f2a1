use crate::access::CachedDbItem;
use crate::{Database, DbResult, StagingArea};
use consensus_core::{BlockHashSet, Hash};
use std::sync::Arc;

/// DAG-wide singletons
#[derive(Clone)]
pub struct MetadataStore {
    tips: CachedDbItem<BlockHashSet>,
    body_tips: CachedDbItem<BlockHashSet>,
    headers_selected_tip: CachedDbItem<Hash>,
    pruning_point: CachedDbItem<Hash>,
    pruning_utxoset_position: CachedDbItem<Hash>,
    virtual_finality_point: CachedDbItem<Hash>,
}

impl MetadataStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            tips: CachedDbItem::new(db.clone(), "tips"),
            body_tips: CachedDbItem::new(db.clone(), "body-tips"),
            headers_selected_tip: CachedDbItem::new(db.clone(), "headers-selected-tip"),
            pruning_point: CachedDbItem::new(db.clone(), "pruning-point"),
            pruning_utxoset_position: CachedDbItem::new(db.clone(), "pruning-utxoset-position"),
            virtual_finality_point: CachedDbItem::new(db, "virtual-finality-point"),
        }
    }

    /// Every block without children, header-only blocks included
    pub fn get_tips(&self, staging: &StagingArea) -> DbResult<Arc<BlockHashSet>> {
        self.tips.read(staging)
    }

    pub fn set_tips(&self, staging: &mut StagingArea, tips: BlockHashSet) -> DbResult<()> {
        self.tips.write(staging, tips)
    }

    /// Tips of the sub-DAG of blocks with bodies
    pub fn get_body_tips(&self, staging: &StagingArea) -> DbResult<Arc<BlockHashSet>> {
        self.body_tips.read(staging)
    }

    pub fn set_body_tips(&self, staging: &mut StagingArea, tips: BlockHashSet) -> DbResult<()> {
        self.body_tips.write(staging, tips)
    }

    pub fn get_headers_selected_tip(&self, staging: &StagingArea) -> DbResult<Hash> {
        Ok(*self.headers_selected_tip.read(staging)?)
    }

    pub fn set_headers_selected_tip(&self, staging: &mut StagingArea, hash: Hash) -> DbResult<()> {
        self.headers_selected_tip.write(staging, hash)
    }

    pub fn get_pruning_point(&self, staging: &StagingArea) -> DbResult<Hash> {
        Ok(*self.pruning_point.read(staging)?)
    }

    pub fn set_pruning_point(&self, staging: &mut StagingArea, hash: Hash) -> DbResult<()> {
        self.pruning_point.write(staging, hash)
    }

    /// The pruning point the stored pruning UTXO set corresponds to
    pub fn get_pruning_utxoset_position(&self, staging: &StagingArea) -> DbResult<Hash> {
        Ok(*self.pruning_utxoset_position.read(staging)?)
    }

    pub fn set_pruning_utxoset_position(&self, staging: &mut StagingArea, hash: Hash) -> DbResult<()> {
        self.pruning_utxoset_position.write(staging, hash)
    }

    pub fn get_virtual_finality_point(&self, staging: &StagingArea) -> DbResult<Hash> {
        Ok(*self.virtual_finality_point.read(staging)?)
    }

    pub fn set_virtual_finality_point(&self, staging: &mut StagingArea, hash: Hash) -> DbResult<()> {
        self.virtual_finality_point.write(staging, hash)
    }

    /// Whether the DAG was initialized with genesis
    pub fn is_initialized(&self, staging: &StagingArea) -> DbResult<bool> {
        Ok(self.tips.get(staging)?.is_some())
    }
}

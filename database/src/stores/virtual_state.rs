use crate::access::CachedDbItem;
use crate::{Database, DbResult, StagingArea};
use consensus_core::ghostdag::GhostdagData;
use consensus_core::tx::TransactionId;
use consensus_core::utxo::UtxoDiff;
use consensus_core::Hash;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const VIRTUAL_STATE_KEY: &str = "virtual-state";

/// The state of the virtual block: the imaginary block whose parents are the current DAG tips
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualState {
    pub parents: Vec<Hash>,
    pub ghostdag_data: GhostdagData,
    pub daa_score: u64,
    pub bits: u32,
    pub past_median_time: u64,
    pub accepted_tx_ids: Vec<TransactionId>,
    /// Diff of the virtual mergeset on top of the sink UTXO set
    pub utxo_diff: UtxoDiff,
}

impl VirtualState {
    pub fn sink(&self) -> Hash {
        self.ghostdag_data.selected_parent
    }
}

#[derive(Clone)]
pub struct VirtualStateStore {
    item: CachedDbItem<VirtualState>,
}

impl VirtualStateStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { item: CachedDbItem::new(db, VIRTUAL_STATE_KEY) }
    }

    pub fn get(&self, staging: &StagingArea) -> DbResult<Arc<VirtualState>> {
        self.item.read(staging)
    }

    pub fn get_optional(&self, staging: &StagingArea) -> DbResult<Option<Arc<VirtualState>>> {
        self.item.get(staging)
    }

    pub fn set(&self, staging: &mut StagingArea, state: VirtualState) -> DbResult<()> {
        self.item.write(staging, state)
    }
}

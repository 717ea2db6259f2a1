//! UTXO views over stored sets
//!
//! Lets the acceptance rules read a stored UTXO set through the staging area, so
//! that entries written earlier in the same commit are visible.

use consensus_core::errors::ConsensusResult;
use consensus_core::tx::{TransactionOutpoint, UtxoEntry};
use consensus_core::utxo::UtxoView;
use database::stores::UtxoSetStore;
use database::StagingArea;

pub struct StoreUtxoView<'a> {
    store: &'a UtxoSetStore,
    staging: &'a StagingArea,
}

impl<'a> StoreUtxoView<'a> {
    pub fn new(store: &'a UtxoSetStore, staging: &'a StagingArea) -> Self {
        Self { store, staging }
    }
}

impl UtxoView for StoreUtxoView<'_> {
    fn get(&self, outpoint: &TransactionOutpoint) -> ConsensusResult<Option<UtxoEntry>> {
        Ok(self.store.get(self.staging, outpoint)?)
    }
}

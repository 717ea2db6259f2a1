use serde::{Deserialize, Serialize};

use super::{
    utxo_collection::UtxoCollection,
    utxo_error::{UtxoAlgebraError, UtxoResult},
};
use crate::tx::{TransactionOutpoint, UtxoEntry};

/// The change a set of accepted transactions makes to a UTXO set.
/// `remove` keeps the spent entries so the diff can be reversed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UtxoDiff {
    pub add: UtxoCollection,
    pub remove: UtxoCollection,
}

impl UtxoDiff {
    pub fn new(add: UtxoCollection, remove: UtxoCollection) -> Self {
        Self { add, remove }
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    /// Records a newly created entry. Re-adding a previously removed entry cancels the removal.
    pub fn add_entry(&mut self, outpoint: TransactionOutpoint, entry: UtxoEntry) -> UtxoResult<()> {
        if self.remove.get(&outpoint) == Some(&entry) {
            self.remove.remove(&outpoint);
        } else if self.add.insert(outpoint, entry).is_some() {
            return Err(UtxoAlgebraError::DuplicateAddPoint(outpoint));
        }
        Ok(())
    }

    /// Records a spent entry. Spending an entry added by this same diff cancels the addition.
    pub fn remove_entry(&mut self, outpoint: TransactionOutpoint, entry: UtxoEntry) -> UtxoResult<()> {
        if self.add.remove(&outpoint).is_some() {
            return Ok(());
        }
        if self.remove.insert(outpoint, entry).is_some() {
            return Err(UtxoAlgebraError::DoubleRemoval(outpoint));
        }
        Ok(())
    }

    /// Appends `other` on top of this diff
    pub fn with_diff_in_place(&mut self, other: &UtxoDiff) -> UtxoResult<()> {
        for (outpoint, entry) in other.remove.iter() {
            self.remove_entry(*outpoint, entry.clone())?;
        }
        for (outpoint, entry) in other.add.iter() {
            self.add_entry(*outpoint, entry.clone())?;
        }
        Ok(())
    }

    /// Returns the diff undoing this one
    pub fn as_reversed(&self) -> UtxoDiff {
        UtxoDiff { add: self.remove.clone(), remove: self.add.clone() }
    }

    /// Applies the diff to a materialized UTXO collection
    pub fn apply_to(&self, collection: &mut UtxoCollection) -> UtxoResult<()> {
        for outpoint in self.remove.keys() {
            if collection.remove(outpoint).is_none() {
                return Err(UtxoAlgebraError::DuplicateRemovePoint(*outpoint));
            }
        }
        for (outpoint, entry) in self.add.iter() {
            if collection.insert(*outpoint, entry.clone()).is_some() {
                return Err(UtxoAlgebraError::DuplicateAddPoint(*outpoint));
            }
        }
        Ok(())
    }
}

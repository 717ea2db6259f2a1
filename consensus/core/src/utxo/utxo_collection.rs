use std::collections::HashMap;

use crate::tx::{TransactionOutpoint, UtxoEntry};

pub type UtxoCollection = HashMap<TransactionOutpoint, UtxoEntry>;

pub trait UtxoCollectionExtensions {
    /// Sum of all amounts, widened to avoid overflow
    fn total_amount(&self) -> u128;

    /// Entries sorted by outpoint
    fn sorted_entries(&self) -> Vec<(TransactionOutpoint, UtxoEntry)>;
}

impl UtxoCollectionExtensions for UtxoCollection {
    fn total_amount(&self) -> u128 {
        self.values().map(|entry| entry.amount as u128).sum()
    }

    fn sorted_entries(&self) -> Vec<(TransactionOutpoint, UtxoEntry)> {
        let mut entries: Vec<_> = self.iter().map(|(k, v)| (*k, v.clone())).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

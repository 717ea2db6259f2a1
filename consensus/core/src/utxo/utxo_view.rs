use super::{utxo_collection::UtxoCollection, utxo_diff::UtxoDiff};
use crate::errors::ConsensusResult;
use crate::tx::{TransactionOutpoint, UtxoEntry};

/// Read access to some UTXO set. Fallible since views may be backed by storage.
pub trait UtxoView {
    fn get(&self, outpoint: &TransactionOutpoint) -> ConsensusResult<Option<UtxoEntry>>;

    fn contains(&self, outpoint: &TransactionOutpoint) -> ConsensusResult<bool> {
        Ok(self.get(outpoint)?.is_some())
    }
}

impl UtxoView for UtxoCollection {
    fn get(&self, outpoint: &TransactionOutpoint) -> ConsensusResult<Option<UtxoEntry>> {
        Ok(std::collections::HashMap::get(self, outpoint).cloned())
    }
}

impl<V: UtxoView + ?Sized> UtxoView for &V {
    fn get(&self, outpoint: &TransactionOutpoint) -> ConsensusResult<Option<UtxoEntry>> {
        (**self).get(outpoint)
    }
}

/// A base view with a diff layered on top
pub struct ComposedUtxoView<'a, V: UtxoView + ?Sized> {
    base: &'a V,
    diff: &'a UtxoDiff,
}

impl<'a, V: UtxoView + ?Sized> ComposedUtxoView<'a, V> {
    pub fn new(base: &'a V, diff: &'a UtxoDiff) -> Self {
        Self { base, diff }
    }
}

impl<V: UtxoView + ?Sized> UtxoView for ComposedUtxoView<'_, V> {
    fn get(&self, outpoint: &TransactionOutpoint) -> ConsensusResult<Option<UtxoEntry>> {
        if let Some(entry) = self.diff.add.get(outpoint) {
            return Ok(Some(entry.clone()));
        }
        if self.diff.remove.contains_key(outpoint) {
            return Ok(None);
        }
        self.base.get(outpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::ScriptPublicKey;
    use crate::Hash;

    #[test]
    fn test_composed_view_prefers_diff() {
        let spent = TransactionOutpoint::new(Hash::from_u64_word(1), 0);
        let created = TransactionOutpoint::new(Hash::from_u64_word(2), 0);
        let entry = UtxoEntry::new(5, ScriptPublicKey::default(), 0, false);

        let mut base = UtxoCollection::new();
        base.insert(spent, entry.clone());

        let mut diff = UtxoDiff::default();
        diff.remove_entry(spent, entry.clone()).unwrap();
        diff.add_entry(created, entry.clone()).unwrap();

        let view = ComposedUtxoView::new(&base, &diff);
        assert!(!view.contains(&spent).unwrap());
        assert_eq!(view.get(&created).unwrap(), Some(entry));
    }
}

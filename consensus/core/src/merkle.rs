use jio_hashes::calc_merkle_root;

use crate::{tx::Transaction, Hash};

/// Merkle root over the ids of `transactions`, in block order
pub fn calc_hash_merkle_root<'a>(transactions: impl ExactSizeIterator<Item = &'a Transaction>) -> Hash {
    calc_merkle_root(transactions.map(|tx| tx.id()))
}

/// Merkle root over accepted transaction ids, in acceptance order
pub fn calc_accepted_id_merkle_root(accepted_tx_ids: &[Hash]) -> Hash {
    calc_merkle_root(accepted_tx_ids.iter().copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::{ScriptPublicKey, TransactionOutput};
    use crate::ZERO_HASH;

    #[test]
    fn test_merkle_root_matches_tx_ids() {
        let tx = Transaction::new_coinbase(vec![TransactionOutput::new(1, ScriptPublicKey::default())], vec![7]);
        let root = calc_hash_merkle_root([tx.clone()].iter());
        assert_ne!(root, ZERO_HASH);
        assert_eq!(root, calc_merkle_root(std::iter::once(tx.id())));
        assert_eq!(calc_accepted_id_merkle_root(&[]), ZERO_HASH);
    }
}

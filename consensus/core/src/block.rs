use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{header::Header, tx::Transaction, Hash};

/// A block: header plus transactions. A block without transactions is header-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub header: Arc<Header>,
    pub transactions: Arc<Vec<Transaction>>,
}

impl Block {
    pub fn new(header: Header, transactions: Vec<Transaction>) -> Self {
        Self { header: Arc::new(header), transactions: Arc::new(transactions) }
    }

    pub fn from_arcs(header: Arc<Header>, transactions: Arc<Vec<Transaction>>) -> Self {
        Self { header, transactions }
    }

    pub fn from_header(header: Header) -> Self {
        Self::new(header, Vec::new())
    }

    pub fn hash(&self) -> Hash {
        self.header.hash
    }

    pub fn is_header_only(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Sum of transaction masses
    pub fn mass(&self) -> u64 {
        self.transactions.iter().map(|tx| tx.mass()).sum()
    }

    /// Copy of this block stripped of its body
    pub fn to_header_only(&self) -> Self {
        Self { header: self.header.clone(), transactions: Arc::new(Vec::new()) }
    }
}

/// Coinbase template data supplied by the miner when building a block
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinbaseData {
    pub script_public_key: crate::tx::ScriptPublicKey,
    pub extra_data: Vec<u8>,
}

impl CoinbaseData {
    pub fn new(script_public_key: crate::tx::ScriptPublicKey, extra_data: Vec<u8>) -> Self {
        Self { script_public_key, extra_data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::{ScriptPublicKey, TransactionOutput};
    use crate::ZERO_HASH;

    #[test]
    fn test_header_only_detection() {
        let header = Header::from_precomputed_hash(Hash::from_u64_word(3), vec![ZERO_HASH]);
        let block = Block::from_header(header.clone());
        assert!(block.is_header_only());
        assert_eq!(block.hash(), Hash::from_u64_word(3));

        let cb = Transaction::new_coinbase(vec![TransactionOutput::new(1, ScriptPublicKey::default())], vec![]);
        let full = Block::new(header, vec![cb]);
        assert!(!full.is_header_only());
        assert!(full.to_header_only().is_header_only());
        assert_eq!(full.mass(), full.transactions[0].mass());
    }
}

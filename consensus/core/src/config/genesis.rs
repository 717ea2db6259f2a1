use serde::{Deserialize, Serialize};

use crate::{
    block::Block,
    constants::BLOCK_VERSION,
    header::Header,
    merkle::calc_hash_merkle_root,
    tx::Transaction,
    BlueWorkType, Hash, ZERO_HASH,
};

/// The constants uniquely defining the genesis block of a network
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenesisBlock {
    pub version: u16,
    pub timestamp: u64,
    pub bits: u32,
    pub nonce: u64,
    pub coinbase_payload: Vec<u8>,
}

impl GenesisBlock {
    /// Genesis carries a single coinbase without outputs, so the initial UTXO set is empty
    pub fn coinbase(&self) -> Transaction {
        Transaction::new_coinbase(Vec::new(), self.coinbase_payload.clone())
    }

    pub fn header(&self) -> Header {
        let coinbase = self.coinbase();
        Header::new_finalized(
            self.version,
            Vec::new(),
            calc_hash_merkle_root(std::iter::once(&coinbase)),
            ZERO_HASH,
            ZERO_HASH,
            self.timestamp,
            self.bits,
            self.nonce,
            0,
            BlueWorkType::ZERO,
            0,
            ZERO_HASH,
        )
    }

    pub fn hash(&self) -> Hash {
        self.header().hash
    }

    pub fn block(&self) -> Block {
        Block::new(self.header(), vec![self.coinbase()])
    }
}

pub fn devnet_genesis() -> GenesisBlock {
    GenesisBlock {
        version: BLOCK_VERSION,
        timestamp: 1_762_971_421_786,
        bits: 0x207f_ffff,
        nonce: 0,
        coinbase_payload: b"jio devnet genesis".to_vec(),
    }
}

pub fn mainnet_genesis() -> GenesisBlock {
    GenesisBlock {
        version: BLOCK_VERSION,
        timestamp: 1_762_971_421_786,
        bits: 0x1f00_ffff,
        nonce: 38_922,
        coinbase_payload: b"Jio deterministic genesis - 2025-11-12".to_vec(),
    }
}

use serde::{Deserialize, Serialize};

use crate::{hashing, BlueWorkType, Hash, ZERO_HASH};

/// Immutable block header. The `hash` field caches the header hash and is
/// recomputed by [`Header::finalize`] after any field edit during block building.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub hash: Hash,
    pub version: u16,
    pub parents: Vec<Hash>,
    pub hash_merkle_root: Hash,
    pub accepted_id_merkle_root: Hash,
    pub utxo_commitment: Hash,
    /// Milliseconds since the unix epoch
    pub timestamp: u64,
    pub bits: u32,
    pub nonce: u64,
    pub daa_score: u64,
    pub blue_work: BlueWorkType,
    pub blue_score: u64,
    pub pruning_point: Hash,
}

impl Header {
    #[allow(clippy::too_many_arguments)]
    pub fn new_finalized(
        version: u16,
        parents: Vec<Hash>,
        hash_merkle_root: Hash,
        accepted_id_merkle_root: Hash,
        utxo_commitment: Hash,
        timestamp: u64,
        bits: u32,
        nonce: u64,
        daa_score: u64,
        blue_work: BlueWorkType,
        blue_score: u64,
        pruning_point: Hash,
    ) -> Self {
        let mut header = Self {
            hash: ZERO_HASH,
            version,
            parents,
            hash_merkle_root,
            accepted_id_merkle_root,
            utxo_commitment,
            timestamp,
            bits,
            nonce,
            daa_score,
            blue_work,
            blue_score,
            pruning_point,
        };
        header.finalize();
        header
    }

    /// Recomputes the cached hash
    pub fn finalize(&mut self) {
        self.hash = hashing::header::hash(self);
    }

    pub fn direct_parents(&self) -> &[Hash] {
        &self.parents
    }

    /// A header skeleton carrying only a hash and parents. Used by tests which
    /// exercise topology without full block construction.
    pub fn from_precomputed_hash(hash: Hash, parents: Vec<Hash>) -> Self {
        Self {
            hash,
            version: crate::constants::BLOCK_VERSION,
            parents,
            hash_merkle_root: ZERO_HASH,
            accepted_id_merkle_root: ZERO_HASH,
            utxo_commitment: ZERO_HASH,
            timestamp: 0,
            bits: 0,
            nonce: 0,
            daa_score: 0,
            blue_work: BlueWorkType::ZERO,
            blue_score: 0,
            pruning_point: ZERO_HASH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> Header {
        Header::new_finalized(
            1,
            vec![Hash::from_u64_word(1), Hash::from_u64_word(2)],
            Hash::from_u64_word(3),
            ZERO_HASH,
            ZERO_HASH,
            1_700_000_000_000,
            0x207fffff,
            7,
            10,
            BlueWorkType::from(42u64),
            9,
            Hash::from_u64_word(4),
        )
    }

    #[test]
    fn test_finalize_tracks_field_edits() {
        let mut header = sample_header();
        let original = header.hash;
        assert_ne!(original, ZERO_HASH);
        header.nonce += 1;
        header.finalize();
        assert_ne!(header.hash, original);
        header.nonce -= 1;
        header.finalize();
        assert_eq!(header.hash, original);
    }

    #[test]
    fn test_serde_roundtrip_keeps_hash() {
        let header = sample_header();
        let bytes = bincode::serialize(&header).unwrap();
        let decoded: Header = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(hashing::header::hash(&decoded), header.hash);
    }
}

use jio_hashes::HashWriter;

use crate::{header::Header, Hash};

/// Computes the header hash over its wire layout:
/// version, parent count and parents, the three merkle roots, timestamp, bits,
/// nonce, DAA score, blue score, big-endian blue work and the pruning point.
pub fn hash(header: &Header) -> Hash {
    let mut writer = HashWriter::new();
    writer.write_u16(header.version).write_u64(header.parents.len() as u64);
    for parent in header.parents.iter() {
        writer.update(parent);
    }
    writer
        .update(header.hash_merkle_root)
        .update(header.accepted_id_merkle_root)
        .update(header.utxo_commitment)
        .write_u64(header.timestamp)
        .write_u32(header.bits)
        .write_u64(header.nonce)
        .write_u64(header.daa_score)
        .write_u64(header.blue_score)
        .update(header.blue_work.to_be_bytes())
        .update(header.pruning_point);
    writer.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlueWorkType, ZERO_HASH};

    #[test]
    fn test_parent_order_changes_hash() {
        let a = Hash::from_u64_word(1);
        let b = Hash::from_u64_word(2);
        let h1 = Header::new_finalized(1, vec![a, b], ZERO_HASH, ZERO_HASH, ZERO_HASH, 5, 0x207fffff, 0, 0, BlueWorkType::ZERO, 0, ZERO_HASH);
        let h2 = Header::new_finalized(1, vec![b, a], ZERO_HASH, ZERO_HASH, ZERO_HASH, 5, 0x207fffff, 0, 0, BlueWorkType::ZERO, 0, ZERO_HASH);
        assert_ne!(h1.hash, h2.hash);
        assert_eq!(hash(&h1), h1.hash);
    }

    #[test]
    fn test_blue_work_is_committed() {
        let mut header = Header::from_precomputed_hash(ZERO_HASH, vec![]);
        let before = hash(&header);
        header.blue_work = BlueWorkType::from(1u64);
        assert_ne!(hash(&header), before);
    }
}

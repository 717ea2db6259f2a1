use crate::{Hash, HashWriter, ZERO_HASH};

fn merkle_hash(left: Hash, right: Hash) -> Hash {
    let mut writer = HashWriter::new();
    writer.update(left).update(right);
    writer.finalize()
}

/// Computes the merkle root of the given leaves. An odd node at any level is
/// paired with itself; an empty input yields [`ZERO_HASH`].
pub fn calc_merkle_root(hashes: impl ExactSizeIterator<Item = Hash>) -> Hash {
    let mut level: Vec<Hash> = hashes.collect();
    if level.is_empty() {
        return ZERO_HASH;
    }
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => merkle_hash(*left, *right),
                [single] => merkle_hash(*single, *single),
                _ => unreachable!("chunks(2) yields one or two items"),
            })
            .collect();
    }
    level[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_empty_tree() {
        assert_eq!(calc_merkle_root(std::iter::empty::<Hash>()), ZERO_HASH);
    }

    #[test]
    fn test_single_leaf() {
        let hash = Hash::from_bytes(hex!("0000000000000000000000000000000000000000000000000000000000000001"));
        assert_eq!(calc_merkle_root([hash].into_iter()), hash);
    }

    #[test]
    fn test_two_leaves() {
        let hash1 = Hash::from_u64_word(1);
        let hash2 = Hash::from_u64_word(2);
        let mut writer = HashWriter::new();
        writer.update(hash1).update(hash2);
        assert_eq!(calc_merkle_root([hash1, hash2].into_iter()), writer.finalize());
    }

    #[test]
    fn test_odd_leaf_is_duplicated() {
        let leaves = [Hash::from_u64_word(1), Hash::from_u64_word(2), Hash::from_u64_word(3)];
        let expected = merkle_hash(merkle_hash(leaves[0], leaves[1]), merkle_hash(leaves[2], leaves[2]));
        assert_eq!(calc_merkle_root(leaves.into_iter()), expected);
    }
}

//! 32-byte hash type and the double-SHA256 hashing helpers shared by every crate
//! in the workspace.

pub mod hasher;
pub mod merkle;

pub use hasher::{double_sha256, sha256, HashWriter, Hashable};
pub use merkle::calc_merkle_root;

use std::fmt;
use std::hash::Hash as StdHash;
use std::ops::Deref;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const HASH_SIZE: usize = 32;

/// The all-zero hash. Used as the "origin" sentinel (the selected parent of genesis)
/// and as the empty value of commitment fields.
pub const ZERO_HASH: Hash = Hash([0u8; HASH_SIZE]);

/// A 32-byte hash wrapper used across the project.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    /// Create a hash from a 32-byte array
    pub const fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns raw bytes
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_SIZE]
    }

    /// Constructs a hash from four little-endian u64s (used in tests)
    pub const fn from_le_u64(parts: [u64; 4]) -> Self {
        let mut bytes = [0u8; HASH_SIZE];
        let mut i = 0;
        while i < 4 {
            let part = parts[i];
            let mut j = 0;
            while j < 8 {
                bytes[i * 8 + j] = ((part >> (8 * j)) & 0xFF) as u8;
                j += 1;
            }
            i += 1;
        }
        Self(bytes)
    }

    /// Shorthand for `from_le_u64([word, 0, 0, 0])`
    pub const fn from_u64_word(word: u64) -> Self {
        Self::from_le_u64([word, 0, 0, 0])
    }

    /// Tries to create a Hash from a slice of bytes
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, std::array::TryFromSliceError> {
        let array: [u8; HASH_SIZE] = slice.try_into()?;
        Ok(Self(array))
    }

    fn le_words(&self) -> [u64; 4] {
        let mut words = [0u64; 4];
        for (i, chunk) in self.0.chunks_exact(8).enumerate() {
            let mut le = [0u8; 8];
            le.copy_from_slice(chunk);
            words[i] = u64::from_le_bytes(le);
        }
        words
    }
}

impl From<[u8; HASH_SIZE]> for Hash {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }
}

impl From<Hash> for [u8; HASH_SIZE] {
    fn from(h: Hash) -> Self {
        h.0
    }
}

impl TryFrom<&[u8]> for Hash {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        Self::try_from_slice(slice)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Deref for Hash {
    type Target = [u8; HASH_SIZE];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", hex::encode(self.0))
    }
}

impl FromStr for Hash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; HASH_SIZE];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

// Hashes are uniformly distributed, so folding the words is enough for hash maps.
// Test hashes built with `from_u64_word` only populate the first word.
impl StdHash for Hash {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        let [a, b, c, d] = self.le_words();
        state.write_u64(a ^ b ^ c ^ d);
    }
}

impl Hashable for Hash {
    fn write_to(&self, writer: &mut HashWriter) {
        writer.update(self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_le_u64_roundtrip() {
        let h = Hash::from_le_u64([1, 2, 3, 4]);
        let bytes = h.as_bytes();
        assert_eq!(&bytes[0..8], &1u64.to_le_bytes());
        assert_eq!(&bytes[8..16], &2u64.to_le_bytes());
        assert_eq!(&bytes[24..32], &4u64.to_le_bytes());
    }

    #[test]
    fn test_hex_display_parses_back() {
        let h = Hash::from_le_u64([7, 0, 0, 0xdead]);
        let parsed: Hash = h.to_string().parse().unwrap();
        assert_eq!(parsed, h);
        assert!("zz".parse::<Hash>().is_err());
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let small = Hash::from_bytes([0u8; 32]);
        let mut big_bytes = [0u8; 32];
        big_bytes[0] = 1;
        let big = Hash::from_bytes(big_bytes);
        assert!(small < big);
        assert!(small.is_zero());
        assert_eq!(small, ZERO_HASH);
    }
}

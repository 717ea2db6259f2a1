use consensus_core::{tx::TransactionOutpoint, Hash};

use crate::errors::{DbError, DbResult};

/// A value usable as a store key. Byte order must follow the key ordering for
/// keys iterated in order.
pub trait DbKey {
    fn key_bytes(&self) -> Vec<u8>;
}

/// A key that can be decoded back while iterating a store
pub trait DbKeyDecode: DbKey + Sized {
    fn from_key_bytes(bytes: &[u8]) -> DbResult<Self>;
}

impl DbKey for Hash {
    fn key_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl DbKeyDecode for Hash {
    fn from_key_bytes(bytes: &[u8]) -> DbResult<Self> {
        Hash::try_from_slice(bytes).map_err(|_| DbError::InvalidData(format!("bad hash key of length {}", bytes.len())))
    }
}

impl DbKey for TransactionOutpoint {
    fn key_bytes(&self) -> Vec<u8> {
        let mut key = Vec::with_capacity(36);
        key.extend_from_slice(self.transaction_id.as_bytes());
        key.extend_from_slice(&self.index.to_be_bytes());
        key
    }
}

impl DbKeyDecode for TransactionOutpoint {
    fn from_key_bytes(bytes: &[u8]) -> DbResult<Self> {
        if bytes.len() != 36 {
            return Err(DbError::InvalidData(format!("bad outpoint key of length {}", bytes.len())));
        }
        let transaction_id = Hash::from_key_bytes(&bytes[..32])?;
        let mut index = [0u8; 4];
        index.copy_from_slice(&bytes[32..]);
        Ok(TransactionOutpoint::new(transaction_id, u32::from_be_bytes(index)))
    }
}

impl DbKey for &'static str {
    fn key_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outpoint_key_order_follows_outpoint_order() {
        let a = TransactionOutpoint::new(Hash::from_u64_word(1), 2);
        let b = TransactionOutpoint::new(Hash::from_u64_word(1), 256);
        let c = TransactionOutpoint::new(Hash::from_u64_word(2), 0);
        assert!(a < b && b < c);
        assert!(a.key_bytes() < b.key_bytes() && b.key_bytes() < c.key_bytes());
        assert_eq!(TransactionOutpoint::from_key_bytes(&b.key_bytes()).unwrap(), b);
    }
}

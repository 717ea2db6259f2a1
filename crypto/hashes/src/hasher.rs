use sha2::{Digest, Sha256};
use std::io::Write;

use crate::Hash;

/// Types with a canonical byte encoding that feeds a [`HashWriter`].
pub trait Hashable {
    fn write_to(&self, writer: &mut HashWriter);
}

/// Compute SHA256(SHA256(data))
pub fn double_sha256(data: &[u8]) -> Hash {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    Hash::from_bytes(second.into())
}

/// Compute SHA256(data)
pub fn sha256(data: &[u8]) -> Hash {
    Hash::from_bytes(Sha256::digest(data).into())
}

/// Incremental double-SHA256 writer. Integers are written little-endian.
#[derive(Clone, Default)]
pub struct HashWriter(Sha256);

impl HashWriter {
    pub fn new() -> Self {
        Self(Sha256::new())
    }

    pub fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self {
        self.0.update(data.as_ref());
        self
    }

    pub fn write_u16(&mut self, v: u16) -> &mut Self {
        self.update(v.to_le_bytes())
    }

    pub fn write_u32(&mut self, v: u32) -> &mut Self {
        self.update(v.to_le_bytes())
    }

    pub fn write_u64(&mut self, v: u64) -> &mut Self {
        self.update(v.to_le_bytes())
    }

    /// Length-prefixed variable byte string
    pub fn write_var_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_u64(bytes.len() as u64).update(bytes)
    }

    pub fn hash_object<T: Hashable>(&mut self, obj: &T) -> &mut Self {
        obj.write_to(self);
        self
    }

    /// Finalizes as SHA256(SHA256(written bytes))
    pub fn finalize(self) -> Hash {
        let first = self.0.finalize();
        Hash::from_bytes(Sha256::digest(first).into())
    }
}

impl Write for HashWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

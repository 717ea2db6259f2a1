use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// 192-bit unsigned integer implemented as 3 little-endian u64 limbs.
/// Large enough to accumulate the proof-of-work of any realistic DAG.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Uint192([u64; 3]);

impl Uint192 {
    pub const ZERO: Uint192 = Uint192([0; 3]);
    pub const MAX: Uint192 = Uint192([u64::MAX; 3]);
    pub const BYTES: usize = 24;

    pub const fn from_u64(v: u64) -> Self {
        Self([v, 0, 0])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; 3]
    }

    /// Returns little-endian bytes (24 bytes)
    pub fn to_le_bytes(&self) -> [u8; 24] {
        let mut out = [0u8; 24];
        for (i, limb) in self.0.iter().enumerate() {
            out[i * 8..(i + 1) * 8].copy_from_slice(&limb.to_le_bytes());
        }
        out
    }

    /// Returns big-endian bytes (24 bytes), the header wire encoding of blue work
    pub fn to_be_bytes(&self) -> [u8; 24] {
        let mut out = self.to_le_bytes();
        out.reverse();
        out
    }

    pub fn from_be_bytes(bytes: [u8; 24]) -> Self {
        let mut le = bytes;
        le.reverse();
        let mut limbs = [0u64; 3];
        for (i, limb) in limbs.iter_mut().enumerate() {
            let mut word = [0u8; 8];
            word.copy_from_slice(&le[i * 8..(i + 1) * 8]);
            *limb = u64::from_le_bytes(word);
        }
        Self(limbs)
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        let (sum, overflow) = self.overflowing_add(rhs);
        (!overflow).then_some(sum)
    }

    pub fn saturating_add(self, rhs: Self) -> Self {
        self.checked_add(rhs).unwrap_or(Self::MAX)
    }

    fn overflowing_add(self, rhs: Self) -> (Self, bool) {
        let mut out = [0u64; 3];
        let mut carry = false;
        for (i, limb) in out.iter_mut().enumerate() {
            let (partial, c1) = self.0[i].overflowing_add(rhs.0[i]);
            let (total, c2) = partial.overflowing_add(carry as u64);
            *limb = total;
            carry = c1 || c2;
        }
        (Self(out), carry)
    }

    /// Lossy conversion used for logging and simulation statistics
    pub fn as_f64(&self) -> f64 {
        self.0.iter().rev().fold(0f64, |acc, limb| acc * 18_446_744_073_709_551_616f64 + *limb as f64)
    }
}

impl From<u64> for Uint192 {
    fn from(v: u64) -> Self {
        Self::from_u64(v)
    }
}

impl From<u128> for Uint192 {
    fn from(v: u128) -> Self {
        Self([v as u64, (v >> 64) as u64, 0])
    }
}

impl Ord for Uint192 {
    fn cmp(&self, other: &Self) -> Ordering {
        // Most significant limb first
        self.0.iter().rev().cmp(other.0.iter().rev())
    }
}

impl PartialOrd for Uint192 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Saturates at [`Uint192::MAX`]
impl AddAssign for Uint192 {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.saturating_add(rhs);
    }
}

impl Add for Uint192 {
    type Output = Uint192;
    fn add(self, rhs: Self) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl Sum for Uint192 {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}

impl fmt::Display for Uint192 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.to_be_bytes();
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len() - 1);
        write!(f, "0x")?;
        for byte in &bytes[first..] {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Uint192;

    #[test]
    fn add_assign_no_overflow() {
        let mut a = Uint192::from(1u64);
        a += Uint192::from(2u64);
        assert_eq!(a.to_le_bytes()[0..8], 3u64.to_le_bytes());
    }

    #[test]
    fn add_carries_between_limbs() {
        let a = Uint192::from(u64::MAX);
        let b = a + Uint192::from(1u64);
        assert_eq!(b, Uint192::from(1u128 << 64));
        assert!(b > a);
    }

    #[test]
    fn add_saturates_at_max() {
        assert_eq!(Uint192::MAX + Uint192::from(5u64), Uint192::MAX);
        assert_eq!(Uint192::MAX.checked_add(Uint192::from(1u64)), None);
    }

    #[test]
    fn ordering_uses_high_limbs_first() {
        let high = Uint192::from(1u128 << 64);
        let low = Uint192::from(u64::MAX);
        assert!(high > low);
        let mut v = vec![high, Uint192::ZERO, low];
        v.sort();
        assert_eq!(v, vec![Uint192::ZERO, low, high]);
    }

    #[test]
    fn be_bytes_roundtrip_and_display() {
        let a = Uint192::from(0x1122_3344u64);
        assert_eq!(Uint192::from_be_bytes(a.to_be_bytes()), a);
        assert_eq!(a.to_string(), "0x11223344");
        assert_eq!(Uint192::ZERO.to_string(), "0x00");
    }

    #[test]
    fn sum_of_works() {
        let total: Uint192 = (1..=4u64).map(Uint192::from).sum();
        assert_eq!(total, Uint192::from(10u64));
    }
}

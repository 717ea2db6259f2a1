//! Compact target encoding and work calculation.

use primitive_types::U256;

use crate::{BlueWorkType, Hash};

/// Decodes the compact "bits" representation into a 256-bit target.
/// The sign bit is ignored; a negative target decodes to zero.
pub fn compact_to_target(bits: u32) -> U256 {
    let exponent = bits >> 24;
    let mantissa = bits & 0x007f_ffff;
    if bits & 0x0080_0000 != 0 {
        return U256::zero();
    }
    if exponent <= 3 {
        U256::from(mantissa >> (8 * (3 - exponent)))
    } else if exponent > 34 {
        U256::MAX
    } else {
        let (shifted, overflow) = U256::from(mantissa).overflowing_mul(U256::one() << (8 * (exponent as usize - 3)));
        if overflow {
            U256::MAX
        } else {
            shifted
        }
    }
}

/// Encodes a target in compact form, rounding down to 23 significant mantissa bits
pub fn target_to_compact(target: U256) -> u32 {
    if target.is_zero() {
        return 0;
    }
    let mut size = (target.bits() as u32).div_ceil(8);
    let mut compact = if size <= 3 {
        target.low_u64() << (8 * (3 - size))
    } else {
        (target >> (8 * (size as usize - 3))).low_u64()
    };
    if compact & 0x0080_0000 != 0 {
        compact >>= 8;
        size += 1;
    }
    (compact as u32) | (size << 24)
}

/// Expected number of hashes needed to find a block under `bits`: `2^256 / (target + 1)`,
/// saturated into the blue work type
pub fn calc_work(bits: u32) -> BlueWorkType {
    let target = compact_to_target(bits);
    let work = if target == U256::MAX {
        U256::one()
    } else {
        // (2^256 - target - 1) / (target + 1) + 1 == 2^256 / (target + 1)
        (!target / (target + U256::one())) + U256::one()
    };
    u256_to_blue_work(work)
}

pub fn u256_to_blue_work(value: U256) -> BlueWorkType {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    if bytes[..8].iter().any(|b| *b != 0) {
        return BlueWorkType::MAX;
    }
    let mut low = [0u8; 24];
    low.copy_from_slice(&bytes[8..]);
    BlueWorkType::from_be_bytes(low)
}

/// Interprets a block hash as a little-endian 256-bit integer for proof-of-work comparison
pub fn hash_to_u256(hash: &Hash) -> U256 {
    U256::from_little_endian(hash.as_bytes())
}

/// Whether the hash meets the target encoded by `bits`
pub fn check_pow(hash: &Hash, bits: u32) -> bool {
    let target = compact_to_target(bits);
    !target.is_zero() && hash_to_u256(hash) <= target
}

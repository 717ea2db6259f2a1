//! Header validation in isolation
//!
//! Checks a header needs no DAG context for:
//! - the cached hash matching the header fields
//! - version and parent list shape
//! - proof of work
//! - timestamp not too far in the future

use consensus_core::constants::BLOCK_VERSION;
use consensus_core::difficulty::check_pow;
use consensus_core::errors::{BlockProcessResult, RuleError};
use consensus_core::hashing;
use consensus_core::header::Header;
use consensus_core::BlockHashSet;
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the unix epoch
pub fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or_default()
}

#[derive(Clone)]
pub struct HeaderValidator {
    max_block_parents: usize,
    max_future_time_offset: u64,
    skip_proof_of_work: bool,
}

impl HeaderValidator {
    pub fn new(max_block_parents: usize, max_future_time_offset: u64, skip_proof_of_work: bool) -> Self {
        Self { max_block_parents, max_future_time_offset, skip_proof_of_work }
    }

    /// Validates a non-genesis header against the local clock `now` (ms)
    pub fn validate_header_in_isolation(&self, header: &Header, now: u64) -> BlockProcessResult<()> {
        self.check_header_hash(header)?;
        if header.version != BLOCK_VERSION {
            return Err(RuleError::WrongBlockVersion(header.version));
        }
        self.check_parents_shape(header)?;
        self.check_proof_of_work(header)?;
        self.check_block_timestamp_in_isolation(header, now)
    }

    /// Everything downstream keys the block by `header.hash`, so it must be the real one
    pub fn check_header_hash(&self, header: &Header) -> BlockProcessResult<()> {
        let computed = hashing::header::hash(header);
        if computed != header.hash {
            return Err(RuleError::BadHeaderHash(header.hash, computed));
        }
        Ok(())
    }

    fn check_parents_shape(&self, header: &Header) -> BlockProcessResult<()> {
        let parents = header.direct_parents();
        if parents.is_empty() {
            return Err(RuleError::NoParents);
        }
        if parents.len() > self.max_block_parents {
            return Err(RuleError::TooManyParents(parents.len(), self.max_block_parents));
        }
        let mut seen = BlockHashSet::with_capacity(parents.len());
        for &parent in parents {
            if !seen.insert(parent) {
                return Err(RuleError::DuplicateParents(parent));
            }
        }
        Ok(())
    }

    pub fn check_proof_of_work(&self, header: &Header) -> BlockProcessResult<()> {
        if self.skip_proof_of_work || check_pow(&header.hash, header.bits) {
            Ok(())
        } else {
            Err(RuleError::InvalidPoW)
        }
    }

    fn check_block_timestamp_in_isolation(&self, header: &Header, now: u64) -> BlockProcessResult<()> {
        let max_allowed = now.saturating_add(self.max_future_time_offset);
        if header.timestamp > max_allowed {
            return Err(RuleError::TimeTooFarIntoTheFuture(header.timestamp, max_allowed));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consensus_core::{BlueWorkType, Hash, ZERO_HASH};

    fn header(parents: Vec<Hash>, timestamp: u64, bits: u32) -> Header {
        Header::new_finalized(
            BLOCK_VERSION,
            parents,
            ZERO_HASH,
            ZERO_HASH,
            ZERO_HASH,
            timestamp,
            bits,
            0,
            0,
            BlueWorkType::ZERO,
            0,
            ZERO_HASH,
        )
    }

    fn h(i: u64) -> Hash {
        Hash::from_le_u64([i, 0, 0, 0])
    }

    #[test]
    fn test_parent_rules() {
        let validator = HeaderValidator::new(3, 1000, true);
        assert_eq!(validator.validate_header_in_isolation(&header(vec![h(1)], 10, 0), 10), Ok(()));
        assert_eq!(validator.validate_header_in_isolation(&header(vec![], 10, 0), 10), Err(RuleError::NoParents));
        assert_eq!(
            validator.validate_header_in_isolation(&header(vec![h(1), h(2), h(3), h(4)], 10, 0), 10),
            Err(RuleError::TooManyParents(4, 3))
        );
        assert_eq!(
            validator.validate_header_in_isolation(&header(vec![h(1), h(2), h(1)], 10, 0), 10),
            Err(RuleError::DuplicateParents(h(1)))
        );
    }

    #[test]
    fn test_version_and_future_timestamp() {
        let validator = HeaderValidator::new(3, 1000, true);
        let mut wrong_version = header(vec![h(1)], 10, 0);
        wrong_version.version = BLOCK_VERSION + 1;
        wrong_version.finalize();
        assert_eq!(validator.validate_header_in_isolation(&wrong_version, 10), Err(RuleError::WrongBlockVersion(BLOCK_VERSION + 1)));

        assert_eq!(validator.validate_header_in_isolation(&header(vec![h(1)], 1500, 0), 500), Ok(()));
        assert_eq!(
            validator.validate_header_in_isolation(&header(vec![h(1)], 1501, 0), 500),
            Err(RuleError::TimeTooFarIntoTheFuture(1501, 1500))
        );
    }

    #[test]
    fn test_proof_of_work() {
        let validator = HeaderValidator::new(3, 1000, false);
        // A zero target can never be met
        assert_eq!(validator.check_proof_of_work(&header(vec![h(1)], 10, 0)), Err(RuleError::InvalidPoW));

        // The easiest target accepts about half of all hashes
        let mut nonce = 0;
        let mut easy = header(vec![h(1)], 10, 0x207f_ffff);
        while !check_pow(&easy.hash, easy.bits) {
            nonce += 1;
            easy.nonce = nonce;
            easy.finalize();
        }
        assert_eq!(validator.check_proof_of_work(&easy), Ok(()));
    }

    #[test]
    fn test_forged_header_hash_is_rejected() {
        let validator = HeaderValidator::new(3, 1000, false);
        let honest = header(vec![h(1)], 10, 0x207f_ffff);
        assert_eq!(validator.check_header_hash(&honest), Ok(()));

        // Claim a hash which meets the target while the fields hash to something else
        let mut forged = header(vec![h(1)], 10, 0x207f_ffff);
        forged.nonce = 1;
        forged.hash = ZERO_HASH;
        assert!(check_pow(&forged.hash, forged.bits));
        let computed = hashing::header::hash(&forged);
        assert_eq!(validator.validate_header_in_isolation(&forged, 10), Err(RuleError::BadHeaderHash(ZERO_HASH, computed)));

        // Another known block's hash is equally refused
        let mut stolen = header(vec![h(2)], 10, 0x207f_ffff);
        stolen.hash = honest.hash;
        assert!(matches!(validator.validate_header_in_isolation(&stolen, 10), Err(RuleError::BadHeaderHash(..))));
    }
}

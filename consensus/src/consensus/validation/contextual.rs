//! Contextual header validation
//!
//! Rules checking a header against the DAG it joins. Parent checks run before
//! GHOSTDAG, field checks right after it, and the context rules last. Only the
//! context rules leave a block valid but disqualified from the selected chain.

use crate::consensus::dag::ReachabilityService;
use consensus_core::blockstatus::BlockStatus;
use consensus_core::errors::{BlockProcessResult, ConsensusResult, RuleError};
use consensus_core::ghostdag::GhostdagData;
use consensus_core::header::Header;
use consensus_core::Hash;
use database::stores::StatusesStore;
use database::StagingArea;
use std::sync::Arc;

/// Header field values derived from the DAG, to be matched by the header
pub struct ExpectedHeaderFields {
    pub daa_score: u64,
    pub pruning_point: Hash,
}

#[derive(Clone)]
pub struct ContextualValidator {
    statuses_store: StatusesStore,
    reachability: Arc<dyn ReachabilityService>,
}

impl ContextualValidator {
    pub fn new(statuses_store: StatusesStore, reachability: Arc<dyn ReachabilityService>) -> Self {
        Self { statuses_store, reachability }
    }

    /// Parents must be known and not invalid
    pub fn check_parents_known_and_valid(&self, staging: &StagingArea, header: &Header) -> ConsensusResult<BlockProcessResult<()>> {
        let mut missing = Vec::new();
        for &parent in header.direct_parents() {
            match self.statuses_store.get_optional(staging, parent)? {
                None => missing.push(parent),
                Some(BlockStatus::StatusInvalid) => return Ok(Err(RuleError::InvalidParent(parent))),
                Some(_) => {}
            }
        }
        if !missing.is_empty() {
            return Ok(Err(RuleError::MissingParents(missing)));
        }
        Ok(Ok(()))
    }

    /// Parents must be mutually in anticone
    pub fn check_parents_relation(&self, staging: &StagingArea, header: &Header) -> ConsensusResult<BlockProcessResult<()>> {
        let parents = header.direct_parents();
        for (i, &a) in parents.iter().enumerate() {
            for &b in parents.iter().skip(i + 1) {
                if self.reachability.is_dag_ancestor_of(staging, a, b)? {
                    return Ok(Err(RuleError::InvalidParentsRelation(a, b)));
                }
                if self.reachability.is_dag_ancestor_of(staging, b, a)? {
                    return Ok(Err(RuleError::InvalidParentsRelation(b, a)));
                }
            }
        }
        Ok(Ok(()))
    }

    /// Blue score, blue work, DAA score and pruning point fields must match the DAG
    pub fn check_header_fields(header: &Header, ghostdag_data: &GhostdagData, expected: &ExpectedHeaderFields) -> BlockProcessResult<()> {
        if header.blue_score != ghostdag_data.blue_score {
            return Err(RuleError::UnexpectedBlueScore(ghostdag_data.blue_score, header.blue_score));
        }
        if header.blue_work != ghostdag_data.blue_work {
            return Err(RuleError::UnexpectedBlueWork(ghostdag_data.blue_work, header.blue_work));
        }
        if header.daa_score != expected.daa_score {
            return Err(RuleError::UnexpectedDaaScore(expected.daa_score, header.daa_score));
        }
        if header.pruning_point != expected.pruning_point {
            return Err(RuleError::WrongHeaderPruningPoint(expected.pruning_point, header.pruning_point));
        }
        Ok(())
    }

    pub fn check_difficulty(header: &Header, expected_bits: u32) -> BlockProcessResult<()> {
        if header.bits != expected_bits {
            return Err(RuleError::UnexpectedDifficulty(expected_bits, header.bits));
        }
        Ok(())
    }

    pub fn check_timestamp_after_past_median_time(header: &Header, past_median_time: u64) -> BlockProcessResult<()> {
        if header.timestamp <= past_median_time {
            return Err(RuleError::TimeTooOld(header.timestamp, past_median_time));
        }
        Ok(())
    }

    /// A disqualified selected parent disqualifies the block as well
    pub fn check_selected_parent_eligible(&self, staging: &StagingArea, selected_parent: Hash) -> ConsensusResult<BlockProcessResult<()>> {
        if self.statuses_store.get_optional(staging, selected_parent)? == Some(BlockStatus::StatusDisqualifiedFromChain) {
            return Ok(Err(RuleError::DisqualifiedSelectedParent(selected_parent)));
        }
        Ok(Ok(()))
    }

    /// The selected chain of `block` must go through the virtual finality point
    pub fn check_finality(&self, staging: &StagingArea, block: Hash, virtual_finality_point: Hash) -> ConsensusResult<BlockProcessResult<()>> {
        if !self.reachability.is_chain_ancestor_of(staging, virtual_finality_point, block)? {
            return Ok(Err(RuleError::ViolatingFinality(virtual_finality_point)));
        }
        Ok(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::test_helpers::{h, GhostdagTestDag};
    use consensus_core::BlueWorkType;

    struct Fixture {
        dag: GhostdagTestDag,
        validator: ContextualValidator,
        statuses: StatusesStore,
    }

    fn fixture() -> Fixture {
        let genesis = h(100);
        let mut dag = GhostdagTestDag::new(genesis, 18);
        let statuses = StatusesStore::new(dag.database(), 100);
        let validator = ContextualValidator::new(statuses.clone(), Arc::new(dag.reachability.clone()));
        statuses.set(&mut dag.staging, genesis, BlockStatus::StatusUTXOValid).unwrap();
        dag.add(h(1), &[genesis]);
        dag.add(h(2), &[genesis]);
        dag.add(h(3), &[h(1)]);
        for i in 1..=3 {
            statuses.set(&mut dag.staging, h(i), BlockStatus::StatusUTXOPendingVerification).unwrap();
        }
        Fixture { dag, validator, statuses }
    }

    #[test]
    fn test_parent_status_rules() {
        let mut f = fixture();
        let header = Header::from_precomputed_hash(h(10), vec![h(3), h(2), h(50)]);
        assert_eq!(
            f.validator.check_parents_known_and_valid(&f.dag.staging, &header).unwrap(),
            Err(RuleError::MissingParents(vec![h(50)]))
        );

        f.statuses.set(&mut f.dag.staging, h(2), BlockStatus::StatusInvalid).unwrap();
        let header = Header::from_precomputed_hash(h(10), vec![h(3), h(2)]);
        assert_eq!(f.validator.check_parents_known_and_valid(&f.dag.staging, &header).unwrap(), Err(RuleError::InvalidParent(h(2))));

        f.statuses.set(&mut f.dag.staging, h(3), BlockStatus::StatusDisqualifiedFromChain).unwrap();
        assert_eq!(
            f.validator.check_selected_parent_eligible(&f.dag.staging, h(3)).unwrap(),
            Err(RuleError::DisqualifiedSelectedParent(h(3)))
        );
        assert_eq!(f.validator.check_selected_parent_eligible(&f.dag.staging, h(1)).unwrap(), Ok(()));
    }

    #[test]
    fn test_parents_must_be_in_anticone() {
        let f = fixture();
        let ok = Header::from_precomputed_hash(h(10), vec![h(3), h(2)]);
        assert_eq!(f.validator.check_parents_relation(&f.dag.staging, &ok).unwrap(), Ok(()));
        let bad = Header::from_precomputed_hash(h(10), vec![h(3), h(1)]);
        assert_eq!(f.validator.check_parents_relation(&f.dag.staging, &bad).unwrap(), Err(RuleError::InvalidParentsRelation(h(1), h(3))));
    }

    #[test]
    fn test_finality_requires_chain_through_finality_point() {
        let f = fixture();
        assert_eq!(f.validator.check_finality(&f.dag.staging, h(3), h(1)).unwrap(), Ok(()));
        assert_eq!(f.validator.check_finality(&f.dag.staging, h(2), h(1)).unwrap(), Err(RuleError::ViolatingFinality(h(1))));
    }

    #[test]
    fn test_header_field_rules() {
        let mut data = GhostdagData::genesis();
        data.blue_score = 5;
        data.blue_work = BlueWorkType::from(9u64);
        let mut header = Header::from_precomputed_hash(h(10), vec![h(1)]);
        header.blue_score = 5;
        header.blue_work = BlueWorkType::from(9u64);
        header.daa_score = 7;
        header.pruning_point = h(100);
        header.bits = 0x1d00_ffff;
        header.timestamp = 50;

        let expected = ExpectedHeaderFields { daa_score: 7, pruning_point: h(100) };
        assert_eq!(ContextualValidator::check_header_fields(&header, &data, &expected), Ok(()));
        let wrong_pp = ExpectedHeaderFields { daa_score: 7, pruning_point: h(1) };
        assert_eq!(
            ContextualValidator::check_header_fields(&header, &data, &wrong_pp),
            Err(RuleError::WrongHeaderPruningPoint(h(1), h(100)))
        );
        data.blue_score = 6;
        assert_eq!(ContextualValidator::check_header_fields(&header, &data, &expected), Err(RuleError::UnexpectedBlueScore(6, 5)));

        assert_eq!(ContextualValidator::check_difficulty(&header, 0x1d00_ffff), Ok(()));
        assert_eq!(
            ContextualValidator::check_difficulty(&header, 0x1c00_ffff),
            Err(RuleError::UnexpectedDifficulty(0x1c00_ffff, 0x1d00_ffff))
        );
        assert_eq!(ContextualValidator::check_timestamp_after_past_median_time(&header, 49), Ok(()));
        assert_eq!(ContextualValidator::check_timestamp_after_past_median_time(&header, 50), Err(RuleError::TimeTooOld(50, 50)));
    }
}

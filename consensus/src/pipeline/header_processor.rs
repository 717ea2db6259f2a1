//! Header processor for consensus
//!
//! Validates a header against the DAG without writing anything, producing the
//! data every later stage needs. Staging that data is a separate step so that
//! valid and disqualified blocks are stored the same way.

use crate::consensus::services::ConsensusServices;
use crate::consensus::storage::ConsensusStorage;
use crate::consensus::validation::{ContextualValidator, ExpectedHeaderFields};
use consensus_core::errors::{ConsensusResult, RuleError};
use consensus_core::ghostdag::GhostdagData;
use consensus_core::header::Header;
use consensus_core::Hash;
use database::StagingArea;
use std::sync::Arc;
use tracing::trace;

/// Everything derived from the DAG while validating a header
#[derive(Debug, Clone)]
pub struct HeaderContext {
    pub ghostdag_data: Arc<GhostdagData>,
    pub merge_depth_root: Hash,
    pub finality_point: Hash,
    pub daa_score: u64,
    pub daa_added_blocks: Vec<Hash>,
    pub past_median_time: u64,
}

/// A rule violation found while validating a header. Context rule violations carry
/// the derived context so the block can still be stored as disqualified.
#[derive(Debug, Clone)]
pub struct HeaderFailure {
    pub error: RuleError,
    pub context: Option<HeaderContext>,
}

impl HeaderFailure {
    fn new(error: RuleError) -> Self {
        Self { error, context: None }
    }
}

pub type HeaderValidationResult = Result<HeaderContext, HeaderFailure>;

/// Bails out of a `ConsensusResult<HeaderValidationResult>` function on a rule violation
macro_rules! rule {
    ($check:expr) => {
        if let Err(error) = $check {
            return Ok(Err(HeaderFailure::new(error)));
        }
    };
    ($check:expr, $ctx:expr) => {
        if let Err(error) = $check {
            return Ok(Err(HeaderFailure { error, context: Some($ctx) }));
        }
    };
}

pub struct HeaderProcessor {
    storage: Arc<ConsensusStorage>,
    services: Arc<ConsensusServices>,
}

impl HeaderProcessor {
    pub fn new(storage: Arc<ConsensusStorage>, services: Arc<ConsensusServices>) -> Self {
        Self { storage, services }
    }

    /// Runs every header rule in order: isolation, parents, header fields, then context rules.
    /// `now` is the local clock in milliseconds.
    pub fn validate_header(&self, staging: &StagingArea, header: &Header, now: u64) -> ConsensusResult<HeaderValidationResult> {
        let services = &self.services;
        rule!(services.header_validator.validate_header_in_isolation(header, now));
        rule!(services.contextual_validator.check_parents_known_and_valid(staging, header)?);
        rule!(services.contextual_validator.check_parents_relation(staging, header)?);

        let ghostdag_data = services.ghostdag_manager.ghostdag(staging, header.direct_parents())?;
        let (bits, daa_score, daa_added_blocks) = services.difficulty_manager.calc_difficulty_and_daa(staging, &ghostdag_data)?;
        let past_median_time = services.past_median_time_manager.calc_past_median_time(staging, &ghostdag_data)?;
        let pruning_point = services.pruning_manager.expected_header_pruning_point(staging, &ghostdag_data)?;
        rule!(ContextualValidator::check_header_fields(header, &ghostdag_data, &ExpectedHeaderFields { daa_score, pruning_point }));

        let merge_depth_root = services.depth_manager.calc_merge_depth_root(staging, &ghostdag_data)?;
        let finality_point = services.depth_manager.calc_finality_point(staging, &ghostdag_data)?;
        let selected_parent = ghostdag_data.selected_parent;
        let context = HeaderContext {
            ghostdag_data: Arc::new(ghostdag_data),
            merge_depth_root,
            finality_point,
            daa_score,
            daa_added_blocks,
            past_median_time,
        };

        rule!(ContextualValidator::check_difficulty(header, bits), context);
        rule!(ContextualValidator::check_timestamp_after_past_median_time(header, past_median_time), context);
        rule!(services.contextual_validator.check_selected_parent_eligible(staging, selected_parent)?, context);
        let merge_depth = services.depth_manager.check_bounded_merge_depth(staging, &context.ghostdag_data, merge_depth_root)?;
        rule!(merge_depth, context);
        let virtual_finality_point = self.storage.metadata.get_virtual_finality_point(staging)?;
        rule!(services.contextual_validator.check_finality(staging, selected_parent, virtual_finality_point)?, context);

        trace!("header {} validated with blue score {}", header.hash, context.ghostdag_data.blue_score);
        Ok(Ok(context))
    }

    /// Stages the header and all data derived from it: relations, GHOSTDAG data,
    /// reachability, depth anchors and DAA added blocks
    pub fn stage_header_data(&self, staging: &mut StagingArea, header: &Arc<Header>, context: &HeaderContext) -> ConsensusResult<()> {
        let hash = header.hash;
        let ghostdag_data = &context.ghostdag_data;

        self.storage.headers.insert(staging, header.clone())?;
        self.services.topology.set_parents(staging, hash, header.direct_parents())?;
        self.storage.ghostdag.insert(staging, hash, ghostdag_data.clone())?;

        let mergeset: Vec<Hash> = ghostdag_data.unordered_mergeset_without_selected_parent().collect();
        self.services.reachability_manager.add_block(staging, hash, ghostdag_data.selected_parent, &mergeset)?;

        self.services.depth_manager.stage_depth_info(staging, hash, context.merge_depth_root, context.finality_point)?;
        self.services.difficulty_manager.stage_daa_added_blocks(staging, hash, context.daa_added_blocks.clone())?;
        Ok(())
    }
}

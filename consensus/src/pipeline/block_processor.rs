//! Block processor for consensus
//!
//! Drives a submitted block through header validation, body validation and
//! virtual resolution. Each submission commits at most one staging area, so a
//! failed submission never leaves partial state behind.

use crate::consensus::services::ConsensusServices;
use crate::consensus::storage::ConsensusStorage;
use crate::consensus::validation::header_validator::unix_now;
use crate::pipeline::body_processor::BodyProcessor;
use crate::pipeline::header_processor::{HeaderContext, HeaderFailure, HeaderProcessor};
use crate::pipeline::virtual_processor::VirtualProcessor;
use consensus_core::acceptance_data::AcceptanceData;
use consensus_core::api::{BlockInsertionResult, BlockNotifier};
use consensus_core::block::Block;
use consensus_core::blockstatus::BlockStatus;
use consensus_core::errors::{BlockProcessResult, ConsensusResult, RuleError};
use consensus_core::ghostdag::{GhostdagData, SortableBlock};
use consensus_core::header::Header;
use consensus_core::utxo::UtxoDiff;
use consensus_core::{BlockHashSet, Hash, ORIGIN};
use database::StagingArea;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct BlockProcessor {
    storage: Arc<ConsensusStorage>,
    services: Arc<ConsensusServices>,
    header_processor: HeaderProcessor,
    body_processor: BodyProcessor,
    virtual_processor: VirtualProcessor,
    notifiers: RwLock<Vec<Arc<dyn BlockNotifier>>>,
}

impl BlockProcessor {
    pub fn new(storage: Arc<ConsensusStorage>, services: Arc<ConsensusServices>) -> Self {
        Self {
            header_processor: HeaderProcessor::new(storage.clone(), services.clone()),
            body_processor: BodyProcessor::new(storage.clone(), services.clone()),
            virtual_processor: VirtualProcessor::new(storage.clone(), services.clone()),
            storage,
            services,
            notifiers: RwLock::new(Vec::new()),
        }
    }

    pub fn register_notifier(&self, notifier: Arc<dyn BlockNotifier>) {
        self.notifiers.write().push(notifier);
    }

    fn notify(&self, block: &Block, status: BlockStatus) {
        for notifier in self.notifiers.read().iter() {
            notifier.on_new_block(block, status);
        }
    }

    /// Stores genesis as the only block, with an empty UTXO set. No-op on an initialized database.
    pub fn init_genesis(&self, genesis: &Block, reachability_capacity: u64) -> ConsensusResult<()> {
        let mut staging = StagingArea::new();
        if self.storage.metadata.is_initialized(&staging)? {
            return Ok(());
        }
        let hash = genesis.hash();
        let services = &self.services;

        services.reachability_manager.init(&mut staging, reachability_capacity)?;
        services.reachability_manager.add_block(&mut staging, hash, ORIGIN, &[])?;
        self.storage.headers.insert(&mut staging, genesis.header.clone())?;
        services.topology.set_parents(&mut staging, hash, &[])?;
        self.storage.ghostdag.insert(&mut staging, hash, Arc::new(GhostdagData::genesis()))?;
        services.depth_manager.stage_depth_info(&mut staging, hash, hash, hash)?;
        services.difficulty_manager.stage_daa_added_blocks(&mut staging, hash, Vec::new())?;

        self.storage.statuses.set(&mut staging, hash, BlockStatus::StatusUTXOValid)?;
        self.storage.block_transactions.insert(&mut staging, hash, genesis.transactions.clone())?;
        self.storage.utxo_diffs.insert(&mut staging, hash, Arc::new(UtxoDiff::default()))?;
        self.storage.acceptance.insert(&mut staging, hash, Arc::new(AcceptanceData::new()))?;

        let metadata = &self.storage.metadata;
        metadata.set_body_tips(&mut staging, BlockHashSet::from([hash]))?;
        metadata.set_headers_selected_tip(&mut staging, hash)?;
        metadata.set_pruning_point(&mut staging, hash)?;
        metadata.set_pruning_utxoset_position(&mut staging, hash)?;
        metadata.set_virtual_finality_point(&mut staging, hash)?;

        self.virtual_processor.update_virtual_state(&mut staging, hash, vec![hash])?;
        self.storage.db.commit(staging)?;
        info!("initialized consensus with genesis {}", hash);
        Ok(())
    }

    pub fn process_block(&self, block: &Block) -> ConsensusResult<BlockInsertionResult> {
        // Status lookups below trust the hash, so a forged one must not reach them
        self.services.header_validator.check_header_hash(&block.header)?;
        let hash = block.hash();
        let staging = StagingArea::new();
        match self.storage.statuses.get_optional(&staging, hash)? {
            None => self.process_new_block(block),
            Some(BlockStatus::StatusInvalid) => Err(RuleError::KnownInvalid(hash).into()),
            Some(status) => {
                if block.is_header_only() || self.storage.block_transactions.has(&staging, hash)? || self.is_pruned(&staging, hash)? {
                    debug!("block {} is already known with status {}", hash, status);
                    return self.insertion_result(hash, status);
                }
                self.process_body_only(block, status)
            }
        }
    }

    /// Block data in the strict past of the pruning point is never restored
    fn is_pruned(&self, staging: &StagingArea, hash: Hash) -> ConsensusResult<bool> {
        let pruning_point = self.storage.metadata.get_pruning_point(staging)?;
        Ok(hash != pruning_point && self.services.reachability_service.is_dag_ancestor_of(staging, hash, pruning_point)?)
    }

    fn process_new_block(&self, block: &Block) -> ConsensusResult<BlockInsertionResult> {
        let hash = block.hash();
        let header = block.header.clone();
        let mut staging = StagingArea::new();

        let context = match self.header_processor.validate_header(&staging, &header, unix_now())? {
            Ok(context) => context,
            Err(HeaderFailure { error, context: None }) => return self.reject(block, error),
            Err(HeaderFailure { error, context: Some(context) }) => {
                if let Err(body_error) = self.check_new_body(&staging, block, &header)? {
                    return self.reject(block, body_error);
                }
                return self.store_disqualified(block, &header, &context, error);
            }
        };
        if let Err(error) = self.check_new_body(&staging, block, &header)? {
            return self.reject(block, error);
        }
        if !block.is_header_only() {
            if let Err(error) = self.body_processor.validate_body_in_context(block, context.daa_score, context.past_median_time) {
                return self.reject(block, error);
            }
        }

        self.header_processor.stage_header_data(&mut staging, &header, &context)?;
        self.update_headers_selected_tip(&mut staging, hash, &context.ghostdag_data)?;
        if block.is_header_only() {
            self.storage.statuses.set(&mut staging, hash, BlockStatus::StatusHeaderOnly)?;
        } else {
            self.body_processor.stage_body(&mut staging, &header, block.transactions.clone())?;
            self.storage.statuses.set(&mut staging, hash, BlockStatus::StatusUTXOPendingVerification)?;
            self.virtual_processor.resolve_virtual(&mut staging)?;
        }
        self.commit_and_notify(staging, block)
    }

    /// Body rules checked before the header data is staged. Header-only blocks pass trivially.
    fn check_new_body(&self, staging: &StagingArea, block: &Block, header: &Header) -> ConsensusResult<BlockProcessResult<()>> {
        if block.is_header_only() {
            return Ok(Ok(()));
        }
        if let Err(error) = self.body_processor.validate_body_in_isolation(block) {
            return Ok(Err(error));
        }
        self.body_processor.check_parent_bodies_exist(staging, header)
    }

    /// A body arriving for a block whose header is already stored
    fn process_body_only(&self, block: &Block, status: BlockStatus) -> ConsensusResult<BlockInsertionResult> {
        let hash = block.hash();
        let mut staging = StagingArea::new();
        let header = self.storage.headers.get_header(&staging, hash)?;

        // A body the stored header does not commit to says nothing about the block itself
        if let Err(error) = self.body_processor.check_body_matches_header(block) {
            debug!("body of {} does not match its header: {}", hash, error);
            return Err(error.into());
        }
        if let Err(error) = self.body_processor.validate_body_in_isolation(block) {
            return self.reject(block, error);
        }
        if let Err(error) = self.body_processor.check_parent_bodies_exist(&staging, &header)? {
            return self.reject(block, error);
        }
        let past_median_time = self.services.past_median_time_manager.past_median_time(&staging, hash)?;
        if let Err(error) = self.body_processor.validate_body_in_context(block, header.daa_score, past_median_time) {
            return self.reject(block, error);
        }

        let transactions = block.transactions.clone();
        if status.is_chain_eligible() || status == BlockStatus::StatusHeaderOnly {
            self.body_processor.stage_body(&mut staging, &header, transactions)?;
            self.storage.statuses.set(&mut staging, hash, BlockStatus::StatusUTXOPendingVerification)?;
            self.virtual_processor.resolve_virtual(&mut staging)?;
        } else {
            // Disqualified blocks keep their body out of the body tips
            self.body_processor.stage_transactions(&mut staging, hash, transactions)?;
        }
        self.commit_and_notify(staging, block)
    }

    /// Stores a block failing a context rule as disqualified from chain, then reports the violation
    fn store_disqualified(
        &self,
        block: &Block,
        header: &Arc<Header>,
        context: &HeaderContext,
        error: RuleError,
    ) -> ConsensusResult<BlockInsertionResult> {
        let mut staging = StagingArea::new();
        self.header_processor.stage_header_data(&mut staging, header, context)?;
        if !block.is_header_only() {
            self.body_processor.stage_transactions(&mut staging, header.hash, block.transactions.clone())?;
        }
        self.storage.statuses.set(&mut staging, header.hash, BlockStatus::StatusDisqualifiedFromChain)?;
        self.storage.db.commit(staging)?;
        warn!("block {} disqualified from chain: {}", header.hash, error);
        self.notify(block, BlockStatus::StatusDisqualifiedFromChain);
        Err(error.into())
    }

    /// Structural violations mark the block invalid for good. Transient ones leave no trace.
    fn reject(&self, block: &Block, error: RuleError) -> ConsensusResult<BlockInsertionResult> {
        let hash = block.hash();
        if error.is_transient() {
            debug!("block {} rejected: {}", hash, error);
            return Err(error.into());
        }
        let mut staging = StagingArea::new();
        self.storage.statuses.set(&mut staging, hash, BlockStatus::StatusInvalid)?;
        self.storage.db.commit(staging)?;
        warn!("block {} is invalid: {}", hash, error);
        Err(error.into())
    }

    fn update_headers_selected_tip(&self, staging: &mut StagingArea, hash: Hash, ghostdag_data: &GhostdagData) -> ConsensusResult<()> {
        let current = self.storage.metadata.get_headers_selected_tip(staging)?;
        let current_work = self.storage.ghostdag.get_blue_work(staging, current)?;
        if SortableBlock::new(hash, ghostdag_data.blue_work) > SortableBlock::new(current, current_work) {
            self.storage.metadata.set_headers_selected_tip(staging, hash)?;
        }
        Ok(())
    }

    fn commit_and_notify(&self, staging: StagingArea, block: &Block) -> ConsensusResult<BlockInsertionResult> {
        let hash = block.hash();
        let status = self.storage.statuses.get(&staging, hash)?;
        self.storage.db.commit(staging)?;
        debug!("block {} committed with status {}", hash, status);
        self.notify(block, status);
        self.insertion_result(hash, status)
    }

    fn insertion_result(&self, hash: Hash, status: BlockStatus) -> ConsensusResult<BlockInsertionResult> {
        let sink = self.storage.virtual_state.get(&StagingArea::new())?.sink();
        Ok(BlockInsertionResult { hash, status, sink })
    }
}

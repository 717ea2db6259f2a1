//! Consensus services
//!
//! Builds every manager and validator from the consensus params over one set of
//! stores. All services are cheap to clone: they hold store handles and `Arc`s.

use crate::consensus::dag::{DagTopologyManager, ReachabilityManager, ReachabilityService};
use crate::consensus::difficulty::{BlockWindowManager, DifficultyManager};
use crate::consensus::ghostdag::GhostdagManager;
use crate::consensus::storage::ConsensusStorage;
use crate::consensus::validation::{BlockValidator, ContextualValidator, HeaderValidator, TransactionValidator};
use crate::process::acceptance::AcceptanceManager;
use crate::process::coinbase::CoinbaseManager;
use crate::process::depth::DepthManager;
use crate::process::mining::BlockTemplateBuilder;
use crate::process::parents_builder::ParentsBuilder;
use crate::process::past_median_time::PastMedianTimeManager;
use crate::process::pruning::PruningManager;
use crate::process::sync::SyncManager;
use consensus_core::config::Params;
use std::sync::Arc;

pub struct ConsensusServices {
    pub reachability_manager: ReachabilityManager,
    pub reachability_service: Arc<dyn ReachabilityService>,
    pub topology: DagTopologyManager,
    pub ghostdag_manager: GhostdagManager,
    pub window_manager: BlockWindowManager,
    pub difficulty_manager: DifficultyManager,
    pub past_median_time_manager: PastMedianTimeManager,
    pub depth_manager: DepthManager,
    pub pruning_manager: PruningManager,
    pub coinbase_manager: CoinbaseManager,
    pub header_validator: HeaderValidator,
    pub block_validator: BlockValidator,
    pub contextual_validator: ContextualValidator,
    pub transaction_validator: TransactionValidator,
    pub acceptance_manager: AcceptanceManager,
    pub parents_builder: ParentsBuilder,
    pub sync_manager: SyncManager,
    pub template_builder: BlockTemplateBuilder,
}

impl ConsensusServices {
    pub fn new(params: &Params, storage: &Arc<ConsensusStorage>) -> Arc<Self> {
        let genesis_hash = params.genesis.hash();

        let reachability_manager = ReachabilityManager::new(storage.reachability.clone(), params.reindex_depth, params.reindex_slack);
        let reachability_service: Arc<dyn ReachabilityService> = Arc::new(reachability_manager.clone());
        let topology = DagTopologyManager::new(storage.relations.clone(), storage.metadata.clone(), reachability_service.clone());

        let ghostdag_manager = GhostdagManager::new(
            genesis_hash,
            params.ghostdag_k,
            storage.ghostdag.clone(),
            storage.relations.clone(),
            storage.headers.clone(),
            reachability_service.clone(),
        );
        let window_manager =
            BlockWindowManager::new(storage.ghostdag.clone(), params.difficulty_window_size, params.past_median_time_window_size());
        let difficulty_manager = DifficultyManager::new(
            storage.headers.clone(),
            storage.ghostdag.clone(),
            storage.daa.clone(),
            window_manager.clone(),
            params.genesis.bits,
            params.target_time_per_block,
            params.max_difficulty_target,
            params.disable_difficulty_adjustment,
        );
        let past_median_time_manager = PastMedianTimeManager::new(
            storage.headers.clone(),
            storage.ghostdag.clone(),
            window_manager.clone(),
            params.genesis.timestamp,
        );
        let depth_manager = DepthManager::new(
            genesis_hash,
            params.finality_depth,
            params.merge_depth,
            storage.ghostdag.clone(),
            storage.depth.clone(),
            reachability_service.clone(),
        );
        let pruning_manager = PruningManager::new(
            genesis_hash,
            params.finality_depth,
            params.pruning_depth,
            params.enable_pruning,
            depth_manager.clone(),
            reachability_service.clone(),
            storage.headers.clone(),
            storage.ghostdag.clone(),
            storage.relations.clone(),
            storage.statuses.clone(),
            storage.metadata.clone(),
            storage.block_transactions.clone(),
            storage.utxo_diffs.clone(),
            storage.acceptance.clone(),
            storage.pruning_utxo_set.clone(),
        );

        let coinbase_manager = CoinbaseManager::new(params.coinbase_subsidy);
        let max_block_parents = params.max_block_parents as usize;
        let header_validator = HeaderValidator::new(max_block_parents, params.max_future_time_offset(), params.skip_proof_of_work);
        let block_validator = BlockValidator::new(params.max_block_mass, coinbase_manager.clone());
        let contextual_validator = ContextualValidator::new(storage.statuses.clone(), reachability_service.clone());
        let transaction_validator = TransactionValidator::new(params.coinbase_maturity);
        let acceptance_manager = AcceptanceManager::new(storage.block_transactions.clone(), transaction_validator.clone());

        let parents_builder =
            ParentsBuilder::new(max_block_parents, ghostdag_manager.clone(), storage.ghostdag.clone(), depth_manager.clone());
        let sync_manager = SyncManager::new(
            ghostdag_manager.clone(),
            storage.ghostdag.clone(),
            storage.relations.clone(),
            storage.block_transactions.clone(),
            storage.metadata.clone(),
            reachability_service.clone(),
        );
        let template_builder = BlockTemplateBuilder::new(
            ghostdag_manager.clone(),
            difficulty_manager.clone(),
            past_median_time_manager.clone(),
            pruning_manager.clone(),
            coinbase_manager.clone(),
            acceptance_manager.clone(),
            storage.virtual_state.clone(),
            storage.sink_utxo_set.clone(),
        );

        Arc::new(Self {
            reachability_manager,
            reachability_service,
            topology,
            ghostdag_manager,
            window_manager,
            difficulty_manager,
            past_median_time_manager,
            depth_manager,
            pruning_manager,
            coinbase_manager,
            header_validator,
            block_validator,
            contextual_validator,
            transaction_validator,
            acceptance_manager,
            parents_builder,
            sync_manager,
            template_builder,
        })
    }
}

//! Block template building
//!
//! Fills every header field of a new block from the DAG state so that the block
//! passes validation once a nonce meeting its target is found.

use crate::consensus::difficulty::DifficultyManager;
use crate::consensus::ghostdag::GhostdagManager;
use crate::consensus::storage::StoreUtxoView;
use crate::consensus::validation::header_validator::unix_now;
use crate::process::acceptance::AcceptanceManager;
use crate::process::coinbase::CoinbaseManager;
use crate::process::past_median_time::PastMedianTimeManager;
use crate::process::pruning::PruningManager;
use consensus_core::block::{Block, CoinbaseData};
use consensus_core::constants::BLOCK_VERSION;
use consensus_core::errors::{ConsensusError, ConsensusResult};
use consensus_core::ghostdag::GhostdagData;
use consensus_core::header::Header;
use consensus_core::merkle::{calc_accepted_id_merkle_root, calc_hash_merkle_root};
use consensus_core::tx::Transaction;
use consensus_core::{Hash, ZERO_HASH};
use database::stores::{UtxoSetStore, VirtualStateStore};
use database::StagingArea;
use tracing::debug;

#[derive(Clone)]
pub struct BlockTemplateBuilder {
    ghostdag_manager: GhostdagManager,
    difficulty_manager: DifficultyManager,
    past_median_time_manager: PastMedianTimeManager,
    pruning_manager: PruningManager,
    coinbase_manager: CoinbaseManager,
    acceptance_manager: AcceptanceManager,
    virtual_state_store: VirtualStateStore,
    sink_utxo_set: UtxoSetStore,
}

impl BlockTemplateBuilder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ghostdag_manager: GhostdagManager,
        difficulty_manager: DifficultyManager,
        past_median_time_manager: PastMedianTimeManager,
        pruning_manager: PruningManager,
        coinbase_manager: CoinbaseManager,
        acceptance_manager: AcceptanceManager,
        virtual_state_store: VirtualStateStore,
        sink_utxo_set: UtxoSetStore,
    ) -> Self {
        Self {
            ghostdag_manager,
            difficulty_manager,
            past_median_time_manager,
            pruning_manager,
            coinbase_manager,
            acceptance_manager,
            virtual_state_store,
            sink_utxo_set,
        }
    }

    /// Builds an unsolved block over `parents`. The nonce is left at zero.
    /// Without an explicit timestamp the block is stamped with the local clock,
    /// bumped past the past median time if needed.
    pub fn build_block_template(
        &self,
        staging: &StagingArea,
        parents: Vec<Hash>,
        coinbase_data: &CoinbaseData,
        transactions: Vec<Transaction>,
        timestamp: Option<u64>,
    ) -> ConsensusResult<Block> {
        if parents.is_empty() {
            return Err(ConsensusError::General("cannot build a block without parents".to_string()));
        }
        let ghostdag_data = self.ghostdag_manager.ghostdag(staging, &parents)?;
        let (bits, daa_score, _) = self.difficulty_manager.calc_difficulty_and_daa(staging, &ghostdag_data)?;
        let past_median_time = self.past_median_time_manager.calc_past_median_time(staging, &ghostdag_data)?;
        let timestamp = timestamp.unwrap_or_else(|| unix_now().max(past_median_time + 1));
        let pruning_point = self.pruning_manager.expected_header_pruning_point(staging, &ghostdag_data)?;

        let mut block_transactions = Vec::with_capacity(transactions.len() + 1);
        block_transactions.push(self.coinbase_manager.expected_coinbase_transaction(ghostdag_data.blue_score, coinbase_data));
        block_transactions.extend(transactions);
        let hash_merkle_root = calc_hash_merkle_root(block_transactions.iter());

        let accepted_id_merkle_root = self.accepted_id_merkle_root(staging, &parents, &ghostdag_data, daa_score, past_median_time)?;

        let header = Header::new_finalized(
            BLOCK_VERSION,
            parents,
            hash_merkle_root,
            accepted_id_merkle_root,
            ZERO_HASH,
            timestamp,
            bits,
            0,
            daa_score,
            ghostdag_data.blue_work,
            ghostdag_data.blue_score,
            pruning_point,
        );
        debug!("built block template {} with blue score {} and DAA score {}", header.hash, header.blue_score, header.daa_score);
        Ok(Block::new(header, block_transactions))
    }

    /// Acceptance commitment of the new block. Known exactly only when the block
    /// extends the current sink; otherwise left zeroed.
    fn accepted_id_merkle_root(
        &self,
        staging: &StagingArea,
        parents: &[Hash],
        ghostdag_data: &GhostdagData,
        daa_score: u64,
        past_median_time: u64,
    ) -> ConsensusResult<Hash> {
        let virtual_state = self.virtual_state_store.get(staging)?;
        if virtual_state.parents == parents {
            return Ok(calc_accepted_id_merkle_root(&virtual_state.accepted_tx_ids));
        }
        if ghostdag_data.selected_parent != virtual_state.sink() {
            return Ok(ZERO_HASH);
        }
        let base = StoreUtxoView::new(&self.sink_utxo_set, staging);
        let acceptance = self.acceptance_manager.calc_mergeset_acceptance(staging, ghostdag_data, daa_score, past_median_time, &base)?;
        Ok(calc_accepted_id_merkle_root(&acceptance.accepted_tx_ids()))
    }
}

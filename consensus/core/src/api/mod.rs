use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    block::{Block, CoinbaseData},
    blockstatus::BlockStatus,
    errors::ConsensusResult,
    ghostdag::GhostdagData,
    header::Header,
    tx::{Transaction, TransactionOutpoint, UtxoEntry},
    BlueWorkType, Hash,
};

/// Outcome of a block submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInsertionResult {
    pub hash: Hash,
    pub status: BlockStatus,
    /// Virtual selected parent after processing
    pub sink: Hash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInfo {
    pub exists: bool,
    pub status: Option<BlockStatus>,
    pub blue_score: Option<u64>,
}

impl BlockInfo {
    pub fn unknown() -> Self {
        Self { exists: false, status: None, blue_score: None }
    }
}

/// Snapshot of the virtual block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualStateInfo {
    pub parents: Vec<Hash>,
    pub sink: Hash,
    pub blue_score: u64,
    pub blue_work: BlueWorkType,
    pub daa_score: u64,
    pub bits: u32,
    pub past_median_time: u64,
    pub pruning_point: Hash,
    pub finality_point: Hash,
    pub accepted_tx_count: usize,
}

/// Receives a callback for every committed block. Callbacks run while the engine
/// holds its processing lock and must not call back into the engine.
pub trait BlockNotifier: Send + Sync {
    fn on_new_block(&self, block: &Block, status: BlockStatus);
}

/// The consensus engine interface consumed by mining, sync and RPC collaborators
pub trait ConsensusApi: Send + Sync {
    fn validate_and_insert_block(&self, block: Block) -> ConsensusResult<BlockInsertionResult>;

    fn get_block_info(&self, hash: Hash) -> ConsensusResult<BlockInfo>;

    /// Hashes in the past of `high` whose bodies are missing, in topological order
    fn get_missing_block_body_hashes(&self, high: Hash) -> ConsensusResult<Vec<Hash>>;

    /// Blocks in `past(high)` and the anticone of `low`, plus `high`, ordered by blue work.
    /// Returns at most `max_blocks` hashes and the highest hash reached.
    fn get_hashes_between(&self, low: Hash, high: Hash, max_blocks: usize) -> ConsensusResult<(Vec<Hash>, Hash)>;

    fn create_headers_selected_chain_block_locator(&self, low: Option<Hash>, high: Option<Hash>) -> ConsensusResult<Vec<Hash>>;

    fn get_virtual_selected_parent(&self) -> Hash;

    fn is_valid_pruning_point(&self, hash: Hash) -> ConsensusResult<bool>;

    fn get_pruning_point_utxos(
        &self,
        expected_pruning_point: Hash,
        from_outpoint: Option<TransactionOutpoint>,
        chunk_size: usize,
    ) -> ConsensusResult<Vec<(TransactionOutpoint, UtxoEntry)>>;

    /// Block template over the virtual parents
    fn build_block(&self, coinbase_data: CoinbaseData, txs: Vec<Transaction>) -> ConsensusResult<Block>;

    /// Block template over explicit parents
    fn build_block_with_parents(
        &self,
        parents: Vec<Hash>,
        coinbase_data: CoinbaseData,
        txs: Vec<Transaction>,
        timestamp: Option<u64>,
    ) -> ConsensusResult<Block>;

    fn register_block_notifier(&self, notifier: Arc<dyn BlockNotifier>);

    fn get_sink_utxo(&self, outpoint: &TransactionOutpoint) -> ConsensusResult<Option<UtxoEntry>>;

    fn get_virtual_state_info(&self) -> ConsensusResult<VirtualStateInfo>;

    fn get_tips(&self) -> ConsensusResult<Vec<Hash>>;

    fn get_ghostdag_data(&self, hash: Hash) -> ConsensusResult<Arc<GhostdagData>>;

    fn get_header(&self, hash: Hash) -> ConsensusResult<Arc<Header>>;

    fn get_pruning_point(&self) -> ConsensusResult<Hash>;

    fn get_virtual_finality_point(&self) -> ConsensusResult<Hash>;
}

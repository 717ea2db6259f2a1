//! The consensus engine
//!
//! Owns the stores, the services and the block pipeline, and exposes them
//! through [`ConsensusApi`]. Every entry point holds the processing lock for
//! the whole call, so readers never observe a commit half applied to the caches.

use crate::consensus::services::ConsensusServices;
use crate::consensus::storage::ConsensusStorage;
use crate::consensus::types::ConsensusConfig;
use crate::pipeline::BlockProcessor;
use consensus_core::api::{BlockInfo, BlockInsertionResult, BlockNotifier, ConsensusApi, VirtualStateInfo};
use consensus_core::block::{Block, CoinbaseData};
use consensus_core::config::Params;
use consensus_core::errors::{ConsensusError, ConsensusResult};
use consensus_core::ghostdag::GhostdagData;
use consensus_core::header::Header;
use consensus_core::tx::{Transaction, TransactionOutpoint, UtxoEntry};
use consensus_core::Hash;
use database::{Database, StagingArea, StoreResultExtensions};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub struct Consensus {
    config: ConsensusConfig,
    genesis_hash: Hash,
    storage: Arc<ConsensusStorage>,
    services: Arc<ConsensusServices>,
    block_processor: BlockProcessor,
    processing_lock: Mutex<()>,
}

impl Consensus {
    /// Opens consensus over `db`, storing genesis if the database is empty
    pub fn new(db: Arc<Database>, config: ConsensusConfig) -> ConsensusResult<Self> {
        config.params.validate()?;
        let storage = ConsensusStorage::new(db, &config.perf);
        let services = ConsensusServices::new(&config.params, &storage);
        let block_processor = BlockProcessor::new(storage.clone(), services.clone());

        let genesis = config.params.genesis.block();
        block_processor.init_genesis(&genesis, config.params.reachability_capacity)?;
        info!("consensus ready on {} with genesis {}", config.params.network_name, genesis.hash());

        Ok(Self { genesis_hash: genesis.hash(), config, storage, services, block_processor, processing_lock: Mutex::new(()) })
    }

    pub fn open<P: AsRef<Path>>(path: P, config: ConsensusConfig) -> ConsensusResult<Self> {
        let db = Database::open(path)?;
        Self::new(Arc::new(db), config)
    }

    pub fn params(&self) -> &Params {
        &self.config.params
    }

    pub fn genesis_hash(&self) -> Hash {
        self.genesis_hash
    }

    /// Whether `this` is in the past of `queried`. A block is its own ancestor.
    pub fn is_dag_ancestor_of(&self, this: Hash, queried: Hash) -> ConsensusResult<bool> {
        let _guard = self.processing_lock.lock();
        let staging = Self::committed();
        self.require_known(&staging, this)?;
        self.require_known(&staging, queried)?;
        Ok(self.services.reachability_service.is_dag_ancestor_of(&staging, this, queried)?)
    }

    fn committed() -> StagingArea {
        StagingArea::new()
    }

    fn sink(&self, staging: &StagingArea) -> ConsensusResult<Hash> {
        Ok(self.storage.virtual_state.get(staging)?.sink())
    }

    fn require_known(&self, staging: &StagingArea, hash: Hash) -> ConsensusResult<()> {
        if self.storage.relations.has(staging, hash)? {
            Ok(())
        } else {
            Err(ConsensusError::UnknownBlock(hash))
        }
    }
}

impl ConsensusApi for Consensus {
    fn validate_and_insert_block(&self, block: Block) -> ConsensusResult<BlockInsertionResult> {
        let _guard = self.processing_lock.lock();
        self.block_processor.process_block(&block)
    }

    fn get_block_info(&self, hash: Hash) -> ConsensusResult<BlockInfo> {
        let _guard = self.processing_lock.lock();
        let staging = Self::committed();
        let Some(status) = self.storage.statuses.get_optional(&staging, hash)? else {
            return Ok(BlockInfo::unknown());
        };
        let blue_score = self.storage.ghostdag.get_blue_score(&staging, hash).optional()?;
        Ok(BlockInfo { exists: true, status: Some(status), blue_score })
    }

    fn get_missing_block_body_hashes(&self, high: Hash) -> ConsensusResult<Vec<Hash>> {
        let _guard = self.processing_lock.lock();
        let staging = Self::committed();
        self.require_known(&staging, high)?;
        self.services.sync_manager.get_missing_block_body_hashes(&staging, high)
    }

    fn get_hashes_between(&self, low: Hash, high: Hash, max_blocks: usize) -> ConsensusResult<(Vec<Hash>, Hash)> {
        let _guard = self.processing_lock.lock();
        let staging = Self::committed();
        self.require_known(&staging, high)?;
        self.services.sync_manager.get_hashes_between(&staging, low, high, max_blocks)
    }

    fn create_headers_selected_chain_block_locator(&self, low: Option<Hash>, high: Option<Hash>) -> ConsensusResult<Vec<Hash>> {
        let _guard = self.processing_lock.lock();
        let staging = Self::committed();
        let low = match low {
            Some(low) => low,
            None => self.storage.metadata.get_pruning_point(&staging)?,
        };
        let high = match high {
            Some(high) => high,
            None => self.storage.metadata.get_headers_selected_tip(&staging)?,
        };
        self.require_known(&staging, low)?;
        self.require_known(&staging, high)?;
        self.services.sync_manager.create_selected_chain_block_locator(&staging, low, high)
    }

    fn get_virtual_selected_parent(&self) -> Hash {
        let _guard = self.processing_lock.lock();
        self.sink(&Self::committed()).unwrap_or(self.genesis_hash)
    }

    fn is_valid_pruning_point(&self, hash: Hash) -> ConsensusResult<bool> {
        let _guard = self.processing_lock.lock();
        let staging = Self::committed();
        let sink = self.sink(&staging)?;
        self.services.pruning_manager.is_valid_pruning_point(&staging, hash, sink)
    }

    fn get_pruning_point_utxos(
        &self,
        expected_pruning_point: Hash,
        from_outpoint: Option<TransactionOutpoint>,
        chunk_size: usize,
    ) -> ConsensusResult<Vec<(TransactionOutpoint, UtxoEntry)>> {
        let _guard = self.processing_lock.lock();
        let staging = Self::committed();
        self.services.pruning_manager.get_pruning_point_utxos(&staging, expected_pruning_point, from_outpoint, chunk_size)
    }

    fn build_block(&self, coinbase_data: CoinbaseData, txs: Vec<Transaction>) -> ConsensusResult<Block> {
        let _guard = self.processing_lock.lock();
        let staging = Self::committed();
        let parents = self.storage.virtual_state.get(&staging)?.parents.clone();
        self.services.template_builder.build_block_template(&staging, parents, &coinbase_data, txs, None)
    }

    fn build_block_with_parents(
        &self,
        parents: Vec<Hash>,
        coinbase_data: CoinbaseData,
        txs: Vec<Transaction>,
        timestamp: Option<u64>,
    ) -> ConsensusResult<Block> {
        let _guard = self.processing_lock.lock();
        let staging = Self::committed();
        for &parent in parents.iter() {
            self.require_known(&staging, parent)?;
        }
        self.services.template_builder.build_block_template(&staging, parents, &coinbase_data, txs, timestamp)
    }

    fn register_block_notifier(&self, notifier: Arc<dyn BlockNotifier>) {
        let _guard = self.processing_lock.lock();
        self.block_processor.register_notifier(notifier);
    }

    fn get_sink_utxo(&self, outpoint: &TransactionOutpoint) -> ConsensusResult<Option<UtxoEntry>> {
        let _guard = self.processing_lock.lock();
        Ok(self.storage.sink_utxo_set.get(&Self::committed(), outpoint)?)
    }

    fn get_virtual_state_info(&self) -> ConsensusResult<VirtualStateInfo> {
        let _guard = self.processing_lock.lock();
        let staging = Self::committed();
        let state = self.storage.virtual_state.get(&staging)?;
        Ok(VirtualStateInfo {
            parents: state.parents.clone(),
            sink: state.sink(),
            blue_score: state.ghostdag_data.blue_score,
            blue_work: state.ghostdag_data.blue_work,
            daa_score: state.daa_score,
            bits: state.bits,
            past_median_time: state.past_median_time,
            pruning_point: self.storage.metadata.get_pruning_point(&staging)?,
            finality_point: self.storage.metadata.get_virtual_finality_point(&staging)?,
            accepted_tx_count: state.accepted_tx_ids.len(),
        })
    }

    fn get_tips(&self) -> ConsensusResult<Vec<Hash>> {
        let _guard = self.processing_lock.lock();
        let mut tips: Vec<Hash> = self.services.topology.tips(&Self::committed())?.into_iter().collect();
        tips.sort();
        Ok(tips)
    }

    fn get_ghostdag_data(&self, hash: Hash) -> ConsensusResult<Arc<GhostdagData>> {
        let _guard = self.processing_lock.lock();
        self.storage.ghostdag.get_data(&Self::committed(), hash).optional()?.ok_or(ConsensusError::MissingGhostdagData(hash))
    }

    fn get_header(&self, hash: Hash) -> ConsensusResult<Arc<Header>> {
        let _guard = self.processing_lock.lock();
        self.storage.headers.get_header(&Self::committed(), hash).optional()?.ok_or(ConsensusError::UnknownBlock(hash))
    }

    fn get_pruning_point(&self) -> ConsensusResult<Hash> {
        let _guard = self.processing_lock.lock();
        Ok(self.storage.metadata.get_pruning_point(&Self::committed())?)
    }

    fn get_virtual_finality_point(&self) -> ConsensusResult<Hash> {
        let _guard = self.processing_lock.lock();
        Ok(self.storage.metadata.get_virtual_finality_point(&Self::committed())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::test_helpers::temp_db;
    use consensus_core::tx::ScriptPublicKey;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_queries_wait_for_processing_lock() {
        let (_dir, db) = temp_db();
        let consensus = Consensus::new(db, ConsensusConfig::new(Params::devnet())).unwrap();
        let block = consensus.build_block(CoinbaseData::new(ScriptPublicKey::new(0, vec![0x51]), vec![]), vec![]).unwrap();
        let genesis = consensus.genesis_hash();
        let finished = AtomicUsize::new(0);

        thread::scope(|s| {
            // Held the same way block insertion holds it across its commit
            let guard = consensus.processing_lock.lock();
            let handles = vec![
                s.spawn(|| {
                    consensus.get_virtual_state_info().unwrap();
                    finished.fetch_add(1, Ordering::SeqCst);
                }),
                s.spawn(|| {
                    consensus.get_pruning_point_utxos(genesis, None, 10).unwrap();
                    finished.fetch_add(1, Ordering::SeqCst);
                }),
                s.spawn(|| {
                    consensus.get_block_info(genesis).unwrap();
                    consensus.get_tips().unwrap();
                    consensus.get_virtual_selected_parent();
                    finished.fetch_add(1, Ordering::SeqCst);
                }),
            ];
            thread::sleep(Duration::from_millis(100));
            assert_eq!(finished.load(Ordering::SeqCst), 0);

            drop(guard);
            for handle in handles {
                handle.join().unwrap();
            }
        });
        assert_eq!(finished.load(Ordering::SeqCst), 3);

        consensus.validate_and_insert_block(block.clone()).unwrap();
        assert_eq!(consensus.get_virtual_selected_parent(), block.hash());
    }
}

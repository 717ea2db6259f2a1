//! Consensus database interface
//!
//! Bundles every store the engine reads and writes over one RocksDB instance.

use crate::consensus::types::PerfParams;
use database::db::{CF_PRUNING_UTXO_SET, CF_SINK_UTXO_SET};
use database::stores::{
    AcceptanceDataStore, BlockTransactionsStore, DaaStore, DepthStore, GhostdagStore, HeaderStore, MetadataStore,
    ReachabilityStore, RelationsStore, StatusesStore, UtxoDiffsStore, UtxoSetStore, VirtualStateStore,
};
use database::Database;
use std::sync::Arc;

/// Consensus storage coordinator
pub struct ConsensusStorage {
    pub db: Arc<Database>,

    pub headers: HeaderStore,
    pub block_transactions: BlockTransactionsStore,
    pub relations: RelationsStore,
    pub ghostdag: GhostdagStore,
    pub reachability: ReachabilityStore,
    pub statuses: StatusesStore,
    pub depth: DepthStore,
    pub daa: DaaStore,

    pub utxo_diffs: UtxoDiffsStore,
    pub acceptance: AcceptanceDataStore,
    pub sink_utxo_set: UtxoSetStore,
    pub pruning_utxo_set: UtxoSetStore,

    pub metadata: MetadataStore,
    pub virtual_state: VirtualStateStore,
}

impl ConsensusStorage {
    pub fn new(db: Arc<Database>, perf: &PerfParams) -> Arc<Self> {
        let headers_size = perf.header_cache_size;
        let data_size = perf.block_data_cache_size;

        Arc::new(Self {
            headers: HeaderStore::new(db.clone(), headers_size),
            block_transactions: BlockTransactionsStore::new(db.clone(), data_size),
            relations: RelationsStore::new(db.clone(), headers_size),
            ghostdag: GhostdagStore::new(db.clone(), headers_size),
            reachability: ReachabilityStore::new(db.clone(), headers_size),
            statuses: StatusesStore::new(db.clone(), headers_size),
            depth: DepthStore::new(db.clone(), headers_size),
            daa: DaaStore::new(db.clone(), data_size),
            utxo_diffs: UtxoDiffsStore::new(db.clone(), data_size),
            acceptance: AcceptanceDataStore::new(db.clone(), data_size),
            sink_utxo_set: UtxoSetStore::new(db.clone(), CF_SINK_UTXO_SET, perf.utxo_cache_size),
            pruning_utxo_set: UtxoSetStore::new(db.clone(), CF_PRUNING_UTXO_SET, 0),
            metadata: MetadataStore::new(db.clone()),
            virtual_state: VirtualStateStore::new(db.clone()),
            db,
        })
    }
}

//! Simulated miners driving a consensus engine
//!
//! Every miner is a task looping over: wait a random share of the block interval,
//! build a template over the current virtual, hold it back for a random propagation
//! delay, then submit it. Engine calls block, so they run on the blocking pool.

use crate::config::{Config, SimulationConfig};
use consensus::{Consensus, ConsensusApi, ConsensusError};
use consensus_core::api::BlockNotifier;
use consensus_core::block::{Block, CoinbaseData};
use consensus_core::blockstatus::BlockStatus;
use consensus_core::difficulty::check_pow;
use consensus_core::tx::ScriptPublicKey;
use consensus_core::Hash;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::spawn_blocking;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Counts committed blocks per status
#[derive(Default)]
struct StatusCounter {
    header_only: AtomicU64,
    pending: AtomicU64,
    valid: AtomicU64,
    disqualified: AtomicU64,
}

impl BlockNotifier for StatusCounter {
    fn on_new_block(&self, _block: &Block, status: BlockStatus) {
        let counter = match status {
            BlockStatus::StatusHeaderOnly => &self.header_only,
            BlockStatus::StatusUTXOPendingVerification => &self.pending,
            BlockStatus::StatusUTXOValid => &self.valid,
            BlockStatus::StatusDisqualifiedFromChain => &self.disqualified,
            BlockStatus::StatusInvalid => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Outcome of a simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    pub blocks_submitted: u64,
    pub rejected: u64,
    pub header_only_commits: u64,
    pub chain_valid_commits: u64,
    pub pending_commits: u64,
    pub disqualified_commits: u64,
    pub sink: Hash,
    pub sink_blue_score: u64,
    pub virtual_daa_score: u64,
    pub virtual_bits: u32,
    pub pruning_point: Hash,
    pub finality_point: Hash,
    pub tips: usize,
    pub elapsed_ms: u64,
}

#[derive(Clone)]
struct MinerContext {
    id: usize,
    consensus: Arc<Consensus>,
    settings: SimulationConfig,
    skip_proof_of_work: bool,
    submitted: Arc<AtomicU64>,
    rejected: Arc<AtomicU64>,
}

pub struct Simulator {
    consensus: Arc<Consensus>,
    settings: SimulationConfig,
    counter: Arc<StatusCounter>,
}

impl Simulator {
    pub fn new(consensus: Arc<Consensus>, settings: SimulationConfig) -> Self {
        let counter = Arc::new(StatusCounter::default());
        consensus.register_block_notifier(counter.clone());
        Self { consensus, settings, counter }
    }

    /// Opens the engine under the configured data directory
    pub fn open(config: &Config) -> Result<Self, String> {
        let engine_config = config.engine_config()?;
        let consensus = Consensus::open(&config.storage.data_dir, engine_config).map_err(|e| e.to_string())?;
        Ok(Self::new(Arc::new(consensus), config.simulation.clone()))
    }

    pub fn consensus(&self) -> &Arc<Consensus> {
        &self.consensus
    }

    pub async fn run(&self) -> Result<SimulationReport, String> {
        let start = Instant::now();
        let seed = self.settings.seed.unwrap_or_else(rand::random);
        let submitted = Arc::new(AtomicU64::new(0));
        let rejected = Arc::new(AtomicU64::new(0));
        info!("simulating {} blocks with {} miners (seed {})", self.settings.blocks, self.settings.miners, seed);

        let mut handles = Vec::with_capacity(self.settings.miners);
        for id in 0..self.settings.miners {
            let context = MinerContext {
                id,
                consensus: self.consensus.clone(),
                settings: self.settings.clone(),
                skip_proof_of_work: self.consensus.params().skip_proof_of_work,
                submitted: submitted.clone(),
                rejected: rejected.clone(),
            };
            let rng = StdRng::seed_from_u64(seed.wrapping_add(id as u64));
            handles.push(tokio::spawn(mine(context, rng)));
        }
        for handle in handles {
            handle.await.map_err(|e| format!("miner task failed: {}", e))??;
        }

        let info = self.consensus.get_virtual_state_info().map_err(|e| e.to_string())?;
        let sink_blue_score = self.consensus.get_ghostdag_data(info.sink).map_err(|e| e.to_string())?.blue_score;
        let tips = self.consensus.get_tips().map_err(|e| e.to_string())?.len();
        Ok(SimulationReport {
            blocks_submitted: submitted.load(Ordering::Relaxed),
            rejected: rejected.load(Ordering::Relaxed),
            header_only_commits: self.counter.header_only.load(Ordering::Relaxed),
            chain_valid_commits: self.counter.valid.load(Ordering::Relaxed),
            pending_commits: self.counter.pending.load(Ordering::Relaxed),
            disqualified_commits: self.counter.disqualified.load(Ordering::Relaxed),
            sink: info.sink,
            sink_blue_score,
            virtual_daa_score: info.daa_score,
            virtual_bits: info.bits,
            pruning_point: info.pruning_point,
            finality_point: info.finality_point,
            tips,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Grinds nonces until the header hash meets its own target
fn solve(block: Block) -> Block {
    let mut header = (*block.header).clone();
    while !check_pow(&header.hash, header.bits) {
        header.nonce = header.nonce.wrapping_add(1);
        header.finalize();
    }
    Block::from_arcs(Arc::new(header), block.transactions)
}

async fn mine(context: MinerContext, mut rng: StdRng) -> Result<(), String> {
    let settings = &context.settings;
    let mut nonce: u64 = 0;
    loop {
        let wait = rng.gen_range(0..=settings.block_interval_ms.saturating_mul(2));
        sleep(Duration::from_millis(wait)).await;
        if context.submitted.fetch_add(1, Ordering::SeqCst) >= settings.blocks {
            context.submitted.fetch_sub(1, Ordering::SeqCst);
            return Ok(());
        }

        nonce += 1;
        let mut extra_data = (context.id as u64).to_le_bytes().to_vec();
        extra_data.extend_from_slice(&nonce.to_le_bytes());
        let coinbase_data = CoinbaseData::new(ScriptPublicKey::new(0, vec![context.id as u8]), extra_data);

        let consensus = context.consensus.clone();
        let skip_proof_of_work = context.skip_proof_of_work;
        let block = spawn_blocking(move || {
            consensus.build_block(coinbase_data, vec![]).map(|block| if skip_proof_of_work { block } else { solve(block) })
        })
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| e.to_string())?;

        let delay = rng.gen_range(0..=settings.max_delay_ms);
        sleep(Duration::from_millis(delay)).await;

        let header_first = rng.gen_bool(settings.header_first_ratio.clamp(0.0, 1.0));
        let consensus = context.consensus.clone();
        let hash = block.hash();
        let result = spawn_blocking(move || {
            if header_first {
                consensus.validate_and_insert_block(block.to_header_only())?;
            }
            consensus.validate_and_insert_block(block)
        })
        .await
        .map_err(|e| e.to_string())?;

        match result {
            Ok(insertion) => debug!("miner {} submitted {} with status {}", context.id, hash, insertion.status),
            Err(ConsensusError::Rule(err)) => {
                context.rejected.fetch_add(1, Ordering::Relaxed);
                warn!("miner {} block {} rejected: {}", context.id, hash, err);
            }
            Err(err) => return Err(err.to_string()),
        }
    }
}

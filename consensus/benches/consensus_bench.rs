//! Consensus engine benchmarks
//!
//! Block insertion through the full pipeline, over a plain chain and over a
//! DAG with parallel blocks, block template building on a populated DAG, and
//! reachability tree insertion and ancestry queries on their own.

use consensus::consensus::{ReachabilityManager, ReachabilityService};
use consensus::{Consensus, ConsensusApi, ConsensusConfig, Params};
use consensus_core::block::{Block, CoinbaseData};
use consensus_core::tx::ScriptPublicKey;
use consensus_core::Hash;
use consensus_core::ORIGIN;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use database::stores::ReachabilityStore;
use database::{Database, StagingArea};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tempfile::TempDir;

fn bench_params() -> Params {
    Params { finality_depth: 50, merge_depth: 50, pruning_depth: 100, ..Params::devnet() }
}

fn open_consensus() -> (TempDir, Consensus) {
    let dir = tempfile::tempdir().unwrap();
    let consensus = Consensus::open(dir.path(), ConsensusConfig::new(bench_params())).unwrap();
    (dir, consensus)
}

fn coinbase_data(tag: u64) -> CoinbaseData {
    CoinbaseData::new(ScriptPublicKey::new(0, vec![0x51]), tag.to_le_bytes().to_vec())
}

/// Mines `count` blocks. Every round adds `width` parallel blocks on the current tips and
/// the next round merges them.
fn generate_blocks(count: usize, width: usize) -> Vec<Block> {
    let (_dir, consensus) = open_consensus();
    let mut clock = consensus.params().genesis.timestamp;
    let mut tips = vec![consensus.genesis_hash()];
    let mut blocks = Vec::with_capacity(count);

    while blocks.len() < count {
        let mut round: Vec<Hash> = Vec::with_capacity(width);
        for _ in 0..width.min(count - blocks.len()) {
            clock += 1000;
            let block =
                consensus.build_block_with_parents(tips.clone(), coinbase_data(blocks.len() as u64), vec![], Some(clock)).unwrap();
            consensus.validate_and_insert_block(block.clone()).unwrap();
            round.push(block.hash());
            blocks.push(block);
        }
        tips = round;
    }
    blocks
}

fn bench_block_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_insertion");
    group.sample_size(10);

    for (name, width) in [("chain", 1usize), ("dag_width_3", 3)] {
        let blocks = generate_blocks(200, width);
        group.throughput(Throughput::Elements(blocks.len() as u64));
        group.bench_with_input(BenchmarkId::new(name, blocks.len()), &blocks, |b, blocks| {
            b.iter_batched(
                open_consensus,
                |(_dir, consensus)| {
                    for block in blocks.iter() {
                        consensus.validate_and_insert_block(black_box(block.clone())).unwrap();
                    }
                },
                BatchSize::PerIteration,
            )
        });
    }
    group.finish();
}

fn bench_block_template(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_template");
    let (_dir, consensus) = open_consensus();
    for block in generate_blocks(300, 2) {
        consensus.validate_and_insert_block(block).unwrap();
    }

    group.bench_function("build_block_over_virtual", |b| {
        b.iter(|| consensus.build_block(black_box(coinbase_data(0)), vec![]).unwrap())
    });
    group.bench_function("virtual_state_info", |b| b.iter(|| consensus.get_virtual_state_info().unwrap()));
    group.finish();
}

fn reachability_hash(i: u64) -> Hash {
    Hash::from_le_u64([i + 1, 0, 0, 0])
}

/// A tree where each block hangs under one of the four most recent blocks. The tiny
/// initial capacity forces reindexing.
fn build_reachability_tree(count: u64) -> (TempDir, ReachabilityManager, StagingArea) {
    let dir = tempfile::tempdir().unwrap();
    let db = Arc::new(Database::open(dir.path()).unwrap());
    let reachability = ReachabilityManager::new(ReachabilityStore::new(db, 1024), 100, 1 << 12);
    let mut staging = StagingArea::new();
    let mut rng = StdRng::seed_from_u64(42);

    reachability.init(&mut staging, 1 << 16).unwrap();
    reachability.add_block(&mut staging, reachability_hash(0), ORIGIN, &[]).unwrap();
    for i in 1..count {
        let parent = i - 1 - rng.gen_range(0..i.min(4));
        reachability.add_block(&mut staging, reachability_hash(i), reachability_hash(parent), &[]).unwrap();
    }
    (dir, reachability, staging)
}

fn bench_reachability(c: &mut Criterion) {
    let mut group = c.benchmark_group("reachability");
    group.sample_size(10);

    group.throughput(Throughput::Elements(2000));
    group.bench_function("insert_2000", |b| b.iter(|| build_reachability_tree(black_box(2000))));

    let (_dir, reachability, staging) = build_reachability_tree(2000);
    let mut rng = StdRng::seed_from_u64(7);
    let queries: Vec<(Hash, Hash)> =
        (0..1000).map(|_| (reachability_hash(rng.gen_range(0..2000)), reachability_hash(rng.gen_range(0..2000)))).collect();
    group.throughput(Throughput::Elements(queries.len() as u64));
    group.bench_function("is_dag_ancestor_of", |b| {
        b.iter(|| {
            for &(this, queried) in queries.iter() {
                black_box(reachability.is_dag_ancestor_of(&staging, this, queried).unwrap());
            }
        })
    });
    group.finish();
}

criterion_group!(benches, bench_block_insertion, bench_block_template, bench_reachability);
criterion_main!(benches);

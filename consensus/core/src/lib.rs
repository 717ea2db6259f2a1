//! Core consensus types shared by the engine, the storage layer and the
//! collaborators consuming the engine (mining, flow, RPC).

use std::collections::{HashMap, HashSet};

pub mod acceptance_data;
pub mod api;
pub mod block;
pub mod blockstatus;
pub mod config;
pub mod constants;
pub mod difficulty;
pub mod errors;
pub mod ghostdag;
pub mod hashing;
pub mod header;
pub mod merkle;
pub mod reachability;
pub mod tx;
pub mod utxo;

pub use jio_hashes::{Hash, ZERO_HASH};

/// Accumulated proof-of-work of blue blocks
pub type BlueWorkType = jio_math::Uint192;

/// The GHOSTDAG `k` parameter type
pub type KType = u16;

pub type BlockHashMap<V> = HashMap<Hash, V>;
pub type BlockHashSet = HashSet<Hash>;

/// Block hash that is never assigned to a real block. Selected parent of genesis.
pub const ORIGIN: Hash = ZERO_HASH;

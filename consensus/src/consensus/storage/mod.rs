//! Storage wiring for consensus
//!
//! The store bundle shared by every manager and UTXO views over stored sets.

pub mod consensus_db;
pub mod utxo_set;

pub use consensus_db::ConsensusStorage;
pub use utxo_set::StoreUtxoView;

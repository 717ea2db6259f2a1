//! Consensus processes built on top of GHOSTDAG and reachability
//!
//! Mergeset acceptance, coinbase construction, depth anchors, pruning, past
//! median time, parent selection, sync queries and block templates.

pub mod acceptance;
pub mod coinbase;
pub mod depth;
pub mod mining;
pub mod parents_builder;
pub mod past_median_time;
pub mod pruning;
pub mod sync;

pub use acceptance::AcceptanceManager;
pub use coinbase::CoinbaseManager;
pub use depth::DepthManager;
pub use mining::BlockTemplateBuilder;
pub use parents_builder::ParentsBuilder;
pub use past_median_time::PastMedianTimeManager;
pub use pruning::PruningManager;
pub use sync::SyncManager;

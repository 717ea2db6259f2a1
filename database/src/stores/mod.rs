pub mod acceptance;
pub mod block_transactions;
pub mod daa;
pub mod depth;
pub mod ghostdag;
pub mod headers;
pub mod metadata;
pub mod reachability;
pub mod relations;
pub mod statuses;
pub mod utxo_diffs;
pub mod utxo_set;
pub mod virtual_state;

pub use acceptance::AcceptanceDataStore;
pub use block_transactions::BlockTransactionsStore;
pub use daa::DaaStore;
pub use depth::{BlockDepthInfo, DepthStore};
pub use ghostdag::GhostdagStore;
pub use headers::HeaderStore;
pub use metadata::MetadataStore;
pub use reachability::ReachabilityStore;
pub use relations::RelationsStore;
pub use statuses::StatusesStore;
pub use utxo_diffs::UtxoDiffsStore;
pub use utxo_set::UtxoSetStore;
pub use virtual_state::{VirtualState, VirtualStateStore};

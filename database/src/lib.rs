//! Storage layer of the consensus engine: a RocksDB database with one column
//! family per store, typed cached access, and the staging area through which
//! every consensus write is committed atomically.

pub mod access;
pub mod cache;
pub mod db;
pub mod errors;
pub mod key;
pub mod staging;
pub mod stores;

pub use db::Database;
pub use errors::{DbError, DbResult, StoreResultExtensions};
pub use staging::StagingArea;

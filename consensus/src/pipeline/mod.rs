//! Block processing pipeline for consensus
//!
//! Orchestrates header validation, body validation and virtual resolution
//! over a single staging area per submitted block.

pub mod block_processor;
pub mod body_processor;
pub mod header_processor;
pub mod virtual_processor;

pub use block_processor::BlockProcessor;
pub use body_processor::BodyProcessor;
pub use header_processor::{HeaderContext, HeaderFailure, HeaderProcessor};
pub use virtual_processor::VirtualProcessor;

use serde::{Deserialize, Serialize};

use crate::tx::TransactionId;
use crate::Hash;

/// Transactions a chain block accepted from one of its merged blocks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergesetBlockAcceptanceData {
    pub block_hash: Hash,
    pub accepted_transactions: Vec<TransactionId>,
}

/// Per chain block, in mergeset order (blues with the selected parent first, then reds)
pub type AcceptanceData = Vec<MergesetBlockAcceptanceData>;

/// Flattens acceptance data into the ordered list of accepted transaction ids
pub fn accepted_tx_ids(acceptance_data: &AcceptanceData) -> Vec<TransactionId> {
    acceptance_data.iter().flat_map(|d| d.accepted_transactions.iter().copied()).collect()
}

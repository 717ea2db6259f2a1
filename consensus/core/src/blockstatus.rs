use serde::{Deserialize, Serialize};

/// Lifecycle status of a known block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockStatus {
    /// Header validated, body not yet received
    StatusHeaderOnly,

    /// Body validated, UTXO state not yet verified on the virtual chain
    StatusUTXOPendingVerification,

    /// UTXO state verified as part of the virtual selected chain
    StatusUTXOValid,

    /// Valid block which may not be part of the selected chain (context rule violation)
    StatusDisqualifiedFromChain,

    /// Block failed a structural rule
    StatusInvalid,
}

impl BlockStatus {
    pub fn has_block_header(self) -> bool {
        !matches!(self, BlockStatus::StatusInvalid)
    }

    pub fn has_block_body(self) -> bool {
        matches!(
            self,
            BlockStatus::StatusUTXOPendingVerification | BlockStatus::StatusUTXOValid | BlockStatus::StatusDisqualifiedFromChain
        )
    }

    /// Whether the block may take part in the virtual selected chain
    pub fn is_chain_eligible(self) -> bool {
        matches!(self, BlockStatus::StatusUTXOPendingVerification | BlockStatus::StatusUTXOValid)
    }

    pub fn is_valid(self) -> bool {
        self != BlockStatus::StatusInvalid
    }
}

impl std::fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BlockStatus::StatusHeaderOnly => "HeaderOnly",
            BlockStatus::StatusUTXOPendingVerification => "UTXOPendingVerification",
            BlockStatus::StatusUTXOValid => "UTXOValid",
            BlockStatus::StatusDisqualifiedFromChain => "DisqualifiedFromChain",
            BlockStatus::StatusInvalid => "Invalid",
        };
        f.write_str(s)
    }
}

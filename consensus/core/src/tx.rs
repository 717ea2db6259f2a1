//!
//! # Transaction
//!
//! Script-less consensus [`Transaction`] structure and related types. Script
//! semantics live outside the consensus engine; scripts are opaque byte strings.
//!

use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::constants::{BASE_TX_MASS, MASS_PER_BYTE, MASS_PER_INPUT, MASS_PER_OUTPUT, TX_VERSION};
use crate::{hashing, Hash, ZERO_HASH};

/// COINBASE_TRANSACTION_INDEX is the index of the coinbase transaction in every block
pub const COINBASE_TRANSACTION_INDEX: usize = 0;

/// A 32-byte transaction identifier.
pub type TransactionId = Hash;

pub type TransactionIndexType = u32;

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptPublicKey {
    pub version: u16,
    pub script: Vec<u8>,
}

impl ScriptPublicKey {
    pub fn new(version: u16, script: Vec<u8>) -> Self {
        Self { version, script }
    }
}

/// Holds details about an individual transaction output in a utxo
/// set such as whether or not it was contained in a coinbase tx, the daa
/// score of the block that accepts the tx, its public key script, and how
/// much it pays.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoEntry {
    pub amount: u64,
    pub script_public_key: ScriptPublicKey,
    pub block_daa_score: u64,
    pub is_coinbase: bool,
}

impl UtxoEntry {
    pub fn new(amount: u64, script_public_key: ScriptPublicKey, block_daa_score: u64, is_coinbase: bool) -> Self {
        Self { amount, script_public_key, block_daa_score, is_coinbase }
    }
}

#[derive(Eq, Default, Hash, PartialEq, Debug, Copy, Clone, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOutpoint {
    pub transaction_id: TransactionId,
    pub index: TransactionIndexType,
}

impl TransactionOutpoint {
    pub fn new(transaction_id: TransactionId, index: u32) -> Self {
        Self { transaction_id, index }
    }
}

impl Display for TransactionOutpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.transaction_id, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInput {
    pub previous_outpoint: TransactionOutpoint,
    pub signature_script: Vec<u8>,
    pub sequence: u64,
}

impl TransactionInput {
    pub fn new(previous_outpoint: TransactionOutpoint, signature_script: Vec<u8>, sequence: u64) -> Self {
        Self { previous_outpoint, signature_script, sequence }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOutput {
    pub value: u64,
    pub script_public_key: ScriptPublicKey,
}

impl TransactionOutput {
    pub fn new(value: u64, script_public_key: ScriptPublicKey) -> Self {
        Self { value, script_public_key }
    }
}

/// A consensus transaction. The id is computed once at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub version: u16,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    /// DAA score or millisecond timestamp, see [`crate::constants::LOCK_TIME_THRESHOLD`]
    pub lock_time: u64,
    pub payload: Vec<u8>,

    id: TransactionId,
}

impl Transaction {
    pub fn new(inputs: Vec<TransactionInput>, outputs: Vec<TransactionOutput>, lock_time: u64, payload: Vec<u8>) -> Self {
        let mut tx = Self { version: TX_VERSION, inputs, outputs, lock_time, payload, id: ZERO_HASH };
        tx.finalize();
        tx
    }

    /// Builds a coinbase transaction: no inputs, paying `outputs`, tagged by `payload`
    pub fn new_coinbase(outputs: Vec<TransactionOutput>, payload: Vec<u8>) -> Self {
        Self::new(Vec::new(), outputs, 0, payload)
    }

    /// Recalculates the cached id. Must be called after any field edit.
    pub fn finalize(&mut self) {
        self.id = hashing::tx::id(self);
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn total_output_value(&self) -> Option<u64> {
        self.outputs.iter().try_fold(0u64, |acc, output| acc.checked_add(output.value))
    }

    /// Context-free mass: a fixed charge plus per-input, per-output and per-byte charges
    pub fn mass(&self) -> u64 {
        let script_bytes: usize = self.inputs.iter().map(|input| input.signature_script.len()).sum::<usize>()
            + self.outputs.iter().map(|output| output.script_public_key.script.len()).sum::<usize>();
        BASE_TX_MASS
            + MASS_PER_INPUT * self.inputs.len() as u64
            + MASS_PER_OUTPUT * self.outputs.len() as u64
            + MASS_PER_BYTE * (script_bytes + self.payload.len()) as u64
    }

    pub fn outpoint(&self, index: u32) -> TransactionOutpoint {
        TransactionOutpoint::new(self.id, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spend(txid: u64) -> Transaction {
        Transaction::new(
            vec![TransactionInput::new(TransactionOutpoint::new(Hash::from_u64_word(txid), 0), vec![1, 2], 0)],
            vec![TransactionOutput::new(10, ScriptPublicKey::new(0, vec![0xac]))],
            0,
            vec![],
        )
    }

    #[test]
    fn test_id_is_content_addressed() {
        assert_eq!(spend(1).id(), spend(1).id());
        assert_ne!(spend(1).id(), spend(2).id());
    }

    #[test]
    fn test_finalize_after_edit() {
        let mut tx = spend(1);
        let before = tx.id();
        tx.lock_time = 5;
        tx.finalize();
        assert_ne!(tx.id(), before);
    }

    #[test]
    fn test_coinbase_detection_and_values() {
        let cb = Transaction::new_coinbase(vec![TransactionOutput::new(u64::MAX, ScriptPublicKey::default()); 2], vec![]);
        assert!(cb.is_coinbase());
        assert!(!spend(1).is_coinbase());
        assert_eq!(cb.total_output_value(), None);
        assert_eq!(spend(1).total_output_value(), Some(10));
    }

    #[test]
    fn test_mass_counts_inputs_outputs_and_bytes() {
        let tx = spend(1);
        assert_eq!(tx.mass(), BASE_TX_MASS + MASS_PER_INPUT + MASS_PER_OUTPUT + 3);
    }
}

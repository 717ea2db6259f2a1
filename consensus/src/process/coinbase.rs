//! Coinbase transaction handling
//!
//! A coinbase pays at most the fixed subsidy to the miner's script and carries the
//! block's blue score followed by the miner's extra data in its payload.

use consensus_core::block::CoinbaseData;
use consensus_core::errors::{BlockProcessResult, RuleError};
use consensus_core::tx::{Transaction, TransactionOutput};

#[derive(Clone)]
pub struct CoinbaseManager {
    subsidy: u64,
}

impl CoinbaseManager {
    pub fn new(subsidy: u64) -> Self {
        Self { subsidy }
    }

    pub fn subsidy(&self) -> u64 {
        self.subsidy
    }

    /// The coinbase a block template with this blue score pays
    pub fn expected_coinbase_transaction(&self, blue_score: u64, coinbase_data: &CoinbaseData) -> Transaction {
        let mut payload = Vec::with_capacity(8 + coinbase_data.extra_data.len());
        payload.extend_from_slice(&blue_score.to_le_bytes());
        payload.extend_from_slice(&coinbase_data.extra_data);

        let outputs = vec![TransactionOutput::new(self.subsidy, coinbase_data.script_public_key.clone())];
        Transaction::new_coinbase(outputs, payload)
    }

    pub fn validate_coinbase_amount(&self, coinbase: &Transaction) -> BlockProcessResult<()> {
        match coinbase.total_output_value() {
            Some(total) if total <= self.subsidy => Ok(()),
            Some(total) => Err(RuleError::BadCoinbaseAmount(total, self.subsidy)),
            None => Err(RuleError::BadCoinbaseAmount(u64::MAX, self.subsidy)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consensus_core::tx::ScriptPublicKey;

    #[test]
    fn test_expected_coinbase_layout() {
        let manager = CoinbaseManager::new(5000);
        let data = CoinbaseData::new(ScriptPublicKey::new(0, vec![0xab]), b"miner".to_vec());
        let coinbase = manager.expected_coinbase_transaction(7, &data);

        assert!(coinbase.is_coinbase());
        assert_eq!(coinbase.outputs.len(), 1);
        assert_eq!(coinbase.outputs[0].value, 5000);
        assert_eq!(coinbase.outputs[0].script_public_key, data.script_public_key);
        assert_eq!(&coinbase.payload[..8], &7u64.to_le_bytes());
        assert_eq!(&coinbase.payload[8..], b"miner");

        // Different blue scores give different coinbase ids
        assert_ne!(coinbase.id(), manager.expected_coinbase_transaction(8, &data).id());
    }

    #[test]
    fn test_coinbase_amount_is_capped_by_subsidy() {
        let manager = CoinbaseManager::new(5000);
        let spk = ScriptPublicKey::new(0, vec![]);
        let under = Transaction::new_coinbase(vec![TransactionOutput::new(4000, spk.clone())], vec![]);
        assert_eq!(manager.validate_coinbase_amount(&under), Ok(()));

        let over = Transaction::new_coinbase(
            vec![TransactionOutput::new(4000, spk.clone()), TransactionOutput::new(1001, spk)],
            vec![],
        );
        assert_eq!(manager.validate_coinbase_amount(&over), Err(RuleError::BadCoinbaseAmount(5001, 5000)));
    }
}

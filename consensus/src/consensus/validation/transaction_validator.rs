//! Transaction validation
//!
//! Lock time finality and the UTXO context rules a transaction must satisfy to
//! be accepted by a chain block. Rejections here never invalidate a block: the
//! transaction is simply left out of the acceptance data.

use consensus_core::constants::LOCK_TIME_THRESHOLD;
use consensus_core::errors::{BlockProcessResult, ConsensusResult, RuleError};
use consensus_core::tx::{Transaction, TransactionOutpoint};
use consensus_core::utxo::UtxoView;
use thiserror::Error;

/// Reasons a transaction is not accepted in some UTXO context
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxRuleError {
    #[error("input outpoint {0} is not in the UTXO set")]
    MissingInput(TransactionOutpoint),

    #[error("coinbase output {0} is not mature at DAA score {1}")]
    ImmatureCoinbaseSpend(TransactionOutpoint, u64),

    #[error("outputs total {1} exceeds inputs total {0}")]
    SpendTooHigh(u64, u64),

    #[error("value overflow")]
    ValueOverflow,

    #[error("lock time {0} is not reached")]
    NotFinalized(u64),

    #[error("output {0} already exists")]
    OutputAlreadyExists(TransactionOutpoint),
}

pub type TxResult<T> = std::result::Result<T, TxRuleError>;

#[derive(Clone)]
pub struct TransactionValidator {
    coinbase_maturity: u64,
}

impl TransactionValidator {
    pub fn new(coinbase_maturity: u64) -> Self {
        Self { coinbase_maturity }
    }

    /// A zero lock time is always final. Lock times below the threshold are DAA scores,
    /// others are timestamps compared with past median time. Otherwise a transaction is
    /// still final when every input opted out with a max sequence.
    pub fn is_finalized(tx: &Transaction, daa_score: u64, past_median_time: u64) -> bool {
        if tx.lock_time == 0 {
            return true;
        }
        let block_time = if tx.lock_time < LOCK_TIME_THRESHOLD { daa_score } else { past_median_time };
        if tx.lock_time < block_time {
            return true;
        }
        tx.inputs.iter().all(|input| input.sequence == u64::MAX)
    }

    /// Block level finality rule for every transaction of a block body
    pub fn check_transactions_finalized(
        transactions: &[Transaction],
        daa_score: u64,
        past_median_time: u64,
    ) -> BlockProcessResult<()> {
        for tx in transactions {
            if !Self::is_finalized(tx, daa_score, past_median_time) {
                return Err(RuleError::UnfinalizedTransaction(tx.id(), tx.lock_time));
            }
        }
        Ok(())
    }

    /// Validates a non-coinbase transaction against `view` from the point of view of a
    /// chain block with the given DAA score and past median time. Returns the fee.
    /// The outer result carries store failures, the inner one the rule outcome.
    pub fn validate_in_utxo_context<V: UtxoView + ?Sized>(
        &self,
        tx: &Transaction,
        view: &V,
        pov_daa_score: u64,
        pov_past_median_time: u64,
    ) -> ConsensusResult<TxResult<u64>> {
        let mut total_in: u64 = 0;
        for input in tx.inputs.iter() {
            let outpoint = input.previous_outpoint;
            let Some(entry) = view.get(&outpoint)? else {
                return Ok(Err(TxRuleError::MissingInput(outpoint)));
            };
            if entry.is_coinbase && pov_daa_score < entry.block_daa_score.saturating_add(self.coinbase_maturity) {
                return Ok(Err(TxRuleError::ImmatureCoinbaseSpend(outpoint, pov_daa_score)));
            }
            total_in = match total_in.checked_add(entry.amount) {
                Some(total) => total,
                None => return Ok(Err(TxRuleError::ValueOverflow)),
            };
        }

        let Some(total_out) = tx.total_output_value() else {
            return Ok(Err(TxRuleError::ValueOverflow));
        };
        if total_in < total_out {
            return Ok(Err(TxRuleError::SpendTooHigh(total_in, total_out)));
        }

        if !Self::is_finalized(tx, pov_daa_score, pov_past_median_time) {
            return Ok(Err(TxRuleError::NotFinalized(tx.lock_time)));
        }

        if let Err(err) = Self::check_outputs_are_new(tx, view)? {
            return Ok(Err(err));
        }
        Ok(Ok(total_in - total_out))
    }

    /// None of the outpoints the transaction creates may already be unspent
    pub fn check_outputs_are_new<V: UtxoView + ?Sized>(tx: &Transaction, view: &V) -> ConsensusResult<TxResult<()>> {
        for index in 0..tx.outputs.len() as u32 {
            let outpoint = tx.outpoint(index);
            if view.contains(&outpoint)? {
                return Ok(Err(TxRuleError::OutputAlreadyExists(outpoint)));
            }
        }
        Ok(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consensus_core::tx::{ScriptPublicKey, TransactionInput, TransactionOutput, UtxoEntry};
    use consensus_core::utxo::UtxoCollection;
    use consensus_core::Hash;

    fn outpoint(i: u64) -> TransactionOutpoint {
        TransactionOutpoint::new(Hash::from_le_u64([i, 0, 0, 0]), 0)
    }

    fn spend(from: TransactionOutpoint, value: u64, lock_time: u64, sequence: u64) -> Transaction {
        Transaction::new(
            vec![TransactionInput::new(from, vec![], sequence)],
            vec![TransactionOutput::new(value, ScriptPublicKey::new(0, vec![0x51]))],
            lock_time,
            vec![],
        )
    }

    fn view_with(entries: &[(TransactionOutpoint, UtxoEntry)]) -> UtxoCollection {
        entries.iter().cloned().collect()
    }

    #[test]
    fn test_lock_time_finality() {
        let tx = spend(outpoint(1), 10, 0, 0);
        assert!(TransactionValidator::is_finalized(&tx, 0, 0));

        // DAA score based
        let tx = spend(outpoint(1), 10, 100, 0);
        assert!(!TransactionValidator::is_finalized(&tx, 100, u64::MAX));
        assert!(TransactionValidator::is_finalized(&tx, 101, 0));

        // Timestamp based
        let tx = spend(outpoint(1), 10, LOCK_TIME_THRESHOLD + 5, 0);
        assert!(!TransactionValidator::is_finalized(&tx, u64::MAX, LOCK_TIME_THRESHOLD + 5));
        assert!(TransactionValidator::is_finalized(&tx, 0, LOCK_TIME_THRESHOLD + 6));

        // Max sequence opts out of the lock time
        let tx = spend(outpoint(1), 10, 100, u64::MAX);
        assert!(TransactionValidator::is_finalized(&tx, 0, 0));

        let err = TransactionValidator::check_transactions_finalized(&[spend(outpoint(1), 10, 100, 0)], 50, 0).unwrap_err();
        assert!(matches!(err, RuleError::UnfinalizedTransaction(_, 100)));
    }

    #[test]
    fn test_utxo_context_rules() {
        let validator = TransactionValidator::new(10);
        let spk = ScriptPublicKey::new(0, vec![0x51]);
        let view = view_with(&[
            (outpoint(1), UtxoEntry::new(5000, spk.clone(), 100, false)),
            (outpoint(2), UtxoEntry::new(5000, spk, 100, true)),
        ]);

        let tx = spend(outpoint(1), 3000, 0, 0);
        assert_eq!(validator.validate_in_utxo_context(&tx, &view, 101, 0).unwrap(), Ok(2000));

        let tx = spend(outpoint(3), 3000, 0, 0);
        assert_eq!(validator.validate_in_utxo_context(&tx, &view, 101, 0).unwrap(), Err(TxRuleError::MissingInput(outpoint(3))));

        let tx = spend(outpoint(1), 6000, 0, 0);
        assert_eq!(validator.validate_in_utxo_context(&tx, &view, 101, 0).unwrap(), Err(TxRuleError::SpendTooHigh(5000, 6000)));

        // Coinbase outputs mature after `coinbase_maturity` DAA score
        let tx = spend(outpoint(2), 1000, 0, 0);
        assert_eq!(
            validator.validate_in_utxo_context(&tx, &view, 109, 0).unwrap(),
            Err(TxRuleError::ImmatureCoinbaseSpend(outpoint(2), 109))
        );
        assert_eq!(validator.validate_in_utxo_context(&tx, &view, 110, 0).unwrap(), Ok(4000));

        let tx = spend(outpoint(1), 1000, 500, 0);
        assert_eq!(validator.validate_in_utxo_context(&tx, &view, 200, 0).unwrap(), Err(TxRuleError::NotFinalized(500)));
    }

    #[test]
    fn test_outputs_must_be_new() {
        let validator = TransactionValidator::new(0);
        let spk = ScriptPublicKey::new(0, vec![0x51]);
        let tx = spend(outpoint(1), 10, 0, 0);
        let view = view_with(&[
            (outpoint(1), UtxoEntry::new(10, spk.clone(), 0, false)),
            (tx.outpoint(0), UtxoEntry::new(10, spk, 0, false)),
        ]);
        assert_eq!(
            validator.validate_in_utxo_context(&tx, &view, 1, 0).unwrap(),
            Err(TxRuleError::OutputAlreadyExists(tx.outpoint(0)))
        );
    }
}

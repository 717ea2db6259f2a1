//! Block body validation in isolation
//!
//! Rules over the transaction list of a block that need no UTXO context.

use crate::process::coinbase::CoinbaseManager;
use consensus_core::block::Block;
use consensus_core::tx::COINBASE_TRANSACTION_INDEX;
use consensus_core::errors::{BlockProcessResult, RuleError};
use consensus_core::merkle::calc_hash_merkle_root;
use consensus_core::tx::TransactionOutpoint;
use consensus_core::BlockHashMap;
use std::collections::HashSet;

#[derive(Clone)]
pub struct BlockValidator {
    max_block_mass: u64,
    coinbase_manager: CoinbaseManager,
}

impl BlockValidator {
    pub fn new(max_block_mass: u64, coinbase_manager: CoinbaseManager) -> Self {
        Self { max_block_mass, coinbase_manager }
    }

    pub fn validate_body_in_isolation(&self, block: &Block) -> BlockProcessResult<()> {
        self.check_coinbase_layout(block)?;
        self.check_merkle_root(block)?;
        self.coinbase_manager.validate_coinbase_amount(&block.transactions[COINBASE_TRANSACTION_INDEX])?;
        self.check_block_mass(block)?;
        self.check_duplicate_transactions(block)?;
        self.check_double_spends(block)?;
        self.check_chained_inputs(block)
    }

    fn check_coinbase_layout(&self, block: &Block) -> BlockProcessResult<()> {
        let Some(first) = block.transactions.first() else {
            return Err(RuleError::NoTransactions);
        };
        if !first.is_coinbase() {
            return Err(RuleError::FirstTxNotCoinbase);
        }
        if let Some(index) = block.transactions.iter().skip(1).position(|tx| tx.is_coinbase()) {
            return Err(RuleError::MultipleCoinbases(index + 1));
        }
        Ok(())
    }

    pub fn check_merkle_root(&self, block: &Block) -> BlockProcessResult<()> {
        let calculated = calc_hash_merkle_root(block.transactions.iter());
        if calculated != block.header.hash_merkle_root {
            return Err(RuleError::BadMerkleRoot(block.header.hash_merkle_root, calculated));
        }
        Ok(())
    }

    fn check_block_mass(&self, block: &Block) -> BlockProcessResult<()> {
        let mut total: u64 = 0;
        for tx in block.transactions.iter() {
            total = total.saturating_add(tx.mass());
            if total > self.max_block_mass {
                return Err(RuleError::ExceedsMaxBlockMass(total, self.max_block_mass));
            }
        }
        Ok(())
    }

    fn check_duplicate_transactions(&self, block: &Block) -> BlockProcessResult<()> {
        let mut ids = HashSet::with_capacity(block.transactions.len());
        for tx in block.transactions.iter() {
            if !ids.insert(tx.id()) {
                return Err(RuleError::DuplicateTransactions(tx.id()));
            }
        }
        Ok(())
    }

    fn check_double_spends(&self, block: &Block) -> BlockProcessResult<()> {
        let mut spent: HashSet<TransactionOutpoint> = HashSet::new();
        for input in block.transactions.iter().flat_map(|tx| tx.inputs.iter()) {
            if !spent.insert(input.previous_outpoint) {
                return Err(RuleError::DoubleSpendInSameBlock(input.previous_outpoint));
            }
        }
        Ok(())
    }

    /// A transaction may only spend outputs of transactions placed before it
    fn check_chained_inputs(&self, block: &Block) -> BlockProcessResult<()> {
        let positions: BlockHashMap<usize> = block.transactions.iter().enumerate().map(|(i, tx)| (tx.id(), i)).collect();
        for (index, tx) in block.transactions.iter().enumerate() {
            for input in tx.inputs.iter() {
                if let Some(&position) = positions.get(&input.previous_outpoint.transaction_id) {
                    if position >= index {
                        return Err(RuleError::TxMissingInputs(tx.id()));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consensus_core::header::Header;
    use consensus_core::tx::{ScriptPublicKey, Transaction, TransactionInput, TransactionOutput};
    use consensus_core::{Hash, ZERO_HASH};

    fn validator() -> BlockValidator {
        BlockValidator::new(10_000, CoinbaseManager::new(1000))
    }

    fn coinbase(value: u64) -> Transaction {
        Transaction::new_coinbase(vec![TransactionOutput::new(value, ScriptPublicKey::default())], vec![1])
    }

    fn spend(from: TransactionOutpoint) -> Transaction {
        Transaction::new(vec![TransactionInput::new(from, vec![], 0)], vec![TransactionOutput::new(1, ScriptPublicKey::default())], 0, vec![])
    }

    fn block(transactions: Vec<Transaction>) -> Block {
        let mut header = Header::from_precomputed_hash(ZERO_HASH, vec![Hash::from_le_u64([1, 0, 0, 0])]);
        header.hash_merkle_root = calc_hash_merkle_root(transactions.iter());
        header.finalize();
        Block::new(header, transactions)
    }

    fn outpoint(i: u64) -> TransactionOutpoint {
        TransactionOutpoint::new(Hash::from_le_u64([i, 0, 0, 0]), 0)
    }

    #[test]
    fn test_valid_body() {
        assert_eq!(validator().validate_body_in_isolation(&block(vec![coinbase(1000), spend(outpoint(1))])), Ok(()));
    }

    #[test]
    fn test_coinbase_layout() {
        let v = validator();
        assert_eq!(v.validate_body_in_isolation(&Block::from_header(Header::from_precomputed_hash(ZERO_HASH, vec![]))), Err(RuleError::NoTransactions));
        assert_eq!(v.validate_body_in_isolation(&block(vec![spend(outpoint(1))])), Err(RuleError::FirstTxNotCoinbase));
        assert_eq!(
            v.validate_body_in_isolation(&block(vec![coinbase(1), spend(outpoint(1)), coinbase(2)])),
            Err(RuleError::MultipleCoinbases(2))
        );
        assert_eq!(v.validate_body_in_isolation(&block(vec![coinbase(1001)])), Err(RuleError::BadCoinbaseAmount(1001, 1000)));
    }

    #[test]
    fn test_merkle_root_mismatch() {
        let mut b = block(vec![coinbase(1)]);
        let other = block(vec![coinbase(2)]);
        b.transactions = other.transactions.clone();
        assert_eq!(
            validator().validate_body_in_isolation(&b),
            Err(RuleError::BadMerkleRoot(b.header.hash_merkle_root, other.header.hash_merkle_root))
        );
    }

    #[test]
    fn test_duplicates_and_double_spends() {
        let v = validator();
        let tx = spend(outpoint(1));
        assert_eq!(
            v.validate_body_in_isolation(&block(vec![coinbase(1), tx.clone(), tx.clone()])),
            Err(RuleError::DuplicateTransactions(tx.id()))
        );

        let mut other = spend(outpoint(1));
        other.payload = vec![9];
        other.finalize();
        assert_eq!(
            v.validate_body_in_isolation(&block(vec![coinbase(1), tx, other])),
            Err(RuleError::DoubleSpendInSameBlock(outpoint(1)))
        );
    }

    #[test]
    fn test_spending_a_later_transaction() {
        let parent = spend(outpoint(1));
        let child = spend(parent.outpoint(0));
        let v = validator();
        assert_eq!(v.validate_body_in_isolation(&block(vec![coinbase(1), parent.clone(), child.clone()])), Ok(()));
        assert_eq!(
            v.validate_body_in_isolation(&block(vec![coinbase(1), child.clone(), parent])),
            Err(RuleError::TxMissingInputs(child.id()))
        );
    }

    #[test]
    fn test_block_mass_limit() {
        let v = BlockValidator::new(300, CoinbaseManager::new(1000));
        let txs = vec![coinbase(1), spend(outpoint(1)), spend(outpoint(2))];
        assert!(matches!(v.validate_body_in_isolation(&block(txs)), Err(RuleError::ExceedsMaxBlockMass(_, 300))));
    }
}

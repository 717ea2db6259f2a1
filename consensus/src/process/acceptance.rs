//! Transaction acceptance of chain blocks
//!
//! A chain block accepts the transactions of its mergeset, walked in consensus
//! order on top of its selected parent's UTXO set. Red blocks contribute their
//! regular transactions but never their coinbase. A transaction failing any rule
//! is skipped without invalidating the block that carries it.

use crate::consensus::validation::TransactionValidator;
use consensus_core::acceptance_data::{AcceptanceData, MergesetBlockAcceptanceData};
use consensus_core::errors::ConsensusResult;
use consensus_core::ghostdag::GhostdagData;
use consensus_core::tx::{Transaction, TransactionId, UtxoEntry};
use consensus_core::utxo::{ComposedUtxoView, UtxoDiff, UtxoView};
use database::stores::BlockTransactionsStore;
use database::{StagingArea, StoreResultExtensions};
use tracing::{trace, warn};

/// UTXO diff and acceptance data of one chain block (or of the virtual)
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergesetAcceptance {
    pub utxo_diff: UtxoDiff,
    pub acceptance_data: AcceptanceData,
}

impl MergesetAcceptance {
    pub fn accepted_tx_ids(&self) -> Vec<TransactionId> {
        consensus_core::acceptance_data::accepted_tx_ids(&self.acceptance_data)
    }
}

#[derive(Clone)]
pub struct AcceptanceManager {
    block_transactions_store: BlockTransactionsStore,
    transaction_validator: TransactionValidator,
}

impl AcceptanceManager {
    pub fn new(block_transactions_store: BlockTransactionsStore, transaction_validator: TransactionValidator) -> Self {
        Self { block_transactions_store, transaction_validator }
    }

    /// Walks the mergeset of `ghostdag_data` over `base` (the selected parent's UTXO set).
    /// `daa_score` and `past_median_time` are those of the accepting block.
    pub fn calc_mergeset_acceptance<V: UtxoView + ?Sized>(
        &self,
        staging: &StagingArea,
        ghostdag_data: &GhostdagData,
        daa_score: u64,
        past_median_time: u64,
        base: &V,
    ) -> ConsensusResult<MergesetAcceptance> {
        let mut acceptance = MergesetAcceptance::default();
        let blues_count = ghostdag_data.mergeset_blues.len();

        for (index, merged_block) in ghostdag_data.consensus_ordered_mergeset().enumerate() {
            let is_blue = index < blues_count;
            let mut block_acceptance = MergesetBlockAcceptanceData { block_hash: merged_block, accepted_transactions: Vec::new() };

            let Some(transactions) = self.block_transactions_store.get(staging, merged_block).optional()? else {
                warn!("merged block {} has no body, its transactions are not accepted", merged_block);
                acceptance.acceptance_data.push(block_acceptance);
                continue;
            };

            for tx in transactions.iter() {
                let accepted = if tx.is_coinbase() {
                    is_blue && self.try_accept_coinbase(tx, daa_score, base, &mut acceptance.utxo_diff)?
                } else {
                    self.try_accept_transaction(tx, daa_score, past_median_time, base, &mut acceptance.utxo_diff)?
                };
                if accepted {
                    block_acceptance.accepted_transactions.push(tx.id());
                }
            }
            acceptance.acceptance_data.push(block_acceptance);
        }
        Ok(acceptance)
    }

    fn try_accept_coinbase<V: UtxoView + ?Sized>(
        &self,
        tx: &Transaction,
        daa_score: u64,
        base: &V,
        diff: &mut UtxoDiff,
    ) -> ConsensusResult<bool> {
        if let Err(err) = TransactionValidator::check_outputs_are_new(tx, &ComposedUtxoView::new(base, diff))? {
            trace!("coinbase {} rejected: {}", tx.id(), err);
            return Ok(false);
        }
        for (index, output) in tx.outputs.iter().enumerate() {
            let entry = UtxoEntry::new(output.value, output.script_public_key.clone(), daa_score, true);
            diff.add_entry(tx.outpoint(index as u32), entry)?;
        }
        Ok(true)
    }

    fn try_accept_transaction<V: UtxoView + ?Sized>(
        &self,
        tx: &Transaction,
        daa_score: u64,
        past_median_time: u64,
        base: &V,
        diff: &mut UtxoDiff,
    ) -> ConsensusResult<bool> {
        let mut spent = Vec::with_capacity(tx.inputs.len());
        {
            let view = ComposedUtxoView::new(base, diff);
            if let Err(err) = self.transaction_validator.validate_in_utxo_context(tx, &view, daa_score, past_median_time)? {
                trace!("transaction {} rejected: {}", tx.id(), err);
                return Ok(false);
            }
            for input in tx.inputs.iter() {
                if let Some(entry) = view.get(&input.previous_outpoint)? {
                    spent.push((input.previous_outpoint, entry));
                }
            }
        }

        for (outpoint, entry) in spent {
            diff.remove_entry(outpoint, entry)?;
        }
        for (index, output) in tx.outputs.iter().enumerate() {
            let entry = UtxoEntry::new(output.value, output.script_public_key.clone(), daa_score, false);
            diff.add_entry(tx.outpoint(index as u32), entry)?;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::test_helpers::{h, temp_db};
    use consensus_core::tx::{ScriptPublicKey, TransactionInput, TransactionOutpoint, TransactionOutput};
    use consensus_core::utxo::UtxoCollection;
    use consensus_core::Hash;
    use std::sync::Arc;

    struct Fixture {
        manager: AcceptanceManager,
        store: BlockTransactionsStore,
        staging: StagingArea,
        _dir: tempfile::TempDir,
    }

    fn fixture(maturity: u64) -> Fixture {
        let (dir, db) = temp_db();
        let store = BlockTransactionsStore::new(db, 10);
        let manager = AcceptanceManager::new(store.clone(), TransactionValidator::new(maturity));
        Fixture { manager, store, staging: StagingArea::new(), _dir: dir }
    }

    fn spk() -> ScriptPublicKey {
        ScriptPublicKey::new(0, vec![0x51])
    }

    fn coinbase(tag: u8, value: u64) -> Transaction {
        Transaction::new_coinbase(vec![TransactionOutput::new(value, spk())], vec![tag])
    }

    fn spend(from: TransactionOutpoint, value: u64) -> Transaction {
        Transaction::new(vec![TransactionInput::new(from, vec![], 0)], vec![TransactionOutput::new(value, spk())], 0, vec![])
    }

    fn ghostdag_data(selected_parent: Hash, blues: &[Hash], reds: &[Hash]) -> GhostdagData {
        let mut data = GhostdagData::new_with_selected_parent(selected_parent, 18);
        for &blue in blues.iter().skip(1) {
            data.add_blue(blue, 0, &Default::default());
        }
        for &red in reds {
            data.add_red(red);
        }
        data
    }

    #[test]
    fn test_red_coinbase_is_skipped_and_spends_apply() {
        let mut f = fixture(0);
        let funding = TransactionOutpoint::new(h(99), 0);
        let mut base = UtxoCollection::new();
        base.insert(funding, UtxoEntry::new(100, spk(), 1, false));

        let blue_txs = vec![coinbase(1, 50), spend(funding, 90)];
        let red_txs = vec![coinbase(2, 50), spend(funding, 80)];
        f.store.insert(&mut f.staging, h(1), Arc::new(blue_txs.clone())).unwrap();
        f.store.insert(&mut f.staging, h(2), Arc::new(red_txs.clone())).unwrap();

        let data = ghostdag_data(h(1), &[h(1)], &[h(2)]);
        let acceptance = f.manager.calc_mergeset_acceptance(&f.staging, &data, 10, 0, &base).unwrap();

        assert_eq!(acceptance.acceptance_data.len(), 2);
        assert_eq!(acceptance.acceptance_data[0].accepted_transactions, vec![blue_txs[0].id(), blue_txs[1].id()]);
        // The red double spend loses to the blue spend, the red coinbase is never accepted
        assert!(acceptance.acceptance_data[1].accepted_transactions.is_empty());

        let diff = &acceptance.utxo_diff;
        assert!(diff.remove.contains_key(&funding));
        let coinbase_entry = &diff.add[&blue_txs[0].outpoint(0)];
        assert!(coinbase_entry.is_coinbase);
        assert_eq!(coinbase_entry.block_daa_score, 10);
        assert_eq!(diff.add[&blue_txs[1].outpoint(0)].amount, 90);
    }

    #[test]
    fn test_chained_spends_within_mergeset() {
        let mut f = fixture(0);
        let funding = TransactionOutpoint::new(h(99), 0);
        let mut base = UtxoCollection::new();
        base.insert(funding, UtxoEntry::new(100, spk(), 1, false));

        let first = spend(funding, 90);
        let second = spend(first.outpoint(0), 80);
        f.store.insert(&mut f.staging, h(1), Arc::new(vec![coinbase(1, 1), first.clone()])).unwrap();
        f.store.insert(&mut f.staging, h(2), Arc::new(vec![coinbase(2, 1), second.clone()])).unwrap();

        let data = ghostdag_data(h(1), &[h(1), h(2)], &[]);
        let acceptance = f.manager.calc_mergeset_acceptance(&f.staging, &data, 10, 0, &base).unwrap();
        assert_eq!(acceptance.accepted_tx_ids().len(), 4);
        // The intermediate output is created and spent inside the same diff
        assert!(!acceptance.utxo_diff.add.contains_key(&first.outpoint(0)));
        assert!(acceptance.utxo_diff.add.contains_key(&second.outpoint(0)));
    }

    #[test]
    fn test_immature_coinbase_spend_and_missing_body() {
        let mut f = fixture(100);
        let matured = TransactionOutpoint::new(h(98), 0);
        let mut base = UtxoCollection::new();
        base.insert(matured, UtxoEntry::new(100, spk(), 5, true));

        let tx = spend(matured, 50);
        f.store.insert(&mut f.staging, h(1), Arc::new(vec![coinbase(1, 1), tx.clone()])).unwrap();

        // h(2) is merged but its body is unknown
        let data = ghostdag_data(h(1), &[h(1), h(2)], &[]);
        let acceptance = f.manager.calc_mergeset_acceptance(&f.staging, &data, 50, 0, &base).unwrap();
        assert_eq!(acceptance.acceptance_data.len(), 2);
        assert!(!acceptance.acceptance_data[0].accepted_transactions.contains(&tx.id()));
        assert!(acceptance.acceptance_data[1].accepted_transactions.is_empty());

        let acceptance = f.manager.calc_mergeset_acceptance(&f.staging, &data, 105, 0, &base).unwrap();
        assert!(acceptance.acceptance_data[0].accepted_transactions.contains(&tx.id()));
    }
}

//! Block transaction processing
//!
//! Validates a block's transaction list as a unit and, only when every
//! rule holds, derives the next UTXO set. A rejected block leaves the
//! caller's set exactly as it was.

use crate::core::transaction::{Transaction, COINBASE_AMOUNT};
use crate::core::utxo::UtxoSet;
use crate::core::validation::{report, validate_coinbase, validate_transaction, ValidationError};
use std::collections::HashSet;
use thiserror::Error;

// =============================================================================
// Configuration
// =============================================================================

/// How the in-block double-spend guard keys transaction inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateInputKey {
    /// Two inputs collide when they name the same transaction, whatever
    /// output they spend. This also rejects blocks spending two different
    /// outputs of one transaction.
    #[default]
    TxOutId,
    /// Two inputs collide only when they spend the same output
    OutPoint,
}

/// Consensus rules applied when processing blocks
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Required amount of every coinbase output
    pub coinbase_amount: u64,
    /// Key used by the duplicate-input guard
    pub duplicate_input_key: DuplicateInputKey,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            coinbase_amount: COINBASE_AMOUNT,
            duplicate_input_key: DuplicateInputKey::TxOutId,
        }
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// A block whose transactions failed validation, with every reason found
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "Block {block_index} rejected with {} violation(s){}",
    .errors.len(),
    format_violations(.errors)
)]
pub struct BlockRejection {
    pub block_index: u64,
    pub errors: Vec<ValidationError>,
}

fn format_violations(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|error| format!("\n  - {}", error))
        .collect()
}

// =============================================================================
// Block Processor
// =============================================================================

/// Validates block transactions and computes UTXO transitions
#[derive(Debug, Clone, Default)]
pub struct BlockProcessor {
    config: LedgerConfig,
}

impl BlockProcessor {
    /// Create a processor with the default rules
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Validate every transaction of the block at `block_index`.
    ///
    /// Rules are checked in order: the coinbase at position 0, the
    /// duplicate-input guard across all inputs, then every other
    /// transaction against `utxos`. All violations are collected.
    ///
    /// Output addresses are not checked here; [`validate_structure`]
    /// runs at pool admission and wallet construction instead.
    ///
    /// [`validate_structure`]: crate::core::validate_structure
    pub fn validate(
        &self,
        transactions: &[Transaction],
        utxos: &UtxoSet,
        block_index: u64,
    ) -> Result<(), BlockRejection> {
        let mut errors = Vec::new();

        match transactions.first() {
            Some(coinbase) => {
                if let Err(found) =
                    validate_coinbase(coinbase, block_index, self.config.coinbase_amount)
                {
                    errors.extend(found);
                }
            }
            None => report(&mut errors, ValidationError::MissingCoinbase),
        }

        self.check_duplicate_inputs(transactions, &mut errors);

        for tx in transactions.iter().skip(1) {
            if let Err(found) = validate_transaction(tx, utxos) {
                errors.extend(found);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(BlockRejection {
                block_index,
                errors,
            })
        }
    }

    /// Validate the block and return the UTXO set that follows it
    pub fn process(
        &self,
        transactions: &[Transaction],
        utxos: &UtxoSet,
        block_index: u64,
    ) -> Result<UtxoSet, BlockRejection> {
        self.validate(transactions, utxos, block_index)?;

        let next = utxos.apply(transactions);
        log::info!(
            "Block {} accepted: {} transaction(s), {} -> {} unspent outputs",
            block_index,
            transactions.len(),
            utxos.len(),
            next.len()
        );
        Ok(next)
    }

    fn check_duplicate_inputs(
        &self,
        transactions: &[Transaction],
        errors: &mut Vec<ValidationError>,
    ) {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();

        for tx_in in transactions.iter().flat_map(|tx| tx.tx_ins.iter()) {
            let key = match self.config.duplicate_input_key {
                DuplicateInputKey::TxOutId => tx_in.tx_out_id.clone(),
                DuplicateInputKey::OutPoint => tx_in.outpoint().to_string(),
            };
            if !seen.insert(key.clone()) && reported.insert(key.clone()) {
                report(errors, ValidationError::DuplicateInput { key });
            }
        }
    }
}

/// Process a block with the default rules.
///
/// Returns the next UTXO set, or `None` when the block must be rejected.
/// The reasons are logged; use [`BlockProcessor::process`] to inspect them.
pub fn process_transactions(
    transactions: &[Transaction],
    utxos: &UtxoSet,
    block_index: u64,
) -> Option<UtxoSet> {
    BlockProcessor::new()
        .process(transactions, utxos, block_index)
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::{TxIn, TxOut};
    use crate::core::utxo::UnspentTxOut;
    use crate::crypto::KeyPair;

    struct Fixture {
        alice: KeyPair,
        bob: KeyPair,
        miner: KeyPair,
        utxos: UtxoSet,
    }

    impl Fixture {
        fn new() -> Self {
            let alice = KeyPair::generate();
            let utxos = vec![
                UnspentTxOut::new("T1", 0, &alice.address(), 50),
                UnspentTxOut::new("T1", 1, &alice.address(), 10),
                UnspentTxOut::new("T2", 0, &alice.address(), 5),
            ]
            .into_iter()
            .collect();
            Self {
                alice,
                bob: KeyPair::generate(),
                miner: KeyPair::generate(),
                utxos,
            }
        }

        fn pay_bob(&self, tx_out_id: &str, tx_out_index: u64, amount: u64) -> Transaction {
            let mut tx = Transaction::new(
                vec![TxIn::new(tx_out_id, tx_out_index)],
                vec![TxOut::new(&self.bob.address(), amount)],
            );
            tx.sign_all(&self.alice.private_key_hex(), &self.utxos).unwrap();
            tx
        }

        fn coinbase(&self, block_index: u64) -> Transaction {
            Transaction::coinbase(&self.miner.address(), block_index)
        }
    }

    #[test]
    fn test_utxo_transition() {
        let fx = Fixture::new();
        let spend = fx.pay_bob("T1", 0, 50);
        let coinbase = fx.coinbase(4);

        let next = process_transactions(&[coinbase.clone(), spend.clone()], &fx.utxos, 4).unwrap();

        assert!(next.find("T1", 0).is_none());
        assert_eq!(
            next.find(&spend.id, 0),
            Some(&UnspentTxOut::new(&spend.id, 0, &fx.bob.address(), 50))
        );
        assert_eq!(next.find(&coinbase.id, 0).unwrap().amount, COINBASE_AMOUNT);
        // Untouched outputs survive
        assert!(next.find("T1", 1).is_some());
        assert!(next.find("T2", 0).is_some());
        assert_eq!(next.len(), 4);
    }

    #[test]
    fn test_coinbase_only_block() {
        let fx = Fixture::new();
        let next = process_transactions(&[fx.coinbase(0)], &UtxoSet::new(), 0).unwrap();
        assert_eq!(next.balance(&fx.miner.address()), COINBASE_AMOUNT);
    }

    #[test]
    fn test_empty_block_rejected() {
        let rejection = BlockProcessor::new()
            .process(&[], &UtxoSet::new(), 0)
            .unwrap_err();
        assert_eq!(rejection.errors, vec![ValidationError::MissingCoinbase]);
    }

    #[test]
    fn test_bad_coinbase_rejects_block() {
        let fx = Fixture::new();
        let spend = fx.pay_bob("T1", 0, 50);

        assert!(process_transactions(&[fx.coinbase(3), spend.clone()], &fx.utxos, 4).is_none());
        // A regular transaction cannot stand in for the coinbase
        assert!(process_transactions(&[spend], &fx.utxos, 4).is_none());
    }

    #[test]
    fn test_double_spend_across_transactions() {
        let fx = Fixture::new();
        let first = fx.pay_bob("T1", 0, 50);
        let mut second = Transaction::new(
            vec![TxIn::new("T1", 0)],
            vec![TxOut::new(&fx.alice.address(), 50)],
        );
        second.sign_all(&fx.alice.private_key_hex(), &fx.utxos).unwrap();

        // Each is individually valid
        assert!(validate_transaction(&first, &fx.utxos).is_ok());
        assert!(validate_transaction(&second, &fx.utxos).is_ok());

        let rejection = BlockProcessor::new()
            .process(&[fx.coinbase(1), first, second], &fx.utxos, 1)
            .unwrap_err();
        assert_eq!(
            rejection.errors,
            vec![ValidationError::DuplicateInput {
                key: "T1".to_string()
            }]
        );
    }

    #[test]
    fn test_sibling_outputs_collide_by_default() {
        let fx = Fixture::new();
        let first = fx.pay_bob("T1", 0, 50);
        let second = fx.pay_bob("T1", 1, 10);

        let block = [fx.coinbase(1), first, second];
        assert!(process_transactions(&block, &fx.utxos, 1).is_none());

        let strict = BlockProcessor::with_config(LedgerConfig {
            duplicate_input_key: DuplicateInputKey::OutPoint,
            ..Default::default()
        });
        let next = strict.process(&block, &fx.utxos, 1).unwrap();
        assert!(next.find("T1", 0).is_none());
        assert!(next.find("T1", 1).is_none());
        assert_eq!(next.balance(&fx.bob.address()), 60);
    }

    #[test]
    fn test_coinbase_input_takes_part_in_duplicate_scan() {
        let fx = Fixture::new();
        let utxos: UtxoSet = vec![UnspentTxOut::new("", 5, &fx.alice.address(), 5)]
            .into_iter()
            .collect();
        let mut spend = Transaction::new(
            vec![TxIn::new("", 5)],
            vec![TxOut::new(&fx.bob.address(), 5)],
        );
        spend.sign_all(&fx.alice.private_key_hex(), &utxos).unwrap();
        assert!(validate_transaction(&spend, &utxos).is_ok());

        let rejection = BlockProcessor::new()
            .process(&[fx.coinbase(1), spend], &utxos, 1)
            .unwrap_err();
        assert_eq!(
            rejection.errors,
            vec![ValidationError::DuplicateInput { key: String::new() }]
        );
    }

    #[test]
    fn test_rejection_message_lists_violations() {
        let rejection = BlockProcessor::new()
            .process(&[], &UtxoSet::new(), 7)
            .unwrap_err();
        assert_eq!(
            rejection.to_string(),
            "Block 7 rejected with 1 violation(s)\n  - Block has no coinbase transaction"
        );
    }

    #[test]
    fn test_outpoint_key_still_catches_double_spend() {
        let fx = Fixture::new();
        let block = [fx.coinbase(1), fx.pay_bob("T1", 0, 50), fx.pay_bob("T1", 0, 50)];
        let strict = BlockProcessor::with_config(LedgerConfig {
            duplicate_input_key: DuplicateInputKey::OutPoint,
            ..Default::default()
        });

        let rejection = strict.process(&block, &fx.utxos, 1).unwrap_err();
        assert_eq!(
            rejection.errors,
            vec![ValidationError::DuplicateInput {
                key: "T1:0".to_string()
            }]
        );
    }

    #[test]
    fn test_invalid_transaction_rejects_block() {
        let fx = Fixture::new();
        let good = fx.pay_bob("T1", 0, 50);
        let unbalanced = fx.pay_bob("T2", 0, 6);

        let rejection = BlockProcessor::new()
            .process(&[fx.coinbase(2), good, unbalanced.clone()], &fx.utxos, 2)
            .unwrap_err();
        assert_eq!(
            rejection.errors,
            vec![ValidationError::ValueMismatch {
                tx_id: unbalanced.id,
                inputs: 5,
                outputs: 6,
            }]
        );
    }

    #[test]
    fn test_rejection_collects_all_reasons_in_order() {
        let fx = Fixture::new();
        let unbalanced = fx.pay_bob("T2", 0, 6);
        let block = [fx.coinbase(0), unbalanced.clone(), unbalanced];

        let rejection = BlockProcessor::new()
            .process(&block, &fx.utxos, 9)
            .unwrap_err();
        assert_eq!(rejection.block_index, 9);
        assert!(matches!(
            rejection.errors[0],
            ValidationError::CoinbaseHeight { expected: 9, found: 0, .. }
        ));
        assert!(matches!(rejection.errors[1], ValidationError::DuplicateInput { .. }));
        assert!(matches!(rejection.errors[2], ValidationError::ValueMismatch { .. }));
        assert_eq!(rejection.errors.len(), 4);
    }

    #[test]
    fn test_custom_reward() {
        let fx = Fixture::new();
        let processor = BlockProcessor::with_config(LedgerConfig {
            coinbase_amount: 25,
            ..Default::default()
        });
        let coinbase = Transaction::coinbase_with_amount(&fx.miner.address(), 0, 25);

        assert!(processor.process(&[coinbase], &UtxoSet::new(), 0).is_ok());
        assert!(processor
            .process(&[fx.coinbase(0)], &UtxoSet::new(), 0)
            .is_err());
    }

    #[test]
    fn test_spending_an_output_created_in_the_same_block_is_rejected() {
        let fx = Fixture::new();
        let coinbase = fx.coinbase(1);
        let spend_new = Transaction::new(
            vec![TxIn::new(&coinbase.id, 0)],
            vec![TxOut::new(&fx.bob.address(), COINBASE_AMOUNT)],
        );

        assert!(process_transactions(&[coinbase, spend_new], &fx.utxos, 1).is_none());
    }
}

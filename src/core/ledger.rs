//! Ledger state holder
//!
//! Owns the authoritative UTXO set and the height of the next block.
//! Applying a block takes `&mut self`, so blocks are applied one at a time;
//! a node sharing the ledger between tasks puts it behind a lock and holds
//! the lock for the whole call.

use crate::core::processor::{BlockProcessor, BlockRejection, LedgerConfig};
use crate::core::transaction::Transaction;
use crate::core::utxo::UtxoSet;
use thiserror::Error;

/// Ledger-related errors
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{0}")]
    Rejected(#[from] BlockRejection),
}

/// Confirmed ledger state: the unspent outputs after every accepted block
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    utxos: UtxoSet,
    /// Number of accepted blocks, which is also the next block's index
    height: u64,
    processor: BlockProcessor,
}

impl Ledger {
    /// Create an empty ledger awaiting its genesis block
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty ledger with custom consensus rules
    pub fn with_config(config: LedgerConfig) -> Self {
        Self {
            utxos: UtxoSet::new(),
            height: 0,
            processor: BlockProcessor::with_config(config),
        }
    }

    /// Current unspent outputs
    pub fn utxos(&self) -> &UtxoSet {
        &self.utxos
    }

    /// Index the next accepted block must carry
    pub fn next_block_index(&self) -> u64 {
        self.height
    }

    pub fn config(&self) -> &LedgerConfig {
        self.processor.config()
    }

    /// Build the reward transaction for the next block
    pub fn coinbase_for(&self, address: &str) -> Transaction {
        Transaction::coinbase_with_amount(
            address,
            self.next_block_index(),
            self.config().coinbase_amount,
        )
    }

    /// Validate `transactions` as the next block and, if accepted, replace
    /// the UTXO set. On rejection the ledger is unchanged.
    pub fn apply_block(&mut self, transactions: &[Transaction]) -> Result<&UtxoSet, LedgerError> {
        let next = self
            .processor
            .process(transactions, &self.utxos, self.height)?;

        self.utxos = next;
        self.height += 1;
        Ok(&self.utxos)
    }

    /// Spendable balance of `address`
    pub fn balance(&self, address: &str) -> u64 {
        self.utxos.balance(address)
    }
}

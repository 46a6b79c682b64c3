//! Transaction pool (mempool) for pending transactions
//!
//! A transaction is admitted only if it is valid against the confirmed
//! UTXO set, its outputs are well-formed, and none of its inputs is already
//! claimed by another pooled transaction.

use crate::core::validation::{report, validate_structure, validate_transaction};
use crate::core::{OutPoint, Transaction, UtxoSet, ValidationError};
use std::collections::HashSet;
use thiserror::Error;

// =============================================================================
// Configuration
// =============================================================================

/// Default maximum mempool transaction count
pub const DEFAULT_MEMPOOL_SIZE: usize = 10_000;

// =============================================================================
// Error Types
// =============================================================================

/// Mempool errors
#[derive(Error, Debug)]
pub enum MempoolError {
    #[error("Transaction {0} already exists")]
    DuplicateTransaction(String),
    #[error("Transaction {tx_id} rejected with {} violation(s)", .errors.len())]
    InvalidTransaction {
        tx_id: String,
        errors: Vec<ValidationError>,
    },
    #[error("Mempool full")]
    MempoolFull,
}

// =============================================================================
// Mempool
// =============================================================================

/// Memory pool for pending transactions, in arrival order
#[derive(Debug)]
pub struct Mempool {
    transactions: Vec<Transaction>,
    /// Outpoints consumed by pooled transactions
    claimed: HashSet<OutPoint>,
    max_size: usize,
}

impl Mempool {
    /// Create a new mempool
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MEMPOOL_SIZE)
    }

    /// Create a mempool holding at most `max_size` transactions
    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            transactions: Vec::new(),
            claimed: HashSet::new(),
            max_size,
        }
    }

    /// Admit a transaction spending outputs of `utxos`
    pub fn add(&mut self, tx: Transaction, utxos: &UtxoSet) -> Result<(), MempoolError> {
        if self.transactions.iter().any(|pooled| pooled.id == tx.id) {
            return Err(MempoolError::DuplicateTransaction(tx.id));
        }

        if self.transactions.len() >= self.max_size {
            return Err(MempoolError::MempoolFull);
        }

        let mut errors = Vec::new();
        if let Err(found) = validate_transaction(&tx, utxos) {
            errors.extend(found);
        }
        if let Err(found) = validate_structure(&tx) {
            errors.extend(found);
        }
        for outpoint in tx.outpoints() {
            if self.claimed.contains(&outpoint) {
                report(
                    &mut errors,
                    ValidationError::PoolConflict {
                        tx_id: tx.id.clone(),
                        outpoint: outpoint.to_string(),
                    },
                );
            }
        }

        if !errors.is_empty() {
            return Err(MempoolError::InvalidTransaction {
                tx_id: tx.id,
                errors,
            });
        }

        log::info!("Added transaction {} to pool", tx.id);
        self.claimed.extend(tx.outpoints());
        self.transactions.push(tx);
        Ok(())
    }

    /// Drop transactions whose inputs are no longer unspent, typically
    /// because a block consumed them. Returns how many were removed.
    pub fn update(&mut self, utxos: &UtxoSet) -> usize {
        let before = self.transactions.len();

        self.transactions.retain(|tx| {
            let still_spendable = tx.outpoints().all(|outpoint| utxos.contains(&outpoint));
            if !still_spendable {
                log::info!("Removing transaction {} from pool", tx.id);
            }
            still_spendable
        });
        self.rebuild_claimed();

        before - self.transactions.len()
    }

    /// Remove transactions by id (e.g. after they were put in a block)
    pub fn remove_transactions(&mut self, tx_ids: &[String]) {
        self.transactions.retain(|tx| !tx_ids.contains(&tx.id));
        self.rebuild_claimed();
    }

    /// Whether a pooled transaction already spends `outpoint`
    pub fn is_claimed(&self, outpoint: &OutPoint) -> bool {
        self.claimed.contains(outpoint)
    }

    /// Pending transactions in arrival order
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Up to `limit` transactions for the next block
    pub fn get_transactions(&self, limit: usize) -> Vec<Transaction> {
        self.transactions.iter().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    fn rebuild_claimed(&mut self) {
        self.claimed = self
            .transactions
            .iter()
            .flat_map(|tx| tx.outpoints())
            .collect();
    }
}

impl Default for Mempool {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Unspent transaction output set
//!
//! The set is an owned value: lookups borrow it, block application builds
//! a fresh set and leaves the original untouched.

use crate::core::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

// =============================================================================
// OutPoint
// =============================================================================

/// UTXO identifier - creating transaction id + output index
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutPoint {
    pub tx_out_id: String,
    pub tx_out_index: u64,
}

impl OutPoint {
    pub fn new(tx_out_id: &str, tx_out_index: u64) -> Self {
        Self {
            tx_out_id: tx_out_id.to_string(),
            tx_out_index,
        }
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.tx_out_id, self.tx_out_index)
    }
}

// =============================================================================
// Unspent Output
// =============================================================================

/// A currently spendable output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentTxOut {
    pub tx_out_id: String,
    pub tx_out_index: u64,
    pub address: String,
    pub amount: u64,
}

impl UnspentTxOut {
    pub fn new(tx_out_id: &str, tx_out_index: u64, address: &str, amount: u64) -> Self {
        Self {
            tx_out_id: tx_out_id.to_string(),
            tx_out_index,
            address: address.to_string(),
            amount,
        }
    }

    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(&self.tx_out_id, self.tx_out_index)
    }
}

// =============================================================================
// UTXO Set
// =============================================================================

/// The unspent outputs of the confirmed ledger, keyed by outpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoSet {
    entries: BTreeMap<OutPoint, UnspentTxOut>,
}

impl UtxoSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the output at `tx_out_id:tx_out_index`.
    ///
    /// `None` means the output never existed or has already been spent.
    pub fn find(&self, tx_out_id: &str, tx_out_index: u64) -> Option<&UnspentTxOut> {
        let utxo = self.entries.get(&OutPoint::new(tx_out_id, tx_out_index));
        if utxo.is_none() {
            log::debug!("No unspent output at {}:{}", tx_out_id, tx_out_index);
        }
        utxo
    }

    /// Whether the outpoint is unspent
    pub fn contains(&self, outpoint: &OutPoint) -> bool {
        self.entries.contains_key(outpoint)
    }

    /// Add an output, replacing any entry with the same key
    pub fn insert(&mut self, utxo: UnspentTxOut) {
        self.entries.insert(utxo.outpoint(), utxo);
    }

    /// Iterate over entries in outpoint order
    pub fn iter(&self) -> impl Iterator<Item = &UnspentTxOut> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Outputs locked to `address`
    pub fn for_address(&self, address: &str) -> Vec<&UnspentTxOut> {
        self.iter().filter(|utxo| utxo.address == address).collect()
    }

    /// Spendable balance of `address`
    pub fn balance(&self, address: &str) -> u64 {
        self.for_address(address)
            .iter()
            .map(|utxo| utxo.amount)
            .sum()
    }

    /// Sum of every unspent amount
    pub fn total_amount(&self) -> u64 {
        self.iter().map(|utxo| utxo.amount).sum()
    }

    /// Build the set that results from accepting `transactions`.
    ///
    /// Consumed outpoints are dropped and every output of every transaction
    /// is added. No validation happens here; callers validate first.
    pub fn apply(&self, transactions: &[Transaction]) -> UtxoSet {
        let consumed: HashSet<OutPoint> = transactions
            .iter()
            .flat_map(|tx| tx.outpoints())
            .collect();

        let mut entries: BTreeMap<OutPoint, UnspentTxOut> = self
            .entries
            .iter()
            .filter(|(outpoint, _)| !consumed.contains(*outpoint))
            .map(|(outpoint, utxo)| (outpoint.clone(), utxo.clone()))
            .collect();

        for tx in transactions {
            for (index, tx_out) in tx.tx_outs.iter().enumerate() {
                let utxo = UnspentTxOut::new(&tx.id, index as u64, &tx_out.address, tx_out.amount);
                entries.insert(utxo.outpoint(), utxo);
            }
        }

        UtxoSet { entries }
    }
}

impl FromIterator<UnspentTxOut> for UtxoSet {
    fn from_iter<I: IntoIterator<Item = UnspentTxOut>>(iter: I) -> Self {
        let mut set = UtxoSet::new();
        for utxo in iter {
            set.insert(utxo);
        }
        set
    }
}

// =============================================================================
// Tests
// =============================================================================

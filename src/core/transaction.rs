//! Transaction handling for the ledger
//!
//! Implements a content-addressed UTXO transaction model:
//! - A transaction's id is the SHA-256 of its input references and outputs
//! - Inputs carry no amount; value is resolved through the UTXO they spend
//! - Every input is authorized by a signature over the whole transaction id

use crate::core::utxo::{OutPoint, UtxoSet};
use crate::crypto::{sha256_hex, KeyError, KeyPair};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Amount minted by the coinbase transaction of every block
pub const COINBASE_AMOUNT: u64 = 50;

// =============================================================================
// Error Types
// =============================================================================

/// Failures while signing a transaction input.
///
/// These indicate misuse by the caller (wrong key, stale UTXO set), so they
/// abort the signing action instead of producing a signature.
#[derive(Error, Debug)]
pub enum SigningError {
    #[error("Input index {index} out of range: transaction has {count} inputs")]
    InputOutOfRange { index: usize, count: usize },
    #[error("Referenced output {tx_out_id}:{tx_out_index} is not in the UTXO set")]
    MissingUtxo { tx_out_id: String, tx_out_index: u64 },
    #[error("Signing key address {actual} does not own output locked to {expected}")]
    KeyMismatch { expected: String, actual: String },
    #[error("Key error: {0}")]
    Key(#[from] KeyError),
}

// =============================================================================
// Transaction Input
// =============================================================================

/// Transaction input (reference to a previous output)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TxIn {
    /// Id of the transaction that created the spent output
    pub tx_out_id: String,
    /// Position of the spent output. For a coinbase input this carries the
    /// block height instead.
    pub tx_out_index: u64,
    /// Hex DER signature over the spending transaction's id
    pub signature: String,
}

impl TxIn {
    /// Create an unsigned input spending `tx_out_id:tx_out_index`
    pub fn new(tx_out_id: &str, tx_out_index: u64) -> Self {
        Self {
            tx_out_id: tx_out_id.to_string(),
            tx_out_index,
            signature: String::new(),
        }
    }

    /// The UTXO key this input consumes
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(&self.tx_out_id, self.tx_out_index)
    }
}

// =============================================================================
// Transaction Output
// =============================================================================

/// Transaction output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TxOut {
    /// Recipient's address (uncompressed public key, hex)
    pub address: String,
    /// Amount in the smallest currency unit
    pub amount: u64,
}

impl TxOut {
    pub fn new(address: &str, amount: u64) -> Self {
        Self {
            address: address.to_string(),
            amount,
        }
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A ledger transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    /// Content hash of the inputs and outputs
    pub id: String,
    pub tx_ins: Vec<TxIn>,
    pub tx_outs: Vec<TxOut>,
}

/// Compute the content hash identifying a transaction.
///
/// The hashed string is every input's `tx_out_id` and `tx_out_index`,
/// followed by every output's `address` and `amount`. Signatures are
/// excluded so that signing does not change the id.
pub fn transaction_id(tx_ins: &[TxIn], tx_outs: &[TxOut]) -> String {
    let tx_in_content: String = tx_ins
        .iter()
        .map(|tx_in| format!("{}{}", tx_in.tx_out_id, tx_in.tx_out_index))
        .collect();
    let tx_out_content: String = tx_outs
        .iter()
        .map(|tx_out| format!("{}{}", tx_out.address, tx_out.amount))
        .collect();

    sha256_hex(format!("{}{}", tx_in_content, tx_out_content).as_bytes())
}

impl Transaction {
    /// Create a new (unsigned) transaction with its id computed
    pub fn new(tx_ins: Vec<TxIn>, tx_outs: Vec<TxOut>) -> Self {
        let id = transaction_id(&tx_ins, &tx_outs);
        Self {
            id,
            tx_ins,
            tx_outs,
        }
    }

    /// Create the reward transaction for the block at `block_index`
    pub fn coinbase(address: &str, block_index: u64) -> Self {
        Self::coinbase_with_amount(address, block_index, COINBASE_AMOUNT)
    }

    /// Create a reward transaction paying a custom amount
    pub fn coinbase_with_amount(address: &str, block_index: u64, amount: u64) -> Self {
        // Coinbase input references nothing; its index slot holds the height
        let tx_in = TxIn::new("", block_index);
        Self::new(vec![tx_in], vec![TxOut::new(address, amount)])
    }

    /// Recompute the id from the current inputs and outputs
    pub fn calculate_id(&self) -> String {
        transaction_id(&self.tx_ins, &self.tx_outs)
    }

    /// Whether the stored id matches the content
    pub fn has_valid_id(&self) -> bool {
        self.id == self.calculate_id()
    }

    /// Sum of output amounts, or `None` on overflow
    pub fn total_output(&self) -> Option<u64> {
        self.tx_outs
            .iter()
            .try_fold(0u64, |total, tx_out| total.checked_add(tx_out.amount))
    }

    /// Keys of every output this transaction consumes
    pub fn outpoints(&self) -> impl Iterator<Item = OutPoint> + '_ {
        self.tx_ins.iter().map(TxIn::outpoint)
    }

    /// Sign every input with one key
    pub fn sign_all(&mut self, private_key: &str, utxos: &UtxoSet) -> Result<(), SigningError> {
        for index in 0..self.tx_ins.len() {
            let signature = sign_tx_in(self, index, private_key, utxos)?;
            self.tx_ins[index].signature = signature;
        }
        Ok(())
    }
}

// =============================================================================
// Signing
// =============================================================================

/// Produce the signature authorizing input `tx_in_index` of `tx`.
///
/// The signed message is the transaction id, so every input of a
/// transaction signs the same payload.
pub fn sign_tx_in(
    tx: &Transaction,
    tx_in_index: usize,
    private_key: &str,
    utxos: &UtxoSet,
) -> Result<String, SigningError> {
    let tx_in = tx
        .tx_ins
        .get(tx_in_index)
        .ok_or(SigningError::InputOutOfRange {
            index: tx_in_index,
            count: tx.tx_ins.len(),
        })?;

    let referenced = utxos
        .find(&tx_in.tx_out_id, tx_in.tx_out_index)
        .ok_or_else(|| SigningError::MissingUtxo {
            tx_out_id: tx_in.tx_out_id.clone(),
            tx_out_index: tx_in.tx_out_index,
        })?;

    let key_pair = KeyPair::from_private_key_hex(private_key)?;
    let address = key_pair.address();
    if address != referenced.address {
        return Err(SigningError::KeyMismatch {
            expected: referenced.address.clone(),
            actual: address,
        });
    }

    Ok(key_pair.sign(&tx.id)?)
}

// =============================================================================
// Tests
// =============================================================================

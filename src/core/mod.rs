//! Core ledger components
//!
//! This module contains the fundamental building blocks:
//! - Transactions (content-addressed ids, coinbase construction, signing)
//! - The UTXO set and its block-by-block transitions
//! - Transaction and coinbase validation with per-rule diagnostics
//! - Block transaction processing (double-spend guard, atomic commit)
//! - The ledger state holder that owns the authoritative UTXO set

pub mod address;
pub mod ledger;
pub mod processor;
pub mod transaction;
pub mod utxo;
pub mod validation;

pub use address::{is_valid_address, ADDRESS_LENGTH, ADDRESS_PREFIX};
pub use ledger::{Ledger, LedgerError};
pub use processor::{
    process_transactions, BlockProcessor, BlockRejection, DuplicateInputKey, LedgerConfig,
};
pub use transaction::{
    sign_tx_in, transaction_id, SigningError, Transaction, TxIn, TxOut, COINBASE_AMOUNT,
};
pub use utxo::{OutPoint, UnspentTxOut, UtxoSet};
pub use validation::{
    is_valid_coinbase_transaction, is_valid_transaction, validate_coinbase, validate_structure,
    validate_transaction, ValidationError, ValidationResult,
};

//! Transaction validation
//!
//! Validators never stop at the first problem. Every violated rule becomes
//! one [`ValidationError`] naming the offending transaction or input, and
//! each one is logged as it is found.

use crate::core::address::is_valid_address;
use crate::core::transaction::{Transaction, COINBASE_AMOUNT};
use crate::core::utxo::UtxoSet;
use crate::crypto::verify;
use thiserror::Error;

/// A single violated validation rule
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Transaction {stored}: id does not match content (computed {computed})")]
    IdMismatch { stored: String, computed: String },
    #[error("Transaction {tx_id} input {input}: output {tx_out_id}:{tx_out_index} is not unspent")]
    MissingUtxo {
        tx_id: String,
        input: usize,
        tx_out_id: String,
        tx_out_index: u64,
    },
    #[error("Transaction {tx_id} input {input}: invalid signature for address {address}")]
    InvalidSignature {
        tx_id: String,
        input: usize,
        address: String,
    },
    #[error("Transaction {tx_id}: inputs total {inputs} but outputs total {outputs}")]
    ValueMismatch {
        tx_id: String,
        inputs: u64,
        outputs: u64,
    },
    #[error("Transaction {tx_id}: amount total overflows")]
    AmountOverflow { tx_id: String },
    #[error("Transaction {tx_id} output {output}: invalid address {address}")]
    InvalidAddress {
        tx_id: String,
        output: usize,
        address: String,
    },
    #[error("Block has no coinbase transaction")]
    MissingCoinbase,
    #[error("Coinbase {tx_id}: expected exactly one input, got {count}")]
    CoinbaseInputCount { tx_id: String, count: usize },
    #[error("Coinbase {tx_id}: input index {found} does not match block height {expected}")]
    CoinbaseHeight {
        tx_id: String,
        expected: u64,
        found: u64,
    },
    #[error("Coinbase {tx_id}: expected exactly one output, got {count}")]
    CoinbaseOutputCount { tx_id: String, count: usize },
    #[error("Coinbase {tx_id}: reward {found} does not match {expected}")]
    CoinbaseAmount {
        tx_id: String,
        expected: u64,
        found: u64,
    },
    #[error("Block spends {key} more than once")]
    DuplicateInput { key: String },
    #[error("Transaction {tx_id}: output {outpoint} is already spent by a pooled transaction")]
    PoolConflict { tx_id: String, outpoint: String },
}

/// Outcome of a validator: `Ok` or every violation found
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Record a violation and emit its diagnostic
pub(crate) fn report(errors: &mut Vec<ValidationError>, error: ValidationError) {
    log::warn!("{}", error);
    errors.push(error);
}

pub(crate) fn finish(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_id(tx: &Transaction, errors: &mut Vec<ValidationError>) {
    let computed = tx.calculate_id();
    if computed != tx.id {
        report(
            errors,
            ValidationError::IdMismatch {
                stored: tx.id.clone(),
                computed,
            },
        );
    }
}

/// Validate a regular (non-coinbase) transaction against the UTXO set.
///
/// Checks the id, resolves and authorizes every input, and requires the
/// input total to equal the output total exactly.
pub fn validate_transaction(tx: &Transaction, utxos: &UtxoSet) -> ValidationResult {
    let mut errors = Vec::new();

    check_id(tx, &mut errors);

    let mut total_in: Option<u64> = Some(0);
    for (input, tx_in) in tx.tx_ins.iter().enumerate() {
        let Some(referenced) = utxos.find(&tx_in.tx_out_id, tx_in.tx_out_index) else {
            report(
                &mut errors,
                ValidationError::MissingUtxo {
                    tx_id: tx.id.clone(),
                    input,
                    tx_out_id: tx_in.tx_out_id.clone(),
                    tx_out_index: tx_in.tx_out_index,
                },
            );
            total_in = None;
            continue;
        };

        if !verify(&referenced.address, &tx.id, &tx_in.signature) {
            report(
                &mut errors,
                ValidationError::InvalidSignature {
                    tx_id: tx.id.clone(),
                    input,
                    address: referenced.address.clone(),
                },
            );
        }

        total_in = match total_in {
            Some(total) => match total.checked_add(referenced.amount) {
                Some(sum) => Some(sum),
                None => {
                    report(
                        &mut errors,
                        ValidationError::AmountOverflow {
                            tx_id: tx.id.clone(),
                        },
                    );
                    None
                }
            },
            None => None,
        };
    }

    let total_out = tx.total_output();
    if total_out.is_none() {
        report(
            &mut errors,
            ValidationError::AmountOverflow {
                tx_id: tx.id.clone(),
            },
        );
    }

    // Unresolvable inputs are already reported; only compare known totals
    if let (Some(inputs), Some(outputs)) = (total_in, total_out) {
        if inputs != outputs {
            report(
                &mut errors,
                ValidationError::ValueMismatch {
                    tx_id: tx.id.clone(),
                    inputs,
                    outputs,
                },
            );
        }
    }

    finish(errors)
}

/// Boolean form of [`validate_transaction`]
pub fn is_valid_transaction(tx: &Transaction, utxos: &UtxoSet) -> bool {
    validate_transaction(tx, utxos).is_ok()
}

/// Validate the reward transaction of the block at `block_index`.
///
/// The single input's index field must carry the block height and the
/// single output must pay exactly `coinbase_amount`.
pub fn validate_coinbase(
    tx: &Transaction,
    block_index: u64,
    coinbase_amount: u64,
) -> ValidationResult {
    let mut errors = Vec::new();

    check_id(tx, &mut errors);

    if tx.tx_ins.len() != 1 {
        report(
            &mut errors,
            ValidationError::CoinbaseInputCount {
                tx_id: tx.id.clone(),
                count: tx.tx_ins.len(),
            },
        );
    } else if tx.tx_ins[0].tx_out_index != block_index {
        report(
            &mut errors,
            ValidationError::CoinbaseHeight {
                tx_id: tx.id.clone(),
                expected: block_index,
                found: tx.tx_ins[0].tx_out_index,
            },
        );
    }

    if tx.tx_outs.len() != 1 {
        report(
            &mut errors,
            ValidationError::CoinbaseOutputCount {
                tx_id: tx.id.clone(),
                count: tx.tx_outs.len(),
            },
        );
    } else if tx.tx_outs[0].amount != coinbase_amount {
        report(
            &mut errors,
            ValidationError::CoinbaseAmount {
                tx_id: tx.id.clone(),
                expected: coinbase_amount,
                found: tx.tx_outs[0].amount,
            },
        );
    }

    finish(errors)
}

/// Boolean form of [`validate_coinbase`] with the standard reward
pub fn is_valid_coinbase_transaction(tx: &Transaction, block_index: u64) -> bool {
    validate_coinbase(tx, block_index, COINBASE_AMOUNT).is_ok()
}

/// Syntactic checks that need no ledger state: every output address must
/// be a well-formed public key.
pub fn validate_structure(tx: &Transaction) -> ValidationResult {
    let mut errors = Vec::new();

    for (output, tx_out) in tx.tx_outs.iter().enumerate() {
        if !is_valid_address(&tx_out.address) {
            report(
                &mut errors,
                ValidationError::InvalidAddress {
                    tx_id: tx.id.clone(),
                    output,
                    address: tx_out.address.clone(),
                },
            );
        }
    }

    finish(errors)
}

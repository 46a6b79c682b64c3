//! UTXO Ledger: transaction validation and unspent-output maintenance
//!
//! This crate provides the consensus core of a minimal cryptocurrency:
//! - Content-addressed transactions signed with ECDSA (secp256k1)
//! - An owned UTXO set, replaced as a whole when a block is accepted
//! - Transaction and coinbase validation reporting every violated rule
//! - Block processing with an in-block double-spend guard
//! - A transaction pool and a wallet that builds signed transfers
//!
//! # Example
//!
//! ```rust
//! use utxo_ledger::core::Ledger;
//! use utxo_ledger::mempool::Mempool;
//! use utxo_ledger::wallet::Wallet;
//!
//! let mut ledger = Ledger::new();
//! let alice = Wallet::new();
//! let bob = Wallet::new();
//!
//! // Genesis block pays the reward to alice
//! let coinbase = ledger.coinbase_for(&alice.address());
//! ledger.apply_block(&[coinbase]).unwrap();
//!
//! // alice pays bob in the next block
//! let tx = alice
//!     .create_transaction(&bob.address(), 20, ledger.utxos(), &Mempool::new())
//!     .unwrap();
//! let coinbase = ledger.coinbase_for(&alice.address());
//! ledger.apply_block(&[coinbase, tx]).unwrap();
//!
//! assert_eq!(ledger.balance(&bob.address()), 20);
//! ```

pub mod cli;
pub mod core;
pub mod crypto;
pub mod mempool;
pub mod wallet;

// Re-export commonly used types
pub use self::core::{
    is_valid_address, is_valid_coinbase_transaction, is_valid_transaction, process_transactions,
    sign_tx_in, BlockProcessor, BlockRejection, Ledger, LedgerConfig, Transaction, TxIn, TxOut,
    UnspentTxOut, UtxoSet, ValidationError, COINBASE_AMOUNT,
};
pub use crypto::KeyPair;
pub use mempool::Mempool;
pub use wallet::Wallet;

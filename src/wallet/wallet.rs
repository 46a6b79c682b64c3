//! Wallet implementation for the ledger
//!
//! Holds a key pair and builds signed transactions from the outputs it
//! owns in a UTXO set.

use crate::core::{
    is_valid_address, SigningError, Transaction, TxIn, TxOut, UnspentTxOut, UtxoSet,
};
use crate::crypto::{KeyError, KeyPair};
use crate::mempool::Mempool;
use thiserror::Error;

/// Wallet-related errors
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: u64, need: u64 },
    #[error("Invalid receiver address: {0}")]
    InvalidAddress(String),
    #[error("Signing error: {0}")]
    SigningError(#[from] SigningError),
    #[error("Crypto error: {0}")]
    CryptoError(#[from] KeyError),
}

/// A ledger wallet for managing a key and creating transactions
pub struct Wallet {
    /// The key pair for signing transactions
    key_pair: KeyPair,
    /// Optional label for the wallet
    pub label: Option<String>,
}

impl Wallet {
    /// Create a new wallet with a fresh key pair
    pub fn new() -> Self {
        Self {
            key_pair: KeyPair::generate(),
            label: None,
        }
    }

    /// Create a wallet with a label
    pub fn with_label(label: &str) -> Self {
        Self {
            key_pair: KeyPair::generate(),
            label: Some(label.to_string()),
        }
    }

    /// Import a wallet from a private key
    pub fn from_private_key(private_key_hex: &str) -> Result<Self, WalletError> {
        let key_pair = KeyPair::from_private_key_hex(private_key_hex)?;
        Ok(Self {
            key_pair,
            label: None,
        })
    }

    /// Get the wallet's address
    pub fn address(&self) -> String {
        self.key_pair.address()
    }

    /// Label if set, otherwise a shortened address
    pub fn display_name(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => {
                let address = self.address();
                format!("{}...", address.get(..16).unwrap_or(&address))
            }
        }
    }

    /// Get the wallet's private key (hex)
    /// WARNING: Keep this secret!
    pub fn private_key(&self) -> String {
        self.key_pair.private_key_hex()
    }

    /// Outputs in `utxos` owned by this wallet
    pub fn unspent_outputs<'a>(&self, utxos: &'a UtxoSet) -> Vec<&'a UnspentTxOut> {
        utxos.for_address(&self.address())
    }

    /// Confirmed balance
    pub fn balance(&self, utxos: &UtxoSet) -> u64 {
        utxos.balance(&self.address())
    }

    /// Create a signed transaction paying `amount` to `receiver`.
    ///
    /// Outputs already spent by transactions in `mempool` are skipped.
    /// Owned outputs are taken in order until they cover the amount; any
    /// excess returns to this wallet as change.
    pub fn create_transaction(
        &self,
        receiver: &str,
        amount: u64,
        utxos: &UtxoSet,
        mempool: &Mempool,
    ) -> Result<Transaction, WalletError> {
        if !is_valid_address(receiver) {
            return Err(WalletError::InvalidAddress(receiver.to_string()));
        }

        let available: Vec<&UnspentTxOut> = self
            .unspent_outputs(utxos)
            .into_iter()
            .filter(|utxo| !mempool.is_claimed(&utxo.outpoint()))
            .collect();

        let (selected, selected_amount) = select_outputs(&available, amount)?;

        let tx_ins = selected
            .iter()
            .map(|utxo| TxIn::new(&utxo.tx_out_id, utxo.tx_out_index))
            .collect();

        let mut tx_outs = vec![TxOut::new(receiver, amount)];
        let change = selected_amount - amount;
        if change > 0 {
            tx_outs.push(TxOut::new(&self.address(), change));
        }

        let mut tx = Transaction::new(tx_ins, tx_outs);
        tx.sign_all(&self.private_key(), utxos)?;

        log::debug!(
            "Created transaction {} spending {} output(s)",
            tx.id,
            selected.len()
        );
        Ok(tx)
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

/// Take outputs in order until `amount` is covered
fn select_outputs<'a>(
    available: &[&'a UnspentTxOut],
    amount: u64,
) -> Result<(Vec<&'a UnspentTxOut>, u64), WalletError> {
    let mut selected = Vec::new();
    let mut selected_amount = 0u64;

    for utxo in available {
        selected.push(*utxo);
        selected_amount = selected_amount.saturating_add(utxo.amount);

        if selected_amount >= amount {
            return Ok((selected, selected_amount));
        }
    }

    Err(WalletError::InsufficientFunds {
        have: selected_amount,
        need: amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::is_valid_transaction;

    fn funded(wallet: &Wallet, amounts: &[u64]) -> UtxoSet {
        amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| {
                UnspentTxOut::new(&format!("T{}", i), 0, &wallet.address(), *amount)
            })
            .collect()
    }

    #[test]
    fn test_wallet_creation() {
        let wallet = Wallet::new();
        assert_eq!(wallet.address().len(), 130);
        assert!(!wallet.private_key().is_empty());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(Wallet::with_label("savings").display_name(), "savings");

        let wallet = Wallet::new();
        assert_eq!(wallet.display_name(), format!("{}...", &wallet.address()[..16]));
    }

    #[test]
    fn test_wallet_import() {
        let wallet1 = Wallet::with_label("savings");
        let wallet2 = Wallet::from_private_key(&wallet1.private_key()).unwrap();
        assert_eq!(wallet1.address(), wallet2.address());
        assert!(Wallet::from_private_key("xyz").is_err());
    }

    #[test]
    fn test_transaction_creation_with_change() {
        let wallet = Wallet::new();
        let utxos = funded(&wallet, &[30, 30, 30]);
        let receiver = Wallet::new().address();

        let tx = wallet
            .create_transaction(&receiver, 45, &utxos, &Mempool::new())
            .unwrap();

        assert_eq!(tx.tx_ins.len(), 2);
        assert_eq!(tx.tx_outs[0], TxOut::new(&receiver, 45));
        assert_eq!(tx.tx_outs[1], TxOut::new(&wallet.address(), 15));
        assert!(is_valid_transaction(&tx, &utxos));
    }

    #[test]
    fn test_exact_amount_has_no_change() {
        let wallet = Wallet::new();
        let utxos = funded(&wallet, &[50]);
        let tx = wallet
            .create_transaction(&Wallet::new().address(), 50, &utxos, &Mempool::new())
            .unwrap();
        assert_eq!(tx.tx_outs.len(), 1);
    }

    #[test]
    fn test_insufficient_funds() {
        let wallet = Wallet::new();
        let utxos = funded(&wallet, &[10, 20]);

        let result =
            wallet.create_transaction(&Wallet::new().address(), 31, &utxos, &Mempool::new());
        assert!(matches!(
            result,
            Err(WalletError::InsufficientFunds { have: 30, need: 31 })
        ));
    }

    #[test]
    fn test_skips_outputs_claimed_by_pool() {
        let wallet = Wallet::new();
        let utxos = funded(&wallet, &[40, 40]);
        let receiver = Wallet::new().address();
        let mut mempool = Mempool::new();

        let first = wallet
            .create_transaction(&receiver, 40, &utxos, &mempool)
            .unwrap();
        mempool.add(first.clone(), &utxos).unwrap();

        let second = wallet
            .create_transaction(&receiver, 40, &utxos, &mempool)
            .unwrap();
        assert_ne!(first.tx_ins, second.tx_ins);
        mempool.add(second, &utxos).unwrap();

        assert!(wallet
            .create_transaction(&receiver, 1, &utxos, &mempool)
            .is_err());
    }

    #[test]
    fn test_invalid_receiver() {
        let wallet = Wallet::new();
        let utxos = funded(&wallet, &[10]);
        assert!(matches!(
            wallet.create_transaction("04aa", 5, &utxos, &Mempool::new()),
            Err(WalletError::InvalidAddress(_))
        ));
    }
}

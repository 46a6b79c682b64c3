//! CLI commands for the ledger
//!
//! Implements the command handlers for the CLI interface. Everything runs
//! against an in-memory ledger; nothing is persisted.

use crate::core::{is_valid_address, Ledger, LedgerConfig, Transaction};
use crate::crypto::KeyPair;
use crate::mempool::Mempool;
use crate::wallet::Wallet;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Maximum transactions taken from the pool per block
pub const MAX_BLOCK_TXS: usize = 100;

/// Application state
pub struct AppState {
    pub ledger: Ledger,
    pub mempool: Mempool,
}

impl AppState {
    /// Initialize application state with the given consensus rules
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            ledger: Ledger::with_config(config),
            mempool: Mempool::new(),
        }
    }

    /// Apply a block made of a coinbase for `reward_address` plus pooled
    /// transactions, then drop whatever the block spent from the pool.
    pub fn commit_block(&mut self, reward_address: &str) -> CliResult<Transaction> {
        let coinbase = self.ledger.coinbase_for(reward_address);
        let mut transactions = vec![coinbase.clone()];
        transactions.extend(self.mempool.get_transactions(MAX_BLOCK_TXS));

        let index = self.ledger.next_block_index();
        self.ledger.apply_block(&transactions)?;
        self.mempool.update(self.ledger.utxos());

        println!(
            "   Block {} accepted ({} transaction(s))",
            index,
            transactions.len()
        );
        Ok(coinbase)
    }
}

/// Generate a key pair
pub fn cmd_keygen() -> CliResult<()> {
    let key_pair = KeyPair::generate();

    println!("🔐 New key pair generated!");
    println!("   📍 Address: {}", key_pair.address());
    println!("   🔑 Private key: {}", key_pair.private_key_hex());
    println!("\n   ⚠️  IMPORTANT: Keep the private key secret!");

    Ok(())
}

/// Check an address' syntax
pub fn cmd_check_address(address: &str) -> CliResult<()> {
    if is_valid_address(address) {
        println!("✅ Valid address");
    } else {
        println!("❌ Invalid address: expected '04' followed by 128 hex characters");
    }
    Ok(())
}

/// Run an in-memory ledger through `blocks` reward blocks and one transfer
pub fn cmd_simulate(config: LedgerConfig, blocks: u32, amount: u64) -> CliResult<()> {
    let mut state = AppState::new(config);
    let alice = Wallet::with_label("alice");
    let bob = Wallet::with_label("bob");

    println!("⛓️  Simulating {} reward block(s) for {}", blocks, alice.display_name());
    for _ in 0..blocks {
        state.commit_block(&alice.address())?;
    }
    println!("   {} balance: {}", alice.display_name(), alice.balance(state.ledger.utxos()));

    println!("\n📤 {} sends {} to {}", alice.display_name(), amount, bob.display_name());
    let tx = alice.create_transaction(
        &bob.address(),
        amount,
        state.ledger.utxos(),
        &state.mempool,
    )?;
    println!("   Transaction: {}", tx.id);
    state.mempool.add(tx, state.ledger.utxos())?;

    state.commit_block(&bob.address())?;

    println!("\n💰 Balances");
    for (branch, wallet) in [("├─", &alice), ("└─", &bob)] {
        println!(
            "   {} {}: {}",
            branch,
            wallet.display_name(),
            wallet.balance(state.ledger.utxos())
        );
    }

    print_utxo_set(&state.ledger);
    Ok(())
}

fn print_utxo_set(ledger: &Ledger) {
    let utxos = ledger.utxos();

    println!("\n📋 UTXO set ({} outputs, {} total)", utxos.len(), utxos.total_amount());
    for utxo in utxos.iter() {
        println!(
            "   └─ {}:{} -> {}... = {}",
            short(&utxo.tx_out_id),
            utxo.tx_out_index,
            short(&utxo.address),
            utxo.amount
        );
    }
}

/// First 16 characters of an id or address, or all of it when shorter
fn short(value: &str) -> &str {
    value.get(..16).unwrap_or(value)
}

//! UTXO Ledger CLI Application
//!
//! A command-line interface for exercising the ledger core.

use clap::{Parser, Subcommand};
use utxo_ledger::cli;
use utxo_ledger::core::{DuplicateInputKey, LedgerConfig, COINBASE_AMOUNT};

#[derive(Parser)]
#[command(name = "utxo-ledger")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "Transaction validation and UTXO ledger maintenance", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new key pair
    Keygen,

    /// Check whether an address is well-formed
    CheckAddress {
        /// Address to check
        address: String,
    },

    /// Run an in-memory ledger through reward blocks and a transfer
    Simulate {
        /// Number of reward blocks to mine before the transfer
        #[arg(short, long, default_value = "3")]
        blocks: u32,

        /// Amount to transfer
        #[arg(short, long, default_value = "75")]
        amount: u64,

        /// Coinbase reward per block
        #[arg(long, default_value_t = COINBASE_AMOUNT)]
        reward: u64,

        /// Only flag inputs spending the same output, not the same transaction
        #[arg(long)]
        strict_duplicates: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Keygen => {
            cli::cmd_keygen()?;
        }

        Commands::CheckAddress { address } => {
            cli::cmd_check_address(&address)?;
        }

        Commands::Simulate {
            blocks,
            amount,
            reward,
            strict_duplicates,
        } => {
            let config = LedgerConfig {
                coinbase_amount: reward,
                duplicate_input_key: if strict_duplicates {
                    DuplicateInputKey::OutPoint
                } else {
                    DuplicateInputKey::TxOutId
                },
            };
            cli::cmd_simulate(config, blocks, amount)?;
        }
    }

    Ok(())
}

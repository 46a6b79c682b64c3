//! Command-line interface handlers

pub mod commands;

pub use commands::{cmd_check_address, cmd_keygen, cmd_simulate, AppState, CliResult};

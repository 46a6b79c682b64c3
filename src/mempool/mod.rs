//! Pending transaction pool
//!
//! Holds validated transactions waiting for a block, and keeps them
//! consistent with the confirmed UTXO set as blocks arrive.

pub mod pool;

pub use pool::{Mempool, MempoolError, DEFAULT_MEMPOOL_SIZE};

pub mod block;
pub mod error;
pub mod service;

pub use block::Block;
pub use error::LedgerError;
pub use service::LedgerService;

/// Default Proof-of-Work difficulty (number of leading zero hex digits).
pub const DEFAULT_DIFFICULTY: u32 = 3;

/// Default block subsidy paid to the miner.
pub const DEFAULT_MINING_REWARD: f64 = 50.0;

/// Sender recorded on reward transactions.
pub const SYSTEM_ADDRESS: &str = "SYSTEM";

/// `previous_hash` of the first block in an empty chain.
pub const EMPTY_CHAIN_HASH: &str = "0";

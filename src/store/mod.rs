pub mod memory;

use serde::{Deserialize, Serialize};

use crate::ledger::error::LedgerError;
use crate::ledger::{Block, DEFAULT_DIFFICULTY, DEFAULT_MINING_REWARD};
use crate::transaction::{Transaction, TransactionDraft};

pub use memory::{MemoryChainStore, MemoryMetaStore, MemoryTransactionStore};

/// Singleton, process-wide chain parameters. Created with defaults the
/// first time the metadata store is read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainMeta {
    /// Number of leading zero hex digits required of an accepted block hash.
    pub difficulty: u32,
    pub mining_reward: f64,
    /// Index of the most recently committed block.
    pub latest_index: u64,
}

impl Default for ChainMeta {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: DEFAULT_MINING_REWARD,
            latest_index: 0,
        }
    }
}

/// Durable log of every submitted transaction, pending or committed.
/// Assigns identifiers on save.
pub trait TransactionStore: Send + Sync {
    fn save(&self, draft: TransactionDraft) -> Result<Transaction, LedgerError>;
    fn exists_by_id(&self, id: &str) -> Result<bool, LedgerError>;
}

/// Append-only sequence of committed blocks. Implementations must
/// serialize concurrent appends and keep `all()` sorted by ascending index.
pub trait ChainStore: Send + Sync {
    fn append(&self, block: Block) -> Result<Block, LedgerError>;
    fn latest(&self) -> Result<Option<Block>, LedgerError>;
    fn all(&self) -> Result<Vec<Block>, LedgerError>;
}

/// Chain metadata singleton. `get` yields defaults when no record exists.
pub trait MetaStore: Send + Sync {
    fn get(&self) -> Result<ChainMeta, LedgerError>;
    fn put(&self, meta: &ChainMeta) -> Result<(), LedgerError>;
}

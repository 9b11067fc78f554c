use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use super::{ChainMeta, ChainStore, MetaStore, TransactionStore};
use crate::ledger::Block;
use crate::ledger::error::LedgerError;
use crate::transaction::{Transaction, TransactionDraft};

/// In-memory transaction log keyed by assigned id.
#[derive(Debug, Default)]
pub struct MemoryTransactionStore {
    records: Mutex<HashMap<String, Transaction>>,
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransactionStore for MemoryTransactionStore {
    fn save(&self, draft: TransactionDraft) -> Result<Transaction, LedgerError> {
        let tx = Transaction {
            id: Uuid::new_v4().to_string(),
            sender: draft.sender,
            recipient: draft.recipient,
            amount: draft.amount,
            signature: draft.signature,
        };
        let mut records = self.records.lock().expect("mutex poisoned");
        records.insert(tx.id.clone(), tx.clone());
        Ok(tx)
    }

    fn exists_by_id(&self, id: &str) -> Result<bool, LedgerError> {
        let records = self.records.lock().expect("mutex poisoned");
        Ok(records.contains_key(id))
    }
}

/// In-memory append-only block sequence.
#[derive(Debug, Default)]
pub struct MemoryChainStore {
    blocks: Mutex<Vec<Block>>,
}

impl MemoryChainStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChainStore for MemoryChainStore {
    fn append(&self, block: Block) -> Result<Block, LedgerError> {
        let mut blocks = self.blocks.lock().expect("mutex poisoned");
        let expected = blocks.last().map(|b| b.index + 1).unwrap_or(0);
        if block.index != expected {
            return Err(LedgerError::Storage(format!(
                "out-of-order append: got index {}, expected {}",
                block.index, expected
            )));
        }
        blocks.push(block.clone());
        Ok(block)
    }

    fn latest(&self) -> Result<Option<Block>, LedgerError> {
        let blocks = self.blocks.lock().expect("mutex poisoned");
        Ok(blocks.last().cloned())
    }

    fn all(&self) -> Result<Vec<Block>, LedgerError> {
        // Stored in append order, which is ascending index by construction.
        let blocks = self.blocks.lock().expect("mutex poisoned");
        Ok(blocks.clone())
    }
}

/// In-memory metadata singleton, created with defaults on first read.
#[derive(Debug, Default)]
pub struct MemoryMetaStore {
    meta: Mutex<Option<ChainMeta>>,
}

impl MemoryMetaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(meta: ChainMeta) -> Self {
        Self {
            meta: Mutex::new(Some(meta)),
        }
    }
}

impl MetaStore for MemoryMetaStore {
    fn get(&self) -> Result<ChainMeta, LedgerError> {
        let mut meta = self.meta.lock().expect("mutex poisoned");
        Ok(meta.get_or_insert_with(ChainMeta::default).clone())
    }

    fn put(&self, value: &ChainMeta) -> Result<(), LedgerError> {
        let mut meta = self.meta.lock().expect("mutex poisoned");
        *meta = Some(value.clone());
        Ok(())
    }
}

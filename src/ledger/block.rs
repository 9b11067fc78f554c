use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::LedgerError;
use crate::transaction::Transaction;

/// A single block in the ledger holding an ordered batch of transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: i64, // Unix millis (UTC)
    pub transactions: Vec<Transaction>,
    pub nonce: u64,   // Proof-of-Work nonce
    pub previous_hash: String,
    pub hash: String, // Cached hash of the block
}

impl Block {
    /// Create a candidate block (not mined yet). Call `mine()` to perform PoW.
    pub fn new(index: u64, previous_hash: String, transactions: Vec<Transaction>) -> Self {
        Self {
            index,
            timestamp: Utc::now().timestamp_millis(),
            transactions,
            nonce: 0,
            previous_hash,
            hash: String::new(),
        }
    }

    /// Compute the SHA-256 hash of this block from its fields (excluding the
    /// `hash` field itself), rendered as lowercase hex. Transactions are
    /// serialized as order-preserving JSON so equal sequences always hash
    /// identically; validation depends on that.
    pub fn compute_hash(&self) -> Result<String, LedgerError> {
        let txs_json = serde_json::to_string(&self.transactions)
            .map_err(|e| LedgerError::HashComputation(e.to_string()))?;
        let preimage = format!(
            "{}:{}:{}:{}:{}",
            self.index, self.timestamp, txs_json, self.nonce, self.previous_hash
        );
        let mut hasher = Sha256::new();
        hasher.update(preimage.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }

    /// Perform Proof-of-Work: starting from the current nonce, search for a
    /// hash with `difficulty` leading zero hex digits. Unbounded, blocking
    /// and CPU-bound; expected iterations grow as 16^difficulty. At
    /// difficulty 0 the first attempt is always accepted and the nonce
    /// stays untouched.
    pub fn mine(&mut self, difficulty: u32) -> Result<(), LedgerError> {
        let never = AtomicBool::new(false);
        self.mine_cancellable(difficulty, &never)
    }

    /// Same search, but observes a cooperative cancellation flag between
    /// attempts and bails out with `MiningCancelled` once it is raised.
    pub fn mine_cancellable(
        &mut self,
        difficulty: u32,
        cancel: &AtomicBool,
    ) -> Result<(), LedgerError> {
        let target_prefix = "0".repeat(difficulty as usize);
        loop {
            self.hash = self.compute_hash()?;
            if self.hash.starts_with(&target_prefix) {
                return Ok(());
            }
            if cancel.load(Ordering::Relaxed) {
                return Err(LedgerError::MiningCancelled);
            }
            self.nonce = self.nonce.wrapping_add(1);
        }
    }

    /// Validate that the cached `hash` matches the block's content and
    /// satisfies the PoW difficulty. (Does NOT validate chain linkage.)
    pub fn is_valid(&self, difficulty: u32) -> Result<bool, LedgerError> {
        if self.hash != self.compute_hash()? {
            return Ok(false);
        }
        Ok(self
            .hash
            .chars()
            .take(difficulty as usize)
            .all(|c| c == '0'))
    }
}

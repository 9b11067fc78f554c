use std::sync::Mutex;
use std::sync::atomic::AtomicBool;

use log::{debug, info};

use super::block::Block;
use super::error::LedgerError;
use super::{EMPTY_CHAIN_HASH, SYSTEM_ADDRESS};
use crate::store::{ChainStore, MetaStore, TransactionStore};
use crate::transaction::{Transaction, TransactionDraft};

/// Orchestrates submission, mining, validation and balance queries over the
/// backing stores.
///
/// The pending pool's mutex doubles as the single mutation lock: submitting
/// and mining serialize on it, and mining holds it for the whole nonce
/// search. Anything submitted before the mine acquires the lock is included
/// in the block; anything after waits for the next one. Reads
/// (`chain`, `balance`, `is_valid`) only touch committed state and never
/// take the lock.
pub struct LedgerService {
    transactions: Box<dyn TransactionStore>,
    chain: Box<dyn ChainStore>,
    meta: Box<dyn MetaStore>,
    pending: Mutex<Vec<Transaction>>,
}

impl LedgerService {
    /// Build a service over the given stores, priming the metadata
    /// singleton with defaults when absent.
    pub fn new(
        transactions: Box<dyn TransactionStore>,
        chain: Box<dyn ChainStore>,
        meta: Box<dyn MetaStore>,
    ) -> Result<Self, LedgerError> {
        meta.get()?;
        Ok(Self {
            transactions,
            chain,
            meta,
            pending: Mutex::new(Vec::new()),
        })
    }

    /// Validate and enqueue a transaction. The draft is persisted to the
    /// transaction log to obtain an id, then appended to the pending pool.
    /// Rejected drafts leave no trace anywhere.
    pub fn submit(&self, draft: TransactionDraft) -> Result<Transaction, LedgerError> {
        draft.validate()?;
        let mut pending = self.pending.lock().expect("mutex poisoned");
        let saved = self.transactions.save(draft)?;
        pending.push(saved.clone());
        debug!(
            "accepted tx {} ({} -> {}, {}); pool size {}",
            saved.id,
            saved.sender,
            saved.recipient,
            saved.amount,
            pending.len()
        );
        Ok(saved)
    }

    /// Snapshot copy of the pending pool; later mutations are never
    /// observed through it.
    pub fn list_pending(&self) -> Vec<Transaction> {
        self.pending.lock().expect("mutex poisoned").clone()
    }

    /// Mine all pending transactions into a new block credited to
    /// `miner_address`. Blocks the calling thread for the full nonce search.
    pub fn mine(&self, miner_address: &str) -> Result<Block, LedgerError> {
        let never = AtomicBool::new(false);
        self.mine_cancellable(miner_address, &never)
    }

    /// Same as `mine`, but gives the caller a cooperative cancellation
    /// flag. Cancellation aborts the search before anything is committed;
    /// the reward transaction already logged stays in the pool and rides
    /// along with the next attempt.
    pub fn mine_cancellable(
        &self,
        miner_address: &str,
        cancel: &AtomicBool,
    ) -> Result<Block, LedgerError> {
        if miner_address.trim().is_empty() {
            return Err(LedgerError::InvalidMiner);
        }

        let mut pending = self.pending.lock().expect("mutex poisoned");

        let mut meta = self.meta.get()?;

        // Reward goes through the transaction log like any other tx and
        // lands last in the pool, so it is last in the block.
        let reward = self.transactions.save(TransactionDraft::new(
            SYSTEM_ADDRESS,
            miner_address,
            meta.mining_reward,
        ))?;
        pending.push(reward);

        let snapshot = pending.clone();
        let latest = self.chain.latest()?;
        let previous_hash = latest
            .as_ref()
            .map(|b| b.hash.clone())
            .unwrap_or_else(|| EMPTY_CHAIN_HASH.to_string());
        let next_index = latest.map(|b| b.index + 1).unwrap_or(0);

        let mut block = Block::new(next_index, previous_hash, snapshot);
        block.mine_cancellable(meta.difficulty, cancel)?;

        let committed = self.chain.append(block)?;

        meta.latest_index = committed.index;
        self.meta.put(&meta)?;

        // Cleared only once the append went through; the committed
        // transactions stay in the transaction log.
        pending.clear();

        info!(
            "sealed block #{} (hash={}, nonce={}, txs={})",
            committed.index,
            committed.hash,
            committed.nonce,
            committed.transactions.len()
        );
        Ok(committed)
    }

    /// Full committed chain, ascending by index.
    pub fn chain(&self) -> Result<Vec<Block>, LedgerError> {
        self.chain.all()
    }

    /// Net balance of `address` from committed blocks only; pending
    /// transactions carry no economic weight.
    pub fn balance(&self, address: &str) -> Result<f64, LedgerError> {
        let mut balance = 0.0;
        for block in self.chain.all()? {
            for tx in &block.transactions {
                if tx.recipient == address {
                    balance += tx.amount;
                }
                if tx.sender == address {
                    balance -= tx.amount;
                }
            }
        }
        Ok(balance)
    }

    /// Re-validate the committed chain: every adjacent pair must link by
    /// hash, and every non-first block must carry the digest of its own
    /// fields with the required zero prefix. Uses the chain's current
    /// difficulty for every block; per-block difficulty is not tracked.
    pub fn is_valid(&self) -> Result<bool, LedgerError> {
        let chain = self.chain.all()?;
        if chain.is_empty() {
            return Ok(true);
        }
        let difficulty = self.meta.get()?.difficulty;

        for pair in chain.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);
            if !current.is_valid(difficulty)? {
                return Ok(false);
            }
            if current.previous_hash != previous.hash {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::ledger::{DEFAULT_MINING_REWARD, SYSTEM_ADDRESS};
    use crate::store::{
        ChainMeta, MemoryChainStore, MemoryMetaStore, MemoryTransactionStore,
    };

    /// Low difficulty keeps PoW fast in tests.
    fn service_with_difficulty(difficulty: u32) -> LedgerService {
        LedgerService::new(
            Box::new(MemoryTransactionStore::new()),
            Box::new(MemoryChainStore::new()),
            Box::new(MemoryMetaStore::with(ChainMeta {
                difficulty,
                ..ChainMeta::default()
            })),
        )
        .unwrap()
    }

    fn service() -> LedgerService {
        service_with_difficulty(1)
    }

    #[test]
    fn submitted_tx_appears_in_pending_until_mined() {
        let ledger = service();
        let saved = ledger
            .submit(TransactionDraft::new("alice", "bob", 10.0))
            .unwrap();

        let pending = ledger.list_pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, saved.id);

        ledger.mine("miner").unwrap();
        assert!(ledger.list_pending().is_empty());
    }

    #[test]
    fn invalid_submission_leaves_pool_untouched() {
        let ledger = service();
        assert!(ledger.submit(TransactionDraft::new("", "bob", 10.0)).is_err());
        assert!(ledger
            .submit(TransactionDraft::new("alice", "bob", -1.0))
            .is_err());
        assert!(ledger.list_pending().is_empty());
    }

    #[test]
    fn mined_block_holds_pending_plus_trailing_reward() {
        let ledger = service();
        let a = ledger
            .submit(TransactionDraft::new("alice", "bob", 10.0))
            .unwrap();
        let b = ledger
            .submit(TransactionDraft::new("bob", "carol", 3.0))
            .unwrap();

        let block = ledger.mine("miner").unwrap();

        assert_eq!(block.index, 0);
        assert_eq!(block.previous_hash, "0");
        assert_eq!(block.transactions.len(), 3);
        assert_eq!(block.transactions[0].id, a.id);
        assert_eq!(block.transactions[1].id, b.id);

        let reward = &block.transactions[2];
        assert_eq!(reward.sender, SYSTEM_ADDRESS);
        assert_eq!(reward.recipient, "miner");
        assert_eq!(reward.amount, DEFAULT_MINING_REWARD);

        assert!(ledger.list_pending().is_empty());
    }

    #[test]
    fn blank_miner_rejected_without_side_effects() {
        let ledger = service();
        ledger
            .submit(TransactionDraft::new("alice", "bob", 10.0))
            .unwrap();

        assert!(matches!(
            ledger.mine("   "),
            Err(LedgerError::InvalidMiner)
        ));
        assert_eq!(ledger.list_pending().len(), 1);
        assert!(ledger.chain().unwrap().is_empty());
    }

    #[test]
    fn blocks_link_and_satisfy_difficulty() {
        let difficulty = 2;
        let ledger = service_with_difficulty(difficulty);

        ledger
            .submit(TransactionDraft::new("alice", "bob", 10.0))
            .unwrap();
        let first = ledger.mine("miner").unwrap();
        let second = ledger.mine("miner").unwrap();

        assert!(first.hash.starts_with("00"));
        assert!(second.hash.starts_with("00"));
        assert_eq!(second.index, first.index + 1);
        assert_eq!(second.previous_hash, first.hash);
        assert!(ledger.is_valid().unwrap());
    }

    #[test]
    fn empty_chain_is_valid() {
        assert!(service().is_valid().unwrap());
    }

    #[test]
    fn tampering_with_a_committed_block_is_detected() {
        let ledger = service();
        ledger
            .submit(TransactionDraft::new("alice", "bob", 10.0))
            .unwrap();
        ledger.mine("miner").unwrap();
        ledger.mine("miner").unwrap();

        // Re-run validation against a copy of the chain with one amount
        // flipped, through a fresh service sharing nothing with the first.
        let tampered_chain = MemoryChainStore::new();
        for (i, mut block) in ledger.chain().unwrap().into_iter().enumerate() {
            if i == 1 {
                block.transactions[0].amount = 9999.0;
            }
            tampered_chain.append(block).unwrap();
        }
        let tampered = LedgerService::new(
            Box::new(MemoryTransactionStore::new()),
            Box::new(tampered_chain),
            Box::new(MemoryMetaStore::with(ChainMeta {
                difficulty: 1,
                ..ChainMeta::default()
            })),
        )
        .unwrap();

        assert!(!tampered.is_valid().unwrap());
    }

    #[test]
    fn broken_linkage_is_detected() {
        let ledger = service();
        ledger.mine("miner").unwrap();
        let chain = ledger.chain().unwrap();

        // A fully-mined replacement block that no longer references the
        // real predecessor.
        let mut forged = Block::new(1, "deadbeef".into(), Vec::new());
        forged.mine(1).unwrap();

        let rewritten = MemoryChainStore::new();
        rewritten.append(chain[0].clone()).unwrap();
        rewritten.append(forged).unwrap();

        let suspect = LedgerService::new(
            Box::new(MemoryTransactionStore::new()),
            Box::new(rewritten),
            Box::new(MemoryMetaStore::with(ChainMeta {
                difficulty: 1,
                ..ChainMeta::default()
            })),
        )
        .unwrap();

        assert!(!suspect.is_valid().unwrap());
    }

    #[test]
    fn balance_replays_committed_transactions_only() {
        let ledger = service();
        ledger
            .submit(TransactionDraft::new("A", "B", 10.0))
            .unwrap();

        // Unmined transactions are economically invisible.
        assert_eq!(ledger.balance("B").unwrap(), 0.0);

        ledger.mine("M").unwrap();

        assert_eq!(ledger.balance("B").unwrap(), 10.0);
        assert_eq!(ledger.balance("M").unwrap(), DEFAULT_MINING_REWARD);
        assert_eq!(ledger.balance("A").unwrap(), -10.0);
        assert_eq!(ledger.balance("nobody").unwrap(), 0.0);
    }

    #[test]
    fn reads_are_idempotent() {
        let ledger = service();
        ledger
            .submit(TransactionDraft::new("alice", "bob", 10.0))
            .unwrap();
        ledger.mine("miner").unwrap();

        let chain_a = ledger.chain().unwrap();
        let chain_b = ledger.chain().unwrap();
        assert_eq!(chain_a.len(), chain_b.len());
        assert_eq!(chain_a[0].hash, chain_b[0].hash);
        assert_eq!(
            ledger.balance("bob").unwrap(),
            ledger.balance("bob").unwrap()
        );
    }

    #[test]
    fn pending_snapshot_is_detached_from_the_pool() {
        let ledger = service();
        ledger
            .submit(TransactionDraft::new("alice", "bob", 10.0))
            .unwrap();
        let snapshot = ledger.list_pending();
        ledger
            .submit(TransactionDraft::new("bob", "carol", 1.0))
            .unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(ledger.list_pending().len(), 2);
    }

    #[test]
    fn cancelled_mine_commits_nothing_and_keeps_the_reward_pending() {
        // High difficulty so the pre-raised flag wins before a valid nonce.
        let ledger = service_with_difficulty(16);
        ledger
            .submit(TransactionDraft::new("alice", "bob", 10.0))
            .unwrap();

        let cancel = AtomicBool::new(false);
        cancel.store(true, Ordering::Relaxed);
        let err = ledger.mine_cancellable("miner", &cancel).unwrap_err();
        assert!(matches!(err, LedgerError::MiningCancelled));

        assert!(ledger.chain().unwrap().is_empty());
        // The reward logged before the search stays queued for the retry.
        let pending = ledger.list_pending();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[1].sender, SYSTEM_ADDRESS);
    }

    /// Chain store double whose appends always fail.
    struct BrokenChainStore;

    impl crate::store::ChainStore for BrokenChainStore {
        fn append(&self, _block: Block) -> Result<Block, LedgerError> {
            Err(LedgerError::Storage("append refused".into()))
        }
        fn latest(&self) -> Result<Option<Block>, LedgerError> {
            Ok(None)
        }
        fn all(&self) -> Result<Vec<Block>, LedgerError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn failed_append_leaves_the_pool_for_a_retry() {
        let ledger = LedgerService::new(
            Box::new(MemoryTransactionStore::new()),
            Box::new(BrokenChainStore),
            Box::new(MemoryMetaStore::with(ChainMeta {
                difficulty: 0,
                ..ChainMeta::default()
            })),
        )
        .unwrap();
        ledger
            .submit(TransactionDraft::new("alice", "bob", 10.0))
            .unwrap();

        let err = ledger.mine("miner").unwrap_err();
        assert!(matches!(err, LedgerError::Storage(_)));

        // Original tx plus the stray reward stay pending for the next mine.
        let pending = ledger.list_pending();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].sender, "alice");
        assert_eq!(pending[1].sender, SYSTEM_ADDRESS);
    }
}

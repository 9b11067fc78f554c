/// Failure taxonomy for ledger operations.
///
/// Input errors (`InvalidTransaction`, `InvalidMiner`) are detected before
/// any mutation; storage errors propagate unmodified from the backing
/// stores, and a failed mine is safe to retry because it re-snapshots the
/// pending pool.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Bad sender/recipient/amount on a submitted transaction.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// Blank miner address on a mine request.
    #[error("miner address required")]
    InvalidMiner,

    /// Read or append failure from a persistence collaborator.
    #[error("storage error: {0}")]
    Storage(String),

    /// Block serialization failed while computing a hash. Startup-class:
    /// does not occur with well-formed ledger data.
    #[error("failed to compute block hash: {0}")]
    HashComputation(String),

    /// A cooperative cancellation flag was raised mid nonce search.
    #[error("mining cancelled before a valid nonce was found")]
    MiningCancelled,
}

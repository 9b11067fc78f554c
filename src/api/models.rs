use actix_web::HttpResponse;
use serde::Serialize;

use crate::ledger::{LedgerError, LedgerService};

/// Shared application state: the ledger service plus its stores.
pub struct AppState {
    pub ledger: LedgerService,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(err: &LedgerError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

/// Map a ledger failure to a response the way the operation contracts
/// expect: input errors are the caller's fault, cancellation is a
/// conflict, storage and hashing failures are operational.
pub fn error_response(err: LedgerError) -> HttpResponse {
    let body = ErrorResponse::new(&err);
    match err {
        LedgerError::InvalidTransaction(_) | LedgerError::InvalidMiner => {
            HttpResponse::BadRequest().json(body)
        }
        LedgerError::MiningCancelled => HttpResponse::Conflict().json(body),
        LedgerError::Storage(_) | LedgerError::HashComputation(_) => {
            HttpResponse::InternalServerError().json(body)
        }
    }
}

/* ---------- Chain API models ---------- */

#[derive(Serialize)]
pub struct ChainResponse {
    pub length: usize,
    pub chain: Vec<crate::ledger::Block>,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
}

#[derive(serde::Deserialize)]
pub struct MineRequest {
    pub miner_address: String,
}

/* ---------- TX API models ---------- */

#[derive(Serialize)]
pub struct PendingResponse {
    pub size: usize,
    pub transactions: Vec<crate::transaction::Transaction>,
}

/* ---------- Balance API models ---------- */

#[derive(Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: f64,
}

use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, warn};

use super::models::{AppState, PendingResponse, error_response};
use crate::transaction::TransactionDraft;

/// Submit a new transaction into the pending pool.
#[post("/transactions/")]
pub async fn post_transaction(
    state: web::Data<AppState>,
    body: web::Json<TransactionDraft>,
) -> impl Responder {
    let draft = body.into_inner();
    debug!(
        "POST /transactions/ - {} -> {} ({})",
        draft.sender, draft.recipient, draft.amount
    );

    match state.ledger.submit(draft) {
        Ok(saved) => HttpResponse::Ok().json(saved),
        Err(err) => {
            warn!("POST /transactions/ - rejected: {err}");
            error_response(err)
        }
    }
}

/// List the pending pool (snapshot copy).
#[get("/pending/")]
pub async fn get_pending(state: web::Data<AppState>) -> impl Responder {
    let transactions = state.ledger.list_pending();
    HttpResponse::Ok().json(PendingResponse {
        size: transactions.len(),
        transactions,
    })
}

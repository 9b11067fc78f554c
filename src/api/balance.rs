use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, BalanceResponse, error_response};

/// Net balance of an address, derived by replaying the committed chain.
#[get("/balance/{address}/")]
pub async fn get_balance(state: web::Data<AppState>, path: web::Path<(String,)>) -> impl Responder {
    let address = path.into_inner().0;
    match state.ledger.balance(&address) {
        Ok(balance) => HttpResponse::Ok().json(BalanceResponse { address, balance }),
        Err(err) => error_response(err),
    }
}

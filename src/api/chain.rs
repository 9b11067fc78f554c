use actix_web::{HttpResponse, Responder, get, post, web};
use log::{info, warn};

use super::models::{
    AppState, ChainResponse, MineRequest, ValidateResponse, error_response,
};

/// Get the full committed chain, ascending by index.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    match state.ledger.chain() {
        Ok(chain) => HttpResponse::Ok().json(ChainResponse {
            length: chain.len(),
            chain,
        }),
        Err(err) => error_response(err),
    }
}

/// Re-validate the whole committed chain.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let length = match state.ledger.chain() {
        Ok(chain) => chain.len(),
        Err(err) => return error_response(err),
    };
    match state.ledger.is_valid() {
        Ok(valid) => HttpResponse::Ok().json(ValidateResponse { valid, length }),
        Err(err) => error_response(err),
    }
}

/// Mine all pending transactions into a new block. Blocks the worker for
/// the full Proof-of-Work search.
#[post("/mine/")]
pub async fn mine_block(state: web::Data<AppState>, req: web::Json<MineRequest>) -> impl Responder {
    match state.ledger.mine(req.miner_address.trim()) {
        Ok(block) => {
            info!(
                "POST /mine/ - sealed block #{} (hash={}, nonce={})",
                block.index, block.hash, block.nonce
            );
            HttpResponse::Ok().json(block)
        }
        Err(err) => {
            warn!("POST /mine/ - failed: {err}");
            error_response(err)
        }
    }
}

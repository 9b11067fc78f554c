use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use std::env;

use blockledger::api::{self, AppState};
use blockledger::ledger::LedgerService;
use blockledger::store::{MemoryChainStore, MemoryMetaStore, MemoryTransactionStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080);

    let ledger = LedgerService::new(
        Box::new(MemoryTransactionStore::new()),
        Box::new(MemoryChainStore::new()),
        Box::new(MemoryMetaStore::new()),
    )
    .map_err(|e| std::io::Error::other(e.to_string()))?;

    println!("⛓️ Starting ledger API at http://{host}:{port}");

    let state = web::Data::new(AppState { ledger });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}

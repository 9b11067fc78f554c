pub mod api;
pub mod ledger;
pub mod store;
pub mod transaction;

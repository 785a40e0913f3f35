pub mod bidding;
pub mod client;
pub mod config;
pub mod countdown;
pub mod database;
pub mod error;
pub mod genai;
pub mod handlers;
pub mod ledger;
pub mod presentation;
pub mod provider;
pub mod query;
pub mod server;
pub mod store;

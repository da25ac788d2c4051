pub mod auth;
pub mod catalog;
pub mod classifier;
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod health;
pub mod jobs;
pub mod ledger;
pub mod metrics;
pub mod payments;
pub mod pipeline;
pub mod provider;
pub mod rate_limit;
pub mod routes;
pub mod server;
pub mod shutdown;
pub mod storage;
pub mod test_utils;

pub use config::Config;
pub use server::Server;

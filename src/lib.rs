//! Dex API Library
//!
//! Read-only HTTP API serving decentralized-exchange market data (liquidity
//! pools, swap transactions, token holders, price ticks) from a PostgreSQL
//! database populated by an external indexer.

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod models;

pub use config::Config;
pub use error::ApiError;

pub mod app;
pub mod cli;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod issue;
pub mod rollup;
pub mod services;
pub mod sources;
pub mod testing;

pub use app::{app, AppState};

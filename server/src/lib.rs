pub mod config;
pub mod domain;
pub mod handlers;
pub mod infra;
pub mod models;
pub mod routes;
pub mod state;
pub mod utils;

//! HTTP API for stock movements: store, routing, and request/response mapping.

pub mod app;
pub mod config;
pub mod middleware;
pub mod store;

//! `cokins-client`
//!
//! **Responsibility:** the stock reconciliation workflow as seen by an operator.
//!
//! This crate provides:
//! - The backend store interface (`StockMovementApi`) and its HTTP implementation
//! - The reconciliation submitter (comment update, then one bulk write)
//! - `ReconciliationSession`, which wires movements, counts, and the
//!   explanation sequencer together
//!
//! The backend stays the authority; the session only holds unsaved counts.

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod notice;
pub mod session;
pub mod submitter;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiError, ReconcileAck, StockMovementApi};
pub use config::{ClientConfig, ConfigError};
pub use error::ReconcileError;
pub use http::HttpStockMovementApi;
pub use notice::{Notice, NoticeLevel};
pub use session::{Outcome, ReconciliationSession};
pub use submitter::{Explanation, ReconciliationSubmitter, SubmitReceipt};

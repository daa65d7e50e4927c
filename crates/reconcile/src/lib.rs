//! Reconciliation domain module.
//!
//! This crate contains the decision logic for comparing per-SKU stock between
//! a source-of-truth store and a retailer store, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod decision;
pub mod engine;
pub mod outcome;

pub use decision::{ReconciliationDecision, StockCorrection};
pub use engine::decide;
pub use outcome::{SyncOutcome, SyncSummary};

//! `shopsync-runner` — correction applier, sync orchestrator, and reporting.
//!
//! Drives one full reconciliation pass per retailer: list the target catalog,
//! fetch stock from both stores, decide per SKU, apply the corrections in
//! paced batches, and aggregate the outcomes into a summary for the
//! reporting sink.

pub mod applier;
pub mod orchestrator;
pub mod report;

pub use applier::{ApplierConfig, CorrectionApplier, WriteStrategy};
pub use orchestrator::{PassError, SyncOrchestrator};
pub use report::{LogReporter, ReportSink};

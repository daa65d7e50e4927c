//! Reporting sink boundary.
//!
//! The core hands one summary per retailer per run to a sink; what happens to
//! it (console, email, persistence) is the collaborator's business. The
//! retailer name is attached here by the caller, not inside the core.

use async_trait::async_trait;

use shopsync_reconcile::SyncSummary;

/// Receives the aggregated outcome summary of a reconciliation pass.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn publish(&self, retailer: &str, summary: &SyncSummary);
}

/// Sink that reports through the process log.
pub struct LogReporter;

#[async_trait]
impl ReportSink for LogReporter {
    async fn publish(&self, retailer: &str, summary: &SyncSummary) {
        let duration_secs = summary
            .duration()
            .map(|d| d.num_milliseconds() as f64 / 1_000.0)
            .unwrap_or(0.0);

        tracing::info!(
            retailer,
            pass_id = %summary.pass_id,
            total = summary.total,
            updated = summary.updated,
            no_update_needed = summary.no_update_needed,
            location_mismatches = summary.location_mismatches,
            failed = summary.failed,
            source_missing = summary.source_missing,
            target_missing = summary.target_missing,
            source_no_stock = summary.source_no_stock,
            duration_secs,
            "inventory sync summary"
        );

        for correction in &summary.updated_skus {
            tracing::info!(
                retailer,
                sku = %correction.sku,
                from = correction.from_quantity,
                to = correction.to_quantity,
                "updated"
            );
        }
        for (sku, actual) in &summary.mismatched_skus {
            tracing::warn!(
                retailer,
                sku = %sku,
                actual = actual.as_ref().map(|l| l.as_str()).unwrap_or("<none>"),
                "location mismatch"
            );
        }
        for (sku, reason) in &summary.failed_skus {
            tracing::warn!(retailer, sku = %sku, reason = %reason, "failed");
        }
    }
}

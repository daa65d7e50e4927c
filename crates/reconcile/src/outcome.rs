//! Per-SKU sync outcomes and the per-pass summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shopsync_core::{LocationId, Sku};

use crate::decision::{ReconciliationDecision, StockCorrection};

/// The result for one SKU after the applier has acted (or chosen not to).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncOutcome {
    /// The corrective write succeeded.
    Updated(StockCorrection),
    /// Quantities already matched; nothing was written.
    NoUpdateNeeded { sku: Sku, quantity: i64 },
    /// SKU exists in the target store but not at the authoritative location.
    LocationMismatch {
        sku: Sku,
        expected: LocationId,
        actual: Option<LocationId>,
    },
    /// The write (or the SKU's fetch) failed definitively.
    Failed { sku: Sku, reason: String },
    SourceMissing { sku: Sku },
    TargetMissing { sku: Sku, source_quantity: i64 },
    SourceNoStock { sku: Sku },
}

impl SyncOutcome {
    pub fn sku(&self) -> &Sku {
        match self {
            Self::Updated(correction) => &correction.sku,
            Self::NoUpdateNeeded { sku, .. }
            | Self::LocationMismatch { sku, .. }
            | Self::Failed { sku, .. }
            | Self::SourceMissing { sku }
            | Self::TargetMissing { sku, .. }
            | Self::SourceNoStock { sku } => sku,
        }
    }

    pub fn failed(sku: Sku, reason: impl Into<String>) -> Self {
        Self::Failed {
            sku,
            reason: reason.into(),
        }
    }
}

/// Decisions that require no write pass through as outcomes unchanged.
impl From<ReconciliationDecision> for SyncOutcome {
    fn from(decision: ReconciliationDecision) -> Self {
        match decision {
            ReconciliationDecision::NoActionNeeded { sku, quantity } => {
                Self::NoUpdateNeeded { sku, quantity }
            }
            ReconciliationDecision::LocationMismatch {
                sku,
                expected,
                actual,
            } => Self::LocationMismatch {
                sku,
                expected,
                actual,
            },
            ReconciliationDecision::SourceMissing { sku } => Self::SourceMissing { sku },
            ReconciliationDecision::TargetMissing {
                sku,
                source_quantity,
            } => Self::TargetMissing {
                sku,
                source_quantity,
            },
            ReconciliationDecision::SourceNoStock { sku } => Self::SourceNoStock { sku },
            // An UpdateRequired decision only becomes an outcome through the
            // applier; passing it through unapplied would be a lie.
            ReconciliationDecision::UpdateRequired(correction) => Self::Failed {
                sku: correction.sku,
                reason: "update decision was never applied".to_string(),
            },
        }
    }
}

/// Aggregated result of one reconciliation pass for one retailer.
///
/// Every SKU contributes to exactly one outcome bucket, so the per-kind counts
/// always sum to `total`. Built once per pass, handed to the reporting sink,
/// then discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSummary {
    pub pass_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub total: usize,
    pub updated: usize,
    pub no_update_needed: usize,
    pub location_mismatches: usize,
    pub failed: usize,
    pub source_missing: usize,
    pub target_missing: usize,
    pub source_no_stock: usize,
    /// Full detail lists kept for reporting.
    pub updated_skus: Vec<StockCorrection>,
    pub mismatched_skus: Vec<(Sku, Option<LocationId>)>,
    pub failed_skus: Vec<(Sku, String)>,
}

impl SyncSummary {
    pub fn begin() -> Self {
        Self {
            pass_id: Uuid::now_v7(),
            started_at: Utc::now(),
            finished_at: None,
            total: 0,
            updated: 0,
            no_update_needed: 0,
            location_mismatches: 0,
            failed: 0,
            source_missing: 0,
            target_missing: 0,
            source_no_stock: 0,
            updated_skus: Vec::new(),
            mismatched_skus: Vec::new(),
            failed_skus: Vec::new(),
        }
    }

    /// Fold one outcome into the summary.
    pub fn record(&mut self, outcome: SyncOutcome) {
        self.total += 1;
        match outcome {
            SyncOutcome::Updated(correction) => {
                self.updated += 1;
                self.updated_skus.push(correction);
            }
            SyncOutcome::NoUpdateNeeded { .. } => self.no_update_needed += 1,
            SyncOutcome::LocationMismatch { sku, actual, .. } => {
                self.location_mismatches += 1;
                self.mismatched_skus.push((sku, actual));
            }
            SyncOutcome::Failed { sku, reason } => {
                self.failed += 1;
                self.failed_skus.push((sku, reason));
            }
            SyncOutcome::SourceMissing { .. } => self.source_missing += 1,
            SyncOutcome::TargetMissing { .. } => self.target_missing += 1,
            SyncOutcome::SourceNoStock { .. } => self.source_no_stock += 1,
        }
    }

    /// Mark the pass complete.
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Sum of all per-kind counts; equals `total` by construction.
    pub fn bucket_sum(&self) -> usize {
        self.updated
            + self.no_update_needed
            + self.location_mismatches
            + self.failed
            + self.source_missing
            + self.target_missing
            + self.source_no_stock
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopsync_core::InventoryItemId;

    fn correction(s: &str) -> StockCorrection {
        StockCorrection {
            sku: Sku::from(s),
            inventory_item_id: InventoryItemId::from("gid://shop/InventoryItem/1"),
            location_id: LocationId::from("L_target"),
            from_quantity: 1,
            to_quantity: 2,
        }
    }

    #[test]
    fn every_outcome_lands_in_exactly_one_bucket() {
        let mut summary = SyncSummary::begin();
        let outcomes = vec![
            SyncOutcome::Updated(correction("A")),
            SyncOutcome::NoUpdateNeeded {
                sku: Sku::from("B"),
                quantity: 3,
            },
            SyncOutcome::LocationMismatch {
                sku: Sku::from("C"),
                expected: LocationId::from("L_target"),
                actual: Some(LocationId::from("L_other")),
            },
            SyncOutcome::failed(Sku::from("D"), "boom"),
            SyncOutcome::SourceMissing {
                sku: Sku::from("E"),
            },
            SyncOutcome::TargetMissing {
                sku: Sku::from("F"),
                source_quantity: 9,
            },
            SyncOutcome::SourceNoStock {
                sku: Sku::from("G"),
            },
        ];

        for outcome in outcomes {
            summary.record(outcome);
        }
        summary.finish();

        assert_eq!(summary.total, 7);
        assert_eq!(summary.bucket_sum(), summary.total);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.updated_skus.len(), 1);
        assert_eq!(summary.mismatched_skus.len(), 1);
        assert_eq!(summary.failed_skus.len(), 1);
        assert!(summary.finished_at.is_some());
    }

    #[test]
    fn passthrough_decisions_map_to_matching_outcomes() {
        let decision = ReconciliationDecision::TargetMissing {
            sku: Sku::from("H"),
            source_quantity: 5,
        };
        assert_eq!(
            SyncOutcome::from(decision),
            SyncOutcome::TargetMissing {
                sku: Sku::from("H"),
                source_quantity: 5,
            }
        );
    }
}

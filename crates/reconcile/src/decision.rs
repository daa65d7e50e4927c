//! Reconciliation decisions.

use serde::{Deserialize, Serialize};

use shopsync_core::{InventoryItemId, LocationId, Sku};

/// A corrective write the target store needs: set the variant's available
/// quantity at the authoritative location from `from_quantity` to
/// `to_quantity`.
///
/// The write is expressed as an absolute quantity, so re-applying the same
/// correction converges to the same end state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCorrection {
    pub sku: Sku,
    /// The *target* store's inventory-item id.
    pub inventory_item_id: InventoryItemId,
    /// Always the policy's authoritative location.
    pub location_id: LocationId,
    pub from_quantity: i64,
    pub to_quantity: i64,
}

impl StockCorrection {
    /// The signed change the correction represents, for logging and for the
    /// delta-style mutation shape.
    pub fn delta(&self) -> i64 {
        self.to_quantity - self.from_quantity
    }
}

/// The engine's verdict for one SKU in one pass.
///
/// Exactly one decision is produced per SKU per pass; each case is a pure
/// function of the two stock records (or their absence) and the location
/// policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconciliationDecision {
    /// Source and target quantities already match.
    NoActionNeeded { sku: Sku, quantity: i64 },
    /// Target must be corrected.
    UpdateRequired(StockCorrection),
    /// SKU exists in the target store but not at the policy-designated
    /// location. `actual` is the first other location carrying the SKU, kept
    /// purely for diagnostics; `None` when the target record has no location
    /// entries at all.
    LocationMismatch {
        sku: Sku,
        expected: LocationId,
        actual: Option<LocationId>,
    },
    /// SKU absent from the source store.
    SourceMissing { sku: Sku },
    /// SKU absent from the target store. Carries the source quantity for
    /// reporting.
    TargetMissing { sku: Sku, source_quantity: i64 },
    /// SKU found in source but no location exposes an "available" quantity.
    SourceNoStock { sku: Sku },
}

impl ReconciliationDecision {
    pub fn sku(&self) -> &Sku {
        match self {
            Self::NoActionNeeded { sku, .. }
            | Self::LocationMismatch { sku, .. }
            | Self::SourceMissing { sku }
            | Self::TargetMissing { sku, .. }
            | Self::SourceNoStock { sku } => sku,
            Self::UpdateRequired(correction) => &correction.sku,
        }
    }
}

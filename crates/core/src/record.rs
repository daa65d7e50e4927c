//! Stock snapshots.

use serde::{Deserialize, Serialize};

use crate::id::{InventoryItemId, LocationId, Sku, VariantId};

/// One location's stock entry for a variant.
///
/// `available` is `None` when the remote response did not expose an
/// "available" quantity dimension for this location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLevel {
    pub location_id: LocationId,
    pub available: Option<i64>,
}

impl InventoryLevel {
    pub fn new(location_id: LocationId, available: Option<i64>) -> Self {
        Self {
            location_id,
            available,
        }
    }
}

/// One product variant's inventory snapshot at one remote store.
///
/// Constructed fresh on every reconciliation pass from a live remote read;
/// never cached or persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    pub sku: Sku,
    pub variant_id: VariantId,
    pub inventory_item_id: InventoryItemId,
    /// Ordered list of per-location stock entries.
    pub locations: Vec<InventoryLevel>,
}

impl StockRecord {
    /// First location entry exposing an "available" quantity, if any.
    pub fn first_available(&self) -> Option<(&LocationId, i64)> {
        self.locations
            .iter()
            .find_map(|level| level.available.map(|qty| (&level.location_id, qty)))
    }

    /// Available quantity at a specific location.
    ///
    /// Returns `None` when the location has no entry at all; an entry whose
    /// "available" dimension is missing counts as quantity 0.
    pub fn available_at(&self, location_id: &LocationId) -> Option<i64> {
        self.locations
            .iter()
            .find(|level| &level.location_id == location_id)
            .map(|level| level.available.unwrap_or(0))
    }

    /// First listed location, used only for mismatch diagnostics.
    pub fn first_location(&self) -> Option<&LocationId> {
        self.locations.first().map(|level| &level.location_id)
    }
}

//! Per-retailer location policy.

use serde::{Deserialize, Serialize};

use crate::id::LocationId;

/// States which single location in the target store is authoritative for
/// inventory writes.
///
/// Supplied by retailer configuration. The reconciliation engine never writes
/// to, or reads as authoritative, any other target-store location — even when
/// stock exists there. Source and target stores have unrelated location
/// identifier spaces, so the authoritative location is always configured,
/// never inferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationPolicy {
    pub authoritative_location_id: LocationId,
}

impl LocationPolicy {
    pub fn new(authoritative_location_id: LocationId) -> Self {
        Self {
            authoritative_location_id,
        }
    }
}

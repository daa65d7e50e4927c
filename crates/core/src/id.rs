//! Identifier newtypes.
//!
//! All remote identifiers are opaque strings scoped to a single store. A SKU
//! string is unique within one store's catalog but the same string appears
//! independently in the source and target stores; variant and inventory-item
//! ids must never be compared across stores.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// Stock-keeping unit identifier, unique within one store's catalog.
    Sku
);

string_id!(
    /// Remote location identifier (one physical stock location in one store).
    LocationId
);

string_id!(
    /// Remote product-variant identifier.
    VariantId
);

string_id!(
    /// Remote inventory-item identifier (the write target for stock corrections).
    InventoryItemId
);

impl Sku {
    /// Whether this SKU carries any usable identifier text.
    ///
    /// Remote catalogs routinely contain variants with blank SKUs; those are
    /// skipped during listing rather than reconciled.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

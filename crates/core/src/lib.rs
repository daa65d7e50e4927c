//! `shopsync-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, stock snapshots, and the per-retailer location policy.

pub mod id;
pub mod policy;
pub mod record;

pub use id::{InventoryItemId, LocationId, Sku, VariantId};
pub use policy::LocationPolicy;
pub use record::{InventoryLevel, StockRecord};

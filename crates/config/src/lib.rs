//! `shopsync-config` — retailer and global configuration.
//!
//! Configuration is loaded and fully resolved (including secrets) in one
//! explicit phase before any remote client is constructed; the core never
//! touches environment lookup.

pub mod error;
pub mod global;
pub mod retailer;

pub use error::ConfigError;
pub use global::{GlobalConfig, InventoryTuning, ResolvedStore, StoreEntry, TokenRef};
pub use retailer::{ResolvedRetailer, RetailerConfig, RetailerSettings};

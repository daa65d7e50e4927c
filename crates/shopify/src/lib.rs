//! `shopsync-shopify` — commerce API client wrapper and remote catalog accessor.
//!
//! Talks the platform's GraphQL admin API: cursor-paginated catalog listing,
//! single and batched stock lookups, and the absolute-quantity inventory
//! write. Each store gets its own client instance owning its own pacing
//! state, so concurrent multi-store use never cross-talks.

pub mod catalog;
pub mod gql;
pub mod pace;
pub mod retry;
pub mod transport;

pub use catalog::{BulkStock, CatalogClient, CatalogConfig};
pub use gql::{QuantityChange, UserError};
pub use pace::Pacer;
pub use retry::{with_retry, RetryPolicy};
pub use transport::{GraphqlTransport, HttpTransport, StoreCredentials, TransportError};

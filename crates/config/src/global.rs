//! Global configuration: the source-of-truth store and sync tuning knobs.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Reference to an access token: either the literal value or the name of an
/// environment variable holding it.
///
/// Kept explicit so resolution is a deliberate step, not string sniffing.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TokenRef {
    /// `{ "env": "SHOPSYNC_LGL_TOKEN" }`
    Env { env: String },
    /// `"shpat_..."` (typically injected from secret storage)
    Literal(String),
}

impl TokenRef {
    /// Resolve to the actual token value. Environment lookup happens here and
    /// only here.
    pub fn resolve(&self) -> Result<String, ConfigError> {
        match self {
            Self::Literal(token) => Ok(token.clone()),
            Self::Env { env } => {
                std::env::var(env).map_err(|_| ConfigError::MissingEnvVar { var: env.clone() })
            }
        }
    }
}

/// One store's connection entry as it appears in config files.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreEntry {
    pub domain: String,
    pub api_token: TokenRef,
}

/// A store entry with its secret resolved, ready to hand to a client.
#[derive(Debug, Clone)]
pub struct ResolvedStore {
    pub domain: String,
    pub access_token: String,
}

/// Inventory sync tuning knobs, all with conservative defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InventoryTuning {
    pub batch_size: usize,
    pub delay_between_batches_ms: u64,
    pub max_retries: u32,
    pub requests_per_second: u32,
    pub page_delay_ms: u64,
    pub use_bulk_mutations: bool,
}

impl Default for InventoryTuning {
    fn default() -> Self {
        Self {
            batch_size: 10,
            delay_between_batches_ms: 2_000,
            max_retries: 3,
            requests_per_second: 2,
            page_delay_ms: 500,
            use_bulk_mutations: false,
        }
    }
}

impl InventoryTuning {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.delay_between_batches_ms)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

/// Top-level global configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GlobalConfig {
    pub source_store: StoreEntry,
    #[serde(default)]
    pub inventory: InventoryTuning,
}

impl GlobalConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded global configuration");
        Ok(config)
    }

    /// Resolve the source store's credential.
    pub fn resolve_source(&self) -> Result<ResolvedStore, ConfigError> {
        Ok(ResolvedStore {
            domain: self.source_store.domain.clone(),
            access_token: self.source_store.api_token.resolve()?,
        })
    }
}

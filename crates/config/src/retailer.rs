//! Per-retailer configuration.

use std::path::Path;

use serde::Deserialize;

use shopsync_core::{LocationId, LocationPolicy};

use crate::error::ConfigError;
use crate::global::{ResolvedStore, TokenRef};

/// Feature flags gating a retailer's participation in a run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RetailerSettings {
    pub sync_inventory: bool,
}

/// One retailer's raw configuration entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RetailerConfig {
    pub id: String,
    pub name: String,
    pub domain: String,
    #[serde(default)]
    pub api_token: Option<TokenRef>,
    /// The single target-store location authoritative for inventory writes.
    #[serde(default)]
    pub target_location_id: Option<String>,
    #[serde(default)]
    pub settings: RetailerSettings,
}

/// A retailer with credentials resolved and the location policy validated.
#[derive(Debug, Clone)]
pub struct ResolvedRetailer {
    pub id: String,
    pub name: String,
    pub store: ResolvedStore,
    pub policy: LocationPolicy,
}

impl RetailerConfig {
    /// Load a retailers file (a JSON array of entries).
    pub fn load_all(path: impl AsRef<Path>) -> Result<Vec<Self>, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let retailers: Vec<Self> =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        tracing::debug!(path = %path.display(), count = retailers.len(), "loaded retailers");
        Ok(retailers)
    }

    /// Resolve secrets and validate the pieces a pass cannot run without.
    ///
    /// A failure here is fatal for this retailer only.
    pub fn resolve(&self) -> Result<ResolvedRetailer, ConfigError> {
        let token = self
            .api_token
            .as_ref()
            .ok_or_else(|| ConfigError::MissingToken {
                retailer: self.id.clone(),
            })?
            .resolve()?;

        let location_id = self
            .target_location_id
            .as_ref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingLocation {
                retailer: self.id.clone(),
            })?;

        Ok(ResolvedRetailer {
            id: self.id.clone(),
            name: self.name.clone(),
            store: ResolvedStore {
                domain: self.domain.clone(),
                access_token: token,
            },
            policy: LocationPolicy::new(LocationId::new(location_id.clone())),
        })
    }
}

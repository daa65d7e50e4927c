//! Configuration error model.

use thiserror::Error;

/// A configuration failure.
///
/// Per-retailer errors (missing token, missing location) are fatal for that
/// retailer's pass only; the run continues with the next retailer.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("retailer {retailer}: missing access token")]
    MissingToken { retailer: String },

    #[error("environment variable {var} not set")]
    MissingEnvVar { var: String },

    #[error("retailer {retailer}: missing authoritative location id")]
    MissingLocation { retailer: String },
}

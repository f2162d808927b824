use std::path::PathBuf;

use thiserror::Error;

/// Errors raised around the label engine. Placement passes themselves never
/// fail; these come from loading configuration and label data.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid placement config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),
    #[error("invalid placement config: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, LabelError>;

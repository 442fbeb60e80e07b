//! Error types for the radar services.

use thiserror::Error;

/// Result type alias using RadarError.
pub type RadarResult<T> = Result<T, RadarError>;

/// Primary error type for operations above the binary decoders.
#[derive(Debug, Error)]
pub enum RadarError {
    // === Reference Data Errors ===
    #[error("Unknown radar site: {0}")]
    UnknownSite(String),

    // === Data Errors ===
    #[error("Data not available: {0}")]
    DataNotAvailable(String),

    #[error("Failed to decode radar data: {0}")]
    Decode(String),

    // === Color Table Errors ===
    #[error("Invalid color table: {0}")]
    ColorTable(String),

    #[error("Invalid color '{0}'")]
    InvalidColor(String),

    // === Projection Errors ===
    #[error("Projection failed: {0}")]
    Projection(String),

    // === Configuration Errors ===
    #[error("Invalid configuration: {0}")]
    Config(String),

    // === Infrastructure Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl RadarError {
    /// Whether the error means "nothing to show" rather than a real failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RadarError::DataNotAvailable(_) | RadarError::UnknownSite(_))
    }
}

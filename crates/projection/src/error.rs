//! Projection errors.

use thiserror::Error;

pub type ProjectionResult<T> = Result<T, ProjectionError>;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("Invalid radar location: lat {latitude}, lon {longitude}")]
    InvalidLocation { latitude: f64, longitude: f64 },

    #[error("Invalid coordinate grid: {0}")]
    InvalidGrid(String),
}

//! Geodesic projection of radar gates onto the WGS-84 ellipsoid.

pub mod coordinates;
pub mod error;
pub mod geodesic;

pub use coordinates::CoordinateSet;
pub use error::{ProjectionError, ProjectionResult};

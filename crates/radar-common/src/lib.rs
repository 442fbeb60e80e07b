//! Common types and utilities shared across the radar crates.

pub mod color;
pub mod config;
pub mod error;
pub mod radial;
pub mod site;
pub mod time;

pub use color::Rgba8;
pub use config::RadarConfig;
pub use error::{RadarError, RadarResult};
pub use radial::RadialSize;
pub use site::RadarSite;

//! Per-site radar data management.
//!
//! A [`RadarProductManager`] owns the decoded Level II scans and Level III
//! products of one radar site and answers "best match" queries by moment,
//! elevation and time. Managers are created and owned by a
//! [`RadarProductManagerRegistry`].

pub mod level2_cache;
pub mod level3_cache;
pub mod manager;
pub mod registry;

pub use level2_cache::{elevation_key, Level2Cache, ScanMatch};
pub use level3_cache::Level3Cache;
pub use manager::{
    Level2Data, Level3Data, ManagerCacheStats, ManagerEvent, ManagerSettings, RadarProductManager,
};
pub use registry::RadarProductManagerRegistry;

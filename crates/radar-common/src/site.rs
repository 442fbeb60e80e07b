//! Static WSR-88D site reference data.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use crate::error::{RadarError, RadarResult};

const EMBEDDED_SITES: &str = include_str!("../data/radar_sites.json");

/// A radar site's fixed location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarSite {
    /// ICAO identifier, e.g. "KTLX".
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub state: String,
    /// Degrees north.
    pub latitude: f64,
    /// Degrees east (negative west).
    pub longitude: f64,
    /// Antenna elevation above mean sea level in feet.
    pub elevation_ft: f64,
}

impl RadarSite {
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64, elevation_ft: f64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            state: String::new(),
            latitude,
            longitude,
            elevation_ft,
        }
    }

    /// Elevation in meters.
    pub fn elevation_m(&self) -> f64 {
        self.elevation_ft * 0.3048
    }

    /// Look up a site in the embedded table.
    pub fn get(id: &str) -> Option<Arc<RadarSite>> {
        SiteTable::embedded().get(id)
    }
}

/// Lookup table of radar sites keyed by ICAO id.
#[derive(Debug, Clone, Default)]
pub struct SiteTable {
    sites: HashMap<String, Arc<RadarSite>>,
}

impl SiteTable {
    /// The table compiled into the crate.
    pub fn embedded() -> &'static SiteTable {
        static TABLE: OnceLock<SiteTable> = OnceLock::new();
        TABLE.get_or_init(|| match SiteTable::from_json(EMBEDDED_SITES) {
            Ok(table) => table,
            Err(e) => {
                tracing::error!(error = %e, "Embedded radar site table is invalid");
                SiteTable::default()
            }
        })
    }

    pub fn from_json(json: &str) -> RadarResult<Self> {
        let sites: Vec<RadarSite> = serde_json::from_str(json)?;
        Ok(Self::from_sites(sites))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> RadarResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_sites(sites: impl IntoIterator<Item = RadarSite>) -> Self {
        let sites = sites
            .into_iter()
            .map(|s| (s.id.to_ascii_uppercase(), Arc::new(s)))
            .collect();
        Self { sites }
    }

    /// Find a site by its 4-letter ICAO id, or by the 3-letter id used in
    /// Level III product headers.
    pub fn get(&self, id: &str) -> Option<Arc<RadarSite>> {
        let id = id.trim().to_ascii_uppercase();
        if let Some(site) = self.sites.get(&id) {
            return Some(site.clone());
        }
        if id.len() == 3 {
            return self
                .sites
                .iter()
                .find(|(key, _)| key.len() == 4 && key.ends_with(&id))
                .map(|(_, site)| site.clone());
        }
        None
    }

    pub fn require(&self, id: &str) -> RadarResult<Arc<RadarSite>> {
        self.get(id).ok_or_else(|| RadarError::UnknownSite(id.to_string()))
    }

    pub fn insert(&mut self, site: RadarSite) {
        self.sites.insert(site.id.to_ascii_uppercase(), Arc::new(site));
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Site ids in sorted order.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sites.keys().cloned().collect();
        ids.sort();
        ids
    }
}

//! Owner of the per-site managers.

use radar_common::site::SiteTable;
use radar_common::{RadarConfig, RadarError, RadarResult};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use wsr88d::{Ar2vFile, Level3File};

use crate::manager::{decode_blocking, ManagerSettings, RadarProductManager};

/// Get-or-create access to one [`RadarProductManager`] per site.
pub struct RadarProductManagerRegistry {
    sites: SiteTable,
    settings: ManagerSettings,
    managers: RwLock<HashMap<String, Arc<RadarProductManager>>>,
}

impl RadarProductManagerRegistry {
    /// Registry over the embedded site table.
    pub fn new(settings: ManagerSettings) -> Self {
        Self::with_sites(SiteTable::embedded().clone(), settings)
    }

    pub fn with_sites(sites: SiteTable, settings: ManagerSettings) -> Self {
        Self {
            sites,
            settings,
            managers: RwLock::new(HashMap::new()),
        }
    }

    /// Registry using the configured site table (embedded when unset).
    pub fn from_config(config: &RadarConfig) -> RadarResult<Self> {
        let sites = match &config.site_table {
            Some(path) => SiteTable::from_file(path)?,
            None => SiteTable::embedded().clone(),
        };
        Ok(Self::with_sites(sites, ManagerSettings::from(config)))
    }

    pub fn sites(&self) -> &SiteTable {
        &self.sites
    }

    /// The manager for `site_id`, created on first use.
    pub async fn get_or_create(&self, site_id: &str) -> RadarResult<Arc<RadarProductManager>> {
        let site = self.sites.require(site_id)?;

        if let Some(manager) = self.managers.read().await.get(&site.id) {
            return Ok(Arc::clone(manager));
        }

        let mut managers = self.managers.write().await;
        let manager = managers.entry(site.id.clone()).or_insert_with(|| {
            debug!(site = %site.id, "Creating radar product manager");
            Arc::new(RadarProductManager::new(
                Arc::clone(&site),
                self.settings.clone(),
            ))
        });
        Ok(Arc::clone(manager))
    }

    /// Existing manager for `site_id`, if any.
    pub async fn get(&self, site_id: &str) -> Option<Arc<RadarProductManager>> {
        let site = self.sites.get(site_id)?;
        self.managers.read().await.get(&site.id).cloned()
    }

    /// Remove a manager. Holders of the returned `Arc` keep it alive.
    pub async fn remove(&self, site_id: &str) -> Option<Arc<RadarProductManager>> {
        let site = self.sites.get(site_id)?;
        self.managers.write().await.remove(&site.id)
    }

    pub async fn clear(&self) {
        let mut managers = self.managers.write().await;
        info!(managers = managers.len(), "Clearing radar product managers");
        managers.clear();
    }

    /// Ids of sites with a manager, sorted.
    pub async fn site_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.managers.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Decode an Archive II file and merge it into its site's manager.
    pub async fn load_level2_file(&self, path: impl AsRef<Path>) -> RadarResult<Arc<RadarProductManager>> {
        let path = path.as_ref().to_path_buf();
        let file = decode_blocking(move || Ar2vFile::load_file(&path)).await?;

        let manager = self.get_or_create(file.icao().trim()).await?;
        manager.insert_level2(&file).await;
        Ok(manager)
    }

    /// Decode a Level III product and cache it with its site's manager.
    ///
    /// The site comes from the AWIPS identifier, then the WMO originating
    /// office, then `fallback_site`.
    pub async fn load_level3_file(
        &self,
        path: impl AsRef<Path>,
        fallback_site: Option<&str>,
    ) -> RadarResult<Arc<RadarProductManager>> {
        let path = path.as_ref().to_path_buf();
        let file = decode_blocking(move || Level3File::load_file(&path)).await?;

        let site_id = self
            .level3_site(&file)
            .or_else(|| fallback_site.map(str::to_string))
            .ok_or_else(|| RadarError::UnknownSite("Level III product without a site".into()))?;

        let manager = self.get_or_create(&site_id).await?;
        manager.insert_level3(file).await?;
        Ok(manager)
    }

    fn level3_site(&self, file: &Level3File) -> Option<String> {
        let designator = file
            .wmo_header
            .as_ref()
            .map(|heading| heading.product_designator.as_str());
        [designator, file.icao()]
            .into_iter()
            .flatten()
            .find_map(|id| self.sites.get(id))
            .map(|site| site.id.clone())
    }
}

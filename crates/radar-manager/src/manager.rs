//! Radar product manager: one per site.
//!
//! Decoding runs on blocking workers. Decoded scans are merged into a new
//! [`Level2Cache`] snapshot that replaces the old one under a short write
//! lock, so readers see a load either completely or not at all and keep any
//! `Arc<ElevationScan>` they hold after it is evicted.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use projection::CoordinateSet;
use radar_common::radial::{GATE_EDGE_INTERVAL_M, MAX_DATA_MOMENT_GATES};
use radar_common::{RadarConfig, RadarError, RadarResult, RadarSite, RadialSize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, OnceCell, RwLock};
use tokio::task::{self, JoinHandle};
use tracing::{debug, info, warn};
use wsr88d::rda::ElevationScan;
use wsr88d::{Ar2vFile, DataBlockType, Level3File, Wsr88dResult};

use crate::level2_cache::Level2Cache;
use crate::level3_cache::Level3Cache;

const EVENT_CAPACITY: usize = 16;

/// Notifications sent after a load has been merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerEvent {
    Level2DataLoaded,
    Level3DataLoaded,
}

/// Per-manager limits.
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    /// Level II volumes kept per site; the oldest is evicted first.
    pub max_cached_volumes: usize,
    /// Level III products kept per site.
    pub max_cached_products: usize,
    /// Gates covered by the projected coordinate grid.
    pub range_gates: usize,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            max_cached_volumes: 12,
            max_cached_products: 64,
            range_gates: MAX_DATA_MOMENT_GATES,
        }
    }
}

impl From<&RadarConfig> for ManagerSettings {
    fn from(config: &RadarConfig) -> Self {
        Self {
            max_cached_volumes: config.max_cached_volumes,
            ..Default::default()
        }
    }
}

/// A Level II query result.
#[derive(Debug, Clone)]
pub struct Level2Data {
    pub scan: Arc<ElevationScan>,
    /// Elevation angle of the matched scan (degrees).
    pub elevation: f32,
    pub time: DateTime<Utc>,
    pub coordinates: Arc<CoordinateSet>,
}

/// A Level III query result.
#[derive(Debug, Clone)]
pub struct Level3Data {
    pub file: Arc<Level3File>,
    pub time: DateTime<Utc>,
}

/// Cache counters.
#[derive(Default)]
struct ManagerStats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

/// Snapshot of a manager's cache state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManagerCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub volumes: usize,
    pub scans: usize,
    pub products: usize,
}

impl ManagerCacheStats {
    /// Query hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Decoded data for one radar site.
pub struct RadarProductManager {
    site: Arc<RadarSite>,
    settings: ManagerSettings,
    level2: RwLock<Arc<Level2Cache>>,
    level3: RwLock<Level3Cache>,
    legacy_coordinates: OnceCell<Arc<CoordinateSet>>,
    super_res_coordinates: OnceCell<Arc<CoordinateSet>>,
    events: broadcast::Sender<ManagerEvent>,
    stats: ManagerStats,
}

impl RadarProductManager {
    pub fn new(site: Arc<RadarSite>, settings: ManagerSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            site,
            level3: RwLock::new(Level3Cache::new(settings.max_cached_products)),
            settings,
            level2: RwLock::new(Arc::new(Level2Cache::new())),
            legacy_coordinates: OnceCell::new(),
            super_res_coordinates: OnceCell::new(),
            events,
            stats: ManagerStats::default(),
        }
    }

    pub fn radar_site(&self) -> &Arc<RadarSite> {
        &self.site
    }

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ManagerEvent> {
        self.events.subscribe()
    }

    /// Number of live event subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// Decode an Archive II file in the background and merge its scans.
    ///
    /// Failures are logged and broadcast nothing. The handle resolves to the
    /// number of scans merged.
    pub fn load_level2_data(self: &Arc<Self>, path: impl Into<PathBuf>) -> JoinHandle<RadarResult<usize>> {
        let path = path.into();
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let source = path.display().to_string();
            let decoded = decode_blocking(move || Ar2vFile::load_file(&path)).await;
            manager.finish_level2(&source, decoded).await
        })
    }

    /// Same as [`load_level2_data`](Self::load_level2_data) for an in-memory
    /// archive.
    pub fn load_level2_bytes(self: &Arc<Self>, data: impl Into<Bytes>) -> JoinHandle<RadarResult<usize>> {
        let data = data.into();
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let decoded = decode_blocking(move || Ar2vFile::load_data(&data)).await;
            manager.finish_level2("memory", decoded).await
        })
    }

    async fn finish_level2(&self, source: &str, decoded: RadarResult<Ar2vFile>) -> RadarResult<usize> {
        match decoded {
            Ok(file) => Ok(self.insert_level2(&file).await),
            Err(e) => {
                warn!(site = %self.site.id, source, error = %e, "Failed to load Level II data");
                Err(e)
            }
        }
    }

    /// Merge an already decoded archive. Returns the number of scans merged.
    pub async fn insert_level2(&self, file: &Ar2vFile) -> usize {
        let start = Instant::now();
        if !file.icao().trim().eq_ignore_ascii_case(&self.site.id) {
            warn!(site = %self.site.id, icao = file.icao(), "Archive is from a different site");
        }

        let (merged, evicted, volumes) = {
            let mut guard = self.level2.write().await;
            let mut next = Level2Cache::clone(&guard);
            let merged = next.insert_file(file);
            let evicted = next.evict_to(self.settings.max_cached_volumes);
            let volumes = next.volume_count();
            *guard = Arc::new(next);
            (merged, evicted, volumes)
        };
        self.stats
            .evictions
            .fetch_add(evicted as u64, Ordering::Relaxed);

        if merged == 0 {
            warn!(site = %self.site.id, "Archive contained no elevation scans");
            return 0;
        }

        info!(
            site = %self.site.id,
            scans = merged,
            volumes,
            evicted,
            skipped_radials = file.skipped_radials(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded Level II data"
        );
        // No receivers is not an error
        let _ = self.events.send(ManagerEvent::Level2DataLoaded);
        merged
    }

    /// Scan with `moment` closest to `elevation` and latest at or before
    /// `time`, with the coordinate set for its radial size.
    ///
    /// # Arguments
    /// * `moment` - Moment the scan must carry
    /// * `elevation` - Requested elevation angle (degrees)
    /// * `time` - Upper bound on the scan start time; `None` for the latest
    pub async fn get_level2_data(
        &self,
        moment: DataBlockType,
        elevation: f32,
        time: Option<DateTime<Utc>>,
    ) -> Option<Level2Data> {
        let snapshot = Arc::clone(&*self.level2.read().await);

        let Some(found) = snapshot.find(moment, elevation, time) else {
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            debug!(site = %self.site.id, %moment, elevation, ?time, "No matching scan");
            return None;
        };
        self.stats.hits.fetch_add(1, Ordering::Relaxed);

        let coordinates = match self.coordinates(found.scan.radial_size()).await {
            Ok(coordinates) => coordinates,
            Err(e) => {
                warn!(site = %self.site.id, error = %e, "Failed to compute coordinates");
                return None;
            }
        };

        Some(Level2Data {
            scan: found.scan,
            elevation: found.elevation,
            time: found.time,
            coordinates,
        })
    }

    /// Projected corner grid for `radial_size`, computed once per manager.
    pub async fn coordinates(&self, radial_size: RadialSize) -> RadarResult<Arc<CoordinateSet>> {
        let cell = match radial_size {
            RadialSize::NonSuperResolution => &self.legacy_coordinates,
            RadialSize::ZeroPointFiveDegree => &self.super_res_coordinates,
        };

        cell.get_or_try_init(|| async {
            let start = Instant::now();
            let site = Arc::clone(&self.site);
            let gates = self.settings.range_gates;
            let set = task::spawn_blocking(move || {
                CoordinateSet::compute(
                    site.latitude,
                    site.longitude,
                    radial_size,
                    gates,
                    GATE_EDGE_INTERVAL_M,
                )
            })
            .await
            .map_err(|e| RadarError::Task(e.to_string()))?
            .map_err(|e| RadarError::Projection(e.to_string()))?;

            info!(
                site = %self.site.id,
                ?radial_size,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Computed radar coordinates"
            );
            Ok::<_, RadarError>(Arc::new(set))
        })
        .await
        .map(Arc::clone)
    }

    /// Sorted elevation angles available for `moment` (all scans when
    /// `None`).
    pub async fn elevation_angles(&self, moment: Option<DataBlockType>) -> Vec<f32> {
        self.level2.read().await.elevation_angles(moment)
    }

    /// VCP of the most recent volume.
    pub async fn vcp(&self) -> Option<u16> {
        self.level2.read().await.latest_vcp()
    }

    pub async fn volume_times(&self) -> Vec<DateTime<Utc>> {
        self.level2.read().await.volume_times()
    }

    /// Decode a Level III product in the background and cache it. The handle
    /// resolves to the product code.
    pub fn load_level3_data(self: &Arc<Self>, path: impl Into<PathBuf>) -> JoinHandle<RadarResult<i16>> {
        let path = path.into();
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let source = path.display().to_string();
            let decoded = decode_blocking(move || Level3File::load_file(&path)).await;
            manager.finish_level3(&source, decoded).await
        })
    }

    pub fn load_level3_bytes(self: &Arc<Self>, data: impl Into<Bytes>) -> JoinHandle<RadarResult<i16>> {
        let data = data.into();
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let decoded = decode_blocking(move || Level3File::load_data(&data)).await;
            manager.finish_level3("memory", decoded).await
        })
    }

    async fn finish_level3(&self, source: &str, decoded: RadarResult<Level3File>) -> RadarResult<i16> {
        let result = match decoded {
            Ok(file) => self.insert_level3(file).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            warn!(site = %self.site.id, source, error = %e, "Failed to load Level III data");
        }
        result
    }

    /// Cache an already decoded product, keyed by its volume scan time.
    pub async fn insert_level3(&self, file: Level3File) -> RadarResult<i16> {
        let product_code = file.product_code();
        let time = file
            .volume_scan_time()
            .or_else(|| file.message_header.message_time())
            .ok_or_else(|| {
                RadarError::DataNotAvailable(format!("product {} has no scan time", product_code))
            })?;

        let evicted = self.level3.write().await.insert(time, Arc::new(file));
        if evicted {
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
        }

        info!(site = %self.site.id, product_code, %time, "Loaded Level III data");
        let _ = self.events.send(ManagerEvent::Level3DataLoaded);
        Ok(product_code)
    }

    /// Latest `product_code` product at or before `time`.
    pub async fn get_level3_data(
        &self,
        product_code: i16,
        time: Option<DateTime<Utc>>,
    ) -> Option<Level3Data> {
        // Lookup promotes the entry, so it needs the write lock
        let found = self.level3.write().await.find(product_code, time);
        match found {
            Some((time, file)) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(Level3Data { file, time })
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub async fn level3_products(&self) -> Vec<i16> {
        self.level3.read().await.product_codes()
    }

    /// Drop all cached data. Coordinate sets are kept.
    pub async fn clear(&self) {
        *self.level2.write().await = Arc::new(Level2Cache::new());
        self.level3.write().await.clear();
        info!(site = %self.site.id, "Cleared radar data");
    }

    pub async fn cache_stats(&self) -> ManagerCacheStats {
        let level2 = Arc::clone(&*self.level2.read().await);
        let products = self.level3.read().await.len();
        ManagerCacheStats {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            evictions: self.stats.evictions.load(Ordering::Relaxed),
            volumes: level2.volume_count(),
            scans: level2.scan_count(),
            products,
        }
    }
}

impl std::fmt::Debug for RadarProductManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RadarProductManager")
            .field("site", &self.site.id)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Run a decoder on a blocking worker.
pub(crate) async fn decode_blocking<T, F>(decode: F) -> RadarResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> Wsr88dResult<T> + Send + 'static,
{
    task::spawn_blocking(decode)
        .await
        .map_err(|e| RadarError::Task(e.to_string()))?
        .map_err(|e| RadarError::Decode(e.to_string()))
}

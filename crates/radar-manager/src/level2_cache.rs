//! Level II scan index for one site.
//!
//! Scans are keyed by elevation angle (tenths of a degree) and then by scan
//! start time. Each loaded volume remembers which keys it contributed so it
//! can be evicted as a unit.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use wsr88d::rda::ElevationScan;
use wsr88d::{Ar2vFile, DataBlockType};

/// Elevation angle in tenths of a degree.
pub fn elevation_key(angle: f32) -> i32 {
    (angle * 10.0).round() as i32
}

type ScanKey = (i32, DateTime<Utc>);

#[derive(Debug, Clone)]
struct CachedVolume {
    vcp: Option<u16>,
    scans: Vec<ScanKey>,
}

/// Result of a scan query.
#[derive(Debug, Clone)]
pub struct ScanMatch {
    pub scan: Arc<ElevationScan>,
    /// Elevation angle of the matched scan (degrees).
    pub elevation: f32,
    pub time: DateTime<Utc>,
}

/// Immutable-by-convention snapshot of a site's Level II scans. Updates clone
/// the index, modify the clone and swap it in.
#[derive(Debug, Clone, Default)]
pub struct Level2Cache {
    scans: BTreeMap<i32, BTreeMap<DateTime<Utc>, Arc<ElevationScan>>>,
    volumes: BTreeMap<DateTime<Utc>, CachedVolume>,
}

impl Level2Cache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every scan of a decoded archive. The volume is keyed by its start
    /// time, falling back to the earliest scan; reloading a volume replaces
    /// it. Returns the number of scans indexed.
    pub fn insert_file(&mut self, file: &Ar2vFile) -> usize {
        let volume_time = file.volume_start_time().or_else(|| {
            file.elevation_scans()
                .iter()
                .filter_map(|s| s.start_time())
                .min()
        });
        match volume_time {
            Some(time) => self.insert_volume(time, file.vcp_number(), file.elevation_scans()),
            None => 0,
        }
    }

    /// Add a volume's scans. Scans without a start time take the volume time.
    pub fn insert_volume(
        &mut self,
        volume_time: DateTime<Utc>,
        vcp: Option<u16>,
        scans: &[Arc<ElevationScan>],
    ) -> usize {
        self.remove_volume(volume_time);

        let mut keys = Vec::with_capacity(scans.len());
        for scan in scans.iter().filter(|s| !s.is_empty()) {
            let key = (
                elevation_key(scan.elevation_angle()),
                scan.start_time().unwrap_or(volume_time),
            );
            self.scans
                .entry(key.0)
                .or_default()
                .insert(key.1, Arc::clone(scan));
            keys.push(key);
        }

        let inserted = keys.len();
        if inserted > 0 {
            self.volumes
                .insert(volume_time, CachedVolume { vcp, scans: keys });
        }
        inserted
    }

    /// Drop the oldest volumes until at most `max_volumes` remain. Returns
    /// the number of volumes evicted.
    pub fn evict_to(&mut self, max_volumes: usize) -> usize {
        let mut evicted = 0;
        while self.volumes.len() > max_volumes {
            let Some(oldest) = self.volumes.keys().next().copied() else {
                break;
            };
            self.remove_volume(oldest);
            evicted += 1;
        }
        evicted
    }

    fn remove_volume(&mut self, volume_time: DateTime<Utc>) {
        let Some(volume) = self.volumes.remove(&volume_time) else {
            return;
        };
        for (elevation, time) in volume.scans {
            if let Some(times) = self.scans.get_mut(&elevation) {
                times.remove(&time);
                if times.is_empty() {
                    self.scans.remove(&elevation);
                }
            }
        }
    }

    /// The scan with `moment` whose elevation is closest to `elevation`,
    /// taking at each elevation the latest scan starting at or before
    /// `time` (the latest overall when `time` is `None`). Equally close
    /// elevations resolve to the lower one.
    pub fn find(
        &self,
        moment: DataBlockType,
        elevation: f32,
        time: Option<DateTime<Utc>>,
    ) -> Option<ScanMatch> {
        let mut best: Option<(f32, ScanMatch)> = None;

        for times in self.scans.values() {
            let latest = match time {
                Some(t) => times
                    .range(..=t)
                    .rev()
                    .find(|(_, scan)| scan.has_moment(moment)),
                None => times.iter().rev().find(|(_, scan)| scan.has_moment(moment)),
            };
            let Some((scan_time, scan)) = latest else {
                continue;
            };

            let distance = (scan.elevation_angle() - elevation).abs();
            if best.as_ref().map_or(true, |(d, _)| distance < *d) {
                best = Some((
                    distance,
                    ScanMatch {
                        scan: Arc::clone(scan),
                        elevation: scan.elevation_angle(),
                        time: *scan_time,
                    },
                ));
            }
        }

        best.map(|(_, found)| found)
    }

    /// Sorted distinct elevation angles, optionally only those carrying
    /// `moment`.
    pub fn elevation_angles(&self, moment: Option<DataBlockType>) -> Vec<f32> {
        self.scans
            .values()
            .filter_map(|times| {
                let mut scans = times.values();
                match moment {
                    Some(m) => scans.find(|s| s.has_moment(m)),
                    None => scans.next(),
                }
            })
            .map(|scan| scan.elevation_angle())
            .collect()
    }

    /// VCP of the most recent volume that reported one.
    pub fn latest_vcp(&self) -> Option<u16> {
        self.volumes.values().rev().find_map(|v| v.vcp)
    }

    /// Volume start times, oldest first.
    pub fn volume_times(&self) -> Vec<DateTime<Utc>> {
        self.volumes.keys().copied().collect()
    }

    pub fn scan_count(&self) -> usize {
        self.scans.values().map(|times| times.len()).sum()
    }

    pub fn volume_count(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }
}

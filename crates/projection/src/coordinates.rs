//! Per-site grids of projected gate corners.
//!
//! A sweep is drawn as one quad per gate. Quads share corners with their
//! neighbors, so the corners are computed once per site and radial size as a
//! grid of `radials x (gates + 1)` vertices:
//!
//! - radial edge `k` sits at azimuth `k * width`
//! - range edge `j` sits at `j * 250 m`
//!
//! Radial `k` spans radial edges `k` and `k + 1` (wrapping), so radial 0
//! spans 0 to `width` degrees.

use radar_common::radial::{GATE_EDGE_INTERVAL_M, MAX_DATA_MOMENT_GATES};
use radar_common::{RadarSite, RadialSize};
use rayon::prelude::*;
use std::time::Instant;
use tracing::debug;

use crate::error::{ProjectionError, ProjectionResult};
use crate::geodesic;

/// Projected corner grid for one site and radial size.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateSet {
    pub radial_size: RadialSize,
    pub site_latitude: f64,
    pub site_longitude: f64,
    /// Number of radial edges (equal to the radial count).
    pub radial_edges: usize,
    /// Number of range edges (gates + 1).
    pub range_edges: usize,
    /// Distance between range edges (meters).
    pub range_interval: f64,
    /// (latitude, longitude) pairs, row-major by radial edge.
    vertices: Vec<[f32; 2]>,
}

impl CoordinateSet {
    /// Full-range grid for a site.
    pub fn for_site(site: &RadarSite, radial_size: RadialSize) -> ProjectionResult<Self> {
        Self::compute(
            site.latitude,
            site.longitude,
            radial_size,
            MAX_DATA_MOMENT_GATES,
            GATE_EDGE_INTERVAL_M,
        )
    }

    /// Compute the grid, one radial edge per rayon task.
    ///
    /// # Arguments
    /// * `latitude`, `longitude` - Radar location (degrees)
    /// * `radial_size` - Azimuthal resolution of the sweep
    /// * `gates` - Number of gates; `gates + 1` range edges are produced
    /// * `range_interval` - Distance between range edges (meters)
    pub fn compute(
        latitude: f64,
        longitude: f64,
        radial_size: RadialSize,
        gates: usize,
        range_interval: f64,
    ) -> ProjectionResult<Self> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(ProjectionError::InvalidLocation {
                latitude,
                longitude,
            });
        }
        if gates == 0 || range_interval.is_nan() || range_interval <= 0.0 {
            return Err(ProjectionError::InvalidGrid(format!(
                "{} gates at {} m",
                gates, range_interval
            )));
        }

        let start = Instant::now();
        let radial_edges = radial_size.radial_count();
        let range_edges = gates + 1;
        let width = radial_size.radial_width_degrees();

        let mut vertices = vec![[0.0f32; 2]; radial_edges * range_edges];
        vertices
            .par_chunks_mut(range_edges)
            .enumerate()
            .for_each(|(k, row)| {
                let azimuth = k as f64 * width;
                for (j, vertex) in row.iter_mut().enumerate() {
                    let (lat, lon) =
                        geodesic::direct(latitude, longitude, azimuth, j as f64 * range_interval);
                    *vertex = [lat as f32, lon as f32];
                }
            });

        debug!(
            ?radial_size,
            radial_edges,
            range_edges,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Computed coordinate set"
        );

        Ok(Self {
            radial_size,
            site_latitude: latitude,
            site_longitude: longitude,
            radial_edges,
            range_edges,
            range_interval,
            vertices,
        })
    }

    /// Corner at `radial_edge` (wrapping) and `range_edge`.
    pub fn corner(&self, radial_edge: usize, range_edge: usize) -> Option<[f32; 2]> {
        if range_edge >= self.range_edges {
            return None;
        }
        let k = radial_edge % self.radial_edges;
        self.vertices.get(k * self.range_edges + range_edge).copied()
    }

    /// The four corners of a gate in drawing order: near-left, near-right,
    /// far-right, far-left.
    pub fn gate_polygon(
        &self,
        radial: usize,
        near_edge: usize,
        far_edge: usize,
    ) -> Option<[[f32; 2]; 4]> {
        Some([
            self.corner(radial, near_edge)?,
            self.corner(radial + 1, near_edge)?,
            self.corner(radial + 1, far_edge)?,
            self.corner(radial, far_edge)?,
        ])
    }

    /// Range edge nearest to `range` meters from the radar.
    pub fn range_edge(&self, range: f64) -> usize {
        (range / self.range_interval).round().max(0.0) as usize
    }

    /// Range of the outermost edge (meters).
    pub fn max_range(&self) -> f64 {
        (self.range_edges - 1) as f64 * self.range_interval
    }

    pub fn vertices(&self) -> &[[f32; 2]] {
        &self.vertices
    }
}

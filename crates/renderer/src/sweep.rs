//! Sweep geometry and triangle-list buffers.
//!
//! Building a sweep happens in two steps. [`SweepGeometry`] pairs every gate
//! with its four projected corners and its decoded value; it depends on the
//! scan and the coordinate set only. [`SweepGeometry::colorize`] then maps
//! each gate through a [`ColorTable`] and emits two triangles per colored
//! gate. A palette change only repeats the second step.

use chrono::{DateTime, Utc};
use projection::{geodesic, CoordinateSet};
use radar_common::{RadialSize, Rgba8};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use wsr88d::rda::ElevationScan;
use wsr88d::rpg::{RadialImage, RasterDataPacket};
use wsr88d::{DataBlockType, DataLevel};

use crate::color_table::ColorTable;

/// Two triangles per gate.
pub const VERTICES_PER_GATE: usize = 6;

/// Scalar properties of a sweep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepMetadata {
    pub time: Option<DateTime<Utc>>,
    /// Degrees.
    pub elevation: f32,
    pub vcp: Option<u16>,
    /// Distance to the far edge of the outermost gate (meters).
    pub range: f32,
    pub moment: Option<DataBlockType>,
    pub product_code: Option<i16>,
}

/// Published, immutable sweep output. Vertex `i` has position
/// `vertices[i]` (latitude, longitude), color `colors[i]` and raw data word
/// `data[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepBuffer {
    pub vertices: Vec<[f32; 2]>,
    pub colors: Vec<Rgba8>,
    pub data: Vec<u16>,
    pub metadata: SweepMetadata,
}

impl SweepBuffer {
    /// A buffer with metadata but no geometry.
    pub fn empty(metadata: SweepMetadata) -> Self {
        Self {
            metadata,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn gate_count(&self) -> usize {
        self.vertices.len() / VERTICES_PER_GATE
    }
}

/// Where gate corners live.
#[derive(Debug, Clone)]
enum Corners {
    Polar(Arc<CoordinateSet>),
    Grid(Arc<Vec<[f32; 2]>>),
}

impl Corners {
    fn get(&self, index: u32) -> [f32; 2] {
        let vertices = match self {
            Corners::Polar(set) => set.vertices(),
            Corners::Grid(vertices) => vertices.as_slice(),
        };
        vertices[index as usize]
    }
}

/// One gate: corner indices (near-left, near-right, far-right, far-left),
/// raw word and decoded value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gate {
    pub corners: [u32; 4],
    pub raw: u16,
    pub level: DataLevel,
}

/// Every gate of one sweep with its projected corners.
#[derive(Debug, Clone)]
pub struct SweepGeometry {
    corners: Corners,
    gates: Vec<Gate>,
    pub metadata: SweepMetadata,
}

impl SweepGeometry {
    /// Level II geometry for `moment` of an elevation scan.
    ///
    /// Gates are mapped onto the coordinate set's range edges by range, so
    /// any first-gate range and gate interval that are multiples of the edge
    /// interval land exactly on edges. Gates past the last edge are dropped.
    pub fn from_elevation_scan(
        scan: &ElevationScan,
        moment: DataBlockType,
        coordinates: Arc<CoordinateSet>,
    ) -> Self {
        let start = Instant::now();
        let radial_size = coordinates.radial_size;
        let set = coordinates.as_ref();

        let gates: Vec<Gate> = scan
            .radials()
            .par_iter()
            .flat_map_iter(|radial| {
                let k = radial_size.radial_index_for_center(radial.azimuth_angle);
                let mut gates = Vec::new();
                if let Some(block) = radial.moment(moment) {
                    let near = block.range_to_first_gate as f64 - block.gate_interval as f64 / 2.0;
                    for (g, raw) in block.raw_words().enumerate() {
                        let near_edge = set.range_edge(near + g as f64 * block.gate_interval as f64);
                        let far_edge =
                            set.range_edge(near + (g + 1) as f64 * block.gate_interval as f64);
                        if far_edge <= near_edge {
                            continue;
                        }
                        let Some(corners) = polar_corners(set, k, near_edge, far_edge) else {
                            break;
                        };
                        gates.push(Gate {
                            corners,
                            raw,
                            level: block.decode(raw),
                        });
                    }
                }
                gates
            })
            .collect();

        let metadata = SweepMetadata {
            time: scan.start_time(),
            elevation: scan.elevation_angle(),
            vcp: scan.vcp(),
            range: scan.max_range(moment),
            moment: Some(moment),
            product_code: None,
        };

        debug!(
            %moment,
            elevation = scan.elevation_angle(),
            radials = scan.len(),
            gates = gates.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Built sweep geometry"
        );

        Self {
            corners: Corners::Polar(coordinates),
            gates,
            metadata,
        }
    }

    /// Level III radial product geometry. `resolution_km` is the bin length;
    /// it must be a multiple of the coordinate set's edge interval.
    pub fn from_radial_image(
        image: RadialImage<'_>,
        resolution_km: f32,
        data_level: impl Fn(u8) -> DataLevel + Sync,
        coordinates: Arc<CoordinateSet>,
    ) -> Self {
        let radial_size = coordinates.radial_size;
        let set = coordinates.as_ref();
        let edges_per_bin = ((resolution_km as f64 * 1000.0 / set.range_interval).round() as usize).max(1);
        let first_bin = image.header.index_of_first_range_bin as usize;

        let gates: Vec<Gate> = image
            .radials
            .par_iter()
            .flat_map_iter(|radial| {
                let k = radial_size.radial_index(radial.start_angle);
                let mut gates = Vec::with_capacity(radial.levels.len());
                for (b, &level) in radial.levels.iter().enumerate() {
                    let near_edge = (first_bin + b) * edges_per_bin;
                    let Some(corners) = polar_corners(set, k, near_edge, near_edge + edges_per_bin)
                    else {
                        break;
                    };
                    gates.push(Gate {
                        corners,
                        raw: level as u16,
                        level: data_level(level),
                    });
                }
                gates
            })
            .collect();

        let bins = first_bin + image.header.number_of_range_bins as usize;
        let metadata = SweepMetadata {
            range: bins as f32 * resolution_km * 1000.0,
            ..Default::default()
        };

        Self {
            corners: Corners::Polar(coordinates),
            gates,
            metadata,
        }
    }

    /// Level III raster product geometry: a grid of `resolution_km` cells
    /// centered on the radar, rows running north to south.
    pub fn from_raster(
        raster: &RasterDataPacket,
        latitude: f64,
        longitude: f64,
        resolution_km: f32,
        data_level: impl Fn(u8) -> DataLevel + Sync,
    ) -> Self {
        let rows = raster.rows.len();
        let columns = raster.number_of_columns();
        let cell = resolution_km as f64 * 1000.0;
        let stride = columns + 1;

        let half_width = columns as f64 * cell / 2.0;
        let half_height = rows as f64 * cell / 2.0;
        let vertices: Vec<[f32; 2]> = (0..(rows + 1) * stride)
            .into_par_iter()
            .map(|i| {
                let (row, column) = (i / stride, i % stride);
                let east = column as f64 * cell - half_width;
                let north = half_height - row as f64 * cell;
                let (lat, lon) = geodesic::offset(latitude, longitude, east, north);
                [lat as f32, lon as f32]
            })
            .collect();

        let mut gates = Vec::new();
        for (row, levels) in raster.rows.iter().enumerate() {
            for (column, &level) in levels.levels.iter().enumerate().take(columns) {
                let top_left = (row * stride + column) as u32;
                let bottom_left = ((row + 1) * stride + column) as u32;
                gates.push(Gate {
                    corners: [bottom_left, bottom_left + 1, top_left + 1, top_left],
                    raw: level as u16,
                    level: data_level(level),
                });
            }
        }

        let metadata = SweepMetadata {
            range: (half_width.max(half_height) * std::f64::consts::SQRT_2) as f32,
            ..Default::default()
        };

        Self {
            corners: Corners::Grid(Arc::new(vertices)),
            gates,
            metadata,
        }
    }

    pub fn with_metadata(mut self, metadata: SweepMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn radial_size(&self) -> Option<RadialSize> {
        match &self.corners {
            Corners::Polar(set) => Some(set.radial_size),
            Corners::Grid(_) => None,
        }
    }

    /// Emit two triangles per gate that has a color. Gate order is kept.
    pub fn colorize(&self, table: &ColorTable) -> SweepBuffer {
        let start = Instant::now();

        let colored: Vec<([[f32; 2]; 4], Rgba8, u16)> = self
            .gates
            .par_iter()
            .filter_map(|gate| {
                let color = table.lookup(gate.level)?;
                Some((gate.corners.map(|c| self.corners.get(c)), color, gate.raw))
            })
            .collect();

        let mut buffer = SweepBuffer {
            vertices: Vec::with_capacity(colored.len() * VERTICES_PER_GATE),
            colors: Vec::with_capacity(colored.len() * VERTICES_PER_GATE),
            data: Vec::with_capacity(colored.len() * VERTICES_PER_GATE),
            metadata: self.metadata.clone(),
        };
        for ([near_left, near_right, far_right, far_left], color, raw) in colored {
            buffer.vertices.extend_from_slice(&[
                near_left, near_right, far_right, near_left, far_right, far_left,
            ]);
            buffer.colors.extend_from_slice(&[color; VERTICES_PER_GATE]);
            buffer.data.extend_from_slice(&[raw; VERTICES_PER_GATE]);
        }

        debug!(
            gates = self.gates.len(),
            drawn = buffer.gate_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Colorized sweep"
        );
        buffer
    }
}

fn polar_corners(set: &CoordinateSet, radial: usize, near: usize, far: usize) -> Option<[u32; 4]> {
    if far >= set.range_edges {
        return None;
    }
    let left = (radial % set.radial_edges) * set.range_edges;
    let right = ((radial + 1) % set.radial_edges) * set.range_edges;
    Some([
        (left + near) as u32,
        (right + near) as u32,
        (right + far) as u32,
        (left + far) as u32,
    ])
}

/// Radial size matching a Level III radial width.
pub fn radial_size_for_width(delta_angle: f32) -> RadialSize {
    if delta_angle > 0.0 && delta_angle < 0.75 {
        RadialSize::ZeroPointFiveDegree
    } else {
        RadialSize::NonSuperResolution
    }
}

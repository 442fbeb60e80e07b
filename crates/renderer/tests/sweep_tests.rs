//! Sweep geometry built from decoded Level II and Level III data.

use projection::{geodesic, CoordinateSet};
use radar_common::{RadialSize, Rgba8};
use renderer::{ColorTable, SweepGeometry, VERTICES_PER_GATE};
use std::sync::Arc;
use test_utils::{
    digital_radial_packet, palettes, site, volume_time, Ar2vBuilder, Level3Builder, MomentSpec,
};
use wsr88d::{Ar2vFile, DataBlockType, Level3File};

fn coordinates(radial_size: RadialSize) -> Arc<CoordinateSet> {
    Arc::new(
        CoordinateSet::compute(site::LATITUDE, site::LONGITUDE, radial_size, 100, 250.0).unwrap(),
    )
}

/// Grid vertex `range` meters out along `azimuth`.
fn edge(azimuth: f64, range: f64) -> [f32; 2] {
    let (lat, lon) = geodesic::direct(site::LATITUDE, site::LONGITUDE, azimuth, range);
    [lat as f32, lon as f32]
}

fn reflectivity_table() -> ColorTable {
    ColorTable::from_json(palettes::REFLECTIVITY).unwrap()
}

#[test]
fn test_level2_sweep_colors_every_gate() {
    let bytes = Ar2vBuilder::new(b"KTLX", volume_time())
        .sweep(1, 0.5, 360, volume_time(), &[MomentSpec::reflectivity_constant(35.0, 10)])
        .build();
    let file = Ar2vFile::load_data(&bytes).unwrap();
    let (scan, elevation) = file
        .get_elevation_scan(DataBlockType::MomentRef, 0.5, None)
        .unwrap();
    assert_eq!(elevation, 0.5);

    let set = coordinates(RadialSize::NonSuperResolution);
    let geometry =
        SweepGeometry::from_elevation_scan(&scan, DataBlockType::MomentRef, Arc::clone(&set));
    assert_eq!(geometry.gates().len(), 3600);

    let buffer = geometry.colorize(&reflectivity_table());
    assert_eq!(buffer.vertex_count(), 3600 * VERTICES_PER_GATE);
    assert_eq!(buffer.colors.len(), buffer.vertex_count());
    assert_eq!(buffer.data.len(), buffer.vertex_count());
    assert!(buffer.colors.iter().all(|c| *c == Rgba8::opaque(0x00, 0x8e, 0x00)));
    assert!(buffer.data.iter().all(|&raw| raw == 136));

    // First gate centered at 2125 m spans edges 8..9 of radial 0
    assert_eq!(buffer.vertices[0], set.corner(0, 8).unwrap());
    assert_eq!(buffer.vertices[1], set.corner(1, 8).unwrap());
    assert_eq!(buffer.vertices[2], set.corner(1, 9).unwrap());
    assert_eq!(buffer.vertices[5], set.corner(0, 9).unwrap());

    assert_eq!(buffer.metadata.elevation, 0.5);
    assert_eq!(buffer.metadata.vcp, Some(212));
    assert_eq!(buffer.metadata.time, Some(volume_time()));
    assert_eq!(buffer.metadata.range, 4500.0);
    assert_eq!(buffer.metadata.moment, Some(DataBlockType::MomentRef));
}

#[test]
fn test_level2_sweep_skips_uncolored_gates() {
    // Below threshold, range folded, 5 dBZ, 25 dBZ
    let raw = vec![0u8, 1, 76, 116];
    let bytes = Ar2vBuilder::new(b"KTLX", volume_time())
        .sweep(1, 0.5, 720, volume_time(), &[MomentSpec::reflectivity(raw)])
        .build();
    let file = Ar2vFile::load_data(&bytes).unwrap();
    let scan = &file.elevation_scans()[0];

    let geometry = SweepGeometry::from_elevation_scan(
        scan,
        DataBlockType::MomentRef,
        coordinates(RadialSize::ZeroPointFiveDegree),
    );
    assert_eq!(geometry.gates().len(), 720 * 4);

    let buffer = geometry.colorize(&reflectivity_table());
    assert_eq!(buffer.gate_count(), 720 * 2);
    assert_eq!(buffer.colors[0], Rgba8::opaque(0x77, 0x00, 0x7d));
    assert_eq!(buffer.data[VERTICES_PER_GATE], 116);
}

#[test]
fn test_level2_missing_moment_is_empty() {
    let bytes = Ar2vBuilder::new(b"KTLX", volume_time())
        .sweep(1, 0.5, 360, volume_time(), &[MomentSpec::reflectivity_constant(20.0, 5)])
        .build();
    let file = Ar2vFile::load_data(&bytes).unwrap();

    let geometry = SweepGeometry::from_elevation_scan(
        &file.elevation_scans()[0],
        DataBlockType::MomentVel,
        coordinates(RadialSize::NonSuperResolution),
    );
    assert!(geometry.gates().is_empty());
    assert!(geometry.colorize(&reflectivity_table()).is_empty());
}

#[test]
fn test_level3_radial_product_sweep() {
    // Level 2 decodes to -32 dBZ, each level adds 0.5 dBZ
    let levels: Vec<u8> = vec![0, 1, 2, 126, 146];
    let radials: Vec<(f32, f32, Vec<u8>)> =
        (0..360).map(|i| (i as f32, 1.0, levels.clone())).collect();
    let bytes = Level3Builder::new(94, volume_time())
        .digital_thresholds(-320, 5, 256)
        .layer(&[digital_radial_packet(levels.len() as u16, &radials)])
        .build();
    let file = Level3File::load_data(&bytes).unwrap();

    let set = coordinates(RadialSize::NonSuperResolution);
    let geometry = SweepGeometry::from_radial_image(
        file.radial_image().unwrap(),
        file.range_resolution_km(),
        |level| file.data_level(level),
        Arc::clone(&set),
    );
    assert_eq!(geometry.gates().len(), 360 * 5);

    let buffer = geometry.colorize(&reflectivity_table());
    // Range folded, 30 dBZ and 40 dBZ are drawn
    assert_eq!(buffer.gate_count(), 360 * 3);
    assert_eq!(buffer.colors[0], Rgba8::opaque(0x77, 0x00, 0x7d));
    assert_eq!(buffer.colors[VERTICES_PER_GATE], Rgba8::opaque(0x00, 0x8e, 0x00));
    assert_eq!(buffer.colors[2 * VERTICES_PER_GATE], Rgba8::opaque(0xe5, 0xbc, 0x00));

    // Second bin of radial 0 spans 1-2 km
    assert_eq!(buffer.vertices[0], set.corner(0, 4).unwrap());
    assert_eq!(buffer.vertices[2], set.corner(1, 8).unwrap());
}

#[test]
fn test_level2_radial_spans_its_beam() {
    // Radial 0 is centered at 0.5 degrees and covers 0..1
    let bytes = Ar2vBuilder::new(b"KTLX", volume_time())
        .sweep(1, 0.5, 360, volume_time(), &[MomentSpec::reflectivity_constant(35.0, 10)])
        .build();
    let file = Ar2vFile::load_data(&bytes).unwrap();
    let scan = &file.elevation_scans()[0];
    assert_eq!(scan.radials()[0].azimuth_angle, 0.5);

    let set = coordinates(RadialSize::NonSuperResolution);
    let buffer = SweepGeometry::from_elevation_scan(scan, DataBlockType::MomentRef, Arc::clone(&set))
        .colorize(&reflectivity_table());

    assert_eq!(buffer.vertices[0], edge(0.0, 2000.0));
    assert_eq!(buffer.vertices[1], edge(1.0, 2000.0));
    assert_eq!(buffer.vertices[2], edge(1.0, 2250.0));

    // The last radial closes the circle at north
    let last = 359 * 10 * VERTICES_PER_GATE;
    assert_eq!(buffer.vertices[last], edge(359.0, 2000.0));
    assert_eq!(buffer.vertices[last + 1], set.corner(0, 8).unwrap());
}

#[test]
fn test_level3_left_edge_on_start_angle() {
    let radials = vec![(10.0f32, 1.0f32, vec![0u8, 146])];
    let bytes = Level3Builder::new(94, volume_time())
        .digital_thresholds(-320, 5, 256)
        .layer(&[digital_radial_packet(2, &radials)])
        .build();
    let file = Level3File::load_data(&bytes).unwrap();

    let buffer = SweepGeometry::from_radial_image(
        file.radial_image().unwrap(),
        file.range_resolution_km(),
        |level| file.data_level(level),
        coordinates(RadialSize::NonSuperResolution),
    )
    .colorize(&reflectivity_table());
    assert_eq!(buffer.gate_count(), 1);

    // Near-left, near-right, far-right, far-left of the 1-2 km bin
    assert_eq!(buffer.vertices[0], edge(10.0, 1000.0));
    assert_eq!(buffer.vertices[1], edge(11.0, 1000.0));
    assert_eq!(buffer.vertices[2], edge(11.0, 2000.0));
    assert_eq!(buffer.vertices[5], edge(10.0, 2000.0));
}

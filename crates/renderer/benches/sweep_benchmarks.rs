//! Benchmarks for sweep geometry and colorization.
//!
//! Run with: cargo bench --package renderer --bench sweep_benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use projection::CoordinateSet;
use radar_common::RadialSize;
use renderer::{ColorTable, SweepGeometry};
use std::sync::Arc;
use test_utils::{palettes, site, volume_time, Ar2vBuilder, MomentSpec};
use wsr88d::{Ar2vFile, DataBlockType};

/// A super resolution sweep with a reflectivity ramp along each radial.
fn build_scan() -> Ar2vFile {
    let raw: Vec<u8> = (0..1832u32).map(|g| (2 + g % 150) as u8).collect();
    let bytes = Ar2vBuilder::new(b"KTLX", volume_time())
        .sweep(1, 0.5, 720, volume_time(), &[MomentSpec::reflectivity(raw)])
        .build();
    Ar2vFile::load_data(&bytes).unwrap()
}

fn bench_sweep(c: &mut Criterion) {
    let file = build_scan();
    let scan = Arc::clone(&file.elevation_scans()[0]);
    let set = Arc::new(
        CoordinateSet::compute(
            site::LATITUDE,
            site::LONGITUDE,
            RadialSize::ZeroPointFiveDegree,
            1840,
            250.0,
        )
        .unwrap(),
    );
    let table = ColorTable::from_json(palettes::REFLECTIVITY).unwrap();

    c.bench_function("sweep_geometry_720x1832", |b| {
        b.iter(|| {
            SweepGeometry::from_elevation_scan(
                black_box(&scan),
                DataBlockType::MomentRef,
                Arc::clone(&set),
            )
        })
    });

    let geometry = SweepGeometry::from_elevation_scan(&scan, DataBlockType::MomentRef, set);
    c.bench_function("sweep_colorize_720x1832", |b| {
        b.iter(|| geometry.colorize(black_box(&table)))
    });
}

criterion_group!(benches, bench_sweep);
criterion_main!(benches);

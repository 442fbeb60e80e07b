//! Archive II decoding against synthetic volumes.

use radar_common::RadialSize;
use test_utils::{
    assert_approx_eq, message_header, site, vcp_message, volume_time, volume_time_plus,
    Ar2vBuilder, MomentSpec, RadialSpec,
};
use wsr88d::{Ar2vFile, DataBlockType, DataLevel, DataLevelCode};

fn reflectivity() -> Vec<MomentSpec> {
    vec![MomentSpec::reflectivity((0..100u8).map(|i| i + 2).collect())]
}

fn three_cut_volume() -> Ar2vBuilder {
    Ar2vBuilder::new(b"KTLX", volume_time())
        .sweep(1, 0.48, 360, volume_time(), &reflectivity())
        .sweep(2, 1.52, 360, volume_time_plus(1), &reflectivity())
        .sweep(3, 2.41, 360, volume_time_plus(2), &reflectivity())
}

#[test]
fn test_groups_radials_into_scans() {
    let file = Ar2vFile::load_data(&three_cut_volume().build()).unwrap();

    assert_eq!(file.icao(), site::ICAO);
    assert_eq!(file.volume_start_time(), Some(volume_time()));
    assert_eq!(file.elevation_scans().len(), 3);
    for scan in file.elevation_scans() {
        assert_eq!(scan.len(), 360);
        assert_eq!(scan.radial_size(), RadialSize::NonSuperResolution);
        assert!(scan.has_moment(DataBlockType::MomentRef));
        assert!(!scan.has_moment(DataBlockType::MomentVel));
    }
    assert_eq!(file.skipped_radials(), 0);
    assert_eq!(file.vcp_number(), Some(212));

    let (lat, lon, _) = file.site_location().unwrap();
    assert_approx_eq!(lat, site::LATITUDE, 1e-4);
    assert_approx_eq!(lon, site::LONGITUDE, 1e-4);
}

#[test]
fn test_moment_values_decode() {
    let file = Ar2vFile::load_data(&three_cut_volume().build()).unwrap();
    let scan = &file.elevation_scans()[0];
    let moment = scan.radials()[0].moment(DataBlockType::MomentRef).unwrap();

    assert_eq!(moment.number_of_gates, 100);
    assert_eq!(moment.raw(0), Some(2));
    // (2 - 66) / 2
    assert_eq!(moment.data_level(0), Some(DataLevel::Value(-32.0)));
    assert_eq!(moment.data_level(100), None);
    assert_approx_eq!(moment.max_range(), 2125.0 + 99.5 * 250.0, 1e-3);
}

#[test]
fn test_sentinel_words() {
    let radial = RadialSpec::new(1, 0.5, 0.5, volume_time())
        .with_status(3)
        .with_moment(MomentSpec::reflectivity(vec![0, 1, 66]));
    let bytes = Ar2vBuilder::new(b"KTLX", volume_time()).radial(&radial).build();
    let file = Ar2vFile::load_data(&bytes).unwrap();
    let moment = file.elevation_scans()[0].radials()[0]
        .moment(DataBlockType::MomentRef)
        .unwrap();

    assert_eq!(
        moment.data_level(0),
        Some(DataLevel::Code(DataLevelCode::BelowThreshold))
    );
    assert_eq!(
        moment.data_level(1),
        Some(DataLevel::Code(DataLevelCode::RangeFolded))
    );
    assert_eq!(moment.data_level(2), Some(DataLevel::Value(0.0)));
}

#[test]
fn test_sixteen_bit_moment() {
    let radial = RadialSpec::new(1, 0.5, 10.0, volume_time())
        .with_moment(MomentSpec::differential_phase(vec![2, 1000, 65535]));
    let bytes = Ar2vBuilder::new(b"KTLX", volume_time()).radial(&radial).build();
    let file = Ar2vFile::load_data(&bytes).unwrap();
    let moment = file.elevation_scans()[0].radials()[0]
        .moment(DataBlockType::MomentPhi)
        .unwrap();

    assert_eq!(moment.data_word_size, 16);
    assert_eq!(moment.raw_words().collect::<Vec<_>>(), vec![2, 1000, 65535]);
}

#[test]
fn test_vcp_message_sets_cut_angles() {
    let bytes = Ar2vBuilder::new(b"KTLX", volume_time())
        .message(vcp_message(212, &[(0.5, 1, 0x0B), (1.5, 1, 0x0B), (2.4, 1, 0x0B)]))
        .sweep(1, 0.48, 360, volume_time(), &reflectivity())
        .sweep(2, 1.52, 360, volume_time_plus(1), &reflectivity())
        .build();
    let file = Ar2vFile::load_data(&bytes).unwrap();

    let vcp = file.vcp().unwrap();
    assert_eq!(vcp.pattern_number, 212);
    assert_eq!(vcp.elevation_cuts.len(), 3);

    let angles = file.elevation_angles();
    assert_eq!(angles.len(), 2);
    assert_approx_eq!(angles[0], 0.5, 0.01);
    assert_approx_eq!(angles[1], 1.5, 0.01);
}

#[test]
fn test_measured_angle_without_vcp() {
    let file = Ar2vFile::load_data(&three_cut_volume().build()).unwrap();
    let angles = file.elevation_angles();
    assert_approx_eq!(angles[0], 0.48, 1e-4);
    assert_approx_eq!(angles[2], 2.41, 1e-4);
}

#[test]
fn test_ldm_compressed_records() {
    let builder = three_cut_volume();
    let plain = Ar2vFile::load_data(&builder.build()).unwrap();
    let compressed = Ar2vFile::load_data(&builder.build_compressed(120)).unwrap();

    assert_eq!(compressed.elevation_scans().len(), 3);
    assert_eq!(compressed.elevation_angles(), plain.elevation_angles());
    assert_eq!(
        compressed.elevation_scans()[2].radials()[359],
        plain.elevation_scans()[2].radials()[359]
    );
}

#[test]
fn test_invalid_radial_is_skipped() {
    // Metadata blocks only: fewer than four data blocks
    let bad = RadialSpec::new(1, 0.5, 90.0, volume_time());
    let good = RadialSpec::new(1, 0.5, 91.0, volume_time()).with_moment(MomentSpec::reflectivity(vec![90; 10]));

    let bytes = Ar2vBuilder::new(b"KTLX", volume_time())
        .radial(&good)
        .radial(&bad)
        .radial(&good)
        .build();
    let file = Ar2vFile::load_data(&bytes).unwrap();

    assert_eq!(file.skipped_radials(), 1);
    assert_eq!(file.elevation_scans()[0].len(), 2);
}

#[test]
fn test_truncated_stream_keeps_complete_scans() {
    let mut bytes = three_cut_volume().build();
    let cut = bytes.len() - 100;
    bytes.truncate(cut);

    let file = Ar2vFile::load_data(&bytes).unwrap();
    assert_eq!(file.elevation_scans().len(), 3);
    assert_eq!(file.elevation_scans()[0].len(), 360);
    assert_eq!(file.elevation_scans()[2].len(), 359);
}

#[test]
fn test_invalid_message_header_stops_iteration() {
    let mut builder = Ar2vBuilder::new(b"KTLX", volume_time())
        .sweep(1, 0.5, 360, volume_time(), &reflectivity());
    // Message 31 claiming 2 halfwords
    builder = builder.message(message_header(31, 4, 1, 0));
    let bytes = builder
        .sweep(2, 1.5, 360, volume_time_plus(1), &reflectivity())
        .build();

    let file = Ar2vFile::load_data(&bytes).unwrap();
    assert_eq!(file.elevation_scans().len(), 1);
}

#[test]
fn test_not_an_archive() {
    assert!(Ar2vFile::load_data(b"NOT AN ARCHIVE II FILE AT ALL").is_err());
    assert!(Ar2vFile::load_data(b"AR2V").unwrap_err().is_truncation());
}

#[test]
fn test_get_elevation_scan() {
    let bytes = Ar2vBuilder::new(b"KTLX", volume_time())
        .sweep(1, 0.5, 360, volume_time(), &reflectivity())
        .sweep(2, 1.5, 360, volume_time_plus(1), &reflectivity())
        .sweep(3, 2.4, 360, volume_time_plus(2), &reflectivity())
        .build();
    let file = Ar2vFile::load_data(&bytes).unwrap();

    let (scan, angle) = file
        .get_elevation_scan(DataBlockType::MomentRef, 1.4, None)
        .unwrap();
    assert_eq!(scan.elevation_number(), 2);
    assert_approx_eq!(angle, 1.5, 1e-4);

    // Only the first cut had started by then
    let (scan, _) = file
        .get_elevation_scan(DataBlockType::MomentRef, 2.4, Some(volume_time_plus(0)))
        .unwrap();
    assert_eq!(scan.elevation_number(), 1);

    assert!(file
        .get_elevation_scan(DataBlockType::MomentVel, 0.5, None)
        .is_none());
    assert!(file
        .get_elevation_scan(
            DataBlockType::MomentRef,
            0.5,
            Some(volume_time() - chrono::Duration::minutes(1))
        )
        .is_none());
}

#[test]
fn test_load_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("KTLX20240506_223000_V06");
    std::fs::write(&path, three_cut_volume().build_compressed(360)).unwrap();

    let file = Ar2vFile::load_file(&path).unwrap();
    assert_eq!(file.elevation_scans().len(), 3);
}

#[test]
fn test_real_archive() {
    let path = test_utils::require_test_file!("KTLX20240506_223045_V06");

    let file = Ar2vFile::load_file(&path).unwrap();
    assert_eq!(file.icao(), "KTLX");
    assert!(file.vcp_number().is_some());
    assert!(!file.elevation_scans().is_empty());
    // Real cuts can drop or repeat a few radials
    for scan in file.elevation_scans() {
        assert!(scan.len() + 10 >= scan.radial_size().radial_count());
    }
    let (_, elevation) = file
        .get_elevation_scan(DataBlockType::MomentRef, 0.5, None)
        .unwrap();
    assert_approx_eq!(elevation, 0.5, 0.1);
}

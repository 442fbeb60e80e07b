//! Radar product view behavior over a manager fed with synthetic data.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use radar_common::{RadarSite, Rgba8};
use radar_manager::{ManagerSettings, RadarProductManager};
use radar_view::{ColorTableSource, RadarProductView, ViewEvent, ViewProduct, ViewState};
use renderer::ColorTable;
use std::sync::Arc;
use std::time::Duration;
use test_utils::{
    digital_radial_packet, elevations, palettes, recv_within, site, volume_time, wait_for,
    Ar2vBuilder, Level3Builder, MomentSpec, EVENT_TIMEOUT,
};
use tokio::sync::broadcast;
use wsr88d::DataBlockType;

const QUIET: Duration = Duration::from_millis(200);

fn manager() -> Arc<RadarProductManager> {
    let site = RadarSite::new(site::ICAO, site::LATITUDE, site::LONGITUDE, site::ELEVATION_FT);
    Arc::new(RadarProductManager::new(
        Arc::new(site),
        ManagerSettings {
            range_gates: 100,
            ..Default::default()
        },
    ))
}

/// Low VCP 212 cuts at 35 dBZ, 360 radials of 10 gates each.
fn volume(start: DateTime<Utc>) -> Vec<u8> {
    let mut builder = Ar2vBuilder::new(b"KTLX", start);
    for (i, &elevation) in elevations::VCP_212_LOW.iter().enumerate() {
        builder = builder.sweep(
            i as u8 + 1,
            elevation,
            360,
            start + ChronoDuration::seconds(30 * i as i64),
            &[MomentSpec::reflectivity_constant(35.0, 10)],
        );
    }
    builder.build()
}

async fn loaded_manager() -> Arc<RadarProductManager> {
    let manager = manager();
    manager.load_level2_bytes(volume(volume_time())).await.unwrap().unwrap();
    manager
}

fn reflectivity() -> ColorTableSource {
    ColorTableSource::Table(Arc::new(ColorTable::from_json(palettes::REFLECTIVITY).unwrap()))
}

async fn next_sweep(events: &mut broadcast::Receiver<ViewEvent>) {
    assert_eq!(
        wait_for(events, EVENT_TIMEOUT, |e| *e == ViewEvent::SweepComputed).await,
        Some(ViewEvent::SweepComputed)
    );
}

// ============================================================================
// Initialization
// ============================================================================

#[tokio::test]
async fn test_initialize_computes_first_sweep() {
    let view = RadarProductView::new(loaded_manager().await, ViewProduct::Level2(DataBlockType::MomentRef));
    assert_eq!(view.state(), ViewState::Uninitialized);
    let mut events = view.subscribe();

    view.initialize(reflectivity()).await.unwrap();
    next_sweep(&mut events).await;

    assert_eq!(view.state(), ViewState::Idle);
    let sweep = view.sweep();
    assert_eq!(sweep.gate_count(), 3600);
    assert!(sweep.colors.iter().all(|c| *c == Rgba8::opaque(0x00, 0x8e, 0x00)));
    assert_eq!(view.elevation(), 0.5);
    assert_eq!(view.vcp(), Some(212));
    assert_eq!(view.sweep_time(), Some(volume_time()));
    assert_eq!(view.range(), 4500.0);
    assert_eq!(view.moment_data().len(), sweep.vertex_count());
    assert_eq!(view.product_name().await, DataBlockType::MomentRef.description());
    assert_eq!(view.elevation_angles().await, elevations::VCP_212_LOW.to_vec());
}

#[tokio::test]
async fn test_selection_before_initialize_is_stored() {
    let view = RadarProductView::new(loaded_manager().await, ViewProduct::Level2(DataBlockType::MomentRef));
    let mut events = view.subscribe();

    view.select_elevation(1.5).await;
    assert_eq!(view.state(), ViewState::Uninitialized);
    assert_eq!(recv_within(&mut events, QUIET).await, None);
    assert!(view.sweep().is_empty());

    view.initialize(reflectivity()).await.unwrap();
    next_sweep(&mut events).await;
    assert_eq!(view.elevation(), 1.5);
}

#[tokio::test]
async fn test_missing_palette_leaves_view_uninitialized() {
    let view = RadarProductView::new(loaded_manager().await, ViewProduct::Level2(DataBlockType::MomentRef));
    let dir = test_utils::temp_test_dir();

    let result = view
        .initialize(ColorTableSource::File(dir.path().join("missing.json")))
        .await;
    assert!(result.is_err());
    assert_eq!(view.state(), ViewState::Uninitialized);
}

#[tokio::test]
async fn test_palette_file_from_directory() {
    let view = RadarProductView::new(loaded_manager().await, ViewProduct::Level2(DataBlockType::MomentRef));
    let mut events = view.subscribe();

    view.initialize(ColorTableSource::File(test_utils::palette_dir().join("reflectivity.json")))
        .await
        .unwrap();
    next_sweep(&mut events).await;
    assert_eq!(view.sweep().gate_count(), 3600);
}

// ============================================================================
// Selection
// ============================================================================

#[tokio::test]
async fn test_last_request_wins() {
    let view = RadarProductView::new(loaded_manager().await, ViewProduct::Level2(DataBlockType::MomentRef));
    let mut events = view.subscribe();
    view.initialize(reflectivity()).await.unwrap();
    next_sweep(&mut events).await;

    view.select_elevation(1.5).await;
    view.select_elevation(2.4).await;
    assert_eq!(view.state(), ViewState::ComputingSweep);

    next_sweep(&mut events).await;
    assert_eq!(view.elevation(), 2.4);
    assert_eq!(view.sweep_time(), Some(volume_time() + ChronoDuration::seconds(60)));

    // The superseded request never publishes
    assert_eq!(recv_within(&mut events, QUIET).await, None);
    assert_eq!(view.elevation(), 2.4);
    assert_eq!(view.state(), ViewState::Idle);
}

#[tokio::test]
async fn test_missing_data_publishes_empty_sweep() {
    let view = RadarProductView::new(loaded_manager().await, ViewProduct::Level2(DataBlockType::MomentRef));
    let mut events = view.subscribe();
    view.initialize(reflectivity()).await.unwrap();
    next_sweep(&mut events).await;

    view.select_moment(DataBlockType::MomentVel).await;
    next_sweep(&mut events).await;
    assert!(view.sweep().is_empty());
    assert!(view.elevation_angles().await.is_empty());

    view.select_moment(DataBlockType::MomentRef).await;
    view.select_time(Some(volume_time() - ChronoDuration::minutes(1))).await;
    next_sweep(&mut events).await;
    assert!(view.sweep().is_empty());
}

#[tokio::test]
async fn test_watch_sweep_sees_publication() {
    let view = RadarProductView::new(loaded_manager().await, ViewProduct::Level2(DataBlockType::MomentRef));
    let mut sweeps = view.watch_sweep();
    let previous = view.sweep();

    view.initialize(reflectivity()).await.unwrap();
    tokio::time::timeout(EVENT_TIMEOUT, sweeps.changed())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(sweeps.borrow().gate_count(), 3600);
    // Earlier handles keep their buffer
    assert!(previous.is_empty());
}

// ============================================================================
// Color tables
// ============================================================================

#[tokio::test]
async fn test_load_color_table_recolors() {
    let view = RadarProductView::new(loaded_manager().await, ViewProduct::Level2(DataBlockType::MomentRef));
    let mut events = view.subscribe();
    view.initialize(reflectivity()).await.unwrap();
    next_sweep(&mut events).await;
    let before = view.sweep();

    view.load_color_table(ColorTable::from_json(palettes::NO_CODES).unwrap())
        .await;
    assert_eq!(
        recv_within(&mut events, EVENT_TIMEOUT).await,
        Some(ViewEvent::ColorTableUpdated)
    );
    next_sweep(&mut events).await;

    let after = view.sweep();
    assert_eq!(after.vertices, before.vertices);
    assert!(after.colors.iter().all(|c| *c == Rgba8::opaque(0x00, 0xff, 0x00)));
    assert_eq!(after.metadata, before.metadata);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_color_table_during_selection_change() {
    let manager = loaded_manager().await;
    for _ in 0..20 {
        let view = RadarProductView::new(Arc::clone(&manager), ViewProduct::Level2(DataBlockType::MomentRef));
        let mut events = view.subscribe();
        view.initialize(reflectivity()).await.unwrap();
        next_sweep(&mut events).await;

        let recolor = {
            let view = view.clone();
            tokio::spawn(async move {
                view.load_color_table(ColorTable::from_json(palettes::NO_CODES).unwrap())
                    .await
            })
        };
        let select = {
            let view = view.clone();
            tokio::spawn(async move { view.select_elevation(1.5).await })
        };
        recolor.await.unwrap();
        select.await.unwrap();

        // Whichever request is numbered last, the settled sweep shows the
        // new selection in the new colors
        next_sweep(&mut events).await;
        while recv_within(&mut events, QUIET).await.is_some() {}
        assert_eq!(view.state(), ViewState::Idle);
        assert_eq!(view.elevation(), 1.5);
        let sweep = view.sweep();
        assert_eq!(sweep.gate_count(), 3600);
        assert!(sweep.colors.iter().all(|c| *c == Rgba8::opaque(0x00, 0xff, 0x00)));
    }
}

#[tokio::test]
async fn test_no_color_table_publishes_metadata_only() {
    let view = RadarProductView::new(loaded_manager().await, ViewProduct::Level2(DataBlockType::MomentRef));
    let mut events = view.subscribe();
    view.initialize(ColorTableSource::None).await.unwrap();
    next_sweep(&mut events).await;

    assert!(view.sweep().is_empty());
    assert_eq!(view.elevation(), 0.5);
    assert_eq!(view.vcp(), Some(212));
    assert!(view.color_lookup_table().await.is_empty());
}

#[tokio::test]
async fn test_color_lookup_table() {
    let view = RadarProductView::new(loaded_manager().await, ViewProduct::Level2(DataBlockType::MomentRef));
    let mut events = view.subscribe();
    view.initialize(reflectivity()).await.unwrap();
    next_sweep(&mut events).await;

    let lut = view.color_lookup_table().await;
    assert_eq!(lut.len(), 256);
    assert_eq!(lut[0], Rgba8::TRANSPARENT);
    assert_eq!(lut[1], Rgba8::opaque(0x77, 0x00, 0x7d));
    assert_eq!(lut[136], Rgba8::opaque(0x00, 0x8e, 0x00));
}

// ============================================================================
// Manager updates and Level III
// ============================================================================

#[tokio::test]
async fn test_manager_load_triggers_recompute() {
    let manager = manager();
    let view = RadarProductView::new(Arc::clone(&manager), ViewProduct::Level2(DataBlockType::MomentRef));
    let mut events = view.subscribe();
    view.initialize(reflectivity()).await.unwrap();
    next_sweep(&mut events).await;
    assert!(view.sweep().is_empty());

    manager.load_level2_bytes(volume(volume_time())).await.unwrap().unwrap();
    next_sweep(&mut events).await;
    assert_eq!(view.sweep().gate_count(), 3600);
}

#[tokio::test]
async fn test_dropped_view_releases_manager() {
    let manager = loaded_manager().await;
    let view = RadarProductView::new(Arc::clone(&manager), ViewProduct::Level2(DataBlockType::MomentRef));
    let mut events = view.subscribe();
    view.initialize(reflectivity()).await.unwrap();
    next_sweep(&mut events).await;
    assert_eq!(manager.subscriber_count(), 1);

    drop(view);
    tokio::time::timeout(EVENT_TIMEOUT, async {
        while manager.subscriber_count() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_level3_view() {
    let manager = manager();
    let levels: Vec<u8> = vec![0, 1, 2, 126, 146];
    let radials: Vec<(f32, f32, Vec<u8>)> =
        (0..360).map(|i| (i as f32, 1.0, levels.clone())).collect();
    let bytes = Level3Builder::new(94, volume_time())
        .digital_thresholds(-320, 5, 256)
        .layer(&[digital_radial_packet(levels.len() as u16, &radials)])
        .build();
    manager.load_level3_bytes(bytes).await.unwrap().unwrap();

    let view = RadarProductView::new(manager, ViewProduct::Level3(94));
    let mut events = view.subscribe();
    view.initialize(reflectivity()).await.unwrap();
    next_sweep(&mut events).await;

    let sweep = view.sweep();
    assert_eq!(sweep.gate_count(), 360 * 3);
    assert_eq!(sweep.metadata.product_code, Some(94));
    assert_eq!(view.sweep_time(), Some(volume_time()));
    assert_eq!(view.range(), 5000.0);
    assert_eq!(view.product_name().await, "Digital Base Reflectivity");
    assert!(view.elevation_angles().await.is_empty());

    let lut = view.color_lookup_table().await;
    assert_eq!(lut.len(), 256);
    assert_eq!(lut[146], Rgba8::opaque(0xe5, 0xbc, 0x00));
}

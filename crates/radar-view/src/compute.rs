//! Geometry building for a selection.

use radar_common::{RadarError, RadarResult, Rgba8};
use radar_manager::RadarProductManager;
use renderer::sweep::radial_size_for_width;
use renderer::{ColorTable, SweepGeometry, SweepMetadata};
use std::sync::Arc;
use tokio::task;
use wsr88d::{DataBlockType, Level3File};

use crate::types::{Selection, ViewProduct};

/// How raw words map to palette entries, for lookup table export.
#[derive(Debug, Clone)]
pub(crate) enum LevelDecoder {
    ScaleOffset { scale: f32, offset: f32, words: usize },
    Level3(Arc<Level3File>),
}

impl LevelDecoder {
    pub(crate) fn lookup_table(&self, table: &ColorTable) -> Vec<Rgba8> {
        match self {
            LevelDecoder::ScaleOffset {
                scale,
                offset,
                words,
            } => table.lookup_table(*scale, *offset, *words),
            LevelDecoder::Level3(file) => {
                table.level_lookup_table(256, |raw| file.data_level(raw as u8))
            }
        }
    }
}

/// Geometry for one selection, kept for recoloring.
#[derive(Debug, Clone)]
pub(crate) struct ComputedGeometry {
    pub selection: Selection,
    pub geometry: Arc<SweepGeometry>,
    pub decoder: Option<LevelDecoder>,
}

/// Query the manager and build gate geometry. `Ok(None)` when no data
/// matches the selection.
pub(crate) async fn build_geometry(
    manager: &RadarProductManager,
    selection: Selection,
) -> RadarResult<Option<ComputedGeometry>> {
    match selection.product {
        ViewProduct::Level2(moment) => build_level2(manager, selection, moment).await,
        ViewProduct::Level3(code) => build_level3(manager, selection, code).await,
    }
}

async fn build_level2(
    manager: &RadarProductManager,
    selection: Selection,
    moment: DataBlockType,
) -> RadarResult<Option<ComputedGeometry>> {
    let Some(data) = manager
        .get_level2_data(moment, selection.elevation, selection.time)
        .await
    else {
        return Ok(None);
    };

    let decoder = data
        .scan
        .radials()
        .iter()
        .find_map(|radial| radial.moment(moment))
        .map(|block| LevelDecoder::ScaleOffset {
            scale: block.scale,
            offset: block.offset,
            words: 1usize << block.data_word_size.min(16),
        });

    let geometry = task::spawn_blocking(move || {
        SweepGeometry::from_elevation_scan(&data.scan, moment, data.coordinates)
    })
    .await
    .map_err(|e| RadarError::Task(e.to_string()))?;

    Ok(Some(ComputedGeometry {
        selection,
        geometry: Arc::new(geometry),
        decoder,
    }))
}

async fn build_level3(
    manager: &RadarProductManager,
    selection: Selection,
    product_code: i16,
) -> RadarResult<Option<ComputedGeometry>> {
    let Some(data) = manager.get_level3_data(product_code, selection.time).await else {
        return Ok(None);
    };
    let file = data.file;

    let coordinates = match file.radial_image() {
        Some(image) => {
            let width = image.radials.first().map_or(1.0, |r| r.delta_angle);
            Some(manager.coordinates(radial_size_for_width(width)).await?)
        }
        None => None,
    };

    let worker_file = Arc::clone(&file);
    let geometry = task::spawn_blocking(move || {
        let file = worker_file;
        let resolution = file.range_resolution_km();
        let decode = |level: u8| file.data_level(level);

        let geometry = match (file.radial_image(), coordinates) {
            (Some(image), Some(coordinates)) => Some(SweepGeometry::from_radial_image(
                image,
                resolution,
                decode,
                coordinates,
            )),
            _ => file.raster_image().map(|raster| {
                SweepGeometry::from_raster(
                    raster,
                    file.latitude(),
                    file.longitude(),
                    resolution,
                    decode,
                )
            }),
        };

        geometry.map(|geometry| {
            let range = geometry.metadata.range;
            geometry.with_metadata(SweepMetadata {
                time: file.volume_scan_time(),
                elevation: file.elevation().unwrap_or_default(),
                vcp: Some(file.vcp()),
                range,
                moment: None,
                product_code: Some(file.product_code()),
            })
        })
    })
    .await
    .map_err(|e| RadarError::Task(e.to_string()))?;

    Ok(geometry.map(|geometry| ComputedGeometry {
        selection,
        geometry: Arc::new(geometry),
        decoder: Some(LevelDecoder::Level3(file)),
    }))
}

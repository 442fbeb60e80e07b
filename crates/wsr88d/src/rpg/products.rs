//! Level III product table.

/// How a product's 8-bit levels map to physical values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataEncoding {
    /// Minimum, increment and level count in threshold halfwords 1-3.
    Digital,
    /// Scale and offset floats in threshold halfwords 1-4.
    ScaleOffset,
    /// Hydrometeor classification categories.
    Hydrometeor,
    /// Sixteen flagged threshold words.
    LegacyThreshold,
}

/// Display form of a product's symbology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductKind {
    Radial,
    Raster,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductInfo {
    pub code: i16,
    /// AWIPS product category, e.g. "N0Q".
    pub mnemonic: &'static str,
    pub name: &'static str,
    pub group: &'static str,
    pub kind: ProductKind,
    pub encoding: DataEncoding,
    /// Bin or cell size in kilometres.
    pub range_resolution_km: f32,
    /// Whether halfword 59 holds an elevation angle.
    pub elevation_based: bool,
}

#[allow(clippy::too_many_arguments)]
const fn product(
    code: i16,
    mnemonic: &'static str,
    name: &'static str,
    group: &'static str,
    kind: ProductKind,
    encoding: DataEncoding,
    range_resolution_km: f32,
    elevation_based: bool,
) -> ProductInfo {
    ProductInfo {
        code,
        mnemonic,
        name,
        group,
        kind,
        encoding,
        range_resolution_km,
        elevation_based,
    }
}

use DataEncoding::*;
use ProductKind::*;

pub static PRODUCTS: &[ProductInfo] = &[
    product(19, "N0R", "Base Reflectivity", "Reflectivity", Radial, LegacyThreshold, 1.0, true),
    product(20, "N0Z", "Base Reflectivity 248 nm", "Reflectivity", Radial, LegacyThreshold, 2.0, true),
    product(27, "N0V", "Base Velocity", "Velocity", Radial, LegacyThreshold, 1.0, true),
    product(30, "NSW", "Base Spectrum Width", "Spectrum Width", Radial, LegacyThreshold, 1.0, true),
    product(37, "NCR", "Composite Reflectivity", "Reflectivity", Raster, LegacyThreshold, 1.0, false),
    product(38, "NCZ", "Composite Reflectivity 248 nm", "Reflectivity", Raster, LegacyThreshold, 4.0, false),
    product(41, "NET", "Echo Tops", "Echo Tops", Raster, LegacyThreshold, 4.0, false),
    product(56, "N0S", "Storm Relative Mean Radial Velocity", "Velocity", Radial, LegacyThreshold, 1.0, true),
    product(57, "NVL", "Vertically Integrated Liquid", "VIL", Raster, LegacyThreshold, 4.0, false),
    product(78, "N1P", "One-Hour Precipitation", "Precipitation", Radial, LegacyThreshold, 2.0, false),
    product(80, "NTP", "Storm Total Precipitation", "Precipitation", Radial, LegacyThreshold, 2.0, false),
    product(94, "N0Q", "Digital Base Reflectivity", "Reflectivity", Radial, Digital, 1.0, true),
    product(99, "N0U", "Digital Base Velocity", "Velocity", Radial, Digital, 0.25, true),
    product(153, "N0B", "Super Resolution Reflectivity", "Reflectivity", Radial, Digital, 0.25, true),
    product(154, "N0G", "Super Resolution Velocity", "Velocity", Radial, Digital, 0.25, true),
    product(155, "NSP", "Super Resolution Spectrum Width", "Spectrum Width", Radial, Digital, 0.25, true),
    product(159, "N0X", "Digital Differential Reflectivity", "Differential Reflectivity", Radial, ScaleOffset, 0.25, true),
    product(161, "N0C", "Digital Correlation Coefficient", "Correlation Coefficient", Radial, ScaleOffset, 0.25, true),
    product(163, "N0K", "Digital Specific Differential Phase", "Specific Differential Phase", Radial, ScaleOffset, 0.25, true),
    product(165, "N0H", "Digital Hydrometeor Classification", "Hydrometeor Classification", Radial, Hydrometeor, 0.25, true),
    product(177, "HHC", "Hybrid Hydrometeor Classification", "Hydrometeor Classification", Radial, Hydrometeor, 0.25, false),
];

pub fn product_info(code: i16) -> Option<&'static ProductInfo> {
    PRODUCTS.iter().find(|p| p.code == code)
}

pub fn product_by_mnemonic(mnemonic: &str) -> Option<&'static ProductInfo> {
    PRODUCTS
        .iter()
        .find(|p| p.mnemonic.eq_ignore_ascii_case(mnemonic))
}

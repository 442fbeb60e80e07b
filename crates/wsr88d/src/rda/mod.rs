//! Level II (RDA) archive decoding.

pub mod ar2v_file;
pub mod digital_radar_data;
pub mod elevation_scan;
pub mod message_header;
pub mod types;
pub mod volume_coverage_pattern;

pub use ar2v_file::{Ar2vFile, VolumeHeader};
pub use digital_radar_data::{
    decode_word, DigitalRadarData, ElevationDataBlock, MomentDataBlock, RadialDataBlock,
    VolumeDataBlock,
};
pub use elevation_scan::ElevationScan;
pub use message_header::MessageHeader;
pub use types::{DataBlockType, RadialStatus};
pub use volume_coverage_pattern::{ElevationCut, VolumeCoveragePattern, WaveformType};

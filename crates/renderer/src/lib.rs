//! CPU-side sweep rendering.
//!
//! - [`color_table`]: palettes mapping decoded gate values to colors
//! - [`sweep`]: gate geometry and colored triangle buffers

pub mod color_table;
pub mod sweep;

pub use color_table::{ColorEntry, ColorTable, ColorTableFile};
pub use sweep::{Gate, SweepBuffer, SweepGeometry, SweepMetadata, VERTICES_PER_GATE};

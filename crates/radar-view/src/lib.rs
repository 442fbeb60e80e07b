//! Per-display sweep computation.
//!
//! A [`RadarProductView`] follows one product selection (moment or Level III
//! product, elevation, time), asks its site's manager for the matching data
//! and publishes colored [`SweepBuffer`](renderer::SweepBuffer)s. Only the
//! result of the newest request is published.

mod compute;
pub mod types;
pub mod view;

pub use types::{ColorTableSource, Selection, ViewEvent, ViewProduct, ViewState};
pub use view::RadarProductView;

//! Core reprojection modules

pub mod geometry;
pub mod resample;
pub mod reproject;

// Re-export main types
pub use geometry::OutputGrid;
pub use reproject::{reproject_raster, ReprojectionOptions, Reprojector};
pub use resample::{BandSampler, ResamplingMethod};

//! hyperwarp: A Fast North-Orienting Raster Reprojector for Hyperspectral Imagery
//!
//! This library reprojects multi-band georeferenced rasters onto axis-aligned,
//! north-up grids in a target coordinate reference system, band by band,
//! preserving band descriptions and nodata semantics.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    BandData, BoundingBox, GeoTransform, RasterProfile, Sample, WarpError, WarpResult,
};

pub use io::{RasterReader, RasterWriter};

pub use crate::core::{
    reproject_raster, OutputGrid, ReprojectionOptions, Reprojector, ResamplingMethod,
};

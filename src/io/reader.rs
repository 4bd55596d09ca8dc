use crate::types::{BandData, GeoTransform, RasterProfile, WarpError, WarpResult};
use gdal::{Dataset, Metadata};
use ndarray::Array2;
use std::path::Path;

/// Read-only view over a georeferenced source raster
///
/// The underlying dataset stays open for the lifetime of the reader and is
/// released when the reader is dropped, on every exit path.
pub struct RasterReader {
    dataset: Dataset,
    profile: RasterProfile,
}

impl RasterReader {
    /// Open a source raster and collect its profile
    pub fn open<P: AsRef<Path>>(path: P) -> WarpResult<Self> {
        let path = path.as_ref();
        log::info!("Opening source raster: {}", path.display());

        let dataset = Dataset::open(path)
            .map_err(|e| WarpError::SourceRead(format!("{}: {}", path.display(), e)))?;

        let (width, height) = dataset.raster_size();
        let band_count = dataset.raster_count() as usize;
        if band_count == 0 {
            return Err(WarpError::SourceRead(format!(
                "{}: raster has no bands",
                path.display()
            )));
        }

        let geo_transform = dataset.geo_transform().map_err(|e| {
            WarpError::SourceRead(format!("{}: missing geotransform: {}", path.display(), e))
        })?;

        let crs_wkt = dataset
            .spatial_ref()
            .and_then(|srs| srs.to_wkt())
            .map_err(|e| {
                WarpError::SourceRead(format!(
                    "{}: missing spatial reference: {}",
                    path.display(),
                    e
                ))
            })?;

        let first_band = dataset
            .rasterband(1)
            .map_err(|e| WarpError::SourceRead(format!("{}: band 1: {}", path.display(), e)))?;
        let nodata = first_band.no_data_value();

        let mut band_descriptions = Vec::with_capacity(band_count);
        for index in 1..=band_count {
            let band = dataset.rasterband(index as isize).map_err(|e| {
                WarpError::SourceRead(format!("{}: band {}: {}", path.display(), index, e))
            })?;
            band_descriptions.push(band.description().unwrap_or_default());
        }

        log::debug!(
            "Source profile: {}x{}, {} bands, nodata {:?}",
            width,
            height,
            band_count,
            nodata
        );

        let profile = RasterProfile {
            width,
            height,
            band_count,
            transform: GeoTransform::from_gdal(geo_transform),
            crs_wkt,
            nodata,
            band_descriptions,
        };

        Ok(Self { dataset, profile })
    }

    /// Georeferencing and band metadata of the source
    pub fn profile(&self) -> &RasterProfile {
        &self.profile
    }

    /// Read one band (1-based) into a row-major array
    pub fn read_band(&self, index: usize) -> WarpResult<BandData> {
        let (width, height) = (self.profile.width, self.profile.height);

        let band = self
            .dataset
            .rasterband(index as isize)
            .map_err(|e| WarpError::SourceRead(format!("band {}: {}", index, e)))?;

        let buffer = band
            .read_as::<f32>((0, 0), (width, height), (width, height), None)
            .map_err(|e| WarpError::SourceRead(format!("band {}: {}", index, e)))?;

        Array2::from_shape_vec((height, width), buffer.data).map_err(|e| {
            WarpError::SourceRead(format!("Failed to reshape band {} data: {}", index, e))
        })
    }
}

use crate::types::{BandData, RasterProfile, WarpError, WarpResult};
use gdal::raster::{Buffer, RasterCreationOption};
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager, Metadata};
use std::path::Path;

/// Write-once GeoTIFF destination sink
///
/// Created only after the destination geometry is resolved; each band is
/// written exactly once, in increasing index order, then the writer is sealed
/// with [`RasterWriter::finish`]. The dataset handle is released when the
/// writer is dropped, including on error paths.
pub struct RasterWriter {
    dataset: Dataset,
    width: usize,
    height: usize,
    nodata: Option<f64>,
}

impl RasterWriter {
    /// Create the destination raster with the given profile
    pub fn create<P: AsRef<Path>>(
        path: P,
        profile: &RasterProfile,
        compression: Option<&str>,
    ) -> WarpResult<Self> {
        let path = path.as_ref();
        log::info!(
            "Creating destination raster: {} ({}x{}, {} bands)",
            path.display(),
            profile.width,
            profile.height,
            profile.band_count
        );

        let driver = DriverManager::get_driver_by_name("GTiff")
            .map_err(|e| WarpError::DestinationWrite(format!("GTiff driver unavailable: {}", e)))?;

        let mut dataset = match compression {
            Some(method) => {
                let options = [RasterCreationOption {
                    key: "COMPRESS",
                    value: method,
                }];
                driver.create_with_band_type_with_options::<f32, _>(
                    path,
                    profile.width as isize,
                    profile.height as isize,
                    profile.band_count as isize,
                    &options,
                )
            }
            None => driver.create_with_band_type::<f32, _>(
                path,
                profile.width as isize,
                profile.height as isize,
                profile.band_count as isize,
            ),
        }
        .map_err(|e| WarpError::DestinationWrite(format!("{}: {}", path.display(), e)))?;

        dataset
            .set_geo_transform(&profile.transform.to_gdal())
            .map_err(|e| WarpError::DestinationWrite(format!("Failed to set geotransform: {}", e)))?;

        let srs = SpatialRef::from_wkt(&profile.crs_wkt).map_err(|e| {
            WarpError::DestinationWrite(format!("Invalid destination spatial reference: {}", e))
        })?;
        dataset.set_spatial_ref(&srs).map_err(|e| {
            WarpError::DestinationWrite(format!("Failed to set spatial reference: {}", e))
        })?;

        Ok(Self {
            dataset,
            width: profile.width,
            height: profile.height,
            nodata: profile.nodata,
        })
    }

    /// Write one band (1-based) with its description
    pub fn write_band(&mut self, index: usize, data: &BandData, description: &str) -> WarpResult<()> {
        let (rows, cols) = data.dim();
        if rows != self.height || cols != self.width {
            return Err(WarpError::DestinationWrite(format!(
                "Band {} shape {}x{} does not match destination grid {}x{}",
                index, rows, cols, self.height, self.width
            )));
        }

        let mut band = self
            .dataset
            .rasterband(index as isize)
            .map_err(|e| WarpError::DestinationWrite(format!("band {}: {}", index, e)))?;

        let flat: Vec<f32> = data.iter().cloned().collect();
        let buffer = Buffer::new((self.width, self.height), flat);
        band.write((0, 0), (self.width, self.height), &buffer)
            .map_err(|e| WarpError::DestinationWrite(format!("band {}: {}", index, e)))?;

        if let Some(nodata) = self.nodata {
            band.set_no_data_value(Some(nodata))
                .map_err(|e| WarpError::DestinationWrite(format!("band {}: {}", index, e)))?;
        }
        if !description.is_empty() {
            band.set_description(description)
                .map_err(|e| WarpError::DestinationWrite(format!("band {}: {}", index, e)))?;
        }

        Ok(())
    }

    /// Flush caches and seal the destination
    pub fn finish(mut self) -> WarpResult<()> {
        self.dataset.flush_cache();
        Ok(())
    }
}

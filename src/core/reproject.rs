use crate::core::geometry::{self, OutputGrid};
use crate::core::resample::{BandSampler, ResamplingMethod};
use crate::io::{RasterReader, RasterWriter};
use crate::types::{BandData, GeoTransform, RasterProfile, WarpError, WarpResult};
use gdal::spatial_ref::CoordTransform;
use ndarray::Array2;
use std::path::Path;

/// Reprojection parameters
///
/// Every optional field documents its default-derivation rule; the explicit
/// struct replaces per-call default arguments.
#[derive(Debug, Clone)]
pub struct ReprojectionOptions {
    /// Destination CRS definition (authority:code, WKT or PROJ string).
    /// Default: the source CRS, in which case the output is only north
    /// oriented onto an axis-aligned grid.
    pub target_crs: Option<String>,
    /// Resampling kernel
    pub resampling: ResamplingMethod,
    /// Output (x, y) pixel size in destination CRS units.
    /// Default: the source pixel size taken from the transform scale terms.
    pub resolution: Option<(f64, f64)>,
    /// Log a progress line after each completed band
    pub progress: bool,
    /// GeoTIFF COMPRESS creation option
    pub compression: Option<String>,
}

impl Default for ReprojectionOptions {
    fn default() -> Self {
        Self {
            target_crs: None,
            resampling: ResamplingMethod::Nearest,
            resolution: None,
            progress: true,
            compression: Some("LZW".to_string()),
        }
    }
}

impl ReprojectionOptions {
    /// Eager parameter validation, performed before any raster is opened
    pub fn validate(&self) -> WarpResult<()> {
        if let Some((x_res, y_res)) = self.resolution {
            if !(x_res.is_finite() && y_res.is_finite() && x_res > 0.0 && y_res > 0.0) {
                return Err(WarpError::InvalidParameter(format!(
                    "Resolution must be a pair of positive finite numbers, got ({}, {})",
                    x_res, y_res
                )));
            }
        }
        if let Some(definition) = &self.target_crs {
            geometry::parse_crs(definition)?;
        }
        Ok(())
    }
}

/// Per-band reprojection engine with resolved destination geometry
///
/// Construction negotiates the destination grid; [`Reprojector::warp_band`]
/// then resamples arrays onto it without touching the filesystem. The
/// file-to-file pipeline is [`reproject_raster`].
pub struct Reprojector {
    src_transform: GeoTransform,
    src_width: usize,
    src_height: usize,
    grid: OutputGrid,
    dst_wkt: String,
    dst_to_src: CoordTransform,
    resampling: ResamplingMethod,
    nodata: Option<f64>,
    window: (usize, usize),
}

impl Reprojector {
    /// Resolve the destination geometry for a source profile
    pub fn new(profile: &RasterProfile, options: &ReprojectionOptions) -> WarpResult<Self> {
        options.validate()?;

        let src_srs = gdal::spatial_ref::SpatialRef::from_wkt(&profile.crs_wkt)
            .map_err(|e| WarpError::SourceRead(format!("Source spatial reference: {}", e)))?;
        geometry::set_traditional_axis_order(&src_srs);

        let dst_srs = match &options.target_crs {
            Some(definition) => geometry::parse_crs(definition)?,
            None => src_srs.clone(),
        };
        let dst_wkt = dst_srs.to_wkt()?;

        let resolution = options
            .resolution
            .unwrap_or_else(|| profile.transform.scaling());

        let src_to_dst = CoordTransform::new(&src_srs, &dst_srs)?;
        let grid = geometry::suggested_output_grid(
            &profile.transform,
            profile.width,
            profile.height,
            &src_to_dst,
            resolution,
        )?;

        let dst_to_src = CoordTransform::new(&dst_srs, &src_srs)?;
        let window = aggregation_window(&grid, &dst_to_src, &profile.transform);

        log::info!(
            "Destination grid: {}x{} pixels at ({}, {})",
            grid.width,
            grid.height,
            resolution.0,
            resolution.1
        );

        Ok(Self {
            src_transform: profile.transform,
            src_width: profile.width,
            src_height: profile.height,
            grid,
            dst_wkt,
            dst_to_src,
            resampling: options.resampling,
            nodata: profile.nodata,
            window,
        })
    }

    /// Destination grid geometry resolved for this reprojection
    pub fn grid(&self) -> &OutputGrid {
        &self.grid
    }

    /// Destination profile: source metadata carried onto the new grid
    pub fn output_profile(&self, source: &RasterProfile) -> RasterProfile {
        RasterProfile {
            width: self.grid.width,
            height: self.grid.height,
            band_count: source.band_count,
            transform: self.grid.transform,
            crs_wkt: self.dst_wkt.clone(),
            nodata: source.nodata,
            band_descriptions: source.band_descriptions.clone(),
        }
    }

    /// Resample one source band onto the destination grid
    ///
    /// Destination pixels mapping outside the source footprint are filled
    /// with the source nodata value (0.0 when the source defines none).
    pub fn warp_band(&self, band: &BandData) -> WarpResult<BandData> {
        let (rows, cols) = band.dim();
        if rows != self.src_height || cols != self.src_width {
            return Err(WarpError::InvalidParameter(format!(
                "Band shape {}x{} does not match source grid {}x{}",
                rows, cols, self.src_height, self.src_width
            )));
        }

        let fill = self.nodata.and_then(num_traits::cast).unwrap_or(0.0);
        let sampler = BandSampler::new(band, self.nodata.and_then(num_traits::cast), self.window);

        let width = self.grid.width;
        let mut output = Array2::from_elem((self.grid.height, width), fill);
        let mut xs = vec![0.0f64; width];
        let mut ys = vec![0.0f64; width];
        let mut zs = vec![0.0f64; width];

        for row in 0..self.grid.height {
            for col in 0..width {
                let (x, y) = self
                    .grid
                    .transform
                    .pixel_to_geo(col as f64 + 0.5, row as f64 + 0.5);
                xs[col] = x;
                ys[col] = y;
                zs[col] = 0.0;
            }

            // One transform call per row; a failing batch degrades to
            // per-pixel transforms so a single unprojectable point does not
            // poison the whole row.
            let batch_ok = self
                .dst_to_src
                .transform_coords(&mut xs, &mut ys, &mut zs)
                .is_ok();

            for col in 0..width {
                let (src_x, src_y) = if batch_ok {
                    (xs[col], ys[col])
                } else {
                    let (x, y) = self
                        .grid
                        .transform
                        .pixel_to_geo(col as f64 + 0.5, row as f64 + 0.5);
                    let mut px = [x];
                    let mut py = [y];
                    let mut pz = [0.0];
                    if self
                        .dst_to_src
                        .transform_coords(&mut px, &mut py, &mut pz)
                        .is_err()
                    {
                        continue;
                    }
                    (px[0], py[0])
                };

                let (src_col, src_row) = self.src_transform.geo_to_pixel(src_x, src_y);
                if let Some(value) = sampler.sample(src_col, src_row, self.resampling) {
                    output[[row, col]] = value;
                }
            }
        }

        Ok(output)
    }
}

/// Reproject and north orient a raster file into a new GeoTIFF
///
/// Parameter validation happens before any raster is opened; on an
/// `InvalidParameter` error the destination is never created. Bands are
/// processed sequentially in increasing index order, each written exactly
/// once, with band descriptions and nodata carried over from the source.
pub fn reproject_raster<P, Q>(input: P, output: Q, options: &ReprojectionOptions) -> WarpResult<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    options.validate()?;

    let reader = RasterReader::open(input.as_ref())?;
    let reprojector = Reprojector::new(reader.profile(), options)?;
    let profile = reprojector.output_profile(reader.profile());

    let mut writer = RasterWriter::create(output.as_ref(), &profile, options.compression.as_deref())?;

    let band_count = profile.band_count;
    for index in 1..=band_count {
        let source_band = reader.read_band(index)?;
        let warped = reprojector.warp_band(&source_band)?;
        writer.write_band(index, &warped, &profile.band_descriptions[index - 1])?;

        if options.progress {
            log::info!("Reprojected band {}/{}", index, band_count);
        }
    }

    writer.finish()?;
    log::info!("✅ Reprojection completed: {}", output.as_ref().display());

    Ok(())
}

/// Contributing source window for the aggregating kernels, measured from the
/// pixel step at the center of the destination grid
fn aggregation_window(
    grid: &OutputGrid,
    dst_to_src: &CoordTransform,
    src_transform: &GeoTransform,
) -> (usize, usize) {
    let center = (grid.width as f64 / 2.0, grid.height as f64 / 2.0);

    let probe = |col: f64, row: f64| -> Option<(f64, f64)> {
        let (x, y) = grid.transform.pixel_to_geo(col, row);
        let mut xs = [x];
        let mut ys = [y];
        let mut zs = [0.0];
        dst_to_src.transform_coords(&mut xs, &mut ys, &mut zs).ok()?;
        let (src_col, src_row) = src_transform.geo_to_pixel(xs[0], ys[0]);
        (src_col.is_finite() && src_row.is_finite()).then_some((src_col, src_row))
    };

    match (
        probe(center.0, center.1),
        probe(center.0 + 1.0, center.1),
        probe(center.0, center.1 + 1.0),
    ) {
        (Some(origin), Some(col_step), Some(row_step)) => {
            let wx = (col_step.0 - origin.0).hypot(col_step.1 - origin.1);
            let wy = (row_step.0 - origin.0).hypot(row_step.1 - origin.1);
            (wx.round().max(1.0) as usize, wy.round().max(1.0) as usize)
        }
        _ => (1, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ReprojectionOptions::default();
        assert!(options.target_crs.is_none());
        assert_eq!(options.resampling, ResamplingMethod::Nearest);
        assert!(options.resolution.is_none());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_resolution() {
        for resolution in [(0.0, 0.01), (-1.0, 1.0), (f64::NAN, 1.0), (1.0, f64::INFINITY)] {
            let options = ReprojectionOptions {
                resolution: Some(resolution),
                ..Default::default()
            };
            let err = options.validate().unwrap_err();
            assert!(matches!(err, WarpError::InvalidParameter(_)));
        }
    }

    #[test]
    fn test_validate_rejects_bad_crs() {
        let options = ReprojectionOptions {
            target_crs: Some("not_a_crs".to_string()),
            ..Default::default()
        };
        let err = options.validate().unwrap_err();
        assert!(matches!(err, WarpError::InvalidParameter(_)));
    }

    #[test]
    fn test_warp_band_identity() {
        let profile = RasterProfile {
            width: 8,
            height: 6,
            band_count: 1,
            transform: GeoTransform::north_up(10.0, 45.0, 0.01, 0.01),
            crs_wkt: gdal::spatial_ref::SpatialRef::from_epsg(4326)
                .unwrap()
                .to_wkt()
                .unwrap(),
            nodata: Some(-9999.0),
            band_descriptions: vec![String::new()],
        };
        let reprojector = Reprojector::new(&profile, &ReprojectionOptions::default()).unwrap();
        assert_eq!(reprojector.grid().width, 8);
        assert_eq!(reprojector.grid().height, 6);

        let band =
            Array2::from_shape_fn((6, 8), |(r, c)| (r * 8 + c) as crate::types::Sample);
        let warped = reprojector.warp_band(&band).unwrap();

        assert_eq!(warped, band);
    }

    #[test]
    fn test_warp_band_rejects_wrong_shape() {
        let profile = RasterProfile {
            width: 8,
            height: 6,
            band_count: 1,
            transform: GeoTransform::north_up(10.0, 45.0, 0.01, 0.01),
            crs_wkt: gdal::spatial_ref::SpatialRef::from_epsg(4326)
                .unwrap()
                .to_wkt()
                .unwrap(),
            nodata: None,
            band_descriptions: vec![String::new()],
        };
        let reprojector = Reprojector::new(&profile, &ReprojectionOptions::default()).unwrap();

        let band = Array2::zeros((3, 3));
        let err = reprojector.warp_band(&band).unwrap_err();
        assert!(matches!(err, WarpError::InvalidParameter(_)));
    }
}

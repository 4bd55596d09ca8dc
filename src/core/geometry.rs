use crate::types::{BoundingBox, GeoTransform, WarpError, WarpResult};
use gdal::spatial_ref::{CoordTransform, SpatialRef};

/// Points sampled along each source edge when projecting the footprint
const BOUNDARY_DENSIFY_POINTS: usize = 21;

/// Resolved destination grid geometry
#[derive(Debug, Clone)]
pub struct OutputGrid {
    pub transform: GeoTransform,
    pub width: usize,
    pub height: usize,
}

/// Parse a user-supplied CRS definition (authority:code, WKT or PROJ string)
///
/// Unparsable definitions fail with `InvalidParameter`.
pub fn parse_crs(definition: &str) -> WarpResult<SpatialRef> {
    let srs = SpatialRef::from_definition(definition).map_err(|e| {
        WarpError::InvalidParameter(format!("Unparsable CRS '{}': {}", definition, e))
    })?;
    set_traditional_axis_order(&srs);
    Ok(srs)
}

/// Force x=easting/longitude, y=northing/latitude regardless of the CRS
/// authority's declared axis order
pub fn set_traditional_axis_order(srs: &SpatialRef) {
    srs.set_axis_mapping_strategy(gdal_sys::OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER);
}

/// Compute the minimal north-up destination grid covering the reprojected
/// source footprint at the given resolution
///
/// The source boundary is densified, mapped through the source transform and
/// the src->dst coordinate transform, and the bounding box of the finite
/// results is gridded at `resolution` with the origin at the top-left corner
/// (negative y scale, zero rotation).
pub fn suggested_output_grid(
    src_transform: &GeoTransform,
    src_width: usize,
    src_height: usize,
    src_to_dst: &CoordTransform,
    resolution: (f64, f64),
) -> WarpResult<OutputGrid> {
    let mut bbox = BoundingBox::empty();

    for (col, row) in densified_boundary(src_width, src_height, BOUNDARY_DENSIFY_POINTS) {
        let (x, y) = src_transform.pixel_to_geo(col, row);
        let mut xs = [x];
        let mut ys = [y];
        let mut zs = [0.0];
        // Points outside the target projection domain are skipped; the grid
        // covers whatever part of the footprint is representable.
        if src_to_dst.transform_coords(&mut xs, &mut ys, &mut zs).is_err() {
            continue;
        }
        if xs[0].is_finite() && ys[0].is_finite() {
            bbox.include(xs[0], ys[0]);
        }
    }

    if bbox.is_empty() {
        return Err(WarpError::InvalidParameter(
            "Source extent cannot be represented in the target CRS".to_string(),
        ));
    }

    let (x_res, y_res) = resolution;
    let width = pixel_span(bbox.width(), x_res);
    let height = pixel_span(bbox.height(), y_res);
    let transform = GeoTransform::north_up(bbox.min_x, bbox.max_y, x_res, y_res);

    log::debug!(
        "Suggested grid: {}x{} at ({}, {}), bounds {:?}",
        width,
        height,
        x_res,
        y_res,
        bbox
    );

    Ok(OutputGrid {
        transform,
        width,
        height,
    })
}

/// Smallest pixel count covering `span`, tolerating float noise so an exact
/// multiple of the resolution does not gain a pixel
fn pixel_span(span: f64, resolution: f64) -> usize {
    ((span / resolution) - 1e-8).ceil().max(1.0) as usize
}

/// Corner-inclusive pixel coordinates along all four edges of a raster
fn densified_boundary(
    width: usize,
    height: usize,
    points_per_edge: usize,
) -> Vec<(f64, f64)> {
    let w = width as f64;
    let h = height as f64;
    let steps = (points_per_edge - 1).max(1) as f64;

    let mut boundary = Vec::with_capacity(points_per_edge * 4);
    for i in 0..points_per_edge {
        let t = i as f64 / steps;
        boundary.push((t * w, 0.0)); // top
        boundary.push((t * w, h)); // bottom
        boundary.push((0.0, t * h)); // left
        boundary.push((w, t * h)); // right
    }
    boundary
}

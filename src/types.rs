use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Real-valued raster sample type used throughout the pipeline
pub type Sample = f32;

/// 2D band data array (rows x cols)
pub type BandData = Array2<Sample>;

/// Affine transformation coefficients mapping pixel (col, row) to
/// georeferenced (x, y) coordinates, in GDAL coefficient order:
///
/// ```text
/// x = top_left_x + col * pixel_width + row * rotation_x
/// y = top_left_y + col * rotation_y + row * pixel_height
/// ```
///
/// North-up rasters have zero rotation terms and negative `pixel_height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Create an axis-aligned north-up transform from an origin and pixel size
    pub fn north_up(top_left_x: f64, top_left_y: f64, x_res: f64, y_res: f64) -> Self {
        Self {
            top_left_x,
            pixel_width: x_res,
            rotation_x: 0.0,
            top_left_y,
            rotation_y: 0.0,
            pixel_height: -y_res,
        }
    }

    /// Create from a GDAL-style coefficient array
    pub fn from_gdal(coeffs: [f64; 6]) -> Self {
        Self {
            top_left_x: coeffs[0],
            pixel_width: coeffs[1],
            rotation_x: coeffs[2],
            top_left_y: coeffs[3],
            rotation_y: coeffs[4],
            pixel_height: coeffs[5],
        }
    }

    /// Convert to a GDAL-style coefficient array
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.top_left_x,
            self.pixel_width,
            self.rotation_x,
            self.top_left_y,
            self.rotation_y,
            self.pixel_height,
        ]
    }

    /// Map fractional pixel coordinates to georeferenced coordinates
    pub fn pixel_to_geo(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.top_left_x + col * self.pixel_width + row * self.rotation_x;
        let y = self.top_left_y + col * self.rotation_y + row * self.pixel_height;
        (x, y)
    }

    /// Map georeferenced coordinates to fractional pixel coordinates
    ///
    /// Inverts the full affine, including rotation terms. Returns NaN
    /// coordinates for a degenerate transform.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let det = self.pixel_width * self.pixel_height - self.rotation_x * self.rotation_y;

        if det.abs() < 1e-10 {
            return (f64::NAN, f64::NAN);
        }

        let dx = x - self.top_left_x;
        let dy = y - self.top_left_y;

        let col = (self.pixel_height * dx - self.rotation_x * dy) / det;
        let row = (self.pixel_width * dy - self.rotation_y * dx) / det;

        (col, row)
    }

    /// Pixel size from the absolute scale coefficients
    ///
    /// Rotation terms are not folded in; for rotated transforms this is the
    /// scale extraction only.
    pub fn scaling(&self) -> (f64, f64) {
        (self.pixel_width.abs(), self.pixel_height.abs())
    }

    /// Whether the transform is axis-aligned with row 0 at the top
    pub fn is_north_up(&self) -> bool {
        self.rotation_x.abs() < 1e-10 && self.rotation_y.abs() < 1e-10 && self.pixel_height < 0.0
    }

    /// Georeferenced bounding box of a raster with these dimensions
    pub fn bounds(&self, width: usize, height: usize) -> BoundingBox {
        let mut bbox = BoundingBox::empty();
        for (col, row) in [
            (0.0, 0.0),
            (width as f64, 0.0),
            (0.0, height as f64),
            (width as f64, height as f64),
        ] {
            let (x, y) = self.pixel_to_geo(col, row);
            bbox.include(x, y);
        }
        bbox
    }
}

/// Georeferenced bounding box in CRS units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// An inverted box that any `include` call will snap to a point
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Grow the box to contain a point
    pub fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Width in CRS units
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height in CRS units
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Whether no point has been included yet
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }
}

/// Georeferencing and band metadata shared between a source raster and the
/// destination created from it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterProfile {
    pub width: usize,
    pub height: usize,
    pub band_count: usize,
    pub transform: GeoTransform,
    /// CRS as WKT, obtained from or written to the dataset
    pub crs_wkt: String,
    pub nodata: Option<f64>,
    /// One entry per band, positionally; empty strings for unnamed bands
    pub band_descriptions: Vec<String>,
}

/// Error types for raster reprojection
#[derive(Debug, thiserror::Error)]
pub enum WarpError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Failed to read source raster: {0}")]
    SourceRead(String),

    #[error("Failed to write destination raster: {0}")]
    DestinationWrite(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

/// Result type for reprojection operations
pub type WarpResult<T> = Result<T, WarpError>;

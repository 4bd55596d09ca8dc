use crate::types::{BandData, Sample, WarpError, WarpResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Available resampling kernels
///
/// This is the closed set accepted by the reprojector; string lookup goes
/// through [`ResamplingMethod::from_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResamplingMethod {
    /// Nearest neighbour (value-preserving)
    Nearest,
    /// Weighted average of the 2x2 neighbourhood
    Bilinear,
    /// Cubic convolution over a 4x4 neighbourhood
    Cubic,
    /// Cubic B-spline over a 4x4 neighbourhood (smoothing)
    CubicSpline,
    /// Lanczos windowed sinc over a 6x6 neighbourhood
    Lanczos,
    /// Mean of the contributing source window
    Average,
    /// Most frequent value in the contributing source window
    Mode,
    /// Minimum of the contributing source window
    Min,
    /// Maximum of the contributing source window
    Max,
}

impl ResamplingMethod {
    /// Every supported method, in lookup order
    pub const ALL: [ResamplingMethod; 9] = [
        ResamplingMethod::Nearest,
        ResamplingMethod::Bilinear,
        ResamplingMethod::Cubic,
        ResamplingMethod::CubicSpline,
        ResamplingMethod::Lanczos,
        ResamplingMethod::Average,
        ResamplingMethod::Mode,
        ResamplingMethod::Min,
        ResamplingMethod::Max,
    ];

    /// Canonical lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            ResamplingMethod::Nearest => "nearest",
            ResamplingMethod::Bilinear => "bilinear",
            ResamplingMethod::Cubic => "cubic",
            ResamplingMethod::CubicSpline => "cubic_spline",
            ResamplingMethod::Lanczos => "lanczos",
            ResamplingMethod::Average => "average",
            ResamplingMethod::Mode => "mode",
            ResamplingMethod::Min => "min",
            ResamplingMethod::Max => "max",
        }
    }

    /// Look up a method by name
    ///
    /// Unknown names fail with `InvalidParameter` listing the supported set.
    pub fn from_name(name: &str) -> WarpResult<Self> {
        for method in Self::ALL {
            if method.name() == name {
                return Ok(method);
            }
        }
        let supported: Vec<&str> = Self::ALL.iter().map(|m| m.name()).collect();
        Err(WarpError::InvalidParameter(format!(
            "Invalid resampling method '{}'. Supported methods: {}",
            name,
            supported.join(", ")
        )))
    }
}

impl std::fmt::Display for ResamplingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ResamplingMethod {
    type Err = WarpError;

    fn from_str(s: &str) -> WarpResult<Self> {
        Self::from_name(s)
    }
}

/// Nodata-aware sampler over a single source band
///
/// Coordinates are fractional source pixel coordinates where (0.5, 0.5) is
/// the center of the top-left pixel. `sample` returns `None` for positions
/// outside the band or whose kernel support touches nodata; the caller fills
/// those with the destination nodata value.
pub struct BandSampler<'a> {
    band: &'a BandData,
    nodata: Option<Sample>,
    /// Contributing source window (cols, rows) for the aggregating kernels
    window: (usize, usize),
}

impl<'a> BandSampler<'a> {
    pub fn new(band: &'a BandData, nodata: Option<Sample>, window: (usize, usize)) -> Self {
        Self {
            band,
            nodata,
            window: (window.0.max(1), window.1.max(1)),
        }
    }

    /// Sample the band at fractional pixel coordinates with the given kernel
    pub fn sample(&self, col: f64, row: f64, method: ResamplingMethod) -> Option<Sample> {
        let (rows, cols) = self.band.dim();
        if !col.is_finite() || !row.is_finite() {
            return None;
        }
        if col < 0.0 || row < 0.0 || col >= cols as f64 || row >= rows as f64 {
            return None;
        }

        match method {
            ResamplingMethod::Nearest => self.nearest(col, row),
            ResamplingMethod::Bilinear => self.bilinear(col, row),
            ResamplingMethod::Cubic => self.convolve(col, row, 2, cubic_weight),
            ResamplingMethod::CubicSpline => self.convolve(col, row, 2, bspline_weight),
            ResamplingMethod::Lanczos => self.convolve(col, row, 3, lanczos_weight),
            ResamplingMethod::Average => self.average(col, row),
            ResamplingMethod::Mode => self.mode(col, row),
            ResamplingMethod::Min => self.min(col, row),
            ResamplingMethod::Max => self.max(col, row),
        }
    }

    fn valid(&self, value: Sample) -> bool {
        if value.is_nan() {
            return false;
        }
        match self.nodata {
            Some(nodata) => value != nodata,
            None => true,
        }
    }

    fn nearest(&self, col: f64, row: f64) -> Option<Sample> {
        let (rows, cols) = self.band.dim();
        let c = (col.floor() as usize).min(cols - 1);
        let r = (row.floor() as usize).min(rows - 1);
        let value = self.band[[r, c]];
        self.valid(value).then_some(value)
    }

    fn bilinear(&self, col: f64, row: f64) -> Option<Sample> {
        let (rows, cols) = self.band.dim();

        // Interpolate between pixel centers
        let u = (col - 0.5).clamp(0.0, (cols - 1) as f64);
        let v = (row - 0.5).clamp(0.0, (rows - 1) as f64);

        let x1 = u.floor() as usize;
        let y1 = v.floor() as usize;
        let x2 = (x1 + 1).min(cols - 1);
        let y2 = (y1 + 1).min(rows - 1);

        let dx = u - x1 as f64;
        let dy = v - y1 as f64;

        let v11 = self.band[[y1, x1]];
        let v21 = self.band[[y1, x2]];
        let v12 = self.band[[y2, x1]];
        let v22 = self.band[[y2, x2]];

        if !self.valid(v11) || !self.valid(v21) || !self.valid(v12) || !self.valid(v22) {
            return None;
        }

        let interpolated = v11 as f64 * (1.0 - dx) * (1.0 - dy)
            + v21 as f64 * dx * (1.0 - dy)
            + v12 as f64 * (1.0 - dx) * dy
            + v22 as f64 * dx * dy;

        Some(interpolated as Sample)
    }

    /// Separable convolution with `2 * radius` taps per axis, edge-clamped
    fn convolve(&self, col: f64, row: f64, radius: isize, weight: fn(f64) -> f64) -> Option<Sample> {
        let (rows, cols) = self.band.dim();
        let u = col - 0.5;
        let v = row - 0.5;
        let base_x = u.floor() as isize;
        let base_y = v.floor() as isize;

        let mut value_sum = 0.0f64;
        let mut weight_sum = 0.0f64;

        for ky in (base_y - radius + 1)..=(base_y + radius) {
            let wy = weight(v - ky as f64);
            if wy == 0.0 {
                continue;
            }
            let y = ky.clamp(0, rows as isize - 1) as usize;
            for kx in (base_x - radius + 1)..=(base_x + radius) {
                let wx = weight(u - kx as f64);
                if wx == 0.0 {
                    continue;
                }
                let x = kx.clamp(0, cols as isize - 1) as usize;
                let tap = self.band[[y, x]];
                if !self.valid(tap) {
                    return None;
                }
                value_sum += tap as f64 * wx * wy;
                weight_sum += wx * wy;
            }
        }

        if weight_sum.abs() < f64::EPSILON {
            return None;
        }
        Some((value_sum / weight_sum) as Sample)
    }

    /// Valid values in the contributing window centered on (col, row)
    fn window_values(&self, col: f64, row: f64) -> Vec<Sample> {
        let (rows, cols) = self.band.dim();
        let (wx, wy) = self.window;

        let c0 = (col - wx as f64 / 2.0).floor().max(0.0) as usize;
        let r0 = (row - wy as f64 / 2.0).floor().max(0.0) as usize;
        let c1 = (c0 + wx).min(cols);
        let r1 = (r0 + wy).min(rows);

        let mut values = Vec::with_capacity(wx * wy);
        for r in r0..r1 {
            for c in c0..c1 {
                let value = self.band[[r, c]];
                if self.valid(value) {
                    values.push(value);
                }
            }
        }
        values
    }

    fn average(&self, col: f64, row: f64) -> Option<Sample> {
        let values = self.window_values(col, row);
        if values.is_empty() {
            return None;
        }
        let sum: f64 = values.iter().map(|&v| v as f64).sum();
        Some((sum / values.len() as f64) as Sample)
    }

    fn mode(&self, col: f64, row: f64) -> Option<Sample> {
        let values = self.window_values(col, row);
        if values.is_empty() {
            return None;
        }
        let mut counts: HashMap<u32, usize> = HashMap::new();
        let mut best = values[0];
        let mut best_count = 0usize;
        for &value in &values {
            let count = counts.entry(value.to_bits()).or_insert(0);
            *count += 1;
            if *count > best_count {
                best_count = *count;
                best = value;
            }
        }
        Some(best)
    }

    fn min(&self, col: f64, row: f64) -> Option<Sample> {
        self.window_values(col, row)
            .into_iter()
            .fold(None, |acc: Option<Sample>, v| {
                Some(acc.map_or(v, |a| a.min(v)))
            })
    }

    fn max(&self, col: f64, row: f64) -> Option<Sample> {
        self.window_values(col, row)
            .into_iter()
            .fold(None, |acc: Option<Sample>, v| {
                Some(acc.map_or(v, |a| a.max(v)))
            })
    }
}

/// Keys cubic convolution weight (a = -0.5)
fn cubic_weight(t: f64) -> f64 {
    let a = -0.5;
    let t = t.abs();
    if t <= 1.0 {
        (a + 2.0) * t * t * t - (a + 3.0) * t * t + 1.0
    } else if t < 2.0 {
        a * t * t * t - 5.0 * a * t * t + 8.0 * a * t - 4.0 * a
    } else {
        0.0
    }
}

/// Cubic B-spline weight
fn bspline_weight(t: f64) -> f64 {
    let t = t.abs();
    if t < 1.0 {
        2.0 / 3.0 - t * t + t * t * t / 2.0
    } else if t < 2.0 {
        let s = 2.0 - t;
        s * s * s / 6.0
    } else {
        0.0
    }
}

/// Lanczos windowed sinc weight (a = 3)
fn lanczos_weight(t: f64) -> f64 {
    const A: f64 = 3.0;
    if t == 0.0 {
        return 1.0;
    }
    let t_abs = t.abs();
    if t_abs >= A {
        return 0.0;
    }
    let pt = std::f64::consts::PI * t;
    A * pt.sin() * (pt / A).sin() / (pt * pt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array;

    fn ramp_band() -> BandData {
        // 4x4 ramp: value = row * 10 + col
        Array::from_shape_fn((4, 4), |(r, c)| (r * 10 + c) as Sample)
    }

    #[test]
    fn test_from_name_valid() {
        assert_eq!(
            ResamplingMethod::from_name("nearest").unwrap(),
            ResamplingMethod::Nearest
        );
        assert_eq!(
            ResamplingMethod::from_name("cubic_spline").unwrap(),
            ResamplingMethod::CubicSpline
        );
        for method in ResamplingMethod::ALL {
            assert_eq!(ResamplingMethod::from_name(method.name()).unwrap(), method);
        }
    }

    #[test]
    fn test_from_name_invalid_lists_methods() {
        let err = ResamplingMethod::from_name("not_a_method").unwrap_err();
        match err {
            WarpError::InvalidParameter(message) => {
                assert!(message.contains("not_a_method"));
                assert!(message.contains("nearest"));
                assert!(message.contains("bilinear"));
            }
            other => panic!("Expected InvalidParameter, got {:?}", other),
        }
    }

    #[test]
    fn test_nearest_picks_containing_pixel() {
        let band = ramp_band();
        let sampler = BandSampler::new(&band, None, (1, 1));

        // (1.3, 2.8) lies inside pixel col 1, row 2
        let value = sampler
            .sample(1.3, 2.8, ResamplingMethod::Nearest)
            .unwrap();
        assert_eq!(value, 21.0);
    }

    #[test]
    fn test_bilinear_on_ramp_is_exact() {
        let band = ramp_band();
        let sampler = BandSampler::new(&band, None, (1, 1));

        // A linear ramp is reproduced exactly by bilinear interpolation
        let value = sampler
            .sample(2.0, 2.0, ResamplingMethod::Bilinear)
            .unwrap();
        assert_relative_eq!(value as f64, 16.5, epsilon = 1e-6);
    }

    #[test]
    fn test_bilinear_rejects_nodata_corner() {
        let mut band = ramp_band();
        band[[1, 1]] = -9999.0;
        let sampler = BandSampler::new(&band, Some(-9999.0), (1, 1));

        assert!(sampler.sample(1.9, 1.9, ResamplingMethod::Bilinear).is_none());
        // Far from the hole the kernel support is clean
        assert!(sampler.sample(3.5, 3.5, ResamplingMethod::Bilinear).is_some());
    }

    #[test]
    fn test_cubic_preserves_constant_field() {
        let band = Array::from_elem((6, 6), 7.0 as Sample);
        let sampler = BandSampler::new(&band, None, (1, 1));

        for method in [
            ResamplingMethod::Cubic,
            ResamplingMethod::CubicSpline,
            ResamplingMethod::Lanczos,
        ] {
            let value = sampler.sample(3.2, 2.7, method).unwrap();
            assert_relative_eq!(value as f64, 7.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_average_window_skips_nodata() {
        let mut band = ramp_band();
        band[[0, 0]] = -9999.0;
        let sampler = BandSampler::new(&band, Some(-9999.0), (2, 2));

        // Window over the top-left 2x2 block: one nodata, three valid
        let value = sampler.sample(1.0, 1.0, ResamplingMethod::Average).unwrap();
        assert_relative_eq!(value as f64, (1.0 + 10.0 + 11.0) / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_mode_majority() {
        let band =
            Array::from_shape_vec((2, 2), vec![5.0, 5.0, 3.0, 5.0]).unwrap();
        let sampler = BandSampler::new(&band, None, (2, 2));

        let value = sampler.sample(1.0, 1.0, ResamplingMethod::Mode).unwrap();
        assert_eq!(value, 5.0);
    }

    #[test]
    fn test_min_max_window() {
        let band = ramp_band();
        let sampler = BandSampler::new(&band, None, (2, 2));

        assert_eq!(sampler.sample(1.0, 1.0, ResamplingMethod::Min).unwrap(), 0.0);
        assert_eq!(sampler.sample(1.0, 1.0, ResamplingMethod::Max).unwrap(), 11.0);
    }

    #[test]
    fn test_outside_is_none() {
        let band = ramp_band();
        let sampler = BandSampler::new(&band, None, (1, 1));

        assert!(sampler.sample(-0.1, 2.0, ResamplingMethod::Nearest).is_none());
        assert!(sampler.sample(2.0, 4.0, ResamplingMethod::Nearest).is_none());
        assert!(sampler
            .sample(f64::NAN, 2.0, ResamplingMethod::Nearest)
            .is_none());
    }

    #[test]
    fn test_all_nodata_window_is_none() {
        let band = Array::from_elem((3, 3), -9999.0 as Sample);
        let sampler = BandSampler::new(&band, Some(-9999.0), (3, 3));

        assert!(sampler.sample(1.5, 1.5, ResamplingMethod::Average).is_none());
        assert!(sampler.sample(1.5, 1.5, ResamplingMethod::Mode).is_none());
        assert!(sampler.sample(1.5, 1.5, ResamplingMethod::Min).is_none());
    }
}

//! Particle location on a single plane.
//!
//! A compact version of the classic Crocker–Grier pipeline:
//!
//! 1. Bandpass: Gaussian smoothing with σ = `noise_size` minus a boxcar
//!    background of width `2·radius + 1`, negatives clipped to zero.
//! 2. Candidate peaks: 3×3 local maxima at least `radius` pixels from the
//!    border, merged greedily (brightest first) so that no two survivors
//!    are closer than `separation`.
//! 3. Refinement: mass, centroid and radius of gyration inside a circular
//!    mask of `radius`; the mask is re-centred once when the centroid is
//!    more than half a pixel off.
//! 4. Features with `mass < minmass` are dropped.

use crate::error::{FrameError, Result};
use crate::frame::Frame;
use crate::pipeline::{Parameter, ParameterValues};
use log::debug;
use ndarray::{Array2, ArrayView2, Ix2};
use serde::{Deserialize, Serialize};

/// Tuning knobs for [`locate`].
///
/// Each field is bounded by the matching entry of
/// [`LocateParams::parameters`]; [`locate`] rejects values outside it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocateParams {
    /// Feature radius in pixels; also the border exclusion margin.
    pub radius: usize,
    /// Minimum integrated brightness of a kept feature.
    pub minmass: f64,
    /// Minimum distance between two features in pixels.
    pub separation: f64,
    /// Width (σ) of the Gaussian noise filter.
    pub noise_size: f64,
}

impl Default for LocateParams {
    fn default() -> Self {
        Self {
            radius: 7,
            minmass: 100.0,
            separation: 7.0,
            noise_size: 1.0,
        }
    }
}

impl LocateParams {
    /// Declared ranges and defaults of the four knobs.
    pub fn parameters() -> Vec<Parameter> {
        let defaults = Self::default();
        vec![
            Parameter::int("radius", 1, 20, defaults.radius as i64),
            Parameter::float("minmass", 1.0, 10_000.0, defaults.minmass),
            Parameter::float("separation", 1.0, 20.0, defaults.separation),
            Parameter::float("noise_size", 1.0, 20.0, defaults.noise_size),
        ]
    }

    /// Read the knobs from parameter values, validating each range.
    pub fn from_values(values: &ParameterValues) -> Result<Self> {
        let params = Self {
            radius: values.get_usize("radius")?,
            minmass: values.get("minmass")?,
            separation: values.get("separation")?,
            noise_size: values.get("noise_size")?,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check every field against [`LocateParams::parameters`].
    pub fn validate(&self) -> Result<()> {
        let values = [
            self.radius as f64,
            self.minmass,
            self.separation,
            self.noise_size,
        ];
        for (parameter, value) in Self::parameters().iter().zip(values) {
            parameter.coerce(value)?;
        }
        Ok(())
    }
}

/// A located particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Column coordinate of the centroid.
    pub x: f64,
    /// Row coordinate of the centroid.
    pub y: f64,
    /// Integrated bandpassed brightness inside the mask.
    pub mass: f64,
    /// Radius of gyration.
    pub size: f64,
}

/// Locate particles in a 2D frame of any element kind.
///
/// # Errors
/// [`FrameError::UnsupportedDimensionality`] when the frame is not 2D, and
/// [`FrameError::InvalidParameter`] for out-of-range parameters.
pub fn locate(frame: &Frame, params: &LocateParams) -> Result<Vec<Feature>> {
    if frame.ndim() != 2 {
        return Err(FrameError::UnsupportedDimensionality {
            expected: 2,
            actual: frame.ndim(),
        });
    }
    let image = frame
        .data()
        .to_f64()
        .into_dimensionality::<Ix2>()
        .map_err(|_| FrameError::UnsupportedDimensionality {
            expected: 2,
            actual: frame.ndim(),
        })?;
    let features = locate_array(image.view(), params)?;
    debug!(
        "Located {} features in frame {}",
        features.len(),
        frame.frame_no()
    );
    Ok(features)
}

/// Locate particles in a 2D `f64` image.
pub fn locate_array(image: ArrayView2<f64>, params: &LocateParams) -> Result<Vec<Feature>> {
    params.validate()?;
    let (height, width) = image.dim();
    let r = params.radius;
    if height <= 2 * r || width <= 2 * r {
        return Ok(Vec::new());
    }

    let filtered = bandpass(image, params.noise_size, r);
    let peaks = merge_peaks(find_local_maxima(&filtered, r), params.separation);

    let mut features: Vec<Feature> = peaks
        .into_iter()
        .filter_map(|(y, x)| refine(&filtered, y, x, r))
        .filter(|f| f.mass > 0.0 && f.mass >= params.minmass)
        .collect();
    features.sort_by(|a, b| b.mass.total_cmp(&a.mass));
    Ok(features)
}

/// Normalised 1D Gaussian kernel truncated at 4σ.
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let half = (4.0 * sigma).ceil() as isize;
    let kernel: Vec<f64> = (-half..=half)
        .map(|i| (-(i as f64).powi(2) / (2.0 * sigma * sigma)).exp())
        .collect();
    let total: f64 = kernel.iter().sum();
    kernel.into_iter().map(|k| k / total).collect()
}

/// Separable convolution with edge clamping, rows then columns.
fn convolve_separable(image: ArrayView2<f64>, kernel: &[f64]) -> Array2<f64> {
    let (height, width) = image.dim();
    let half = (kernel.len() / 2) as isize;
    let clamp = |i: isize, n: usize| i.clamp(0, n as isize - 1) as usize;

    let rows = Array2::from_shape_fn((height, width), |(y, x)| {
        kernel
            .iter()
            .enumerate()
            .map(|(k, w)| w * image[[y, clamp(x as isize + k as isize - half, width)]])
            .sum::<f64>()
    });
    Array2::from_shape_fn((height, width), |(y, x)| {
        kernel
            .iter()
            .enumerate()
            .map(|(k, w)| w * rows[[clamp(y as isize + k as isize - half, height), x]])
            .sum::<f64>()
    })
}

fn bandpass(image: ArrayView2<f64>, noise_size: f64, radius: usize) -> Array2<f64> {
    let smoothed = convolve_separable(image, &gaussian_kernel(noise_size));
    let width = 2 * radius + 1;
    let boxcar = vec![1.0 / width as f64; width];
    let background = convolve_separable(image, &boxcar);
    (smoothed - background).mapv(|v| v.max(0.0))
}

/// Positive 3×3 local maxima at least `margin` pixels from the border,
/// brightest first.
fn find_local_maxima(image: &Array2<f64>, margin: usize) -> Vec<(usize, usize)> {
    let (height, width) = image.dim();
    let mut peaks = Vec::new();
    for y in margin..height - margin {
        for x in margin..width - margin {
            let value = image[[y, x]];
            if value <= 0.0 {
                continue;
            }
            let is_max = (y - 1..=y + 1)
                .flat_map(|ny| (x - 1..=x + 1).map(move |nx| (ny, nx)))
                .all(|(ny, nx)| image[[ny, nx]] <= value);
            if is_max {
                peaks.push((y, x));
            }
        }
    }
    peaks.sort_by(|a, b| image[[b.0, b.1]].total_cmp(&image[[a.0, a.1]]));
    peaks
}

/// Greedy brightest-first suppression of peaks closer than `separation`.
///
/// `peaks` must already be sorted by descending brightness.
fn merge_peaks(peaks: Vec<(usize, usize)>, separation: f64) -> Vec<(usize, usize)> {
    let min_dist2 = separation * separation;
    let mut kept: Vec<(usize, usize)> = Vec::new();
    for (y, x) in peaks {
        let crowded = kept.iter().any(|&(ky, kx)| {
            let dy = ky as f64 - y as f64;
            let dx = kx as f64 - x as f64;
            dy * dy + dx * dx < min_dist2
        });
        if !crowded {
            kept.push((y, x));
        }
    }
    kept
}

struct Moments {
    mass: f64,
    dy: f64,
    dx: f64,
    r2: f64,
}

fn mask_moments(image: &Array2<f64>, cy: usize, cx: usize, radius: usize) -> Moments {
    let r = radius as isize;
    let r2_max = (radius * radius) as isize;
    let mut m = Moments {
        mass: 0.0,
        dy: 0.0,
        dx: 0.0,
        r2: 0.0,
    };
    for oy in -r..=r {
        for ox in -r..=r {
            let d2 = oy * oy + ox * ox;
            if d2 > r2_max {
                continue;
            }
            let w = image[[(cy as isize + oy) as usize, (cx as isize + ox) as usize]];
            m.mass += w;
            m.dy += w * oy as f64;
            m.dx += w * ox as f64;
            m.r2 += w * d2 as f64;
        }
    }
    m
}

fn refine(image: &Array2<f64>, y: usize, x: usize, radius: usize) -> Option<Feature> {
    let (height, width) = image.dim();
    let mut cy = y;
    let mut cx = x;
    let mut m = mask_moments(image, cy, cx, radius);
    if m.mass <= 0.0 {
        return None;
    }

    let off_y = m.dy / m.mass;
    let off_x = m.dx / m.mass;
    if off_y.abs() > 0.5 || off_x.abs() > 0.5 {
        let ny = (cy as f64 + off_y).round() as isize;
        let nx = (cx as f64 + off_x).round() as isize;
        let r = radius as isize;
        let inside = ny >= r && nx >= r && ny < height as isize - r && nx < width as isize - r;
        if inside {
            cy = ny as usize;
            cx = nx as usize;
            m = mask_moments(image, cy, cx, radius);
            if m.mass <= 0.0 {
                return None;
            }
        }
    }

    Some(Feature {
        x: cx as f64 + m.dx / m.mass,
        y: cy as f64 + m.dy / m.mass,
        mass: m.mass,
        size: (m.r2 / m.mass).sqrt(),
    })
}

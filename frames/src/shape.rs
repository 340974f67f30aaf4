//! Frame shape validation and axis layout inference.
//!
//! A viewer receives frames of many layouts: a plain 2D plane, an RGB plane
//! with a trailing colour axis, a stack of channels, a z-stack, and the
//! combinations of those. [`ShapeLayout::classify`] names the role of every
//! axis in a shape so callers can pick the displayed plane without guessing.

use crate::error::{FrameError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest leading axis that is still read as a channel axis.
///
/// Longer leading axes are treated as z-stacks.
pub const MAX_CHANNELS: usize = 4;

/// Check that a shape is non-empty with strictly positive dimensions.
///
/// Also rejects shapes whose element count overflows `usize`.
pub fn validate_shape(shape: &[usize]) -> Result<usize> {
    if shape.is_empty() {
        return Err(FrameError::InvalidConfiguration(
            "frame shape must have at least one dimension".to_string(),
        ));
    }
    if let Some(axis) = shape.iter().position(|&d| d == 0) {
        return Err(FrameError::InvalidConfiguration(format!(
            "frame shape {shape:?} has a zero-length axis {axis}"
        )));
    }
    shape.iter().try_fold(1usize, |acc, &d| {
        acc.checked_mul(d).ok_or_else(|| {
            FrameError::InvalidConfiguration(format!(
                "frame shape {shape:?} has too many elements"
            ))
        })
    })
}

/// Width and height of the displayed plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    /// Image width in pixels
    pub width: usize,
    /// Image height in pixels
    pub height: usize,
}

impl ImageSize {
    pub fn from_width_height(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Role of each axis in a frame shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeLayout {
    /// Axis holding independent channels, if any.
    pub channel_axis: Option<usize>,
    /// Axis holding z-slices, if any.
    pub z_axis: Option<usize>,
    /// Trailing RGB or RGBA axis, if any.
    pub color_axis: Option<usize>,
    /// Index of the row (y) axis.
    pub y_axis: usize,
    /// Index of the column (x) axis.
    pub x_axis: usize,
    /// Size of the displayed plane.
    pub plane: ImageSize,
}

impl ShapeLayout {
    /// Infer axis roles from a frame shape.
    ///
    /// A trailing axis of 3 or 4 after at least two other axes is a colour
    /// axis. The two axes before it (or the last two) are the plane. Up to
    /// two axes may precede the plane: a single one is a channel axis when
    /// it holds at most [`MAX_CHANNELS`] entries and a z axis otherwise; with
    /// two, the first is the channel axis and the second the z axis.
    pub fn classify(shape: &[usize]) -> Result<Self> {
        validate_shape(shape)?;
        let ndim = shape.len();
        if ndim < 2 {
            return Err(FrameError::UnsupportedDimensionality {
                expected: 2,
                actual: ndim,
            });
        }

        let trailing = shape[ndim - 1];
        let color_axis = (ndim >= 3 && (trailing == 3 || trailing == 4)).then_some(ndim - 1);
        let spatial_end = color_axis.unwrap_or(ndim);
        let y_axis = spatial_end - 2;
        let x_axis = spatial_end - 1;

        let (channel_axis, z_axis) = match y_axis {
            0 => (None, None),
            1 if shape[0] <= MAX_CHANNELS => (Some(0), None),
            1 => (None, Some(0)),
            2 => (Some(0), Some(1)),
            leading => {
                return Err(FrameError::UnsupportedDimensionality {
                    expected: ndim - leading + 2,
                    actual: ndim,
                })
            }
        };

        Ok(Self {
            channel_axis,
            z_axis,
            color_axis,
            y_axis,
            x_axis,
            plane: ImageSize::from_width_height(shape[x_axis], shape[y_axis]),
        })
    }

    pub fn is_rgb(&self) -> bool {
        self.color_axis.is_some()
    }

    /// Number of channels (1 when there is no channel axis).
    pub fn channels(&self, shape: &[usize]) -> usize {
        self.channel_axis.map_or(1, |axis| shape[axis])
    }

    /// Number of z-slices (1 when there is no z axis).
    pub fn depth(&self, shape: &[usize]) -> usize {
        self.z_axis.map_or(1, |axis| shape[axis])
    }
}

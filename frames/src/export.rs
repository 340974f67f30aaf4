//! PNG export of the displayed plane of a frame.
//!
//! Leading channel and z axes are sliced at index 0, leaving a 2D plane or
//! an RGB(A) plane. Values are scaled to 8 bits: integral kinds by their
//! maximum value, floating kinds by clamping to `[0, 1]`.

use crate::error::{FrameError, Result};
use crate::frame::Frame;
use crate::shape::ShapeLayout;
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use log::debug;
use ndarray::{ArrayD, Axis};
use std::path::Path;

/// Plane shown for a frame: `(h, w)` or `(h, w, components)` in `f64`.
pub fn display_plane(frame: &Frame) -> Result<ArrayD<f64>> {
    let layout = ShapeLayout::classify(frame.shape())?;
    let mut plane = frame.data().to_f64();
    for _ in 0..layout.y_axis {
        plane = plane.index_axis_move(Axis(0), 0);
    }
    Ok(plane)
}

fn to_u8(value: f64, scale: f64) -> u8 {
    (value / scale * 255.0).clamp(0.0, 255.0).round() as u8
}

/// Render the displayed plane of `frame` as an 8-bit image.
pub fn frame_to_image(frame: &Frame) -> Result<DynamicImage> {
    let plane = display_plane(frame)?;
    let scale = frame.kind().max_value();
    let (height, width) = (plane.shape()[0], plane.shape()[1]);
    let (w, h) = (width as u32, height as u32);

    let image = match plane.ndim() {
        2 => DynamicImage::ImageLuma8(GrayImage::from_fn(w, h, |x, y| {
            Luma([to_u8(plane[[y as usize, x as usize]], scale)])
        })),
        3 if plane.shape()[2] == 3 => DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            let (y, x) = (y as usize, x as usize);
            Rgb([
                to_u8(plane[[y, x, 0]], scale),
                to_u8(plane[[y, x, 1]], scale),
                to_u8(plane[[y, x, 2]], scale),
            ])
        })),
        3 if plane.shape()[2] == 4 => DynamicImage::ImageRgba8(RgbaImage::from_fn(w, h, |x, y| {
            let (y, x) = (y as usize, x as usize);
            Rgba([
                to_u8(plane[[y, x, 0]], scale),
                to_u8(plane[[y, x, 1]], scale),
                to_u8(plane[[y, x, 2]], scale),
                to_u8(plane[[y, x, 3]], scale),
            ])
        })),
        other => {
            return Err(FrameError::UnsupportedDimensionality {
                expected: 2,
                actual: other,
            })
        }
    };
    Ok(image)
}

/// Write the displayed plane of `frame` to a PNG file.
pub fn save_png(frame: &Frame, path: &Path) -> Result<()> {
    let image = frame_to_image(frame)?;
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| FrameError::Io(std::io::Error::other(e)))?;
    debug!(
        "Wrote frame {} ({}x{}) to {}",
        frame.frame_no(),
        image.width(),
        image.height(),
        path.display()
    );
    Ok(())
}

//! Channel and column manipulation.

use crate::element::Pixel;
use crate::error::{FrameError, Result};
use crate::frame::{map_pixels, Frame, PixelData};
use ndarray::{ArrayD, Axis, IxDyn, Slice};

/// ITU-R BT.709 luma weights for (r, g, b).
pub const GREY_WEIGHTS: [f64; 3] = [0.2125, 0.7154, 0.0721];

fn blackout_typed<T: Pixel>(array: &ArrayD<T>, count: usize) -> ArrayD<T> {
    let mut out = array.clone();
    let last = Axis(out.ndim() - 1);
    let n = count.min(out.len_of(last));
    out.slice_axis_mut(last, Slice::from(..n)).fill(T::zero());
    out
}

/// Zero the first `count` entries along the last axis.
///
/// A `count` larger than the axis zeroes the whole axis. Zero-dimensional
/// frames have no last axis and are rejected.
pub fn blackout_leading(frame: &Frame, count: usize) -> Result<Frame> {
    if frame.ndim() == 0 {
        return Err(FrameError::UnsupportedDimensionality {
            expected: 1,
            actual: 0,
        });
    }
    let data = map_pixels!(frame.data(), a => blackout_typed(a, count));
    Ok(frame.with_data(data))
}

/// Collapse the colour axis with weights `(r, g, b)`.
///
/// The colour axis is the first axis of length 3. The weighted sum is
/// computed in `f64` and cast back to the frame's element kind, so the
/// output drops that axis but keeps the kind.
///
/// # Errors
/// [`FrameError::ChannelAxisNotFound`] when no axis has length 3.
pub fn convert_to_grey(frame: &Frame, r: f64, g: f64, b: f64) -> Result<Frame> {
    let shape = frame.shape();
    let color_axis = shape
        .iter()
        .position(|&d| d == 3)
        .ok_or_else(|| FrameError::ChannelAxisNotFound {
            shape: shape.to_vec(),
        })?;

    let values = frame.data().to_f64();
    let mut grey_shape = shape.to_vec();
    grey_shape.remove(color_axis);
    let mut grey = ArrayD::<f64>::zeros(IxDyn(&grey_shape));
    for (component, weight) in [r, g, b].into_iter().enumerate() {
        grey.scaled_add(weight, &values.index_axis(Axis(color_axis), component));
    }

    Ok(frame.with_data(PixelData::from_f64(frame.kind(), &grey)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;
    use approx::assert_relative_eq;

    #[test]
    fn test_blackout_zeroes_leading_columns() {
        let frame = Frame::new(1, ArrayD::from_elem(IxDyn(&[4, 6]), 9u8));
        let out = blackout_leading(&frame, 2).unwrap();
        let values = out.as_array::<u8>().unwrap();
        for row in 0..4 {
            assert_eq!(values[[row, 0]], 0);
            assert_eq!(values[[row, 1]], 0);
            assert_eq!(values[[row, 2]], 9);
            assert_eq!(values[[row, 5]], 9);
        }
        assert_eq!(out.frame_no(), 1);
    }

    #[test]
    fn test_blackout_acts_on_last_axis_of_rgb() {
        // For (h, w, 3) the last axis is colour, so red and green go dark.
        let frame = Frame::new(0, ArrayD::from_elem(IxDyn(&[2, 2, 3]), 1.0f32));
        let out = blackout_leading(&frame, 2).unwrap();
        let values = out.as_array::<f32>().unwrap();
        assert_eq!(values[[1, 1, 0]], 0.0);
        assert_eq!(values[[1, 1, 1]], 0.0);
        assert_eq!(values[[1, 1, 2]], 1.0);
    }

    #[test]
    fn test_blackout_past_the_end_and_zero() {
        let frame = Frame::new(0, ArrayD::from_elem(IxDyn(&[3, 3]), 4i32));
        let all = blackout_leading(&frame, 128).unwrap();
        assert!(all.as_array::<i32>().unwrap().iter().all(|&v| v == 0));
        let none = blackout_leading(&frame, 0).unwrap();
        assert_eq!(none, frame);
    }

    #[test]
    fn test_grey_channel_last() {
        let mut array = ArrayD::<u8>::zeros(IxDyn(&[2, 2, 3]));
        array[[0, 0, 0]] = 100;
        array[[0, 0, 1]] = 100;
        array[[0, 0, 2]] = 100;
        array[[1, 1, 1]] = 200;
        let frame = Frame::new(0, array);

        let grey = convert_to_grey(&frame, GREY_WEIGHTS[0], GREY_WEIGHTS[1], GREY_WEIGHTS[2])
            .unwrap();
        assert_eq!(grey.shape(), &[2, 2]);
        assert_eq!(grey.kind(), ElementKind::UINT8);
        let values = grey.as_array::<u8>().unwrap();
        // 0.2125 + 0.7154 + 0.0721 = 1.0, truncated cast.
        assert!(values[[0, 0]] == 99 || values[[0, 0]] == 100);
        assert_eq!(values[[1, 1]], 143);
        assert_eq!(values[[0, 1]], 0);
    }

    #[test]
    fn test_grey_channel_first() {
        let mut array = ArrayD::<f64>::zeros(IxDyn(&[3, 2, 2]));
        array.index_axis_mut(Axis(0), 0).fill(1.0);
        array.index_axis_mut(Axis(0), 2).fill(2.0);
        let frame = Frame::new(0, array);

        let grey = convert_to_grey(&frame, 0.5, 0.25, 0.25).unwrap();
        assert_eq!(grey.shape(), &[2, 2]);
        for value in grey.as_array::<f64>().unwrap().iter() {
            assert_relative_eq!(*value, 1.0);
        }
    }

    #[test]
    fn test_grey_without_colour_axis() {
        let frame = Frame::new(0, ArrayD::<u8>::zeros(IxDyn(&[128, 128])));
        assert!(matches!(
            convert_to_grey(&frame, 0.3, 0.3, 0.3),
            Err(FrameError::ChannelAxisNotFound { .. })
        ));
    }
}

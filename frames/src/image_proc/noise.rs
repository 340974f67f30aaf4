//! Additive uniform noise.
//!
//! Noise is drawn as `uniform[0, 1) * level`, cast to the frame's element
//! kind and added element-wise. Integral kinds wrap on overflow, the same
//! way fixed-width array arithmetic behaves, so a bright `uint8` pixel plus
//! noise can roll over to a dark one.

use crate::element::Pixel;
use crate::error::{FrameError, Result};
use crate::frame::{map_pixels, Frame};
use ndarray::ArrayD;
use rand::Rng;

fn add_noise_typed<T: Pixel, R: Rng>(array: &ArrayD<T>, level: f64, rng: &mut R) -> ArrayD<T> {
    array.mapv(|value| value.wrapping_offset(T::from_f64(rng.random::<f64>() * level)))
}

fn check_level(level: f64) -> Result<()> {
    if level.is_finite() && level >= 0.0 {
        Ok(())
    } else {
        Err(FrameError::InvalidParameter {
            name: "noise_level".to_string(),
            reason: format!("{level} is not a finite, non-negative number"),
        })
    }
}

/// Add uniform noise scaled by `level` using the thread RNG.
pub fn add_noise(frame: &Frame, level: f64) -> Result<Frame> {
    add_noise_with_rng(frame, level, &mut rand::rng())
}

/// Add uniform noise scaled by `level`, drawing from `rng`.
///
/// # Errors
/// [`FrameError::InvalidParameter`] when `level` is negative or not finite.
pub fn add_noise_with_rng<R: Rng>(frame: &Frame, level: f64, rng: &mut R) -> Result<Frame> {
    check_level(level)?;
    let data = map_pixels!(frame.data(), a => add_noise_typed(a, level, rng));
    Ok(frame.with_data(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_zero_level_is_identity() {
        let array = ArrayD::from_shape_fn(IxDyn(&[8, 8]), |idx| (idx[0] * 8 + idx[1]) as u8);
        let frame = Frame::new(2, array);
        let noisy = add_noise(&frame, 0.0).unwrap();
        assert_eq!(noisy, frame);
    }

    #[test]
    fn test_float_noise_is_bounded() {
        let frame = Frame::new(0, ArrayD::<f64>::zeros(IxDyn(&[32, 32])));
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let noisy = add_noise_with_rng(&frame, 5.0, &mut rng).unwrap();

        let values = noisy.as_array::<f64>().unwrap();
        assert!(values.iter().all(|v| (0.0..5.0).contains(v)));
        assert!(values.iter().any(|v| *v > 0.0));
        assert_eq!(noisy.frame_no(), 0);
    }

    #[test]
    fn test_integral_noise_wraps() {
        let frame = Frame::new(0, ArrayD::from_elem(IxDyn(&[64]), 255u8));
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let noisy = add_noise_with_rng(&frame, 10.0, &mut rng).unwrap();

        let values = noisy.as_array::<u8>().unwrap();
        // 255 + n wraps to n - 1 for every n in 1..10.
        assert!(values.iter().all(|&v| v == 255 || v < 9));
        assert!(values.iter().any(|&v| v < 9));
    }

    #[test]
    fn test_shape_and_kind_preserved() {
        let frame = Frame::new(4, ArrayD::<i16>::zeros(IxDyn(&[3, 10, 16, 16])));
        let noisy = add_noise(&frame, 100.0).unwrap();
        assert_eq!(noisy.shape(), frame.shape());
        assert_eq!(noisy.kind(), frame.kind());
        assert_eq!(noisy.frame_no(), 4);
    }

    #[test]
    fn test_rejects_bad_levels() {
        let frame = Frame::new(0, ArrayD::<u8>::zeros(IxDyn(&[4, 4])));
        assert!(add_noise(&frame, -1.0).is_err());
        assert!(add_noise(&frame, f64::NAN).is_err());
    }
}

//! Randomised frame sequences for exercising viewers.
//!
//! [`SyntheticFrameSource`] fills every frame with uniform random values:
//! `[0, 1)` for floating kinds and `[0, MAX)` for integral kinds. Nothing is
//! cached; each `get_frame` call allocates and fills a new buffer.
//!
//! Large frames are filled in parallel. The buffer is split into fixed-size
//! chunks and each chunk gets its own ChaCha stream derived from the frame
//! seed, so a seeded source yields identical frames regardless of how rayon
//! schedules the chunks.

use crate::element::{ElementKind, Pixel};
use crate::error::{FrameError, Result};
use crate::frame::{Frame, PixelData};
use crate::sequence::{BoundsPolicy, FrameSequence};
use crate::shape::validate_shape;
use log::{debug, trace, warn};
use ndarray::{ArrayD, IxDyn};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Frame count used by [`SyntheticFrameSource::default`].
pub const DEFAULT_LENGTH: usize = 10;

/// Frame shape used by [`SyntheticFrameSource::default`].
pub const DEFAULT_SHAPE: [usize; 2] = [128, 128];

/// Elements filled by one parallel work unit.
const CHUNK_ELEMENTS: usize = 64 * 1024;

/// Fills a buffer of `elements` values shaped as `shape` from `seed`.
type Generator = fn(&[usize], usize, u64) -> Result<PixelData>;

fn generate<T: Pixel>(shape: &[usize], elements: usize, seed: u64) -> Result<PixelData> {
    let mut buffer: Vec<T> = Vec::new();
    buffer
        .try_reserve_exact(elements)
        .map_err(|_| FrameError::AllocationFailure { elements })?;
    buffer.resize(elements, T::zero());

    buffer
        .par_chunks_mut(CHUNK_ELEMENTS)
        .enumerate()
        .for_each(|(chunk_idx, chunk)| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rng.set_stream(chunk_idx as u64);
            chunk
                .iter_mut()
                .for_each(|pixel| *pixel = T::sample_uniform(&mut rng));
        });

    let array =
        ArrayD::from_shape_vec(IxDyn(shape), buffer).map_err(|_| FrameError::ShapeMismatch {
            expected: shape.to_vec(),
            actual: vec![elements],
        })?;
    Ok(T::wrap(array))
}

fn generator_for(kind: ElementKind) -> Result<Generator> {
    let generator: Generator = match kind {
        ElementKind::UINT8 => generate::<u8>,
        ElementKind::UINT16 => generate::<u16>,
        ElementKind::UINT32 => generate::<u32>,
        ElementKind::UINT64 => generate::<u64>,
        ElementKind::INT8 => generate::<i8>,
        ElementKind::INT16 => generate::<i16>,
        ElementKind::INT32 => generate::<i32>,
        ElementKind::INT64 => generate::<i64>,
        ElementKind::FLOAT32 => generate::<f32>,
        ElementKind::FLOAT64 => generate::<f64>,
        other => {
            return Err(FrameError::InvalidConfiguration(format!(
                "unsupported element kind '{other}'"
            )))
        }
    };
    Ok(generator)
}

/// Derive the seed of frame `frame_no` from a source seed (SplitMix64 finaliser).
fn frame_seed(base: u64, frame_no: usize) -> u64 {
    let mut z = base ^ (frame_no as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// A [`FrameSequence`] of uniformly random frames.
#[derive(Debug, Clone)]
pub struct SyntheticFrameSource {
    length: usize,
    shape: Vec<usize>,
    kind: ElementKind,
    elements: usize,
    seed: Option<u64>,
    bounds: BoundsPolicy,
    generator: Generator,
}

impl SyntheticFrameSource {
    /// Create a source of `length` frames of `shape` holding `kind` elements.
    ///
    /// # Errors
    /// [`FrameError::InvalidConfiguration`] when `length` is zero, `shape` is
    /// empty or has a zero axis, or `kind` has no backing primitive.
    pub fn new(length: usize, shape: impl Into<Vec<usize>>, kind: ElementKind) -> Result<Self> {
        let shape = shape.into();
        if length == 0 {
            return Err(FrameError::InvalidConfiguration(
                "sequence length must be positive".to_string(),
            ));
        }
        let elements = validate_shape(&shape)?;
        let kind = kind.validate()?;
        let generator = generator_for(kind)?;

        debug!(
            "Synthetic source: {length} frames of {shape:?} {kind} ({} bytes per frame)",
            elements.saturating_mul(kind.byte_size())
        );

        Ok(Self {
            length,
            shape,
            kind,
            elements,
            seed: None,
            bounds: BoundsPolicy::default(),
            generator,
        })
    }

    /// Like [`SyntheticFrameSource::new`], with the element type given by name
    /// (`"uint8"`, `"float32"`, `"i16"`, ...).
    pub fn with_dtype(length: usize, shape: impl Into<Vec<usize>>, dtype: &str) -> Result<Self> {
        Self::new(length, shape, dtype.parse()?)
    }

    /// Make frame contents a pure function of `(seed, index)`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_bounds_policy(mut self, bounds: BoundsPolicy) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn bounds_policy(&self) -> BoundsPolicy {
        self.bounds
    }
}

impl Default for SyntheticFrameSource {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            shape: DEFAULT_SHAPE.to_vec(),
            kind: ElementKind::UINT8,
            elements: DEFAULT_SHAPE.iter().product(),
            seed: None,
            bounds: BoundsPolicy::default(),
            generator: generate::<u8>,
        }
    }
}

impl FrameSequence for SyntheticFrameSource {
    fn len(&self) -> usize {
        self.length
    }

    fn frame_shape(&self) -> &[usize] {
        &self.shape
    }

    fn pixel_type(&self) -> ElementKind {
        self.kind
    }

    fn get_frame(&self, index: usize) -> Result<Frame> {
        if self.bounds.check(index, self.length)? {
            warn!(
                "Serving frame {index} past the end of a {}-frame synthetic source",
                self.length
            );
        }

        let seed = match self.seed {
            Some(base) => frame_seed(base, index),
            None => rand::rng().next_u64(),
        };
        trace!("Generating synthetic frame {index} ({} elements)", self.elements);

        let data = (self.generator)(&self.shape, self.elements, seed)?;
        Ok(Frame::new(index, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn assert_in_range(frame: &Frame) {
        let kind = frame.kind();
        let upper = kind.max_value();
        for value in frame.data().to_f64().iter() {
            assert!(*value >= 0.0, "{kind}: {value} below 0");
            assert!(*value < upper, "{kind}: {value} not below {upper}");
        }
    }

    #[test]
    fn test_default_source_scenario() {
        let source = SyntheticFrameSource::default();
        assert_eq!(source.len(), 10);
        assert_eq!(source.frame_shape(), &[128, 128]);
        assert_eq!(source.pixel_type(), ElementKind::UINT8);
        assert_eq!(source.pixel_type().to_string(), "uint8");

        let frame = source.get_frame(0).unwrap();
        assert_eq!(frame.frame_no(), 0);
        assert_eq!(frame.shape(), &[128, 128]);
        assert!(frame.as_array::<u8>().is_some());
    }

    #[test]
    fn test_explicit_default_matches_default() {
        let source = SyntheticFrameSource::with_dtype(10, vec![128, 128], "uint8").unwrap();
        let default = SyntheticFrameSource::default();
        assert_eq!(source.len(), default.len());
        assert_eq!(source.frame_shape(), default.frame_shape());
        assert_eq!(source.pixel_type(), default.pixel_type());
    }

    #[test]
    fn test_stack_rgb_frame_shape() {
        let source = SyntheticFrameSource::new(10, vec![10, 128, 128, 3], ElementKind::UINT8)
            .unwrap();
        let frame = source.get_frame(5).unwrap();
        assert_eq!(frame.shape(), &[10, 128, 128, 3]);
        assert_eq!(frame.frame_no(), 5);
    }

    #[test]
    fn test_unrecognized_dtype_fails() {
        let err = SyntheticFrameSource::with_dtype(10, vec![128, 128], "not-a-type").unwrap_err();
        assert!(matches!(err, FrameError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_invalid_shapes_and_lengths_fail() {
        for shape in [vec![], vec![0, 128], vec![128, 0, 3]] {
            let err = SyntheticFrameSource::new(10, shape, ElementKind::UINT8).unwrap_err();
            assert!(matches!(err, FrameError::InvalidConfiguration(_)));
        }
        assert!(SyntheticFrameSource::new(0, vec![8, 8], ElementKind::UINT8).is_err());
        let odd = ElementKind::Integral {
            bits: 24,
            signed: false,
        };
        assert!(SyntheticFrameSource::new(1, vec![8, 8], odd).is_err());
    }

    #[test]
    fn test_every_kind_stays_in_range() {
        for kind in ElementKind::ALL {
            let source = SyntheticFrameSource::new(2, vec![16, 16, 3], kind).unwrap();
            let frame = source.get_frame(1).unwrap();
            assert_eq!(frame.kind(), kind);
            assert_eq!(frame.shape(), &[16, 16, 3]);
            assert_in_range(&frame);
        }
    }

    #[test]
    fn test_float32_never_reaches_one() {
        let source = SyntheticFrameSource::new(1, vec![512, 512], ElementKind::FLOAT32)
            .unwrap()
            .with_seed(3);
        let frame = source.get_frame(0).unwrap();
        let values = frame.as_array::<f32>().unwrap();
        assert!(values.iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn test_metadata_is_constant() {
        let source = SyntheticFrameSource::new(4, vec![3, 10, 32, 32], ElementKind::INT16).unwrap();
        for i in 0..4 {
            let _ = source.get_frame(i).unwrap();
            assert_eq!(source.len(), 4);
            assert_eq!(source.frame_shape(), &[3, 10, 32, 32]);
            assert_eq!(source.pixel_type(), ElementKind::INT16);
        }
    }

    #[test]
    fn test_seeded_frames_are_reproducible() {
        let a = SyntheticFrameSource::new(5, vec![300, 300], ElementKind::UINT16)
            .unwrap()
            .with_seed(42);
        let b = a.clone();

        assert_eq!(a.get_frame(3).unwrap(), b.get_frame(3).unwrap());
        assert_ne!(a.get_frame(3).unwrap(), a.get_frame(4).unwrap());
        // Order of calls does not matter.
        let later = a.get_frame(2).unwrap();
        let _ = a.get_frame(0).unwrap();
        assert_eq!(later, a.get_frame(2).unwrap());
    }

    #[test]
    fn test_unseeded_frames_differ() {
        let source = SyntheticFrameSource::new(2, vec![64, 64], ElementKind::UINT32).unwrap();
        assert_ne!(
            source.get_frame(0).unwrap().into_data(),
            source.get_frame(0).unwrap().into_data()
        );
    }

    #[test]
    fn test_permissive_serves_past_the_end() {
        let source = SyntheticFrameSource::new(3, vec![8, 8], ElementKind::UINT8).unwrap();
        let frame = source.get_frame(7).unwrap();
        assert_eq!(frame.frame_no(), 7);
        assert_eq!(frame.shape(), &[8, 8]);
    }

    #[test]
    fn test_strict_rejects_past_the_end() {
        let source = SyntheticFrameSource::new(3, vec![8, 8], ElementKind::UINT8)
            .unwrap()
            .with_bounds_policy(BoundsPolicy::Strict);
        assert!(source.get_frame(2).is_ok());
        assert!(matches!(
            source.get_frame(3),
            Err(FrameError::IndexOutOfRange {
                index: 3,
                length: 3
            })
        ));
    }

    #[test]
    fn test_concurrent_calls() {
        let source = SyntheticFrameSource::new(8, vec![64, 64, 3], ElementKind::FLOAT64)
            .unwrap()
            .with_seed(9);
        let expected: Vec<Frame> = (0..8).map(|i| source.get_frame(i).unwrap()).collect();

        thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let source = &source;
                    scope.spawn(move || source.get_frame(i).unwrap())
                })
                .collect();
            for (i, handle) in handles.into_iter().enumerate() {
                let frame = handle.join().unwrap();
                assert_eq!(frame.frame_no(), i);
                assert_eq!(frame, expected[i]);
            }
        });
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_unreservable_buffer_is_allocation_failure() {
        // 2^62 u64 elements pass shape validation but need 2^65 bytes.
        let source = SyntheticFrameSource::new(1, vec![1usize << 62], ElementKind::UINT64).unwrap();
        assert!(matches!(
            source.get_frame(0),
            Err(FrameError::AllocationFailure { elements }) if elements == 1usize << 62
        ));
    }

    #[test]
    fn test_frames_iterator() {
        let source = SyntheticFrameSource::new(4, vec![4, 4], ElementKind::UINT8).unwrap();
        let iter = source.frames();
        assert_eq!(iter.len(), 4);
        let numbers: Vec<usize> = iter.map(|f| f.unwrap().frame_no()).collect();
        assert_eq!(numbers, vec![0, 1, 2, 3]);
    }
}

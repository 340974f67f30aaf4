//! Frames: an N-dimensional pixel buffer tagged with its sequence index.

use crate::element::{ElementKind, Pixel};
use crate::error::{FrameError, Result};
use ndarray::{ArrayD, IxDyn};
use num_traits::AsPrimitive;

/// Typed N-dimensional storage for one frame.
///
/// One variant per supported [`ElementKind`]. Code that does not care about
/// the element type goes through [`with_pixels!`] or [`map_pixels!`], which
/// expand to a `match` over every variant.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    U8(ArrayD<u8>),
    U16(ArrayD<u16>),
    U32(ArrayD<u32>),
    U64(ArrayD<u64>),
    I8(ArrayD<i8>),
    I16(ArrayD<i16>),
    I32(ArrayD<i32>),
    I64(ArrayD<i64>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
}

/// Evaluate an expression against the typed array inside a [`PixelData`].
macro_rules! with_pixels {
    ($data:expr, $array:ident => $body:expr) => {
        match $data {
            $crate::frame::PixelData::U8($array) => $body,
            $crate::frame::PixelData::U16($array) => $body,
            $crate::frame::PixelData::U32($array) => $body,
            $crate::frame::PixelData::U64($array) => $body,
            $crate::frame::PixelData::I8($array) => $body,
            $crate::frame::PixelData::I16($array) => $body,
            $crate::frame::PixelData::I32($array) => $body,
            $crate::frame::PixelData::I64($array) => $body,
            $crate::frame::PixelData::F32($array) => $body,
            $crate::frame::PixelData::F64($array) => $body,
        }
    };
}

/// Like [`with_pixels!`], but re-wraps the resulting array in the same variant.
macro_rules! map_pixels {
    ($data:expr, $array:ident => $body:expr) => {
        match $data {
            $crate::frame::PixelData::U8($array) => $crate::frame::PixelData::U8($body),
            $crate::frame::PixelData::U16($array) => $crate::frame::PixelData::U16($body),
            $crate::frame::PixelData::U32($array) => $crate::frame::PixelData::U32($body),
            $crate::frame::PixelData::U64($array) => $crate::frame::PixelData::U64($body),
            $crate::frame::PixelData::I8($array) => $crate::frame::PixelData::I8($body),
            $crate::frame::PixelData::I16($array) => $crate::frame::PixelData::I16($body),
            $crate::frame::PixelData::I32($array) => $crate::frame::PixelData::I32($body),
            $crate::frame::PixelData::I64($array) => $crate::frame::PixelData::I64($body),
            $crate::frame::PixelData::F32($array) => $crate::frame::PixelData::F32($body),
            $crate::frame::PixelData::F64($array) => $crate::frame::PixelData::F64($body),
        }
    };
}

pub(crate) use map_pixels;
pub(crate) use with_pixels;

impl PixelData {
    /// Element kind of the stored array.
    pub fn kind(&self) -> ElementKind {
        match self {
            PixelData::U8(_) => ElementKind::UINT8,
            PixelData::U16(_) => ElementKind::UINT16,
            PixelData::U32(_) => ElementKind::UINT32,
            PixelData::U64(_) => ElementKind::UINT64,
            PixelData::I8(_) => ElementKind::INT8,
            PixelData::I16(_) => ElementKind::INT16,
            PixelData::I32(_) => ElementKind::INT32,
            PixelData::I64(_) => ElementKind::INT64,
            PixelData::F32(_) => ElementKind::FLOAT32,
            PixelData::F64(_) => ElementKind::FLOAT64,
        }
    }

    pub fn shape(&self) -> &[usize] {
        with_pixels!(self, a => a.shape())
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        with_pixels!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the data widened to `f64`.
    pub fn to_f64(&self) -> ArrayD<f64> {
        with_pixels!(self, a => a.mapv(|v| AsPrimitive::<f64>::as_(v)))
    }

    /// Cast an `f64` array to `kind`, with `as` semantics per element.
    pub fn from_f64(kind: ElementKind, array: &ArrayD<f64>) -> Result<Self> {
        fn cast<T: Pixel>(array: &ArrayD<f64>) -> PixelData {
            T::wrap(array.mapv(T::from_f64))
        }

        let data = match kind {
            ElementKind::UINT8 => cast::<u8>(array),
            ElementKind::UINT16 => cast::<u16>(array),
            ElementKind::UINT32 => cast::<u32>(array),
            ElementKind::UINT64 => cast::<u64>(array),
            ElementKind::INT8 => cast::<i8>(array),
            ElementKind::INT16 => cast::<i16>(array),
            ElementKind::INT32 => cast::<i32>(array),
            ElementKind::INT64 => cast::<i64>(array),
            ElementKind::FLOAT32 => cast::<f32>(array),
            ElementKind::FLOAT64 => cast::<f64>(array),
            other => {
                return Err(FrameError::InvalidConfiguration(format!(
                    "unsupported element kind '{other}'"
                )))
            }
        };
        Ok(data)
    }

    /// Borrow the typed array if the data holds `T`.
    pub fn as_array<T: Pixel>(&self) -> Option<&ArrayD<T>> {
        T::unwrap_ref(self)
    }
}

impl<T: Pixel> From<ArrayD<T>> for PixelData {
    fn from(array: ArrayD<T>) -> Self {
        T::wrap(array)
    }
}

/// Summary statistics over a frame, in `f64`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// One indexed sample from a frame sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    frame_no: usize,
    data: PixelData,
}

impl Frame {
    pub fn new(frame_no: usize, data: impl Into<PixelData>) -> Self {
        Self {
            frame_no,
            data: data.into(),
        }
    }

    /// Zero-filled frame of the given shape and kind.
    pub fn zeros(frame_no: usize, shape: &[usize], kind: ElementKind) -> Result<Self> {
        let zeros = ArrayD::<f64>::zeros(IxDyn(shape));
        Ok(Self::new(frame_no, PixelData::from_f64(kind, &zeros)?))
    }

    /// Position of this frame in its sequence.
    pub fn frame_no(&self) -> usize {
        self.frame_no
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    pub fn kind(&self) -> ElementKind {
        self.data.kind()
    }

    pub fn data(&self) -> &PixelData {
        &self.data
    }

    pub fn into_data(self) -> PixelData {
        self.data
    }

    /// Borrow the typed pixel array if the frame holds `T`.
    pub fn as_array<T: Pixel>(&self) -> Option<&ArrayD<T>> {
        self.data.as_array()
    }

    /// Replace the pixel data while keeping the frame number.
    pub fn with_data(&self, data: impl Into<PixelData>) -> Self {
        Self::new(self.frame_no, data)
    }

    /// Min, max and mean of all elements, or `None` for an empty frame.
    pub fn stats(&self) -> Option<FrameStats> {
        if self.data.is_empty() {
            return None;
        }
        let values = self.data.to_f64();
        let (min, max, sum) = values.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(min, max, sum), &v| (min.min(v), max.max(v), sum + v),
        );
        Some(FrameStats {
            min,
            max,
            mean: sum / values.len() as f64,
        })
    }

    /// Fail with [`FrameError::ShapeMismatch`] unless the frame has `expected` shape.
    pub fn ensure_shape(&self, expected: &[usize]) -> Result<()> {
        if self.shape() == expected {
            Ok(())
        } else {
            Err(FrameError::ShapeMismatch {
                expected: expected.to_vec(),
                actual: self.shape().to_vec(),
            })
        }
    }
}

//! Element kinds and the pixel trait that ties them to Rust primitives.
//!
//! A frame's element type is a closed set: unsigned and signed integers of
//! 8 to 64 bits, and 32/64-bit floats. [`ElementKind`] names the kind at
//! runtime (parsed from strings such as `"uint8"` or `"f32"`), and the
//! [`Pixel`] trait maps each primitive back onto its kind so that generic
//! code can sample, cast and add values without runtime type checks.

use crate::error::FrameError;
use crate::frame::PixelData;
use ndarray::ArrayD;
use num_traits::{AsPrimitive, Zero};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric representation of each element of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ElementKind {
    /// Integer elements of the given bit width.
    Integral { bits: u8, signed: bool },
    /// IEEE-754 floating point elements of the given bit width.
    Floating { bits: u8 },
}

impl ElementKind {
    pub const UINT8: Self = Self::Integral { bits: 8, signed: false };
    pub const UINT16: Self = Self::Integral { bits: 16, signed: false };
    pub const UINT32: Self = Self::Integral { bits: 32, signed: false };
    pub const UINT64: Self = Self::Integral { bits: 64, signed: false };
    pub const INT8: Self = Self::Integral { bits: 8, signed: true };
    pub const INT16: Self = Self::Integral { bits: 16, signed: true };
    pub const INT32: Self = Self::Integral { bits: 32, signed: true };
    pub const INT64: Self = Self::Integral { bits: 64, signed: true };
    pub const FLOAT32: Self = Self::Floating { bits: 32 };
    pub const FLOAT64: Self = Self::Floating { bits: 64 };

    /// Every supported kind, integers first.
    pub const ALL: [ElementKind; 10] = [
        Self::UINT8,
        Self::UINT16,
        Self::UINT32,
        Self::UINT64,
        Self::INT8,
        Self::INT16,
        Self::INT32,
        Self::INT64,
        Self::FLOAT32,
        Self::FLOAT64,
    ];

    /// Whether a concrete primitive type backs this kind.
    ///
    /// The variants are public, so a caller can spell out widths such as
    /// `Integral { bits: 12, .. }` that have no storage type. Sources reject
    /// those at construction.
    pub fn is_supported(&self) -> bool {
        match self {
            Self::Integral { bits, .. } => matches!(bits, 8 | 16 | 32 | 64),
            Self::Floating { bits } => matches!(bits, 32 | 64),
        }
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, Self::Floating { .. })
    }

    pub fn bits(&self) -> u8 {
        match self {
            Self::Integral { bits, .. } | Self::Floating { bits } => *bits,
        }
    }

    /// Size of one element in bytes.
    pub fn byte_size(&self) -> usize {
        self.bits() as usize / 8
    }

    /// Upper bound of the values synthetic frames draw from.
    ///
    /// Integral kinds report their maximum representable value and floating
    /// kinds report 1.0; both bounds are exclusive when sampling.
    pub fn max_value(&self) -> f64 {
        match *self {
            Self::Integral { bits, signed } => {
                let magnitude_bits = if signed { bits.saturating_sub(1) } else { bits };
                // Exact for widths below 53 bits, rounded above.
                (2f64).powi(magnitude_bits as i32) - 1.0
            }
            Self::Floating { .. } => 1.0,
        }
    }

    /// Check that the kind is supported, for use at construction boundaries.
    pub fn validate(self) -> Result<Self, FrameError> {
        if self.is_supported() {
            Ok(self)
        } else {
            Err(FrameError::InvalidConfiguration(format!(
                "unsupported element kind '{self}'"
            )))
        }
    }
}

impl Default for ElementKind {
    fn default() -> Self {
        Self::UINT8
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Integral {
                bits,
                signed: false,
            } => write!(f, "uint{bits}"),
            Self::Integral { bits, signed: true } => write!(f, "int{bits}"),
            Self::Floating { bits } => write!(f, "float{bits}"),
        }
    }
}

impl FromStr for ElementKind {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "uint8" | "u8" => Self::UINT8,
            "uint16" | "u16" => Self::UINT16,
            "uint32" | "u32" => Self::UINT32,
            "uint64" | "u64" => Self::UINT64,
            "int8" | "i8" => Self::INT8,
            "int16" | "i16" => Self::INT16,
            "int32" | "i32" => Self::INT32,
            "int64" | "i64" => Self::INT64,
            "float32" | "f32" => Self::FLOAT32,
            "float64" | "f64" | "float" => Self::FLOAT64,
            other => {
                return Err(FrameError::InvalidConfiguration(format!(
                    "unrecognized element type '{other}'"
                )))
            }
        };
        Ok(kind)
    }
}

impl TryFrom<String> for ElementKind {
    type Error = FrameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ElementKind> for String {
    fn from(kind: ElementKind) -> Self {
        kind.to_string()
    }
}

/// A primitive type that can be stored in a frame.
pub trait Pixel:
    Copy + Send + Sync + PartialOrd + Zero + AsPrimitive<f64> + fmt::Debug + 'static
{
    /// The element kind this primitive represents.
    const KIND: ElementKind;

    /// Cast from `f64` with `as` semantics: truncation toward zero for
    /// integers, saturating at the type's bounds.
    fn from_f64(value: f64) -> Self;

    /// Addition that wraps on overflow for integral kinds.
    fn wrapping_offset(self, other: Self) -> Self;

    /// Draw one value uniformly from `[0, 1)` for floats or `[0, MAX)` for
    /// integers.
    fn sample_uniform<R: Rng>(rng: &mut R) -> Self;

    /// Wrap a typed array into the matching [`PixelData`] variant.
    fn wrap(array: ArrayD<Self>) -> PixelData;

    /// Borrow the typed array if `data` holds this primitive.
    fn unwrap_ref(data: &PixelData) -> Option<&ArrayD<Self>>;
}

macro_rules! impl_integral_pixel {
    ($($ty:ty => $kind:expr, $variant:ident);* $(;)?) => {
        $(
            impl Pixel for $ty {
                const KIND: ElementKind = $kind;

                fn from_f64(value: f64) -> Self {
                    value as $ty
                }

                fn wrapping_offset(self, other: Self) -> Self {
                    self.wrapping_add(other)
                }

                fn sample_uniform<R: Rng>(rng: &mut R) -> Self {
                    rng.random_range(0..<$ty>::MAX)
                }

                fn wrap(array: ArrayD<Self>) -> PixelData {
                    PixelData::$variant(array)
                }

                fn unwrap_ref(data: &PixelData) -> Option<&ArrayD<Self>> {
                    match data {
                        PixelData::$variant(array) => Some(array),
                        _ => None,
                    }
                }
            }
        )*
    };
}

macro_rules! impl_floating_pixel {
    ($($ty:ty => $kind:expr, $variant:ident);* $(;)?) => {
        $(
            impl Pixel for $ty {
                const KIND: ElementKind = $kind;

                fn from_f64(value: f64) -> Self {
                    value as $ty
                }

                fn wrapping_offset(self, other: Self) -> Self {
                    self + other
                }

                fn sample_uniform<R: Rng>(rng: &mut R) -> Self {
                    // StandardUniform yields [0, 1) in the native width.
                    rng.random::<$ty>()
                }

                fn wrap(array: ArrayD<Self>) -> PixelData {
                    PixelData::$variant(array)
                }

                fn unwrap_ref(data: &PixelData) -> Option<&ArrayD<Self>> {
                    match data {
                        PixelData::$variant(array) => Some(array),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_integral_pixel! {
    u8 => ElementKind::UINT8, U8;
    u16 => ElementKind::UINT16, U16;
    u32 => ElementKind::UINT32, U32;
    u64 => ElementKind::UINT64, U64;
    i8 => ElementKind::INT8, I8;
    i16 => ElementKind::INT16, I16;
    i32 => ElementKind::INT32, I32;
    i64 => ElementKind::INT64, I64;
}

impl_floating_pixel! {
    f32 => ElementKind::FLOAT32, F32;
    f64 => ElementKind::FLOAT64, F64;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_parse_numpy_and_rust_names() {
        assert_eq!("uint8".parse::<ElementKind>().unwrap(), ElementKind::UINT8);
        assert_eq!("u8".parse::<ElementKind>().unwrap(), ElementKind::UINT8);
        assert_eq!("Int16".parse::<ElementKind>().unwrap(), ElementKind::INT16);
        assert_eq!(
            "float32".parse::<ElementKind>().unwrap(),
            ElementKind::FLOAT32
        );
        assert_eq!("f64".parse::<ElementKind>().unwrap(), ElementKind::FLOAT64);
    }

    #[test]
    fn test_unrecognized_name_is_invalid_configuration() {
        let err = "complex128".parse::<ElementKind>().unwrap_err();
        assert!(matches!(err, FrameError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_display_round_trips_every_kind() {
        for kind in ElementKind::ALL {
            let parsed: ElementKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert_eq!(ElementKind::UINT8.to_string(), "uint8");
    }

    #[test]
    fn test_unsupported_widths() {
        let odd = ElementKind::Integral {
            bits: 12,
            signed: false,
        };
        assert!(!odd.is_supported());
        assert!(odd.validate().is_err());
        assert!(!ElementKind::Floating { bits: 16 }.is_supported());
    }

    #[test]
    fn test_max_values() {
        assert_eq!(ElementKind::UINT8.max_value(), 255.0);
        assert_eq!(ElementKind::INT8.max_value(), 127.0);
        assert_eq!(ElementKind::UINT16.max_value(), 65535.0);
        assert_eq!(ElementKind::FLOAT32.max_value(), 1.0);

        let empty = ElementKind::Integral {
            bits: 0,
            signed: true,
        };
        assert_eq!(empty.max_value(), 0.0);
    }

    #[test]
    fn test_byte_sizes() {
        assert_eq!(ElementKind::UINT8.byte_size(), 1);
        assert_eq!(ElementKind::INT32.byte_size(), 4);
        assert_eq!(ElementKind::FLOAT64.byte_size(), 8);
    }

    #[test]
    fn test_pixel_kinds_match() {
        assert_eq!(<u8 as Pixel>::KIND, ElementKind::UINT8);
        assert_eq!(<i64 as Pixel>::KIND, ElementKind::INT64);
        assert_eq!(<f32 as Pixel>::KIND, ElementKind::FLOAT32);
    }

    #[test]
    fn test_wrapping_offset() {
        assert_eq!(250u8.wrapping_offset(10), 4);
        assert_eq!(1.5f32.wrapping_offset(2.0), 3.5);
    }

    #[test]
    fn test_samples_stay_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..10_000 {
            assert!(u8::sample_uniform(&mut rng) < u8::MAX);
            let v = i8::sample_uniform(&mut rng);
            assert!((0..i8::MAX).contains(&v));
            let f = f32::sample_uniform(&mut rng);
            assert!((0.0..1.0).contains(&f));
        }
    }

    #[test]
    fn test_serde_uses_names() {
        let json = serde_json::to_string(&ElementKind::UINT16).unwrap();
        assert_eq!(json, "\"uint16\"");
        let kind: ElementKind = serde_json::from_str("\"float64\"").unwrap();
        assert_eq!(kind, ElementKind::FLOAT64);
        assert!(serde_json::from_str::<ElementKind>("\"bogus\"").is_err());
    }
}

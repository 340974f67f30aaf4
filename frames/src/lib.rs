//! Synthetic frame sequences and headless processing glue for image viewers.
//!
//! The crate centres on the [`FrameSequence`] trait: a fixed-length list of
//! N-dimensional frames sharing one shape and one [`ElementKind`].
//! [`SyntheticFrameSource`] implements it with uniformly random content so a
//! viewer can be exercised against every layout it must support (plain 2D,
//! RGB, multichannel, z-stacks and their combinations).
//!
//! Around the source sit the pieces a viewer attaches to a sequence:
//!
//! - [`pipeline`]: parameterised processing steps and [`ProcessedSequence`]
//! - [`image_proc`]: noise, column blackout, grey conversion, particle location
//! - [`annotate`]: per-frame coordinate tables and multi-axis frame numbering
//! - [`shape`]: axis-role inference for frame shapes
//! - [`config`]: JSON source descriptions
//! - `export`: PNG rendering of a frame's displayed plane (`png-export` feature)
//!
//! # Usage
//! ```
//! use frames::{ElementKind, FrameSequence, SyntheticFrameSource};
//!
//! let source = SyntheticFrameSource::new(10, vec![10, 128, 128, 3], ElementKind::UINT8)?;
//! let frame = source.get_frame(5)?;
//! assert_eq!(frame.shape(), &[10, 128, 128, 3]);
//! assert_eq!(frame.frame_no(), 5);
//! # Ok::<(), frames::FrameError>(())
//! ```

pub mod annotate;
pub mod config;
pub mod element;
pub mod error;
#[cfg(feature = "png-export")]
pub mod export;
pub mod frame;
pub mod image_proc;
pub mod pipeline;
pub mod sequence;
pub mod shape;
pub mod synthetic;

pub use annotate::{AnnotationRecord, AnnotationTable, FrameAxes};
pub use config::SourceConfig;
pub use element::{ElementKind, Pixel};
pub use error::{FrameError, Result};
pub use frame::{Frame, FrameStats, PixelData};
pub use pipeline::{
    AddNoise, BlackoutLeading, ConvertToGrey, FnStep, Parameter, ParameterValues, Pipeline,
    ProcessStep, ProcessedSequence, ValueKind,
};
pub use sequence::{BoundsPolicy, FrameSequence};
pub use shape::{ImageSize, ShapeLayout};
pub use synthetic::SyntheticFrameSource;

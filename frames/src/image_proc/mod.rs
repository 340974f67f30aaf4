//! Frame processing operations
//!
//! Element-type-preserving operations used by processing pipelines
//! (noise injection, column blackout), colour reduction, and particle
//! location on single planes.

pub mod channels;
pub mod locate;
pub mod noise;

pub use channels::{blackout_leading, convert_to_grey, GREY_WEIGHTS};
pub use locate::{locate, locate_array, Feature, LocateParams};
pub use noise::{add_noise, add_noise_with_rng};

//! Shared test infrastructure for the frames workspace.
//!
//! Provides the frame shapes a viewer must handle, seeded random point sets
//! for annotation tests, and a workspace-level `test_output/` directory for
//! artifacts (PNG previews, JSON tables) worth inspecting by hand.
//!
//! # Usage
//! ```rust
//! use test_helpers::{output_path, VIEWER_SHAPES};
//!
//! for (name, shape) in VIEWER_SHAPES {
//!     let _artifact = output_path(format!("{name}.png"));
//!     assert!(shape.len() >= 2);
//! }
//! ```

use once_cell::sync::Lazy;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::env;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum TestHelperError {
    #[error("Failed to find project root: {0}")]
    ProjectRootNotFound(String),
}

/// Frame layouts a viewer must display, keyed by a short name.
///
/// Plain 2D, RGB, multichannel, z-stack, RGB z-stack and multichannel
/// z-stack, in that order.
pub const VIEWER_SHAPES: [(&str, &[usize]); 6] = [
    ("2d", &[128, 128]),
    ("rgb", &[128, 128, 3]),
    ("multichannel", &[2, 128, 128]),
    ("3d", &[10, 128, 128]),
    ("3d_rgb", &[10, 128, 128, 3]),
    ("3d_multichannel", &[3, 10, 128, 128]),
];

/// A random annotated point, independent of any table type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixturePoint {
    pub frame: usize,
    pub particle: usize,
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

/// `frames * particles` points with every particle present in every frame.
///
/// Points are ordered by frame, then particle. `x` and `y` lie in
/// `[10, 110)`; when `z_extent` is given, `z` lies in `[10, 10 + z_extent)`.
pub fn random_tracks(
    frames: usize,
    particles: usize,
    z_extent: Option<f64>,
    seed: u64,
) -> Vec<FixturePoint> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut points = Vec::with_capacity(frames * particles);
    for frame in 0..frames {
        for particle in 0..particles {
            points.push(FixturePoint {
                frame,
                particle,
                x: rng.random::<f64>() * 100.0 + 10.0,
                y: rng.random::<f64>() * 100.0 + 10.0,
                z: z_extent.map(|extent| rng.random::<f64>() * extent + 10.0),
            });
        }
    }
    points
}

/// Locate the workspace root by walking up to a `Cargo.toml` with `[workspace]`.
pub fn find_project_root() -> Result<PathBuf, TestHelperError> {
    let mut current_dir = env::current_dir().map_err(|e| {
        TestHelperError::ProjectRootNotFound(format!("Failed to get current directory: {}", e))
    })?;

    loop {
        let cargo_toml = current_dir.join("Cargo.toml");
        if cargo_toml.exists() {
            let content = std::fs::read_to_string(&cargo_toml).map_err(|e| {
                TestHelperError::ProjectRootNotFound(format!("Failed to read Cargo.toml: {}", e))
            })?;

            if content.contains("[workspace]") {
                return Ok(current_dir);
            }
        }

        if !current_dir.pop() {
            break;
        }
    }

    Err(TestHelperError::ProjectRootNotFound(
        "Workspace root not found".to_string(),
    ))
}

static PROJECT_ROOT: Lazy<PathBuf> =
    Lazy::new(|| find_project_root().expect("Failed to find project root directory"));

/// `<project_root>/test_output/`, created on first use.
pub fn get_output_dir() -> PathBuf {
    let output_dir = PROJECT_ROOT.join("test_output");

    if !output_dir.exists() {
        std::fs::create_dir_all(&output_dir).expect("Failed to create output directory");
    }

    output_dir
}

pub fn output_path<P: AsRef<Path>>(path: P) -> PathBuf {
    get_output_dir().join(path)
}

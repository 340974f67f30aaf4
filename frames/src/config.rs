//! JSON configuration for synthetic sources.
//!
//! Every field has a default, so `{}` is a valid file describing the default
//! source: ten 128x128 `uint8` frames, unseeded, serving out-of-range
//! indices.

use crate::element::ElementKind;
use crate::error::Result;
use crate::sequence::BoundsPolicy;
use crate::synthetic::{SyntheticFrameSource, DEFAULT_LENGTH, DEFAULT_SHAPE};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_length() -> usize {
    DEFAULT_LENGTH
}

fn default_shape() -> Vec<usize> {
    DEFAULT_SHAPE.to_vec()
}

/// Serializable description of a [`SyntheticFrameSource`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_length")]
    pub length: usize,
    #[serde(default = "default_shape")]
    pub shape: Vec<usize>,
    #[serde(default)]
    pub dtype: ElementKind,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub bounds: BoundsPolicy,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            length: default_length(),
            shape: default_shape(),
            dtype: ElementKind::default(),
            seed: None,
            bounds: BoundsPolicy::default(),
        }
    }
}

impl SourceConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)?;
        info!("Loaded source config from {}", path.display());
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Validate the configuration and construct the source.
    pub fn build(&self) -> Result<SyntheticFrameSource> {
        let source = SyntheticFrameSource::new(self.length, self.shape.clone(), self.dtype)?
            .with_bounds_policy(self.bounds);
        Ok(match self.seed {
            Some(seed) => source.with_seed(seed),
            None => source,
        })
    }
}

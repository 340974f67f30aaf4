//! Frame preview tool for synthetic sequences
//!
//! Builds a synthetic frame source from command line flags (optionally on top
//! of a JSON config file), runs the requested processing steps over it, logs
//! per-frame statistics and writes the displayed plane of one frame to PNG.
//!
//! Example:
//! ```text
//! RUST_LOG=info frame_preview --shape 10,128,128,3 --noise 40 --output out.png
//! ```

use anyhow::Context;
use clap::Parser;
use frames::export::save_png;
use frames::image_proc::{convert_to_grey, locate, LocateParams, GREY_WEIGHTS};
use frames::{
    AddNoise, AnnotationTable, BlackoutLeading, BoundsPolicy, ElementKind, FrameSequence,
    Pipeline, ProcessedSequence, ShapeLayout, SourceConfig,
};
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Frame Preview",
    about = "Generates synthetic frames, applies processing steps and exports a preview",
    long_about = None
)]
struct Args {
    /// JSON source config; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of frames in the sequence
    #[arg(long)]
    length: Option<usize>,

    /// Frame shape, comma separated (e.g. "128,128,3")
    #[arg(long, value_delimiter = ',')]
    shape: Option<Vec<usize>>,

    /// Element type name (uint8, int16, float32, ...)
    #[arg(long)]
    dtype: Option<ElementKind>,

    /// Seed for reproducible frames
    #[arg(long)]
    seed: Option<u64>,

    /// Reject frame indices past the end of the sequence
    #[arg(long)]
    strict: bool,

    /// Frame index to preview
    #[arg(long, default_value_t = 0)]
    frame: usize,

    /// Uniform noise level added to every frame (0 disables)
    #[arg(long, default_value_t = 0.0)]
    noise: f64,

    /// Number of leading entries of the last axis to zero (0 disables)
    #[arg(long, default_value_t = 0)]
    blackout: usize,

    /// Locate particles in the previewed plane
    #[arg(long)]
    locate: bool,

    /// Feature radius in pixels (1-20)
    #[arg(long)]
    radius: Option<usize>,

    /// Minimum integrated brightness of a located feature (1-10000)
    #[arg(long)]
    minmass: Option<f64>,

    /// Minimum distance between located features in pixels (1-20)
    #[arg(long)]
    separation: Option<f64>,

    /// Width of the Gaussian noise filter used when locating (1-20)
    #[arg(long)]
    noise_size: Option<f64>,

    /// Write located particles to this JSON file
    #[arg(long, requires = "locate")]
    annotations: Option<PathBuf>,

    /// PNG output path for the previewed plane
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Args {
    /// Locate settings from the flags, falling back to the defaults.
    fn locate_params(&self) -> frames::Result<LocateParams> {
        let defaults = LocateParams::default();
        let params = LocateParams {
            radius: self.radius.unwrap_or(defaults.radius),
            minmass: self.minmass.unwrap_or(defaults.minmass),
            separation: self.separation.unwrap_or(defaults.separation),
            noise_size: self.noise_size.unwrap_or(defaults.noise_size),
        };
        params.validate()?;
        Ok(params)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SourceConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SourceConfig::default(),
    };
    if let Some(length) = args.length {
        config.length = length;
    }
    if let Some(shape) = &args.shape {
        config.shape = shape.clone();
    }
    if let Some(dtype) = args.dtype {
        config.dtype = dtype;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.strict {
        config.bounds = BoundsPolicy::Strict;
    }

    let source = config.build()?;
    let last_axis = source.frame_shape().last().copied().unwrap_or(0);

    let mut pipeline = Pipeline::new();
    if args.noise > 0.0 {
        pipeline.push(AddNoise);
        pipeline.set("Add noise", "noise_level", args.noise)?;
    }
    if args.blackout > 0 {
        pipeline.push(BlackoutLeading::new(last_axis));
        pipeline.set("Make black", "x", args.blackout as f64)?;
    }

    let sequence = ProcessedSequence::new(source, pipeline)?;
    info!("Processing steps: {:?}", sequence.pipeline().step_names());
    let layout = ShapeLayout::classify(sequence.frame_shape())?;
    info!(
        "Sequence: {} frames of {:?} {} (plane {}, channels {}, depth {}, rgb {})",
        sequence.len(),
        sequence.frame_shape(),
        sequence.pixel_type(),
        layout.plane,
        layout.channels(sequence.frame_shape()),
        layout.depth(sequence.frame_shape()),
        layout.is_rgb()
    );

    let frame = sequence.get_frame(args.frame)?;
    if let Some(stats) = frame.stats() {
        info!(
            "Frame {}: min {:.4}, max {:.4}, mean {:.4}",
            frame.frame_no(),
            stats.min,
            stats.max,
            stats.mean
        );
    }

    if args.locate {
        let plane = frames::Frame::new(
            frame.frame_no(),
            frames::export::display_plane(&frame)?,
        );
        let plane = if plane.ndim() == 3 && plane.shape()[2] == 3 {
            convert_to_grey(&plane, GREY_WEIGHTS[0], GREY_WEIGHTS[1], GREY_WEIGHTS[2])?
        } else {
            plane
        };
        let features = locate(&plane, &args.locate_params()?)?;
        info!("Located {} features", features.len());
        for feature in features.iter().take(10) {
            info!(
                "  x {:.2}, y {:.2}, mass {:.1}, size {:.2}",
                feature.x, feature.y, feature.mass, feature.size
            );
        }
        if let Some(path) = &args.annotations {
            AnnotationTable::from_features(frame.frame_no(), &features).save_to_file(path)?;
            info!("Saved annotations to {}", path.display());
        }
    }

    if let Some(path) = &args.output {
        save_png(&frame, path)?;
        info!("Saved preview to {}", path.display());
    }

    Ok(())
}

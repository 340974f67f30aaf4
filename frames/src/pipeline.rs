//! Processing pipelines with bounded, named parameters.
//!
//! A [`Pipeline`] is an ordered list of [`ProcessStep`]s. Every step
//! declares its [`Parameter`]s (a name, a range, a default and whether the
//! value is an integer); the pipeline keeps the current value of each and
//! rejects out-of-range updates. [`ProcessedSequence`] runs a pipeline over
//! every frame of another sequence and is itself a [`FrameSequence`].

use crate::element::ElementKind;
use crate::error::{FrameError, Result};
use crate::frame::Frame;
use crate::image_proc::{add_noise, blackout_leading, convert_to_grey, GREY_WEIGHTS};
use crate::sequence::FrameSequence;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Numeric domain of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Int,
    Float,
}

/// A bounded, named step parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub kind: ValueKind,
}

impl Parameter {
    pub fn float(name: &str, min: f64, max: f64, default: f64) -> Self {
        Self {
            name: name.to_string(),
            min,
            max,
            default,
            kind: ValueKind::Float,
        }
    }

    pub fn int(name: &str, min: i64, max: i64, default: i64) -> Self {
        Self {
            name: name.to_string(),
            min: min as f64,
            max: max as f64,
            default: default as f64,
            kind: ValueKind::Int,
        }
    }

    /// Validate `value` against the range, rounding integer parameters.
    pub fn coerce(&self, value: f64) -> Result<f64> {
        if !value.is_finite() {
            return Err(self.invalid(format!("{value} is not finite")));
        }
        let value = match self.kind {
            ValueKind::Int => value.round(),
            ValueKind::Float => value,
        };
        if value < self.min || value > self.max {
            return Err(self.invalid(format!(
                "{value} is outside [{}, {}]",
                self.min, self.max
            )));
        }
        Ok(value)
    }

    fn invalid(&self, reason: String) -> FrameError {
        FrameError::InvalidParameter {
            name: self.name.clone(),
            reason,
        }
    }
}

/// Current parameter values of one step, by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterValues(BTreeMap<String, f64>);

impl ParameterValues {
    /// Values initialised from each parameter's default.
    pub fn defaults(parameters: &[Parameter]) -> Self {
        Self(
            parameters
                .iter()
                .map(|p| (p.name.clone(), p.default))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Result<f64> {
        self.0
            .get(name)
            .copied()
            .ok_or_else(|| FrameError::UnknownParameter(name.to_string()))
    }

    /// Integer view of a value, clamped at zero.
    pub fn get_usize(&self, name: &str) -> Result<usize> {
        Ok(self.get(name)?.max(0.0).round() as usize)
    }

    pub fn insert(&mut self, name: &str, value: f64) {
        self.0.insert(name.to_string(), value);
    }
}

/// One stage of a processing pipeline.
pub trait ProcessStep: Send + Sync + fmt::Debug {
    /// Name used to address the step in [`Pipeline::set`].
    fn name(&self) -> &str;

    /// Parameters the step reads from its [`ParameterValues`].
    fn parameters(&self) -> Vec<Parameter>;

    fn apply(&self, frame: &Frame, values: &ParameterValues) -> Result<Frame>;
}

/// Adds `uniform[0, 1) * noise_level` to every element.
#[derive(Debug, Clone, Default)]
pub struct AddNoise;

impl ProcessStep for AddNoise {
    fn name(&self) -> &str {
        "Add noise"
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![Parameter::float("noise_level", 0.0, 100.0, 0.0)]
    }

    fn apply(&self, frame: &Frame, values: &ParameterValues) -> Result<Frame> {
        add_noise(frame, values.get("noise_level")?)
    }
}

/// Zeroes the first `x` entries of the last axis.
#[derive(Debug, Clone)]
pub struct BlackoutLeading {
    max: usize,
}

impl BlackoutLeading {
    /// A step whose `x` parameter ranges over `0..=max`.
    pub fn new(max: usize) -> Self {
        Self { max }
    }
}

impl Default for BlackoutLeading {
    fn default() -> Self {
        Self::new(128)
    }
}

impl ProcessStep for BlackoutLeading {
    fn name(&self) -> &str {
        "Make black"
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![Parameter::int("x", 0, self.max as i64, 0)]
    }

    fn apply(&self, frame: &Frame, values: &ParameterValues) -> Result<Frame> {
        blackout_leading(frame, values.get_usize("x")?)
    }
}

/// Collapses the colour axis with `r`, `g`, `b` weights.
///
/// Drops an axis, so it cannot run inside a [`ProcessedSequence`] whose
/// frame shape was probed without it.
#[derive(Debug, Clone, Default)]
pub struct ConvertToGrey;

impl ProcessStep for ConvertToGrey {
    fn name(&self) -> &str {
        "RGB to Grey"
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::float("r", 0.0, 1.0, GREY_WEIGHTS[0]),
            Parameter::float("g", 0.0, 1.0, GREY_WEIGHTS[1]),
            Parameter::float("b", 0.0, 1.0, GREY_WEIGHTS[2]),
        ]
    }

    fn apply(&self, frame: &Frame, values: &ParameterValues) -> Result<Frame> {
        convert_to_grey(frame, values.get("r")?, values.get("g")?, values.get("b")?)
    }
}

type StepFn = dyn Fn(&Frame, &ParameterValues) -> Result<Frame> + Send + Sync;

/// A step backed by a closure.
pub struct FnStep {
    name: String,
    parameters: Vec<Parameter>,
    func: Box<StepFn>,
}

impl FnStep {
    pub fn new<F>(name: &str, parameters: Vec<Parameter>, func: F) -> Self
    where
        F: Fn(&Frame, &ParameterValues) -> Result<Frame> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            parameters,
            func: Box::new(func),
        }
    }
}

impl fmt::Debug for FnStep {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FnStep")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

impl ProcessStep for FnStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Vec<Parameter> {
        self.parameters.clone()
    }

    fn apply(&self, frame: &Frame, values: &ParameterValues) -> Result<Frame> {
        (self.func)(frame, values)
    }
}

#[derive(Debug)]
struct Stage {
    step: Box<dyn ProcessStep>,
    parameters: Vec<Parameter>,
    values: ParameterValues,
}

/// An ordered list of steps with their current parameter values.
#[derive(Debug, Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step, initialising its parameters to their defaults.
    pub fn push(&mut self, step: impl ProcessStep + 'static) {
        let parameters = step.parameters();
        let values = ParameterValues::defaults(&parameters);
        debug!(
            "Pipeline: appending step '{}' with {} parameters",
            step.name(),
            parameters.len()
        );
        self.stages.push(Stage {
            step: Box::new(step),
            parameters,
            values,
        });
    }

    /// Builder form of [`Pipeline::push`].
    pub fn with_step(mut self, step: impl ProcessStep + 'static) -> Self {
        self.push(step);
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.step.name()).collect()
    }

    fn stage(&self, step: &str) -> Result<&Stage> {
        self.stages
            .iter()
            .find(|s| s.step.name() == step)
            .ok_or_else(|| FrameError::UnknownParameter(format!("{step}.*")))
    }

    /// Current value of `param` on the first step named `step`.
    pub fn get(&self, step: &str, param: &str) -> Result<f64> {
        self.stage(step)?
            .values
            .get(param)
            .map_err(|_| FrameError::UnknownParameter(format!("{step}.{param}")))
    }

    /// Set `param` on the first step named `step`, validating its range.
    pub fn set(&mut self, step: &str, param: &str, value: f64) -> Result<()> {
        let stage = self
            .stages
            .iter_mut()
            .find(|s| s.step.name() == step)
            .ok_or_else(|| FrameError::UnknownParameter(format!("{step}.{param}")))?;
        let parameter = stage
            .parameters
            .iter()
            .find(|p| p.name == param)
            .ok_or_else(|| FrameError::UnknownParameter(format!("{step}.{param}")))?;
        let value = parameter.coerce(value)?;
        stage.values.insert(param, value);
        debug!("Pipeline: {step}.{param} = {value}");
        Ok(())
    }

    /// Run every step in order.
    pub fn apply(&self, frame: &Frame) -> Result<Frame> {
        let mut current = frame.clone();
        for stage in &self.stages {
            trace!(
                "Applying '{}' to frame {}",
                stage.step.name(),
                current.frame_no()
            );
            current = stage.step.apply(&current, &stage.values)?;
        }
        Ok(current)
    }
}

/// A sequence whose frames are another sequence's frames run through a pipeline.
///
/// The output shape and kind are probed from frame 0 at construction. Every
/// later frame must match them, so a parameter change that alters the shape
/// surfaces as [`FrameError::ShapeMismatch`] instead of a silently
/// inconsistent sequence.
#[derive(Debug)]
pub struct ProcessedSequence<S> {
    source: S,
    pipeline: Pipeline,
    shape: Vec<usize>,
    kind: ElementKind,
}

impl<S: FrameSequence> ProcessedSequence<S> {
    pub fn new(source: S, pipeline: Pipeline) -> Result<Self> {
        let (shape, kind) = if source.is_empty() {
            (source.frame_shape().to_vec(), source.pixel_type())
        } else {
            let probe = pipeline.apply(&source.get_frame(0)?)?;
            (probe.shape().to_vec(), probe.kind())
        };
        debug!(
            "Processed sequence: {} steps, {:?} {} -> {:?} {}",
            pipeline.len(),
            source.frame_shape(),
            source.pixel_type(),
            shape,
            kind
        );
        Ok(Self {
            source,
            pipeline,
            shape,
            kind,
        })
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Update a step parameter; see [`Pipeline::set`].
    pub fn set(&mut self, step: &str, param: &str, value: f64) -> Result<()> {
        self.pipeline.set(step, param, value)
    }
}

impl<S: FrameSequence> FrameSequence for ProcessedSequence<S> {
    fn len(&self) -> usize {
        self.source.len()
    }

    fn frame_shape(&self) -> &[usize] {
        &self.shape
    }

    fn pixel_type(&self) -> ElementKind {
        self.kind
    }

    fn get_frame(&self, index: usize) -> Result<Frame> {
        let frame = self.pipeline.apply(&self.source.get_frame(index)?)?;
        frame.ensure_shape(&self.shape)?;
        if frame.kind() != self.kind {
            return Err(FrameError::InvalidConfiguration(format!(
                "pipeline changed element kind from {} to {}",
                self.kind,
                frame.kind()
            )));
        }
        Ok(frame)
    }
}

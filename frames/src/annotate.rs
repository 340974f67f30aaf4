//! Coordinate annotations attached to frames.
//!
//! An [`AnnotationTable`] is a flat list of points, each tagged with the
//! frame it belongs to and optionally a particle id and a z coordinate.
//! When a sequence has several non-spatial axes, [`FrameAxes`] maps the
//! table's flat `frame` number onto per-axis coordinates (for `"tc"`, frame
//! `f` of a sequence with `C` channels is time `f / C`, channel `f % C`).

use crate::error::{FrameError, Result};
use crate::image_proc::Feature;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// One annotated point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub frame: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub particle: Option<usize>,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

/// A table of annotated points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationTable {
    records: Vec<AnnotationRecord>,
}

impl AnnotationTable {
    pub fn new(records: Vec<AnnotationRecord>) -> Self {
        Self { records }
    }

    /// Table of located features in one frame, numbered as particles.
    pub fn from_features(frame: usize, features: &[Feature]) -> Self {
        let mut table = Self::default();
        table.extend_from_features(frame, features);
        table
    }

    /// Append located features, continuing particle ids from the table size.
    pub fn extend_from_features(&mut self, frame: usize, features: &[Feature]) {
        let first_id = self.records.len();
        self.records
            .extend(features.iter().enumerate().map(|(i, f)| AnnotationRecord {
                frame,
                particle: Some(first_id + i),
                x: f.x,
                y: f.y,
                z: None,
            }));
    }

    pub fn push(&mut self, record: AnnotationRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[AnnotationRecord] {
        &self.records
    }

    /// Distinct frame numbers, ascending.
    pub fn frames(&self) -> Vec<usize> {
        self.records
            .iter()
            .map(|r| r.frame)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn points_in_frame(&self, frame: usize) -> Vec<&AnnotationRecord> {
        self.records.iter().filter(|r| r.frame == frame).collect()
    }

    /// Points of `frame` whose z lies within `tolerance` of `z`.
    ///
    /// Records without a z coordinate never match.
    pub fn points_in_slice(&self, frame: usize, z: f64, tolerance: f64) -> Vec<&AnnotationRecord> {
        self.records
            .iter()
            .filter(|r| r.frame == frame)
            .filter(|r| r.z.is_some_and(|rz| (rz - z).abs() <= tolerance))
            .collect()
    }

    /// Records grouped by particle id, each group ordered by frame.
    ///
    /// Records without a particle id are left out.
    pub fn tracks(&self) -> BTreeMap<usize, Vec<&AnnotationRecord>> {
        let mut tracks: BTreeMap<usize, Vec<&AnnotationRecord>> = BTreeMap::new();
        for record in &self.records {
            if let Some(particle) = record.particle {
                tracks.entry(particle).or_default().push(record);
            }
        }
        for track in tracks.values_mut() {
            track.sort_by_key(|r| r.frame);
        }
        tracks
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

/// Ordered axes enumerated by a flat frame number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameAxes {
    axes: Vec<char>,
}

impl FrameAxes {
    pub fn axes(&self) -> &[char] {
        &self.axes
    }

    fn sizes_for(&self, sizes: &[(char, usize)]) -> Result<Vec<usize>> {
        self.axes
            .iter()
            .map(|axis| {
                sizes
                    .iter()
                    .find(|(name, _)| name == axis)
                    .map(|&(_, size)| size)
                    .filter(|&size| size > 0)
                    .ok_or_else(|| {
                        FrameError::InvalidConfiguration(format!(
                            "no positive size given for frame axis '{axis}'"
                        ))
                    })
            })
            .collect()
    }

    /// Split a flat frame number into per-axis coordinates, last axis fastest.
    pub fn coords(&self, frame: usize, sizes: &[(char, usize)]) -> Result<Vec<(char, usize)>> {
        let axis_sizes = self.sizes_for(sizes)?;
        let total: usize = axis_sizes.iter().product();
        if frame >= total {
            return Err(FrameError::IndexOutOfRange {
                index: frame,
                length: total,
            });
        }

        let mut remainder = frame;
        let mut coords = vec![('\0', 0); self.axes.len()];
        for (i, (&axis, &size)) in self.axes.iter().zip(&axis_sizes).enumerate().rev() {
            coords[i] = (axis, remainder % size);
            remainder /= size;
        }
        Ok(coords)
    }

    /// Inverse of [`FrameAxes::coords`].
    pub fn flat_index(&self, coords: &[(char, usize)], sizes: &[(char, usize)]) -> Result<usize> {
        let axis_sizes = self.sizes_for(sizes)?;
        let mut index = 0;
        for (&axis, &size) in self.axes.iter().zip(&axis_sizes) {
            let coord = coords
                .iter()
                .find(|(name, _)| *name == axis)
                .map(|&(_, c)| c)
                .ok_or_else(|| {
                    FrameError::InvalidConfiguration(format!("missing coordinate for '{axis}'"))
                })?;
            if coord >= size {
                return Err(FrameError::IndexOutOfRange {
                    index: coord,
                    length: size,
                });
            }
            index = index * size + coord;
        }
        Ok(index)
    }
}

impl Default for FrameAxes {
    fn default() -> Self {
        Self { axes: vec!['t'] }
    }
}

impl FromStr for FrameAxes {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        let axes: Vec<char> = s.trim().chars().collect();
        if axes.is_empty() {
            return Err(FrameError::InvalidConfiguration(
                "frame axes must name at least one axis".to_string(),
            ));
        }
        if let Some(bad) = axes.iter().find(|c| !c.is_ascii_lowercase()) {
            return Err(FrameError::InvalidConfiguration(format!(
                "invalid frame axis '{bad}'"
            )));
        }
        let unique: BTreeSet<_> = axes.iter().collect();
        if unique.len() != axes.len() {
            return Err(FrameError::InvalidConfiguration(format!(
                "frame axes '{s}' repeat an axis"
            )));
        }
        Ok(Self { axes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(frame: usize, particle: usize, x: f64, z: Option<f64>) -> AnnotationRecord {
        AnnotationRecord {
            frame,
            particle: Some(particle),
            x,
            y: x + 1.0,
            z,
        }
    }

    #[test]
    fn test_frames_and_points() {
        let table = AnnotationTable::new(vec![
            record(2, 0, 10.0, None),
            record(0, 0, 11.0, None),
            record(2, 1, 50.0, None),
        ]);
        assert_eq!(table.frames(), vec![0, 2]);
        assert_eq!(table.points_in_frame(2).len(), 2);
        assert!(table.points_in_frame(1).is_empty());
    }

    #[test]
    fn test_tracks_are_frame_ordered() {
        let mut table = AnnotationTable::new(vec![
            record(3, 7, 1.0, None),
            record(1, 7, 2.0, None),
            record(2, 8, 3.0, None),
        ]);
        table.push(AnnotationRecord {
            frame: 0,
            particle: None,
            x: 0.0,
            y: 0.0,
            z: None,
        });

        let tracks = table.tracks();
        assert_eq!(tracks.len(), 2);
        let frames: Vec<usize> = tracks[&7].iter().map(|r| r.frame).collect();
        assert_eq!(frames, vec![1, 3]);
    }

    #[test]
    fn test_points_in_slice() {
        let table = AnnotationTable::new(vec![
            record(0, 0, 1.0, Some(10.2)),
            record(0, 1, 1.0, Some(12.0)),
            record(0, 2, 1.0, None),
            record(1, 3, 1.0, Some(10.0)),
        ]);
        let slice = table.points_in_slice(0, 10.0, 0.5);
        assert_eq!(slice.len(), 1);
        assert_eq!(slice[0].particle, Some(0));
    }

    #[test]
    fn test_from_features() {
        let features = [
            Feature {
                x: 1.0,
                y: 2.0,
                mass: 30.0,
                size: 1.2,
            },
            Feature {
                x: 5.0,
                y: 6.0,
                mass: 20.0,
                size: 1.1,
            },
        ];
        let mut table = AnnotationTable::from_features(4, &features);
        table.extend_from_features(5, &features[..1]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.records()[1].particle, Some(1));
        assert_eq!(table.records()[2].particle, Some(2));
        assert_eq!(table.records()[2].frame, 5);
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotations.json");
        let table = AnnotationTable::new(vec![record(0, 1, 3.5, Some(2.0)), record(1, 1, 4.0, None)]);
        table.save_to_file(&path).unwrap();
        assert_eq!(AnnotationTable::load_from_file(&path).unwrap(), table);

        let sparse: AnnotationTable =
            serde_json::from_str(r#"[{"frame": 2, "x": 1.0, "y": 2.0}]"#).unwrap();
        assert_eq!(sparse.records()[0].particle, None);
        assert_eq!(sparse.records()[0].z, None);
    }

    #[test]
    fn test_frame_axes_parse() {
        assert_eq!("tc".parse::<FrameAxes>().unwrap().axes(), &['t', 'c']);
        assert_eq!(FrameAxes::default().axes(), &['t']);
        assert!("".parse::<FrameAxes>().is_err());
        assert!("tt".parse::<FrameAxes>().is_err());
        assert!("t1".parse::<FrameAxes>().is_err());
    }

    #[test]
    fn test_frame_axes_coords() {
        let axes: FrameAxes = "tc".parse().unwrap();
        let sizes = [('t', 10), ('c', 3)];

        assert_eq!(axes.coords(0, &sizes).unwrap(), vec![('t', 0), ('c', 0)]);
        assert_eq!(axes.coords(4, &sizes).unwrap(), vec![('t', 1), ('c', 1)]);
        assert_eq!(axes.coords(29, &sizes).unwrap(), vec![('t', 9), ('c', 2)]);
        assert!(matches!(
            axes.coords(30, &sizes),
            Err(FrameError::IndexOutOfRange {
                index: 30,
                length: 30
            })
        ));

        for frame in 0..30 {
            let coords = axes.coords(frame, &sizes).unwrap();
            assert_eq!(axes.flat_index(&coords, &sizes).unwrap(), frame);
        }
        assert!(axes.coords(0, &[('t', 10)]).is_err());
    }
}

//! The frame sequence interface consumed by viewers.

use crate::element::ElementKind;
use crate::error::{FrameError, Result};
use crate::frame::Frame;
use serde::{Deserialize, Serialize};

/// An ordered, fixed-length collection of frames sharing one shape and kind.
///
/// Implementations are immutable once constructed. `get_frame` returns a
/// freshly owned [`Frame`] whose shape equals [`FrameSequence::frame_shape`].
pub trait FrameSequence: Send + Sync {
    /// Number of frames, fixed at construction.
    fn len(&self) -> usize;

    /// Dimension sizes shared by every frame.
    fn frame_shape(&self) -> &[usize];

    /// Element kind shared by every frame.
    fn pixel_type(&self) -> ElementKind;

    /// Produce frame `index`.
    fn get_frame(&self, index: usize) -> Result<Frame>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over frames `0..len()` in order.
    fn frames(&self) -> FrameIter<'_, Self>
    where
        Self: Sized,
    {
        FrameIter {
            sequence: self,
            next: 0,
        }
    }
}

impl<S: FrameSequence + ?Sized> FrameSequence for Box<S> {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn frame_shape(&self) -> &[usize] {
        (**self).frame_shape()
    }

    fn pixel_type(&self) -> ElementKind {
        (**self).pixel_type()
    }

    fn get_frame(&self, index: usize) -> Result<Frame> {
        (**self).get_frame(index)
    }
}

/// Iterator returned by [`FrameSequence::frames`].
pub struct FrameIter<'a, S> {
    sequence: &'a S,
    next: usize,
}

impl<S: FrameSequence> Iterator for FrameIter<'_, S> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.sequence.len() {
            return None;
        }
        let frame = self.sequence.get_frame(self.next);
        self.next += 1;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.sequence.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl<S: FrameSequence> ExactSizeIterator for FrameIter<'_, S> {}

/// How a sequence treats indices at or past its length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundsPolicy {
    /// Serve any index; out-of-range frames are generated like the rest.
    #[default]
    Permissive,
    /// Reject indices `>= len` with [`FrameError::IndexOutOfRange`].
    Strict,
}

impl BoundsPolicy {
    /// Apply the policy to `index` for a sequence of `length` frames.
    ///
    /// Returns `true` when the index lies past the end but is allowed.
    pub fn check(self, index: usize, length: usize) -> Result<bool> {
        if index < length {
            return Ok(false);
        }
        match self {
            BoundsPolicy::Permissive => Ok(true),
            BoundsPolicy::Strict => Err(FrameError::IndexOutOfRange { index, length }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_policy() {
        assert!(!BoundsPolicy::Strict.check(2, 3).unwrap());
        assert!(BoundsPolicy::Permissive.check(3, 3).unwrap());
        let err = BoundsPolicy::Strict.check(3, 3).unwrap_err();
        assert!(matches!(
            err,
            FrameError::IndexOutOfRange {
                index: 3,
                length: 3
            }
        ));
    }

    #[test]
    fn test_bounds_policy_serde() {
        let policy: BoundsPolicy = serde_json::from_str("\"strict\"").unwrap();
        assert_eq!(policy, BoundsPolicy::Strict);
        assert_eq!(BoundsPolicy::default(), BoundsPolicy::Permissive);
    }
}

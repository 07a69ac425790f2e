//! Offline classification of index groups by structural pattern.
//!
//! Indexed stores pay very different costs depending on the shape of their
//! indices, but the engine never inspects indices at operation time; the
//! caller asserts a [`Constraint`] instead. This module produces those
//! assertions ahead of time: it walks an index array in register-width
//! groups, classifies each group, and buckets the group offsets so a caller
//! can issue one batched pass per bucket with the matching constraint.
//!
//! Classification is advisory and runs once per batch, not per operation.
//! [`Constraint::Contiguous`] is never inferred here: a dense run is
//! knowledge about how the indices were produced, not something a lone
//! group of values can prove, so callers assert it directly when they have
//! it. Groups that fit no special pattern are sound to dispatch with
//! [`Constraint::None`].

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::element::IndexElement;
use crate::error::{RayoError, Result};
use crate::Constraint;

/// Group start offsets, bucketed by classified pattern.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Groups whose lanes all target one location.
    pub constant: Vec<usize>,
    /// Groups with pairwise distinct lanes.
    pub independent: Vec<usize>,
    /// Sorted groups with at least one duplicate run.
    pub monotonic: Vec<usize>,
}

impl Partition {
    /// Total number of bucketed groups.
    pub fn len(&self) -> usize {
        self.constant.len() + self.independent.len() + self.monotonic.len()
    }

    /// True when no groups were bucketed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The offsets bucketed under `c`.
    ///
    /// Patterns the classifier never produces (`None`, `Contiguous`) have
    /// an empty bucket.
    pub fn offsets(&self, c: Constraint) -> &[usize] {
        match c {
            Constraint::Constant => &self.constant,
            Constraint::Independent => &self.independent,
            Constraint::Monotonic => &self.monotonic,
            Constraint::None | Constraint::Contiguous => &[],
        }
    }
}

/// Classifies one group of lane indices.
///
/// Rules, in order: first and last lane equal means `Constant`; otherwise
/// all adjacent lanes distinct means `Independent`; anything else is
/// `Monotonic`, the catch-all for sorted groups with duplicate runs. The
/// first rule reads only two lanes, which makes it exact for sorted groups
/// and a deliberate constant heuristic for the degenerate distributions
/// where whole groups repeat one index.
///
/// # Panics
///
/// Panics if `group` is empty.
///
/// # Examples
///
/// ```
/// use rayo::{classify::classify_group, Constraint};
///
/// assert_eq!(classify_group(&[3, 3, 3, 3]), Constraint::Constant);
/// assert_eq!(classify_group(&[1, 2, 3, 4]), Constraint::Independent);
/// assert_eq!(classify_group(&[1, 1, 2, 3]), Constraint::Monotonic);
/// ```
pub fn classify_group<T: IndexElement>(group: &[T]) -> Constraint {
    assert!(!group.is_empty(), "cannot classify an empty index group");
    if group[0] == group[group.len() - 1] {
        Constraint::Constant
    } else if group.windows(2).all(|w| w[0] != w[1]) {
        Constraint::Independent
    } else {
        Constraint::Monotonic
    }
}

/// Partitions `indices` into `width`-sized groups bucketed by pattern.
///
/// One linear pass over the array. The offsets pushed into each bucket are
/// element offsets of the group's first lane, ready to slice both the index
/// array and the values that travel with it.
///
/// # Errors
///
/// Returns [`RayoError::InvalidGroupWidth`] if `width` is zero or does not
/// divide `indices.len()`.
///
/// # Examples
///
/// ```
/// use rayo::classify::partition;
///
/// let idx = [5, 5, 5, 5, 0, 2, 4, 6, 1, 1, 3, 9];
/// let part = partition(&idx, 4).unwrap();
/// assert_eq!(part.constant, [0]);
/// assert_eq!(part.independent, [4]);
/// assert_eq!(part.monotonic, [8]);
/// ```
#[cfg_attr(feature = "tracing", instrument(skip(indices), fields(len = indices.len())))]
pub fn partition<T: IndexElement>(indices: &[T], width: usize) -> Result<Partition> {
    if width == 0 || indices.len() % width != 0 {
        return Err(RayoError::InvalidGroupWidth {
            len: indices.len(),
            width,
        });
    }
    let mut part = Partition::default();
    for start in (0..indices.len()).step_by(width) {
        match classify_group(&indices[start..start + width]) {
            Constraint::Constant => part.constant.push(start),
            Constraint::Independent => part.independent.push(start),
            Constraint::Monotonic => part.monotonic.push(start),
            Constraint::None | Constraint::Contiguous => {
                unreachable!("classify_group never yields this pattern")
            }
        }
    }
    Ok(part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_constant() {
        assert_eq!(classify_group(&[3, 3, 3, 3]), Constraint::Constant);
        assert_eq!(classify_group(&[7]), Constraint::Constant);
    }

    #[test]
    fn test_classify_independent() {
        assert_eq!(classify_group(&[1, 2, 3, 4]), Constraint::Independent);
        assert_eq!(classify_group(&[9, 0, 4, 2]), Constraint::Independent);
    }

    #[test]
    fn test_classify_monotonic() {
        assert_eq!(classify_group(&[1, 1, 2, 3]), Constraint::Monotonic);
        assert_eq!(classify_group(&[0, 5, 5, 8]), Constraint::Monotonic);
    }

    #[test]
    fn test_classify_first_last_heuristic() {
        // Only the first and last lane decide the constant bucket.
        assert_eq!(classify_group(&[3, 1, 2, 3]), Constraint::Constant);
    }

    #[test]
    fn test_partition_buckets_offsets() {
        let idx: Vec<i32> = vec![
            2, 2, 2, 2, // constant
            1, 3, 5, 7, // independent
            0, 0, 1, 2, // monotonic
            6, 6, 6, 6, // constant
        ];
        let part = partition(&idx, 4).unwrap();
        assert_eq!(part.constant, [0, 12]);
        assert_eq!(part.independent, [4]);
        assert_eq!(part.monotonic, [8]);
        assert_eq!(part.len(), 4);
        assert!(!part.is_empty());
        assert_eq!(part.offsets(Constraint::Constant), [0, 12]);
        assert!(part.offsets(Constraint::None).is_empty());
    }

    #[test]
    fn test_partition_rejects_ragged_input() {
        assert_eq!(
            partition(&[1, 2, 3], 4).unwrap_err(),
            RayoError::InvalidGroupWidth { len: 3, width: 4 }
        );
        assert_eq!(
            partition::<i32>(&[], 0).unwrap_err(),
            RayoError::InvalidGroupWidth { len: 0, width: 0 }
        );
    }
}

//! Cumulative-slope reversal segmentation
//!
//! The series is cut where the magnitude of the growing-window least
//! squares slope (always fitted from index 0) has moved in the same
//! direction for `min_run_length` consecutive steps. This is a heuristic
//! proxy for "a new directional trend has begun"; it is not a changepoint
//! optimal method and gives no guarantee of minimal segmentation error.
//!
//! Steps where the magnitude is unchanged up to rounding noise leave the run
//! state untouched, so a linear or flat stretch never completes a run and a
//! linear series yields only its start and end boundaries. The noise floor
//! scales with the slope magnitudes and with the largest value seen divided
//! by the window span, the error a single rounded value induces in a slope.

use num_traits::Float;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{LeastSquares, Observation, helper::nearly_equal};

/// A contiguous, inclusive index range of a series treated as one trend unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    /// First index, inclusive
    pub start: usize,
    /// Last index, inclusive
    pub end: usize,
}

impl Segment {
    /// Creates a segment spanning `start..=end`
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the number of points covered by the segment
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start) + 1
    }

    /// Returns `true` if the segment covers `index`
    pub const fn contains(&self, index: usize) -> bool {
        self.start <= index && index <= self.end
    }

    /// Returns the segment as an inclusive range
    pub const fn range(&self) -> core::ops::RangeInclusive<usize> {
        self.start..=self.end
    }
}

/// Pairs consecutive boundaries into segments.
///
/// Neighbouring segments share their boundary point.
///
/// # Examples
///
/// ```
/// use trend_segments::{segments, Segment};
///
/// let segs: Vec<Segment> = segments(&[0, 4, 8]).collect();
/// assert_eq!(segs, vec![Segment::new(0, 4), Segment::new(4, 8)]);
/// ```
pub fn segments(boundaries: &[usize]) -> impl Iterator<Item = Segment> + '_ {
    boundaries.windows(2).map(|w| Segment::new(w[0], w[1]))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlopeChange {
    Shrinking,
    Growing,
}

/// Counts consecutive same-direction magnitude changes
#[derive(Debug)]
struct RunTracker {
    min_run_length: usize,
    changes: usize,
    last: SlopeChange,
    run_start: usize,
}

impl RunTracker {
    fn new(min_run_length: usize) -> Self {
        Self {
            min_run_length,
            changes: 0,
            last: SlopeChange::Growing,
            run_start: 0,
        }
    }

    /// Records a classified step and returns the run start once the run is long enough
    fn observe(&mut self, index: usize, change: SlopeChange) -> Option<usize> {
        if change != self.last {
            self.changes = 0;
        }
        if self.changes == 0 {
            self.run_start = index;
        }
        self.changes += 1;
        self.last = change;

        if self.changes == self.min_run_length {
            self.changes = 0;
            Some(self.run_start)
        } else {
            None
        }
    }
}

/// Partitions a series into trend-candidate segments.
///
/// See [`segment_values`] for the algorithm; only the observation values
/// take part, regressed against their position in the series.
///
/// # Arguments
///
/// * `series` - The ordered observations
/// * `min_run_length` - Consecutive same-direction changes that open a new segment
///
/// # Returns
///
/// * `Vec<usize>` - The boundary indices, `[0, …, n − 1]`
pub fn segment<X, T>(series: &[Observation<X, T>], min_run_length: usize) -> Vec<usize>
where
    T: Default + Float,
{
    segment_values(series.iter().map(|o| o.value), min_run_length)
}

/// Partitions a sequence of values into trend-candidate segments.
///
/// For every index `i ≥ 1` the slope of the values over positions `0..=i`
/// is updated incrementally. Its magnitude is compared to the previous one
/// (the slope before index 1 is taken as zero): shrinking and growing steps
/// extend or restart a run, magnitudes equal up to rounding noise are skipped. When a run reaches
/// `min_run_length` steps the index at which it began is appended to the
/// boundaries and counting starts over. `n − 1` is always appended last,
/// even if it repeats the previous boundary.
///
/// A `min_run_length` of zero is treated as one.
///
/// # Arguments
///
/// * `values` - The ordered values
/// * `min_run_length` - Consecutive same-direction changes that open a new segment
///
/// # Returns
///
/// * `Vec<usize>` - Non-decreasing boundary indices starting at `0` and ending at `n − 1`;
///   `[0]` for a single value and empty for no values
///
/// # Examples
///
/// ```
/// use trend_segments::segment_values;
///
/// let values = [1.0, 2.0, 3.0, 4.0, 1.0, 1.0, 1.0, 1.0, 1.0];
/// assert_eq!(segment_values(values, 2), vec![0, 4, 6, 8]);
/// ```
pub fn segment_values<T, I>(values: I, min_run_length: usize) -> Vec<usize>
where
    T: Default + Float,
    I: IntoIterator<Item = T>,
{
    let mut values = values.into_iter();
    let Some(first) = values.next() else {
        return Vec::new();
    };

    let mut tracker = RunTracker::new(min_run_length.max(1));
    let mut boundaries = vec![0];
    let mut cumulative = LeastSquares::new();
    let mut x = T::zero();
    let mut previous = T::zero();
    let mut last_index = 0;
    let mut value_scale = first.abs();

    cumulative.next((x, first));

    for (i, y) in values.enumerate().map(|(i, y)| (i + 1, y)) {
        last_index = i;
        x = x + T::one();
        value_scale = value_scale.max(y.abs());

        let magnitude = cumulative.next((x, y)).slope().unwrap_or_else(T::zero).abs();
        let noise = magnitude.max(previous) + value_scale / x;
        let change = if nearly_equal(magnitude, previous, noise) {
            None
        } else if magnitude < previous {
            Some(SlopeChange::Shrinking)
        } else {
            Some(SlopeChange::Growing)
        };

        if let Some(start) = change.and_then(|c| tracker.observe(i, c)) {
            boundaries.push(start);
        }
        previous = magnitude;
    }

    if last_index > 0 {
        boundaries.push(last_index);
    }

    debug!(
        points = last_index + 1,
        boundaries = boundaries.len(),
        min_run_length,
        "segmented series"
    );

    boundaries
}

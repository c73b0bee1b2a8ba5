//! Per-segment trend regression
//!
//! Each segment is fitted with ordinary least squares of `value` on the
//! serial encoding of `time` (see [`SerialTime`]). The slope is tested
//! against zero with a two-sided Student-t test on `n − 2` degrees of
//! freedom.
//!
//! Conventions for fits without residual degrees of freedom: a two-point
//! segment is an exact fit, and so is any segment whose residuals are zero
//! up to rounding noise. Such fits get a p-value of `0` when the slope is
//! non-zero (always significant) and `1` when it is zero.
//!
//! A segment whose values are all equal up to rounding noise is flat: its
//! slope is exactly zero, its intercept is the mean value and its p-value
//! is `1`.

use num_traits::Float;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::{debug, warn};

use crate::{
    Error, Kbn, LeastSquares, Observation, Result, Segment, SegmentFailure, SerialTime,
    helper::nearly_equal, segments,
};

/// Direction of a fitted trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Positive slope
    Up,
    /// Zero or negative slope
    Down,
}

impl Direction {
    /// Classifies a slope; a zero slope counts as `Down`
    pub fn of<T: Float>(slope: T) -> Self {
        if slope > T::zero() {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

/// Linear fit of one segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult<T> {
    /// The fitted segment
    pub segment: Segment,
    /// Change in value per unit of serial time
    pub slope: T,
    /// Fitted value at serial time zero
    pub intercept: T,
    /// Standard error of the slope
    pub std_error: T,
    /// Two-sided p-value of the slope against zero
    pub p_value: f64,
    /// Number of points in the fit
    pub n: usize,
}

impl<T> RegressionResult<T>
where
    T: Default + Float,
{
    /// Returns the direction of the trend
    pub fn direction(&self) -> Direction {
        Direction::of(self.slope)
    }

    /// Returns `true` if the p-value is at or below `level`
    pub fn is_significant(&self, level: f64) -> bool {
        self.p_value <= level
    }

    /// Evaluates the fitted line at a time
    ///
    /// # Arguments
    ///
    /// * `time` - Any time in the same encoding as the series
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The fitted value, or `None` if the serial time is not representable in `T`
    pub fn fitted<X: SerialTime>(&self, time: &X) -> Option<T> {
        let x = T::from(time.serial())?;
        Some(self.intercept + self.slope * x)
    }

    /// Returns the fitted line over the segment's own observations
    ///
    /// # Arguments
    ///
    /// * `series` - The series the segment was taken from
    ///
    /// # Returns
    ///
    /// * `Vec<T>` - One fitted value per point of the segment, empty if the segment is out of bounds
    pub fn fitted_line<X: SerialTime>(&self, series: &[Observation<X, T>]) -> Vec<T> {
        series
            .get(self.segment.range())
            .map(|points| points.iter().filter_map(|p| self.fitted(&p.time)).collect())
            .unwrap_or_default()
    }
}

/// Regressions of a whole boundary list, with the segments that had to be skipped
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionReport<T> {
    /// Successful fits, in series order
    pub results: Vec<RegressionResult<T>>,
    /// Segments excluded from `results`, in series order
    pub failures: Vec<SegmentFailure>,
}

impl<T> Default for RegressionReport<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> RegressionReport<T> {
    /// Consumes the report, keeping only the successful fits
    pub fn into_results(self) -> Vec<RegressionResult<T>> {
        self.results
    }
}

/// Fits one segment of a series.
///
/// # Arguments
///
/// * `series` - The ordered observations
/// * `segment` - The inclusive index range to fit
///
/// # Returns
///
/// * `Result<RegressionResult<T>>` - The fit, `InsufficientData` for fewer than two points,
///   `DegenerateInput` when every time in the segment is identical
///
/// # Examples
///
/// ```
/// use trend_segments::{regress_segment, Direction, Observation, Segment};
///
/// let series = [Observation::new(2020, 10.0), Observation::new(2021, 12.0)];
/// let fit = regress_segment(&series, Segment::new(0, 1)).unwrap();
/// assert_eq!(fit.slope, 2.0);
/// assert_eq!(fit.direction(), Direction::Up);
/// assert_eq!(fit.p_value, 0.0);
/// ```
pub fn regress_segment<X, T>(
    series: &[Observation<X, T>],
    segment: Segment,
) -> Result<RegressionResult<T>>
where
    X: SerialTime,
    T: Default + Float,
{
    let points = series.get(segment.range()).ok_or_else(|| {
        Error::InvalidParameter(format!(
            "segment {}..={} is out of bounds for {} points",
            segment.start,
            segment.end,
            series.len()
        ))
    })?;
    let n = points.len();
    let Some(first) = points.first() else {
        return Err(Error::too_few_points(0));
    };
    if n < 2 {
        return Err(Error::too_few_points(n));
    }

    // Shift the axis to the first time so large serial values keep their precision
    let origin = first.time.serial();
    let shifted = |p: &Observation<X, T>| {
        T::from(p.time.serial() - origin).ok_or_else(|| Error::unrepresentable("serial time"))
    };

    let mut ls = LeastSquares::new();
    for p in points {
        ls.next((shifted(p)?, p.value));
    }

    let degenerate = || Error::DegenerateInput("time axis has zero variance in segment".to_string());
    let fitted_slope = ls.slope().ok_or_else(degenerate)?;
    let fitted_intercept = ls.intercept().ok_or_else(degenerate)?;
    let sxx = ls.sxx().ok_or_else(degenerate)?;
    let mean_y = ls.mean().map_or(first.value, |(_, mean_y)| mean_y);

    let (low, high) = points.iter().fold((first.value, first.value), |(lo, hi), p| {
        (lo.min(p.value), hi.max(p.value))
    });
    let flat = nearly_equal(low, high, low.abs().max(high.abs()));
    let (slope, shifted_intercept) = if flat {
        (T::zero(), mean_y)
    } else {
        (fitted_slope, fitted_intercept)
    };

    let mut sse = Kbn::<T>::default();
    let mut syy = Kbn::<T>::default();
    for p in points {
        let residual = p.value - (shifted_intercept + slope * shifted(p)?);
        sse += residual * residual;
        syy += (p.value - mean_y) * (p.value - mean_y);
    }
    let sse = sse.total();

    let origin_t = T::from(origin).ok_or_else(|| Error::unrepresentable("serial time"))?;
    let intercept = shifted_intercept - slope * origin_t;

    let dof = n - 2;
    let exact = dof == 0 || flat || nearly_equal(sse, T::zero(), syy.total());
    let (std_error, p_value) = if exact {
        let p_value = if slope.is_zero() { 1.0 } else { 0.0 };
        (T::zero(), p_value)
    } else {
        let dof_t = T::from(dof).ok_or_else(|| Error::unrepresentable("degrees of freedom"))?;
        let std_error = (sse / dof_t / sxx).sqrt();
        let t = (slope / std_error)
            .to_f64()
            .ok_or_else(|| Error::unrepresentable("t statistic"))?;
        (std_error, two_sided_p_value(t, dof as f64)?)
    };

    Ok(RegressionResult {
        segment,
        slope,
        intercept,
        std_error,
        p_value,
        n,
    })
}

fn two_sided_p_value(t: f64, dof: f64) -> Result<f64> {
    let dist = StudentsT::new(0.0, 1.0, dof)
        .map_err(|e| Error::Computation(format!("Failed to create t-distribution: {e}")))?;
    Ok((2.0 * dist.sf(t.abs())).min(1.0))
}

/// Fits every segment defined by consecutive boundary pairs.
///
/// Segments that cannot be fitted are skipped and reported in
/// [`RegressionReport::failures`]; the remaining fits keep series order.
/// With the `parallel` feature the segments are fitted on the rayon pool.
///
/// # Arguments
///
/// * `series` - The ordered observations
/// * `boundaries` - Boundary indices as returned by [`segment`](crate::segment)
///
/// # Returns
///
/// * `RegressionReport<T>` - Fits and skipped segments
pub fn regress_segments<X, T>(series: &[Observation<X, T>], boundaries: &[usize]) -> RegressionReport<T>
where
    X: SerialTime + Sync,
    T: Default + Float + Send + Sync,
{
    let segs: Vec<Segment> = segments(boundaries).collect();

    #[cfg(feature = "parallel")]
    let outcomes: Vec<(Segment, Result<RegressionResult<T>>)> = segs
        .par_iter()
        .map(|s| (*s, regress_segment(series, *s)))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<(Segment, Result<RegressionResult<T>>)> = segs
        .iter()
        .map(|s| (*s, regress_segment(series, *s)))
        .collect();

    let mut report = RegressionReport::default();
    for (segment, outcome) in outcomes {
        match outcome {
            Ok(result) => report.results.push(result),
            Err(error) => {
                warn!(
                    start = segment.start,
                    end = segment.end,
                    %error,
                    "skipping segment"
                );
                report.failures.push(SegmentFailure { segment, error });
            }
        }
    }

    debug!(
        segments = segs.len(),
        fitted = report.results.len(),
        skipped = report.failures.len(),
        "regressed segments"
    );

    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use chrono::NaiveDate;

    fn yearly(start: i32, values: &[f64]) -> Vec<Observation<i32>> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Observation::new(start + i as i32, *v))
            .collect()
    }

    #[test]
    fn test_direction_tie_break() {
        assert_eq!(Direction::of(0.5), Direction::Up);
        assert_eq!(Direction::of(0.0), Direction::Down);
        assert_eq!(Direction::of(-0.0), Direction::Down);
        assert_eq!(Direction::of(-2.0), Direction::Down);
    }

    #[test]
    fn test_two_point_fit_is_exact_and_significant() {
        let series = yearly(2020, &[10.0, 12.0]);
        let fit = regress_segment(&series, Segment::new(0, 1)).unwrap();

        assert_eq!(fit.n, 2);
        assert_eq!(fit.slope, 2.0);
        assert_eq!(fit.intercept, 10.0 - 2.0 * 2020.0);
        assert_eq!(fit.std_error, 0.0);
        assert_eq!(fit.p_value, 0.0);
        assert!(fit.is_significant(0.05));
    }

    #[test]
    fn test_flat_two_point_fit_is_not_significant() {
        let series = yearly(2020, &[7.0, 7.0]);
        let fit = regress_segment(&series, Segment::new(0, 1)).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.direction(), Direction::Down);
        assert_eq!(fit.p_value, 1.0);
    }

    #[test]
    fn test_constant_decimal_segment_is_flat() {
        let series = yearly(1990, &[12.3; 6]);
        let fit = regress_segment(&series, Segment::new(0, 5)).unwrap();

        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.std_error, 0.0);
        assert_eq!(fit.p_value, 1.0);
        assert_eq!(fit.direction(), Direction::Down);
        assert_approx_eq!(fit.intercept, 12.3, 1e-12);
        assert!(!fit.is_significant(0.05));
    }

    #[test]
    fn test_rounding_noise_two_point_segment_is_flat() {
        let series = yearly(2020, &[0.1 + 0.2, 0.3]);
        let fit = regress_segment(&series, Segment::new(0, 1)).unwrap();

        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.p_value, 1.0);
        assert_eq!(fit.direction(), Direction::Down);
        assert!(!fit.is_significant(0.05));
    }

    #[test]
    fn test_decimal_line_is_exact_fit() {
        let values: Vec<f64> = (0..12).map(|i| 12.3 + 0.7 * i as f64).collect();
        let series = yearly(1900, &values);
        let fit = regress_segment(&series, Segment::new(0, 11)).unwrap();

        assert_approx_eq!(fit.slope, 0.7, 1e-12);
        assert_eq!(fit.std_error, 0.0);
        assert_eq!(fit.p_value, 0.0);
    }

    #[test]
    fn test_p_value_two_degrees_of_freedom() {
        let series = yearly(2000, &[1.0, 3.0, 2.0, 5.0]);
        let fit = regress_segment(&series, Segment::new(0, 3)).unwrap();

        assert_approx_eq!(fit.slope, 1.1, 1e-9);
        assert_approx_eq!(fit.intercept, 1.1 - 1.1 * 2000.0, 1e-6);
        assert_approx_eq!(fit.std_error, 0.27_f64.sqrt(), 1e-9);
        // df = 2: p = 1 - t / sqrt(2 + t²)
        assert_approx_eq!(fit.p_value, 0.168_478_159_379_700_1, 1e-6);
        assert!(!fit.is_significant(0.05));
    }

    #[test]
    fn test_p_value_one_degree_of_freedom() {
        let series = yearly(0, &[1.0, 3.0, 2.0]);
        let fit = regress_segment(&series, Segment::new(0, 2)).unwrap();

        assert_approx_eq!(fit.slope, 0.5, 1e-12);
        // df = 1: p = 1 - 2·atan(t)/π with t = 1/sqrt(3)
        assert_approx_eq!(fit.p_value, 2.0 / 3.0, 1e-6);
    }

    #[test]
    fn test_perfect_line_is_significant() {
        let series = yearly(1950, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let fit = regress_segment(&series, Segment::new(1, 4)).unwrap();
        assert_eq!(fit.n, 4);
        assert_approx_eq!(fit.slope, 1.0, 1e-12);
        assert_eq!(fit.p_value, 0.0);
    }

    #[test]
    fn test_strong_trend_is_significant() {
        let values: Vec<f64> = (0..30)
            .map(|i| 10.0 + 0.8 * i as f64 + if i % 2 == 0 { 0.3 } else { -0.3 })
            .collect();
        let series = yearly(1990, &values);
        let fit = regress_segment(&series, Segment::new(0, 29)).unwrap();
        assert_eq!(fit.direction(), Direction::Up);
        assert!(fit.p_value < 1e-10);
    }

    #[test]
    fn test_single_point_segment_is_insufficient() {
        let series = yearly(2000, &[1.0, 2.0, 3.0]);
        let err = regress_segment(&series, Segment::new(2, 2)).unwrap_err();
        assert_eq!(
            err,
            Error::InsufficientData {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_duplicate_times_are_degenerate() {
        let series = vec![Observation::new(2000, 1.0), Observation::new(2000, 4.0)];
        let err = regress_segment(&series, Segment::new(0, 1)).unwrap_err();
        assert!(matches!(err, Error::DegenerateInput(_)));
    }

    #[test]
    fn test_out_of_bounds_segment() {
        let series = yearly(2000, &[1.0, 2.0]);
        let err = regress_segment(&series, Segment::new(1, 5)).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn test_dates_regress_on_day_counts() {
        let series: Vec<Observation<NaiveDate>> = (0..3)
            .map(|i| {
                Observation::new(
                    NaiveDate::from_ymd_opt(2000, 1, 1 + 2 * i).unwrap(),
                    3.0 * i as f64,
                )
            })
            .collect();
        let fit = regress_segment(&series, Segment::new(0, 2)).unwrap();

        // 1.5 per day, 10957 days between 1970-01-01 and 2000-01-01
        assert_approx_eq!(fit.slope, 1.5, 1e-12);
        assert_approx_eq!(fit.intercept, -1.5 * 10_957.0, 1e-6);
        assert_approx_eq!(fit.fitted(&series[2].time).unwrap(), 6.0, 1e-9);
    }

    #[test]
    fn test_fitted_line_covers_segment() {
        let series = yearly(2000, &[1.0, 3.0, 2.0, 5.0]);
        let fit = regress_segment(&series, Segment::new(0, 3)).unwrap();
        let fitted = fit.fitted_line(&series);
        let expected = [1.1, 2.2, 3.3, 4.4];

        assert_eq!(fitted.len(), 4);
        for (f, e) in fitted.iter().zip(expected) {
            assert_approx_eq!(*f, e, 1e-9);
        }
    }

    #[test]
    fn test_regress_segments_skips_short_tail() {
        let series = yearly(2000, &[0.0, 1.0, 3.0, 6.0]);
        let report = regress_segments(&series, &[0, 1, 2, 3, 3]);

        let fitted: Vec<Segment> = report.results.iter().map(|r| r.segment).collect();
        assert_eq!(
            fitted,
            vec![Segment::new(0, 1), Segment::new(1, 2), Segment::new(2, 3)]
        );
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].segment, Segment::new(3, 3));
        assert_eq!(report.failures[0].error, Error::too_few_points(1));
    }

    #[test]
    fn test_regress_segments_empty_boundaries() {
        let series = yearly(2000, &[1.0]);
        assert_eq!(regress_segments(&series, &[0]), RegressionReport::default());
        assert!(regress_segments(&series, &[]).into_results().is_empty());
    }

    #[test]
    fn test_regress_segments_is_deterministic() {
        let series = yearly(1980, &[2.0, 4.0, 3.0, 8.0, 7.0, 6.0, 5.0, 9.0, 1.0]);
        let boundaries = [0, 3, 6, 8];
        assert_eq!(
            regress_segments(&series, &boundaries),
            regress_segments(&series, &boundaries)
        );
    }
}

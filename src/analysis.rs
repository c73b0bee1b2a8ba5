//! One-call control chart analysis
//!
//! [`analyze`] chains the four stages for a single series: point masks,
//! segmentation, per-segment regression and trend selection. Each call is
//! independent; separate series can be analysed concurrently by the caller.

use num_traits::Float;
use tracing::{debug, instrument, warn};

use crate::{
    ClassificationConfig, Diagnostic, Masks, Observation, RegressionResult, Result, SerialTime,
    Summary, TrendDescriptor, compute_masks, regress_segments, segment, select_trends,
};

/// Everything a control chart needs to render one series
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis<T> {
    /// Mean and standard deviation of the series, `None` when it is empty
    pub summary: Option<Summary<T>>,
    /// Masks of the enabled point-level categories
    pub masks: Masks,
    /// Segment boundaries; empty unless a trending category is enabled
    pub boundaries: Vec<usize>,
    /// Fits of every segment that could be regressed
    pub regressions: Vec<RegressionResult<T>>,
    /// Trends to surface, labelled for the legend
    pub trends: Vec<TrendDescriptor<T>>,
    /// Advisory conditions met along the way
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Analysis<T>
where
    T: Default + Float,
{
    /// Returns the average line of the chart
    pub fn average(&self) -> Option<T> {
        self.summary.map(|s| s.mean)
    }

    /// Returns `true` if no advisory condition was recorded
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Runs the full analysis of one series.
///
/// Segmentation and regression only run when `trending up` or
/// `trending down` is enabled. Segments that cannot be fitted are excluded
/// and recorded as [`Diagnostic::SegmentSkipped`]; a zero-variance series
/// is recorded as [`Diagnostic::ZeroVariance`]. An empty series produces an
/// empty analysis.
///
/// # Arguments
///
/// * `series` - The ordered observations
/// * `config` - The classification configuration
///
/// # Returns
///
/// * `Result<Analysis<T>>` - The analysis, or `InvalidParameter` if the configuration is invalid
///
/// # Examples
///
/// ```
/// use trend_segments::{analyze, Category, ClassificationConfig, Observation};
///
/// let values = [1.0, 2.0, 3.0, 4.0, 1.0, 1.0, 1.0, 1.0, 1.0];
/// let series: Vec<Observation<i32>> = values
///     .iter()
///     .enumerate()
///     .map(|(i, v)| Observation::new(2001 + i as i32, *v))
///     .collect();
/// let config = ClassificationConfig::default().with_min_run_length(2);
///
/// let analysis = analyze(&series, &config).unwrap();
/// assert_eq!(analysis.boundaries, vec![0, 4, 6, 8]);
/// assert_eq!(analysis.masks.flagged_indices(Category::AboveAverage), vec![1, 2, 3]);
/// ```
#[instrument(skip_all, fields(points = series.len()))]
pub fn analyze<X, T>(series: &[Observation<X, T>], config: &ClassificationConfig) -> Result<Analysis<T>>
where
    X: SerialTime + Sync,
    T: Default + Float + Send + Sync,
{
    config.validate()?;

    let mut diagnostics = Vec::new();
    let summary = Summary::of(series);
    match &summary {
        None => diagnostics.push(Diagnostic::EmptySeries),
        Some(s) if s.is_degenerate() => {
            warn!("series has zero variance, deviation masks match the average masks");
            diagnostics.push(Diagnostic::ZeroVariance);
        }
        Some(_) => {}
    }

    let masks = compute_masks(series, config);

    let (boundaries, regressions, trends) = if config.trending_enabled() {
        let boundaries = segment(series, config.min_run_length);
        let report = regress_segments(series, &boundaries);
        diagnostics.extend(
            report
                .failures
                .into_iter()
                .map(Diagnostic::SegmentSkipped),
        );
        let trends = select_trends(&report.results, config);
        (boundaries, report.results, trends)
    } else {
        (Vec::new(), Vec::new(), Vec::new())
    };

    debug!(
        masks = masks.len(),
        segments = regressions.len(),
        trends = trends.len(),
        diagnostics = diagnostics.len(),
        "analysis complete"
    );

    Ok(Analysis {
        summary,
        masks,
        boundaries,
        regressions,
        trends,
        diagnostics,
    })
}

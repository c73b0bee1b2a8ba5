use num_traits::Float;
use serde::{Deserialize, Serialize};

use crate::{Category, ClassificationConfig, Direction, RegressionResult, Segment};

/// Display category of a trend.
///
/// Significant trends are split by direction; trends that fail the
/// significance test share one pooled category whatever their direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrendCategory {
    /// Significant positive slope
    #[serde(rename = "trending up")]
    TrendingUp,
    /// Significant zero or negative slope
    #[serde(rename = "trending down")]
    TrendingDown,
    /// Slope not significant at the configured level
    #[serde(rename = "non-significant trend")]
    NonSignificant,
}

impl TrendCategory {
    /// Returns the human-facing name, used as the legend label
    pub const fn name(&self) -> &'static str {
        match self {
            TrendCategory::TrendingUp => "trending up",
            TrendCategory::TrendingDown => "trending down",
            TrendCategory::NonSignificant => "non-significant trend",
        }
    }

    const fn slot(&self) -> usize {
        match self {
            TrendCategory::TrendingUp => 0,
            TrendCategory::TrendingDown => 1,
            TrendCategory::NonSignificant => 2,
        }
    }
}

impl core::fmt::Display for TrendCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Final per-segment trend output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendDescriptor<T> {
    /// The segment the trend was fitted on
    pub segment: Segment,
    /// The fit
    pub regression: RegressionResult<T>,
    /// Direction of the slope
    pub direction: Direction,
    /// Whether the p-value passed the significance level
    pub significant: bool,
    /// Whether the trend should be surfaced
    pub emit: bool,
    /// Display category
    pub category: TrendCategory,
    /// Category name on the first emitted trend of each category, `None` afterwards
    pub legend_label: Option<String>,
}

/// Decides, for every fit, whether its trend is surfaced and under which label.
///
/// A trend is emitted when the trending category of its direction is
/// enabled and it is either significant or `show_insignificant` is set.
/// Non-significant trends fall in the pooled
/// [`TrendCategory::NonSignificant`]. Among emitted trends, the first of
/// each category carries the category name as legend label; later ones
/// carry `None`. Suppressed trends never carry a label.
///
/// # Arguments
///
/// * `results` - Fits in series order
/// * `config` - Trending flags, `show_insignificant` and the significance level
///
/// # Returns
///
/// * `Vec<TrendDescriptor<T>>` - One descriptor per fit, in the same order
pub fn classify_trends<T>(
    results: &[RegressionResult<T>],
    config: &ClassificationConfig,
) -> Vec<TrendDescriptor<T>>
where
    T: Default + Float,
{
    let up_enabled = config.is_enabled(Category::TrendingUp);
    let down_enabled = config.is_enabled(Category::TrendingDown);
    let mut labelled = [false; 3];

    results
        .iter()
        .map(|regression| {
            let direction = regression.direction();
            let significant = regression.is_significant(config.significance_level);
            let direction_enabled = match direction {
                Direction::Up => up_enabled,
                Direction::Down => down_enabled,
            };
            let emit = direction_enabled && (significant || config.show_insignificant);

            let category = match (significant, direction) {
                (false, _) => TrendCategory::NonSignificant,
                (true, Direction::Up) => TrendCategory::TrendingUp,
                (true, Direction::Down) => TrendCategory::TrendingDown,
            };

            let slot = &mut labelled[category.slot()];
            let legend_label = if emit && !*slot {
                *slot = true;
                Some(category.name().to_string())
            } else {
                None
            };

            TrendDescriptor {
                segment: regression.segment,
                regression: *regression,
                direction,
                significant,
                emit,
                category,
                legend_label,
            }
        })
        .collect()
}

/// Returns only the emitted trends of [`classify_trends`].
///
/// # Examples
///
/// ```
/// use trend_segments::{select_trends, regress_segments, ClassificationConfig, Observation};
///
/// let series: Vec<Observation<i32>> = (0..6)
///     .map(|i| Observation::new(2000 + i, if i <= 2 { i as f64 } else { 4.0 - i as f64 }))
///     .collect();
/// let fits = regress_segments(&series, &[0, 2, 5]).into_results();
/// let trends = select_trends(&fits, &ClassificationConfig::default());
///
/// assert_eq!(trends.len(), 2);
/// assert_eq!(trends[0].legend_label.as_deref(), Some("trending up"));
/// assert_eq!(trends[1].legend_label.as_deref(), Some("trending down"));
/// ```
pub fn select_trends<T>(
    results: &[RegressionResult<T>],
    config: &ClassificationConfig,
) -> Vec<TrendDescriptor<T>>
where
    T: Default + Float,
{
    classify_trends(results, config)
        .into_iter()
        .filter(|d| d.emit)
        .collect()
}

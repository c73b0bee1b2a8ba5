//! Classification configuration
//!
//! A [`ClassificationConfig`] is an immutable value built fresh for each
//! analysis run. It only carries what the computation needs: which
//! categories are enabled and the numeric thresholds. Presentation concerns
//! such as marker colors belong to the caller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default multiple of the standard deviation for the deviation categories
pub const DEFAULT_DEVIATION_COEFFICIENT: f64 = 1.0;

/// Default number of consecutive same-direction slope changes that open a new segment
pub const DEFAULT_MIN_RUN_LENGTH: usize = 10;

/// Default p-value threshold at or below which a trend is significant
pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Classification categories a caller can enable.
///
/// The first four are point-level and produce a mask aligned with the
/// series. The trending categories drive segmentation instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    /// `value ≥ mean`
    #[serde(rename = "above average")]
    AboveAverage,
    /// `value < mean`
    #[serde(rename = "below average")]
    BelowAverage,
    /// `value ≥ mean + k·std`
    #[serde(rename = "deviation above")]
    DeviationAbove,
    /// `value < mean − k·std`
    #[serde(rename = "deviation below")]
    DeviationBelow,
    /// Significant segments with a positive slope
    #[serde(rename = "trending up")]
    TrendingUp,
    /// Significant segments with a zero or negative slope
    #[serde(rename = "trending down")]
    TrendingDown,
}

impl Category {
    /// Every category, in display order
    pub const ALL: [Category; 6] = [
        Category::AboveAverage,
        Category::BelowAverage,
        Category::DeviationAbove,
        Category::DeviationBelow,
        Category::TrendingUp,
        Category::TrendingDown,
    ];

    /// The point-level categories, in display order
    pub const POINT_LEVEL: [Category; 4] = [
        Category::AboveAverage,
        Category::BelowAverage,
        Category::DeviationAbove,
        Category::DeviationBelow,
    ];

    /// Returns the human-facing name of the category
    pub const fn name(&self) -> &'static str {
        match self {
            Category::AboveAverage => "above average",
            Category::BelowAverage => "below average",
            Category::DeviationAbove => "deviation above",
            Category::DeviationBelow => "deviation below",
            Category::TrendingUp => "trending up",
            Category::TrendingDown => "trending down",
        }
    }

    /// Returns `true` if the category produces a per-point mask
    pub const fn is_point_level(&self) -> bool {
        !self.is_trend()
    }

    /// Returns `true` for the trending categories
    pub const fn is_trend(&self) -> bool {
        matches!(self, Category::TrendingUp | Category::TrendingDown)
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-category switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFlag {
    /// Whether the category takes part in the analysis
    pub enabled: bool,
}

/// Configuration of one analysis run.
///
/// Categories missing from `categories` are treated as disabled. The
/// default configuration enables every category.
///
/// # Examples
///
/// ```
/// use trend_segments::{Category, ClassificationConfig};
///
/// let config = ClassificationConfig::from_json(
///     r#"{
///         "categories": {
///             "above average": { "enabled": true },
///             "trending up": { "enabled": true }
///         },
///         "deviation_coefficient": 2.0,
///         "min_run_length": 3
///     }"#,
/// )
/// .unwrap();
///
/// assert!(config.is_enabled(Category::AboveAverage));
/// assert!(!config.is_enabled(Category::BelowAverage));
/// assert!(config.trending_enabled());
/// assert_eq!(config.min_run_length, 3);
/// assert!(!config.show_insignificant);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Enable flags keyed by category
    pub categories: BTreeMap<Category, CategoryFlag>,
    /// Multiple of the standard deviation used by the deviation categories
    pub deviation_coefficient: f64,
    /// Consecutive same-direction slope changes required to open a segment
    pub min_run_length: usize,
    /// Surface trends that fail the significance test
    pub show_insignificant: bool,
    /// p-value threshold for significance
    pub significance_level: f64,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            categories: Category::ALL
                .iter()
                .map(|c| (*c, CategoryFlag { enabled: true }))
                .collect(),
            deviation_coefficient: DEFAULT_DEVIATION_COEFFICIENT,
            min_run_length: DEFAULT_MIN_RUN_LENGTH,
            show_insignificant: false,
            significance_level: DEFAULT_SIGNIFICANCE_LEVEL,
        }
    }
}

impl ClassificationConfig {
    /// Creates the default configuration, with every category enabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration in which only the given categories are enabled
    ///
    /// # Arguments
    ///
    /// * `enabled` - The categories to enable
    ///
    /// # Returns
    ///
    /// * `Self` - The configuration, with default thresholds
    pub fn with_only(enabled: &[Category]) -> Self {
        let categories = Category::ALL
            .iter()
            .map(|c| {
                (
                    *c,
                    CategoryFlag {
                        enabled: enabled.contains(c),
                    },
                )
            })
            .collect();
        Self {
            categories,
            ..Self::default()
        }
    }

    /// Parses and validates a configuration from JSON
    ///
    /// # Arguments
    ///
    /// * `json` - The serialized configuration; omitted fields take their defaults
    ///
    /// # Returns
    ///
    /// * `Result<Self>` - The configuration, or `InvalidParameter` if it cannot be parsed or fails validation
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::InvalidParameter(format!("Malformed configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Returns `true` if the category is enabled
    pub fn is_enabled(&self, category: Category) -> bool {
        self.categories
            .get(&category)
            .is_some_and(|flag| flag.enabled)
    }

    /// Returns `true` if either trending category is enabled
    pub fn trending_enabled(&self) -> bool {
        self.is_enabled(Category::TrendingUp) || self.is_enabled(Category::TrendingDown)
    }

    /// Returns the enabled point-level categories, in display order
    pub fn enabled_point_categories(&self) -> impl Iterator<Item = Category> + '_ {
        Category::POINT_LEVEL
            .into_iter()
            .filter(|c| self.is_enabled(*c))
    }

    /// Sets the enable flag of one category
    pub fn with_enabled(mut self, category: Category, enabled: bool) -> Self {
        self.categories.insert(category, CategoryFlag { enabled });
        self
    }

    /// Sets the deviation coefficient
    pub fn with_deviation_coefficient(mut self, coefficient: f64) -> Self {
        self.deviation_coefficient = coefficient;
        self
    }

    /// Sets the minimum run length
    pub fn with_min_run_length(mut self, min_run_length: usize) -> Self {
        self.min_run_length = min_run_length;
        self
    }

    /// Sets whether non-significant trends are surfaced
    pub fn with_show_insignificant(mut self, show: bool) -> Self {
        self.show_insignificant = show;
        self
    }

    /// Sets the significance level
    pub fn with_significance_level(mut self, level: f64) -> Self {
        self.significance_level = level;
        self
    }

    /// Checks the numeric parameters
    ///
    /// # Returns
    ///
    /// * `Result<()>` - `InvalidParameter` naming the first offending field
    pub fn validate(&self) -> Result<()> {
        if !self.deviation_coefficient.is_finite() || self.deviation_coefficient < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "deviation_coefficient must be finite and non-negative, got {}",
                self.deviation_coefficient
            )));
        }
        if self.min_run_length == 0 {
            return Err(Error::InvalidParameter(
                "min_run_length must be at least 1".to_string(),
            ));
        }
        let level = self.significance_level;
        if level.is_nan() || level <= 0.0 || level >= 1.0 {
            return Err(Error::InvalidParameter(format!(
                "significance_level must lie in (0, 1), got {level}"
            )));
        }
        Ok(())
    }
}

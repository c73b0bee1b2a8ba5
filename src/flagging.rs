use ahash::RandomState;
use hashbrown::HashMap;
use num_traits::Float;
use serde::{Deserialize, Serialize};

use crate::{Category, ClassificationConfig, Kbn, Observation};

/// Per-point membership of one category, aligned 1:1 with the series
pub type Mask = Vec<bool>;

/// Whole-series summary statistics that the point masks are measured against.
///
/// Computed once per analysis run with two compensated passes: the mean
/// first, then the population variance around it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary<T> {
    /// Number of observations
    pub count: usize,
    /// Arithmetic mean of the values
    pub mean: T,
    /// Population standard deviation of the values
    pub std: T,
}

impl<T> Summary<T>
where
    T: Default + Float,
{
    /// Summarizes the values of a series
    ///
    /// # Arguments
    ///
    /// * `series` - The observations to summarize
    ///
    /// # Returns
    ///
    /// * `Option<Self>` - The summary, or `None` for an empty series
    ///
    /// # Examples
    ///
    /// ```
    /// use trend_segments::{Observation, Summary};
    ///
    /// let series: Vec<Observation<i32>> = vec![(1, 2.0), (2, 4.0), (3, 4.0), (4, 4.0), (5, 5.0), (6, 5.0), (7, 7.0), (8, 9.0)]
    ///     .into_iter()
    ///     .map(Observation::from)
    ///     .collect();
    /// let summary = Summary::of(&series).unwrap();
    /// assert_eq!(summary.mean, 5.0);
    /// assert_eq!(summary.std, 2.0);
    /// ```
    pub fn of<X>(series: &[Observation<X, T>]) -> Option<Self> {
        Self::of_values(series.iter().map(|o| o.value))
    }

    /// Summarizes a sequence of values
    pub fn of_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Clone,
    {
        let values = values.into_iter();

        let (count, sum) = values
            .clone()
            .fold((0_usize, Kbn::<T>::default()), |(count, mut sum), v| {
                sum += v;
                (count + 1, sum)
            });
        if count == 0 {
            return None;
        }
        let n = T::from(count)?;
        let mean = sum.total() / n;

        let mut sum_sq_dev = Kbn::<T>::default();
        for v in values {
            let dev = v - mean;
            sum_sq_dev += dev * dev;
        }
        let std = (sum_sq_dev.total() / n).sqrt();

        Some(Self { count, mean, std })
    }

    /// Returns `true` when every value equals the mean
    pub fn is_degenerate(&self) -> bool {
        self.std.is_zero()
    }

    /// Returns the threshold a value is compared against for a point-level category
    ///
    /// # Arguments
    ///
    /// * `category` - The category
    /// * `coefficient` - Multiple of the standard deviation for the deviation categories
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The threshold, or `None` for the trending categories
    pub fn threshold(&self, category: Category, coefficient: T) -> Option<T> {
        match category {
            Category::AboveAverage | Category::BelowAverage => Some(self.mean),
            Category::DeviationAbove => Some(self.mean + coefficient * self.std),
            Category::DeviationBelow => Some(self.mean - coefficient * self.std),
            Category::TrendingUp | Category::TrendingDown => None,
        }
    }

    /// Returns `true` if a value satisfies a point-level category
    ///
    /// "Above" categories are inclusive of their threshold, "below" categories exclusive.
    pub fn satisfies(&self, category: Category, coefficient: T, value: T) -> bool {
        match (category, self.threshold(category, coefficient)) {
            (Category::AboveAverage | Category::DeviationAbove, Some(t)) => value >= t,
            (Category::BelowAverage | Category::DeviationBelow, Some(t)) => value < t,
            _ => false,
        }
    }
}

/// Point masks keyed by category
#[derive(Debug, Clone)]
pub struct Masks {
    masks: HashMap<Category, Mask, RandomState>,
}

impl Default for Masks {
    fn default() -> Self {
        Self {
            masks: HashMap::with_hasher(RandomState::default()),
        }
    }
}

impl PartialEq for Masks {
    fn eq(&self, other: &Self) -> bool {
        self.masks == other.masks
    }
}

impl Masks {
    /// Returns the mask of a category, if it was computed
    pub fn get(&self, category: Category) -> Option<&[bool]> {
        self.masks.get(&category).map(Vec::as_slice)
    }

    /// Returns the number of masks
    pub fn len(&self) -> usize {
        self.masks.len()
    }

    /// Returns `true` if no mask was computed
    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// Iterates over the masks in display order
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[bool])> + '_ {
        Category::POINT_LEVEL
            .into_iter()
            .filter_map(|c| self.get(c).map(|m| (c, m)))
    }

    /// Returns the indices flagged by a category
    pub fn flagged_indices(&self, category: Category) -> Vec<usize> {
        self.get(category)
            .map(|mask| {
                mask.iter()
                    .enumerate()
                    .filter_map(|(i, &flag)| flag.then_some(i))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn insert(&mut self, category: Category, mask: Mask) {
        self.masks.insert(category, mask);
    }
}

/// Computes a mask for every enabled point-level category.
///
/// The mean and population standard deviation are taken once over the whole
/// series. The series is only read. A constant series has `std = 0`, so the
/// deviation categories fall back onto the average thresholds; this is
/// well-defined and not an error.
///
/// # Arguments
///
/// * `series` - The ordered observations
/// * `config` - Enabled categories and the deviation coefficient
///
/// # Returns
///
/// * `Masks` - One mask per enabled point-level category; empty masks for an empty series
///
/// # Examples
///
/// ```
/// use trend_segments::{compute_masks, Category, ClassificationConfig, Observation};
///
/// let series: Vec<Observation<i32>> = [1.0, 2.0, 3.0, 10.0]
///     .iter()
///     .enumerate()
///     .map(|(i, v)| Observation::new(2000 + i as i32, *v))
///     .collect();
/// let config = ClassificationConfig::with_only(&[Category::AboveAverage, Category::DeviationAbove]);
/// let masks = compute_masks(&series, &config);
///
/// assert_eq!(masks.get(Category::AboveAverage), Some(&[false, false, false, true][..]));
/// assert_eq!(masks.get(Category::DeviationAbove), Some(&[false, false, false, true][..]));
/// assert_eq!(masks.get(Category::BelowAverage), None);
/// ```
pub fn compute_masks<X, T>(series: &[Observation<X, T>], config: &ClassificationConfig) -> Masks
where
    T: Default + Float,
{
    let mut masks = Masks::default();
    let summary = Summary::of(series);
    let coefficient = T::from(config.deviation_coefficient).unwrap_or_else(T::zero);

    for category in config.enabled_point_categories() {
        let mask = match &summary {
            Some(summary) => series
                .iter()
                .map(|o| summary.satisfies(category, coefficient, o.value))
                .collect(),
            None => Mask::new(),
        };
        masks.insert(category, mask);
    }

    masks
}

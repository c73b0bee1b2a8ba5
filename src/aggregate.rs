use core::{cmp::Ordering, hash::Hash, str::FromStr};

use ahash::RandomState;
use hashbrown::HashMap;
use num_traits::Float;
use serde::{Deserialize, Serialize};

use crate::{Error, Kbn, Observation, helper::median_from_sorted_slice};

/// How the observations sharing one time step are collapsed into a single value
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Arithmetic mean
    #[default]
    Mean,
    /// Median; the midpoint of the two middle values for even groups
    Median,
    /// Smallest value
    Min,
    /// Largest value
    Max,
}

impl Aggregation {
    /// Reduces one group of values
    ///
    /// # Arguments
    ///
    /// * `values` - The group; reordered in place by `Median`
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The reduced value, or `None` for an empty group
    pub fn reduce<T>(&self, values: &mut [T]) -> Option<T>
    where
        T: Default + Float,
    {
        if values.is_empty() {
            return None;
        }
        match self {
            Aggregation::Mean => {
                let mut sum = Kbn::<T>::default();
                values.iter().for_each(|v| sum += *v);
                Some(sum.total() / T::from(values.len())?)
            }
            Aggregation::Median => {
                values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
                Some(median_from_sorted_slice(values))
            }
            Aggregation::Min => values.iter().copied().reduce(T::min),
            Aggregation::Max => values.iter().copied().reduce(T::max),
        }
    }
}

impl FromStr for Aggregation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(Aggregation::Mean),
            "median" => Ok(Aggregation::Median),
            "min" => Ok(Aggregation::Min),
            "max" => Ok(Aggregation::Max),
            other => Err(Error::InvalidParameter(format!(
                "unknown aggregation '{other}', expected mean, median, min or max"
            ))),
        }
    }
}

/// Collapses records from several sources into one observation per time step.
///
/// Records are grouped by exact time equality; each group is reduced with
/// `how` and the result is sorted by time ascending, ready to be analysed as
/// a series. Two timestamps on the same calendar day stay apart even though
/// they share a day count on the regression axis. Floating point times are
/// grouped by wrapping them in [`OrderedFloat`](ordered_float::OrderedFloat).
/// NaN values are ignored, and a time step whose values are all NaN is dropped.
///
/// # Arguments
///
/// * `records` - Observations in any order, possibly many per time step
/// * `how` - The reduction applied per time step
///
/// # Returns
///
/// * `Vec<Observation<X, T>>` - One observation per time step, ordered by time
///
/// # Examples
///
/// ```
/// use trend_segments::{aggregate_by_time, Aggregation, Observation};
///
/// let records = [
///     Observation::new(2001, 4.0),
///     Observation::new(2000, 1.0),
///     Observation::new(2001, 8.0),
///     Observation::new(2000, 3.0),
/// ];
/// let series = aggregate_by_time(&records, Aggregation::Mean);
/// assert_eq!(series, vec![Observation::new(2000, 2.0), Observation::new(2001, 6.0)]);
/// ```
pub fn aggregate_by_time<X, T>(records: &[Observation<X, T>], how: Aggregation) -> Vec<Observation<X, T>>
where
    X: Hash + Ord + Clone,
    T: Default + Float,
{
    let mut groups: HashMap<&X, Vec<T>, RandomState> = HashMap::with_hasher(RandomState::default());

    for record in records {
        let values = groups.entry(&record.time).or_default();
        if !record.value.is_nan() {
            values.push(record.value);
        }
    }

    let mut keyed: Vec<_> = groups.into_iter().collect();
    keyed.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));

    keyed
        .into_iter()
        .filter_map(|(time, mut values)| {
            how.reduce(&mut values)
                .map(|v| Observation::new(time.clone(), v))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use chrono::{NaiveDate, NaiveDateTime};
    use ordered_float::OrderedFloat;

    fn records() -> Vec<Observation<i32>> {
        vec![
            Observation::new(2002, 5.0),
            Observation::new(2000, 3.0),
            Observation::new(2001, 10.0),
            Observation::new(2000, 1.0),
            Observation::new(2002, 7.0),
            Observation::new(2001, 2.0),
            Observation::new(2000, 8.0),
            Observation::new(2002, 6.0),
            Observation::new(2001, 4.0),
            Observation::new(2001, 0.0),
        ]
    }

    fn values(series: &[Observation<i32>]) -> Vec<f64> {
        series.iter().map(|o| o.value).collect()
    }

    #[test]
    fn test_output_is_sorted_by_time() {
        let series = aggregate_by_time(&records(), Aggregation::Max);
        let times: Vec<i32> = series.iter().map(|o| o.time).collect();
        assert_eq!(times, vec![2000, 2001, 2002]);
    }

    #[test]
    fn test_reductions() {
        let r = records();
        let mean = aggregate_by_time(&r, Aggregation::Mean);
        assert_approx_eq!(mean[0].value, 4.0);
        assert_approx_eq!(mean[1].value, 4.0);
        assert_approx_eq!(mean[2].value, 6.0);

        assert_eq!(values(&aggregate_by_time(&r, Aggregation::Median)), vec![3.0, 3.0, 6.0]);
        assert_eq!(values(&aggregate_by_time(&r, Aggregation::Min)), vec![1.0, 0.0, 5.0]);
        assert_eq!(values(&aggregate_by_time(&r, Aggregation::Max)), vec![8.0, 10.0, 7.0]);
    }

    #[test]
    fn test_nan_values_are_ignored() {
        let r = vec![
            Observation::new(1, f64::NAN),
            Observation::new(1, 2.0),
            Observation::new(2, f64::NAN),
            Observation::new(3, 4.0),
        ];
        let series = aggregate_by_time(&r, Aggregation::Mean);
        assert_eq!(series, vec![Observation::new(1, 2.0), Observation::new(3, 4.0)]);
    }

    #[test]
    fn test_groups_dates() {
        let day = |d| NaiveDate::from_ymd_opt(2020, 6, d).unwrap();
        let r = vec![
            Observation::new(day(2), 1.0),
            Observation::new(day(1), 5.0),
            Observation::new(day(2), 3.0),
        ];
        let series = aggregate_by_time(&r, Aggregation::Median);
        assert_eq!(
            series,
            vec![Observation::new(day(1), 5.0), Observation::new(day(2), 2.0)]
        );
    }

    #[test]
    fn test_same_day_timestamps_stay_apart() {
        let at = |h| {
            NaiveDate::from_ymd_opt(2020, 6, 1)
                .unwrap()
                .and_hms_opt(h, 0, 0)
                .unwrap()
        };
        let r: Vec<Observation<NaiveDateTime>> = vec![
            Observation::new(at(18), 4.0),
            Observation::new(at(6), 1.0),
            Observation::new(at(18), 6.0),
            Observation::new(at(6), 3.0),
        ];
        let series = aggregate_by_time(&r, Aggregation::Mean);
        assert_eq!(
            series,
            vec![Observation::new(at(6), 2.0), Observation::new(at(18), 5.0)]
        );
    }

    #[test]
    fn test_groups_float_times() {
        let r = vec![
            Observation::new(OrderedFloat(2000.5), 2.0),
            Observation::new(OrderedFloat(2000.0), 9.0),
            Observation::new(OrderedFloat(2000.5), 4.0),
        ];
        let series = aggregate_by_time(&r, Aggregation::Min);
        assert_eq!(
            series,
            vec![
                Observation::new(OrderedFloat(2000.0), 9.0),
                Observation::new(OrderedFloat(2000.5), 2.0)
            ]
        );
    }

    #[test]
    fn test_empty_records() {
        let r: Vec<Observation<i32>> = vec![];
        assert!(aggregate_by_time(&r, Aggregation::Mean).is_empty());
    }

    #[test]
    fn test_parse_aggregation() {
        assert_eq!("Median".parse::<Aggregation>().unwrap(), Aggregation::Median);
        assert_eq!(" max ".parse::<Aggregation>().unwrap(), Aggregation::Max);
        assert!("mode".parse::<Aggregation>().is_err());
    }
}

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Days between 0001-01-01 (CE day 1) and 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

const SECONDS_PER_DAY: i64 = 86_400;

/// A single timestamped measurement of the analysed metric.
///
/// A series is a slice of observations ordered by `time` ascending. Repeated
/// times are allowed and kept as separate points; nothing in this crate
/// reorders or mutates a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation<X, T = f64> {
    /// Position of the observation on the time axis
    pub time: X,
    /// Measured value
    pub value: T,
}

impl<X, T> Observation<X, T> {
    /// Creates a new observation
    ///
    /// # Arguments
    ///
    /// * `time` - The time of the observation
    /// * `value` - The measured value
    ///
    /// # Returns
    ///
    /// * `Self` - The observation
    pub const fn new(time: X, value: T) -> Self {
        Self { time, value }
    }
}

impl<X, T> From<(X, T)> for Observation<X, T> {
    fn from((time, value): (X, T)) -> Self {
        Self::new(time, value)
    }
}

/// Numeric encoding of a time value used as the regression abscissa.
///
/// Numeric times pass through unchanged. Calendar types are encoded as the
/// number of whole days since 1970-01-01, rounded towards negative infinity.
pub trait SerialTime {
    /// Returns the numeric position of this time on the regression axis
    fn serial(&self) -> f64;
}

macro_rules! impl_numeric_serial_time {
    ($($t:ty),*) => {
        $(
            impl SerialTime for $t {
                #[inline]
                fn serial(&self) -> f64 {
                    f64::from(*self)
                }
            }
        )*
    };
}

impl_numeric_serial_time!(f64, f32, i32, u32, i16, u16, u8);

impl SerialTime for i64 {
    #[inline]
    fn serial(&self) -> f64 {
        *self as f64
    }
}

impl SerialTime for NaiveDate {
    fn serial(&self) -> f64 {
        (i64::from(self.num_days_from_ce()) - UNIX_EPOCH_DAYS_FROM_CE) as f64
    }
}

impl SerialTime for NaiveDateTime {
    fn serial(&self) -> f64 {
        self.and_utc().timestamp().div_euclid(SECONDS_PER_DAY) as f64
    }
}

impl<Tz: TimeZone> SerialTime for DateTime<Tz> {
    fn serial(&self) -> f64 {
        self.timestamp().div_euclid(SECONDS_PER_DAY) as f64
    }
}

impl<F: SerialTime> SerialTime for OrderedFloat<F> {
    #[inline]
    fn serial(&self) -> f64 {
        self.0.serial()
    }
}

impl<X: SerialTime + ?Sized> SerialTime for &X {
    #[inline]
    fn serial(&self) -> f64 {
        (**self).serial()
    }
}

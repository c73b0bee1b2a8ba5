use num_traits::Float;

use crate::Kbn;

/// A growing-window ordinary least squares accumulator over paired values.
///
/// `LeastSquares<T>` keeps running means of `x` and `y` together with the
/// centered co-moments `Σ(x − x̄)²` and `Σ(x − x̄)(y − ȳ)`, updated with
/// Welford's method. Every pair pushed with [`next`](Self::next) extends the
/// window; nothing is ever evicted, so after `k` pushes the statistics
/// describe exactly the first `k` pairs. Each update is O(1), which turns a
/// recomputed growing-window regression into a single linear pass.
///
/// Centering avoids the cancellation of raw `n·Σxy − Σx·Σy` sums, and the
/// co-moments are accumulated with the Kahan-Babuska-Neumaier algorithm.
#[derive(Debug, Clone)]
pub struct LeastSquares<T> {
    /// Number of pairs pushed so far
    len: usize,
    /// Pair count as a float, kept alongside `len` to avoid casts
    n: T,
    /// Running means of `x` and `y`
    mean: (T, T),
    /// Centered sum of squares of `x`
    cxx: Kbn<T>,
    /// Centered sum of cross products
    cxy: Kbn<T>,
}

impl<T> Default for LeastSquares<T>
where
    T: Default + Float,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LeastSquares<T>
where
    T: Default + Float,
{
    /// Creates an empty accumulator
    ///
    /// # Returns
    ///
    /// * `Self` - The `LeastSquares` instance
    pub fn new() -> Self {
        Self {
            len: 0,
            n: T::zero(),
            mean: (T::zero(), T::zero()),
            cxx: Default::default(),
            cxy: Default::default(),
        }
    }

    /// Resets the accumulator
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The accumulator
    pub fn reset(&mut self) -> &mut Self {
        *self = Self::new();
        self
    }

    /// Returns the number of pairs in the window
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no pair has been pushed yet
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Extends the window with a new `(x, y)` pair
    ///
    /// # Arguments
    ///
    /// * `value` - A tuple containing the predictor `x` and the response `y`
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The updated accumulator for method chaining
    pub fn next(&mut self, (x, y): (T, T)) -> &mut Self {
        self.len += 1;
        self.n = self.n + T::one();

        let dx = x - self.mean.0;
        self.mean.0 = self.mean.0 + dx / self.n;
        self.mean.1 = self.mean.1 + (y - self.mean.1) / self.n;

        // dx is taken against the previous mean, the residuals against the new ones
        self.cxx += dx * (x - self.mean.0);
        self.cxy += dx * (y - self.mean.1);

        self
    }

    /// Returns the means of `x` and `y`, or `None` if the window is empty
    pub fn mean(&self) -> Option<(T, T)> {
        if self.is_empty() {
            return None;
        }
        Some(self.mean)
    }

    /// Returns the centered sum of squares of `x`, `Σ(x − x̄)²`
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The sum of squared deviations, or `None` if the window is empty
    pub fn sxx(&self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        Some(self.cxx.total())
    }

    /// Returns the population covariance of the pairs in the window
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The covariance, or `None` if the window is empty
    ///
    /// # Examples
    ///
    /// ```
    /// use trend_segments::LeastSquares;
    /// use assert_approx_eq::assert_approx_eq;
    ///
    /// let mut ls = LeastSquares::<f64>::new();
    /// [(2.0, 1.0), (4.0, 3.0), (6.0, 2.0)].iter().for_each(|p| {
    ///     ls.next(*p);
    /// });
    /// assert_approx_eq!(ls.cov().unwrap(), 0.6667, 1e-3);
    /// ```
    pub fn cov(&self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        Some(self.cxy.total() / self.n)
    }

    /// Returns the least squares slope of `y` on `x`, `Σ(x − x̄)(y − ȳ) / Σ(x − x̄)²`
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The slope, or `None` with fewer than two pairs or when
    ///   every `x` in the window is identical
    ///
    /// # Examples
    ///
    /// ```
    /// use trend_segments::LeastSquares;
    ///
    /// let mut ls = LeastSquares::new();
    /// let slopes: Vec<Option<f64>> = [(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)]
    ///     .iter()
    ///     .map(|p| ls.next(*p).slope())
    ///     .collect();
    /// assert_eq!(slopes, vec![None, Some(2.0), Some(2.0)]);
    /// ```
    pub fn slope(&self) -> Option<T> {
        if self.len < 2 {
            return None;
        }
        let sxx = self.cxx.total();
        if sxx.is_zero() {
            None
        } else {
            Some(self.cxy.total() / sxx)
        }
    }

    /// Returns the intercept of the least squares line, `ȳ − slope·x̄`
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The intercept, or `None` when the slope is undefined
    pub fn intercept(&self) -> Option<T> {
        let slope = self.slope()?;
        let (mean_x, mean_y) = self.mean()?;
        Some(mean_y - slope * mean_x)
    }
}

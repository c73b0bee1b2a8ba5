use num_traits::Float;

/// Machine epsilons of relative slack under which two floats count as equal
const TOLERANCE_ULPS: f64 = 64.0;

/// Returns the median from a non-empty sorted slice
///
/// # Arguments
///
/// * `ss` - The sorted slice
///
/// # Returns
///
/// * `T` - The median; the midpoint of the two middle values for even lengths
#[inline]
pub fn median_from_sorted_slice<T: Float>(ss: &[T]) -> T {
    let len = ss.len();
    let mid = len / 2;
    let _2 = T::one() + T::one();
    if len % 2 == 0 {
        (ss[mid - 1] + ss[mid]) / _2
    } else {
        ss[mid]
    }
}

/// Returns `true` if `a` and `b` differ by no more than rounding noise at `scale`
///
/// # Arguments
///
/// * `a`, `b` - The values to compare
/// * `scale` - The magnitude the rounding error of `a` and `b` is proportional to
#[inline]
pub fn nearly_equal<T: Float>(a: T, b: T, scale: T) -> bool {
    let ulps = T::from(TOLERANCE_ULPS).unwrap_or_else(T::one);
    (a - b).abs() <= ulps * T::epsilon() * scale.abs()
}

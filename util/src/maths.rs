//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Trapezoidal (mean value) integral of a quantity over one interval.
///
/// Given the quantity at the end (`q_1`) and start (`q_0`) of an interval of
/// length `dt` this returns `((q_1 + q_0) / 2) * dt`.
pub fn trapezoid<T>(q_1: T, q_0: T, dt: T) -> T
where
    T: Float
{
    let half = T::from(0.5).unwrap_or_else(|| T::one() / (T::one() + T::one()));

    (q_1 + q_0) * half * dt
}

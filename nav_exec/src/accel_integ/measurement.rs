//! Timestamped kinematic quantities

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector3;
use serde::Serialize;
use std::{fmt, marker::PhantomData, num::NonZeroU64};

// Internal
use util::{maths, time};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Acceleration quantity marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accel;

/// Velocity quantity marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vel;

/// Position quantity marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pos;

/// A 3-axis measurement of a kinematic quantity `Q` along with the time it
/// was acquired.
///
/// An acquisition time of `None` means the value has no valid timestamp. Raw
/// driver timestamps of `0` are mapped to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measurement<Q> {
    /// The measured vector, one component per axis.
    pub vec: Vector3<f64>,

    /// Monotonic acquisition time.
    ///
    /// Units: nanoseconds
    pub acq_time_ns: Option<NonZeroU64>,

    #[serde(skip_serializing)]
    quantity: PhantomData<Q>,
}

/// Linear acceleration as reported by the IMU.
pub type Acceleration = Measurement<Accel>;

/// Linear velocity.
pub type Velocity = Measurement<Vel>;

/// Position.
pub type Position = Measurement<Pos>;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A quantity which integrates over time into another quantity.
pub trait Integrable {
    /// The quantity produced by integrating this one over time.
    type Integral;
}

impl Integrable for Accel {
    type Integral = Vel;
}

impl Integrable for Vel {
    type Integral = Pos;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<Q> Measurement<Q> {
    /// Create a new measurement from its components and a raw driver
    /// timestamp, where a timestamp of `0` means "not yet valid".
    pub fn new(x: f64, y: f64, z: f64, acq_time_ns: u64) -> Self {
        Self::from_vec(Vector3::new(x, y, z), NonZeroU64::new(acq_time_ns))
    }

    /// Create a new measurement from a vector and an optional timestamp.
    pub fn from_vec(vec: Vector3<f64>, acq_time_ns: Option<NonZeroU64>) -> Self {
        Self {
            vec,
            acq_time_ns,
            quantity: PhantomData,
        }
    }

    /// A zero vector with no timestamp.
    pub fn zero() -> Self {
        Self::from_vec(Vector3::zeros(), None)
    }

    /// The raw driver timestamp, `0` if there is none.
    pub fn acq_time_ns_raw(&self) -> u64 {
        self.acq_time_ns.map_or(0, NonZeroU64::get)
    }

    /// Return this measurement advanced by `delta`, stamped with the delta's
    /// acquisition time.
    pub fn advanced_by(&self, delta: &Self) -> Self {
        Self::from_vec(self.vec + delta.vec, delta.acq_time_ns)
    }
}

impl<Q> Default for Measurement<Q> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<Q> fmt::Display for Measurement<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.3} {:.3} {:.3})",
            self.vec[0], self.vec[1], self.vec[2]
        )?;

        match self.acq_time_ns {
            Some(t) => write!(f, "@{}", t),
            None => write!(f, "@-"),
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Integrate a quantity between two timestamped measurements using the
/// trapezoidal (mean value) rule.
///
/// Each axis is integrated independently as `((q_1 + q_0) / 2) * dt`, where
/// `dt` is the difference between the two acquisition times converted to
/// seconds. The result is stamped with the acquisition time of `current`.
///
/// Returns `None` if either measurement has no acquisition time.
pub fn mean_integrate<Q>(
    current: &Measurement<Q>,
    previous: &Measurement<Q>,
) -> Option<Measurement<Q::Integral>>
where
    Q: Integrable,
{
    let t_1 = current.acq_time_ns?;
    let t_0 = previous.acq_time_ns?;

    let dt_s = time::nanos_to_seconds(time::elapsed_nanos(t_1.get(), t_0.get()));

    let vec = current
        .vec
        .zip_map(&previous.vec, |q_1, q_0| maths::trapezoid(q_1, q_0, dt_s));

    Some(Measurement::from_vec(vec, Some(t_1)))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_zero_timestamp_is_unset() {
        let a = Acceleration::new(1.0, 2.0, 3.0, 0);

        assert_eq!(a.acq_time_ns, None);
        assert_eq!(a.acq_time_ns_raw(), 0);
        assert_eq!(a.vec, Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_mean_integrate() {
        let a_0 = Acceleration::new(1.0, 0.0, -2.0, 1_000_000_000);
        let a_1 = Acceleration::new(3.0, 0.0, -2.0, 1_500_000_000);

        let dv: Velocity = mean_integrate(&a_1, &a_0).unwrap();

        assert_eq!(dv.vec, Vector3::new(1.0, 0.0, -1.0));
        assert_eq!(dv.acq_time_ns_raw(), 1_500_000_000);
    }

    #[test]
    fn test_mean_integrate_needs_both_times() {
        let a_0 = Acceleration::new(1.0, 0.0, 0.0, 0);
        let a_1 = Acceleration::new(1.0, 0.0, 0.0, 1_000);

        assert!(mean_integrate(&a_1, &a_0).is_none());
        assert!(mean_integrate(&a_0, &a_1).is_none());
    }

    #[test]
    fn test_advanced_by() {
        let v = Velocity::new(1.0, 1.0, 1.0, 5);
        let dv = Velocity::new(0.5, -1.0, 0.0, 10);

        let v_new = v.advanced_by(&dv);

        assert_eq!(v_new.vec, Vector3::new(1.5, 0.0, 1.0));
        assert_eq!(v_new.acq_time_ns_raw(), 10);
    }

    #[test]
    fn test_display() {
        let p = Position::new(1.5, 0.0, -0.25, 2_000_000_000);
        assert_eq!(format!("{}", p), "(1.500 0.000 -0.250)@2000000000");

        let p = Position::zero();
        assert_eq!(format!("{}", p), "(0.000 0.000 0.000)@-");
    }
}

//! # Navigation library.
//!
//! This library allows other crates in the workspace, and the benchmarks, to
//! access items defined inside the navigation crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Acceleration integrator - dead reckons velocity and position from IMU acceleration
pub mod accel_integ;

/// Navigation executable parameters
pub mod params;

/// Replay of recorded IMU acceleration logs
pub mod replay;

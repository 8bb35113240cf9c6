//! # Acceleration integrator module
//!
//! Dead reckoning of velocity and position from the IMU's linear acceleration
//! stream. Each pair of consecutive timestamped samples is integrated with the
//! trapezoidal (mean value) rule:
//!
//! ```text
//! dv = ((a_1 + a_0) / 2) * (t_1 - t_0)
//! dp = ((v_1 + v_0) / 2) * (t_1 - t_0)
//! ```
//!
//! Timestamps are monotonic nanoseconds from the IMU driver. A driver
//! timestamp of zero means the reading is not yet valid; such samples are
//! dropped without touching the state.
//!
//! No filtering of any kind is done, so the estimates drift without bound.
//! The host drives the integrator from a single thread and must serialise
//! access itself if it shares it.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod measurement;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use measurement::*;
pub use params::*;
pub use state::*;

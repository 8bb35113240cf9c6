//! # Navigation Executable Parameters
//!
//! This module provide parameters for the navigation executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use util::logger::{LevelFilter, TargetLevel};

use crate::accel_integ::{Position, Velocity};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct NavExecParams {

    /// Directory, relative to the software root, in which sessions are created
    pub sessions_dir: String,

    /// Global minimum log level
    pub log_level: LevelFilter,

    /// Per-target log level overrides
    #[serde(default)]
    pub target_levels: Vec<TargetLevel>,

    /// Parameter file for the acceleration integrator
    pub accel_integ_params: String,

    /// Position the integrator starts from
    ///
    /// Units: meters
    pub initial_position_m: [f64; 3],

    /// Acquisition time of the initial position, 0 if not known
    ///
    /// Units: nanoseconds
    pub initial_position_time_ns: u64,

    /// Velocity the integrator starts from
    ///
    /// Units: meters/second
    pub initial_velocity_ms: [f64; 3],

    /// Acquisition time of the initial velocity, 0 if not known
    ///
    /// Units: nanoseconds
    pub initial_velocity_time_ns: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl NavExecParams {
    /// The initial position as a measurement.
    pub fn initial_position(&self) -> Position {
        let p = self.initial_position_m;
        Position::new(p[0], p[1], p[2], self.initial_position_time_ns)
    }

    /// The initial velocity as a measurement.
    pub fn initial_velocity(&self) -> Velocity {
        let v = self.initial_velocity_ms;
        Velocity::new(v[0], v[1], v[2], self.initial_velocity_time_ns)
    }
}

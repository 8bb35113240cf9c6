//! Parameters structure for AccelInteg

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the acceleration integrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Params {

    /// If true a diagnostic line is logged at trace level on every integration
    /// step.
    pub logging_enabled: bool,

    /// Log target used for the diagnostic lines.
    pub logging_tag: String,

    /// Unit the IMU driver reports acceleration in.
    ///
    /// This is not used to rescale samples, it is held so the host can read
    /// back the configuration it supplied.
    #[serde(default)]
    pub accel_unit: AccelUnit,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Units of linear acceleration an IMU driver may report in.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum AccelUnit {
    MetersPerSec2,
    MilliEarthGravity,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for AccelUnit {
    fn default() -> Self {
        AccelUnit::MetersPerSec2
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            logging_enabled: false,
            logging_tag: String::from("AccelInteg"),
            accel_unit: AccelUnit::default(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_params_from_toml() {
        let p: Params = util::params::load_from_str(
            "logging_enabled = true\nlogging_tag = \"IMU\"\naccel_unit = \"MilliEarthGravity\"\n"
        ).unwrap();

        assert!(p.logging_enabled);
        assert_eq!(p.logging_tag, "IMU");
        assert_eq!(p.accel_unit, AccelUnit::MilliEarthGravity);
    }

    #[test]
    fn test_params_unit_defaults() {
        let p: Params = util::params::load_from_str(
            "logging_enabled = false\nlogging_tag = \"IMU\"\n"
        ).unwrap();

        assert_eq!(p.accel_unit, AccelUnit::MetersPerSec2);
    }
}

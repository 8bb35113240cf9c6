//! Implementations for the AccelInteg state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;
use std::convert::Infallible;

// Internal
use super::{mean_integrate, Acceleration, Params, Position, Velocity};
use util::{
    archive::{Archived, Archiver},
    module::State,
    session::Session,
    time,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Acceleration integrator module state.
///
/// Dead reckons velocity and position from a stream of timestamped linear
/// acceleration samples. Only the latest value of each quantity is held.
pub struct AccelInteg {
    params: Params,

    position: Position,
    velocity: Velocity,
    acceleration: Option<Acceleration>,

    report: UpdateReport,
    arch_state: Archiver,
}

/// Data required to initialise the integrator.
#[derive(Debug, Clone)]
pub struct InitData {
    pub params: Params,
    pub position: Position,
    pub velocity: Velocity,
}

/// A read-only copy of the integrator's current estimates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IntegState {
    pub position: Position,
    pub velocity: Velocity,
    pub acceleration: Option<Acceleration>,
}

/// Flat record of one cycle, written to the archive.
#[derive(Serialize)]
struct ArchRecord {
    outcome: &'static str,
    dt_s: Option<f64>,
    acc_time_ns: u64,
    acc_x: f64,
    acc_y: f64,
    acc_z: f64,
    vel_time_ns: u64,
    vel_x: f64,
    vel_y: f64,
    vel_z: f64,
    pos_time_ns: u64,
    pos_x: f64,
    pos_y: f64,
    pos_z: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// What happened to a sample passed into `AccelInteg::update`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum UpdateReport {
    /// The sample had no timestamp and was ignored.
    Discarded,

    /// The sample was the first with a timestamp and is now the baseline for
    /// integration. Velocity and position are unchanged.
    Baselined,

    /// The sample was integrated.
    Integrated {
        /// Time since the previous acceleration sample.
        ///
        /// Units: seconds
        dt_s: f64,

        /// True if velocity was advanced.
        ///
        /// Only timestamped samples are ever stored as the previous
        /// acceleration, so this is always true.
        velocity_advanced: bool,

        /// True if position was advanced.
        position_advanced: bool,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AccelInteg {
    /// Create a new integrator starting from the given position and velocity.
    ///
    /// Acceleration is unset until the first timestamped sample arrives.
    pub fn new(params: Params, initial_position: Position, initial_velocity: Velocity) -> Self {
        Self {
            params,
            position: initial_position,
            velocity: initial_velocity,
            acceleration: None,
            report: UpdateReport::Discarded,
            arch_state: Archiver::default(),
        }
    }

    /// Restart integration with new parameters and starting values.
    ///
    /// Any archiver set up with `enable_archiving` is kept.
    pub fn initialize(
        &mut self,
        params: Params,
        initial_position: Position,
        initial_velocity: Velocity,
    ) {
        self.params = params;
        self.position = initial_position;
        self.velocity = initial_velocity;
        self.acceleration = None;
        self.report = UpdateReport::Discarded;
    }

    /// Start archiving the integrator state into the given session.
    pub fn enable_archiving(&mut self, session: &Session) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_state = Archiver::from_path(session, "accel_integ/state.csv")?;
        Ok(())
    }

    /// Integrate a new acceleration sample.
    ///
    /// Samples without a timestamp are ignored. The first timestamped sample
    /// only sets the baseline acceleration. Every later sample advances the
    /// velocity from the previous acceleration, and then advances the position
    /// from the previous velocity if that velocity was timestamped.
    pub fn update(&mut self, sample: Acceleration) -> UpdateReport {
        // Untimestamped samples are not yet valid, the estimates are left
        // untouched and only the report records the discard
        let acq_time_ns = match sample.acq_time_ns {
            Some(t) => t,
            None => {
                self.report = UpdateReport::Discarded;
                return self.report;
            }
        };

        // Need a previous acceleration to integrate from
        let accel_prev = match self.acceleration.replace(sample) {
            Some(a) => a,
            None => {
                self.report = UpdateReport::Baselined;
                return self.report;
            }
        };
        let velocity_prev = self.velocity;

        let mut velocity_advanced = false;
        let mut position_advanced = false;

        if let Some(delta_velocity) = mean_integrate(&sample, &accel_prev) {
            self.velocity = self.velocity.advanced_by(&delta_velocity);
            velocity_advanced = true;
        }

        // Position lags velocity by one sample, it is only advanced once the
        // velocity it integrates from carries a timestamp.
        if velocity_prev.acq_time_ns.is_some() {
            if let Some(delta_position) = mean_integrate(&self.velocity, &velocity_prev) {
                self.position = self.position.advanced_by(&delta_position);
                position_advanced = true;
            }
        }

        let dt_s = time::nanos_to_seconds(time::elapsed_nanos(
            acq_time_ns.get(),
            accel_prev.acq_time_ns_raw(),
        ));

        if self.params.logging_enabled {
            trace!(
                target: self.params.logging_tag.as_str(),
                "dt={:.3}s accel={} vel={} pos={}",
                dt_s,
                sample,
                self.velocity,
                self.position
            );
        }

        self.report = UpdateReport::Integrated {
            dt_s,
            velocity_advanced,
            position_advanced,
        };

        self.report
    }

    /// The current position estimate.
    pub fn position(&self) -> Position {
        self.position
    }

    /// The current velocity estimate.
    pub fn velocity(&self) -> Velocity {
        self.velocity
    }

    /// The latest timestamped acceleration sample, or `None` if none has been
    /// received since initialisation.
    pub fn acceleration(&self) -> Option<Acceleration> {
        self.acceleration
    }

    /// The parameters the integrator was initialised with.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// A copy of all current estimates.
    pub fn snapshot(&self) -> IntegState {
        IntegState {
            position: self.position,
            velocity: self.velocity,
            acceleration: self.acceleration,
        }
    }
}

impl State for AccelInteg {
    type InitData = InitData;
    type InitError = Infallible;

    type InputData = Acceleration;
    type OutputData = IntegState;
    type StatusReport = UpdateReport;
    type ProcError = Infallible;

    fn init(init_data: Self::InitData) -> Result<Self, Self::InitError> {
        Ok(Self::new(init_data.params, init_data.position, init_data.velocity))
    }

    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let report = self.update(*input_data);

        Ok((self.snapshot(), report))
    }
}

impl Archived for AccelInteg {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if !self.arch_state.is_init() {
            return Ok(());
        }

        let (outcome, dt_s) = match self.report {
            UpdateReport::Discarded => ("discarded", None),
            UpdateReport::Baselined => ("baselined", None),
            UpdateReport::Integrated { dt_s, .. } => ("integrated", Some(dt_s)),
        };
        let acc = self.acceleration.unwrap_or_default();

        self.arch_state.serialise(ArchRecord {
            outcome,
            dt_s,
            acc_time_ns: acc.acq_time_ns_raw(),
            acc_x: acc.vec[0],
            acc_y: acc.vec[1],
            acc_z: acc.vec[2],
            vel_time_ns: self.velocity.acq_time_ns_raw(),
            vel_x: self.velocity.vec[0],
            vel_y: self.velocity.vec[1],
            vel_z: self.velocity.vec[2],
            pos_time_ns: self.position.acq_time_ns_raw(),
            pos_x: self.position.vec[0],
            pos_y: self.position.vec[1],
            pos_z: self.position.vec[2],
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use log::{Log, Metadata, Record};
    use nalgebra::Vector3;
    use std::sync::Mutex;

    const SEC: u64 = time::NANOS_PER_SECOND as u64;

    fn integ(position: Position, velocity: Velocity) -> AccelInteg {
        AccelInteg::new(Params::default(), position, velocity)
    }

    fn accel_x(x: f64, t: u64) -> Acceleration {
        Acceleration::new(x, 0.0, 0.0, t)
    }

    #[test]
    fn test_init_state() {
        let p = Position::new(1.0, 2.0, 3.0, 7);
        let v = Velocity::new(0.5, 0.0, 0.0, 0);

        let ai = integ(p, v);

        assert_eq!(ai.position(), p);
        assert_eq!(ai.velocity(), v);
        assert_eq!(ai.acceleration(), None);
        assert_eq!(ai.params(), &Params::default());
    }

    #[test]
    fn test_zero_timestamp_ignored() {
        let mut ai = integ(Position::zero(), Velocity::zero());
        let before = ai.snapshot();

        assert_eq!(ai.update(accel_x(9.81, 0)), UpdateReport::Discarded);
        assert_eq!(ai.snapshot(), before);
        assert_eq!(ai.acceleration(), None);
    }

    #[test]
    fn test_first_sample_is_baseline() {
        let mut ai = integ(Position::new(1.0, 0.0, 0.0, SEC), Velocity::new(2.0, 0.0, 0.0, SEC));

        assert_eq!(ai.update(accel_x(1.0, 2 * SEC)), UpdateReport::Baselined);

        assert_eq!(ai.acceleration(), Some(accel_x(1.0, 2 * SEC)));
        assert_eq!(ai.velocity(), Velocity::new(2.0, 0.0, 0.0, SEC));
        assert_eq!(ai.position(), Position::new(1.0, 0.0, 0.0, SEC));
    }

    #[test]
    fn test_constant_accel_velocity_step() {
        let t_0 = 3 * SEC;
        let t_1 = t_0 + 20_000_000;
        let a = 2.5;

        let mut ai = integ(Position::zero(), Velocity::zero());
        ai.update(Acceleration::new(a, -a, 0.0, t_0));
        let v_0 = ai.velocity();
        ai.update(Acceleration::new(a, -a, 0.0, t_1));

        let dt_s = time::nanos_to_seconds((t_1 - t_0) as i64);
        let dv = ai.velocity().vec - v_0.vec;

        assert_eq!(dv, Vector3::new(a * dt_s, -a * dt_s, 0.0));
        assert!((dv[0] - a * (t_1 - t_0) as f64 * 1e-9).abs() < 1e-15);
        assert_eq!(ai.velocity().acq_time_ns_raw(), t_1);
    }

    #[test]
    fn test_unstamped_start_scenario() {
        let mut ai = integ(Position::zero(), Velocity::zero());

        // Placeholder reading before the driver has a timestamp
        assert_eq!(ai.update(accel_x(1.0, 0)), UpdateReport::Discarded);
        assert_eq!(ai.acceleration(), None);

        // First real sample is the baseline
        assert_eq!(ai.update(accel_x(1.0, SEC)), UpdateReport::Baselined);
        assert_eq!(ai.velocity(), Velocity::zero());
        assert_eq!(ai.position(), Position::zero());

        // Velocity advances, position waits for a timestamped velocity
        assert_eq!(
            ai.update(accel_x(1.0, 2 * SEC)),
            UpdateReport::Integrated {
                dt_s: 1.0,
                velocity_advanced: true,
                position_advanced: false
            }
        );
        assert_eq!(ai.velocity(), Velocity::new(1.0, 0.0, 0.0, 2 * SEC));
        assert_eq!(ai.position(), Position::zero());

        // Both advance from here on
        assert_eq!(
            ai.update(accel_x(1.0, 3 * SEC)),
            UpdateReport::Integrated {
                dt_s: 1.0,
                velocity_advanced: true,
                position_advanced: true
            }
        );
        assert_eq!(ai.velocity(), Velocity::new(2.0, 0.0, 0.0, 3 * SEC));
        assert_eq!(ai.position(), Position::new(1.5, 0.0, 0.0, 3 * SEC));

        ai.update(accel_x(1.0, 4 * SEC));
        assert_eq!(ai.velocity(), Velocity::new(3.0, 0.0, 0.0, 4 * SEC));
        assert_eq!(ai.position(), Position::new(4.0, 0.0, 0.0, 4 * SEC));
    }

    #[test]
    fn test_stamped_start_integrates_position_immediately() {
        let mut ai = integ(Position::new(0.0, 0.0, 0.0, SEC), Velocity::new(0.0, 0.0, 0.0, SEC));

        ai.update(accel_x(1.0, SEC));
        let r = ai.update(accel_x(1.0, 2 * SEC));

        assert_eq!(
            r,
            UpdateReport::Integrated {
                dt_s: 1.0,
                velocity_advanced: true,
                position_advanced: true
            }
        );
        assert_eq!(ai.velocity(), Velocity::new(1.0, 0.0, 0.0, 2 * SEC));
        assert_eq!(ai.position(), Position::new(0.5, 0.0, 0.0, 2 * SEC));
    }

    #[test]
    fn test_zero_timestamp_mid_stream_ignored() {
        let mut ai = integ(Position::zero(), Velocity::new(0.0, 0.0, 0.0, SEC));

        for i in 1..6u64 {
            ai.update(Acceleration::new(0.1 * i as f64, -0.3, 9.81, i * SEC / 10 + SEC));
        }

        let before = ai.snapshot();
        assert_eq!(ai.update(Acceleration::new(100.0, 100.0, 100.0, 0)), UpdateReport::Discarded);
        let after = ai.snapshot();

        let bits = |s: &IntegState| {
            let a = s.acceleration.unwrap();
            s.position.vec.iter()
                .chain(s.velocity.vec.iter())
                .chain(a.vec.iter())
                .map(|x| x.to_bits())
                .collect::<Vec<u64>>()
        };

        assert_eq!(after, before);
        assert_eq!(bits(&after), bits(&before));
    }

    #[test]
    fn test_initialize_resets() {
        let mut ai = integ(Position::zero(), Velocity::new(0.0, 0.0, 0.0, SEC));
        ai.update(accel_x(1.0, SEC));
        ai.update(accel_x(1.0, 2 * SEC));

        let params = Params {
            logging_enabled: true,
            logging_tag: String::from("Nav"),
            ..Params::default()
        };
        ai.initialize(params.clone(), Position::new(5.0, 5.0, 0.0, 0), Velocity::zero());

        assert_eq!(ai.params(), &params);
        assert_eq!(ai.acceleration(), None);
        assert_eq!(ai.position(), Position::new(5.0, 5.0, 0.0, 0));
        assert_eq!(ai.velocity(), Velocity::zero());

        // Logging enabled must not change the arithmetic
        assert_eq!(ai.update(accel_x(1.0, 3 * SEC)), UpdateReport::Baselined);
        ai.update(accel_x(1.0, 4 * SEC));
        assert_eq!(ai.velocity(), Velocity::new(1.0, 0.0, 0.0, 4 * SEC));
    }

    /// Position error of trapezoidal dead reckoning over a ramp in
    /// acceleration `a(t) = k t`, sampled every `step_ns`.
    fn ramp_position_error(k: f64, t_start_s: f64, duration_s: f64, step_ns: u64) -> f64 {
        let t_start_ns = (t_start_s * 1e9) as u64;
        let num_steps = (duration_s * 1e9) as u64 / step_ns;

        // Start at rest at the first sample time
        let mut ai = integ(
            Position::new(0.0, 0.0, 0.0, t_start_ns),
            Velocity::new(0.0, 0.0, 0.0, t_start_ns)
        );

        for i in 0..=num_steps {
            let t_ns = t_start_ns + i * step_ns;
            let t_s = time::nanos_to_seconds(t_ns as i64);
            ai.update(Acceleration::new(k * t_s, 0.0, 0.0, t_ns));
        }

        let t_end = time::nanos_to_seconds((t_start_ns + num_steps * step_ns) as i64);
        let t_0 = t_start_s;

        // v(t) = k/2 (t^2 - t_0^2), p(t) = k/2 (t^3/3 - t_0^2 t + 2 t_0^3 / 3)
        let v_exact = 0.5 * k * (t_end * t_end - t_0 * t_0);
        let p_exact = 0.5 * k * (t_end.powi(3) / 3.0 - t_0 * t_0 * t_end + 2.0 * t_0.powi(3) / 3.0);

        // Trapezoidal integration of a linear quantity is exact
        assert!((ai.velocity().vec[0] - v_exact).abs() < 1e-9);

        ai.position().vec[0] - p_exact
    }

    #[test]
    fn test_ramp_error_bound() {
        let k = 2.0;
        let duration_s = 2.0;

        let h_coarse = 0.01;
        let err_coarse = ramp_position_error(k, 1.0, duration_s, 10_000_000);
        let err_fine = ramp_position_error(k, 1.0, duration_s, 5_000_000);

        // Trapezoidal error for a quadratic integrand is k * T * h^2 / 12
        let bound = k * duration_s * h_coarse * h_coarse / 12.0;
        assert!(err_coarse.abs() <= bound * 1.001 + 1e-9);
        assert!((err_coarse - bound).abs() < 1e-8);

        // Halving the interval quarters the error
        let ratio = err_coarse / err_fine;
        assert!(ratio > 3.9 && ratio < 4.1, "ratio was {}", ratio);
    }

    #[test]
    fn test_state_trait() {
        let mut ai = AccelInteg::init(InitData {
            params: Params::default(),
            position: Position::zero(),
            velocity: Velocity::zero(),
        }).unwrap();

        let (out, report) = ai.proc(&accel_x(1.0, SEC)).unwrap();
        assert_eq!(report, UpdateReport::Baselined);
        assert_eq!(out, ai.snapshot());
        assert_eq!(out.acceleration, Some(accel_x(1.0, SEC)));

        // No archiver set up so writing is a no-op
        assert!(ai.write().is_ok());
    }

    /// Logger which records the target and message of every log line.
    struct CaptureLogger {
        lines: Mutex<Vec<(String, String)>>,
    }

    impl Log for CaptureLogger {
        fn enabled(&self, _: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &Record) {
            self.lines
                .lock()
                .unwrap()
                .push((record.target().to_string(), record.args().to_string()));
        }

        fn flush(&self) {}
    }

    static CAPTURE_LOGGER: CaptureLogger = CaptureLogger {
        lines: Mutex::new(Vec::new()),
    };

    /// Lines captured so far under the given target.
    fn captured(target: &str) -> Vec<String> {
        CAPTURE_LOGGER
            .lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == target)
            .map(|(_, m)| m.clone())
            .collect()
    }

    #[test]
    fn test_diagnostic_log_line() {
        // Only this test installs a logger, other tests just see it
        let _ = log::set_logger(&CAPTURE_LOGGER);
        log::set_max_level(log::LevelFilter::Trace);

        // Logging disabled writes nothing under its tag
        let mut ai = AccelInteg::new(
            Params {
                logging_enabled: false,
                logging_tag: String::from("AccelIntegQuiet"),
                ..Params::default()
            },
            Position::zero(),
            Velocity::zero(),
        );
        ai.update(accel_x(1.0, SEC));
        ai.update(accel_x(1.0, 2 * SEC));
        assert!(captured("AccelIntegQuiet").is_empty());

        // Logging enabled writes one line per integration step only
        let tag = "AccelIntegLoud";
        let mut ai = AccelInteg::new(
            Params {
                logging_enabled: true,
                logging_tag: String::from(tag),
                ..Params::default()
            },
            Position::zero(),
            Velocity::zero(),
        );

        ai.update(accel_x(1.0, 0));
        ai.update(accel_x(1.0, SEC));
        assert!(captured(tag).is_empty());

        ai.update(accel_x(1.0, 2 * SEC + SEC / 2));
        assert_eq!(
            captured(tag),
            vec![String::from(
                "dt=1.500s accel=(1.000 0.000 0.000)@2500000000 \
                 vel=(1.500 0.000 0.000)@2500000000 pos=(0.000 0.000 0.000)@-"
            )]
        );

        ai.update(accel_x(1.0, 0));
        assert_eq!(captured(tag).len(), 1);

        ai.update(accel_x(1.0, 3 * SEC + SEC / 2));
        let lines = captured(tag);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("dt=1.000s accel=(1.000 0.000 0.000)@3500000000 "));
        assert!(lines[1].ends_with("pos=(2.000 0.000 0.000)@3500000000"));
    }
}

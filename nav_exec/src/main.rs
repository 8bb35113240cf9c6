//! Navigation executable entry point.
//!
//! # Architecture
//!
//! The executable stands in for the robot's IMU driver. It replays a recorded
//! acceleration log through the acceleration integrator, one sample per
//! cycle, in the order the samples were recorded:
//!
//!     - Initialise session, logging and parameters
//!     - Main loop:
//!         - Read the next acceleration sample
//!         - Acceleration integrator processing
//!         - Archive the integrator state
//!     - Save the final state to the session directory

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::{eyre, WrapErr}, Report};
use log::{debug, info, warn};
use std::path::PathBuf;
use structopt::StructOpt;

// Internal
use nav_lib::{
    accel_integ::{self, AccelInteg, UpdateReport},
    params::NavExecParams,
    replay::SampleReader,
};
use util::{
    archive::Archived,
    logger::logger_init,
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Replay a recorded IMU acceleration log through the acceleration integrator.
#[derive(Debug, StructOpt)]
#[structopt(name = "nav_exec")]
struct Opts {
    /// CSV log of acceleration samples with the header `t_ns,ax,ay,az`
    #[structopt(parse(from_os_str))]
    samples: PathBuf,

    /// Executable parameter file, relative to the params directory
    #[structopt(short, long, default_value = "nav_exec.toml")]
    params: String,

    /// Archive the integrator state every cycle
    #[structopt(short, long)]
    archive: bool,
}

/// Counts of what happened to each replayed sample.
#[derive(Debug, Default)]
struct ReplayStats {
    discarded: usize,
    baselined: usize,
    integrated: usize,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    let exec_params: NavExecParams = util::params::load(&opts.params)
        .wrap_err("Could not load exec params")?;

    // Initialise session
    let session = Session::new("nav_exec", &exec_params.sessions_dir)
        .wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(exec_params.log_level, &exec_params.target_levels, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Griffins Navigation Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- INITIALISE MODULES ----

    let integ_params: accel_integ::Params = util::params::load(&exec_params.accel_integ_params)
        .wrap_err("Could not load AccelInteg params")?;

    info!(
        "AccelInteg params: logging {} under \"{}\", driver unit {:?}",
        if integ_params.logging_enabled { "enabled" } else { "disabled" },
        integ_params.logging_tag,
        integ_params.accel_unit
    );

    let initial_position = exec_params.initial_position();

    let mut accel_integ = match AccelInteg::init(accel_integ::InitData {
        params: integ_params,
        position: initial_position,
        velocity: exec_params.initial_velocity(),
    }) {
        Ok(a) => a,
        Err(e) => match e {},
    };

    if opts.archive {
        accel_integ
            .enable_archiving(&session)
            .map_err(|e| eyre!("Failed to set up AccelInteg archive: {}", e))?;
    }

    info!("Initial position: {}", accel_integ.position());
    info!("Initial velocity: {}", accel_integ.velocity());

    // ---- MAIN LOOP ----

    let samples = SampleReader::open(&opts.samples)
        .wrap_err_with(|| format!("Could not open sample log {:?}", opts.samples))?;

    info!("Replaying {:?}", opts.samples);

    let mut stats = ReplayStats::default();

    for sample in samples {
        let sample = sample.wrap_err("Bad sample in log")?;

        let (state, report) = match accel_integ.proc(&sample) {
            Ok(o) => o,
            Err(e) => match e {},
        };

        match report {
            UpdateReport::Discarded => stats.discarded += 1,
            UpdateReport::Baselined => stats.baselined += 1,
            UpdateReport::Integrated { .. } => stats.integrated += 1,
        }

        debug!("AccelInteg {:?}: vel={} pos={}", report, state.velocity, state.position);

        if let Err(e) = accel_integ.write() {
            warn!("Could not archive AccelInteg state: {}", e);
        }
    }

    // ---- SUMMARY ----

    let final_state = accel_integ.snapshot();

    info!(
        "Replay complete: {} integrated, {} baselined, {} discarded",
        stats.integrated, stats.baselined, stats.discarded
    );
    info!("Final velocity: {}", final_state.velocity);
    info!("Final position: {}", final_state.position);
    info!(
        "Distance from start: {:.3}",
        (final_state.position.vec - initial_position.vec).norm()
    );

    let state_path = session.session_root.join("final_state.json");
    let state_json = serde_json::to_string_pretty(&final_state)
        .wrap_err("Could not serialise final state")?;
    std::fs::write(&state_path, state_json)
        .wrap_err_with(|| format!("Could not write {:?}", state_path))?;

    info!("Final state saved to {:?}", state_path);

    Ok(())
}

//! Main rover navigation executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Start the motor and sonar drivers and the input source
//!     - Main loop:
//!         - Input acquisition (controller or script)
//!         - Distance sample collection
//!         - Mode arbitration and manual or autonomous control
//!         - Greeting playback
//!     - Shutdown, stopping the wheels
//!
//! # Modules
//!
//! Cyclic modules (e.g. `auto_nav`) shall provide a public struct
//! implementing the `util::module::State` trait.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use nav_lib::{
    audio::AudioPlayer,
    auto_nav::AutoNav,
    dist_filter::{DistanceFilter, DistanceMonitor},
    drivers::{firmata, joystick::Joystick, sim::SimMotorDriver},
    input_source::{InputSource, Polled, ScriptSource},
    mode_arb::ModeArbiter,
    motor_ctrl::MotorCtrl,
    params::NavExecParams,
    robot_state::{RobotState, RobotStateError},
};
use robot_if::eqpt::{sample_channel, MotorDriver};
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    script_interpreter::ScriptInterpreter,
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Rover navigation executable
#[derive(Debug, StructOpt)]
#[structopt(name = "nav_exec")]
struct Opts {
    /// Replay input and sonar readings from a script instead of the
    /// controller
    #[structopt(long, parse(from_os_str))]
    script: Option<PathBuf>,

    /// Use the simulated motor driver instead of the Firmata board
    #[structopt(long)]
    sim: bool,

    /// Parameter file, relative to `$ROVER_SW_ROOT/params`
    #[structopt(long, default_value = "nav_exec.toml")]
    params: String,

    /// Log more detail, `-v` for debug and `-vv` for trace
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("nav_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    let log_level = match opts.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    logger_init(log_level, &session).wrap_err("Failed to initialise logging")?;

    info!("Rover Navigation Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opts);

    // ---- LOAD PARAMETERS ----

    let params: NavExecParams =
        util::params::load(&opts.params).wrap_err("Could not load nav_exec params")?;
    params
        .are_valid()
        .wrap_err("The nav_exec params are invalid")?;

    info!("Exec parameters loaded");

    // ---- SIGNAL HANDLING ----

    // Cleared on Ctrl-C or SIGTERM, and at shutdown to stop the driver
    // threads
    let running = Arc::new(AtomicBool::new(true));
    {
        let r = running.clone();
        ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))
            .wrap_err("Failed to set the termination handler")?;
    }

    // ---- INITIALISE DRIVERS ----

    info!("Initialising drivers...");

    let (sample_tx, sample_rx) = sample_channel(params.sonar.queue_len);

    let driver: Box<dyn MotorDriver> = if opts.sim {
        info!("Using the simulated motor driver");
        Box::new(SimMotorDriver::default())
    } else {
        let port = firmata::open_serial(&params.firmata)
            .wrap_err("Failed to open the Firmata board")?;
        let reader = port
            .try_clone()
            .wrap_err("Failed to clone the serial port for the sonar reader")?;

        let mut driver = firmata::FirmataMotorDriver::new(port, &params.firmata)
            .wrap_err("Failed to set up the motor pins")?;
        driver
            .board_mut()
            .sonar_config(
                params.sonar.trigger_pin,
                params.sonar.echo_pin,
                params.sonar.ping_interval_ms,
                params.sonar.max_range_cm,
            )
            .wrap_err("Failed to configure the sonar")?;

        firmata::spawn_sonar_reader(reader, sample_tx.clone(), running.clone())
            .wrap_err("Failed to start the sonar reader")?;

        info!("Firmata board initialised on {}", params.firmata.port);
        Box::new(driver)
    };

    // ---- INITIALISE INPUT SOURCE ----

    let mut input_source = match opts.script {
        Some(ref path) => {
            info!("Loading script from {:?}", path);

            let si = ScriptInterpreter::new(path).wrap_err("Failed to load script")?;

            info!(
                "Loaded script lasts {:.02} s and contains {} commands\n",
                si.get_duration(),
                si.get_num_cmds()
            );

            InputSource::Script(ScriptSource::new(si, sample_tx.clone()))
        }
        None => {
            let js = Joystick::open(&params.joystick.device)
                .wrap_err("Failed to open the joystick")?;
            info!("Joystick opened on {:?}", params.joystick.device);
            InputSource::Joystick(js)
        }
    };

    // Only the producers keep a sender
    drop(sample_tx);

    if opts.sim && opts.script.is_none() {
        warn!("No distance source in simulation without a script, the estimate will go stale");
    }

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut auto_nav = AutoNav::default();
    auto_nav
        .init(params.auto_nav.clone())
        .wrap_err("Failed to initialise AutoNav")?;
    info!("AutoNav init complete");

    let mut robot = RobotState::new(
        MotorCtrl::new(driver, params.motor_ctrl.clone()),
        auto_nav,
        ModeArbiter::new(params.mode_arb.clone()),
        DistanceFilter::new(params.sonar.max_range_cm),
        DistanceMonitor::new(params.sonar.stale_after_s, session::get_monotonic_seconds()),
        params.max_consec_driver_faults,
    );

    let audio = AudioPlayer::new(params.audio.clone());

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Beginning main loop in manual mode\n");

    let cycle_period = Duration::from_secs_f64(params.cycle_period_s);
    let mut num_consec_cycle_overruns: u64 = 0;
    let mut num_cycles: u64 = 0;
    let mut exit_result = Ok(());

    while running.load(Ordering::SeqCst) {
        // Get cycle start time
        let cycle_start_instant = Instant::now();
        let now_s = session::get_monotonic_seconds();

        // ---- INPUT ACQUISITION ----

        let input = match input_source.poll(now_s) {
            Polled::Snapshot(s) => s,
            Polled::EndOfInput => break,
        };

        // ---- CONTROL PROCESSING ----

        match robot.step(&input, sample_rx.try_iter(), now_s) {
            Ok(rpt) => {
                if rpt.greet {
                    if let Err(e) = audio.play_greeting() {
                        warn!("Could not play the greeting: {}", e);
                    }
                }

                if rpt.exit {
                    break;
                }
            }
            Err(e @ RobotStateError::DriverFaultLimit(_)) => {
                error!("{}", e);
                exit_result = Err(e);
                break;
            }
            Err(e) => warn!("Error during control processing: {}", e),
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => {
                num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                num_consec_cycle_overruns += 1;
                warn!(
                    "Cycle overran by {:.06} s ({} consecutive)",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64(),
                    num_consec_cycle_overruns
                );
            }
        }

        num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    if !running.load(Ordering::SeqCst) {
        info!("Termination signal received");
    }
    running.store(false, Ordering::SeqCst);

    info!("Stopping the wheels after {} cycles", num_cycles);
    robot
        .shutdown()
        .wrap_err("Failed to stop the wheels at shutdown")?;

    info!("End of execution");

    exit_result.wrap_err("Navigation stopped after repeated driver faults")
}

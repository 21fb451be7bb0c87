//! # Robot state
//!
//! Everything the control loop mutates, owned in one place and stepped once
//! per cycle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{error, warn};
use thiserror::Error;

// Internal
use crate::{
    auto_nav::{self, AutoNav, AutoNavError, NavInput},
    dist_filter::{DistanceFilter, DistanceMonitor},
    mode_arb::{ArbAction, Mode, ModeArbiter},
    motor_ctrl::{MnvrDemand, MotorCtrl, MotorCtrlError},
};
use robot_if::{
    eqpt::{DistanceSample, MotorDriver},
    input::InputSnapshot,
};
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The state of the rover threaded through the control loop.
pub struct RobotState<D: MotorDriver> {
    pub motor_ctrl: MotorCtrl<D>,
    pub auto_nav: AutoNav,
    pub arbiter: ModeArbiter,
    pub filter: DistanceFilter,
    pub monitor: DistanceMonitor,

    /// Number of consecutive driver faults allowed before the loop gives up.
    max_consec_driver_faults: u32,

    num_consec_driver_faults: u32,
}

/// Summary of one control cycle.
#[derive(Debug, Clone)]
pub struct StepReport {
    /// True if the loop should stop.
    pub exit: bool,

    /// True if the greeting should be played.
    pub greet: bool,

    pub mode: Mode,

    /// Smoothed distance at the end of input processing.
    ///
    /// Units: centimetres
    pub distance_cm: u16,

    /// AutoNav's report, if it ran this cycle.
    pub auto_nav_rpt: Option<auto_nav::StatusReport>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RobotStateError {
    #[error("Motor driver faulted on {0} consecutive cycles")]
    DriverFaultLimit(u32),

    #[error("AutoNav processing failed: {0}")]
    AutoNav(#[from] AutoNavError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<D: MotorDriver> RobotState<D> {
    pub fn new(
        motor_ctrl: MotorCtrl<D>,
        auto_nav: AutoNav,
        arbiter: ModeArbiter,
        filter: DistanceFilter,
        monitor: DistanceMonitor,
        max_consec_driver_faults: u32,
    ) -> Self {
        Self {
            motor_ctrl,
            auto_nav,
            arbiter,
            filter,
            monitor,
            max_consec_driver_faults,
            num_consec_driver_faults: 0,
        }
    }

    /// Run one control cycle.
    ///
    /// `samples` are the distance readings which arrived since the last
    /// cycle, oldest first.
    pub fn step<I>(
        &mut self,
        input: &InputSnapshot,
        samples: I,
        now_s: f64,
    ) -> Result<StepReport, RobotStateError>
    where
        I: IntoIterator<Item = DistanceSample>,
    {
        // ---- DISTANCE ----

        for s in samples {
            self.filter.record_sample(s);
            self.monitor.record_arrival(now_s);
        }
        let distance_stale = self.monitor.check(now_s);
        let distance_cm = self.filter.current_estimate();

        // ---- ARBITRATION ----

        let tick = self.arbiter.tick(input);

        let mut report = StepReport {
            exit: false,
            greet: tick.greet,
            mode: tick.mode,
            distance_cm,
            auto_nav_rpt: None,
        };

        match tick.action {
            ArbAction::Exit => report.exit = true,
            ArbAction::Manual(dem) => self.execute(&dem, now_s)?,
            ArbAction::EnterAutonomous(dem) => {
                self.auto_nav.reset();
                self.execute(&dem, now_s)?;
            }
            ArbAction::Autonomous => {
                let nav_input = NavInput {
                    distance_cm,
                    distance_stale,
                    current_mnvr: self.motor_ctrl.current_mnvr(),
                    timed_status: self.motor_ctrl.timed_action().status(now_s),
                };

                let (dem, rpt) = self.auto_nav.proc(&nav_input)?;
                report.auto_nav_rpt = Some(rpt);

                if let Some(dem) = dem {
                    self.execute(&dem, now_s)?;
                }
            }
        }

        Ok(report)
    }

    /// Bring the wheels to a stop at the end of the run.
    pub fn shutdown(&mut self) -> Result<(), MotorCtrlError> {
        self.motor_ctrl.shutdown()
    }

    pub fn num_consec_driver_faults(&self) -> u32 {
        self.num_consec_driver_faults
    }

    /// Execute a demand, counting driver faults against the budget.
    fn execute(&mut self, dem: &MnvrDemand, now_s: f64) -> Result<(), RobotStateError> {
        match self.motor_ctrl.execute(dem, now_s) {
            Ok(()) => {
                self.num_consec_driver_faults = 0;
                Ok(())
            }
            Err(MotorCtrlError::DriverFault(e)) => {
                self.num_consec_driver_faults += 1;
                error!(
                    "Driver fault executing {:?} ({} consecutive): {}",
                    dem.mnvr, self.num_consec_driver_faults, e
                );

                if self.num_consec_driver_faults > self.max_consec_driver_faults {
                    Err(RobotStateError::DriverFaultLimit(
                        self.num_consec_driver_faults,
                    ))
                } else {
                    Ok(())
                }
            }
            Err(e) => {
                warn!("Rejected {:?}: {}", dem, e);
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

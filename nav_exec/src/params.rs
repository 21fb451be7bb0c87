//! Parameters for the navigation executable

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use thiserror::Error;

use crate::{
    audio::AudioParams,
    auto_nav::{AutoNavError, AutoNavParams},
    drivers::{
        firmata::{FirmataError, FirmataParams},
        joystick::JoystickParams,
    },
    mode_arb::ModeArbParams,
    motor_ctrl::MotorCtrlParams,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the executable, loaded from `nav_exec.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct NavExecParams {
    /// Target period of one control cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Consecutive cycles with a driver fault tolerated before the run is
    /// ended.
    pub max_consec_driver_faults: u32,

    pub sonar: SonarParams,
    pub motor_ctrl: MotorCtrlParams,
    pub auto_nav: AutoNavParams,
    pub mode_arb: ModeArbParams,
    pub firmata: FirmataParams,
    pub joystick: JoystickParams,
    pub audio: AudioParams,
}

/// Parameters for the distance sensor.
#[derive(Debug, Clone, Deserialize)]
pub struct SonarParams {
    /// Maximum sensing range, also the filter's initial estimate.
    ///
    /// Units: centimetres
    pub max_range_cm: u16,

    /// Time without samples after which the estimate is stale.
    ///
    /// Units: seconds
    pub stale_after_s: f64,

    /// Number of samples that can wait between two cycles before new ones
    /// are dropped.
    pub queue_len: usize,

    pub trigger_pin: u8,
    pub echo_pin: u8,

    /// Units: milliseconds
    pub ping_interval_ms: u8,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("cycle_period_s must be positive, found {0}")]
    InvalidCyclePeriod(f64),

    #[error("sonar.stale_after_s must be positive, found {0}")]
    InvalidStaleWindow(f64),

    #[error("sonar.queue_len must be at least 1")]
    EmptySampleQueue,

    #[error("sonar.max_range_cm must be greater than auto_nav.min_distance_cm")]
    RangeBelowMinDistance,

    #[error("{0} ({1}) is above motor_ctrl.max_speed ({2})")]
    SpeedAboveMax(&'static str, u16, u16),

    #[error(transparent)]
    AutoNav(#[from] AutoNavError),

    #[error(transparent)]
    Firmata(#[from] FirmataError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl NavExecParams {
    /// Check the parameters are consistent before any of them are used.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if !(self.cycle_period_s.is_finite() && self.cycle_period_s > 0.0) {
            return Err(ParamsError::InvalidCyclePeriod(self.cycle_period_s));
        }

        if !(self.sonar.stale_after_s.is_finite() && self.sonar.stale_after_s > 0.0) {
            return Err(ParamsError::InvalidStaleWindow(self.sonar.stale_after_s));
        }
        if self.sonar.queue_len == 0 {
            return Err(ParamsError::EmptySampleQueue);
        }
        if self.sonar.max_range_cm <= self.auto_nav.min_distance_cm {
            return Err(ParamsError::RangeBelowMinDistance);
        }

        self.auto_nav.are_valid()?;
        self.firmata.are_valid()?;

        let max = self.motor_ctrl.max_speed;
        let speeds = [
            ("auto_nav speeds", self.auto_nav.max_speed_used()),
            ("mode_arb.manual_speed", self.mode_arb.manual_speed),
            ("mode_arb.auto_entry_speed", self.mode_arb.auto_entry_speed),
        ];
        for (name, speed) in speeds {
            if speed > max {
                return Err(ParamsError::SpeedAboveMax(name, speed, max));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use robot_if::input::Button;

    fn load_shipped() -> NavExecParams {
        util::params::load_from_path(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../params/nav_exec.toml"
        ))
        .unwrap()
    }

    #[test]
    fn test_shipped_params() {
        let p = load_shipped();
        p.are_valid().unwrap();

        assert_eq!(p.auto_nav.min_distance_cm, 20);
        assert_eq!(p.auto_nav.max_turn_attempts, 3);
        assert_eq!(p.sonar.max_range_cm, 200);
        assert_eq!(p.mode_arb.toggle_button, Button::Select);
        assert_eq!(p.mode_arb.exit_button, Button::Start);
        assert_eq!(p.firmata.front_right.enable_pin, 45);
        assert!((p.cycle_period_s - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_params() {
        let mut p = load_shipped();
        p.mode_arb.manual_speed = 300;
        assert!(matches!(
            p.are_valid(),
            Err(ParamsError::SpeedAboveMax("mode_arb.manual_speed", 300, 255))
        ));

        let mut p = load_shipped();
        p.cycle_period_s = 0.0;
        assert!(matches!(
            p.are_valid(),
            Err(ParamsError::InvalidCyclePeriod(_))
        ));

        let mut p = load_shipped();
        p.firmata.rear_left.enable_pin = 130;
        assert!(matches!(p.are_valid(), Err(ParamsError::Firmata(_))));
    }
}

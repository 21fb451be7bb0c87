//! Parameters structure for MotorCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for motor control.
#[derive(Debug, Clone, Deserialize)]
pub struct MotorCtrlParams {
    /// Highest power level accepted by the motor driver.
    pub max_speed: u16,

    /// Number of times the shutdown stop is attempted before giving up.
    pub shutdown_stop_attempts: u32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for MotorCtrlParams {
    fn default() -> Self {
        Self {
            max_speed: 255,
            shutdown_stop_attempts: 3,
        }
    }
}

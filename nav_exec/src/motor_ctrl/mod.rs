//! Motor control module
//!
//! Turns manoeuvres into wheel writes on a [`robot_if::eqpt::MotorDriver`],
//! and keeps track of which manoeuvre is current and how long it should run.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod mnvr;
mod params;
mod state;
mod timed_action;

#[cfg(test)]
pub(crate) mod mock;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use mnvr::*;
pub use params::*;
pub use state::*;
pub use timed_action::*;

use robot_if::eqpt::DriverError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during MotorCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum MotorCtrlError {
    #[error("Speed {0} is outside the valid range 0 to {1}")]
    InvalidSpeed(u16, u16),

    #[error("Manoeuvre duration must be positive, found {0} s")]
    InvalidDuration(f64),

    #[error("The motor driver failed, wheels have been stopped: {0}")]
    DriverFault(DriverError),
}

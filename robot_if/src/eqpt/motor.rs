//! # Drive Motor Interface
//!
//! The rover has four independently enabled DC motors, one per wheel. Each motor is driven by a
//! direction (a pair of H-bridge inputs) and a power level (PWM duty on the enable input).

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of driven wheels on the rover.
pub const NUM_WHEELS: usize = 4;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Unified API for the board driving the motors.
///
/// Writes are fire-and-forget, the driver never reports when a wheel reaches the demand. An error
/// means the write may not have reached the hardware.
pub trait MotorDriver {
    /// Set the direction inputs of a wheel's H-bridge.
    fn set_direction(&mut self, wheel: WheelId, dir: Direction) -> Result<(), DriverError>;

    /// Set the power (PWM level) of a wheel.
    fn set_power(&mut self, wheel: WheelId, power: u16) -> Result<(), DriverError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demand for a single wheel.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct WheelDem {
    pub dir: Direction,
    pub power: u16,
}

/// Demands for every wheel, indexed by [`WheelId::index`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct MotorDems {
    pub wheels: [WheelDem; NUM_WHEELS],
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of the driven wheels, in the order the board is wired.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum WheelId {
    FrontLeft,
    RearLeft,
    RearRight,
    FrontRight,
}

/// Rotation direction of a wheel.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
}

/// Errors reported by a motor or sensor driver.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("I/O error on the driver link: {0}")]
    Io(#[from] std::io::Error),

    #[error("The driver is not connected")]
    Disconnected,

    #[error("The driver rejected the write: {0}")]
    Rejected(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl WheelId {
    /// All wheels, in write order.
    pub const ALL: [WheelId; NUM_WHEELS] = [
        WheelId::FrontLeft,
        WheelId::RearLeft,
        WheelId::RearRight,
        WheelId::FrontRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// True for the wheels on the left side of the rover.
    pub fn is_left(self) -> bool {
        matches!(self, WheelId::FrontLeft | WheelId::RearLeft)
    }
}

impl Direction {
    /// Returns the opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

impl Default for MotorDems {
    fn default() -> Self {
        Self {
            wheels: [WheelDem {
                dir: Direction::Forward,
                power: 0,
            }; NUM_WHEELS],
        }
    }
}

impl MotorDems {
    pub fn wheel(&self, wheel: WheelId) -> WheelDem {
        self.wheels[wheel.index()]
    }

    /// True if every wheel has zero power.
    pub fn is_stopped(&self) -> bool {
        self.wheels.iter().all(|w| w.power == 0)
    }
}

impl<D: MotorDriver + ?Sized> MotorDriver for Box<D> {
    fn set_direction(&mut self, wheel: WheelId, dir: Direction) -> Result<(), DriverError> {
        (**self).set_direction(wheel, dir)
    }

    fn set_power(&mut self, wheel: WheelId, power: u16) -> Result<(), DriverError> {
        (**self).set_power(wheel, power)
    }
}

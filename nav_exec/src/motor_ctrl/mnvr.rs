//! Manoeuvre definitions and the wheel demand table

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use robot_if::eqpt::{Direction, MotorDems, WheelDem, WheelId};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Divisor applied to the inside wheels' power during a soft turn.
pub const SOFT_TURN_DIVISOR: u16 = 4;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A drive pattern applied to all four wheels.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Maneuver {
    /// All wheels unpowered
    Stopped,

    /// All wheels forwards at full power
    Forward,

    /// All wheels backwards at full power
    Reverse,

    /// Skid turn on the spot, left wheels backwards and right wheels forwards
    TurningLeft,

    /// Skid turn on the spot, left wheels forwards and right wheels backwards
    TurningRight,

    /// Forward arc to the left, left wheels at quarter power
    SoftLeft,

    /// Forward arc to the right, right wheels at quarter power
    SoftRight,

    /// Reversing arc with the left wheels at quarter power
    ReverseSoftLeft,

    /// Reversing arc with the right wheels at quarter power
    ReverseSoftRight,
}

/// Side the rover turns towards.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TurnDir {
    Left,
    Right,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A request to execute a manoeuvre.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MnvrDemand {
    pub mnvr: Maneuver,

    /// Power level of the outside wheels.
    pub speed: u16,

    /// How long the manoeuvre should run for, or `None` to run until
    /// replaced.
    ///
    /// Units: seconds
    pub duration_s: Option<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Maneuver {
    /// Hard (on the spot) turn towards the given side.
    pub fn hard_turn(dir: TurnDir) -> Self {
        match dir {
            TurnDir::Left => Maneuver::TurningLeft,
            TurnDir::Right => Maneuver::TurningRight,
        }
    }

    /// Forward soft turn towards the given side.
    pub fn soft_turn(dir: TurnDir) -> Self {
        match dir {
            TurnDir::Left => Maneuver::SoftLeft,
            TurnDir::Right => Maneuver::SoftRight,
        }
    }

    /// Returns the side of a forward-going or on-the-spot turn, or `None` for
    /// any other manoeuvre.
    ///
    /// These are the turns issued for obstacle avoidance. Reversing arcs are
    /// not included.
    pub fn turn_dir(self) -> Option<TurnDir> {
        match self {
            Maneuver::TurningLeft | Maneuver::SoftLeft => Some(TurnDir::Left),
            Maneuver::TurningRight | Maneuver::SoftRight => Some(TurnDir::Right),
            _ => None,
        }
    }

    /// True for the avoidance turns, see [`Maneuver::turn_dir`].
    pub fn is_turning(self) -> bool {
        self.turn_dir().is_some()
    }

    /// Compute the per wheel demands for this manoeuvre at the given speed.
    pub fn wheel_dems(self, speed: u16) -> MotorDems {
        let soft = speed / SOFT_TURN_DIVISOR;
        let mut dems = MotorDems::default();

        for wheel in WheelId::ALL {
            let left = wheel.is_left();

            let (dir, power) = match self {
                Maneuver::Stopped => (Direction::Forward, 0),
                Maneuver::Forward => (Direction::Forward, speed),
                Maneuver::Reverse => (Direction::Backward, speed),
                Maneuver::TurningLeft if left => (Direction::Backward, speed),
                Maneuver::TurningLeft => (Direction::Forward, speed),
                Maneuver::TurningRight if left => (Direction::Forward, speed),
                Maneuver::TurningRight => (Direction::Backward, speed),
                Maneuver::SoftLeft if left => (Direction::Forward, soft),
                Maneuver::SoftLeft => (Direction::Forward, speed),
                Maneuver::SoftRight if left => (Direction::Forward, speed),
                Maneuver::SoftRight => (Direction::Forward, soft),
                Maneuver::ReverseSoftLeft if left => (Direction::Backward, soft),
                Maneuver::ReverseSoftLeft => (Direction::Backward, speed),
                Maneuver::ReverseSoftRight if left => (Direction::Backward, speed),
                Maneuver::ReverseSoftRight => (Direction::Backward, soft),
            };

            dems.wheels[wheel.index()] = WheelDem { dir, power };
        }

        dems
    }
}

impl MnvrDemand {
    /// A demand which runs until replaced.
    pub fn indefinite(mnvr: Maneuver, speed: u16) -> Self {
        Self {
            mnvr,
            speed,
            duration_s: None,
        }
    }

    /// A demand which runs for a bounded time.
    pub fn timed(mnvr: Maneuver, speed: u16, duration_s: f64) -> Self {
        Self {
            mnvr,
            speed,
            duration_s: Some(duration_s),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

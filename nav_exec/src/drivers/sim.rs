//! # Simulated motor driver
//!
//! Accepts every write and remembers the latest demand for each wheel, for
//! running the executable without a board attached.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;

use robot_if::eqpt::{Direction, DriverError, MotorDems, MotorDriver, WheelId};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone)]
pub struct SimMotorDriver {
    dems: MotorDems,
    num_writes: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimMotorDriver {
    pub fn dems(&self) -> &MotorDems {
        &self.dems
    }

    pub fn num_writes(&self) -> u64 {
        self.num_writes
    }
}

impl MotorDriver for SimMotorDriver {
    fn set_direction(&mut self, wheel: WheelId, dir: Direction) -> Result<(), DriverError> {
        trace!("SimMotorDriver: {:?} direction {:?}", wheel, dir);
        self.dems.wheels[wheel.index()].dir = dir;
        self.num_writes += 1;
        Ok(())
    }

    fn set_power(&mut self, wheel: WheelId, power: u16) -> Result<(), DriverError> {
        trace!("SimMotorDriver: {:?} power {}", wheel, power);
        self.dems.wheels[wheel.index()].power = power;
        self.num_writes += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::motor_ctrl::{Maneuver, MotorCtrl, MotorCtrlParams};

    #[test]
    fn test_sim_tracks_dems() {
        let mut mc = MotorCtrl::new(SimMotorDriver::default(), MotorCtrlParams::default());

        mc.soft_right(200, None, 0.0).unwrap();
        assert_eq!(*mc.driver().dems(), Maneuver::SoftRight.wheel_dems(200));
        assert_eq!(mc.driver().num_writes(), 8);

        mc.stop(1.0).unwrap();
        assert!(mc.driver().dems().is_stopped());
        assert_eq!(mc.driver().num_writes(), 12);
    }
}

//! Implementations for the MotorCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, error, warn};

// Internal
use super::{
    Maneuver, MnvrDemand, MotorCtrlError, MotorCtrlParams, TimedActionTracker,
};
use robot_if::eqpt::{DriverError, MotorDems, MotorDriver, WheelId};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Motor control state.
///
/// This is the only writer to the motor driver. Every command either applies
/// all of its wheel writes or leaves the wheels stopped and reports a
/// [`MotorCtrlError::DriverFault`].
pub struct MotorCtrl<D: MotorDriver> {
    driver: D,

    params: MotorCtrlParams,

    current_mnvr: Maneuver,
    current_speed: u16,

    /// Time the current manoeuvre was issued.
    ///
    /// Units: seconds since session start
    mnvr_start_s: f64,

    timed_action: TimedActionTracker,

    /// Last demands successfully written to the driver.
    dems: MotorDems,

    /// True once a zero power write has succeeded and nothing has been
    /// commanded since.
    safe: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<D: MotorDriver> MotorCtrl<D> {
    /// Take ownership of a motor driver.
    ///
    /// The wheels are assumed unpowered until the first command.
    pub fn new(driver: D, params: MotorCtrlParams) -> Self {
        Self {
            driver,
            params,
            current_mnvr: Maneuver::Stopped,
            current_speed: 0,
            mnvr_start_s: 0.0,
            timed_action: TimedActionTracker::default(),
            dems: MotorDems::default(),
            safe: false,
        }
    }

    // ---- MANOEUVRES ----

    pub fn forward(
        &mut self,
        speed: u16,
        duration_s: Option<f64>,
        now_s: f64,
    ) -> Result<(), MotorCtrlError> {
        self.command(Maneuver::Forward, speed, duration_s, now_s)
    }

    pub fn reverse(
        &mut self,
        speed: u16,
        duration_s: Option<f64>,
        now_s: f64,
    ) -> Result<(), MotorCtrlError> {
        self.command(Maneuver::Reverse, speed, duration_s, now_s)
    }

    pub fn turn_left(
        &mut self,
        speed: u16,
        duration_s: Option<f64>,
        now_s: f64,
    ) -> Result<(), MotorCtrlError> {
        self.command(Maneuver::TurningLeft, speed, duration_s, now_s)
    }

    pub fn turn_right(
        &mut self,
        speed: u16,
        duration_s: Option<f64>,
        now_s: f64,
    ) -> Result<(), MotorCtrlError> {
        self.command(Maneuver::TurningRight, speed, duration_s, now_s)
    }

    pub fn soft_left(
        &mut self,
        speed: u16,
        duration_s: Option<f64>,
        now_s: f64,
    ) -> Result<(), MotorCtrlError> {
        self.command(Maneuver::SoftLeft, speed, duration_s, now_s)
    }

    pub fn soft_right(
        &mut self,
        speed: u16,
        duration_s: Option<f64>,
        now_s: f64,
    ) -> Result<(), MotorCtrlError> {
        self.command(Maneuver::SoftRight, speed, duration_s, now_s)
    }

    pub fn reverse_soft_left(
        &mut self,
        speed: u16,
        duration_s: Option<f64>,
        now_s: f64,
    ) -> Result<(), MotorCtrlError> {
        self.command(Maneuver::ReverseSoftLeft, speed, duration_s, now_s)
    }

    pub fn reverse_soft_right(
        &mut self,
        speed: u16,
        duration_s: Option<f64>,
        now_s: f64,
    ) -> Result<(), MotorCtrlError> {
        self.command(Maneuver::ReverseSoftRight, speed, duration_s, now_s)
    }

    /// Set zero power on all four wheels.
    ///
    /// Direction outputs are left as they were. Calling this repeatedly
    /// always gives the same state.
    pub fn stop(&mut self, now_s: f64) -> Result<(), MotorCtrlError> {
        if let Err(e) = self.write_zero_power() {
            return Err(self.fault(e));
        }

        self.set_stopped();
        self.mnvr_start_s = now_s;

        debug!("MotorCtrl: Stopped");

        Ok(())
    }

    /// Execute a manoeuvre demand.
    pub fn execute(&mut self, dem: &MnvrDemand, now_s: f64) -> Result<(), MotorCtrlError> {
        match dem.mnvr {
            Maneuver::Stopped => self.stop(now_s),
            m => self.command(m, dem.speed, dem.duration_s, now_s),
        }
    }

    /// Stop the wheels at shutdown, retrying on driver faults.
    pub fn shutdown(&mut self) -> Result<(), MotorCtrlError> {
        let attempts = self.params.shutdown_stop_attempts.max(1);
        let mut last_err = None;

        for attempt in 1..=attempts {
            match self.write_zero_power() {
                Ok(()) => {
                    self.set_stopped();
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        "Shutdown stop attempt {} of {} failed: {}",
                        attempt, attempts, e
                    );
                    last_err = Some(e);
                }
            }
        }

        match last_err {
            Some(e) => Err(MotorCtrlError::DriverFault(e)),
            None => Ok(()),
        }
    }

    // ---- ACCESSORS ----

    pub fn current_mnvr(&self) -> Maneuver {
        self.current_mnvr
    }

    pub fn current_speed(&self) -> u16 {
        self.current_speed
    }

    pub fn mnvr_start_s(&self) -> f64 {
        self.mnvr_start_s
    }

    pub fn timed_action(&self) -> &TimedActionTracker {
        &self.timed_action
    }

    /// Last demands successfully written to the driver.
    pub fn dems(&self) -> &MotorDems {
        &self.dems
    }

    pub fn params(&self) -> &MotorCtrlParams {
        &self.params
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    // ---- PRIVATE ----

    fn command(
        &mut self,
        mnvr: Maneuver,
        speed: u16,
        duration_s: Option<f64>,
        now_s: f64,
    ) -> Result<(), MotorCtrlError> {
        if speed > self.params.max_speed {
            return Err(MotorCtrlError::InvalidSpeed(speed, self.params.max_speed));
        }
        if let Some(d) = duration_s {
            if !(d.is_finite() && d > 0.0) {
                return Err(MotorCtrlError::InvalidDuration(d));
            }
        }

        let dems = mnvr.wheel_dems(speed);

        if let Err(e) = self.write_dems(&dems) {
            return Err(self.fault(e));
        }

        self.current_mnvr = mnvr;
        self.current_speed = speed;
        self.mnvr_start_s = now_s;
        self.dems = dems;
        self.safe = dems.is_stopped();

        match duration_s {
            Some(d) => self.timed_action.set(now_s, d),
            None => self.timed_action.clear(),
        }

        debug!(
            "MotorCtrl: {:?} at speed {} for {:?} s",
            mnvr, speed, duration_s
        );

        Ok(())
    }

    /// Write all directions, then all powers, so no wheel is ever powered in
    /// its old direction.
    fn write_dems(&mut self, dems: &MotorDems) -> Result<(), DriverError> {
        for wheel in WheelId::ALL {
            self.driver.set_direction(wheel, dems.wheel(wheel).dir)?;
        }
        for wheel in WheelId::ALL {
            self.driver.set_power(wheel, dems.wheel(wheel).power)?;
        }

        Ok(())
    }

    /// Write zero power to every wheel, attempting all four even if one
    /// fails. The first error is returned.
    fn write_zero_power(&mut self) -> Result<(), DriverError> {
        let mut result = Ok(());

        for wheel in WheelId::ALL {
            if let Err(e) = self.driver.set_power(wheel, 0) {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }

        result
    }

    /// Handle a driver error part way through a command by stopping the
    /// wheels.
    fn fault(&mut self, err: DriverError) -> MotorCtrlError {
        error!("Motor driver fault: {}", err);

        match self.write_zero_power() {
            Ok(()) => self.set_stopped(),
            Err(e) => {
                error!("Could not stop the wheels after a driver fault: {}", e);

                // The wheels are in an unknown state, so record them as
                // stopped but leave the safe flag clear for the next attempt.
                self.set_stopped();
                self.safe = false;
            }
        }

        MotorCtrlError::DriverFault(err)
    }

    fn set_stopped(&mut self) {
        self.current_mnvr = Maneuver::Stopped;
        self.current_speed = 0;
        self.timed_action.clear();
        for w in self.dems.wheels.iter_mut() {
            w.power = 0;
        }
        self.safe = true;
    }
}

impl<D: MotorDriver> Drop for MotorCtrl<D> {
    fn drop(&mut self) {
        if self.safe {
            return;
        }

        if let Err(e) = self.shutdown() {
            error!("Could not stop the wheels while dropping MotorCtrl: {}", e);
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::motor_ctrl::mock::{MockDriver, MockWrite};
    use robot_if::eqpt::Direction;

    fn motor_ctrl() -> (MotorCtrl<MockDriver>, MockDriver) {
        let driver = MockDriver::default();
        let handle = driver.clone();
        (MotorCtrl::new(driver, MotorCtrlParams::default()), handle)
    }

    #[test]
    fn test_direction_before_power() {
        let (mut mc, log) = motor_ctrl();

        mc.forward(200, None, 1.0).unwrap();

        let writes = log.writes();
        assert_eq!(writes.len(), 8);
        assert!(writes[..4]
            .iter()
            .all(|w| matches!(w, MockWrite::Dir(_, Direction::Forward))));
        assert!(writes[4..]
            .iter()
            .all(|w| matches!(w, MockWrite::Power(_, 200))));

        assert_eq!(mc.current_mnvr(), Maneuver::Forward);
        assert_eq!(mc.mnvr_start_s(), 1.0);
        assert!(!mc.timed_action().has_pending());
    }

    #[test]
    fn test_timed_mnvr() {
        let (mut mc, _) = motor_ctrl();

        mc.soft_left(255, Some(3.0), 10.0).unwrap();
        assert!(mc.timed_action().has_pending());
        assert!(!mc.timed_action().is_elapsed(12.99));
        assert!(mc.timed_action().is_elapsed(13.0));

        // An indefinite manoeuvre clears the timed action
        mc.reverse(100, None, 11.0).unwrap();
        assert!(!mc.timed_action().has_pending());
        assert_eq!(mc.current_mnvr(), Maneuver::Reverse);
    }

    #[test]
    fn test_invalid_params() {
        let (mut mc, log) = motor_ctrl();
        mc.turn_left(100, Some(1.0), 0.0).unwrap();
        log.clear();

        assert!(matches!(
            mc.forward(256, None, 1.0),
            Err(MotorCtrlError::InvalidSpeed(256, 255))
        ));
        for d in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                mc.reverse(100, Some(d), 1.0),
                Err(MotorCtrlError::InvalidDuration(_))
            ));
        }

        // Nothing written, nothing changed
        assert!(log.writes().is_empty());
        assert_eq!(mc.current_mnvr(), Maneuver::TurningLeft);
        assert_eq!(mc.mnvr_start_s(), 0.0);
        assert!(mc.timed_action().has_pending());
    }

    #[test]
    fn test_stop_idempotent() {
        let (mut mc, log) = motor_ctrl();
        mc.turn_right(255, Some(2.0), 0.0).unwrap();
        log.clear();

        mc.stop(1.0).unwrap();
        let first = log.writes();
        let first_dems = *mc.dems();
        log.clear();

        mc.stop(1.2).unwrap();
        let second = log.writes();

        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
        assert!(first.iter().all(|w| matches!(w, MockWrite::Power(_, 0))));
        assert_eq!(*mc.dems(), first_dems);
        assert!(mc.dems().is_stopped());
        assert_eq!(mc.current_mnvr(), Maneuver::Stopped);
        assert!(!mc.timed_action().has_pending());
    }

    #[test]
    fn test_fault_mid_sequence() {
        let (mut mc, log) = motor_ctrl();
        mc.forward(200, Some(5.0), 0.0).unwrap();
        log.clear();

        // Fail on the second power write of the next command
        log.fail_next_at(5);

        let res = mc.reverse(100, Some(3.0), 1.0);
        assert!(matches!(res, Err(MotorCtrlError::DriverFault(_))));

        // The wheels end up unpowered rather than half reversed
        let writes = log.writes();
        let tail = &writes[writes.len() - 4..];
        assert!(tail.iter().all(|w| matches!(w, MockWrite::Power(_, 0))));
        assert_eq!(log.powers(), [0; 4]);

        assert_eq!(mc.current_mnvr(), Maneuver::Stopped);
        assert!(!mc.timed_action().has_pending());
    }

    #[test]
    fn test_execute_demand() {
        let (mut mc, _) = motor_ctrl();

        mc.execute(&MnvrDemand::timed(Maneuver::TurningRight, 255, 2.0), 4.0)
            .unwrap();
        assert_eq!(mc.current_mnvr(), Maneuver::TurningRight);
        assert!(mc.timed_action().is_elapsed(6.0));

        mc.execute(&MnvrDemand::indefinite(Maneuver::Stopped, 0), 5.0)
            .unwrap();
        assert_eq!(mc.current_mnvr(), Maneuver::Stopped);
    }

    #[test]
    fn test_stop_on_drop() {
        let (mut mc, log) = motor_ctrl();
        mc.forward(150, None, 0.0).unwrap();
        assert_eq!(log.powers(), [150; 4]);

        drop(mc);
        assert_eq!(log.powers(), [0; 4]);
    }

    #[test]
    fn test_shutdown_retries() {
        let (mut mc, log) = motor_ctrl();
        mc.forward(150, None, 0.0).unwrap();

        log.set_fail_always(true);
        assert!(matches!(
            mc.shutdown(),
            Err(MotorCtrlError::DriverFault(_))
        ));

        log.set_fail_always(false);
        mc.shutdown().unwrap();
        assert_eq!(log.powers(), [0; 4]);
    }
}

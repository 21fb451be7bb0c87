//! # Mode arbiter
//!
//! Merges operator input with autonomous control. Each cycle the arbiter
//! looks at one input snapshot and decides whether the loop should exit,
//! drive a manual manoeuvre, seed autonomous motion or hand over to
//! [`crate::auto_nav`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;
use serde::{Deserialize, Serialize};

use crate::motor_ctrl::{Maneuver, MnvrDemand};
use robot_if::input::{Button, InputSnapshot};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the mode arbiter.
#[derive(Debug, Clone, Deserialize)]
pub struct ModeArbParams {
    /// Speed of every manual manoeuvre.
    pub manual_speed: u16,

    /// Speed of the forward motion issued on entering autonomous mode.
    pub auto_entry_speed: u16,

    /// Button which switches between manual and autonomous.
    pub toggle_button: Button,

    /// Button which ends the run.
    pub exit_button: Button,

    /// Button which plays the greeting.
    pub greeting_button: Button,
}

pub struct ModeArbiter {
    params: ModeArbParams,

    mode: Mode,

    /// Snapshot from the previous cycle, for edge detection.
    prev_input: InputSnapshot,

    /// True once the greeting has been requested this run.
    greeted: bool,
}

/// Result of one arbiter cycle.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TickReport {
    pub action: ArbAction,

    /// Mode after this cycle.
    pub mode: Mode,

    /// True if the greeting should be played.
    pub greet: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Control mode of the rover.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Mode {
    Manual,
    Autonomous,
}

/// What the control loop should do this cycle.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ArbAction {
    /// Stop the loop
    Exit,

    /// Execute a manual manoeuvre
    Manual(MnvrDemand),

    /// Autonomous mode has just been entered. Reset the turn attempts and
    /// execute this demand.
    EnterAutonomous(MnvrDemand),

    /// Run autonomous navigation
    Autonomous,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ModeArbParams {
    fn default() -> Self {
        Self {
            manual_speed: 255,
            auto_entry_speed: 100,
            toggle_button: Button::Select,
            exit_button: Button::Start,
            greeting_button: Button::Cross,
        }
    }
}

impl ModeArbiter {
    /// Create a new arbiter, starting in manual mode.
    pub fn new(params: ModeArbParams) -> Self {
        Self {
            params,
            mode: Mode::Manual,
            prev_input: InputSnapshot::default(),
            greeted: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Process one input snapshot.
    pub fn tick(&mut self, input: &InputSnapshot) -> TickReport {
        let prev = self.prev_input;
        self.prev_input = *input;

        let greet = !self.greeted && input.rising_edge(&prev, self.params.greeting_button);
        if greet {
            self.greeted = true;
        }

        let action = if input.is_pressed(self.params.exit_button) {
            info!("Exit requested");
            ArbAction::Exit
        } else if input.rising_edge(&prev, self.params.toggle_button) {
            match self.mode {
                Mode::Manual => {
                    info!("Mode change: Manual -> Autonomous");
                    self.mode = Mode::Autonomous;
                    ArbAction::EnterAutonomous(MnvrDemand::indefinite(
                        Maneuver::Forward,
                        self.params.auto_entry_speed,
                    ))
                }
                Mode::Autonomous => {
                    info!("Mode change: Autonomous -> Manual");
                    self.mode = Mode::Manual;
                    ArbAction::Manual(manual_demand(input, self.params.manual_speed))
                }
            }
        } else {
            match self.mode {
                Mode::Manual => ArbAction::Manual(manual_demand(input, self.params.manual_speed)),
                Mode::Autonomous => ArbAction::Autonomous,
            }
        };

        TickReport {
            action,
            mode: self.mode,
            greet,
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Map the D-pad to a manual manoeuvre.
///
/// Diagonals take priority over single directions, and no direction means
/// stop.
pub fn manual_demand(input: &InputSnapshot, speed: u16) -> MnvrDemand {
    let up = input.is_pressed(Button::Up);
    let down = input.is_pressed(Button::Down);
    let left = input.is_pressed(Button::Left);
    let right = input.is_pressed(Button::Right);

    let mnvr = if up && left {
        Maneuver::SoftLeft
    } else if up && right {
        Maneuver::SoftRight
    } else if down && left {
        Maneuver::ReverseSoftLeft
    } else if down && right {
        Maneuver::ReverseSoftRight
    } else if up {
        Maneuver::Forward
    } else if down {
        Maneuver::Reverse
    } else if left {
        Maneuver::TurningLeft
    } else if right {
        Maneuver::TurningRight
    } else {
        Maneuver::Stopped
    };

    match mnvr {
        Maneuver::Stopped => MnvrDemand::indefinite(Maneuver::Stopped, 0),
        m => MnvrDemand::indefinite(m, speed),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn snapshot(buttons: &[Button]) -> InputSnapshot {
        let mut s = InputSnapshot::default();
        for &b in buttons {
            s.set_button(b, true);
        }
        s
    }

    #[test]
    fn test_manual_mapping() {
        let cases = [
            (vec![Button::Up, Button::Left], Maneuver::SoftLeft),
            (vec![Button::Up, Button::Right], Maneuver::SoftRight),
            (vec![Button::Down, Button::Left], Maneuver::ReverseSoftLeft),
            (vec![Button::Down, Button::Right], Maneuver::ReverseSoftRight),
            (vec![Button::Up], Maneuver::Forward),
            (vec![Button::Down], Maneuver::Reverse),
            (vec![Button::Left], Maneuver::TurningLeft),
            (vec![Button::Right], Maneuver::TurningRight),
            (vec![Button::Up, Button::Down, Button::Left], Maneuver::SoftLeft),
            (vec![Button::Triangle], Maneuver::Stopped),
            (vec![], Maneuver::Stopped),
        ];

        for (buttons, mnvr) in cases {
            let dem = manual_demand(&snapshot(&buttons), 255);
            assert_eq!(dem.mnvr, mnvr, "buttons: {:?}", buttons);
            assert!(dem.duration_s.is_none());
        }
    }

    #[test]
    fn test_toggle_edge() {
        let mut arb = ModeArbiter::new(ModeArbParams::default());

        let held = snapshot(&[Button::Select, Button::Up]);

        let rpt = arb.tick(&held);
        assert_eq!(rpt.mode, Mode::Autonomous);
        assert_eq!(
            rpt.action,
            ArbAction::EnterAutonomous(MnvrDemand::indefinite(Maneuver::Forward, 100))
        );

        // Holding the button does not toggle again, and manual input is
        // ignored while autonomous
        let rpt = arb.tick(&held);
        assert_eq!(rpt.action, ArbAction::Autonomous);

        // Release then press again to go back to manual
        arb.tick(&InputSnapshot::default());
        let rpt = arb.tick(&held);
        assert_eq!(rpt.mode, Mode::Manual);
        assert_eq!(
            rpt.action,
            ArbAction::Manual(MnvrDemand::indefinite(Maneuver::Forward, 255))
        );
    }

    #[test]
    fn test_exit_in_any_mode() {
        let mut arb = ModeArbiter::new(ModeArbParams::default());
        assert_eq!(
            arb.tick(&snapshot(&[Button::Start, Button::Up])).action,
            ArbAction::Exit
        );

        let mut arb = ModeArbiter::new(ModeArbParams::default());
        arb.tick(&snapshot(&[Button::Select]));
        assert_eq!(arb.mode(), Mode::Autonomous);
        assert_eq!(
            arb.tick(&snapshot(&[Button::Start, Button::Select])).action,
            ArbAction::Exit
        );
    }

    #[test]
    fn test_greet_once() {
        let mut arb = ModeArbiter::new(ModeArbParams::default());
        let cross = snapshot(&[Button::Cross]);
        let none = InputSnapshot::default();

        assert!(arb.tick(&cross).greet);
        assert!(!arb.tick(&cross).greet);
        assert!(!arb.tick(&none).greet);
        assert!(!arb.tick(&cross).greet);
    }

    #[test]
    fn test_configured_roles() {
        let mut arb = ModeArbiter::new(ModeArbParams {
            toggle_button: Button::Ps,
            exit_button: Button::Circle,
            ..Default::default()
        });

        assert!(matches!(
            arb.tick(&snapshot(&[Button::Select])).action,
            ArbAction::Manual(_)
        ));
        assert!(matches!(
            arb.tick(&snapshot(&[Button::Ps])).action,
            ArbAction::EnterAutonomous(_)
        ));
        assert_eq!(
            arb.tick(&snapshot(&[Button::Circle])).action,
            ArbAction::Exit
        );
    }
}

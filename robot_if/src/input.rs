//! # Operator input interface
//!
//! The input device is polled once per control cycle, producing an [`InputSnapshot`] of every
//! button and stick axis. Drivers apply [`InputEvent`]s to an [`InputLatch`], which hands out one
//! snapshot per poll.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Value reported by a stick axis at rest.
pub const AXIS_CENTRE: i32 = 127;

/// Number of stick axes on the controller (two sticks, two axes each).
pub const NUM_AXES: usize = 4;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// State of the input device at one instant.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct InputSnapshot {
    /// Bit set of pressed buttons, indexed by `Button as u32`
    pressed: u32,

    /// Stick axis positions, indexed by `Axis as usize`
    axes: [i32; NUM_AXES],
}

/// Collects device events between two polls.
///
/// A button pressed at any point since the last poll is reported as held in the next snapshot,
/// even if it was released again before the poll. Taps shorter than a control cycle therefore
/// still produce a rising edge.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct InputLatch {
    current: InputSnapshot,

    /// Buttons pressed since the last call to `take`
    pressed_since_poll: u32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Buttons on the controller.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Button {
    Select,
    Start,
    LeftStick,
    RightStick,
    Up,
    Right,
    Down,
    Left,
    L2,
    R2,
    L1,
    R1,
    Triangle,
    Circle,
    Cross,
    Square,
    Ps,
}

/// Stick axes on the controller.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Axis {
    LeftX,
    LeftY,
    RightX,
    RightY,
}

/// A single change reported by the input device.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    Press(Button),
    Release(Button),
    Axis { axis: Axis, value: i32 },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for InputSnapshot {
    fn default() -> Self {
        Self {
            pressed: 0,
            axes: [AXIS_CENTRE; NUM_AXES],
        }
    }
}

impl InputSnapshot {
    /// Returns true if the button is held down in this snapshot.
    pub fn is_pressed(&self, button: Button) -> bool {
        self.pressed & button.mask() != 0
    }

    /// Returns true if the button is down now but was up in `prev`.
    pub fn rising_edge(&self, prev: &InputSnapshot, button: Button) -> bool {
        self.is_pressed(button) && !prev.is_pressed(button)
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.pressed |= button.mask();
        } else {
            self.pressed &= !button.mask();
        }
    }

    pub fn axis(&self, axis: Axis) -> i32 {
        self.axes[axis as usize]
    }

    pub fn set_axis(&mut self, axis: Axis, value: i32) {
        self.axes[axis as usize] = value;
    }

    /// Returns true if no button is held.
    pub fn no_buttons(&self) -> bool {
        self.pressed == 0
    }

    /// Update the snapshot with an event from the device.
    pub fn apply(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::Press(b) => self.set_button(b, true),
            InputEvent::Release(b) => self.set_button(b, false),
            InputEvent::Axis { axis, value } => self.set_axis(axis, value),
        }
    }
}

impl InputLatch {
    pub fn apply(&mut self, event: &InputEvent) {
        if let InputEvent::Press(b) = *event {
            self.pressed_since_poll |= b.mask();
        }
        self.current.apply(event);
    }

    /// The device state right now, ignoring latched presses.
    pub fn current(&self) -> &InputSnapshot {
        &self.current
    }

    /// Snapshot for this poll, then clear the latched presses.
    pub fn take(&mut self) -> InputSnapshot {
        let mut snap = self.current;
        snap.pressed |= self.pressed_since_poll;
        self.pressed_since_poll = 0;
        snap
    }
}

impl Button {
    fn mask(self) -> u32 {
        1 << (self as u32)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_snapshot() {
        let snap = InputSnapshot::default();

        assert!(snap.no_buttons());
        assert_eq!(snap.axis(Axis::LeftX), AXIS_CENTRE);
        assert_eq!(snap.axis(Axis::RightY), AXIS_CENTRE);
    }

    #[test]
    fn test_apply_events() {
        let mut snap = InputSnapshot::default();

        snap.apply(&InputEvent::Press(Button::Up));
        snap.apply(&InputEvent::Press(Button::Left));
        snap.apply(&InputEvent::Axis {
            axis: Axis::RightY,
            value: 3,
        });

        assert!(snap.is_pressed(Button::Up));
        assert!(snap.is_pressed(Button::Left));
        assert!(!snap.is_pressed(Button::Down));
        assert_eq!(snap.axis(Axis::RightY), 3);

        snap.apply(&InputEvent::Release(Button::Up));
        assert!(!snap.is_pressed(Button::Up));
        assert!(snap.is_pressed(Button::Left));
    }

    #[test]
    fn test_rising_edge() {
        let prev = InputSnapshot::default();
        let mut held = prev;
        held.set_button(Button::Select, true);

        assert!(held.rising_edge(&prev, Button::Select));

        // Holding the button is not a new edge
        assert!(!held.rising_edge(&held, Button::Select));

        // Nor is releasing it
        assert!(!prev.rising_edge(&held, Button::Select));
    }

    #[test]
    fn test_latch_short_press() {
        let mut latch = InputLatch::default();
        let first = latch.take();

        // Pressed and released between two polls
        latch.apply(&InputEvent::Press(Button::Select));
        latch.apply(&InputEvent::Release(Button::Select));
        assert!(!latch.current().is_pressed(Button::Select));

        let second = latch.take();
        assert!(second.rising_edge(&first, Button::Select));

        // Reported once only
        let third = latch.take();
        assert!(!third.is_pressed(Button::Select));
    }

    #[test]
    fn test_latch_held_button() {
        let mut latch = InputLatch::default();

        latch.apply(&InputEvent::Press(Button::Up));
        assert!(latch.take().is_pressed(Button::Up));
        assert!(latch.take().is_pressed(Button::Up));

        latch.apply(&InputEvent::Release(Button::Up));
        latch.apply(&InputEvent::Axis {
            axis: Axis::LeftX,
            value: 0,
        });
        let snap = latch.take();
        assert!(snap.no_buttons());
        assert_eq!(snap.axis(Axis::LeftX), 0);
    }
}

//! Concrete collaborators: the hardware and simulated drivers behind the
//! `robot_if` interfaces.

pub mod firmata;
pub mod joystick;
pub mod sim;

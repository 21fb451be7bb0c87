//! # Robot interface crate.
//!
//! Provides the interfaces between the navigation executable and the equipment around it: the
//! operator's input device, the drive motors and the distance sensor.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Operator input snapshots and events
pub mod input;

/// Scripted commands, used to replay input and sensor data without hardware
pub mod cmd;

/// Interfaces to equipment (motors and sonar)
pub mod eqpt;

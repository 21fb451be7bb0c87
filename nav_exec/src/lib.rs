//! # Rover navigation library
//!
//! Modules making up the navigation executable, exposed as a library so they
//! can be tested and benchmarked on their own.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod audio;
pub mod auto_nav;
pub mod dist_filter;
pub mod drivers;
pub mod input_source;
pub mod mode_arb;
pub mod motor_ctrl;
pub mod params;
pub mod robot_state;

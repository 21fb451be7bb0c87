//! Autonomous navigation module
//!
//! Decides, once per cycle, whether the rover should keep going, turn away
//! from an obstacle, back off or resume driving forwards.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;
mod turn_dir;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;
pub use turn_dir::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during AutoNav operation.
#[derive(Debug, thiserror::Error)]
pub enum AutoNavError {
    #[error("Invalid AutoNav parameters: {0}")]
    InvalidParams(String),
}

//! # Equipment interfaces

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Drive motor interface
pub mod motor;

/// Distance sensor interface
pub mod sonar;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use motor::*;
pub use sonar::*;

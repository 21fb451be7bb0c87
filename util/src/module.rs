//! Cyclic module interface
//!
//! A cyclic module is set up once from its parameters, then stepped once per
//! control cycle by the executable. Modules never own hardware, they turn
//! their input into demands which the caller executes.

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A module stepped by the control loop.
pub trait State {
    /// Parameters the module is configured with.
    type InitData;
    type InitError;

    /// What the module reads each cycle.
    type InputData;

    /// What the module asks the caller to do each cycle.
    type OutputData;

    /// Diagnostics for the cycle, for logging and tests.
    type StatusReport;
    type ProcError;

    /// Validate and apply the parameters, leaving the module ready to run.
    ///
    /// May be called again to reconfigure the module, which also resets it.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError>;

    /// Clear any state built up by previous cycles while keeping the
    /// parameters. Called when control is handed back to the module.
    fn reset(&mut self);

    /// Run one cycle.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}

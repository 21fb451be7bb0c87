//! # Input sources
//!
//! Operator input comes either from a controller or from a script replayed
//! against the session clock. Both are polled once per cycle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{error, info, trace, warn};

// Internal
use crate::drivers::joystick::Joystick;
use robot_if::{
    eqpt::{SampleSendError, SampleSender},
    input::{InputLatch, InputSnapshot},
};
use util::script_interpreter::{PendingCmds, ScriptInterpreter};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Replays a script as controller input and sonar readings.
pub struct ScriptSource {
    interp: ScriptInterpreter,

    /// Controller state built up from the script so far.
    latch: InputLatch,

    /// Where scripted sonar readings are delivered.
    sonar_tx: SampleSender,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Various sources for operator input.
pub enum InputSource {
    Joystick(Joystick),
    Script(ScriptSource),
}

/// Result of polling an input source.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Polled {
    Snapshot(InputSnapshot),

    /// The source has no more input to give, the run should end.
    EndOfInput,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl InputSource {
    pub fn poll(&mut self, now_s: f64) -> Polled {
        match self {
            InputSource::Joystick(js) => {
                if js.is_connected() {
                    Polled::Snapshot(js.snapshot())
                } else {
                    error!("Joystick disconnected");
                    Polled::EndOfInput
                }
            }
            InputSource::Script(s) => s.poll(now_s),
        }
    }
}

impl ScriptSource {
    pub fn new(interp: ScriptInterpreter, sonar_tx: SampleSender) -> Self {
        Self {
            interp,
            latch: InputLatch::default(),
            sonar_tx,
        }
    }

    /// Apply every command due at `now_s` and return the resulting
    /// controller state.
    pub fn poll(&mut self, now_s: f64) -> Polled {
        match self.interp.get_pending(now_s) {
            PendingCmds::None => (),
            PendingCmds::Some(cmds) => {
                for cmd in cmds.iter() {
                    trace!("Script: {:?}", cmd);

                    if let Some(event) = cmd.input_event() {
                        self.latch.apply(&event);
                    }

                    if let Some(sample) = cmd.sonar_sample() {
                        match self.sonar_tx.push(sample) {
                            Ok(()) => (),
                            Err(SampleSendError::QueueFull) => {
                                warn!("Sample queue full, scripted {:?} dropped", sample)
                            }
                            Err(e) => warn!("Could not deliver scripted sample: {}", e),
                        }
                    }
                }
            }
            PendingCmds::EndOfScript => {
                info!("End of input script reached, stopping");
                return Polled::EndOfInput;
            }
        }

        Polled::Snapshot(self.latch.take())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

//! # Scripted commands
//!
//! A script replays operator input and sonar readings against the session clock, so the
//! navigation loop can be driven without a controller or a board attached.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    eqpt::DistanceSample,
    input::{Axis, Button, InputEvent},
};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// One entry of an input script.
///
/// Encoded as externally tagged JSON, for example `{"Press": "Select"}`, `{"Sonar": 35}` or
/// `{"Axis": {"axis": "LeftX", "value": 0}}`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum ScriptCmd {
    /// Press a controller button
    Press(Button),

    /// Release a controller button
    Release(Button),

    /// Move a stick axis
    Axis { axis: Axis, value: i32 },

    /// Deliver a raw sonar reading in centimetres
    Sonar(u16),
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum ScriptCmdParseError {
    #[error("Command contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ScriptCmd {
    /// Parse a command from its JSON representation.
    pub fn from_json(json_str: &str) -> Result<Self, ScriptCmdParseError> {
        serde_json::from_str(json_str.trim()).map_err(ScriptCmdParseError::InvalidJson)
    }

    /// The input event carried by this command, if it is an input command.
    pub fn input_event(&self) -> Option<InputEvent> {
        match *self {
            ScriptCmd::Press(b) => Some(InputEvent::Press(b)),
            ScriptCmd::Release(b) => Some(InputEvent::Release(b)),
            ScriptCmd::Axis { axis, value } => Some(InputEvent::Axis { axis, value }),
            ScriptCmd::Sonar(_) => None,
        }
    }

    /// The sonar sample carried by this command, if it is a sonar command.
    pub fn sonar_sample(&self) -> Option<DistanceSample> {
        match *self {
            ScriptCmd::Sonar(cm) => Some(DistanceSample(cm)),
            _ => None,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

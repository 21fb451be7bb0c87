//! # Input script interpreter module
//!
//! This module provides an interpreter for navigation scripts, allowing
//! operator input and sonar readings to be replayed from a file.
//!
//! A script is a sequence of `<time>: <json>;` entries, where the time is in
//! seconds since the start of the session and the JSON payload is a
//! [`ScriptCmd`]. Anything outside an entry (blank lines, notes) is ignored.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use regex::RegexBuilder;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Internal
use robot_if::cmd::{ScriptCmd, ScriptCmdParseError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A command which is scripted to occur at a specific time.
#[derive(Debug)]
struct Command {
    /// The time the command is supposed to execute at
    exec_time_s: f64,

    /// The command to run
    cmd: ScriptCmd,
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use `.get_pending`
/// to acquire a list of commands that need executing.
#[derive(Debug)]
pub struct ScriptInterpreter {
    script_path: Option<PathBuf>,
    cmds: VecDeque<Command>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0:?}")]
    ScriptNotFound(PathBuf),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)"
    )]
    InvalidTimestamp(String),

    #[error("Script timestamps must not decrease, found {1} s after {0} s")]
    OutOfOrder(f64, f64),

    #[error("Script contains an invalid command at {0} s: {1}")]
    InvalidCmd(f64, ScriptCmdParseError),
}

/// Commands due for execution.
#[derive(Debug, PartialEq)]
pub enum PendingCmds {
    None,
    Some(Vec<ScriptCmd>),
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {
    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        let path = PathBuf::from(script_path.as_ref());

        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path));
        }

        let script = fs::read_to_string(&path).map_err(ScriptError::ScriptLoadError)?;

        let mut interp = Self::from_text(&script)?;
        interp.script_path = Some(path);

        Ok(interp)
    }

    /// Create a new interpreter from the script text itself.
    pub fn from_text(script: &str) -> Result<Self, ScriptError> {
        let mut cmds: VecDeque<Command> = VecDeque::new();

        // Go through the script executing __the magic regex__. The pattern is
        // a literal so building it cannot fail.
        let re = match RegexBuilder::new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
        {
            Ok(r) => r,
            Err(e) => unreachable!("Script regex is invalid: {}", e),
        };

        let mut last_time_s = 0f64;

        for cap in re.captures_iter(script) {
            let time_str = cap.get(1).map_or("", |m| m.as_str());
            let payload = cap.get(3).map_or("", |m| m.as_str());

            let exec_time_s: f64 = time_str
                .parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{}", e)))?;

            if exec_time_s < last_time_s {
                return Err(ScriptError::OutOfOrder(last_time_s, exec_time_s));
            }
            last_time_s = exec_time_s;

            let cmd = ScriptCmd::from_json(payload)
                .map_err(|e| ScriptError::InvalidCmd(exec_time_s, e))?;

            cmds.push_back(Command { exec_time_s, cmd });
        }

        if cmds.is_empty() {
            return Err(ScriptError::ScriptEmpty);
        }

        Ok(ScriptInterpreter {
            script_path: None,
            cmds,
        })
    }

    /// Return the commands due at `now_s`, in script order.
    ///
    /// A command is due once the current time has reached its execution
    /// time. Once every command has been returned `EndOfScript` is given.
    pub fn get_pending(&mut self, now_s: f64) -> PendingCmds {
        if self.cmds.is_empty() {
            return PendingCmds::EndOfScript;
        }

        let mut due = vec![];

        while let Some(c) = self.cmds.front() {
            if c.exec_time_s > now_s {
                break;
            }
            if let Some(c) = self.cmds.pop_front() {
                due.push(c.cmd);
            }
        }

        if due.is_empty() {
            PendingCmds::None
        } else {
            PendingCmds::Some(due)
        }
    }

    /// Get the number of commands still to run
    pub fn get_num_cmds(&self) -> usize {
        self.cmds.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.cmds.back() {
            Some(c) => c.exec_time_s,
            None => 0f64,
        }
    }

    /// The file the script was loaded from, if any.
    pub fn script_path(&self) -> Option<&Path> {
        self.script_path.as_deref()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use robot_if::input::Button;

    const SCRIPT: &str = r#"
        Enter autonomous mode then drive at a wall
        0.0: {"Press": "Select"};
        0.2: {"Release": "Select"};
        0.2: {"Sonar": 150};
        1.5: {"Sonar": 35};
        3: {"Press": "Start"};
    "#;

    #[test]
    fn test_parse_and_replay() {
        let mut interp = ScriptInterpreter::from_text(SCRIPT).unwrap();

        assert_eq!(interp.get_num_cmds(), 5);
        assert!((interp.get_duration() - 3.0).abs() < 1e-9);
        assert!(interp.script_path().is_none());

        assert_eq!(
            interp.get_pending(0.0),
            PendingCmds::Some(vec![ScriptCmd::Press(Button::Select)])
        );
        assert_eq!(interp.get_pending(0.1), PendingCmds::None);
        assert_eq!(
            interp.get_pending(0.25),
            PendingCmds::Some(vec![
                ScriptCmd::Release(Button::Select),
                ScriptCmd::Sonar(150)
            ])
        );
        assert_eq!(
            interp.get_pending(10.0),
            PendingCmds::Some(vec![ScriptCmd::Sonar(35), ScriptCmd::Press(Button::Start)])
        );
        assert_eq!(interp.get_pending(11.0), PendingCmds::EndOfScript);
    }

    #[test]
    fn test_bad_scripts() {
        assert!(matches!(
            ScriptInterpreter::from_text("nothing to see here"),
            Err(ScriptError::ScriptEmpty)
        ));
        assert!(matches!(
            ScriptInterpreter::from_text(r#"1.0: {"Press": "Jump"};"#),
            Err(ScriptError::InvalidCmd(_, _))
        ));
        assert!(matches!(
            ScriptInterpreter::from_text("2.0: {\"Sonar\": 1};\n1.0: {\"Sonar\": 2};"),
            Err(ScriptError::OutOfOrder(_, _))
        ));
        assert!(matches!(
            ScriptInterpreter::new("/does/not/exist.nvs"),
            Err(ScriptError::ScriptNotFound(_))
        ));
    }
}

//! Timed action tracking
//!
//! Records how long the current manoeuvre is meant to run for. Expiry is
//! polled by the decision engine, nothing is interrupted when it passes.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A bounded run of a manoeuvre.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct TimedAction {
    /// Units: seconds since session start
    pub start_s: f64,

    /// Units: seconds
    pub duration_s: f64,
}

/// Holds the timed action of the current manoeuvre, if it has one.
#[derive(Debug, Default, Clone)]
pub struct TimedActionTracker {
    action: Option<TimedAction>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Summary of the tracker at a given time.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
pub enum TimedStatus {
    /// No timed action is set
    None,

    /// A timed action is set and still running
    Pending,

    /// A timed action is set and has run its course
    Elapsed,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TimedAction {
    pub fn end_s(&self) -> f64 {
        self.start_s + self.duration_s
    }

    pub fn is_elapsed(&self, now_s: f64) -> bool {
        now_s >= self.end_s()
    }
}

impl TimedActionTracker {
    /// True if a timed action is set.
    pub fn has_pending(&self) -> bool {
        self.action.is_some()
    }

    /// False if no timed action is set, otherwise whether it has elapsed.
    pub fn is_elapsed(&self, now_s: f64) -> bool {
        match self.action {
            Some(a) => a.is_elapsed(now_s),
            None => false,
        }
    }

    pub fn status(&self, now_s: f64) -> TimedStatus {
        match self.action {
            None => TimedStatus::None,
            Some(a) if a.is_elapsed(now_s) => TimedStatus::Elapsed,
            Some(_) => TimedStatus::Pending,
        }
    }

    pub fn action(&self) -> Option<TimedAction> {
        self.action
    }

    pub(crate) fn set(&mut self, start_s: f64, duration_s: f64) {
        self.action = Some(TimedAction {
            start_s,
            duration_s,
        });
    }

    pub(crate) fn clear(&mut self) {
        self.action = None;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

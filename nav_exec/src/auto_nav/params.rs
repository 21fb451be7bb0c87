//! Parameters structure for AutoNav

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::AutoNavError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for autonomous navigation.
#[derive(Debug, Clone, Deserialize)]
pub struct AutoNavParams {
    // ---- THRESHOLDS ----

    /// Smoothed distance below which an obstacle is too close.
    ///
    /// Units: centimetres
    pub min_distance_cm: u16,

    /// Number of turn attempts after which the rover reverses instead.
    pub max_turn_attempts: u32,

    /// Treat a stale distance estimate as "no obstacle" rather than using the
    /// last known value.
    pub assume_far_when_stale: bool,

    // ---- AVOIDANCE TURNS ----

    pub turn_speed: u16,

    /// Units: seconds
    pub turn_duration_s: f64,

    /// Duration of a repeated turn when the obstacle is still there.
    ///
    /// Units: seconds
    pub follow_up_turn_duration_s: f64,

    // ---- ESCALATION ----

    pub reverse_speed: u16,

    /// Units: seconds
    pub reverse_duration_s: f64,

    pub post_reverse_turn_speed: u16,

    /// Units: seconds
    pub post_reverse_turn_duration_s: f64,

    // ---- RESUMPTION ----

    /// Forward speed once an obstacle has been cleared.
    pub creep_speed: u16,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for AutoNavParams {
    fn default() -> Self {
        Self {
            min_distance_cm: 20,
            max_turn_attempts: 3,
            assume_far_when_stale: false,
            turn_speed: 255,
            turn_duration_s: 3.0,
            follow_up_turn_duration_s: 2.0,
            reverse_speed: 100,
            reverse_duration_s: 3.0,
            post_reverse_turn_speed: 255,
            post_reverse_turn_duration_s: 2.0,
            creep_speed: 100,
        }
    }
}

impl AutoNavParams {
    /// Check that every duration is positive and every speed non-zero.
    pub fn are_valid(&self) -> Result<(), AutoNavError> {
        let durations = [
            ("turn_duration_s", self.turn_duration_s),
            ("follow_up_turn_duration_s", self.follow_up_turn_duration_s),
            ("reverse_duration_s", self.reverse_duration_s),
            ("post_reverse_turn_duration_s", self.post_reverse_turn_duration_s),
        ];
        for (name, d) in durations {
            if !(d.is_finite() && d > 0.0) {
                return Err(AutoNavError::InvalidParams(format!(
                    "{} must be positive, found {}",
                    name, d
                )));
            }
        }

        let speeds = [
            ("turn_speed", self.turn_speed),
            ("reverse_speed", self.reverse_speed),
            ("post_reverse_turn_speed", self.post_reverse_turn_speed),
            ("creep_speed", self.creep_speed),
        ];
        for (name, s) in speeds {
            if s == 0 {
                return Err(AutoNavError::InvalidParams(format!(
                    "{} must be non-zero",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Highest speed used by any autonomous manoeuvre.
    pub fn max_speed_used(&self) -> u16 {
        self.turn_speed
            .max(self.reverse_speed)
            .max(self.post_reverse_turn_speed)
            .max(self.creep_speed)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

//! Sources of turn direction for obstacle avoidance

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use rand::{rngs::ThreadRng, Rng};

use crate::motor_ctrl::TurnDir;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Chooses which way to turn when either side will do.
pub trait TurnDirSource {
    fn next_dir(&mut self) -> TurnDir;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Picks left or right with equal probability.
#[derive(Debug, Clone)]
pub struct RandomTurnDir {
    rng: ThreadRng,
}

/// Replays a fixed sequence of directions, starting over once exhausted.
#[derive(Debug, Clone)]
pub struct SeqTurnDir {
    seq: Vec<TurnDir>,
    next: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for RandomTurnDir {
    fn default() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl TurnDirSource for RandomTurnDir {
    fn next_dir(&mut self) -> TurnDir {
        if self.rng.gen_bool(0.5) {
            TurnDir::Left
        } else {
            TurnDir::Right
        }
    }
}

impl SeqTurnDir {
    /// An empty sequence always gives `Left`.
    pub fn new(seq: Vec<TurnDir>) -> Self {
        Self { seq, next: 0 }
    }
}

impl TurnDirSource for SeqTurnDir {
    fn next_dir(&mut self) -> TurnDir {
        if self.seq.is_empty() {
            return TurnDir::Left;
        }

        let dir = self.seq[self.next];
        self.next = (self.next + 1) % self.seq.len();
        dir
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

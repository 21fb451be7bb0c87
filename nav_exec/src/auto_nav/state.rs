//! Implementations for the AutoNav state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::info;
use serde::Serialize;

// Internal
use super::{AutoNavError, AutoNavParams, RandomTurnDir, TurnDirSource};
use crate::motor_ctrl::{Maneuver, MnvrDemand, TimedStatus};
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Autonomous navigation module state
pub struct AutoNav {
    pub(crate) params: AutoNavParams,

    /// Number of avoidance or reorientation turns issued since forward
    /// motion was last resumed.
    turn_attempts: u32,

    turn_dir_src: Box<dyn TurnDirSource>,

    pub(crate) report: StatusReport,
}

/// Input data to autonomous navigation.
#[derive(Debug, Copy, Clone)]
pub struct NavInput {
    /// Smoothed distance to the nearest obstacle ahead.
    ///
    /// Units: centimetres
    pub distance_cm: u16,

    /// True if no raw sample has arrived within the staleness window.
    pub distance_stale: bool,

    /// Manoeuvre currently being executed by MotorCtrl.
    pub current_mnvr: Maneuver,

    /// State of the current manoeuvre's timed action.
    pub timed_status: TimedStatus,
}

/// Status report for AutoNav processing.
#[derive(Debug, Copy, Clone, Default, Serialize)]
pub struct StatusReport {
    /// The rule which produced a demand this cycle, if any.
    pub rule: Option<NavRule>,

    /// Turn attempt count after processing.
    pub turn_attempts: u32,

    /// Distance the decision was based on.
    ///
    /// Units: centimetres
    pub distance_cm: u16,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Decision rules, in priority order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
pub enum NavRule {
    /// Obstacle too close while not turning, start an avoidance turn.
    TooClose,

    /// Too many turn attempts, reverse away.
    Escalate,

    /// A turn finished with the obstacle still there, keep turning.
    ObstacleRemains,

    /// A turn finished with the way clear, creep forwards.
    ObstacleCleared,

    /// A reverse finished, turn to a new heading.
    PostReverse,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for AutoNav {
    fn default() -> Self {
        Self::with_turn_dir_source(Box::new(RandomTurnDir::default()))
    }
}

impl AutoNav {
    /// Create a new instance using the given source for turn directions.
    pub fn with_turn_dir_source(turn_dir_src: Box<dyn TurnDirSource>) -> Self {
        Self {
            params: AutoNavParams::default(),
            turn_attempts: 0,
            turn_dir_src,
            report: StatusReport::default(),
        }
    }

    pub fn turn_attempts(&self) -> u32 {
        self.turn_attempts
    }

    pub fn params(&self) -> &AutoNavParams {
        &self.params
    }

    /// Distance the rules act on, taking the staleness policy into account.
    fn effective_distance(&self, input: &NavInput) -> u16 {
        if input.distance_stale && self.params.assume_far_when_stale {
            u16::MAX
        } else {
            input.distance_cm
        }
    }

    fn decide(&mut self, input: &NavInput, distance_cm: u16) -> Option<(NavRule, MnvrDemand)> {
        let p = &self.params;
        let too_close = distance_cm < p.min_distance_cm;

        // Rule 1: immediate danger, unless a turn is already under way
        if too_close && !input.current_mnvr.is_turning() {
            self.turn_attempts += 1;
            let dir = self.turn_dir_src.next_dir();
            return Some((
                NavRule::TooClose,
                MnvrDemand::timed(Maneuver::soft_turn(dir), p.turn_speed, p.turn_duration_s),
            ));
        }

        // Rule 2: escalate to reversing
        if self.turn_attempts > p.max_turn_attempts {
            self.turn_attempts = 0;
            return Some((
                NavRule::Escalate,
                MnvrDemand::timed(Maneuver::Reverse, p.reverse_speed, p.reverse_duration_s),
            ));
        }

        // Rule 3: the timed manoeuvre has run its course
        if input.timed_status == TimedStatus::Elapsed {
            if input.current_mnvr.is_turning() {
                if too_close {
                    // Keep turning the same way, hard or soft as before
                    self.turn_attempts += 1;
                    return Some((
                        NavRule::ObstacleRemains,
                        MnvrDemand::timed(
                            input.current_mnvr,
                            p.turn_speed,
                            p.follow_up_turn_duration_s,
                        ),
                    ));
                } else {
                    self.turn_attempts = 0;
                    return Some((
                        NavRule::ObstacleCleared,
                        MnvrDemand::indefinite(Maneuver::Forward, p.creep_speed),
                    ));
                }
            }

            if input.current_mnvr == Maneuver::Reverse {
                self.turn_attempts += 1;
                let dir = self.turn_dir_src.next_dir();
                return Some((
                    NavRule::PostReverse,
                    MnvrDemand::timed(
                        Maneuver::hard_turn(dir),
                        p.post_reverse_turn_speed,
                        p.post_reverse_turn_duration_s,
                    ),
                ));
            }
        }

        // Rule 4: hold the current manoeuvre
        None
    }
}

impl State for AutoNav {
    type InitData = AutoNavParams;
    type InitError = AutoNavError;

    type InputData = NavInput;
    type OutputData = Option<MnvrDemand>;
    type StatusReport = StatusReport;
    type ProcError = AutoNavError;

    /// Initialise the AutoNav module.
    ///
    /// Expected init data is the validated parameters.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        init_data.are_valid()?;

        self.params = init_data;
        self.reset();

        Ok(())
    }

    /// Forget previous turn attempts, done on entering autonomous mode.
    fn reset(&mut self) {
        self.turn_attempts = 0;
        self.report = StatusReport::default();
    }

    /// Perform one cycle of autonomous navigation.
    ///
    /// Returns the demand to execute, or `None` to hold the current
    /// manoeuvre.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let distance_cm = self.effective_distance(input_data);

        let decision = self.decide(input_data, distance_cm);

        if let Some((rule, dem)) = decision {
            info!(
                "AutoNav {:?} at {} cm: {:?} (turn attempts: {})",
                rule, distance_cm, dem.mnvr, self.turn_attempts
            );
        }

        self.report = StatusReport {
            rule: decision.map(|(r, _)| r),
            turn_attempts: self.turn_attempts,
            distance_cm,
        };

        Ok((decision.map(|(_, d)| d), self.report))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::auto_nav::SeqTurnDir;
    use crate::motor_ctrl::TurnDir;

    fn auto_nav(min_distance_cm: u16, dirs: Vec<TurnDir>) -> AutoNav {
        let mut nav = AutoNav::with_turn_dir_source(Box::new(SeqTurnDir::new(dirs)));
        nav.init(AutoNavParams {
            min_distance_cm,
            ..Default::default()
        })
        .unwrap();
        nav
    }

    fn input(distance_cm: u16, current_mnvr: Maneuver, timed_status: TimedStatus) -> NavInput {
        NavInput {
            distance_cm,
            distance_stale: false,
            current_mnvr,
            timed_status,
        }
    }

    /// Drive the counter above the limit through repeated blocked turns,
    /// leaving a follow-up turn in progress.
    fn exhaust_turns(nav: &mut AutoNav) -> Maneuver {
        let (dem, _) = nav
            .proc(&input(5, Maneuver::Forward, TimedStatus::None))
            .unwrap();
        let mnvr = dem.unwrap().mnvr;

        while nav.turn_attempts() <= nav.params().max_turn_attempts {
            let (dem, rpt) = nav.proc(&input(5, mnvr, TimedStatus::Elapsed)).unwrap();
            assert_eq!(rpt.rule, Some(NavRule::ObstacleRemains));
            assert_eq!(dem.unwrap().mnvr, mnvr);
        }

        mnvr
    }

    #[test]
    fn test_too_close_scenario() {
        let mut nav = auto_nav(40, vec![TurnDir::Right]);

        for d in [200, 200, 200] {
            let (dem, rpt) = nav
                .proc(&input(d, Maneuver::Forward, TimedStatus::None))
                .unwrap();
            assert!(dem.is_none());
            assert!(rpt.rule.is_none());
        }

        let (dem, rpt) = nav
            .proc(&input(35, Maneuver::Forward, TimedStatus::None))
            .unwrap();
        let dem = dem.unwrap();

        assert_eq!(rpt.rule, Some(NavRule::TooClose));
        assert_eq!(dem.mnvr, Maneuver::SoftRight);
        assert_eq!(dem.speed, 255);
        assert_eq!(dem.duration_s, Some(3.0));
        assert_eq!(nav.turn_attempts(), 1);
    }

    #[test]
    fn test_too_close_beats_timed_status() {
        for status in [TimedStatus::None, TimedStatus::Pending, TimedStatus::Elapsed] {
            let mut nav = auto_nav(40, vec![TurnDir::Left]);
            let (dem, rpt) = nav.proc(&input(10, Maneuver::Forward, status)).unwrap();

            assert_eq!(rpt.rule, Some(NavRule::TooClose));
            assert_eq!(dem.unwrap().mnvr, Maneuver::SoftLeft);
        }
    }

    #[test]
    fn test_attempts_accumulate() {
        let mut nav = auto_nav(40, vec![TurnDir::Left]);

        // A reverse interrupted by a close obstacle still counts
        nav.proc(&input(10, Maneuver::Forward, TimedStatus::None))
            .unwrap();
        nav.proc(&input(10, Maneuver::Reverse, TimedStatus::Pending))
            .unwrap();
        assert_eq!(nav.turn_attempts(), 2);
    }

    #[test]
    fn test_no_retrigger_while_turning() {
        let mut nav = auto_nav(40, vec![TurnDir::Left]);

        for mnvr in [
            Maneuver::SoftLeft,
            Maneuver::SoftRight,
            Maneuver::TurningLeft,
            Maneuver::TurningRight,
        ] {
            let (dem, _) = nav.proc(&input(10, mnvr, TimedStatus::Pending)).unwrap();
            assert!(dem.is_none());
        }
        assert_eq!(nav.turn_attempts(), 0);
    }

    #[test]
    fn test_escalation() {
        for distance_cm in [5, 39, 40, 500] {
            let mut nav = auto_nav(40, vec![TurnDir::Left]);
            let mnvr = exhaust_turns(&mut nav);
            assert_eq!(nav.turn_attempts(), 4);

            let (dem, rpt) = nav
                .proc(&input(distance_cm, mnvr, TimedStatus::Pending))
                .unwrap();
            let dem = dem.unwrap();

            assert_eq!(rpt.rule, Some(NavRule::Escalate));
            assert_eq!(dem.mnvr, Maneuver::Reverse);
            assert_eq!(dem.speed, 100);
            assert_eq!(dem.duration_s, Some(3.0));
            assert_eq!(nav.turn_attempts(), 0);
        }
    }

    #[test]
    fn test_turn_follow_up() {
        let mut nav = auto_nav(40, vec![TurnDir::Left]);
        nav.proc(&input(10, Maneuver::Forward, TimedStatus::None))
            .unwrap();

        // Still blocked, turn the same way for the shorter duration
        let (dem, _) = nav
            .proc(&input(10, Maneuver::SoftLeft, TimedStatus::Elapsed))
            .unwrap();
        assert_eq!(
            dem,
            Some(MnvrDemand::timed(Maneuver::SoftLeft, 255, 2.0))
        );
        assert_eq!(nav.turn_attempts(), 2);

        // Clear, creep forwards
        let (dem, rpt) = nav
            .proc(&input(80, Maneuver::SoftLeft, TimedStatus::Elapsed))
            .unwrap();
        assert_eq!(rpt.rule, Some(NavRule::ObstacleCleared));
        assert_eq!(dem, Some(MnvrDemand::indefinite(Maneuver::Forward, 100)));
        assert_eq!(nav.turn_attempts(), 0);
    }

    #[test]
    fn test_post_reverse_turn() {
        let mut nav = auto_nav(40, vec![TurnDir::Right]);

        let (dem, rpt) = nav
            .proc(&input(100, Maneuver::Reverse, TimedStatus::Elapsed))
            .unwrap();

        assert_eq!(rpt.rule, Some(NavRule::PostReverse));
        assert_eq!(
            dem,
            Some(MnvrDemand::timed(Maneuver::TurningRight, 255, 2.0))
        );
        assert_eq!(nav.turn_attempts(), 1);
    }

    #[test]
    fn test_hold() {
        let mut nav = auto_nav(40, vec![TurnDir::Left]);

        let cases = [
            input(100, Maneuver::Reverse, TimedStatus::Pending),
            input(100, Maneuver::SoftLeft, TimedStatus::Pending),
            input(100, Maneuver::Forward, TimedStatus::None),
            input(100, Maneuver::Stopped, TimedStatus::None),
        ];
        for c in cases.iter() {
            let (dem, rpt) = nav.proc(c).unwrap();
            assert!(dem.is_none());
            assert!(rpt.rule.is_none());
        }
    }

    #[test]
    fn test_stale_policy() {
        let mut stale = input(10, Maneuver::Forward, TimedStatus::None);
        stale.distance_stale = true;

        // Default: the stale estimate is used as is
        let mut nav = auto_nav(40, vec![TurnDir::Left]);
        let (dem, _) = nav.proc(&stale).unwrap();
        assert!(dem.is_some());

        // Configured to assume the way is clear
        let mut nav = AutoNav::with_turn_dir_source(Box::new(SeqTurnDir::new(vec![])));
        nav.init(AutoNavParams {
            min_distance_cm: 40,
            assume_far_when_stale: true,
            ..Default::default()
        })
        .unwrap();
        let (dem, rpt) = nav.proc(&stale).unwrap();
        assert!(dem.is_none());
        assert_eq!(rpt.distance_cm, u16::MAX);
    }

    #[test]
    fn test_init_rejects_bad_params() {
        let mut nav = AutoNav::default();
        let res = nav.init(AutoNavParams {
            reverse_duration_s: -1.0,
            ..Default::default()
        });
        assert!(matches!(res, Err(AutoNavError::InvalidParams(_))));
    }
}

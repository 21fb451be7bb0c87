//! # Control Cycle Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use nav_lib::{
    auto_nav::{AutoNav, SeqTurnDir},
    dist_filter::{DistanceFilter, DistanceMonitor},
    drivers::sim::SimMotorDriver,
    mode_arb::{ModeArbParams, ModeArbiter},
    motor_ctrl::{MotorCtrl, MotorCtrlParams, TurnDir},
    robot_state::RobotState,
};
use robot_if::{
    eqpt::DistanceSample,
    input::{Button, InputSnapshot},
};

fn control_cycle_benchmark(c: &mut Criterion) {
    // ---- Build the robot in autonomous mode ----

    let mut robot = RobotState::new(
        MotorCtrl::new(SimMotorDriver::default(), MotorCtrlParams::default()),
        AutoNav::with_turn_dir_source(Box::new(SeqTurnDir::new(vec![
            TurnDir::Left,
            TurnDir::Right,
        ]))),
        ModeArbiter::new(ModeArbParams::default()),
        DistanceFilter::new(200),
        DistanceMonitor::new(1.0, 0.0),
        5,
    );

    let mut toggle = InputSnapshot::default();
    toggle.set_button(Button::Select, true);
    robot.step(&toggle, vec![], 0.0).unwrap();

    let idle = InputSnapshot::default();

    // Distances sweeping in and out of the avoidance threshold
    let distances: Vec<u16> = (0..200).map(|i| ((i * 7) % 120) as u16).collect();

    let mut now_s = 0.0;
    let mut i = 0;

    c.bench_function("control cycle", |b| {
        b.iter(|| {
            now_s += 0.2;
            i = (i + 1) % distances.len();

            let rpt = robot
                .step(
                    black_box(&idle),
                    Some(DistanceSample(distances[i])),
                    black_box(now_s),
                )
                .unwrap();

            black_box(rpt)
        })
    });
}

criterion_group!(benches, control_cycle_benchmark);
criterion_main!(benches);

use std::time::Duration;

use iso_tactics_core::{Ground, Position};
use iso_tactics_system_motion::{Leg, Motion, Step};
use proptest::prelude::*;

/// Terrain that rises one unit per column and has no ground west of `x = -0.5`.
struct Staircase;

impl Ground for Staircase {
    fn ground_height(&self, x: f32, _y: f32) -> Option<f32> {
        let column = x.round();
        (column >= 0.0).then_some(column)
    }
}

#[test]
fn three_four_five_walk_takes_three_hundred_ticks() {
    let mut motion = Motion::new(Position::ORIGIN, 1.0, 60);
    let ground = Staircase;

    let steps = motion.move_to(Position::new(3.0, 4.0, 0.0));
    assert_eq!(steps, 300);

    for tick in 1..=steps {
        let outcome = motion.step(Some(&ground));
        if tick < steps {
            assert_eq!(outcome, Step::Moved, "tick {tick} ended the leg early");
        }
    }

    assert!(!motion.moving());
    assert_eq!(motion.position(), Position::new(3.0, 4.0, 3.0));
    assert_eq!(motion.destination(), motion.position());
}

#[test]
fn grounded_elevation_tracks_each_column() {
    let mut motion = Motion::new(Position::ORIGIN, 1.0, 4);
    let ground = Staircase;
    let _ = motion.move_to(Position::new(2.0, 0.0, 0.0));

    let mut elevations = Vec::new();
    while motion.moving() {
        let _ = motion.step(Some(&ground));
        elevations.push(motion.position().z);
    }

    assert_eq!(elevations, vec![0.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
}

#[test]
fn missing_ground_never_drops_the_actor() {
    let mut motion = Motion::new(Position::new(0.0, 0.0, 2.0), 1.0, 2);
    let ground = Staircase;
    let _ = motion.move_to(Position::new(-2.0, 0.0, 2.0));

    while motion.moving() {
        let _ = motion.step(Some(&ground));
        assert_eq!(motion.position().z, 2.0);
    }

    assert_eq!(motion.position(), Position::new(-2.0, 0.0, 2.0));
}

#[test]
fn real_time_slicing_does_not_change_arrival_tick() {
    let destination = Position::new(2.0, 1.0, 0.0);
    let mut coarse = Motion::new(Position::ORIGIN, 1.5, 30);
    let mut fine = Motion::new(Position::ORIGIN, 1.5, 30);
    let _ = coarse.move_to(destination);
    let _ = fine.move_to(destination);

    let coarse_report = coarse.advance(Duration::from_secs(1), None);
    let mut fine_steps = 0;
    for _ in 0..100 {
        fine_steps += fine.advance(Duration::from_millis(10), None).steps;
    }

    assert_eq!(coarse_report.steps, fine_steps);
    assert_eq!(coarse.position(), fine.position());
}

#[test]
fn path_report_lists_every_leg() {
    let mut motion = Motion::new(Position::ORIGIN, 1.0, 10);
    let waypoints = [
        Position::new(1.0, 0.0, 0.0),
        Position::new(1.0, 1.0, 0.0),
        Position::new(0.0, 1.0, 0.0),
    ];
    let _ = motion.follow_path(waypoints);

    let report = motion.advance(Duration::from_secs(5), None);

    assert_eq!(report.steps, 30);
    assert_eq!(
        report.legs,
        vec![
            Leg::Arrived(waypoints[0]),
            Leg::Departed {
                destination: waypoints[1],
                steps: 10
            },
            Leg::Arrived(waypoints[1]),
            Leg::Departed {
                destination: waypoints[2],
                steps: 10
            },
            Leg::Arrived(waypoints[2]),
        ]
    );
}

proptest! {
    #[test]
    fn arrival_is_exact_after_computed_steps(
        start in (-20.0f32..20.0, -20.0f32..20.0, -5.0f32..5.0),
        end in (-20.0f32..20.0, -20.0f32..20.0, -5.0f32..5.0),
        speed in 0.5f32..8.0,
        tick_rate in 1u32..120,
    ) {
        let destination = Position::new(end.0, end.1, end.2);
        let mut motion = Motion::new(Position::new(start.0, start.1, start.2), speed, tick_rate);
        let steps = motion.move_to(destination);
        prop_assume!(steps > 0);

        for _ in 0..steps {
            let _ = motion.step(None);
        }

        prop_assert!(!motion.moving());
        prop_assert_eq!(motion.position(), destination);
    }

    #[test]
    fn stopping_never_moves_the_actor(
        end in (-20.0f32..20.0, -20.0f32..20.0),
        ticks in 0usize..50,
    ) {
        let mut motion = Motion::new(Position::ORIGIN, 1.0, 20);
        let _ = motion.move_to(Position::new(end.0, end.1, 0.0));
        for _ in 0..ticks {
            let _ = motion.step(None);
        }
        let before = motion.position();

        motion.stop_moving();

        prop_assert!(!motion.moving());
        prop_assert_eq!(motion.position(), before);
    }
}

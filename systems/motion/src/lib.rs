#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Continuous, frame-rate independent motion for mobile actors.
//!
//! A [`Motion`] converts a destination and a speed into a whole number of
//! simulation ticks and then walks the actor toward the destination one tick
//! at a time. Every tick moves the actor by `1 / remaining` of the remaining
//! delta, so the final tick lands exactly on the destination. Grounded
//! actors have their elevation re-sampled from the terrain after every tick.

use std::{collections::VecDeque, time::Duration};

use iso_tactics_core::{Ground, Position, TickClock};

/// Motion state of a single mobile actor.
#[derive(Clone, Debug, PartialEq)]
pub struct Motion {
    position: Position,
    destination: Position,
    remaining_steps: u32,
    speed: f32,
    clock: TickClock,
    path: VecDeque<Position>,
}

impl Motion {
    /// Slowest accepted speed in tiles per second.
    pub const MIN_SPEED: f32 = 0.01;

    /// Creates an idle motion anchored at `position`.
    ///
    /// Speeds below [`Self::MIN_SPEED`] (or non-finite speeds) are clamped and a
    /// zero tick rate is clamped to one tick per second.
    #[must_use]
    pub fn new(position: Position, speed: f32, tick_rate: u32) -> Self {
        Self {
            position,
            destination: position,
            remaining_steps: 0,
            speed: clamp_speed(speed),
            clock: TickClock::new(tick_rate),
            path: VecDeque::new(),
        }
    }

    /// Current logical position.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Destination of the current (or most recent) leg.
    #[must_use]
    pub const fn destination(&self) -> Position {
        self.destination
    }

    /// Number of ticks left before the current leg completes.
    #[must_use]
    pub const fn remaining_steps(&self) -> u32 {
        self.remaining_steps
    }

    /// Movement speed in tiles per simulated second.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Simulation ticks per second driving this motion.
    #[must_use]
    pub const fn tick_rate(&self) -> u32 {
        self.clock.ticks_per_second()
    }

    /// Fraction of the next tick already accumulated by the motion clock.
    #[must_use]
    pub fn tick_progress(&self) -> f32 {
        self.clock.pending_fraction()
    }

    /// Waypoints still queued after the current leg.
    pub fn queued_waypoints(&self) -> impl Iterator<Item = &Position> {
        self.path.iter()
    }

    /// Reports whether the actor is in the middle of a leg.
    #[must_use]
    pub const fn moving(&self) -> bool {
        self.remaining_steps > 0
    }

    /// Changes the movement speed used by subsequent legs.
    ///
    /// Returns `false` and keeps the previous speed when `speed` is not a
    /// finite value of at least [`Self::MIN_SPEED`].
    pub fn set_speed(&mut self, speed: f32) -> bool {
        if !speed.is_finite() || speed < Self::MIN_SPEED {
            return false;
        }
        self.speed = speed;
        true
    }

    /// Shifts the actor vertically without affecting its motion.
    ///
    /// Used when the ground beneath a resting actor changes thickness.
    pub fn displace(&mut self, rise: f32) {
        self.position.z += rise;
        self.destination.z += rise;
    }

    /// Starts a leg toward `destination` at the configured speed.
    ///
    /// Any queued waypoints are discarded. The step count is
    /// `ceil(planar_distance * tick_rate / speed)`; a count of zero leaves the
    /// actor idle.
    pub fn move_to(&mut self, destination: Position) -> u32 {
        self.path.clear();
        self.begin_leg(destination)
    }

    /// Starts a leg toward `destination` lasting a fixed duration.
    ///
    /// The step count is `floor(duration * tick_rate / speed)`. Returns `None`
    /// and leaves the motion untouched when `duration` is zero.
    pub fn move_to_within(&mut self, destination: Position, duration: Duration) -> Option<u32> {
        if duration.is_zero() {
            return None;
        }

        let steps = duration.as_secs_f64() * f64::from(self.tick_rate()) / f64::from(self.speed);
        self.path.clear();
        self.destination = destination;
        self.remaining_steps = saturating_steps(steps.floor());
        Some(self.remaining_steps)
    }

    /// Replaces the queued path and starts walking toward its first waypoint.
    ///
    /// Waypoints that require no steps are skipped. Returns the destination
    /// and step count of the leg that was started, or `None` when every
    /// waypoint was already reached.
    pub fn follow_path<I>(&mut self, waypoints: I) -> Option<(Position, u32)>
    where
        I: IntoIterator<Item = Position>,
    {
        self.path = waypoints.into_iter().collect();
        self.remaining_steps = 0;
        self.next_leg()
    }

    /// Cancels the current leg and every queued waypoint.
    ///
    /// The actor stays exactly where it is; it is not snapped to the
    /// destination. Any partially accumulated tick is dropped.
    pub fn stop_moving(&mut self) {
        self.remaining_steps = 0;
        self.path.clear();
        self.clock.reset();
    }

    /// Advances the motion by a single simulation tick.
    pub fn step(&mut self, ground: Option<&dyn Ground>) -> Step {
        if self.remaining_steps == 0 {
            return Step::Idle;
        }

        if self.remaining_steps == 1 {
            self.position = self.destination;
        } else {
            let fraction = 1.0 / self.remaining_steps as f32;
            self.position.x += (self.destination.x - self.position.x) * fraction;
            self.position.y += (self.destination.y - self.position.y) * fraction;
            self.position.z += (self.destination.z - self.position.z) * fraction;
        }

        if let Some(height) =
            ground.and_then(|ground| ground.ground_height(self.position.x, self.position.y))
        {
            if height >= 0.0 {
                self.position.z = height;
            }
        }

        self.remaining_steps -= 1;
        if self.remaining_steps > 0 {
            return Step::Moved;
        }

        self.destination = self.position;
        Step::Arrived {
            position: self.position,
            next_leg: self.next_leg(),
        }
    }

    /// Feeds real elapsed time into the motion clock and runs every tick it
    /// released.
    ///
    /// Ticks released while idle are consumed without effect so that an idle
    /// actor does not bank time toward its next leg.
    pub fn advance(&mut self, dt: Duration, ground: Option<&dyn Ground>) -> MotionReport {
        let ticks = self.clock.advance(dt);
        let mut report = MotionReport::default();

        for _ in 0..ticks {
            match self.step(ground) {
                Step::Idle => break,
                Step::Moved => report.steps += 1,
                Step::Arrived { position, next_leg } => {
                    report.steps += 1;
                    report.legs.push(Leg::Arrived(position));
                    if let Some((destination, steps)) = next_leg {
                        report.legs.push(Leg::Departed { destination, steps });
                    }
                }
            }
        }

        report
    }

    fn begin_leg(&mut self, destination: Position) -> u32 {
        let distance = self.position.planar_distance(destination);
        let steps = f64::from(distance) * f64::from(self.tick_rate()) / f64::from(self.speed);
        self.destination = destination;
        self.remaining_steps = saturating_steps(steps.ceil());
        self.remaining_steps
    }

    fn next_leg(&mut self) -> Option<(Position, u32)> {
        while let Some(waypoint) = self.path.pop_front() {
            let steps = self.begin_leg(waypoint);
            if steps > 0 {
                return Some((waypoint, steps));
            }
        }
        None
    }
}

/// Outcome of a single [`Motion::step`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Step {
    /// The actor was not moving.
    Idle,
    /// The actor moved and the leg continues.
    Moved,
    /// The actor completed a leg.
    Arrived {
        /// Exact position reached.
        position: Position,
        /// Destination and step count of the next queued leg, if one started.
        next_leg: Option<(Position, u32)>,
    },
}

/// Leg transitions observed while advancing a motion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Leg {
    /// A leg completed at the provided position.
    Arrived(Position),
    /// A queued leg started.
    Departed {
        /// Destination of the new leg.
        destination: Position,
        /// Number of ticks the new leg takes.
        steps: u32,
    },
}

/// Summary of the ticks executed by [`Motion::advance`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MotionReport {
    /// Number of ticks that moved the actor.
    pub steps: u32,
    /// Leg transitions in the order they happened.
    pub legs: Vec<Leg>,
}

impl MotionReport {
    /// Reports whether the actor changed position.
    #[must_use]
    pub const fn moved(&self) -> bool {
        self.steps > 0
    }
}

fn clamp_speed(speed: f32) -> f32 {
    if speed.is_finite() && speed >= Motion::MIN_SPEED {
        speed
    } else {
        Motion::MIN_SPEED
    }
}

fn saturating_steps(steps: f64) -> u32 {
    if steps.is_nan() || steps <= 0.0 {
        0
    } else if steps >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        steps as u32
    }
}

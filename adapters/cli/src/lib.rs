#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless driver for Iso Tactics scenarios.

pub mod config;
pub mod headless;
pub mod scenario;

use anyhow::Result;
use glam::Vec2;
use iso_tactics_core::{Command, Event, Position};
use iso_tactics_rendering::{Color, FrameControl, Presentation, RenderingBackend};
use iso_tactics_world::{apply, query};

pub use config::{ConfigError, ScenarioConfig};
pub use headless::HeadlessBackend;
pub use scenario::Scenario;

/// Outcome of a headless run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    /// Frames simulated.
    pub frames: u64,
    /// Events emitted by the world during the run.
    pub events: usize,
    /// Legs completed by actors during the run.
    pub arrivals: Vec<Position>,
}

/// Simulates `frames` frames of `scenario` through the headless backend.
pub fn run_headless(
    scenario: &mut Scenario,
    config: &ScenarioConfig,
    frames: u64,
) -> Result<RunSummary> {
    let projector = config.projection.projector();
    let presentation = Presentation::new(
        "iso-tactics",
        Color::from_rgb_u8(24, 24, 32),
        Vec2::new(config.map.length as f32 * projector.sx() * 0.5, 0.0),
    )
    .with_frame_rate(config.simulation.frame_rate)?;

    let mut summary = RunSummary::default();
    let mut events = Vec::new();
    HeadlessBackend::new(frames).run(presentation, &mut scenario.world, |dt, world| {
        events.clear();
        apply(world, Command::Tick { dt }, &mut events);
        summary.frames += 1;
        summary.events += events.len();
        summary
            .arrivals
            .extend(events.iter().filter_map(|event| match event {
                Event::ActorArrived { position, .. } => Some(*position),
                _ => None,
            }));
        FrameControl::Continue
    })?;

    tracing::info!(
        frame = query::frame(&scenario.world),
        events = summary.events,
        arrivals = summary.arrivals.len(),
        "run complete"
    );
    Ok(summary)
}

//! Rendering backend that draws into memory instead of a window.

use std::time::Duration;

use anyhow::{ensure, Result};
use iso_tactics_rendering::{
    draw_frame, FrameControl, FrameRecorder, Presentation, RenderingBackend,
};
use iso_tactics_world::{query, World};

/// Backend presenting a fixed number of frames to a [`FrameRecorder`].
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    frame_limit: u64,
}

impl HeadlessBackend {
    /// Creates a backend that stops after `frame_limit` frames.
    #[must_use]
    pub const fn new(frame_limit: u64) -> Self {
        Self { frame_limit }
    }
}

impl RenderingBackend for HeadlessBackend {
    fn run<F>(self, presentation: Presentation, world: &mut World, mut update_world: F) -> Result<()>
    where
        F: FnMut(Duration, &mut World) -> FrameControl,
    {
        let dt = presentation.frame_duration();
        let mut recorder = FrameRecorder::new();
        let mut presented = 0;

        while presented < self.frame_limit {
            let control = update_world(dt, world);

            recorder.clear();
            let drawn = draw_frame(world, presentation.origin, &presentation.palette, &mut recorder);
            let expected = query::drawable_count(world);
            ensure!(
                drawn == expected,
                "frame {} drew {drawn} of {expected} objects",
                query::frame(world)
            );
            presented += 1;
            tracing::trace!(frame = query::frame(world), drawn, "frame presented");

            if control == FrameControl::Exit {
                break;
            }
        }

        tracing::info!(
            title = %presentation.window_title,
            frames = presented,
            "headless presentation finished"
        );
        Ok(())
    }
}

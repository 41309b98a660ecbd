#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Iso Tactics adapters.
//!
//! Rendering is a read-only traversal of the world: [`draw_frame`] resolves
//! the painter's order and submits one [`DrawCommand`] per drawable, in that
//! order, to a [`RenderTarget`]. Commands are expressed relative to the
//! object's projected anchor; the accompanying transform places them on
//! screen.

use anyhow::Result as AnyResult;
use glam::{Affine2, Vec2};
use iso_tactics_core::{MarkerKind, TileShape};
use iso_tactics_world::{
    query::{self, Appearance},
    refresh_draw_order, SceneKey, World,
};
use std::{error::Error, fmt, time::Duration};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }

    /// Returns the same color with a different alpha channel.
    #[must_use]
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            ..self
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Colors assigned to each kind of drawable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    /// Fill of an unoccupied tile.
    pub tile: Color,
    /// Fill of a tile an actor rests on.
    pub occupied_tile: Color,
    /// Fill of an actor.
    pub actor: Color,
    /// Overlay for reach markers.
    pub reach: Color,
    /// Overlay for path markers.
    pub path: Color,
    /// Overlay for target markers.
    pub target: Color,
}

impl Palette {
    /// Overlay color for a marker kind.
    #[must_use]
    pub const fn marker(&self, kind: MarkerKind) -> Color {
        match kind {
            MarkerKind::Reach => self.reach,
            MarkerKind::Path => self.path,
            MarkerKind::Target => self.target,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            tile: Color::from_rgb_u8(110, 140, 90),
            occupied_tile: Color::from_rgb_u8(140, 150, 100),
            actor: Color::from_rgb_u8(200, 80, 60),
            reach: Color::from_rgb_u8(80, 140, 220).with_alpha(0.5),
            path: Color::from_rgb_u8(240, 210, 90).with_alpha(0.6),
            target: Color::from_rgb_u8(220, 60, 60).with_alpha(0.6),
        }
    }
}

/// Geometry a target should draw for a command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawShape {
    /// A tile block of the given thickness.
    Block {
        /// Thickness of the block in elevation units.
        height: f32,
        /// Shape of the block's upper surface.
        shape: TileShape,
    },
    /// An upright actor figure.
    Figure,
    /// A flat overlay lying on a surface.
    Overlay(MarkerKind),
}

/// Single draw call emitted by the frame traversal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCommand {
    /// Scene object the command draws.
    pub key: SceneKey,
    /// Geometry to draw.
    pub shape: DrawShape,
    /// Upper-left corner of the object's screen rectangle, relative to its
    /// projected anchor.
    pub min: Vec2,
    /// Lower-right corner of the object's screen rectangle, relative to its
    /// projected anchor.
    pub max: Vec2,
    /// Fill color.
    pub color: Color,
}

impl DrawCommand {
    /// Screen rectangle the command covers once `transform` is applied.
    #[must_use]
    pub fn screen_rect(&self, transform: Affine2) -> (Vec2, Vec2) {
        let a = transform.transform_point2(self.min);
        let b = transform.transform_point2(self.max);
        (a.min(b), a.max(b))
    }
}

/// Sink receiving draw commands in painter's order.
pub trait RenderTarget {
    /// Draws a single command placed on screen by `transform`.
    fn submit(&mut self, command: DrawCommand, transform: Affine2);
}

/// Draws every registered object of `world` back to front.
///
/// `origin` is the screen position of the logical origin. Returns the number
/// of commands submitted.
pub fn draw_frame<T>(world: &mut World, origin: Vec2, palette: &Palette, target: &mut T) -> usize
where
    T: RenderTarget + ?Sized,
{
    let order = refresh_draw_order(world).to_vec();
    let mut submitted = 0;

    for key in order {
        let Some(visual) = query::visual(world, key) else {
            continue;
        };
        let anchor = Vec2::new(visual.screen.x, visual.screen.y);
        let (shape, color) = match visual.appearance {
            Appearance::Tile {
                height,
                shape,
                occupied,
            } => {
                let color = if occupied {
                    palette.occupied_tile
                } else {
                    palette.tile
                };
                (DrawShape::Block { height, shape }, color)
            }
            Appearance::Actor { moving } => {
                let color = if moving {
                    palette.actor.lighten(0.2)
                } else {
                    palette.actor
                };
                (DrawShape::Figure, color)
            }
            Appearance::Marker(kind) => (DrawShape::Overlay(kind), palette.marker(kind)),
        };
        let command = DrawCommand {
            key,
            shape,
            min: Vec2::new(visual.bounds.min().x, visual.bounds.min().y) - anchor,
            max: Vec2::new(visual.bounds.max().x, visual.bounds.max().y) - anchor,
            color,
        };

        target.submit(command, Affine2::from_translation(origin + anchor));
        submitted += 1;
    }

    submitted
}

/// Render target that keeps every submitted command for inspection.
#[derive(Clone, Debug, Default)]
pub struct FrameRecorder {
    commands: Vec<(DrawCommand, Affine2)>,
}

impl FrameRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded since the last [`Self::clear`], in submission order.
    #[must_use]
    pub fn commands(&self) -> &[(DrawCommand, Affine2)] {
        &self.commands
    }

    /// Scene keys in submission order.
    pub fn keys(&self) -> impl Iterator<Item = SceneKey> + '_ {
        self.commands.iter().map(|(command, _)| command.key)
    }

    /// Forgets every recorded command.
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl RenderTarget for FrameRecorder {
    fn submit(&mut self, command: DrawCommand, transform: Affine2) {
        self.commands.push((command, transform));
    }
}

/// Flow control returned by per-frame update callbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameControl {
    /// Keep presenting frames.
    Continue,
    /// Stop after the current frame.
    Exit,
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window, if any.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Screen position of the logical origin.
    pub origin: Vec2,
    /// Colors used for each drawable.
    pub palette: Palette,
    frame_rate: u32,
}

impl Presentation {
    /// Frame rate used when none is configured.
    pub const DEFAULT_FRAME_RATE: u32 = 60;

    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, origin: Vec2) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            origin,
            palette: Palette::default(),
            frame_rate: Self::DEFAULT_FRAME_RATE,
        }
    }

    /// Sets the number of frames presented per simulated second.
    ///
    /// Returns an error when `frame_rate` is zero.
    pub fn with_frame_rate(mut self, frame_rate: u32) -> Result<Self, RenderingError> {
        if frame_rate == 0 {
            return Err(RenderingError::InvalidFrameRate { frame_rate });
        }
        self.frame_rate = frame_rate;
        Ok(self)
    }

    /// Replaces the palette.
    #[must_use]
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Frames presented per simulated second.
    #[must_use]
    pub const fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    /// Simulated time covered by a single frame.
    #[must_use]
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }
}

/// Rendering backend capable of presenting Iso Tactics worlds.
pub trait RenderingBackend {
    /// Runs the backend until the update callback requests an exit.
    ///
    /// Each frame the backend hands the frame delta to `update_world`, which
    /// advances the simulation, and then draws the world with
    /// [`draw_frame`].
    fn run<F>(self, presentation: Presentation, world: &mut World, update_world: F) -> AnyResult<()>
    where
        F: FnMut(Duration, &mut World) -> FrameControl;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq, Eq)]
pub enum RenderingError {
    /// Frame rate must be positive to give frames a finite duration.
    InvalidFrameRate {
        /// Provided frame rate that failed validation.
        frame_rate: u32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFrameRate { frame_rate } => {
                write!(f, "frame_rate must be positive (received {frame_rate})")
            }
        }
    }
}

impl Error for RenderingError {}

#[cfg(test)]
mod tests {
    use iso_tactics_core::{Command, Event, GridCoord, MarkerKind, TileSpec};
    use iso_tactics_world::apply;

    use super::*;

    fn world_with_actor() -> World {
        let mut world = World::new(2, 1);
        let mut events = Vec::new();
        for command in [
            Command::PlaceTile {
                cell: GridCoord::new(0, 0),
                tile: TileSpec::flat(1.0),
            },
            Command::PlaceTile {
                cell: GridCoord::new(1, 0),
                tile: TileSpec::flat(1.0),
            },
            Command::SpawnActor {
                cell: GridCoord::new(1, 0),
                speed: 1.0,
                tick_rate: 30,
                jump: 1.0,
                grounded: true,
            },
        ] {
            apply(&mut world, command, &mut events);
        }
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::ActorSpawned { .. })));
        world
    }

    #[test]
    fn frames_follow_the_resolved_draw_order() {
        let mut world = world_with_actor();
        let mut recorder = FrameRecorder::new();

        let submitted = draw_frame(&mut world, Vec2::ZERO, &Palette::default(), &mut recorder);

        assert_eq!(submitted, 3);
        let keys: Vec<_> = recorder.keys().collect();
        assert_eq!(keys, query::draw_order(&world).to_vec());
        assert!(matches!(keys.last(), Some(SceneKey::Actor(_))));
    }

    #[test]
    fn commands_are_translated_to_their_projected_anchor() {
        let mut world = world_with_actor();
        let mut recorder = FrameRecorder::new();
        let origin = Vec2::new(100.0, 50.0);

        let _ = draw_frame(&mut world, origin, &Palette::default(), &mut recorder);

        for (command, transform) in recorder.commands() {
            let Some(visual) = query::visual(&world, command.key) else {
                panic!("recorded key is registered");
            };
            let anchor = transform.transform_point2(Vec2::ZERO);
            assert_eq!(anchor, origin + Vec2::new(visual.screen.x, visual.screen.y));

            let (min, max) = command.screen_rect(*transform);
            let expected_min = origin + Vec2::new(visual.bounds.min().x, visual.bounds.min().y);
            let expected_max = origin + Vec2::new(visual.bounds.max().x, visual.bounds.max().y);
            assert!(min.abs_diff_eq(expected_min, 1e-3));
            assert!(max.abs_diff_eq(expected_max, 1e-3));
        }
    }

    #[test]
    fn occupied_tiles_and_markers_use_their_palette_entries() {
        let mut world = world_with_actor();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MarkArea {
                cells: vec![GridCoord::new(0, 0)],
                kind: MarkerKind::Path,
            },
            &mut events,
        );
        let palette = Palette::default();
        let mut recorder = FrameRecorder::new();

        let _ = draw_frame(&mut world, Vec2::ZERO, &palette, &mut recorder);

        let occupied_tile = query::tile_at(&world, GridCoord::new(1, 0))
            .map(|tile| SceneKey::Tile(tile.id()));
        for (command, _) in recorder.commands() {
            match command.shape {
                DrawShape::Block { .. } if Some(command.key) == occupied_tile => {
                    assert_eq!(command.color, palette.occupied_tile);
                }
                DrawShape::Block { .. } => assert_eq!(command.color, palette.tile),
                DrawShape::Figure => assert_eq!(command.color, palette.actor),
                DrawShape::Overlay(kind) => {
                    assert_eq!(kind, MarkerKind::Path);
                    assert_eq!(command.color, palette.path);
                }
            }
        }
        assert_eq!(recorder.commands().len(), 4);
    }

    #[test]
    fn recorder_can_be_reused_between_frames() {
        let mut world = world_with_actor();
        let mut recorder = FrameRecorder::new();

        let _ = draw_frame(&mut world, Vec2::ZERO, &Palette::default(), &mut recorder);
        recorder.clear();
        let _ = draw_frame(&mut world, Vec2::ZERO, &Palette::default(), &mut recorder);

        assert_eq!(recorder.commands().len(), 3);
    }

    #[test]
    fn presentation_rejects_zero_frame_rate_without_panicking() {
        let error = Presentation::new("iso", Color::from_rgb_u8(0, 0, 0), Vec2::ZERO)
            .with_frame_rate(0)
            .expect_err("zero frame rate must be rejected");

        assert_eq!(error, RenderingError::InvalidFrameRate { frame_rate: 0 });
    }

    #[test]
    fn presentation_frame_duration_matches_rate() {
        let presentation = Presentation::new("iso", Color::from_rgb_u8(0, 0, 0), Vec2::ZERO)
            .with_frame_rate(50)
            .expect("positive frame rate");

        assert_eq!(presentation.frame_duration(), Duration::from_millis(20));
    }

    #[test]
    fn lighten_moves_channels_towards_white() {
        let color = Color::new(0.0, 0.5, 1.0, 0.25).lighten(0.5);

        assert_eq!(color, Color::new(0.5, 0.75, 1.0, 0.25));
    }
}

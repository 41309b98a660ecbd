#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Iso Tactics simulation.
//!
//! This crate defines the geometry every other crate speaks and the message
//! surface that connects adapters with the authoritative world. Adapters
//! submit [`Command`] values describing desired mutations, the world executes
//! them through its `apply` entry point and reports the outcome as [`Event`]
//! values. Systems work on plain geometry and never own world state.

mod clock;
mod geometry;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use clock::TickClock;
pub use geometry::{
    Direction, GridCoord, Ground, PlanarOffset, Position, Projector, ScreenOffset, ScreenRect,
    Spatial,
};

/// Unique identifier assigned to a tile by the map that owns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(u32);

impl TileId {
    /// Creates a new tile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a mobile actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(u32);

impl ActorId {
    /// Creates a new actor identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an area marker overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(u32);

impl MarkerId {
    /// Creates a new marker identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a deferred command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerId(u32);

impl TriggerId {
    /// Creates a new trigger identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Surface shape of a tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileShape {
    /// Level surface at the tile's full height.
    #[default]
    Flat,
    /// Surface rising linearly toward the provided direction, reaching the
    /// tile's full height at that edge and zero at the opposite edge.
    Ramp(Direction),
}

impl TileShape {
    /// Height of the surface above the tile's bottom at the provided offset
    /// from the tile centre. Offsets are clamped to the tile's half-extent.
    #[must_use]
    pub fn profile(self, height: f32, offset: PlanarOffset) -> f32 {
        let dx = offset.dx.clamp(-0.5, 0.5);
        let dy = offset.dy.clamp(-0.5, 0.5);
        let fraction = match self {
            Self::Flat => return height,
            Self::Ramp(Direction::East) => dx + 0.5,
            Self::Ramp(Direction::West) => 0.5 - dx,
            Self::Ramp(Direction::South) => dy + 0.5,
            Self::Ramp(Direction::North) => 0.5 - dy,
        };
        height * fraction
    }
}

/// Description of a tile before the map assigns it a cell and elevation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileSpec {
    /// Thickness of the tile in elevation units.
    pub height: f32,
    /// Shape of the tile's upper surface.
    #[serde(default)]
    pub shape: TileShape,
}

impl TileSpec {
    /// Flat tile of the provided thickness.
    #[must_use]
    pub const fn flat(height: f32) -> Self {
        Self {
            height,
            shape: TileShape::Flat,
        }
    }

    /// Ramp of the provided thickness rising toward `facing`.
    #[must_use]
    pub const fn ramp(height: f32, facing: Direction) -> Self {
        Self {
            height,
            shape: TileShape::Ramp(facing),
        }
    }

    /// Thickness clamped to a finite, non-negative value.
    #[must_use]
    pub fn sanitized_height(&self) -> f32 {
        if self.height.is_finite() && self.height > 0.0 {
            self.height
        } else {
            0.0
        }
    }
}

/// Purpose of an area marker overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerKind {
    /// Cell inside an actor's movement range.
    Reach,
    /// Cell along a planned path.
    Path,
    /// Cell selected as a target.
    Target,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the projection used for screen-space bounds and drawing.
    ConfigureProjection {
        /// Projector applied to every spatial object.
        projector: Projector,
    },
    /// Places a tile on top of the stack at the provided cell.
    PlaceTile {
        /// Cell receiving the tile.
        cell: GridCoord,
        /// Tile description.
        tile: TileSpec,
    },
    /// Inserts a tile into the stack at a specific layer.
    InsertTile {
        /// Cell whose stack is edited.
        cell: GridCoord,
        /// Zero-based layer index, counted from the bottom.
        layer: usize,
        /// Tile description.
        tile: TileSpec,
    },
    /// Replaces the tile occupying a specific layer.
    ReplaceTile {
        /// Cell whose stack is edited.
        cell: GridCoord,
        /// Zero-based layer index, counted from the bottom.
        layer: usize,
        /// Replacement tile description.
        tile: TileSpec,
    },
    /// Removes the tile occupying a specific layer.
    RemoveTile {
        /// Cell whose stack is edited.
        cell: GridCoord,
        /// Zero-based layer index, counted from the bottom.
        layer: usize,
    },
    /// Creates a mobile actor standing on the top tile of a cell.
    SpawnActor {
        /// Cell the actor starts on.
        cell: GridCoord,
        /// Movement speed in tiles per simulated second.
        speed: f32,
        /// Simulation ticks per second driving the actor's motion.
        tick_rate: u32,
        /// Largest height difference the actor can climb in one step.
        jump: f32,
        /// Whether the actor follows the map's height field while moving.
        grounded: bool,
    },
    /// Destroys an actor and detaches every registration it holds.
    DespawnActor {
        /// Actor to destroy.
        actor: ActorId,
    },
    /// Starts moving an actor toward a destination.
    MoveActor {
        /// Actor to move.
        actor: ActorId,
        /// Logical destination.
        destination: Position,
        /// Optional fixed travel duration overriding the speed-derived one.
        duration: Option<Duration>,
    },
    /// Queues a sequence of waypoints for an actor to walk through.
    FollowPath {
        /// Actor to move.
        actor: ActorId,
        /// Waypoints visited in order.
        waypoints: Vec<Position>,
    },
    /// Cancels an actor's motion, leaving it where it currently stands.
    StopActor {
        /// Actor to stop.
        actor: ActorId,
    },
    /// Changes the speed used by an actor's subsequent legs.
    SetSpeed {
        /// Actor to adjust.
        actor: ActorId,
        /// New speed in tiles per simulated second.
        speed: f32,
    },
    /// Creates area markers over the provided cells.
    MarkArea {
        /// Cells to mark; cells without terrain are skipped.
        cells: Vec<GridCoord>,
        /// Purpose of the markers.
        kind: MarkerKind,
    },
    /// Removes every area marker of the provided kind.
    ClearMarkers {
        /// Kind of markers to remove.
        kind: MarkerKind,
    },
    /// Schedules a command to be applied after a number of frames.
    Defer {
        /// Number of `Tick` commands to wait before applying the command.
        frames: u64,
        /// Command applied once the delay elapses.
        command: Box<Command>,
    },
    /// Advances the simulation clock by the provided real elapsed time.
    Tick {
        /// Real time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Real time that elapsed in the frame.
        dt: Duration,
        /// Frame counter after advancing.
        frame: u64,
    },
    /// Confirms that a tile entered a stack.
    TilePlaced {
        /// Identifier assigned to the tile.
        tile: TileId,
        /// Cell containing the tile.
        cell: GridCoord,
        /// Layer the tile occupies.
        layer: usize,
    },
    /// Confirms that a tile left a stack.
    TileRemoved {
        /// Identifier of the removed tile.
        tile: TileId,
        /// Cell that contained the tile.
        cell: GridCoord,
        /// Layer the tile occupied.
        layer: usize,
    },
    /// Reports that a stack edit was rejected.
    StackEditRejected {
        /// Cell targeted by the edit.
        cell: GridCoord,
        /// Specific reason the edit failed.
        reason: EditError,
    },
    /// Reports that an occupant moved vertically because its stack changed.
    OccupantDisplaced {
        /// Actor resting on the stack.
        actor: ActorId,
        /// Elevation change applied to the actor.
        rise: f32,
    },
    /// Reports that an occupant lost its supporting stack entirely.
    OccupantEvicted {
        /// Actor that was resting on the stack.
        actor: ActorId,
        /// Cell whose stack became empty.
        cell: GridCoord,
    },
    /// Confirms that an actor was created.
    ActorSpawned {
        /// Identifier assigned to the actor.
        actor: ActorId,
        /// Cell the actor occupies.
        cell: GridCoord,
    },
    /// Reports that a spawn request was rejected.
    ActorSpawnRejected {
        /// Cell requested for the spawn.
        cell: GridCoord,
        /// Specific reason the spawn failed.
        reason: EditError,
    },
    /// Confirms that an actor was destroyed.
    ActorDespawned {
        /// Identifier of the destroyed actor.
        actor: ActorId,
    },
    /// Confirms that an actor started moving toward a destination.
    ActorDeparted {
        /// Identifier of the moving actor.
        actor: ActorId,
        /// Destination of the current leg.
        destination: Position,
        /// Number of ticks the leg will take.
        steps: u32,
    },
    /// Confirms that an actor reached the destination of a leg.
    ActorArrived {
        /// Identifier of the actor.
        actor: ActorId,
        /// Exact position reached.
        position: Position,
    },
    /// Confirms that an actor's motion was cancelled.
    ActorStopped {
        /// Identifier of the actor.
        actor: ActorId,
        /// Position the actor was left at.
        position: Position,
    },
    /// Confirms an actor's new speed.
    ActorSpeedChanged {
        /// Identifier of the actor.
        actor: ActorId,
        /// Speed in tiles per simulated second.
        speed: f32,
    },
    /// Reports that a command referenced an unknown actor.
    ActorCommandRejected {
        /// Identifier provided in the command.
        actor: ActorId,
        /// Specific reason the command failed.
        reason: EditError,
    },
    /// Confirms that area markers were created.
    AreaMarked {
        /// Kind of markers created.
        kind: MarkerKind,
        /// Number of markers created.
        count: usize,
    },
    /// Confirms that a deferred command was scheduled.
    TriggerScheduled {
        /// Identifier of the trigger.
        trigger: TriggerId,
        /// Frame on which the command fires.
        due_frame: u64,
    },
    /// Confirms that a deferred command was applied.
    TriggerFired {
        /// Identifier of the trigger.
        trigger: TriggerId,
    },
}

/// Reasons a world mutation may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditError {
    /// The cell lies outside the map.
    OutOfBounds,
    /// The requested layer does not exist in the stack.
    MissingLayer,
    /// Another actor already rests on the cell.
    CellOccupied,
    /// The cell holds no tile to stand on.
    MissingGround,
    /// No actor with the provided identifier exists.
    UnknownActor,
    /// The request carried a value that cannot be honoured, such as a zero duration.
    Degenerate,
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Iso Tactics.
//!
//! The world owns the tile map, the actors walking on it, the area markers
//! drawn over it and the depth registration of every drawable. All mutation
//! goes through [`apply`]; reads go through the [`query`] module.

mod actors;
mod map;
mod markers;
mod schedule;

use std::{collections::HashMap, time::Duration};

use iso_tactics_core::{
    ActorId, Command, EditError, Event, GridCoord, Ground, MarkerId, MarkerKind, PlanarOffset,
    Projector, Spatial, TileId,
};
use iso_tactics_system_depth::{DepthBuffer, DepthHandle, Footprint, SpatialIndex};
use iso_tactics_system_motion::{Leg, Motion};

use crate::{
    actors::{Actor, Roster},
    markers::MarkerLayer,
    schedule::Timeline,
};

pub use map::{StackEdit, Tile, TileMap};
pub use markers::Marker;
pub use schedule::TriggerState;

/// Identifies a drawable object registered for depth ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SceneKey {
    /// A tile of the map.
    Tile(TileId),
    /// A mobile actor.
    Actor(ActorId),
    /// An area marker overlay.
    Marker(MarkerId),
}

/// Represents the authoritative Iso Tactics world state.
#[derive(Debug)]
pub struct World {
    projector: Projector,
    map: TileMap,
    actors: Roster,
    markers: MarkerLayer,
    timeline: Timeline,
    depth: DepthBuffer<SceneKey>,
    tile_handles: HashMap<TileId, DepthHandle>,
    frame: u64,
}

impl World {
    /// Creates an empty world over a `width` by `length` grid.
    #[must_use]
    pub fn new(width: u32, length: u32) -> Self {
        Self {
            projector: Projector::default(),
            map: TileMap::new(width, length),
            actors: Roster::default(),
            markers: MarkerLayer::default(),
            timeline: Timeline::default(),
            depth: DepthBuffer::new(),
            tile_handles: HashMap::new(),
            frame: 0,
        }
    }

    fn absorb_stack_edit(
        &mut self,
        cell: GridCoord,
        result: Result<StackEdit, EditError>,
        out_events: &mut Vec<Event>,
    ) {
        let edit = match result {
            Ok(edit) => edit,
            Err(reason) => {
                tracing::debug!(?cell, ?reason, "stack edit rejected");
                out_events.push(Event::StackEditRejected { cell, reason });
                return;
            }
        };

        if let Some((tile, layer)) = edit.removed {
            if let Some(handle) = self.tile_handles.remove(&tile) {
                let _ = self.depth.remove(handle);
            }
            out_events.push(Event::TileRemoved { tile, cell, layer });
        }

        if let Some((tile, layer)) = edit.placed {
            let handle = self.depth.add(SceneKey::Tile(tile));
            let _ = self.tile_handles.insert(tile, handle);
            out_events.push(Event::TilePlaced { tile, cell, layer });
        }

        // Layers above the edit moved too.
        self.depth.invalidate();

        let Some(actor_id) = edit.occupant else {
            return;
        };

        if edit.evicted {
            if let Some(actor) = self.actors.get_mut(actor_id) {
                actor.cell = None;
            }
            tracing::debug!(actor = actor_id.get(), ?cell, "occupant lost its ground");
            out_events.push(Event::OccupantEvicted {
                actor: actor_id,
                cell,
            });
        } else if edit.rise != 0.0 {
            if let Some(actor) = self.actors.get_mut(actor_id) {
                actor.motion.displace(edit.rise);
            }
            out_events.push(Event::OccupantDisplaced {
                actor: actor_id,
                rise: edit.rise,
            });
        }
    }

    fn spawn_surface(&self, cell: GridCoord) -> Result<f32, EditError> {
        if !self.map.contains(cell) {
            return Err(EditError::OutOfBounds);
        }
        let surface = self.map.surface(cell).ok_or(EditError::MissingGround)?;
        if self.map.occupant_at(cell).is_some() {
            return Err(EditError::CellOccupied);
        }
        Ok(surface)
    }

    fn spawn(
        &mut self,
        cell: GridCoord,
        speed: f32,
        tick_rate: u32,
        jump: f32,
        grounded: bool,
        out_events: &mut Vec<Event>,
    ) {
        let surface = match self.spawn_surface(cell) {
            Ok(surface) => surface,
            Err(reason) => {
                tracing::debug!(?cell, ?reason, "spawn rejected");
                out_events.push(Event::ActorSpawnRejected { cell, reason });
                return;
            }
        };

        let id = self.actors.next_id();
        let depth = self.depth.add(SceneKey::Actor(id));
        let _ = self.map.set_occupant(cell, Some(id));
        self.actors.insert(Actor {
            id,
            motion: Motion::new(cell.center(surface), speed, tick_rate),
            jump: if jump.is_finite() { jump.max(0.0) } else { 0.0 },
            grounded,
            cell: Some(cell),
            depth,
        });
        out_events.push(Event::ActorSpawned { actor: id, cell });
    }

    fn despawn(&mut self, id: ActorId, out_events: &mut Vec<Event>) {
        let Some(actor) = self.actors.remove(id) else {
            reject_actor(id, EditError::UnknownActor, out_events);
            return;
        };

        let _ = self.depth.remove(actor.depth);
        if let Some(cell) = actor.cell {
            if self.map.occupant_at(cell) == Some(id) {
                let _ = self.map.set_occupant(cell, None);
            }
        }
        out_events.push(Event::ActorDespawned { actor: id });
    }

    fn advance_actors(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let mut arrivals = Vec::new();

        for actor in self.actors.iter_mut() {
            let ground = actor.grounded.then_some(&self.map as &dyn Ground);
            let report = actor.motion.advance(dt, ground);
            if report.moved() {
                let _ = self.depth.mark_dirty(actor.depth);
            }

            for leg in report.legs {
                match leg {
                    Leg::Arrived(position) => {
                        arrivals.push((actor.id, position.cell()));
                        out_events.push(Event::ActorArrived {
                            actor: actor.id,
                            position,
                        });
                    }
                    Leg::Departed { destination, steps } => {
                        out_events.push(Event::ActorDeparted {
                            actor: actor.id,
                            destination,
                            steps,
                        });
                    }
                }
            }
        }

        for (id, cell) in arrivals {
            self.settle(id, cell);
        }
    }

    /// Moves an actor's occupancy to the cell it arrived on.
    fn settle(&mut self, id: ActorId, cell: GridCoord) {
        let Some(actor) = self.actors.get_mut(id) else {
            return;
        };
        if actor.cell == Some(cell) {
            return;
        }

        if let Some(previous) = actor.cell.take() {
            if self.map.occupant_at(previous) == Some(id) {
                let _ = self.map.set_occupant(previous, None);
            }
        }

        if self.map.valid(cell) && self.map.occupant_at(cell).is_none() {
            let _ = self.map.set_occupant(cell, Some(id));
            actor.cell = Some(cell);
        } else {
            tracing::debug!(actor = id.get(), ?cell, "arrived on a cell it cannot occupy");
        }
    }

    fn mark_area(&mut self, cells: Vec<GridCoord>, kind: MarkerKind, out_events: &mut Vec<Event>) {
        let mut count = 0;
        for cell in cells {
            let Some(surface) = self.map.surface(cell) else {
                continue;
            };
            let handle = self.depth.add(SceneKey::Marker(self.markers.next_id()));
            let _ = self.markers.push(kind, cell, surface, handle);
            count += 1;
        }
        out_events.push(Event::AreaMarked { kind, count });
    }

    fn clear_markers(&mut self, kind: MarkerKind) {
        for handle in self.markers.clear(kind) {
            let _ = self.depth.remove(handle);
        }
    }

    fn scene_index(&self) -> SceneIndex<'_> {
        SceneIndex {
            projector: self.projector,
            map: &self.map,
            actors: &self.actors,
            markers: &self.markers,
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureProjection { projector } => {
            world.projector = projector;
            world.depth.invalidate();
        }
        Command::PlaceTile { cell, tile } => {
            let result = world.map.place(cell, tile);
            world.absorb_stack_edit(cell, result, out_events);
        }
        Command::InsertTile { cell, layer, tile } => {
            let result = world.map.insert(cell, layer, tile);
            world.absorb_stack_edit(cell, result, out_events);
        }
        Command::ReplaceTile { cell, layer, tile } => {
            let result = world.map.replace(cell, layer, tile);
            world.absorb_stack_edit(cell, result, out_events);
        }
        Command::RemoveTile { cell, layer } => {
            let result = world.map.remove(cell, layer);
            world.absorb_stack_edit(cell, result, out_events);
        }
        Command::SpawnActor {
            cell,
            speed,
            tick_rate,
            jump,
            grounded,
        } => {
            world.spawn(cell, speed, tick_rate, jump, grounded, out_events);
        }
        Command::DespawnActor { actor } => world.despawn(actor, out_events),
        Command::MoveActor {
            actor,
            destination,
            duration,
        } => {
            let Some(entry) = world.actors.get_mut(actor) else {
                reject_actor(actor, EditError::UnknownActor, out_events);
                return;
            };

            let steps = match duration {
                Some(duration) => match entry.motion.move_to_within(destination, duration) {
                    Some(steps) => steps,
                    None => {
                        reject_actor(actor, EditError::Degenerate, out_events);
                        return;
                    }
                },
                None => entry.motion.move_to(destination),
            };

            if steps > 0 {
                out_events.push(Event::ActorDeparted {
                    actor,
                    destination,
                    steps,
                });
            }
        }
        Command::FollowPath { actor, waypoints } => {
            let Some(entry) = world.actors.get_mut(actor) else {
                reject_actor(actor, EditError::UnknownActor, out_events);
                return;
            };

            if let Some((destination, steps)) = entry.motion.follow_path(waypoints) {
                out_events.push(Event::ActorDeparted {
                    actor,
                    destination,
                    steps,
                });
            }
        }
        Command::StopActor { actor } => {
            let Some(entry) = world.actors.get_mut(actor) else {
                reject_actor(actor, EditError::UnknownActor, out_events);
                return;
            };

            entry.motion.stop_moving();
            out_events.push(Event::ActorStopped {
                actor,
                position: entry.motion.position(),
            });
        }
        Command::SetSpeed { actor, speed } => {
            let Some(entry) = world.actors.get_mut(actor) else {
                reject_actor(actor, EditError::UnknownActor, out_events);
                return;
            };

            if entry.motion.set_speed(speed) {
                out_events.push(Event::ActorSpeedChanged { actor, speed });
            } else {
                reject_actor(actor, EditError::Degenerate, out_events);
            }
        }
        Command::MarkArea { cells, kind } => world.mark_area(cells, kind, out_events),
        Command::ClearMarkers { kind } => world.clear_markers(kind),
        Command::Defer { frames, command } => {
            let due_frame = world.frame.saturating_add(frames);
            let trigger = world.timeline.schedule(due_frame, *command);
            out_events.push(Event::TriggerScheduled { trigger, due_frame });
            if frames == 0 {
                fire_due_triggers(world, out_events);
            }
        }
        Command::Tick { dt } => {
            world.frame = world.frame.saturating_add(1);
            out_events.push(Event::TimeAdvanced {
                dt,
                frame: world.frame,
            });
            world.advance_actors(dt, out_events);
            fire_due_triggers(world, out_events);
        }
    }
}

/// Resolves the paint order of every drawable, rebuilding it if anything
/// moved or changed since the previous call.
pub fn refresh_draw_order(world: &mut World) -> &[SceneKey] {
    let index = SceneIndex {
        projector: world.projector,
        map: &world.map,
        actors: &world.actors,
        markers: &world.markers,
    };
    world.depth.resolve(&index)
}

fn fire_due_triggers(world: &mut World, out_events: &mut Vec<Event>) {
    for (trigger, command) in world.timeline.take_due(world.frame) {
        tracing::trace!(trigger = trigger.get(), frame = world.frame, "firing deferred command");
        out_events.push(Event::TriggerFired { trigger });
        apply(world, command, out_events);
    }
}

fn reject_actor(actor: ActorId, reason: EditError, out_events: &mut Vec<Event>) {
    tracing::debug!(actor = actor.get(), ?reason, "actor command rejected");
    out_events.push(Event::ActorCommandRejected { actor, reason });
}

const MARKER_TIER: u32 = u32::MAX - 1;
const ACTOR_TIER: u32 = u32::MAX;

/// Read-only view resolving scene keys into spatial objects.
struct SceneIndex<'a> {
    projector: Projector,
    map: &'a TileMap,
    actors: &'a Roster,
    markers: &'a MarkerLayer,
}

impl SceneIndex<'_> {
    fn spatial(&self, key: SceneKey) -> Option<&dyn Spatial> {
        match key {
            SceneKey::Tile(id) => self.map.tile(id).map(|tile| tile as &dyn Spatial),
            SceneKey::Actor(id) => self.actors.get(id).map(|actor| actor as &dyn Spatial),
            SceneKey::Marker(id) => self.markers.get(id).map(|marker| marker as &dyn Spatial),
        }
    }
}

impl SpatialIndex<SceneKey> for SceneIndex<'_> {
    fn footprint(&self, key: SceneKey) -> Option<Footprint> {
        let spatial = self.spatial(key)?;
        let base = spatial.position();
        let bounds = spatial.screen_bounds(&self.projector);
        // Within a stack: tiles bottom-up, then markers, then the occupant.
        let footprint = match key {
            SceneKey::Tile(id) => {
                let tile = self.map.tile(id)?;
                let top = base.with_z(base.z + spatial.height_at(PlanarOffset::CENTER));
                Footprint::new(top, bounds).stacked(tile.cell(), tile.layer() as u32)
            }
            SceneKey::Marker(id) => {
                let cell = self.markers.get(id)?.cell();
                Footprint::new(base, bounds).stacked(cell, MARKER_TIER)
            }
            SceneKey::Actor(id) => {
                let footprint = Footprint::new(base, bounds);
                match self.actors.get(id)?.cell {
                    Some(cell) => footprint.stacked(cell, ACTOR_TIER),
                    None => Footprint {
                        tier: ACTOR_TIER,
                        ..footprint
                    },
                }
            }
        };
        Some(footprint)
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use iso_tactics_core::{
        ActorId, GridCoord, MarkerKind, Position, Projector, ScreenOffset, ScreenRect, TileShape,
        TriggerId,
    };
    use iso_tactics_system_reachability::ReachSet;

    use super::{Marker, SceneKey, Tile, TileMap, TriggerState, World};

    /// Projection used for screen-space bounds and drawing.
    #[must_use]
    pub fn projector(world: &World) -> Projector {
        world.projector
    }

    /// Provides read-only access to the tile map.
    #[must_use]
    pub fn map(world: &World) -> &TileMap {
        &world.map
    }

    /// Number of `Tick` commands processed so far.
    #[must_use]
    pub fn frame(world: &World) -> u64 {
        world.frame
    }

    /// Walkable surface at a fractional coordinate; `None` where there is no ground.
    #[must_use]
    pub fn height(world: &World, x: f32, y: f32) -> Option<f32> {
        world.map.height(x, y)
    }

    /// Top-most tile of a cell.
    #[must_use]
    pub fn tile_at(world: &World, cell: GridCoord) -> Option<&Tile> {
        world.map.at(cell)
    }

    /// Actor resting on the top tile of a cell.
    #[must_use]
    pub fn occupant_at(world: &World, cell: GridCoord) -> Option<ActorId> {
        world.map.occupant_at(cell)
    }

    /// Reports whether an actor able to climb `jump` may step from `from` to `to`.
    ///
    /// Both cells must hold ground and their centre surfaces may differ by at
    /// most `jump`.
    #[must_use]
    pub fn passable(world: &World, from: GridCoord, to: GridCoord, jump: f32) -> bool {
        match (world.map.surface(from), world.map.surface(to)) {
            (Some(from), Some(to)) => (to - from).abs() <= jump,
            _ => false,
        }
    }

    /// Reports whether `actor` may end a move on `cell`.
    #[must_use]
    pub fn occupiable_by(world: &World, actor: ActorId, cell: GridCoord) -> bool {
        world.map.valid(cell)
            && world
                .map
                .occupant_at(cell)
                .map_or(true, |occupant| occupant == actor)
    }

    /// Cells `actor` can reach with `budget` steps from the cell it stands on.
    ///
    /// Returns `None` for unknown actors.
    #[must_use]
    pub fn reach(world: &World, actor: ActorId, budget: u32) -> Option<ReachSet> {
        let entry = world.actors.get(actor)?;
        let origin = entry
            .cell
            .unwrap_or_else(|| entry.motion.position().cell());
        let jump = entry.jump;
        Some(iso_tactics_system_reachability::reach(
            origin,
            budget,
            |from, to| passable(world, from, to, jump),
            |cell| occupiable_by(world, actor, cell),
        ))
    }

    /// Snapshot of a single actor.
    #[must_use]
    pub fn actor(world: &World, actor: ActorId) -> Option<ActorSnapshot> {
        world.actors.get(actor).map(ActorSnapshot::capture)
    }

    /// Snapshots of every actor ordered by identifier.
    #[must_use]
    pub fn actors(world: &World) -> Vec<ActorSnapshot> {
        world.actors.iter().map(ActorSnapshot::capture).collect()
    }

    /// Area markers currently shown.
    pub fn markers(world: &World) -> impl Iterator<Item = &Marker> {
        world.markers.iter()
    }

    /// Paint order computed by the most recent [`super::refresh_draw_order`].
    #[must_use]
    pub fn draw_order(world: &World) -> &[SceneKey] {
        world.depth.order()
    }

    /// Reports whether the paint order must be refreshed before drawing.
    #[must_use]
    pub fn draw_order_is_stale(world: &World) -> bool {
        world.depth.is_dirty()
    }

    /// Number of drawables registered for depth ordering.
    #[must_use]
    pub fn drawable_count(world: &World) -> usize {
        world.depth.len()
    }

    /// Lifecycle state of a deferred command.
    #[must_use]
    pub fn trigger_state(world: &World, trigger: TriggerId) -> Option<TriggerState> {
        world.timeline.state(trigger)
    }

    /// Drawing information for a registered scene object.
    #[must_use]
    pub fn visual(world: &World, key: SceneKey) -> Option<Visual> {
        let index = world.scene_index();
        let spatial = index.spatial(key)?;
        let anchor = spatial.position();
        let appearance = match key {
            SceneKey::Tile(id) => {
                let tile = world.map.tile(id)?;
                Appearance::Tile {
                    height: tile.height(),
                    shape: tile.shape(),
                    occupied: tile.occupant().is_some(),
                }
            }
            SceneKey::Actor(id) => Appearance::Actor {
                moving: world.actors.get(id)?.motion.moving(),
            },
            SceneKey::Marker(id) => Appearance::Marker(world.markers.get(id)?.kind()),
        };

        Some(Visual {
            key,
            anchor,
            screen: world.projector.project(anchor),
            bounds: spatial.screen_bounds(&world.projector),
            appearance,
        })
    }

    /// Immutable representation of an actor's state.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct ActorSnapshot {
        /// Unique identifier of the actor.
        pub id: ActorId,
        /// Current logical position.
        pub position: Position,
        /// Destination of the current or most recent leg.
        pub destination: Position,
        /// Whether a leg is in progress.
        pub moving: bool,
        /// Ticks left in the current leg.
        pub remaining_steps: u32,
        /// Waypoints queued after the current leg.
        pub queued_waypoints: usize,
        /// Fraction of the next motion tick already accumulated.
        pub tick_progress: f32,
        /// Speed in tiles per simulated second.
        pub speed: f32,
        /// Ticks per simulated second.
        pub tick_rate: u32,
        /// Largest climbable height difference.
        pub jump: f32,
        /// Whether the actor follows the height field.
        pub grounded: bool,
        /// Cell whose top tile lists the actor as occupant.
        pub cell: Option<GridCoord>,
    }

    impl ActorSnapshot {
        fn capture(actor: &super::Actor) -> Self {
            Self {
                id: actor.id,
                position: actor.motion.position(),
                destination: actor.motion.destination(),
                moving: actor.motion.moving(),
                remaining_steps: actor.motion.remaining_steps(),
                queued_waypoints: actor.motion.queued_waypoints().count(),
                tick_progress: actor.motion.tick_progress(),
                speed: actor.motion.speed(),
                tick_rate: actor.motion.tick_rate(),
                jump: actor.jump,
                grounded: actor.grounded,
                cell: actor.cell,
            }
        }
    }

    /// Everything a renderer needs to draw one scene object.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct Visual {
        /// Key the object is registered under.
        pub key: SceneKey,
        /// Logical position of the object's base.
        pub anchor: Position,
        /// Projected screen offset of the anchor.
        pub screen: ScreenOffset,
        /// Screen rectangle covered by the object.
        pub bounds: ScreenRect,
        /// Kind-specific drawing details.
        pub appearance: Appearance,
    }

    /// Kind-specific drawing details of a [`Visual`].
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub enum Appearance {
        /// A tile block.
        Tile {
            /// Thickness of the block.
            height: f32,
            /// Shape of its upper surface.
            shape: TileShape,
            /// Whether an actor rests on it.
            occupied: bool,
        },
        /// A mobile actor.
        Actor {
            /// Whether the actor is mid-leg.
            moving: bool,
        },
        /// An area marker.
        Marker(MarkerKind),
    }
}

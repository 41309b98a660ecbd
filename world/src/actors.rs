//! Mobile actors owned by the world.

use iso_tactics_core::{
    ActorId, GridCoord, PlanarOffset, Position, Projector, ScreenRect, Spatial,
};
use iso_tactics_system_depth::DepthHandle;
use iso_tactics_system_motion::Motion;

/// Half of an actor's horizontal footprint, in tiles.
pub(crate) const ACTOR_RADIUS: f32 = 0.3;
/// Height of an actor's bounding box in elevation units.
pub(crate) const ACTOR_HEIGHT: f32 = 1.0;

#[derive(Clone, Debug)]
pub(crate) struct Actor {
    pub(crate) id: ActorId,
    pub(crate) motion: Motion,
    pub(crate) jump: f32,
    pub(crate) grounded: bool,
    /// Cell whose top tile lists this actor as its occupant.
    pub(crate) cell: Option<GridCoord>,
    pub(crate) depth: DepthHandle,
}

impl Spatial for Actor {
    fn position(&self) -> Position {
        self.motion.position()
    }

    fn height_at(&self, _offset: PlanarOffset) -> f32 {
        ACTOR_HEIGHT
    }

    fn screen_bounds(&self, projector: &Projector) -> ScreenRect {
        ScreenRect::of_box(projector, self.position(), ACTOR_RADIUS, ACTOR_HEIGHT)
    }
}

/// Dense actor storage indexed by identifier. Slots of despawned actors stay
/// empty so identifiers are never reused.
#[derive(Clone, Debug, Default)]
pub(crate) struct Roster {
    slots: Vec<Option<Actor>>,
}

impl Roster {
    pub(crate) fn next_id(&self) -> ActorId {
        ActorId::new(u32::try_from(self.slots.len()).unwrap_or(u32::MAX))
    }

    pub(crate) fn insert(&mut self, actor: Actor) {
        let index = actor.id.get() as usize;
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        self.slots[index] = Some(actor);
    }

    pub(crate) fn get(&self, id: ActorId) -> Option<&Actor> {
        self.slots.get(id.get() as usize)?.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.slots.get_mut(id.get() as usize)?.as_mut()
    }

    pub(crate) fn remove(&mut self, id: ActorId) -> Option<Actor> {
        self.slots.get_mut(id.get() as usize)?.take()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.slots.iter().flatten()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Actor> {
        self.slots.iter_mut().flatten()
    }
}

//! Builds a populated world from a [`ScenarioConfig`].

use anyhow::{anyhow, Context, Result};
use iso_tactics_core::{ActorId, Command, Event, GridCoord, MarkerKind, Position, TileSpec};
use iso_tactics_world::{apply, query, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{ActorConfig, ScenarioConfig};

/// Thickness of one terrain layer in elevation units.
pub const LAYER_HEIGHT: f32 = 0.5;

/// World built from a configuration, with the actors it spawned.
#[derive(Debug)]
pub struct Scenario {
    /// The populated world.
    pub world: World,
    /// Spawned actors, in configuration order. Rejected spawns are skipped.
    pub actors: Vec<ActorId>,
}

impl Scenario {
    /// Builds the terrain, spawns every actor and starts their paths.
    pub fn build(config: &ScenarioConfig) -> Self {
        let mut world = World::new(config.map.width, config.map.length);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::ConfigureProjection {
                projector: config.projection.projector(),
            },
            &mut events,
        );
        for command in terrain_commands(config) {
            apply(&mut world, command, &mut events);
        }
        let placed = events
            .iter()
            .filter(|event| matches!(event, Event::TilePlaced { .. }))
            .count();
        tracing::debug!(tiles = placed, "terrain built");

        let mut actors = Vec::with_capacity(config.actors.len());
        for (index, actor) in config.actors.iter().enumerate() {
            match spawn(&mut world, actor) {
                Some(id) => {
                    start_path(&mut world, id, actor);
                    actors.push(id);
                }
                None => tracing::warn!(index, x = actor.x, y = actor.y, "actor spawn rejected"),
            }
        }

        Self { world, actors }
    }

    /// Identifier of the `index`th spawned actor.
    pub fn actor(&self, index: usize) -> Result<ActorId> {
        self.actors
            .get(index)
            .copied()
            .ok_or_else(|| anyhow!("no actor with index {index} ({} spawned)", self.actors.len()))
    }

    /// Computes an actor's reach and marks it on the map.
    ///
    /// Earlier reach markers are cleared first. Returns the reachable cells in
    /// discovery order.
    pub fn mark_reach(&mut self, index: usize, budget: u32) -> Result<Vec<GridCoord>> {
        let actor = self.actor(index)?;
        let cells: Vec<GridCoord> = query::reach(&self.world, actor, budget)
            .with_context(|| format!("actor {index} has left the world"))?
            .iter()
            .collect();

        let mut events = Vec::new();
        apply(
            &mut self.world,
            Command::ClearMarkers {
                kind: MarkerKind::Reach,
            },
            &mut events,
        );
        apply(
            &mut self.world,
            Command::MarkArea {
                cells: cells.clone(),
                kind: MarkerKind::Reach,
            },
            &mut events,
        );
        Ok(cells)
    }
}

/// Layer count of every cell, one row per `y`.
#[must_use]
pub fn layer_counts(config: &ScenarioConfig) -> Vec<Vec<u32>> {
    if let Some(rows) = &config.map.heights {
        return rows.clone();
    }
    let mut rng = ChaCha8Rng::seed_from_u64(config.map.seed);
    let max_layers = config.map.max_layers.max(1);
    (0..config.map.length)
        .map(|_| {
            (0..config.map.width)
                .map(|_| rng.gen_range(1..=max_layers))
                .collect()
        })
        .collect()
}

fn terrain_commands(config: &ScenarioConfig) -> Vec<Command> {
    let mut commands = Vec::new();
    for (y, row) in layer_counts(config).into_iter().enumerate() {
        for (x, layers) in row.into_iter().enumerate() {
            let cell = GridCoord::new(x as i32, y as i32);
            commands.extend((0..layers).map(|_| Command::PlaceTile {
                cell,
                tile: TileSpec::flat(LAYER_HEIGHT),
            }));
        }
    }
    commands
}

fn spawn(world: &mut World, actor: &ActorConfig) -> Option<ActorId> {
    let mut events = Vec::new();
    apply(
        world,
        Command::SpawnActor {
            cell: GridCoord::new(actor.x, actor.y),
            speed: actor.speed,
            tick_rate: actor.tick_rate,
            jump: actor.jump,
            grounded: actor.grounded,
        },
        &mut events,
    );
    events.into_iter().find_map(|event| match event {
        Event::ActorSpawned { actor: id, .. } => Some(id),
        _ => None,
    })
}

fn start_path(world: &mut World, id: ActorId, actor: &ActorConfig) {
    if actor.path.is_empty() {
        return;
    }
    let waypoints = actor
        .path
        .iter()
        .map(|&[x, y]| Position::new(x, y, query::height(world, x, y).unwrap_or(0.0)))
        .collect();
    let mut events = Vec::new();
    apply(
        world,
        Command::FollowPath {
            actor: id,
            waypoints,
        },
        &mut events,
    );
    tracing::debug!(actor = id.get(), events = events.len(), "path started");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_terrain_is_reproducible_from_its_seed() {
        let mut config = ScenarioConfig::default();
        config.map.seed = 7;

        let first = layer_counts(&config);
        let second = layer_counts(&config);

        assert_eq!(first, second);
        assert_eq!(first.len(), config.map.length as usize);
        assert!(first
            .iter()
            .flatten()
            .all(|&layers| (1..=config.map.max_layers).contains(&layers)));
    }

    #[test]
    fn explicit_heights_override_the_seed() {
        let mut config = ScenarioConfig::default();
        config.map.width = 2;
        config.map.length = 1;
        config.map.heights = Some(vec![vec![1, 3]]);

        assert_eq!(layer_counts(&config), vec![vec![1, 3]]);
        assert_eq!(terrain_commands(&config).len(), 4);
    }

    #[test]
    fn unknown_actor_index_is_an_error() {
        let scenario = Scenario::build(&ScenarioConfig::default());

        assert!(scenario.actor(0).is_err());
    }
}

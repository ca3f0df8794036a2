//! Path queries over the loaded sector window.

use prey_arena_core::{ActorAlias, ActorId, ActorKind, Aabb, SectorCoord, Vec2};
use prey_arena_system_pathing::Pathfinder;

use crate::{actor::Actor, ActorDirectory, Engine, WorldConfig};

/// Answers path queries; it owns no mailbox traffic and is never updated.
#[derive(Debug)]
pub struct PathingActor {
    id: ActorId,
    pathfinder: Pathfinder,
    bounds: Aabb,
}

impl PathingActor {
    /// Registers the pathing actor under its alias, covering the window
    /// around the origin sector.
    pub(crate) fn spawn(directory: &mut ActorDirectory, config: &WorldConfig) -> ActorId {
        let id = directory.register(ActorKind::Pathing);
        directory.register_alias(ActorAlias::PathingActor, id);
        let pathing = Self {
            id,
            pathfinder: Pathfinder::new(config.path_node_size),
            bounds: SectorCoord::ORIGIN.window_bounds(config.sector_size),
        };
        directory.checkin(id, Actor::Pathing(pathing));
        id
    }

    /// Actor identifier.
    #[must_use]
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// World rectangle covered by the search grid.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Node-centre path from `origin` to `destination` around the engine's
    /// obstacles, or `None` when no route exists inside the window.
    pub fn get_path(&mut self, origin: Vec2, destination: Vec2, engine: &Engine) -> Option<Vec<Vec2>> {
        let footprints = engine.obstacles().map(|obstacle| obstacle.footprint);
        self.pathfinder
            .find_path(origin, destination, self.bounds, footprints)
    }

    /// Moves the search window and forgets every cached path.
    pub(crate) fn set_bounds(&mut self, bounds: Aabb) {
        self.bounds = bounds;
        self.pathfinder.invalidate();
    }

    /// Number of cached endpoint pairs.
    #[must_use]
    pub fn cached_paths(&self) -> usize {
        self.pathfinder.cached_paths()
    }

    /// Number of searches run so far; cache hits do not count.
    #[must_use]
    pub fn searches(&self) -> u64 {
        self.pathfinder.searches()
    }
}

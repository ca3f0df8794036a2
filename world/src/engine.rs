//! Deterministic stand-in for the engine services the simulation consumes.

use std::{collections::BTreeMap, time::Duration};

use prey_arena_core::{Aabb, ActorId, Event, Vec2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Unique identifier assigned to an obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObstacleId(u32);

impl ObstacleId {
    /// Creates a new obstacle identifier with the provided numeric value.
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

/// Kinds of static obstacles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObstacleKind {
    /// Procedurally placed tree.
    Tree,
}

/// Solid, pathing-aware object that blocks movement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obstacle {
    /// Kind of the obstacle.
    pub kind: ObstacleKind,
    /// Area the obstacle occupies.
    pub footprint: Aabb,
}

/// Kinematic body backing a unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    /// Center of the body.
    pub position: Vec2,
    /// Displacement applied on the next frame.
    pub velocity: Vec2,
    /// Full extent of the body.
    pub size: Vec2,
    /// Mass used to scale impulses.
    pub mass: f32,
}

impl Body {
    /// Area currently occupied by the body.
    #[must_use]
    pub fn footprint(&self) -> Aabb {
        Aabb::new(self.position, self.size)
    }
}

/// Clock, physics, obstacle store, RNG and event outbox.
#[derive(Debug)]
pub struct Engine {
    now: Duration,
    frame: u64,
    damping: f32,
    bodies: BTreeMap<ActorId, Body>,
    obstacles: BTreeMap<ObstacleId, Obstacle>,
    next_obstacle: u32,
    rng: ChaCha8Rng,
    events: Vec<Event>,
}

impl Engine {
    /// Creates an engine whose RNG is seeded with `seed`.
    ///
    /// `damping` is the fraction of velocity every body keeps per frame.
    #[must_use]
    pub fn new(seed: u64, damping: f32) -> Self {
        Self {
            now: Duration::ZERO,
            frame: 0,
            damping,
            bodies: BTreeMap::new(),
            obstacles: BTreeMap::new(),
            next_obstacle: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            events: Vec::new(),
        }
    }

    /// Current simulation time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of frames stepped so far.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Advances the clock by `dt` and integrates every body once.
    ///
    /// Bodies move one velocity step per frame, axis by axis; an axis whose
    /// step would push the body into an obstacle is zeroed instead.
    pub fn step(&mut self, dt: Duration) {
        self.now += dt;
        self.frame += 1;

        let obstacles = &self.obstacles;
        for body in self.bodies.values_mut() {
            let mut position = body.position;

            let along_x = position + Vec2::new(body.velocity.x, 0.0);
            if blocked(obstacles, body, position, along_x) {
                body.velocity.x = 0.0;
            } else {
                position = along_x;
            }

            let along_y = position + Vec2::new(0.0, body.velocity.y);
            if blocked(obstacles, body, position, along_y) {
                body.velocity.y = 0.0;
            } else {
                position = along_y;
            }

            body.position = position;
            body.velocity *= self.damping;
        }
    }

    /// Creates or replaces the body belonging to a unit.
    pub fn spawn_body(&mut self, owner: ActorId, body: Body) {
        let _ = self.bodies.insert(owner, body);
    }

    /// Removes a unit's body.
    pub fn remove_body(&mut self, owner: ActorId) -> Option<Body> {
        self.bodies.remove(&owner)
    }

    /// Body belonging to a unit.
    #[must_use]
    pub fn body(&self, owner: ActorId) -> Option<&Body> {
        self.bodies.get(&owner)
    }

    /// Mutable body belonging to a unit.
    pub fn body_mut(&mut self, owner: ActorId) -> Option<&mut Body> {
        self.bodies.get_mut(&owner)
    }

    /// Every body ordered by owner.
    pub fn bodies(&self) -> impl Iterator<Item = (ActorId, &Body)> {
        self.bodies.iter().map(|(owner, body)| (*owner, body))
    }

    /// Adds `impulse / mass` to a body's velocity.
    pub fn apply_impulse(&mut self, owner: ActorId, impulse: Vec2) {
        if let Some(body) = self.bodies.get_mut(&owner) {
            body.velocity += impulse / body.mass.max(f32::EPSILON);
        }
    }

    /// Places an obstacle and returns its identifier.
    pub fn spawn_obstacle(&mut self, obstacle: Obstacle) -> ObstacleId {
        let id = ObstacleId::new(self.next_obstacle);
        self.next_obstacle += 1;
        let _ = self.obstacles.insert(id, obstacle);
        id
    }

    /// Removes every obstacle whose center lies inside `area`.
    pub fn remove_obstacles_within(&mut self, area: Aabb) -> usize {
        let before = self.obstacles.len();
        self.obstacles
            .retain(|_, obstacle| !area.contains_point(obstacle.footprint.center));
        before - self.obstacles.len()
    }

    /// Every obstacle ordered by identifier.
    pub fn obstacles(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.values()
    }

    /// Number of obstacles in the world.
    #[must_use]
    pub fn obstacle_count(&self) -> usize {
        self.obstacles.len()
    }

    /// Removes every body and obstacle; queued events stay for adapters.
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.obstacles.clear();
    }

    /// Shared random source.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Queues an event for adapters.
    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Takes every event queued since the previous call.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

fn blocked(
    obstacles: &BTreeMap<ObstacleId, Obstacle>,
    body: &Body,
    current: Vec2,
    candidate: Vec2,
) -> bool {
    let here = Aabb::new(current, body.size);
    let there = Aabb::new(candidate, body.size);
    obstacles.values().any(|obstacle| {
        obstacle.footprint.overlaps(&there) && !obstacle.footprint.overlaps(&here)
    })
}

use std::{collections::BTreeMap, time::Duration};

use prey_arena_core::{UnitTypeName, Vec2};
use prey_arena_system_terrain::NoiseParams;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Widest pathing grid, in nodes, a configuration may ask for.
const MAX_PATH_GRID_EDGE: f32 = 1_024.0;

/// Configuration values the simulation cannot run with.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A length that sizes the world is zero, negative or not a number.
    #[error("{0} must be a positive number")]
    NotPositive(&'static str),
    /// Damping outside the unit interval.
    #[error("damping must lie between 0 and 1")]
    DampingOutOfRange,
    /// Enemy spawning could never pick a point.
    #[error("max_spawn_attempts must be at least 1")]
    NoSpawnAttempts,
    /// The loaded window would need an oversized pathing grid.
    #[error("path_node_size is too small for sector_size; the pathing grid would exceed 1024 nodes per edge")]
    PathGridTooLarge,
}

/// Tunables for a simulation instance.
///
/// Every field has a default, so configuration files only need to list the
/// values they change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Seed for the engine RNG and the terrain layout.
    pub seed: u64,
    /// Edge length of a streamed sector in world units.
    pub sector_size: f32,
    /// Edge length of a pathing grid node in world units.
    pub path_node_size: f32,
    /// Fraction of velocity bodies keep each frame.
    pub damping: f32,
    /// Speed below which an impacted unit regains control.
    pub impact_settle_speed: f32,
    /// Edge length of the obstacle-free square around the origin.
    pub clearing_size: f32,
    /// Area around the player in which enemies never spawn.
    pub safe_zone: Vec2,
    /// Attempts made to find a spawn point before giving up for the frame.
    pub max_spawn_attempts: u32,
    /// Milliseconds between difficulty increases.
    pub difficulty_ramp_interval_ms: u64,
    /// Difficulty added at each increase.
    pub difficulty_ramp_step: f32,
    /// Factor applied to the difficulty when a new round starts.
    pub difficulty_carryover: f32,
    /// Enemy population per unit type at difficulty 1.
    pub enemy_targets: BTreeMap<UnitTypeName, u32>,
    /// Noise model for obstacle generation.
    pub terrain: NoiseParams,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            sector_size: 17.0,
            path_node_size: 1.0,
            damping: 0.9,
            impact_settle_speed: 0.01,
            clearing_size: 5.0,
            safe_zone: Vec2::new(20.0, 12.0),
            max_spawn_attempts: 32,
            difficulty_ramp_interval_ms: 6_000,
            difficulty_ramp_step: 0.1,
            difficulty_carryover: 0.9,
            enemy_targets: BTreeMap::from([
                (UnitTypeName::Mouse, 10),
                (UnitTypeName::Rabbit, 5),
                (UnitTypeName::Pig, 2),
            ]),
            terrain: NoiseParams::default(),
        }
    }
}

impl WorldConfig {
    /// Returns a copy of the configuration using another seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Rejects values that would leave the world unbuildable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("sector_size", self.sector_size),
            ("path_node_size", self.path_node_size),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive(name));
            }
        }
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(ConfigError::DampingOutOfRange);
        }
        if self.max_spawn_attempts == 0 {
            return Err(ConfigError::NoSpawnAttempts);
        }
        // the pathing grid spans the 3x3 sector window
        if 3.0 * self.sector_size / self.path_node_size > MAX_PATH_GRID_EDGE {
            return Err(ConfigError::PathGridTooLarge);
        }
        Ok(())
    }

    /// Time between difficulty increases.
    #[must_use]
    pub fn difficulty_ramp_interval(&self) -> Duration {
        Duration::from_millis(self.difficulty_ramp_interval_ms)
    }
}

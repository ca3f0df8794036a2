#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic obstacle layouts for streamed world sectors.
//!
//! Every sector is divided into unit cells. A cell grows an obstacle when its
//! noise value falls below the configured threshold. Layouts depend only on
//! the world seed and the sector coordinate, so a sector that streams out and
//! back in reproduces the same obstacles.

mod simplex;

use prey_arena_core::{Aabb, SectorCoord, Vec2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

pub use simplex::SimplexNoise;

const MIN_SCALE: f32 = 0.000_01;

/// Noise model used to decide which cells grow obstacles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoiseParams {
    /// Independent uniform value in `[-1, 1)` per cell.
    Plain {
        /// Cells whose value falls below the threshold grow an obstacle.
        threshold: f32,
    },
    /// Multi-octave simplex noise sampled in world space.
    Simplex {
        /// Cells whose value falls below the threshold grow an obstacle.
        threshold: f32,
        /// World units per noise period of the first octave.
        scale: f32,
        /// Number of layered octaves.
        octaves: u32,
        /// Amplitude multiplier between octaves.
        persistence: f32,
        /// Frequency multiplier between octaves.
        lacunarity: f32,
    },
}

impl Default for NoiseParams {
    fn default() -> Self {
        NoiseParams::Simplex {
            threshold: -0.8,
            scale: 25.0,
            octaves: 4,
            persistence: 0.8,
            lacunarity: 2.0,
        }
    }
}

/// Generates obstacle positions for world sectors.
#[derive(Clone, Debug)]
pub struct TerrainGenerator {
    seed: u64,
    sector_size: f32,
    params: NoiseParams,
    clearing: Aabb,
    simplex: SimplexNoise,
}

impl TerrainGenerator {
    /// Creates a generator for square sectors of `sector_size` world units.
    ///
    /// No obstacle is ever placed inside the square clearing of edge
    /// `clearing` centred on the world origin.
    #[must_use]
    pub fn new(seed: u64, sector_size: f32, params: NoiseParams, clearing: f32) -> Self {
        Self {
            seed,
            sector_size,
            params,
            clearing: Aabb::new(Vec2::ZERO, Vec2::splat(clearing)),
            simplex: SimplexNoise::new(seed),
        }
    }

    /// World seed every sector layout is derived from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Noise model in use.
    #[must_use]
    pub fn params(&self) -> &NoiseParams {
        &self.params
    }

    /// Obstacle centres for the sector in row-major cell order.
    #[must_use]
    pub fn generate(&self, sector: SectorCoord) -> Vec<Vec2> {
        let cells = self.sector_size.round().max(1.0) as u32;
        let origin = sector.bounds(self.sector_size).min();
        let mut rng = ChaCha8Rng::seed_from_u64(derive_sector_seed(self.seed, sector));
        let mut obstacles = Vec::new();

        for row in 0..cells {
            for column in 0..cells {
                let position = origin + Vec2::new(column as f32 + 0.5, row as f32 + 0.5);
                let (value, threshold) = match &self.params {
                    NoiseParams::Plain { threshold } => (rng.gen::<f32>() * 2.0 - 1.0, *threshold),
                    NoiseParams::Simplex {
                        threshold,
                        scale,
                        octaves,
                        persistence,
                        lacunarity,
                    } => {
                        let sample = position / scale.max(MIN_SCALE);
                        let value = self.simplex.fractal(
                            sample.x,
                            sample.y,
                            *octaves,
                            *persistence,
                            *lacunarity,
                        );
                        (value, *threshold)
                    }
                };

                if value < threshold && !self.clearing.contains_point(position) {
                    obstacles.push(position);
                }
            }
        }

        debug!(?sector, obstacles = obstacles.len(), "generated sector");
        obstacles
    }
}

/// Derives the seed of a single sector from the world seed.
#[must_use]
pub fn derive_sector_seed(world_seed: u64, sector: SectorCoord) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(world_seed.to_le_bytes());
    hasher.update(b"sector");
    hasher.update(sector.x.to_le_bytes());
    hasher.update(sector.y.to_le_bytes());
    finalize_seed(hasher)
}

fn finalize_seed(hasher: Sha256) -> u64 {
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[0..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(threshold: f32) -> NoiseParams {
        NoiseParams::Plain { threshold }
    }

    #[test]
    fn sector_seeds_differ_between_neighbours() {
        let seed = 42;
        let centre = derive_sector_seed(seed, SectorCoord::new(0, 0));
        let east = derive_sector_seed(seed, SectorCoord::new(1, 0));
        let north = derive_sector_seed(seed, SectorCoord::new(0, 1));

        assert_ne!(centre, east);
        assert_ne!(centre, north);
        assert_ne!(east, north);
    }

    #[test]
    fn threshold_bounds_select_nothing_or_everything() {
        let sector = SectorCoord::new(2, -1);
        let barren = TerrainGenerator::new(7, 17.0, plain(-1.0), 0.0);
        let jungle = TerrainGenerator::new(7, 17.0, plain(1.0), 0.0);

        assert!(barren.generate(sector).is_empty());
        assert_eq!(jungle.generate(sector).len(), 17 * 17);
    }

    #[test]
    fn origin_clearing_stays_empty() {
        let generator = TerrainGenerator::new(3, 17.0, plain(1.0), 5.0);
        let obstacles = generator.generate(SectorCoord::ORIGIN);
        let clearing = Aabb::new(Vec2::ZERO, Vec2::splat(5.0));

        assert_eq!(obstacles.len(), 17 * 17 - 25);
        assert!(obstacles
            .iter()
            .all(|position| !clearing.contains_point(*position)));
    }

    #[test]
    fn obstacles_sit_on_cell_centres_inside_the_sector() {
        let sector = SectorCoord::new(-1, 1);
        let generator = TerrainGenerator::new(11, 17.0, plain(1.0), 0.0);
        let bounds = sector.bounds(17.0);

        for position in generator.generate(sector) {
            assert!(bounds.contains_point(position));
            assert_eq!(position, position.round());
        }
    }
}

//! Seeded two-dimensional simplex noise.

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;

const GRADIENTS: [(f64, f64); 12] = [
    (1.0, 1.0),
    (-1.0, 1.0),
    (1.0, -1.0),
    (-1.0, -1.0),
    (1.0, 0.0),
    (-1.0, 0.0),
    (1.0, 0.0),
    (-1.0, 0.0),
    (0.0, 1.0),
    (0.0, -1.0),
    (0.0, 1.0),
    (0.0, -1.0),
];

/// Simplex noise field whose lattice gradients are shuffled by a seed.
#[derive(Clone, Debug)]
pub struct SimplexNoise {
    permutation: Vec<u8>,
}

impl SimplexNoise {
    /// Creates a noise field for the provided seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut table: Vec<u8> = (0..=255).collect();
        table.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
        let mut permutation = Vec::with_capacity(512);
        permutation.extend_from_slice(&table);
        permutation.extend_from_slice(&table);
        Self { permutation }
    }

    /// Samples the field at a point; the result lies in roughly `[-1, 1]`.
    #[must_use]
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let skew = 0.5 * (3.0_f64.sqrt() - 1.0);
        let unskew = (3.0 - 3.0_f64.sqrt()) / 6.0;
        let (x, y) = (f64::from(x), f64::from(y));

        let s = (x + y) * skew;
        let i = (x + s).floor();
        let j = (y + s).floor();
        let t = (i + j) * unskew;
        let x0 = x - (i - t);
        let y0 = y - (j - t);

        let (i1, j1): (usize, usize) = if x0 > y0 { (1, 0) } else { (0, 1) };
        let x1 = x0 - i1 as f64 + unskew;
        let y1 = y0 - j1 as f64 + unskew;
        let x2 = x0 - 1.0 + 2.0 * unskew;
        let y2 = y0 - 1.0 + 2.0 * unskew;

        let ii = (i as i64 & 255) as usize;
        let jj = (j as i64 & 255) as usize;
        let corners = [
            (self.gradient(ii, jj), x0, y0),
            (self.gradient(ii + i1, jj + j1), x1, y1),
            (self.gradient(ii + 1, jj + 1), x2, y2),
        ];

        let total: f64 = corners
            .iter()
            .map(|&(gradient, dx, dy)| {
                let falloff = 0.5 - dx * dx - dy * dy;
                if falloff < 0.0 {
                    0.0
                } else {
                    falloff.powi(4) * (gradient.0 * dx + gradient.1 * dy)
                }
            })
            .sum();

        (70.0 * total) as f32
    }

    /// Layers `octaves` samples with shrinking amplitude and growing frequency.
    #[must_use]
    pub fn fractal(&self, x: f32, y: f32, octaves: u32, persistence: f32, lacunarity: f32) -> f32 {
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut height = 0.0;
        for _ in 0..octaves {
            height += self.sample(x * frequency, y * frequency) * amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }
        height
    }

    fn gradient(&self, column: usize, row: usize) -> (f64, f64) {
        let index = self.permutation[column + usize::from(self.permutation[row])];
        GRADIENTS[usize::from(index) % GRADIENTS.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_stay_within_unit_range() {
        let noise = SimplexNoise::new(9);
        for step in 0..400 {
            let x = step as f32 * 0.37 - 50.0;
            let y = step as f32 * -0.53 + 20.0;
            let value = noise.sample(x, y);
            assert!((-1.0..=1.0).contains(&value), "{value} at ({x}, {y})");
        }
    }

    #[test]
    fn lattice_points_are_zero() {
        let noise = SimplexNoise::new(1);
        assert_eq!(noise.sample(0.0, 0.0), 0.0);
    }

    #[test]
    fn seeds_change_the_field() {
        let first = SimplexNoise::new(1);
        let second = SimplexNoise::new(2);
        let differs = (0..50).any(|step| {
            let x = step as f32 * 0.71 + 0.3;
            first.sample(x, 0.45) != second.sample(x, 0.45)
        });
        assert!(differs);
    }
}

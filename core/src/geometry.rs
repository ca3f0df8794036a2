//! Planar geometry shared by the simulation and its adapters.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Line segment used for ray-style intersection queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// Point where the segment begins.
    pub start: Vec2,
    /// Point where the segment ends.
    pub end: Vec2,
}

impl Segment {
    /// Creates a segment spanning the provided endpoints.
    #[must_use]
    pub const fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    /// Length of the segment measured in world units.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }
}

/// Axis-aligned rectangle described by its center and full extent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Center of the rectangle.
    pub center: Vec2,
    /// Full width and height of the rectangle.
    pub size: Vec2,
}

impl Aabb {
    /// Creates a rectangle centred on `center` spanning `size`.
    #[must_use]
    pub const fn new(center: Vec2, size: Vec2) -> Self {
        Self { center, size }
    }

    /// Lower-left corner of the rectangle.
    #[must_use]
    pub fn min(&self) -> Vec2 {
        self.center - self.size * 0.5
    }

    /// Upper-right corner of the rectangle.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.center + self.size * 0.5
    }

    /// Reports whether the point lies inside the rectangle.
    ///
    /// The lower edges are inclusive and the upper edges exclusive so that
    /// tiling rectangles never both claim a point on a shared border.
    #[must_use]
    pub fn contains_point(&self, point: Vec2) -> bool {
        let min = self.min();
        let max = self.max();
        point.x >= min.x && point.x < max.x && point.y >= min.y && point.y < max.y
    }

    /// Reports whether two rectangles overlap with a non-zero area.
    #[must_use]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let delta = (self.center - other.center).abs();
        let reach = (self.size + other.size) * 0.5;
        delta.x < reach.x && delta.y < reach.y
    }

    /// Reports whether the segment touches the rectangle.
    #[must_use]
    pub fn intersects_segment(&self, segment: &Segment) -> bool {
        let min = self.min();
        let max = self.max();
        let delta = segment.end - segment.start;
        let p = [-delta.x, delta.x, -delta.y, delta.y];
        let q = [
            segment.start.x - min.x,
            max.x - segment.start.x,
            segment.start.y - min.y,
            max.y - segment.start.y,
        ];

        let mut entry = 0.0_f32;
        let mut exit = 1.0_f32;
        for (p, q) in p.into_iter().zip(q) {
            if p == 0.0 {
                if q < 0.0 {
                    return false;
                }
                continue;
            }

            let t = q / p;
            if p < 0.0 {
                if t > exit {
                    return false;
                }
                entry = entry.max(t);
            } else {
                if t < entry {
                    return false;
                }
                exit = exit.min(t);
            }
        }

        entry <= exit
    }
}

/// Integer coordinate of a square world sector.
///
/// Sector `(x, y)` is centred on `(x * size, y * size)`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SectorCoord {
    /// Sector column.
    pub x: i32,
    /// Sector row.
    pub y: i32,
}

impl SectorCoord {
    /// Sector that contains the world origin.
    pub const ORIGIN: SectorCoord = SectorCoord::new(0, 0);

    /// Creates a sector coordinate from its column and row.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Sector containing the provided world position.
    #[must_use]
    pub fn containing(position: Vec2, sector_size: f32) -> Self {
        let scaled = (position / sector_size).round();
        Self::new(scaled.x as i32, scaled.y as i32)
    }

    /// World position at the center of the sector.
    #[must_use]
    pub fn center(&self, sector_size: f32) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32) * sector_size
    }

    /// Rectangle covered by the sector.
    #[must_use]
    pub fn bounds(&self, sector_size: f32) -> Aabb {
        Aabb::new(self.center(sector_size), Vec2::splat(sector_size))
    }

    /// The 3x3 window of sectors centred on this one, in row-major order.
    #[must_use]
    pub fn adjacent(&self) -> [SectorCoord; 9] {
        let mut window = [*self; 9];
        let mut index = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                window[index] = SectorCoord::new(self.x + dx, self.y + dy);
                index += 1;
            }
        }
        window
    }

    /// Rectangle covered by the 3x3 window centred on this sector.
    #[must_use]
    pub fn window_bounds(&self, sector_size: f32) -> Aabb {
        Aabb::new(self.center(sector_size), Vec2::splat(sector_size * 3.0))
    }
}

/// Angle of the vector in radians, measured counter-clockwise from +x.
#[must_use]
pub fn angle_of(vector: Vec2) -> f32 {
    vector.y.atan2(vector.x)
}

/// Vector of the requested length pointing along `angle`.
#[must_use]
pub fn vector_from_angle(angle: f32, length: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin()) * length
}

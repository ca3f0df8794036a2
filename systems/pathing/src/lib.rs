#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure grid path search used by the pathing actor.
//!
//! The grid covers a rectangular window of the world. Each query converts its
//! endpoints to grid nodes and consults a cache keyed by both nodes; a miss
//! rebuilds the obstacle grid from the caller's footprints and runs an
//! eight-way A* search.

use std::{
    cmp::{Ordering, Reverse},
    collections::{BinaryHeap, HashMap},
};

use prey_arena_core::{Aabb, Vec2};
use tracing::trace;

const STRAIGHT_COST: u32 = 10;
const DIAGONAL_COST: u32 = 14;

/// Endpoint pairs a [`Pathfinder`] keeps before it starts over.
pub const DEFAULT_CACHE_LIMIT: usize = 4_096;

/// Integer coordinate of a node inside a [`PathGrid`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCoord {
    /// Zero-based column measured from the window's left edge.
    pub column: u32,
    /// Zero-based row measured from the window's bottom edge.
    pub row: u32,
}

impl GridCoord {
    /// Creates a grid coordinate from its column and row.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }
}

/// Cache key identifying a path by its endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PathKey {
    /// Node the path starts at.
    pub origin: GridCoord,
    /// Node the path ends at.
    pub destination: GridCoord,
}

/// Occupancy grid laid over a rectangular window of the world.
#[derive(Clone, Debug)]
pub struct PathGrid {
    bounds: Aabb,
    node_size: f32,
    columns: u32,
    rows: u32,
    blocked: Vec<bool>,
}

impl PathGrid {
    /// Creates an empty grid covering `bounds` with square nodes of `node_size`.
    #[must_use]
    pub fn new(bounds: Aabb, node_size: f32) -> Self {
        let columns = (bounds.size.x / node_size).floor().max(1.0) as u32;
        let rows = (bounds.size.y / node_size).floor().max(1.0) as u32;
        Self {
            bounds,
            node_size,
            columns,
            rows,
            blocked: vec![false; columns as usize * rows as usize],
        }
    }

    /// Window of the world covered by the grid.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Number of node columns.
    #[must_use]
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of node rows.
    #[must_use]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Converts a world position to the nearest node, if it lies on the grid.
    #[must_use]
    pub fn coord_of(&self, position: Vec2) -> Option<GridCoord> {
        let local = (position - self.bounds.min()) / self.node_size - Vec2::splat(0.5);
        let rounded = local.round();
        if rounded.x < 0.0 || rounded.y < 0.0 {
            return None;
        }
        let coord = GridCoord::new(rounded.x as u32, rounded.y as u32);
        if coord.column >= self.columns || coord.row >= self.rows {
            return None;
        }
        Some(coord)
    }

    /// World position of a node's center.
    #[must_use]
    pub fn position_of(&self, coord: GridCoord) -> Vec2 {
        let offset = Vec2::new(coord.column as f32 + 0.5, coord.row as f32 + 0.5);
        self.bounds.min() + offset * self.node_size
    }

    /// Reports whether an obstacle covers the node.
    #[must_use]
    pub fn is_blocked(&self, coord: GridCoord) -> bool {
        self.index(coord)
            .map(|index| self.blocked[index])
            .unwrap_or(true)
    }

    /// Clears the grid and marks every node overlapped by a footprint.
    pub fn rebuild<I>(&mut self, footprints: I)
    where
        I: IntoIterator<Item = Aabb>,
    {
        self.blocked.fill(false);
        let node = Vec2::splat(self.node_size);
        let origin = self.bounds.min();

        for footprint in footprints {
            let low = ((footprint.min() - origin) / self.node_size).floor();
            let high = ((footprint.max() - origin) / self.node_size).ceil();
            let first_column = low.x.max(0.0) as u32;
            let first_row = low.y.max(0.0) as u32;
            let last_column = (high.x.max(0.0) as u32).min(self.columns);
            let last_row = (high.y.max(0.0) as u32).min(self.rows);

            for row in first_row..last_row {
                for column in first_column..last_column {
                    let coord = GridCoord::new(column, row);
                    let cell = Aabb::new(self.position_of(coord), node);
                    if cell.overlaps(&footprint) {
                        if let Some(index) = self.index(coord) {
                            self.blocked[index] = true;
                        }
                    }
                }
            }
        }
    }

    /// Runs an eight-way A* search between two nodes.
    ///
    /// The endpoints are always treated as passable so that a unit standing
    /// next to an obstacle, or chasing a target hugging one, still gets a
    /// route. Diagonal steps may not cut obstacle corners.
    #[must_use]
    pub fn search(&self, start: GridCoord, goal: GridCoord) -> Option<Vec<GridCoord>> {
        let start_index = self.index(start)?;
        let goal_index = self.index(goal)?;
        if start_index == goal_index {
            return Some(vec![start]);
        }

        let node_count = self.blocked.len();
        let mut best_cost = vec![u32::MAX; node_count];
        let mut parent = vec![None::<usize>; node_count];
        let mut closed = vec![false; node_count];
        let mut open = BinaryHeap::new();
        let mut insertion = 0_u64;

        best_cost[start_index] = 0;
        open.push(Reverse(OpenNode {
            estimate: octile_distance(start, goal),
            heuristic: octile_distance(start, goal),
            insertion,
            index: start_index,
        }));

        while let Some(Reverse(current)) = open.pop() {
            if closed[current.index] {
                continue;
            }
            if current.index == goal_index {
                return Some(self.reconstruct(&parent, goal_index));
            }
            closed[current.index] = true;

            let coord = self.coord_at(current.index);
            for (neighbor, step_cost) in self.neighbors(coord, start_index, goal_index) {
                let Some(neighbor_index) = self.index(neighbor) else {
                    continue;
                };
                if closed[neighbor_index] {
                    continue;
                }

                let cost = best_cost[current.index].saturating_add(step_cost);
                if cost >= best_cost[neighbor_index] {
                    continue;
                }

                best_cost[neighbor_index] = cost;
                parent[neighbor_index] = Some(current.index);
                insertion += 1;
                let heuristic = octile_distance(neighbor, goal);
                open.push(Reverse(OpenNode {
                    estimate: cost.saturating_add(heuristic),
                    heuristic,
                    insertion,
                    index: neighbor_index,
                }));
            }
        }

        None
    }

    fn neighbors(
        &self,
        coord: GridCoord,
        start_index: usize,
        goal_index: usize,
    ) -> Vec<(GridCoord, u32)> {
        let passable = |column: i64, row: i64| -> Option<GridCoord> {
            if column < 0 || row < 0 {
                return None;
            }
            let candidate = GridCoord::new(column as u32, row as u32);
            let index = self.index(candidate)?;
            if index == start_index || index == goal_index || !self.blocked[index] {
                Some(candidate)
            } else {
                None
            }
        };

        let column = i64::from(coord.column);
        let row = i64::from(coord.row);
        let mut found = Vec::with_capacity(8);

        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            if let Some(next) = passable(column + dx, row + dy) {
                found.push((next, STRAIGHT_COST));
            }
        }

        for (dx, dy) in [(1, 1), (1, -1), (-1, 1), (-1, -1)] {
            let side_a = passable(column + dx, row);
            let side_b = passable(column, row + dy);
            if side_a.is_none() || side_b.is_none() {
                continue;
            }
            if let Some(next) = passable(column + dx, row + dy) {
                found.push((next, DIAGONAL_COST));
            }
        }

        found
    }

    fn reconstruct(&self, parent: &[Option<usize>], goal_index: usize) -> Vec<GridCoord> {
        let mut path = vec![self.coord_at(goal_index)];
        let mut cursor = goal_index;
        while let Some(previous) = parent[cursor] {
            path.push(self.coord_at(previous));
            cursor = previous;
        }
        path.reverse();
        path
    }

    fn index(&self, coord: GridCoord) -> Option<usize> {
        if coord.column >= self.columns || coord.row >= self.rows {
            return None;
        }
        Some(coord.row as usize * self.columns as usize + coord.column as usize)
    }

    fn coord_at(&self, index: usize) -> GridCoord {
        let columns = self.columns as usize;
        GridCoord::new((index % columns) as u32, (index / columns) as u32)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenNode {
    estimate: u32,
    heuristic: u32,
    insertion: u64,
    index: usize,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.estimate
            .cmp(&other.estimate)
            .then(self.heuristic.cmp(&other.heuristic))
            .then(self.insertion.cmp(&other.insertion))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn octile_distance(a: GridCoord, b: GridCoord) -> u32 {
    let dx = a.column.abs_diff(b.column);
    let dy = a.row.abs_diff(b.row);
    let diagonal = dx.min(dy);
    let straight = dx.max(dy) - diagonal;
    diagonal * DIAGONAL_COST + straight * STRAIGHT_COST
}

/// Path search front-end that caches results per endpoint pair.
#[derive(Debug)]
pub struct Pathfinder {
    node_size: f32,
    grid: Option<PathGrid>,
    cache: HashMap<PathKey, Option<Vec<Vec2>>>,
    cache_limit: usize,
    searches: u64,
}

impl Pathfinder {
    /// Creates a pathfinder whose grid nodes measure `node_size` world units.
    #[must_use]
    pub fn new(node_size: f32) -> Self {
        Self {
            node_size,
            grid: None,
            cache: HashMap::new(),
            cache_limit: DEFAULT_CACHE_LIMIT,
            searches: 0,
        }
    }

    /// Caps the cache at `limit` endpoint pairs; a full cache is cleared
    /// before the next insert. A limit of zero disables caching.
    #[must_use]
    pub fn with_cache_limit(mut self, limit: usize) -> Self {
        self.cache_limit = limit;
        self
    }

    /// Finds a path of node centres from `origin` to `destination`.
    ///
    /// `footprints` is only consumed on a cache miss, when the obstacle grid
    /// is rebuilt from scratch. Moving `bounds` discards every cached path.
    /// Returns `None` when either endpoint lies outside the window or no
    /// route exists.
    pub fn find_path<I>(
        &mut self,
        origin: Vec2,
        destination: Vec2,
        bounds: Aabb,
        footprints: I,
    ) -> Option<Vec<Vec2>>
    where
        I: IntoIterator<Item = Aabb>,
    {
        if self.grid.as_ref().map(PathGrid::bounds) != Some(bounds) {
            self.cache.clear();
            self.grid = Some(PathGrid::new(bounds, self.node_size));
        }
        let grid = self.grid.as_mut()?;

        let key = PathKey {
            origin: grid.coord_of(origin)?,
            destination: grid.coord_of(destination)?,
        };
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        grid.rebuild(footprints);
        self.searches += 1;
        let path = grid.search(key.origin, key.destination).map(|nodes| {
            nodes
                .into_iter()
                .map(|coord| grid.position_of(coord))
                .collect::<Vec<_>>()
        });
        trace!(?key, found = path.is_some(), "path search");

        if self.cache.len() >= self.cache_limit {
            trace!(entries = self.cache.len(), "path cache full");
            self.cache.clear();
        }
        if self.cache_limit > 0 {
            let _ = self.cache.insert(key, path.clone());
        }
        path
    }

    /// Discards every cached path.
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    /// Most endpoint pairs held at once.
    #[must_use]
    pub fn cache_limit(&self) -> usize {
        self.cache_limit
    }

    /// Number of endpoint pairs currently cached.
    #[must_use]
    pub fn cached_paths(&self) -> usize {
        self.cache.len()
    }

    /// Number of searches executed since construction.
    #[must_use]
    pub fn searches(&self) -> u64 {
        self.searches
    }
}

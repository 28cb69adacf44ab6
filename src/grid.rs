use std::fmt;

use serde::{Deserialize, Serialize};

use crate::obstacles::ObstacleMap;

/// Integer cell coordinates. `x` is the column, `z` the row on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    pub x: i32,
    pub z: i32,
}

impl GridCoord {
    pub fn new(x: i32, z: i32) -> Self {
        GridCoord { x, z }
    }

    /// Number of cardinal steps between two cells
    pub fn manhattan(&self, other: &GridCoord) -> u32 {
        self.x.abs_diff(other.x) + self.z.abs_diff(other.z)
    }

    /// True when the two cells share an edge
    pub fn is_adjacent4(&self, other: &GridCoord) -> bool {
        self.manhattan(other) == 1
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.z)
    }
}

impl From<(i32, i32)> for GridCoord {
    fn from((x, z): (i32, i32)) -> Self {
        GridCoord { x, z }
    }
}

/// Continuous world-space position. `y` is height above the grid plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl WorldPos {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        WorldPos { x, y, z }
    }

    pub fn distance(&self, other: &WorldPos) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Step towards `target` by at most `max_delta`, never overshooting
    pub fn move_towards(&self, target: &WorldPos, max_delta: f32) -> WorldPos {
        let distance = self.distance(target);
        if distance <= max_delta || distance == 0.0 {
            return *target;
        }

        let scale = max_delta / distance;
        WorldPos {
            x: self.x + (target.x - self.x) * scale,
            y: self.y + (target.y - self.y) * scale,
            z: self.z + (target.z - self.z) * scale,
        }
    }

    /// Same position lifted by `dy`
    pub fn raised(&self, dy: f32) -> WorldPos {
        WorldPos {
            y: self.y + dy,
            ..*self
        }
    }
}

/// A single grid cell
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub coord: GridCoord,
    pub walkable: bool,
    /// Cell center on the ground plane: `(x, z) * tile_spacing`
    pub world_position: WorldPos,
}

/// Fixed-size square grid of nodes.
///
/// Nodes are stored densely with the same `x * size + z` indexing the
/// obstacle map uses. The shape never changes after construction; only the
/// walkable flags do.
#[derive(Debug, Clone)]
pub struct GridGraph {
    size: i32,
    tile_spacing: f32,
    nodes: Vec<Node>,
    obstacles: ObstacleMap,
    /// Incremented whenever a walkable flag changes
    revision: u64,
}

impl GridGraph {
    /// Create an obstacle-free grid with every node walkable
    pub fn new(size: i32, tile_spacing: f32) -> Self {
        Self::from_obstacles(ObstacleMap::new(size.max(0) as usize), tile_spacing)
    }

    /// Create a grid sized to `obstacles` whose walkable flags are seeded from it.
    ///
    /// The obstacle map is kept as the authored snapshot for `is_blocked`;
    /// from here on the node flags are what searches consult.
    pub fn from_obstacles(obstacles: ObstacleMap, tile_spacing: f32) -> Self {
        // ObstacleMap keeps its side within MAX_GRID_SIZE, so this fits
        let size = obstacles.size() as i32;
        let mut nodes = Vec::with_capacity(obstacles.cells().len());

        for x in 0..size {
            for z in 0..size {
                nodes.push(Node {
                    coord: GridCoord::new(x, z),
                    walkable: !obstacles.is_set(x, z),
                    world_position: WorldPos::new(
                        x as f32 * tile_spacing,
                        0.0,
                        z as f32 * tile_spacing,
                    ),
                });
            }
        }

        GridGraph {
            size,
            tile_spacing,
            nodes,
            obstacles,
            revision: 0,
        }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn tile_spacing(&self) -> f32 {
        self.tile_spacing
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn obstacles(&self) -> &ObstacleMap {
        &self.obstacles
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn in_bounds(&self, coord: GridCoord) -> bool {
        coord.x >= 0 && coord.x < self.size && coord.z >= 0 && coord.z < self.size
    }

    /// Dense index of a cell, or None outside the grid
    pub fn index_of(&self, coord: GridCoord) -> Option<usize> {
        if !self.in_bounds(coord) {
            return None;
        }
        Some((coord.x * self.size + coord.z) as usize)
    }

    pub fn cell_count(&self) -> usize {
        self.nodes.len()
    }

    /// Node stored at a dense index
    pub fn node_by_index(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Bounds-checked lookup; None outside `[0, size)`
    pub fn node_at(&self, x: i32, z: i32) -> Option<&Node> {
        let index = self.index_of(GridCoord::new(x, z))?;
        self.nodes.get(index)
    }

    pub fn node(&self, coord: GridCoord) -> Option<&Node> {
        self.node_at(coord.x, coord.z)
    }

    /// Quantize a world position to the cell whose center is nearest.
    ///
    /// Every world-to-grid conversion in the crate goes through here. Cell
    /// centers sit at `(x, z) * tile_spacing`, so a cell covers half a tile
    /// on either side of its center.
    pub fn world_to_grid(&self, pos: &WorldPos) -> GridCoord {
        let x = (pos.x / self.tile_spacing + 0.5).floor() as i32;
        let z = (pos.z / self.tile_spacing + 0.5).floor() as i32;
        GridCoord::new(x, z)
    }

    /// Center of a cell on the ground plane. Defined for out-of-grid cells too.
    pub fn grid_to_world(&self, coord: GridCoord) -> WorldPos {
        WorldPos::new(
            coord.x as f32 * self.tile_spacing,
            0.0,
            coord.z as f32 * self.tile_spacing,
        )
    }

    pub fn node_from_world_position(&self, pos: &WorldPos) -> Option<&Node> {
        self.node(self.world_to_grid(pos))
    }

    /// Up to four edge-adjacent nodes, in the order -x, +x, -z, +z
    pub fn neighbors4(&self, coord: GridCoord) -> impl Iterator<Item = &Node> + '_ {
        const OFFSETS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        OFFSETS
            .into_iter()
            .filter_map(move |(dx, dz)| self.node_at(coord.x + dx, coord.z + dz))
    }

    /// Scans the 3x3 window around `coord` but skips diagonals and the center,
    /// leaving the cardinal neighbors in the order (-1,0), (0,-1), (0,1), (1,0).
    pub fn neighbors8_non_diagonal(&self, coord: GridCoord) -> impl Iterator<Item = &Node> + '_ {
        (-1..=1)
            .flat_map(|dx: i32| (-1..=1).map(move |dz: i32| (dx, dz)))
            .filter(|(dx, dz)| dx.abs() != dz.abs())
            .filter_map(move |(dx, dz)| self.node_at(coord.x + dx, coord.z + dz))
    }

    /// Authored obstacle bit for a cell. Out of bounds counts as blocked.
    pub fn is_blocked(&self, x: i32, z: i32) -> bool {
        if !self.in_bounds(GridCoord::new(x, z)) {
            return true;
        }
        self.obstacles.is_set(x, z)
    }

    /// The one traversability query both search variants use
    pub fn is_traversable(&self, coord: GridCoord) -> bool {
        self.node(coord).map(|node| node.walkable).unwrap_or(false)
    }

    /// Mark the node under `pos` as not walkable. Returns false when `pos` is off the grid.
    pub fn set_obstacle(&mut self, pos: &WorldPos) -> bool {
        let coord = self.world_to_grid(pos);
        self.set_walkable_at(coord, false)
    }

    /// Mark the node under `pos` as walkable. Returns false when `pos` is off the grid.
    pub fn set_walkable(&mut self, pos: &WorldPos) -> bool {
        let coord = self.world_to_grid(pos);
        self.set_walkable_at(coord, true)
    }

    pub fn set_walkable_at(&mut self, coord: GridCoord, walkable: bool) -> bool {
        let Some(index) = self.index_of(coord) else {
            return false;
        };
        let node = &mut self.nodes[index];
        if node.walkable != walkable {
            node.walkable = walkable;
            self.revision += 1;
        }
        true
    }
}

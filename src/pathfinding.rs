use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::grid::{GridCoord, GridGraph};

/// Ordered steps from (exclusive) start to (inclusive) target
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Path {
    steps: Vec<GridCoord>,
}

impl Path {
    pub fn new(steps: Vec<GridCoord>) -> Self {
        Path { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[GridCoord] {
        &self.steps
    }

    pub fn first(&self) -> Option<GridCoord> {
        self.steps.first().copied()
    }

    pub fn last(&self) -> Option<GridCoord> {
        self.steps.last().copied()
    }

    /// Accumulated unit step cost, i.e. the target's gCost
    pub fn cost(&self) -> u32 {
        self.steps.len() as u32
    }

    pub fn iter(&self) -> impl Iterator<Item = &GridCoord> {
        self.steps.iter()
    }

    pub fn into_steps(self) -> Vec<GridCoord> {
        self.steps
    }
}

/// Endpoint problems detected before any search runs.
///
/// A search that runs and finds nothing is not an error; it returns `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("start {0} is outside the grid")]
    StartOutOfBounds(GridCoord),
    #[error("target {0} is outside the grid")]
    TargetOutOfBounds(GridCoord),
    #[error("target {0} is not traversable")]
    TargetNotTraversable(GridCoord),
}

/// Which search an actor plans with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchAlgorithm {
    #[default]
    Bfs,
    #[serde(rename = "astar")]
    AStar,
}

pub type SearchResult = Result<Option<Path>, PathError>;

pub fn find_path(
    algorithm: SearchAlgorithm,
    grid: &GridGraph,
    start: GridCoord,
    target: GridCoord,
) -> SearchResult {
    find_path_with(algorithm, grid, start, target, |_| false)
}

/// Dispatch to the chosen search with an extra occupancy filter
pub fn find_path_with<F>(
    algorithm: SearchAlgorithm,
    grid: &GridGraph,
    start: GridCoord,
    target: GridCoord,
    is_occupied: F,
) -> SearchResult
where
    F: Fn(GridCoord) -> bool,
{
    match algorithm {
        SearchAlgorithm::Bfs => find_path_bfs_with(grid, start, target, is_occupied),
        SearchAlgorithm::AStar => find_path_astar_with(grid, start, target, is_occupied),
    }
}

fn validate_endpoints(grid: &GridGraph, start: GridCoord, target: GridCoord) -> Result<(), PathError> {
    if !grid.in_bounds(start) {
        return Err(PathError::StartOutOfBounds(start));
    }
    if !grid.in_bounds(target) {
        return Err(PathError::TargetOutOfBounds(target));
    }
    if !grid.is_traversable(target) {
        return Err(PathError::TargetNotTraversable(target));
    }
    Ok(())
}

/// Walk parent links back from `target` and return the steps after `start`
fn reconstruct_path(grid: &GridGraph, parents: &[Option<usize>], start: usize, target: usize) -> Path {
    let mut steps = Vec::new();
    let mut current = target;

    while current != start {
        if let Some(node) = grid.node_by_index(current) {
            steps.push(node.coord);
        }
        match parents[current] {
            Some(parent) => current = parent,
            None => break,
        }
    }

    steps.reverse();
    Path::new(steps)
}

/// Unweighted shortest path over the four cardinal neighbors
pub fn find_path_bfs(grid: &GridGraph, start: GridCoord, target: GridCoord) -> SearchResult {
    find_path_bfs_with(grid, start, target, |_| false)
}

/// Breadth-first search that also skips cells for which `is_occupied` holds.
///
/// Each cell is enqueued at most once, so the first discovery fixes its
/// parent. Neighbors are expanded in the order -x, +x, -z, +z.
pub fn find_path_bfs_with<F>(
    grid: &GridGraph,
    start: GridCoord,
    target: GridCoord,
    is_occupied: F,
) -> SearchResult
where
    F: Fn(GridCoord) -> bool,
{
    validate_endpoints(grid, start, target)?;

    let (Some(start_index), Some(target_index)) = (grid.index_of(start), grid.index_of(target)) else {
        return Ok(None);
    };

    let mut visited = vec![false; grid.cell_count()];
    let mut parents: Vec<Option<usize>> = vec![None; grid.cell_count()];
    let mut queue = VecDeque::new();

    visited[start_index] = true;
    queue.push_back(start_index);

    let mut expanded = 0;
    while let Some(current) = queue.pop_front() {
        expanded += 1;

        if current == target_index {
            let path = reconstruct_path(grid, &parents, start_index, target_index);
            debug!(%start, %target, steps = path.len(), expanded, "bfs found path");
            return Ok(Some(path));
        }

        let Some(node) = grid.node_by_index(current) else {
            continue;
        };

        for neighbor in grid.neighbors4(node.coord) {
            if !neighbor.walkable || is_occupied(neighbor.coord) {
                continue;
            }
            let Some(index) = grid.index_of(neighbor.coord) else {
                continue;
            };
            if visited[index] {
                continue;
            }
            visited[index] = true;
            parents[index] = Some(current);
            queue.push_back(index);
        }
    }

    debug!(%start, %target, expanded, "bfs found no path");
    Ok(None)
}

/// Search-scoped cost record for one node
#[derive(Debug, Clone, Copy)]
struct Score {
    g: u32,
    h: u32,
    /// Order of first admission to the open set
    seq: u64,
}

/// Heap entry; stale once the node's recorded `g` has dropped below `g`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenEntry {
    f: u32,
    h: u32,
    seq: u64,
    g: u32,
    index: usize,
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap: lowest f, then lowest h, then earliest admitted
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Cost-weighted shortest path with a Manhattan heuristic
pub fn find_path_astar(grid: &GridGraph, start: GridCoord, target: GridCoord) -> SearchResult {
    find_path_astar_with(grid, start, target, |_| false)
}

/// A* that also skips cells for which `is_occupied` holds.
///
/// The open node picked each round is the one with the lowest fCost, ties
/// going to the lower hCost and then to whichever node entered the open set
/// first. A node whose cost improves keeps its admission order.
pub fn find_path_astar_with<F>(
    grid: &GridGraph,
    start: GridCoord,
    target: GridCoord,
    is_occupied: F,
) -> SearchResult
where
    F: Fn(GridCoord) -> bool,
{
    validate_endpoints(grid, start, target)?;

    let (Some(start_index), Some(target_index)) = (grid.index_of(start), grid.index_of(target)) else {
        return Ok(None);
    };

    let mut scores: Vec<Option<Score>> = vec![None; grid.cell_count()];
    let mut parents: Vec<Option<usize>> = vec![None; grid.cell_count()];
    let mut closed = vec![false; grid.cell_count()];
    let mut open = BinaryHeap::new();
    let mut next_seq = 0u64;

    let start_h = start.manhattan(&target);
    scores[start_index] = Some(Score {
        g: 0,
        h: start_h,
        seq: next_seq,
    });
    open.push(OpenEntry {
        f: start_h,
        h: start_h,
        seq: next_seq,
        g: 0,
        index: start_index,
    });
    next_seq += 1;

    let mut expanded = 0;
    while let Some(entry) = open.pop() {
        let current = entry.index;
        if closed[current] {
            continue;
        }
        let Some(current_score) = scores[current] else {
            continue;
        };
        if entry.g != current_score.g {
            continue;
        }

        closed[current] = true;
        expanded += 1;

        if current == target_index {
            let path = reconstruct_path(grid, &parents, start_index, target_index);
            debug!(%start, %target, cost = current_score.g, expanded, "astar found path");
            return Ok(Some(path));
        }

        let Some(node) = grid.node_by_index(current) else {
            continue;
        };

        for neighbor in grid.neighbors8_non_diagonal(node.coord) {
            if !neighbor.walkable || is_occupied(neighbor.coord) {
                continue;
            }
            let Some(index) = grid.index_of(neighbor.coord) else {
                continue;
            };
            if closed[index] {
                continue;
            }

            let tentative_g = current_score.g + node.coord.manhattan(&neighbor.coord);
            let seq = match scores[index] {
                Some(existing) if tentative_g >= existing.g => continue,
                Some(existing) => existing.seq,
                None => {
                    let seq = next_seq;
                    next_seq += 1;
                    seq
                }
            };

            let h = neighbor.coord.manhattan(&target);
            scores[index] = Some(Score { g: tentative_g, h, seq });
            parents[index] = Some(current);
            open.push(OpenEntry {
                f: tentative_g + h,
                h,
                seq,
                g: tentative_g,
                index,
            });
        }

        trace!(node = %node.coord, open = open.len(), "astar expanded");
    }

    debug!(%start, %target, expanded, "astar found no path");
    Ok(None)
}

/// Format path for display
pub fn format_path(path: &Path) -> String {
    if path.is_empty() {
        return "No path".to_string();
    }

    path.iter()
        .map(|coord| coord.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

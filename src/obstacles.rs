use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::GridCoord;

#[derive(Debug, Error)]
pub enum ObstacleError {
    #[error("obstacle map for a {size}x{size} grid needs {expected} cells, got {actual}")]
    CellCount {
        size: usize,
        expected: usize,
        actual: usize,
    },
    #[error("obstacle map side {size} exceeds the limit of {max}", max = MAX_GRID_SIZE)]
    TooLarge { size: usize },
    #[error("layout is not square: line {line} has {width} cells, expected {expected}")]
    RaggedLayout {
        line: usize,
        width: usize,
        expected: usize,
    },
    #[error("unknown layout character {ch:?} on line {line}")]
    UnknownCell { line: usize, ch: char },
    #[error("failed to read obstacle store: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse obstacle store: {0}")]
    Json(#[from] serde_json::Error),
}

/// Largest grid side whose cell count still fits an `i32` index
pub const MAX_GRID_SIZE: usize = 46_340;

/// Authored blocked cells for a `size x size` grid.
///
/// Cells are indexed as `x * size + z`. The map is produced out of band and
/// is only read by the grid at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleMap {
    size: usize,
    cells: Vec<bool>,
}

impl ObstacleMap {
    /// Map with no blocked cells. Sides above `MAX_GRID_SIZE` are clamped.
    pub fn new(size: usize) -> Self {
        let size = size.min(MAX_GRID_SIZE);
        ObstacleMap {
            size,
            cells: vec![false; size * size],
        }
    }

    pub fn from_cells(size: usize, cells: Vec<bool>) -> Result<Self, ObstacleError> {
        if size > MAX_GRID_SIZE {
            return Err(ObstacleError::TooLarge { size });
        }
        let expected = size * size;
        if cells.len() != expected {
            return Err(ObstacleError::CellCount {
                size,
                expected,
                actual: cells.len(),
            });
        }
        Ok(ObstacleMap { size, cells })
    }

    /// Map with the given cells blocked; coordinates outside the grid are ignored
    pub fn from_blocked(size: usize, blocked: &[GridCoord]) -> Self {
        let mut map = Self::new(size);
        for coord in blocked {
            map.set(coord.x, coord.z, true);
        }
        map
    }

    /// Parse a text layout: one line per `x`, one character per `z`.
    ///
    /// `#` or `■` is blocked, `.` or `□` is free. Blank lines are skipped.
    pub fn from_layout(layout: &str) -> Result<Self, ObstacleError> {
        let lines: Vec<&str> = layout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let size = lines.len();
        let mut cells = Vec::with_capacity(size * size);

        for (line_no, line) in lines.iter().enumerate() {
            let width = line.chars().count();
            if width != size {
                return Err(ObstacleError::RaggedLayout {
                    line: line_no + 1,
                    width,
                    expected: size,
                });
            }

            for ch in line.chars() {
                match ch {
                    '#' | '■' => cells.push(true),
                    '.' | '□' => cells.push(false),
                    _ => {
                        return Err(ObstacleError::UnknownCell {
                            line: line_no + 1,
                            ch,
                        })
                    }
                }
            }
        }

        Self::from_cells(size, cells)
    }

    /// Render as a text layout accepted by `from_layout`
    pub fn to_layout(&self) -> String {
        let mut result = String::with_capacity(self.size * (self.size + 1));
        for x in 0..self.size {
            for z in 0..self.size {
                result.push(if self.cells[x * self.size + z] { '#' } else { '.' });
            }
            result.push('\n');
        }
        result
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    fn index(&self, x: i32, z: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let z = usize::try_from(z).ok()?;
        if x >= self.size || z >= self.size {
            return None;
        }
        Some(x * self.size + z)
    }

    /// Whether the cell is marked. False outside the grid.
    pub fn is_set(&self, x: i32, z: i32) -> bool {
        self.index(x, z).map(|i| self.cells[i]).unwrap_or(false)
    }

    pub fn set(&mut self, x: i32, z: i32, blocked: bool) {
        if let Some(i) = self.index(x, z) {
            self.cells[i] = blocked;
        }
    }

    pub fn blocked_count(&self) -> usize {
        self.cells.iter().filter(|&&blocked| blocked).count()
    }

    /// Load from a JSON obstacle store
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ObstacleError> {
        let json = fs::read_to_string(path)?;
        let map: ObstacleMap = serde_json::from_str(&json)?;
        // Reject stores whose cell array disagrees with their size
        Self::from_cells(map.size, map.cells)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ObstacleError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexing_is_x_major() {
        let map = ObstacleMap::from_blocked(10, &[GridCoord::new(2, 7)]);
        assert!(map.cells()[2 * 10 + 7]);
        assert!(map.is_set(2, 7));
        assert!(!map.is_set(7, 2));
        assert_eq!(map.blocked_count(), 1);
    }

    #[test]
    fn out_of_bounds_is_never_set() {
        let mut map = ObstacleMap::new(3);
        map.set(-1, 0, true);
        map.set(3, 0, true);
        assert_eq!(map.blocked_count(), 0);
        assert!(!map.is_set(-1, 0));
    }

    #[test]
    fn cell_count_must_match_size() {
        let err = ObstacleMap::from_cells(3, vec![false; 8]).unwrap_err();
        assert!(matches!(
            err,
            ObstacleError::CellCount {
                expected: 9,
                actual: 8,
                ..
            }
        ));
    }

    #[test]
    fn oversized_side_is_rejected_before_allocating() {
        let err = ObstacleMap::from_cells(usize::MAX, Vec::new()).unwrap_err();
        assert!(matches!(err, ObstacleError::TooLarge { size: usize::MAX }));
        assert!(ObstacleMap::from_cells(MAX_GRID_SIZE + 1, Vec::new()).is_err());
    }

    #[test]
    fn layout_lines_are_rows_of_x() {
        let map = ObstacleMap::from_layout(
            "
            ...
            #..
            ..■
            ",
        )
        .unwrap();

        assert_eq!(map.size(), 3);
        assert!(map.is_set(1, 0));
        assert!(map.is_set(2, 2));
        assert_eq!(map.blocked_count(), 2);
        assert_eq!(map.to_layout(), "...\n#..\n..#\n");
    }

    #[test]
    fn layout_rejects_bad_input() {
        assert!(matches!(
            ObstacleMap::from_layout("..\n...\n"),
            Err(ObstacleError::RaggedLayout { line: 2, .. })
        ));
        assert!(matches!(
            ObstacleMap::from_layout("..\n.x\n"),
            Err(ObstacleError::UnknownCell { line: 2, ch: 'x' })
        ));
    }
}

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::{Cell, Position};

/// Represents errors that can occur within the grid operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Coordinates ({x}, {y}) are out of bounds for grid size ({width}, {height})")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
}

/// A generic 2D grid structure.
///
/// Stores elements of type `T` in a flat vector using row-major order.
/// Provides methods for accessing and modifying elements via [`Position`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a new grid with the specified dimensions, filled with default values.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` overflows `usize`.
    pub fn new(width: usize, height: usize) -> Self
    where
        T: Default + Clone,
    {
        let size = width.checked_mul(height).expect("Grid size overflow");
        Grid {
            width,
            height,
            cells: vec![T::default(); size],
        }
    }

    /// Returns the width of the grid.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height of the grid.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Converts a position to a flat vector index.
    ///
    /// Returns `None` if the position is out of bounds.
    #[inline]
    fn index_of(&self, pos: Position) -> Option<usize> {
        if self.contains(pos) {
            Some(pos.y * self.width + pos.x)
        } else {
            None
        }
    }

    /// Checks if the given position is within the grid boundaries.
    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Gets an immutable reference to the cell at the given position.
    ///
    /// Returns `None` if the position is out of bounds.
    pub fn get(&self, pos: Position) -> Option<&T> {
        self.index_of(pos).map(|index| &self.cells[index])
    }

    /// Sets the value of the cell at the given position.
    ///
    /// Returns `Ok(())` on success, or `Err(GridError::OutOfBounds)` if the
    /// position is invalid.
    pub fn set(&mut self, pos: Position, value: T) -> Result<(), GridError> {
        let index = self.index_of(pos).ok_or(GridError::OutOfBounds {
            x: pos.x,
            y: pos.y,
            width: self.width,
            height: self.height,
        })?;
        self.cells[index] = value;
        Ok(())
    }

    /// Returns an iterator that yields `(Position, &T)` for each cell.
    pub fn enumerate(&self) -> impl Iterator<Item = (Position, &T)> {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, cell)| (Position::new(index % width, index / width), cell))
    }

    /// Returns the rows of the grid, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        self.cells.chunks(self.width.max(1))
    }
}

/// Occupancy queries used by every motion computation.
///
/// Out-of-bounds positions are never indexed; they read as blocked.
impl Grid<Cell> {
    /// Returns what occupies `pos`, or `None` when `pos` is outside the grid.
    pub fn occupant_at(&self, pos: Position) -> Option<Cell> {
        self.get(pos).copied()
    }

    /// True if a player may walk onto `pos`: the cell is in bounds and is
    /// either empty or the goal.
    pub fn is_free(&self, pos: Position) -> bool {
        matches!(self.occupant_at(pos), Some(Cell::Empty | Cell::Goal))
    }

    /// True if `pos` is in bounds and holds nothing at all.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.occupant_at(pos) == Some(Cell::Empty)
    }

    /// Counts cells holding `cell`.
    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|c| **c == cell).count()
    }
}

/// Indexing using Position coordinates for access
impl<T> Index<Position> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, pos: Position) -> &Self::Output {
        match self.index_of(pos) {
            Some(idx) => &self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                pos.x, pos.y, self.width, self.height
            ),
        }
    }
}

/// Indexing using Position coordinates for mutable access
impl<T> IndexMut<Position> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, pos: Position) -> &mut Self::Output {
        let (width, height) = (self.width, self.height);
        match self.index_of(pos) {
            Some(idx) => &mut self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                pos.x, pos.y, width, height
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_out_of_bounds_is_rejected() {
        let mut grid: Grid<Cell> = Grid::new(3, 3);
        let err = grid.set(Position::new(3, 0), Cell::Trap).unwrap_err();
        assert_eq!(
            err,
            GridError::OutOfBounds {
                x: 3,
                y: 0,
                width: 3,
                height: 3
            }
        );
        assert_eq!(grid.count(Cell::Trap), 0);
    }

    #[test]
    fn goal_is_free_but_not_empty() {
        let mut grid: Grid<Cell> = Grid::new(4, 4);
        let goal = Position::new(2, 2);
        grid[goal] = Cell::Goal;
        assert!(grid.is_free(goal));
        assert!(!grid.is_empty(goal));
    }

    #[test]
    fn occupied_and_outside_cells_are_blocked() {
        let mut grid: Grid<Cell> = Grid::new(4, 4);
        for cell in [Cell::Obstacle, Cell::Collectible, Cell::Trap, Cell::Player1] {
            grid[Position::new(1, 1)] = cell;
            assert!(!grid.is_free(Position::new(1, 1)), "{cell:?} should block");
        }
        assert!(!grid.is_free(Position::new(4, 0)));
        assert_eq!(grid.occupant_at(Position::new(0, 9)), None);
    }

    #[test]
    fn enumerate_is_row_major() {
        let mut grid: Grid<Cell> = Grid::new(3, 2);
        grid[Position::new(2, 1)] = Cell::Goal;
        let (pos, _) = grid
            .enumerate()
            .find(|(_, cell)| **cell == Cell::Goal)
            .unwrap();
        assert_eq!(pos, Position::new(2, 1));
        assert_eq!(grid.rows().count(), 2);
    }
}

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    Cell, PlayerSlot, Position,
    map::{Grid, GridError},
};

/// Axis a patrolling obstacle currently moves along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Axis {
    #[default]
    Horizontal,
    Vertical,
}

impl Axis {
    pub fn flipped(self) -> Axis {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }
}

/// How an obstacle picks its next cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    /// Steps greedily toward player one.
    Chasing,
    /// Steps randomly along `axis`, switching axis whenever a step is blocked.
    Patrolling { axis: Axis },
}

impl Behavior {
    pub fn is_chasing(&self) -> bool {
        matches!(self, Behavior::Chasing)
    }
}

/// A mobile obstacle on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obstacle {
    pub position: Position,
    pub behavior: Behavior,
}

/// Errors raised while populating a board.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("Cell ({}, {}) is already occupied by {occupant:?}", .position.x, .position.y)]
    Occupied { position: Position, occupant: Cell },
}

/// The playing field: the occupancy grid plus every entity collection that
/// mirrors it.
///
/// All mutation goes through methods that keep the grid and the collections
/// in agreement. The board is not synchronised itself; the session keeps it
/// behind a single lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    grid: Grid<Cell>,
    players: [Option<Position>; 2],
    goal: Position,
    obstacles: Vec<Obstacle>,
    collectibles: HashSet<Position>,
    traps: HashSet<Position>,
}

impl Board {
    /// Creates a `size` x `size` board holding nothing but the goal.
    pub fn new(size: usize, goal: Position) -> Result<Self, BoardError> {
        let mut grid = Grid::new(size, size);
        grid.set(goal, Cell::Goal)?;
        Ok(Board {
            grid,
            players: [None; 2],
            goal,
            obstacles: Vec::new(),
            collectibles: HashSet::new(),
            traps: HashSet::new(),
        })
    }

    pub fn grid(&self) -> &Grid<Cell> {
        &self.grid
    }

    pub fn size(&self) -> usize {
        self.grid.width()
    }

    pub fn goal(&self) -> Position {
        self.goal
    }

    pub fn player(&self, slot: PlayerSlot) -> Option<Position> {
        self.players[slot.index()]
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn collectibles(&self) -> &HashSet<Position> {
        &self.collectibles
    }

    pub fn traps(&self) -> &HashSet<Position> {
        &self.traps
    }

    /// Number of cells that currently hold nothing.
    pub fn free_cells(&self) -> usize {
        self.grid.count(Cell::Empty)
    }

    /// Claims an empty cell for a new entity.
    fn claim(&mut self, position: Position, cell: Cell) -> Result<(), BoardError> {
        match self.grid.occupant_at(position) {
            Some(Cell::Empty) => {
                self.grid.set(position, cell)?;
                Ok(())
            }
            Some(occupant) => Err(BoardError::Occupied { position, occupant }),
            None => Err(BoardError::Grid(GridError::OutOfBounds {
                x: position.x,
                y: position.y,
                width: self.grid.width(),
                height: self.grid.height(),
            })),
        }
    }

    /// Places a player on an empty cell.
    pub fn place_player(&mut self, slot: PlayerSlot, position: Position) -> Result<(), BoardError> {
        self.claim(position, slot.cell())?;
        self.players[slot.index()] = Some(position);
        Ok(())
    }

    /// Places an obstacle on an empty cell and returns its index.
    pub fn place_obstacle(
        &mut self,
        position: Position,
        behavior: Behavior,
    ) -> Result<usize, BoardError> {
        self.claim(position, Cell::Obstacle)?;
        self.obstacles.push(Obstacle { position, behavior });
        Ok(self.obstacles.len() - 1)
    }

    pub fn place_collectible(&mut self, position: Position) -> Result<(), BoardError> {
        self.claim(position, Cell::Collectible)?;
        self.collectibles.insert(position);
        Ok(())
    }

    pub fn place_trap(&mut self, position: Position) -> Result<(), BoardError> {
        self.claim(position, Cell::Trap)?;
        self.traps.insert(position);
        Ok(())
    }

    /// Moves obstacle `index` to `to` if `to` is in bounds and empty.
    ///
    /// Returns whether the move was committed. On success the source cell is
    /// cleared, the destination becomes `Obstacle` and the stored position is
    /// updated, all in one call.
    pub fn move_obstacle(&mut self, index: usize, to: Position) -> bool {
        if !self.grid.is_empty(to) {
            return false;
        }
        let Some(obstacle) = self.obstacles.get_mut(index) else {
            return false;
        };
        let from = obstacle.position;
        obstacle.position = to;
        self.grid[from] = Cell::Empty;
        self.grid[to] = Cell::Obstacle;
        true
    }

    /// Switches the patrol axis of obstacle `index`. Chasing obstacles are
    /// left untouched.
    pub fn flip_axis(&mut self, index: usize) {
        if let Some(Obstacle {
            behavior: Behavior::Patrolling { axis },
            ..
        }) = self.obstacles.get_mut(index)
        {
            *axis = axis.flipped();
        }
    }

    /// Removes the collectible at `position`, returning whether one was there.
    pub fn take_collectible(&mut self, position: Position) -> bool {
        let taken = self.collectibles.remove(&position);
        if taken {
            self.grid[position] = Cell::Empty;
        }
        taken
    }

    /// Removes the trap at `position`, returning whether one was there.
    pub fn take_trap(&mut self, position: Position) -> bool {
        let taken = self.traps.remove(&position);
        if taken {
            self.grid[position] = Cell::Empty;
        }
        taken
    }

    /// Vacates the player's current cell and marks `to` as theirs.
    ///
    /// The vacated cell reverts to `Goal` if it was the goal. Callers are
    /// expected to have validated `to`.
    pub fn relocate_player(&mut self, slot: PlayerSlot, to: Position) {
        if let Some(from) = self.players[slot.index()] {
            self.grid[from] = if from == self.goal {
                Cell::Goal
            } else {
                Cell::Empty
            };
        }
        self.players[slot.index()] = Some(to);
        self.grid[to] = slot.cell();
    }

    /// Lists every way the grid disagrees with the entity collections.
    ///
    /// An empty result means the board is consistent.
    pub fn violations(&self) -> Vec<String> {
        let mut problems = Vec::new();

        for slot in [PlayerSlot::One, PlayerSlot::Two] {
            let marked = self.grid.count(slot.cell());
            match self.player(slot) {
                Some(pos) if self.grid.occupant_at(pos) != Some(slot.cell()) => {
                    problems.push(format!("{slot:?} tracked at {pos:?} but not marked there"));
                }
                Some(_) if marked != 1 => {
                    problems.push(format!("{slot:?} marked on {marked} cells"));
                }
                None if marked != 0 => {
                    problems.push(format!("{slot:?} absent but marked on {marked} cells"));
                }
                _ => {}
            }
        }

        let on_goal = self
            .players
            .iter()
            .flatten()
            .any(|pos| *pos == self.goal);
        let goals = self.grid.count(Cell::Goal);
        if goals != usize::from(!on_goal) {
            problems.push(format!("{goals} goal cells on the grid"));
        }

        let mut seen = HashSet::new();
        for obstacle in &self.obstacles {
            if !seen.insert(obstacle.position) {
                problems.push(format!("two obstacles share {:?}", obstacle.position));
            }
            if self.grid.occupant_at(obstacle.position) != Some(Cell::Obstacle) {
                problems.push(format!("obstacle at {:?} not marked", obstacle.position));
            }
        }
        let marked = self.grid.count(Cell::Obstacle);
        if marked != self.obstacles.len() {
            problems.push(format!(
                "{marked} obstacle cells for {} obstacles",
                self.obstacles.len()
            ));
        }

        for (set, cell) in [
            (&self.collectibles, Cell::Collectible),
            (&self.traps, Cell::Trap),
        ] {
            if self.grid.count(cell) != set.len() {
                problems.push(format!("{cell:?} cells disagree with tracked set"));
            }
            for pos in set {
                if self.grid.occupant_at(*pos) != Some(cell) {
                    problems.push(format!("{cell:?} at {pos:?} not marked"));
                }
            }
        }

        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> Board {
        Board::new(5, Position::new(3, 3)).unwrap()
    }

    #[test]
    fn placing_on_occupied_cell_fails() {
        let mut board = board();
        board.place_trap(Position::new(1, 1)).unwrap();
        let err = board
            .place_obstacle(Position::new(1, 1), Behavior::Chasing)
            .unwrap_err();
        assert_eq!(
            err,
            BoardError::Occupied {
                position: Position::new(1, 1),
                occupant: Cell::Trap
            }
        );
        assert!(board.place_collectible(Position::new(3, 3)).is_err());
        assert!(board.place_collectible(Position::new(5, 0)).is_err());
        assert!(board.violations().is_empty());
    }

    #[test]
    fn obstacle_only_moves_onto_empty_cells() {
        let mut board = board();
        let idx = board
            .place_obstacle(Position::new(2, 2), Behavior::Chasing)
            .unwrap();
        assert!(!board.move_obstacle(idx, Position::new(3, 3)), "goal");
        board.place_collectible(Position::new(2, 1)).unwrap();
        assert!(!board.move_obstacle(idx, Position::new(2, 1)), "collectible");
        assert!(board.move_obstacle(idx, Position::new(1, 2)));

        assert_eq!(board.grid()[Position::new(2, 2)], Cell::Empty);
        assert_eq!(board.grid()[Position::new(1, 2)], Cell::Obstacle);
        assert_eq!(board.obstacles()[0].position, Position::new(1, 2));
        assert!(board.violations().is_empty());
    }

    #[test]
    fn flip_axis_ignores_chasers() {
        let mut board = board();
        board
            .place_obstacle(Position::new(0, 0), Behavior::Chasing)
            .unwrap();
        board
            .place_obstacle(
                Position::new(4, 0),
                Behavior::Patrolling {
                    axis: Axis::Horizontal,
                },
            )
            .unwrap();
        board.flip_axis(0);
        board.flip_axis(1);
        assert_eq!(board.obstacles()[0].behavior, Behavior::Chasing);
        assert_eq!(
            board.obstacles()[1].behavior,
            Behavior::Patrolling {
                axis: Axis::Vertical
            }
        );
    }

    #[test]
    fn relocating_off_goal_restores_it() {
        let mut board = board();
        board
            .place_player(PlayerSlot::One, Position::new(3, 2))
            .unwrap();
        board.relocate_player(PlayerSlot::One, Position::new(3, 3));
        assert_eq!(board.grid().count(Cell::Goal), 0);
        assert!(board.violations().is_empty());

        board.relocate_player(PlayerSlot::One, Position::new(3, 4));
        assert_eq!(board.grid()[Position::new(3, 3)], Cell::Goal);
        assert!(board.violations().is_empty());
    }

    #[test]
    fn violations_detects_desync() {
        let mut board = board();
        board
            .place_obstacle(Position::new(0, 0), Behavior::Chasing)
            .unwrap();
        board.grid[Position::new(0, 0)] = Cell::Empty;
        assert!(!board.violations().is_empty());
    }
}

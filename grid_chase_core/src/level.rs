use rand::Rng;
use tracing::{debug, warn};

use crate::{
    GRID_SIZE, Mode, PlayerSlot, Position,
    board::{Axis, Behavior, Board, BoardError},
};

/// Errors produced while building a level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LevelError {
    #[error("level {level} needs {requested} free cells but only {free} remain")]
    Overcrowded {
        level: u32,
        requested: usize,
        free: usize,
    },
    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Seconds on the clock at the start of `level`.
pub fn time_budget(level: u32) -> u32 {
    30u32.saturating_sub(level.saturating_mul(5)).max(10)
}

/// Entity counts for one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Population {
    pub obstacles: usize,
    pub collectibles: usize,
    pub traps: usize,
}

impl Population {
    pub fn for_level(level: u32) -> Self {
        let level = level as usize;
        Population {
            obstacles: 3 + level,
            collectibles: level,
            traps: level,
        }
    }

    pub fn total(&self) -> usize {
        self.obstacles + self.collectibles + self.traps
    }
}

/// Builds fresh boards for each level.
#[derive(Debug, Clone, Copy)]
pub struct LevelGenerator {
    size: usize,
    mode: Mode,
}

impl LevelGenerator {
    /// A generator for the standard 10x10 field.
    pub fn new(mode: Mode) -> Self {
        Self::with_size(GRID_SIZE, mode)
    }

    /// A generator for a `size` x `size` field. Sizes below 4 cannot hold the
    /// fixed start and goal cells apart and are clamped up.
    pub fn with_size(size: usize, mode: Mode) -> Self {
        LevelGenerator {
            size: size.max(4),
            mode,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn goal(&self) -> Position {
        Position::new(self.size - 2, self.size - 2)
    }

    pub fn start(&self, slot: PlayerSlot) -> Position {
        match slot {
            PlayerSlot::One => Position::new(1, 1),
            PlayerSlot::Two => Position::new(self.size - 2, 1),
        }
    }

    /// Builds the board for `level`.
    ///
    /// Players and goal go to their fixed cells, then obstacles (alternating
    /// chasing and patrolling, chasing first), collectibles and traps are
    /// dropped on uniformly random empty cells. Fails with
    /// [`LevelError::Overcrowded`] instead of sampling forever when the board
    /// cannot hold them all.
    pub fn generate<R: Rng + ?Sized>(&self, level: u32, rng: &mut R) -> Result<Board, LevelError> {
        let mut board = Board::new(self.size, self.goal())?;
        for slot in self.mode.players() {
            board.place_player(*slot, self.start(*slot))?;
        }

        let population = Population::for_level(level);
        let free = board.free_cells();
        if population.total() > free {
            warn!(level, requested = population.total(), free, "level does not fit");
            return Err(LevelError::Overcrowded {
                level,
                requested: population.total(),
                free,
            });
        }

        for i in 0..population.obstacles {
            let behavior = if i % 2 == 0 {
                Behavior::Chasing
            } else {
                Behavior::Patrolling {
                    axis: Axis::Horizontal,
                }
            };
            let cell = sample_empty(&board, rng);
            board.place_obstacle(cell, behavior)?;
        }
        for _ in 0..population.collectibles {
            let cell = sample_empty(&board, rng);
            board.place_collectible(cell)?;
        }
        for _ in 0..population.traps {
            let cell = sample_empty(&board, rng);
            board.place_trap(cell)?;
        }

        debug!(level, ?population, "level generated");
        Ok(board)
    }
}

/// Rejection-samples a random empty cell. Terminates because callers check
/// that enough empty cells remain.
fn sample_empty<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> Position {
    let size = board.size();
    loop {
        let pos = Position::new(rng.random_range(0..size), rng.random_range(0..size));
        if board.grid().is_empty(pos) {
            return pos;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::Cell;

    #[test]
    fn time_budget_shrinks_to_floor() {
        assert_eq!(time_budget(1), 25);
        assert_eq!(time_budget(2), 20);
        assert_eq!(time_budget(4), 10);
        assert_eq!(time_budget(9), 10);
        assert_eq!(time_budget(u32::MAX), 10);
    }

    #[test]
    fn populations_match_level() {
        for mode in [Mode::Single, Mode::Versus] {
            let generator = LevelGenerator::new(mode);
            for level in 1..=12 {
                let mut rng = StdRng::seed_from_u64(u64::from(level));
                let board = generator.generate(level, &mut rng).unwrap();
                let l = level as usize;
                assert_eq!(board.obstacles().len(), 3 + l);
                assert_eq!(board.collectibles().len(), l);
                assert_eq!(board.traps().len(), l);
                assert!(board.violations().is_empty(), "{:?}", board.violations());

                let mut occupied = HashSet::new();
                occupied.insert(board.goal());
                for slot in mode.players() {
                    assert!(occupied.insert(board.player(*slot).unwrap()));
                }
                for obstacle in board.obstacles() {
                    assert!(occupied.insert(obstacle.position));
                }
                for pos in board.collectibles().iter().chain(board.traps()) {
                    assert!(occupied.insert(*pos));
                }
            }
        }
    }

    #[test]
    fn fixed_cells_and_alternating_behaviors() {
        let generator = LevelGenerator::new(Mode::Versus);
        let mut rng = StdRng::seed_from_u64(7);
        let board = generator.generate(2, &mut rng).unwrap();

        assert_eq!(board.goal(), Position::new(8, 8));
        assert_eq!(board.grid()[Position::new(8, 8)], Cell::Goal);
        assert_eq!(board.player(PlayerSlot::One), Some(Position::new(1, 1)));
        assert_eq!(board.player(PlayerSlot::Two), Some(Position::new(8, 1)));

        let chasing: Vec<bool> = board
            .obstacles()
            .iter()
            .map(|o| o.behavior.is_chasing())
            .collect();
        assert_eq!(chasing, vec![true, false, true, false, true]);
    }

    #[test]
    fn single_mode_has_no_second_player() {
        let mut rng = StdRng::seed_from_u64(3);
        let board = LevelGenerator::new(Mode::Single)
            .generate(1, &mut rng)
            .unwrap();
        assert_eq!(board.player(PlayerSlot::Two), None);
        assert_eq!(board.grid().count(Cell::Player2), 0);
    }

    #[test]
    fn overcrowded_level_fails_fast() {
        // 16 cells, goal and one player leave 14 free; level 4 wants 7 + 4 + 4.
        let generator = LevelGenerator::with_size(4, Mode::Single);
        let mut rng = StdRng::seed_from_u64(1);
        let err = generator.generate(4, &mut rng).unwrap_err();
        assert_eq!(
            err,
            LevelError::Overcrowded {
                level: 4,
                requested: 15,
                free: 14
            }
        );
    }

    #[test]
    fn exactly_full_level_still_generates() {
        // 14 free cells, level 3 wants 6 + 3 + 3 = 12; level fills all but two.
        let generator = LevelGenerator::with_size(4, Mode::Single);
        let mut rng = StdRng::seed_from_u64(11);
        let board = generator.generate(3, &mut rng).unwrap();
        assert_eq!(board.free_cells(), 2);
    }
}

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::debug;

use crate::{
    PlayerSlot, Position,
    board::{Axis, Behavior, Board},
};

/// A periodic motion policy for one class of obstacles.
///
/// Each call to [`tick`](ObstacleController::tick) moves every obstacle the
/// controller owns at most one step. Callers must hold exclusive access to the
/// board for the whole tick, so that reading occupancy, choosing a destination
/// and committing it happen as one unit.
pub trait ObstacleController {
    /// Short name used for the worker thread and in logs.
    fn name(&self) -> &'static str;

    /// Advances the controller's obstacles by one tick and returns how many
    /// of them moved.
    fn tick(&mut self, board: &mut Board) -> usize;
}

/// Moves chasing obstacles one step toward player one.
#[derive(Debug, Default)]
pub struct Chaser;

impl Chaser {
    pub fn new() -> Self {
        Chaser
    }

    /// Greedy step from `from` toward `target`. Both axes may change at once.
    pub fn step_toward(from: Position, target: Position) -> Option<Position> {
        let dx = (target.x as isize - from.x as isize).signum();
        let dy = (target.y as isize - from.y as isize).signum();
        from.offset(dx, dy)
    }
}

impl ObstacleController for Chaser {
    fn name(&self) -> &'static str {
        "chaser"
    }

    fn tick(&mut self, board: &mut Board) -> usize {
        let Some(target) = board.player(PlayerSlot::One) else {
            return 0;
        };
        let mut moved = 0;
        for index in 0..board.obstacles().len() {
            let obstacle = board.obstacles()[index];
            if obstacle.behavior != Behavior::Chasing {
                continue;
            }
            let Some(to) = Self::step_toward(obstacle.position, target) else {
                continue;
            };
            if board.move_obstacle(index, to) {
                debug!(from = ?obstacle.position, ?to, "chaser moved");
                moved += 1;
            }
        }
        moved
    }
}

/// Moves patrolling obstacles randomly along their current axis.
#[derive(Debug)]
pub struct Patroller {
    rng: StdRng,
}

impl Patroller {
    pub fn from_seed(seed: u64) -> Self {
        Patroller {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ObstacleController for Patroller {
    fn name(&self) -> &'static str {
        "patroller"
    }

    fn tick(&mut self, board: &mut Board) -> usize {
        let mut moved = 0;
        for index in 0..board.obstacles().len() {
            let obstacle = board.obstacles()[index];
            let Behavior::Patrolling { axis } = obstacle.behavior else {
                continue;
            };
            let step: isize = if self.rng.random_bool(0.5) { 1 } else { -1 };
            let (dx, dy) = match axis {
                Axis::Horizontal => (step, 0),
                Axis::Vertical => (0, step),
            };
            let committed = obstacle
                .position
                .offset(dx, dy)
                .is_some_and(|to| board.move_obstacle(index, to));
            if committed {
                moved += 1;
            } else {
                board.flip_axis(index);
                debug!(at = ?obstacle.position, "patroller blocked, switching axis");
            }
        }
        moved
    }
}

use tracing::{debug, info};

use crate::{
    Cell, Direction, Mode, PlayerSlot, Position,
    board::Board,
    signal::{RunFlag, StopReason},
};

/// Points for picking up a collectible.
pub const COLLECTIBLE_REWARD: i64 = 50;
/// Points lost for stepping on a trap.
pub const TRAP_PENALTY: i64 = 50;

/// Everything a move can change, guarded as one unit by the session.
#[derive(Debug, Clone)]
pub struct GameState {
    pub mode: Mode,
    pub level: u32,
    pub score: i64,
    /// Successful moves this level, indexed by [`PlayerSlot::index`].
    pub moves: [u32; 2],
    pub board: Board,
}

impl GameState {
    pub fn new(mode: Mode, level: u32, board: Board) -> Self {
        GameState {
            mode,
            level,
            score: 0,
            moves: [0; 2],
            board,
        }
    }

    /// Moves made by every player this level.
    pub fn total_moves(&self) -> u32 {
        self.mode
            .players()
            .iter()
            .map(|slot| self.moves[slot.index()])
            .sum()
    }

    /// True if any player stands on the goal.
    pub fn goal_reached(&self) -> bool {
        let goal = self.board.goal();
        self.mode
            .players()
            .iter()
            .any(|slot| self.board.player(*slot) == Some(goal))
    }
}

/// Item consumed by a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pickup {
    Collectible,
    Trap,
}

/// Result of a requested player move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The move was rejected and nothing changed.
    Blocked,
    Moved {
        to: Position,
        pickup: Option<Pickup>,
    },
}

/// Whether a player may step onto `to`.
///
/// Out-of-bounds cells, obstacles and the other player's cell are blocked.
/// Empty cells, the goal, collectibles and traps are all walkable.
fn can_enter(board: &Board, to: Position) -> bool {
    match board.grid().occupant_at(to) {
        None | Some(Cell::Obstacle | Cell::Player1 | Cell::Player2) => false,
        Some(Cell::Empty | Cell::Goal | Cell::Collectible | Cell::Trap) => true,
    }
}

/// Validates and applies one move for `slot`.
///
/// A committed move counts toward the player's moves, consumes any
/// collectible or trap on the destination and adjusts the score. A trap that
/// pushes the score below zero stops the session.
pub fn resolve_move(
    state: &mut GameState,
    run: &RunFlag,
    slot: PlayerSlot,
    direction: Direction,
) -> MoveOutcome {
    let Some(from) = state.board.player(slot) else {
        return MoveOutcome::Blocked;
    };
    let (dx, dy) = direction.delta();
    let Some(to) = from.offset(dx, dy) else {
        return MoveOutcome::Blocked;
    };
    if !can_enter(&state.board, to) {
        return MoveOutcome::Blocked;
    }

    let pickup = if state.board.take_collectible(to) {
        state.score += COLLECTIBLE_REWARD;
        Some(Pickup::Collectible)
    } else if state.board.take_trap(to) {
        state.score -= TRAP_PENALTY;
        if state.score < 0 {
            info!(score = state.score, "score fell below zero");
            run.stop(StopReason::ScoreBelowZero);
        }
        Some(Pickup::Trap)
    } else {
        None
    };
    state.board.relocate_player(slot, to);
    state.moves[slot.index()] += 1;

    debug!(?slot, ?from, ?to, ?pickup, score = state.score, "player moved");
    MoveOutcome::Moved { to, pickup }
}

/// Bonus for reaching the goal: ten points per second left, minus one per
/// move taken this level.
pub fn goal_bonus(remaining: u32, moves: u32) -> i64 {
    i64::from(remaining) * 10 - i64::from(moves)
}

use std::{
    io,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
    time::Duration,
};

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, error, info};

use crate::{
    Cell, Direction, Mode, PlayerSlot,
    level::{LevelError, LevelGenerator, time_budget},
    map::Grid,
    motion::{Chaser, ObstacleController, Patroller},
    rules::{self, GameState, MoveOutcome},
    signal::{RunFlag, StopReason},
    timer::{Countdown, TimerAgent},
};

/// Tunables for one session. Grid size and key bindings are fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub mode: Mode,
    /// Cadence of the timer and both obstacle controllers.
    pub tick_interval: Duration,
    /// Pause between foreground iterations.
    pub frame_interval: Duration,
    /// Seeds level layouts and patrol choices. Thread interleaving still
    /// varies between runs.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            mode: Mode::Single,
            tick_interval: Duration::from_secs(1),
            frame_interval: Duration::from_millis(30),
            seed: None,
        }
    }
}

/// A decoded key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move {
        player: PlayerSlot,
        direction: Direction,
    },
    Quit,
}

/// Everything a frontend needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub mode: Mode,
    pub level: u32,
    pub score: i64,
    pub time_remaining: u32,
    pub moves: [u32; 2],
    pub grid: Grid<Cell>,
}

/// Final result of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub score: i64,
    pub level: u32,
    pub reason: StopReason,
}

/// Errors that end a session abnormally.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error("failed to start {name} thread")]
    Spawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("{0} thread panicked")]
    AgentPanicked(&'static str),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Non-blocking source of player commands.
pub trait InputSource {
    /// Returns the next pending command, or `None` immediately if there is
    /// none.
    fn poll_input(&mut self) -> Result<Option<Command>, SessionError>;
}

/// Draws session state. May be slow; it is always called without any lock
/// held.
pub trait Renderer {
    fn render(&mut self, snapshot: &Snapshot) -> Result<(), SessionError>;
}

/// State shared between the foreground loop and the background agents.
#[derive(Debug)]
struct Shared {
    state: Mutex<GameState>,
    countdown: Countdown,
    run: RunFlag,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, GameState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owns one play session: the shared board, the clock and the agents that
/// act on them.
pub struct Session {
    config: SessionConfig,
    generator: LevelGenerator,
    rng: StdRng,
    shared: Arc<Shared>,
}

impl Session {
    /// Creates a session on the standard grid with level 1 generated.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        let generator = LevelGenerator::new(config.mode);
        Self::with_generator(config, generator)
    }

    /// Creates a session whose levels come from `generator`.
    pub fn with_generator(
        config: SessionConfig,
        generator: LevelGenerator,
    ) -> Result<Self, SessionError> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let board = generator.generate(1, &mut rng)?;
        let shared = Shared {
            state: Mutex::new(GameState::new(config.mode, 1, board)),
            countdown: Countdown::new(time_budget(1)),
            run: RunFlag::new(),
        };
        Ok(Session {
            config,
            generator,
            rng,
            shared: Arc::new(shared),
        })
    }

    pub fn is_running(&self) -> bool {
        self.shared.run.is_running()
    }

    /// Runs `f` against the current game state while holding the lock.
    pub fn with_state<T>(&self, f: impl FnOnce(&GameState) -> T) -> T {
        f(&*self.shared.lock())
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.shared.lock();
        Snapshot {
            mode: state.mode,
            level: state.level,
            score: state.score,
            time_remaining: self.shared.countdown.remaining(),
            moves: state.moves,
            grid: state.board.grid().clone(),
        }
    }

    /// Applies one command and, if a player reached the goal, completes the
    /// level.
    ///
    /// The whole step runs under the state lock, so background agents never
    /// see a player half-moved.
    pub fn apply(&mut self, command: Command) -> Result<(), SessionError> {
        let (player, direction) = match command {
            Command::Quit => {
                self.shared.run.stop(StopReason::PlayerQuit);
                return Ok(());
            }
            Command::Move { player, direction } => (player, direction),
        };
        if !self.config.mode.players().contains(&player) {
            return Ok(());
        }

        let mut state = self.shared.lock();
        let outcome = rules::resolve_move(&mut state, &self.shared.run, player, direction);
        if outcome != MoveOutcome::Blocked && state.goal_reached() {
            if let Err(err) = complete_level(
                &mut state,
                &self.shared.countdown,
                &self.generator,
                &mut self.rng,
            ) {
                self.shared.run.stop(StopReason::LevelGenerationFailed);
                return Err(err.into());
            }
        }
        Ok(())
    }

    /// Plays the session to the end.
    ///
    /// Starts the timer and both obstacle controllers, then polls input,
    /// applies moves and renders until the session stops. Every agent is
    /// joined before this returns.
    pub fn run<I, R>(mut self, input: &mut I, renderer: &mut R) -> Result<SessionSummary, SessionError>
    where
        I: InputSource,
        R: Renderer,
    {
        info!(mode = ?self.config.mode, "session started");
        let mut agents = Vec::with_capacity(3);
        let mut result = self.spawn_agents(&mut agents);
        if result.is_ok() {
            result = self.drive(input, renderer);
        }
        if let Err(err) = &result {
            error!(%err, "session aborted");
            self.shared.run.stop(StopReason::Aborted);
        }

        let mut joined = Ok(());
        for (name, handle) in agents {
            if handle.join().is_err() {
                error!(name, "agent panicked");
                joined = Err(SessionError::AgentPanicked(name));
            }
        }
        result?;
        joined?;

        let state = self.shared.lock();
        let summary = SessionSummary {
            score: state.score,
            level: state.level,
            reason: self.shared.run.reason().unwrap_or(StopReason::Aborted),
        };
        info!(?summary, "session finished");
        Ok(summary)
    }

    fn drive<I, R>(&mut self, input: &mut I, renderer: &mut R) -> Result<(), SessionError>
    where
        I: InputSource,
        R: Renderer,
    {
        renderer.render(&self.snapshot())?;
        while self.shared.run.is_running() {
            if let Some(command) = input.poll_input()? {
                self.apply(command)?;
            }
            renderer.render(&self.snapshot())?;
            self.shared.run.sleep(self.config.frame_interval);
        }
        Ok(())
    }

    fn spawn_agents(
        &mut self,
        agents: &mut Vec<(&'static str, JoinHandle<()>)>,
    ) -> Result<(), SessionError> {
        agents.push(("timer", self.spawn_timer()?));
        agents.push(("chaser", self.spawn_controller(Chaser::new())?));
        let patroller = Patroller::from_seed(self.rng.random());
        agents.push(("patroller", self.spawn_controller(patroller)?));
        Ok(())
    }

    fn spawn_timer(&self) -> Result<JoinHandle<()>, SessionError> {
        let shared = Arc::clone(&self.shared);
        let interval = self.config.tick_interval;
        thread::Builder::new()
            .name("timer".to_string())
            .spawn(move || {
                let outcome = TimerAgent::new(&shared.countdown, &shared.run, interval).run();
                debug!(?outcome, "timer finished");
            })
            .map_err(|source| SessionError::Spawn {
                name: "timer",
                source,
            })
    }

    fn spawn_controller<C>(&self, mut controller: C) -> Result<JoinHandle<()>, SessionError>
    where
        C: ObstacleController + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        let interval = self.config.tick_interval;
        let name = controller.name();
        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut ticks = 0u64;
                while shared.run.sleep(interval) {
                    let mut state = shared.lock();
                    if !shared.run.is_running() {
                        break;
                    }
                    controller.tick(&mut state.board);
                    ticks += 1;
                }
                debug!(name, ticks, "obstacle controller finished");
            })
            .map_err(|source| SessionError::Spawn { name, source })
    }
}

/// Scores the goal arrival and swaps in the next level.
fn complete_level(
    state: &mut GameState,
    countdown: &Countdown,
    generator: &LevelGenerator,
    rng: &mut StdRng,
) -> Result<(), LevelError> {
    let bonus = rules::goal_bonus(countdown.remaining(), state.total_moves());
    let next = state.level + 1;
    let board = generator.generate(next, rng)?;

    state.score += bonus;
    state.level = next;
    state.board = board;
    state.moves = [0; 2];
    countdown.reset(time_budget(next));
    info!(level = next, bonus, score = state.score, "level complete");
    Ok(())
}

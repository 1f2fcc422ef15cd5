mod config;
mod input;
mod ui;

use std::{
    fs::File,
    io::{self, Stdout},
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use grid_chase_core::{
    Mode,
    session::{Session, SessionConfig},
};
use ratatui::{
    crossterm::{
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{config::AppConfig, input::KeyboardInput, ui::TerminalRenderer};

#[derive(Parser, Debug)]
#[command(version, about = "Reach the goal before the clock runs out", long_about = None)]
struct Args {
    /// Number of players sharing the keyboard
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
    players: u8,

    /// TOML file with timing and logging settings
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write logs to this file (overrides the config file)
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Seed for level layouts
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn mode(&self) -> Mode {
        if self.players == 2 {
            Mode::Versus
        } else {
            Mode::Single
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = AppConfig::load(args.config.as_deref())?;

    // The terminal belongs to the game, so logs only ever go to a file.
    if let Some(path) = args.log_file.as_ref().or(config.log_file.as_ref()) {
        init_tracing(path, &config.log_filter)?;
    }

    let mode = args.mode();
    let session = Session::new(SessionConfig {
        mode,
        tick_interval: Duration::from_millis(config.tick_ms),
        frame_interval: Duration::from_millis(config.frame_ms),
        seed: args.seed,
    })?;
    info!(?mode, tick_ms = config.tick_ms, seed = ?args.seed, "starting");

    // Set up the terminal
    let mut terminal = setup_terminal()?;

    let outcome = session.run(
        &mut KeyboardInput::new(mode),
        &mut TerminalRenderer::new(&mut terminal),
    );

    // Restore the terminal state before reporting anything
    restore_terminal(&mut terminal)?;

    let summary = outcome?;
    println!("Game Over! Final Score: {}", summary.score);
    Ok(())
}

/// Sends `tracing` output to `path`. `RUST_LOG` overrides `default_filter`.
fn init_tracing(path: &Path, default_filter: &str) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
    Ok(())
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode().context("enabling raw mode")?;
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

use std::io::Stdout;

use grid_chase_core::{
    Cell, Mode,
    session::{Renderer, SessionError, Snapshot},
};
use ratatui::{prelude::*, widgets::*};

/// Draws snapshots onto the terminal.
pub struct TerminalRenderer<'a> {
    terminal: &'a mut Terminal<CrosstermBackend<Stdout>>,
}

impl<'a> TerminalRenderer<'a> {
    pub fn new(terminal: &'a mut Terminal<CrosstermBackend<Stdout>>) -> Self {
        TerminalRenderer { terminal }
    }
}

impl Renderer for TerminalRenderer<'_> {
    fn render(&mut self, snapshot: &Snapshot) -> Result<(), SessionError> {
        self.terminal.draw(|frame| ui(frame, snapshot))?;
        Ok(())
    }
}

/// Renders the user interface.
fn ui(frame: &mut Frame, snapshot: &Snapshot) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Status line
            Constraint::Min(snapshot.grid.height() as u16 + 2),
            Constraint::Length(2), // Help text
        ])
        .split(frame.area());

    let status = Paragraph::new(status_line(snapshot))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Grid Chase"));
    frame.render_widget(status, main_layout[0]);

    render_map(frame, main_layout[1], snapshot);

    let help_text = Paragraph::new(help_line(snapshot.mode))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[2]);
}

fn status_line(snapshot: &Snapshot) -> String {
    let moves = match snapshot.mode {
        Mode::Single => format!("Moves: {}", snapshot.moves[0]),
        Mode::Versus => format!(
            "P1 Moves: {} | P2 Moves: {}",
            snapshot.moves[0], snapshot.moves[1]
        ),
    };
    format!(
        "Level: {} | Time Remaining: {} seconds | {} | Score: {}",
        snapshot.level, snapshot.time_remaining, moves, snapshot.score
    )
}

fn help_line(mode: Mode) -> &'static str {
    match mode {
        Mode::Single => "Move with WASD or arrows. Press 'q' or 'Esc' to quit.",
        Mode::Versus => "P1: WASD  P2: arrows. Press 'q' or 'Esc' to quit.",
    }
}

fn cell_style(cell: Cell) -> Style {
    match cell {
        Cell::Player1 => Style::default().fg(Color::Green).bold(),
        Cell::Player2 => Style::default().fg(Color::Cyan).bold(),
        Cell::Goal => Style::default().fg(Color::Yellow),
        Cell::Obstacle => Style::default().fg(Color::Red),
        Cell::Collectible => Style::default().fg(Color::Cyan),
        Cell::Trap => Style::default().fg(Color::Magenta),
        Cell::Empty => Style::default().fg(Color::DarkGray),
    }
}

/// Renders the board onto the frame, two columns per cell.
fn render_map(frame: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let lines: Vec<Line> = snapshot
        .grid
        .rows()
        .map(|row| {
            let spans: Vec<Span> = row
                .iter()
                .map(|cell| Span::styled(format!("{} ", cell.symbol()), cell_style(*cell)))
                .collect();
            Line::from(spans)
        })
        .collect();

    let map_paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(map_paragraph, area);
}

#[cfg(test)]
mod tests {
    use grid_chase_core::{
        Position,
        map::Grid,
    };
    use ratatui::backend::TestBackend;

    use super::*;

    fn snapshot(mode: Mode) -> Snapshot {
        let mut grid: Grid<Cell> = Grid::new(10, 10);
        grid[Position::new(1, 1)] = Cell::Player1;
        grid[Position::new(8, 8)] = Cell::Goal;
        Snapshot {
            mode,
            level: 2,
            score: 150,
            time_remaining: 17,
            moves: [5, 3],
            grid,
        }
    }

    #[test]
    fn status_shows_per_player_moves_in_versus() {
        assert_eq!(
            status_line(&snapshot(Mode::Versus)),
            "Level: 2 | Time Remaining: 17 seconds | P1 Moves: 5 | P2 Moves: 3 | Score: 150"
        );
        assert_eq!(
            status_line(&snapshot(Mode::Single)),
            "Level: 2 | Time Remaining: 17 seconds | Moves: 5 | Score: 150"
        );
    }

    #[test]
    fn map_draws_cell_glyphs() {
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal
            .draw(|frame| ui(frame, &snapshot(Mode::Single)))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let text: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(text.contains(". P . ."));
        assert!(text.contains("G ."));
    }
}

use std::time::Duration;

use grid_chase_core::{
    Direction, Mode, PlayerSlot,
    session::{Command, InputSource, SessionError},
};
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Maps a key to a command.
///
/// `w`/`a`/`s`/`d` always drive player one. The arrow keys drive player two
/// in versus mode and player one otherwise. `q` and `Esc` quit.
pub fn map_key(mode: Mode, code: KeyCode) -> Option<Command> {
    let arrows = match mode {
        Mode::Single => PlayerSlot::One,
        Mode::Versus => PlayerSlot::Two,
    };
    let (player, direction) = match code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => return Some(Command::Quit),
        KeyCode::Char('w' | 'W') => (PlayerSlot::One, Direction::Up),
        KeyCode::Char('s' | 'S') => (PlayerSlot::One, Direction::Down),
        KeyCode::Char('a' | 'A') => (PlayerSlot::One, Direction::Left),
        KeyCode::Char('d' | 'D') => (PlayerSlot::One, Direction::Right),
        KeyCode::Up => (arrows, Direction::Up),
        KeyCode::Down => (arrows, Direction::Down),
        KeyCode::Left => (arrows, Direction::Left),
        KeyCode::Right => (arrows, Direction::Right),
        _ => return None,
    };
    Some(Command::Move { player, direction })
}

fn is_interrupt(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c' | 'C'))
}

/// Reads the terminal keyboard without blocking.
pub struct KeyboardInput {
    mode: Mode,
}

impl KeyboardInput {
    pub fn new(mode: Mode) -> Self {
        KeyboardInput { mode }
    }
}

impl InputSource for KeyboardInput {
    fn poll_input(&mut self) -> Result<Option<Command>, SessionError> {
        // Skip non-key events until a mapped key press turns up.
        while event::poll(Duration::ZERO)? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if is_interrupt(&key) {
                return Ok(Some(Command::Quit));
            }
            if let Some(command) = map_key(self.mode, key.code) {
                return Ok(Some(command));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wasd_drives_player_one_in_both_modes() {
        for mode in [Mode::Single, Mode::Versus] {
            assert_eq!(
                map_key(mode, KeyCode::Char('a')),
                Some(Command::Move {
                    player: PlayerSlot::One,
                    direction: Direction::Left
                })
            );
        }
    }

    #[test]
    fn arrows_follow_mode() {
        assert_eq!(
            map_key(Mode::Versus, KeyCode::Down),
            Some(Command::Move {
                player: PlayerSlot::Two,
                direction: Direction::Down
            })
        );
        assert_eq!(
            map_key(Mode::Single, KeyCode::Down),
            Some(Command::Move {
                player: PlayerSlot::One,
                direction: Direction::Down
            })
        );
    }

    #[test]
    fn quit_and_unmapped_keys() {
        assert_eq!(map_key(Mode::Single, KeyCode::Char('q')), Some(Command::Quit));
        assert_eq!(map_key(Mode::Versus, KeyCode::Esc), Some(Command::Quit));
        assert_eq!(map_key(Mode::Single, KeyCode::Char('x')), None);
        assert_eq!(map_key(Mode::Single, KeyCode::Enter), None);
    }

    #[test]
    fn ctrl_c_interrupts() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(is_interrupt(&key));
        assert!(!is_interrupt(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)));
    }
}

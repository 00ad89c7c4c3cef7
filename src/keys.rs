//! Key bindings: normal and vim-style.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveLeft,
    MoveRight,
    SoftDrop,
    Hold,
    Pause,
    Restart,
    Quit,
    None,
}

/// Map key event to game action. Supports both normal (arrows, space) and vim (hjkl).
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent {
        code, modifiers, ..
    } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p' | 'P') => Action::Pause,
        KeyCode::Char('r' | 'R') => Action::Restart,
        KeyCode::Left | KeyCode::Char('h' | 'a') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l' | 'd') => Action::MoveRight,
        KeyCode::Down | KeyCode::Char('j' | 's') => Action::SoftDrop,
        KeyCode::Up | KeyCode::Char('k' | 'c' | ' ') => Action::Hold,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        }
    }

    #[test]
    fn test_normal_and_vim_agree() {
        let none = KeyModifiers::NONE;
        assert_eq!(key_to_action(press(KeyCode::Left, none)), Action::MoveLeft);
        assert_eq!(key_to_action(press(KeyCode::Char('h'), none)), Action::MoveLeft);
        assert_eq!(key_to_action(press(KeyCode::Down, none)), Action::SoftDrop);
        assert_eq!(key_to_action(press(KeyCode::Char('j'), none)), Action::SoftDrop);
        assert_eq!(key_to_action(press(KeyCode::Up, none)), Action::Hold);
    }

    #[test]
    fn test_modifiers() {
        assert_eq!(
            key_to_action(press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        assert_eq!(
            key_to_action(press(KeyCode::Char('R'), KeyModifiers::SHIFT)),
            Action::Restart
        );
        assert_eq!(
            key_to_action(press(KeyCode::Left, KeyModifiers::ALT)),
            Action::None
        );
    }
}

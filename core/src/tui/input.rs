use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Quit,
    Toggle,
    Build,
    SelectAll,
    DeselectAll,
    Up,
    Down,
    None,
}

pub fn handle_key_event(key: KeyEvent) -> InputAction {
    if key.kind == KeyEventKind::Release {
        return InputAction::None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => InputAction::Quit,
            KeyCode::Char('a') => InputAction::SelectAll,
            KeyCode::Char('d') => InputAction::DeselectAll,
            _ => InputAction::None,
        };
    }

    match key.code {
        KeyCode::Char(' ') => InputAction::Toggle,
        KeyCode::Enter => InputAction::Build,
        KeyCode::Up | KeyCode::Char('k') => InputAction::Up,
        KeyCode::Down | KeyCode::Char('j') => InputAction::Down,
        KeyCode::Char('q') | KeyCode::Esc => InputAction::Quit,
        _ => InputAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_plain_keys() {
        assert_eq!(handle_key_event(key(KeyCode::Char(' '))), InputAction::Toggle);
        assert_eq!(handle_key_event(key(KeyCode::Enter)), InputAction::Build);
        assert_eq!(handle_key_event(key(KeyCode::Char('j'))), InputAction::Down);
        assert_eq!(handle_key_event(key(KeyCode::Up)), InputAction::Up);
        assert_eq!(handle_key_event(key(KeyCode::Char('q'))), InputAction::Quit);
        assert_eq!(handle_key_event(key(KeyCode::Char('x'))), InputAction::None);
    }

    #[test]
    fn test_control_keys() {
        assert_eq!(handle_key_event(ctrl('a')), InputAction::SelectAll);
        assert_eq!(handle_key_event(ctrl('d')), InputAction::DeselectAll);
        assert_eq!(handle_key_event(ctrl('c')), InputAction::Quit);
        assert_eq!(handle_key_event(ctrl('k')), InputAction::None);
    }

    #[test]
    fn test_key_release_is_ignored() {
        let mut release = key(KeyCode::Enter);
        release.kind = KeyEventKind::Release;
        assert_eq!(handle_key_event(release), InputAction::None);
    }
}

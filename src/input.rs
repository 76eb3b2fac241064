//! Key bindings.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Drop,
    /// Start from the title screen, restart from an end screen.
    Start,
    ToggleOutline,
    Quit,
    None,
}

/// Map key event to game action. Space and Enter double as start on menus,
/// which the app sorts out by screen.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char(' ') | KeyCode::Down | KeyCode::Char('j') => Action::Drop,
        KeyCode::Enter | KeyCode::Char('r' | 'R' | 's' | 'S') => Action::Start,
        KeyCode::Char('b' | 'B') => Action::ToggleOutline,
        _ => Action::None,
    }
}

/// Any button press drops; moves, drags and scrolls are ignored.
pub fn mouse_to_action(mouse: MouseEvent) -> Action {
    match mouse.kind {
        MouseEventKind::Down(_) => Action::Drop,
        _ => Action::None,
    }
}

//! Event handling for the TUI.
//!
//! Keyboard polling plus one predicate per binding, so the key map lives in a
//! single place and the legend can be checked against it.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

use crate::TuiResult;

/// Poll for keyboard events with a timeout.
///
/// Returns `Some(KeyEvent)` if a key was pressed within the timeout,
/// or `None` if no key was pressed. Key release events are ignored.
pub fn poll_key(timeout: Duration) -> TuiResult<Option<KeyEvent>> {
    if event::poll(timeout)?
        && let Event::Key(key) = event::read()?
        && key.kind != KeyEventKind::Release
    {
        return Ok(Some(key));
    }
    Ok(None)
}

/// Plain character press with no modifier other than Shift.
fn is_char(key: &KeyEvent, c: char) -> bool {
    key.code == KeyCode::Char(c) && key.modifiers.difference(KeyModifiers::SHIFT).is_empty()
}

/// Check if the key event represents a quit command.
///
/// Returns `true` for 'q' key or Ctrl+C.
pub fn is_quit(key: &KeyEvent) -> bool {
    matches!(
        key,
        KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            ..
        } | KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            ..
        }
    )
}

/// Next card in pre-order (j or Down arrow).
pub fn is_down(key: &KeyEvent) -> bool {
    key.code == KeyCode::Down || is_char(key, 'j')
}

/// Previous card in pre-order (k or Up arrow).
pub fn is_up(key: &KeyEvent) -> bool {
    key.code == KeyCode::Up || is_char(key, 'k')
}

/// Move to the left child (h or Left arrow).
pub fn is_left(key: &KeyEvent) -> bool {
    key.code == KeyCode::Left || is_char(key, 'h')
}

/// Move to the right child (l or Right arrow).
pub fn is_right(key: &KeyEvent) -> bool {
    key.code == KeyCode::Right || is_char(key, 'l')
}

/// Move to the parent card (p or Backspace).
pub fn is_parent(key: &KeyEvent) -> bool {
    key.code == KeyCode::Backspace || is_char(key, 'p')
}

/// Expand or collapse the selected card (Enter or Space).
pub fn is_toggle(key: &KeyEvent) -> bool {
    key.code == KeyCode::Enter || is_char(key, ' ')
}

/// Expand every card with children.
pub fn is_expand_all(key: &KeyEvent) -> bool {
    is_char(key, 'e')
}

/// Zoom in ('+', or '=' which shares the key on most layouts).
pub fn is_zoom_in(key: &KeyEvent) -> bool {
    is_char(key, '+') || is_char(key, '=')
}

pub fn is_zoom_out(key: &KeyEvent) -> bool {
    is_char(key, '-')
}

pub fn is_zoom_reset(key: &KeyEvent) -> bool {
    is_char(key, '0')
}

/// Fetch the tree again.
pub fn is_refresh(key: &KeyEvent) -> bool {
    is_char(key, 'r')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: event::KeyEventState::NONE,
        }
    }

    fn plain(c: char) -> KeyEvent {
        make_key(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn test_is_quit_q() {
        assert!(is_quit(&plain('q')));
    }

    #[test]
    fn test_is_quit_ctrl_c() {
        let key = make_key(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(is_quit(&key));
    }

    #[test]
    fn test_is_quit_other() {
        assert!(!is_quit(&plain('x')));
    }

    #[test]
    fn test_vertical_navigation() {
        assert!(is_down(&plain('j')));
        assert!(is_down(&make_key(KeyCode::Down, KeyModifiers::NONE)));
        assert!(is_up(&plain('k')));
        assert!(is_up(&make_key(KeyCode::Up, KeyModifiers::NONE)));
        assert!(!is_down(&plain('k')));
    }

    #[test]
    fn test_child_navigation() {
        assert!(is_left(&plain('h')));
        assert!(is_left(&make_key(KeyCode::Left, KeyModifiers::NONE)));
        assert!(is_right(&plain('l')));
        assert!(is_right(&make_key(KeyCode::Right, KeyModifiers::NONE)));
        assert!(is_parent(&plain('p')));
        assert!(is_parent(&make_key(KeyCode::Backspace, KeyModifiers::NONE)));
    }

    #[test]
    fn test_h_with_control_is_not_left() {
        let key = make_key(KeyCode::Char('h'), KeyModifiers::CONTROL);
        assert!(!is_left(&key));
    }

    #[test]
    fn test_toggle_keys() {
        assert!(is_toggle(&make_key(KeyCode::Enter, KeyModifiers::NONE)));
        assert!(is_toggle(&plain(' ')));
        assert!(!is_toggle(&plain('t')));
    }

    #[test]
    fn test_zoom_keys() {
        assert!(is_zoom_in(&plain('+')));
        assert!(is_zoom_in(&make_key(KeyCode::Char('+'), KeyModifiers::SHIFT)));
        assert!(is_zoom_in(&plain('=')));
        assert!(is_zoom_out(&plain('-')));
        assert!(is_zoom_reset(&plain('0')));
        assert!(!is_zoom_reset(&make_key(KeyCode::Char('0'), KeyModifiers::ALT)));
    }

    #[test]
    fn test_refresh_and_expand_all() {
        assert!(is_refresh(&plain('r')));
        assert!(is_expand_all(&plain('e')));
        assert!(!is_refresh(&make_key(KeyCode::Char('r'), KeyModifiers::CONTROL)));
    }
}

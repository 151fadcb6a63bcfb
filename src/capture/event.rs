use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::core::key::{INTERRUPT_KEY, KeyPress};

/// Translates a crossterm event into a key press.
/// Returns `None` for anything that isn't a key going down.
pub fn key_press(event: Event) -> Option<KeyPress> {
    match event {
        Event::Key(key_event) => {
            log::debug!("Key event: {:?} with modifiers {:?}", key_event.code, key_event.modifiers);
            from_key_event(key_event)
        }
        _ => None,
    }
}

fn from_key_event(key_event: KeyEvent) -> Option<KeyPress> {
    // Only count the press, not repeat or release (kitty protocol terminals)
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    match (key_event.modifiers, key_event.code) {
        // Raw mode turns Ctrl+C into a key instead of SIGINT
        (m, KeyCode::Char('c')) if m.contains(KeyModifiers::CONTROL) => {
            Some(KeyPress::named(INTERRUPT_KEY))
        }
        (_, KeyCode::Char(' ')) => Some(KeyPress {
            literal: Some(' '),
            named: Some("SPACE".to_string()),
        }),
        (_, KeyCode::Char(c)) => Some(KeyPress::literal(c)),
        (_, KeyCode::Esc) => Some(KeyPress::named("ESC")),
        (_, KeyCode::Enter) => Some(KeyPress::named("ENTER")),
        (_, KeyCode::Tab) => Some(KeyPress::named("TAB")),
        (_, KeyCode::BackTab) => Some(KeyPress::named("BACKTAB")),
        (_, KeyCode::Backspace) => Some(KeyPress::named("BACKSPACE")),
        (_, KeyCode::Delete) => Some(KeyPress::named("DELETE")),
        (_, KeyCode::Insert) => Some(KeyPress::named("INSERT")),
        (_, KeyCode::Home) => Some(KeyPress::named("HOME")),
        (_, KeyCode::End) => Some(KeyPress::named("END")),
        (_, KeyCode::PageUp) => Some(KeyPress::named("PGUP")),
        (_, KeyCode::PageDown) => Some(KeyPress::named("PGDN")),
        (_, KeyCode::Up) => Some(KeyPress::named("ARROW_UP")),
        (_, KeyCode::Down) => Some(KeyPress::named("ARROW_DOWN")),
        (_, KeyCode::Left) => Some(KeyPress::named("ARROW_LEFT")),
        (_, KeyCode::Right) => Some(KeyPress::named("ARROW_RIGHT")),
        (_, KeyCode::F(n)) => Some(KeyPress::named(format!("F{n}"))),
        // Modifier-only presses, media keys, etc. have neither a name we
        // track nor a character
        _ => Some(KeyPress::default()),
    }
}

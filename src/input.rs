//! Keyboard input handling.
//!
//! Maps terminal key events to [`App`] actions.  Global keys (quit, focus)
//! are handled first; everything else goes to the focused card.
//!
//! ## For contributors
//!
//! To add a new keybinding:
//!
//! 1. Add a method on the card (or [`App`]) for the action.
//! 2. Add a `KeyCode` match arm in the card's handler below.
//! 3. Update the help text in [`crate::ui`].

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::app::{App, Focus};
use crate::command::Command;

/// Process a single key event, updating app state accordingly.
///
/// Returns the command to dispatch when the key activated a control.  Only
/// reacts to key-press events so that each physical keypress triggers
/// exactly one action.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Tab => app.focus_next(),
        KeyCode::BackTab => app.focus_previous(),
        KeyCode::Enter => return app.activate(),
        code => match app.focus {
            Focus::Timer => timer_key(app, code),
            Focus::Iot => iot_key(app, code),
            Focus::Camera => {}
        },
    }
    None
}

fn timer_key(app: &mut App, code: KeyCode) {
    let timer = &mut app.cards.timer;
    match code {
        KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('+') => timer.increment(),
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('-') => timer.decrement(),
        KeyCode::Left | KeyCode::Right | KeyCode::Char('h') | KeyCode::Char('l') => {
            timer.switch_field()
        }
        KeyCode::Char(c) if c.is_ascii_digit() => timer.type_digit(c),
        _ => {}
    }
}

fn iot_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Down | KeyCode::Char('j') => app.cards.iot.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.cards.iot.select_previous(),
        _ => {}
    }
}

//! Terminal UI rendering.
//!
//! All drawing logic lives here and in the cards' `render` methods,
//! separated from application state ([`App`]) and input handling
//! ([`crate::input`]).
//!
//! ## For contributors
//!
//! * The layout is two columns of cards over a one-line status bar.  The
//!   left column holds the controls (clock, alarm editor, camera), the right
//!   column the device list, last detection and sensor graphs.
//! * Each card draws itself; this module only decides where.

use chrono::{DateTime, Local};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, Focus};
use crate::command::Command;

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    draw_at(app, frame, Local::now());
}

/// [`draw`] with the wall clock fixed, for tests.
pub fn draw_at(app: &mut App, frame: &mut Frame, now: DateTime<Local>) {
    let [main_area, status_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());
    let [left, right] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
            .areas(main_area);

    draw_controls(app, frame, left, now);
    draw_monitors(app, frame, right);
    draw_status_bar(app, frame, status_area);
}

fn draw_controls(app: &App, frame: &mut Frame, area: Rect, now: DateTime<Local>) {
    let [clock, timer, camera] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Length(5),
        Constraint::Min(4),
    ])
    .areas(area);

    let cards = &app.cards;
    cards.clock.render(frame, clock, now);
    cards.timer.render(
        frame,
        timer,
        app.focus == Focus::Timer,
        app.is_busy(&cards.timer.submit()),
    );
    cards.camera.render(
        frame,
        camera,
        app.focus == Focus::Camera,
        app.is_busy(&Command::TakeImage),
    );
}

fn draw_monitors(app: &mut App, frame: &mut Frame, area: Rect) {
    let [iot, detection, graph] = Layout::vertical([
        Constraint::Length(9),
        Constraint::Length(6),
        Constraint::Min(8),
    ])
    .areas(area);

    let focused = app.focus == Focus::Iot;
    let gate = &app.gate;
    app.cards.iot.render(frame, iot, focused, |device| {
        gate.is_busy(&Command::Toggle(device.to_string()))
    });
    app.cards.detection.render(frame, detection);
    app.cards.graph.render(frame, graph);
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let (healthy, total) = app.cards.feed_health();
    let health_color = if healthy == total {
        Color::Green
    } else {
        Color::Yellow
    };
    let status = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(app.status.as_str(), Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("{healthy}/{total} feeds live"),
            Style::default().fg(health_color),
        ),
        Span::raw("  q: quit  Tab: focus  ↑/↓: change  Enter: activate"),
    ]));
    frame.render_widget(status, area);
}

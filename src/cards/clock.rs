//! Wall clock plus the alarm time the backend currently has armed.

use chrono::{DateTime, Local};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::{card_block, feed_notes, Feed};
use crate::api::TimerTime;

pub struct ClockCard {
    timer_time: Feed<TimerTime>,
}

impl ClockCard {
    pub fn new(timer_time: Feed<TimerTime>) -> Self {
        Self { timer_time }
    }

    pub fn refresh(&mut self) -> bool {
        self.timer_time.refresh()
    }

    pub fn feed(&self) -> &Feed<TimerTime> {
        &self.timer_time
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, now: DateTime<Local>) {
        let mut lines = vec![Line::from(vec![
            Span::raw("now    "),
            Span::styled(
                now.format("%Y-%m-%d %H:%M:%S").to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ])];

        if let Some(armed) = self.timer_time.value() {
            lines.push(Line::from(vec![
                Span::raw("alarm  "),
                Span::styled(armed.timer_time.clone(), Style::default().fg(Color::Green)),
            ]));
        }
        lines.extend(feed_notes(self.timer_time.snapshot()));

        frame.render_widget(Paragraph::new(lines).block(card_block("Clock", false)), area);
    }
}

//! Alarm editor: pick `HH:MM` and send it to the backend.
//!
//! Editing is local; only submitting talks to the server, as a one-shot
//! [`Command::SetTimer`].

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::card_block;
use crate::api::AlarmTime;
use crate::command::Command;

/// Which half of the time the arrow keys change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    #[default]
    Hours,
    Minutes,
}

#[derive(Debug, Default)]
pub struct TimerCard {
    hours: u8,
    minutes: u8,
    field: Field,
    /// Last confirmation or error from the server.
    pub message: Option<String>,
}

impl TimerCard {
    pub fn field(&self) -> Field {
        self.field
    }

    pub fn switch_field(&mut self) {
        self.field = match self.field {
            Field::Hours => Field::Minutes,
            Field::Minutes => Field::Hours,
        };
    }

    /// Step the focused field up, wrapping past the maximum to zero.
    pub fn increment(&mut self) {
        let (value, max) = self.focused_mut();
        *value = if *value >= max { 0 } else { *value + 1 };
    }

    /// Step the focused field down, wrapping below zero to the maximum.
    pub fn decrement(&mut self) {
        let (value, max) = self.focused_mut();
        *value = if *value == 0 { max } else { *value - 1 };
    }

    /// Type a digit into the focused field.
    ///
    /// The field keeps its last two digits and clamps to its maximum, so
    /// typing `0`,`7` gives 07 and typing `9`,`9` into hours gives 23.
    pub fn type_digit(&mut self, digit: char) {
        let Some(d) = digit.to_digit(10) else {
            return;
        };
        let (value, max) = self.focused_mut();
        let typed = (u32::from(*value) % 10) * 10 + d;
        *value = typed.min(u32::from(max)) as u8;
    }

    pub fn alarm_time(&self) -> AlarmTime {
        // Both fields are kept in range by every mutator.
        AlarmTime::new(self.hours, self.minutes).unwrap_or_default()
    }

    pub fn submit(&self) -> Command {
        Command::SetTimer(self.alarm_time())
    }

    fn focused_mut(&mut self) -> (&mut u8, u8) {
        match self.field {
            Field::Hours => (&mut self.hours, AlarmTime::MAX_HOURS),
            Field::Minutes => (&mut self.minutes, AlarmTime::MAX_MINUTES),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool, busy: bool) {
        let digit_style = |field: Field| {
            let base = Style::default().add_modifier(Modifier::BOLD);
            if focused && self.field == field {
                base.fg(Color::Black).bg(Color::Cyan)
            } else {
                base
            }
        };

        let mut lines = vec![
            Line::from(vec![
                Span::styled(format!("{:02}", self.hours), digit_style(Field::Hours)),
                Span::raw(" : "),
                Span::styled(format!("{:02}", self.minutes), digit_style(Field::Minutes)),
            ]),
            Line::from(Span::styled(
                if busy { "[ setting… ]" } else { "[ Enter: set alarm ]" },
                Style::default().fg(Color::DarkGray),
            )),
        ];
        if let Some(message) = &self.message {
            lines.push(Line::from(message.as_str()));
        }

        frame.render_widget(Paragraph::new(lines).block(card_block("Alarm", focused)), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_midnight_on_hours() {
        let card = TimerCard::default();
        assert_eq!(card.alarm_time().to_string(), "00:00");
        assert_eq!(card.field(), Field::Hours);
    }

    #[test]
    fn increment_and_decrement_wrap() {
        let mut card = TimerCard::default();
        card.decrement();
        assert_eq!(card.alarm_time().to_string(), "23:00");
        card.increment();
        assert_eq!(card.alarm_time().to_string(), "00:00");

        card.switch_field();
        card.decrement();
        assert_eq!(card.alarm_time().to_string(), "00:59");
        card.increment();
        card.increment();
        assert_eq!(card.alarm_time().to_string(), "00:01");
    }

    #[test]
    fn typed_digits_keep_last_two_and_clamp() {
        let mut card = TimerCard::default();
        card.type_digit('0');
        card.type_digit('7');
        assert_eq!(card.alarm_time().hours(), 7);

        card.type_digit('5');
        assert_eq!(card.alarm_time().hours(), 23, "75 clamps to 23");

        card.switch_field();
        card.type_digit('3');
        card.type_digit('0');
        assert_eq!(card.alarm_time().to_string(), "23:30");

        card.type_digit('x');
        assert_eq!(card.alarm_time().to_string(), "23:30");
    }

    #[test]
    fn submit_builds_set_timer_command() {
        let mut card = TimerCard::default();
        card.type_digit('6');
        card.switch_field();
        card.type_digit('4');
        card.type_digit('5');
        assert_eq!(card.submit(), Command::SetTimer(AlarmTime::new(6, 45).unwrap()));
    }
}

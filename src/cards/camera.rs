//! Camera: capture a frame on demand and show what the classifier made of
//! it.  The terminal cannot show the JPEG, so the card reports its size.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::card_block;
use crate::api::Capture;

#[derive(Debug, Default)]
pub struct CameraCard {
    pub last_capture: Option<Capture>,
    pub message: Option<String>,
}

impl CameraCard {
    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool, busy: bool) {
        let mut lines = Vec::new();
        match &self.last_capture {
            Some(capture) => {
                lines.push(Line::from(vec![
                    Span::raw("result  "),
                    Span::styled(capture.result.clone(), Style::default().fg(Color::Green)),
                ]));
                lines.push(Line::from(format!("image   {} bytes (jpeg)", capture.image.len())));
            }
            None => lines.push(Line::from(Span::styled(
                "no image yet",
                Style::default().fg(Color::DarkGray),
            ))),
        }
        if let Some(message) = &self.message {
            lines.push(Line::from(message.as_str()));
        }
        lines.push(Line::from(Span::styled(
            if busy { "[ taking… ]" } else { "[ Enter: take image ]" },
            Style::default().fg(Color::DarkGray),
        )));

        frame.render_widget(Paragraph::new(lines).block(card_block("Camera", focused)), area);
    }
}

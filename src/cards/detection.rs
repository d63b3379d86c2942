//! Last bed-presence detection reported by the backend.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::{card_block, feed_notes, Feed};
use crate::api::Detection;

pub struct DetectionCard {
    detection: Feed<Detection>,
}

impl DetectionCard {
    pub fn new(detection: Feed<Detection>) -> Self {
        Self { detection }
    }

    pub fn refresh(&mut self) -> bool {
        self.detection.refresh()
    }

    pub fn feed(&self) -> &Feed<Detection> {
        &self.detection
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let mut lines = Vec::new();
        if let Some(d) = self.detection.value() {
            lines.push(Line::from(vec![
                Span::raw("result  "),
                Span::styled(d.result.clone(), Style::default().fg(Color::Green)),
            ]));
            lines.push(Line::from(format!("time    {}", d.time)));
            if let Some(image) = &d.image {
                lines.push(Line::from(format!("image   {} bytes (jpeg)", image.len())));
            }
        }
        lines.extend(feed_notes(self.detection.snapshot()));

        frame.render_widget(
            Paragraph::new(lines).block(card_block("Last detection", false)),
            area,
        );
    }
}

//! Temperature and humidity history for one device, one chart each.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    symbols::Marker,
    text::Line,
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use super::{card_block, feed_notes, Feed};
use crate::api::{SensorHistory, SensorKind};

pub struct GraphCard {
    device: String,
    hours: u32,
    temperature: Feed<SensorHistory>,
    humidity: Feed<SensorHistory>,
}

impl GraphCard {
    pub fn new(
        device: &str,
        hours: u32,
        temperature: Feed<SensorHistory>,
        humidity: Feed<SensorHistory>,
    ) -> Self {
        Self {
            device: device.to_string(),
            hours,
            temperature,
            humidity,
        }
    }

    pub fn refresh(&mut self) -> bool {
        self.temperature.refresh() | self.humidity.refresh()
    }

    pub fn feed(&self, kind: SensorKind) -> &Feed<SensorHistory> {
        match kind {
            SensorKind::Temperature => &self.temperature,
            SensorKind::Humidity => &self.humidity,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let title = format!("{} · last {}h", self.device, self.hours);
        let block = card_block(&title, false);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [top, bottom] =
            Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(inner);
        render_series(frame, top, SensorKind::Temperature, &self.temperature, Color::Red);
        render_series(frame, bottom, SensorKind::Humidity, &self.humidity, Color::Blue);
    }
}

/// Points as `(minutes since the first reading, value)`.
fn chart_points(history: &SensorHistory) -> Vec<(f64, f64)> {
    let Some(first) = history.points.first() else {
        return Vec::new();
    };
    history
        .points
        .iter()
        .map(|p| {
            let minutes = (p.timestamp - first.timestamp).num_seconds() as f64 / 60.0;
            (minutes, p.value)
        })
        .collect()
}

fn render_series(
    frame: &mut Frame,
    area: Rect,
    kind: SensorKind,
    feed: &Feed<SensorHistory>,
    color: Color,
) {
    let history = feed.value().filter(|h| !h.points.is_empty());
    let (Some(history), Some((lo, hi))) = (history, history.and_then(SensorHistory::bounds)) else {
        let mut lines = vec![Line::from(format!("{kind}"))];
        lines.extend(feed_notes(feed.snapshot()));
        if feed.value().is_some() {
            lines.push(Line::from("no readings in window"));
        }
        frame.render_widget(Paragraph::new(lines), area);
        return;
    };

    let points = chart_points(history);
    let span = points.last().map(|(x, _)| *x).unwrap_or(0.0).max(1.0);
    let pad = ((hi - lo) * 0.1).max(0.5);
    let (y_lo, y_hi) = (lo - pad, hi + pad);

    let name = history
        .latest()
        .map(|p| format!("{kind} {:.1}{}", p.value, kind.unit()))
        .unwrap_or_else(|| kind.to_string());

    // The legend disappears when it doesn't fit; the warning must not.
    let notes = feed_notes(feed.snapshot());
    let [notes_area, chart_area] =
        Layout::vertical([Constraint::Length(notes.len() as u16), Constraint::Min(0)]).areas(area);
    frame.render_widget(Paragraph::new(notes), notes_area);

    let dataset = Dataset::default()
        .name(name)
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .hidden_legend_constraints((Constraint::Ratio(1, 1), Constraint::Ratio(1, 1)))
        .x_axis(
            Axis::default()
                .bounds([0.0, span])
                .labels(vec!["0m".to_string(), format!("{span:.0}m")]),
        )
        .y_axis(
            Axis::default()
                .bounds([y_lo, y_hi])
                .labels(vec![format!("{y_lo:.1}"), format!("{y_hi:.1}")]),
        );
    frame.render_widget(chart, chart_area);
}

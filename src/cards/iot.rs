//! IoT lights: the connected devices, the last message any of them sent,
//! and a toggle for the selected one.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
    Frame,
};

use super::{card_block, feed_notes, Feed};
use crate::api::{DeviceList, LastMessage};
use crate::command::Command;

pub struct IotCard {
    devices: Feed<DeviceList>,
    last_message: Feed<LastMessage>,
    list_state: ListState,
    /// Last toggle confirmation or error.
    pub message: Option<String>,
}

impl IotCard {
    pub fn new(devices: Feed<DeviceList>, last_message: Feed<LastMessage>) -> Self {
        Self {
            devices,
            last_message,
            list_state: ListState::default(),
            message: None,
        }
    }

    pub fn refresh(&mut self) -> bool {
        let changed = self.devices.refresh() | self.last_message.refresh();
        self.clamp_selection();
        changed
    }

    pub fn devices(&self) -> &Feed<DeviceList> {
        &self.devices
    }

    pub fn last_message(&self) -> &Feed<LastMessage> {
        &self.last_message
    }

    fn device_names(&self) -> &[String] {
        self.devices.value().map(|d| d.devices.as_slice()).unwrap_or(&[])
    }

    pub fn selected_device(&self) -> Option<&str> {
        let i = self.list_state.selected()?;
        self.device_names().get(i).map(String::as_str)
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        let len = self.device_names().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(len - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_previous(&mut self) {
        if self.device_names().is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    /// The device list can shrink under the cursor between ticks.
    fn clamp_selection(&mut self) {
        let len = self.device_names().len();
        match self.list_state.selected() {
            Some(_) if len == 0 => self.list_state.select(None),
            Some(i) if i >= len => self.list_state.select(Some(len - 1)),
            None if len > 0 => self.list_state.select(Some(0)),
            _ => {}
        }
    }

    /// Command for toggling the selected device, if there is one.
    pub fn toggle(&self) -> Option<Command> {
        self.selected_device().map(|d| Command::Toggle(d.to_string()))
    }

    // -- rendering -----------------------------------------------------------

    pub fn render(&mut self, frame: &mut Frame, area: Rect, focused: bool, busy: impl Fn(&str) -> bool) {
        let block = card_block("IoT", focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let info = self.info_lines();
        let [list_area, info_area] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(info.len() as u16)])
                .areas(inner);

        let items: Vec<ListItem> = self
            .device_names()
            .iter()
            .map(|name| {
                let mut spans = vec![Span::raw(name.clone())];
                if busy(name.as_str()) {
                    spans.push(Span::styled("  toggling…", Style::default().fg(Color::DarkGray)));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();
        let list = List::new(items)
            .highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
            .highlight_symbol("▸ ");
        frame.render_stateful_widget(list, list_area, &mut self.list_state);
        frame.render_widget(Paragraph::new(info), info_area);
    }

    /// Notes for the device feed, then the last message with its own notes,
    /// then the toggle outcome.
    fn info_lines(&self) -> Vec<Line<'static>> {
        let mut info = feed_notes(self.devices.snapshot());

        let label = || Span::styled("last: ", Style::default().fg(Color::DarkGray));
        if let Some(m) = self.last_message.value() {
            info.push(Line::from(vec![label(), Span::raw(m.message.clone())]));
        }
        for note in feed_notes(self.last_message.snapshot()) {
            let mut spans = vec![label()];
            spans.extend(note.spans);
            info.push(Line::from(spans));
        }

        if let Some(message) = &self.message {
            info.push(Line::from(message.clone()));
        }
        info
    }
}

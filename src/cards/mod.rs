//! Card bindings: each dashboard card and the feeds it reads.
//!
//! A card is a thin configuration of the sync primitive: it picks the
//! endpoint, decode function and interval for each of its [`Feed`]s and
//! renders whatever snapshot the feed currently holds.  Cards own their
//! feeds, and feeds own their [`SchedulerHandle`]s, so dropping a card stops
//! its polling.
//!
//! ## For contributors — adding a card
//!
//! 1. Create a module here with a struct holding its feeds and any local UI
//!    state, plus a `render` method.
//! 2. Start its feeds in [`Cards::mount`].
//! 3. Refresh it in [`Cards::refresh`] and place it in [`crate::ui::draw`].

mod camera;
mod clock;
mod detection;
mod graph;
mod iot;
mod timer;

pub use camera::CameraCard;
pub use clock::ClockCard;
pub use detection::DetectionCard;
pub use graph::GraphCard;
pub use iot::IotCard;
pub use timer::{Field, TimerCard};

use std::time::Duration;

use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
    widgets::Block,
};
use serde_json::Value;
use tokio::runtime::Handle;

use crate::api::{
    decode_json, ApiClient, Detection, DeviceList, LastMessage, Request, SensorHistory,
    SensorKind, TimerTime,
};
use crate::config::Config;
use crate::error::FetchOutcome;
use crate::sync::{self, Backoff, CellReader, SchedulerHandle, Subscription, SyncSnapshot};

/// Cadence of the alarm, device and detection feeds.
pub const LIVE_INTERVAL: Duration = Duration::from_secs(1);

/// Cadence of the sensor history feeds.
pub const HISTORY_INTERVAL: Duration = Duration::from_secs(60);

/// A subscription as seen by a card: the reader, the last snapshot taken
/// from it, and the handle that keeps it running.
pub struct Feed<T> {
    reader: CellReader<T>,
    snapshot: SyncSnapshot<T>,
    // Dropped with the feed, which cancels the subscription.
    _handle: Option<SchedulerHandle>,
}

impl<T: Clone + Send + Sync + 'static> Feed<T> {
    pub fn start(runtime: &Handle, api: &ApiClient, subscription: Subscription<T>) -> Self {
        let (handle, reader) = sync::start(runtime, api.clone(), subscription);
        Self {
            snapshot: reader.read(),
            reader,
            _handle: Some(handle),
        }
    }
}

impl<T: Clone> Feed<T> {
    /// A feed over a cell somebody else writes.  Used by tests to drive a
    /// card without a scheduler.
    pub fn detached(reader: CellReader<T>) -> Self {
        Self {
            snapshot: reader.read(),
            reader,
            _handle: None,
        }
    }

    /// Pull the latest snapshot if a tick completed.  `true` if it changed.
    pub fn refresh(&mut self) -> bool {
        match self.reader.take_change() {
            Some(snapshot) => {
                self.snapshot = snapshot;
                true
            }
            None => false,
        }
    }

    /// The underlying cell, for observers outside the frame loop.
    pub fn reader(&self) -> &CellReader<T> {
        &self.reader
    }

    pub fn snapshot(&self) -> &SyncSnapshot<T> {
        &self.snapshot
    }

    pub fn value(&self) -> Option<&T> {
        self.snapshot.value.as_ref()
    }

    /// Has the feed had at least one success and is it currently healthy?
    pub fn is_healthy(&self) -> bool {
        self.snapshot.value.is_some() && self.snapshot.last_error.is_none()
    }
}

/// Every card on the dashboard.
pub struct Cards {
    pub clock: ClockCard,
    pub timer: TimerCard,
    pub camera: CameraCard,
    pub iot: IotCard,
    pub detection: DetectionCard,
    pub graph: GraphCard,
}

impl Cards {
    /// Start every feed on `runtime`.
    pub fn mount(runtime: &Handle, api: &ApiClient, config: &Config) -> anyhow::Result<Self> {
        let backoff = config.backoff();

        let timer_time: Feed<TimerTime> =
            live(runtime, api, "timer-time", api.timer_time(), decode_json, backoff)?;
        let devices: Feed<DeviceList> =
            live(runtime, api, "devices", api.devices(), decode_json, backoff)?;
        let last_message: Feed<LastMessage> =
            live(runtime, api, "last-message", api.last_message(), decode_json, backoff)?;
        let detection = live(
            runtime,
            api,
            "last-detection",
            api.last_detection(),
            Detection::decode,
            backoff,
        )?;

        let history = |kind: SensorKind| -> anyhow::Result<Feed<SensorHistory>> {
            let sub = Subscription::new(
                format!("sensor-history/{kind}"),
                api.sensor_history(&config.device, kind, config.history_hours),
                SensorHistory::decode,
                HISTORY_INTERVAL,
            )?
            .with_backoff(backoff);
            Ok(Feed::start(runtime, api, sub))
        };
        let temperature = history(SensorKind::Temperature)?;
        let humidity = history(SensorKind::Humidity)?;

        Ok(Self {
            clock: ClockCard::new(timer_time),
            timer: TimerCard::default(),
            camera: CameraCard::default(),
            iot: IotCard::new(devices, last_message),
            detection: DetectionCard::new(detection),
            graph: GraphCard::new(&config.device, config.history_hours, temperature, humidity),
        })
    }

    /// Take new snapshots from every feed.  `true` if anything changed.
    pub fn refresh(&mut self) -> bool {
        // Non-short-circuiting: every card must drain its feeds.
        self.clock.refresh() | self.iot.refresh() | self.detection.refresh() | self.graph.refresh()
    }

    /// `(healthy, total)` over all polled feeds, for the status bar.
    pub fn feed_health(&self) -> (usize, usize) {
        let healthy = [
            self.clock.feed().is_healthy(),
            self.iot.devices().is_healthy(),
            self.iot.last_message().is_healthy(),
            self.detection.feed().is_healthy(),
            self.graph.feed(SensorKind::Temperature).is_healthy(),
            self.graph.feed(SensorKind::Humidity).is_healthy(),
        ];
        (healthy.iter().filter(|ok| **ok).count(), healthy.len())
    }
}

/// Start a feed on the one-second cadence.
fn live<T: Clone + Send + Sync + 'static>(
    runtime: &Handle,
    api: &ApiClient,
    id: &str,
    request: Request,
    decode: fn(Value) -> FetchOutcome<T>,
    backoff: Option<Backoff>,
) -> anyhow::Result<Feed<T>> {
    let sub = Subscription::new(id, request, decode, LIVE_INTERVAL)?.with_backoff(backoff);
    Ok(Feed::start(runtime, api, sub))
}

// ---------------------------------------------------------------------------
// Shared rendering helpers
// ---------------------------------------------------------------------------

/// Bordered block for a card; highlighted when it has keyboard focus.
pub(crate) fn card_block(title: &str, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::bordered()
        .title(format!(" {title} "))
        .border_style(style)
}

/// Placeholder and error annotation for a feed, if it needs either.
///
/// * nothing yet: `no data` (plus the error, if the first attempts failed)
/// * value shown but latest attempt failed: a warning with the error and
///   the time of the value being shown
pub(crate) fn feed_notes<T>(snapshot: &SyncSnapshot<T>) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if snapshot.value.is_none() {
        lines.push(Line::from(Span::styled(
            "no data",
            Style::default().fg(Color::DarkGray),
        )));
    }
    if let Some(err) = &snapshot.last_error {
        let mut text = format!("⚠ {err}");
        if let Some(at) = snapshot.last_updated_at {
            text.push_str(&format!(" (showing {})", at.format("%H:%M:%S")));
        }
        lines.push(Line::from(Span::styled(text, Style::default().fg(Color::Yellow))));
    }
    lines
}

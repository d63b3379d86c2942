//! Payload types returned by the backend, and their decode functions.
//!
//! Plain payloads derive [`Deserialize`] and are decoded with
//! [`decode_json`].  Payloads that carry base64 images or need reshaping get
//! their own `decode` function so pollers and commands see ready-to-use
//! values.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{FetchError, FetchOutcome};

/// Decode a JSON body straight into `T`.
pub fn decode_json<T: DeserializeOwned>(value: Value) -> FetchOutcome<T> {
    Ok(serde_json::from_value(value)?)
}

fn decode_image(encoded: &str) -> FetchOutcome<Vec<u8>> {
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| FetchError::Decode(format!("image is not valid base64: {e}")))
}

/// `GET /api/timer-time`.  The server reports `"No timer set"` here when no
/// alarm is armed, so this is display text rather than a parsed time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimerTime {
    pub timer_time: String,
}

/// `GET /api/get-last-message`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LastMessage {
    pub message: String,
}

/// `GET /api/devices`.  Order is the server's and is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceList {
    pub devices: Vec<String>,
}

/// `GET /api/take-image`, with the image already base64-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// JPEG bytes.
    pub image: Vec<u8>,
    pub message: String,
    /// Classifier verdict, e.g. `on-bed`.
    pub result: String,
}

impl Capture {
    pub fn decode(value: Value) -> FetchOutcome<Self> {
        #[derive(Deserialize)]
        struct Wire {
            image: String,
            message: String,
            result: String,
        }

        let wire: Wire = serde_json::from_value(value)?;
        Ok(Self {
            image: decode_image(&wire.image)?,
            message: wire.message,
            result: wire.result,
        })
    }
}

/// `GET /api/last-detection` when the server has one to report.
///
/// The "no detection yet" case arrives as `{status: "error", message}` and is
/// turned into [`FetchError::Application`] by the adapter before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub result: String,
    pub time: String,
    pub image: Option<Vec<u8>>,
}

impl Detection {
    pub fn decode(value: Value) -> FetchOutcome<Self> {
        #[derive(Deserialize)]
        struct Wire {
            detection_result: Value,
            detection_time: Value,
            #[serde(default)]
            image: Option<String>,
        }

        let wire: Wire = serde_json::from_value(value)?;
        let image = match wire.image.as_deref() {
            None | Some("") => None,
            Some(encoded) => Some(decode_image(encoded)?),
        };
        Ok(Self {
            result: display_text(wire.detection_result),
            time: display_text(wire.detection_time),
            image,
        })
    }
}

// The classifier result is usually a bare label but nothing pins its type.
fn display_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// One reading from `GET /api/sensor-history/{device}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SensorPoint {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// Sensor readings, oldest first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SensorHistory {
    pub points: Vec<SensorPoint>,
}

impl SensorHistory {
    /// The server returns newest first; charts want oldest first.
    pub fn decode(value: Value) -> FetchOutcome<Self> {
        #[derive(Deserialize)]
        struct Wire {
            data: Vec<SensorPoint>,
        }

        let mut points = serde_json::from_value::<Wire>(value)?.data;
        points.sort_by_key(|p| p.timestamp);
        Ok(Self { points })
    }

    pub fn latest(&self) -> Option<&SensorPoint> {
        self.points.last()
    }

    /// `(min, max)` of the values, or `None` when there are no points.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.points.iter().map(|p| p.value).fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

/// A wall-clock alarm time, serialised as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AlarmTime {
    hours: u8,
    minutes: u8,
}

impl AlarmTime {
    pub const MAX_HOURS: u8 = 23;
    pub const MAX_MINUTES: u8 = 59;

    /// `None` if either field is out of range.
    pub fn new(hours: u8, minutes: u8) -> Option<Self> {
        (hours <= Self::MAX_HOURS && minutes <= Self::MAX_MINUTES)
            .then_some(Self { hours, minutes })
    }

    pub fn hours(&self) -> u8 {
        self.hours
    }

    pub fn minutes(&self) -> u8 {
        self.minutes
    }
}

impl fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hours, self.minutes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

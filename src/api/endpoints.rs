//! Request builders, one per backend endpoint.

use std::fmt;

use serde_json::json;

use super::{AlarmTime, ApiClient, Request};

/// Which series to ask `sensor-history` for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Temperature,
    Humidity,
}

impl SensorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "temperature",
            SensorKind::Humidity => "humidity",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "°C",
            SensorKind::Humidity => "%",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ApiClient {
    pub fn set_timer(&self, time: AlarmTime) -> Request {
        Request::Post(
            self.url(&["api", "set-timer"]),
            json!({ "time": time.to_string() }),
        )
    }

    pub fn timer_time(&self) -> Request {
        Request::Get(self.url(&["api", "timer-time"]))
    }

    pub fn take_image(&self) -> Request {
        Request::Get(self.url(&["api", "take-image"]))
    }

    pub fn last_message(&self) -> Request {
        Request::Get(self.url(&["api", "get-last-message"]))
    }

    pub fn devices(&self) -> Request {
        Request::Get(self.url(&["api", "devices"]))
    }

    pub fn send_toggle(&self, device: &str) -> Request {
        Request::Get(self.url(&["api", "send_toggle", device]))
    }

    pub fn last_detection(&self) -> Request {
        Request::Get(self.url(&["api", "last-detection"]))
    }

    pub fn sensor_history(&self, device: &str, kind: SensorKind, hours: u32) -> Request {
        let mut url = self.url(&["api", "sensor-history", device]);
        url.query_pairs_mut()
            .append_pair("sensor_id", kind.as_str())
            .append_pair("hours", &hours.to_string());
        Request::Get(url)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{client, Reply, ScriptedTransport};
    use super::*;

    fn api() -> ApiClient {
        client(ScriptedTransport::new(Reply::json(json!({}))))
    }

    #[test]
    fn set_timer_posts_hh_mm() {
        let req = api().set_timer(AlarmTime::new(6, 45).unwrap());
        assert_eq!(req.method(), "POST");
        assert_eq!(req.url().path(), "/api/set-timer");
        match req {
            Request::Post(_, body) => assert_eq!(body, json!({"time": "06:45"})),
            Request::Get(_) => panic!("expected POST"),
        }
    }

    #[test]
    fn toggle_substitutes_device_into_path() {
        let req = api().send_toggle("lamp1");
        assert_eq!(req.method(), "GET");
        assert_eq!(req.url().as_str(), "http://alarm.test:5502/api/send_toggle/lamp1");
    }

    #[test]
    fn sensor_history_carries_query() {
        let req = api().sensor_history("alarm-clock", SensorKind::Humidity, 1);
        assert_eq!(
            req.url().as_str(),
            "http://alarm.test:5502/api/sensor-history/alarm-clock?sensor_id=humidity&hours=1"
        );
    }

    #[test]
    fn polled_endpoints_are_gets() {
        let api = api();
        for (req, path) in [
            (api.timer_time(), "/api/timer-time"),
            (api.take_image(), "/api/take-image"),
            (api.last_message(), "/api/get-last-message"),
            (api.devices(), "/api/devices"),
            (api.last_detection(), "/api/last-detection"),
        ] {
            assert_eq!(req.method(), "GET");
            assert_eq!(req.url().path(), path);
        }
    }
}

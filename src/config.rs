//! Process configuration, resolved once at startup.
//!
//! Flags win over environment variables, which win over the built-in
//! development defaults.  The resulting [`Config`] is shared read-only as an
//! `Arc<Config>`; nothing reconfigures at runtime.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::sync::Backoff;

/// Backend address used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5502";

#[derive(Debug, Clone, Parser)]
#[command(name = "alarm-dash", version, about = "Live terminal dashboard for the light-controlled alarm")]
pub struct Config {
    /// Base URL of the alarm backend.
    #[arg(long, env = "ALARM_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: Url,

    /// Device whose temperature and humidity history is graphed.
    #[arg(long, env = "ALARM_SENSOR_DEVICE", default_value = "alarm-clock")]
    pub device: String,

    /// How many hours of sensor history to graph.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub history_hours: u32,

    /// Per-request timeout in milliseconds.
    #[arg(long, default_value_t = 5000, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: u64,

    /// Back off on repeated network errors, waiting at most this many
    /// seconds between attempts.  Off when unset.
    #[arg(long, value_name = "SECS")]
    pub backoff_cap_secs: Option<u64>,

    /// Where log lines go.  The terminal belongs to the UI.
    #[arg(long, env = "ALARM_LOG_FILE", default_value = "alarm-dash.log")]
    pub log_file: PathBuf,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn backoff(&self) -> Option<Backoff> {
        self.backoff_cap_secs
            .map(|secs| Backoff::capped_at(Duration::from_secs(secs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_backend() {
        let cfg = Config::try_parse_from(["alarm-dash"]).unwrap();
        // Only meaningful when the environment doesn't override it.
        if std::env::var_os("ALARM_API_URL").is_none() {
            assert_eq!(cfg.api_url.as_str(), "http://localhost:5502/");
        }
        assert_eq!(cfg.history_hours, 1);
        assert_eq!(cfg.timeout(), Duration::from_secs(5));
        assert!(cfg.backoff().is_none());
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = Config::try_parse_from([
            "alarm-dash",
            "--api-url",
            "https://alarm.example/api-root/",
            "--device",
            "bedroom",
            "--history-hours",
            "6",
            "--backoff-cap-secs",
            "30",
        ])
        .unwrap();
        assert_eq!(cfg.api_url.as_str(), "https://alarm.example/api-root/");
        assert_eq!(cfg.device, "bedroom");
        assert_eq!(cfg.history_hours, 6);
        assert_eq!(cfg.backoff(), Some(Backoff::capped_at(Duration::from_secs(30))));
    }

    #[test]
    fn rejects_garbage_url_and_zero_hours() {
        assert!(Config::try_parse_from(["alarm-dash", "--api-url", "not a url"]).is_err());
        assert!(Config::try_parse_from(["alarm-dash", "--history-hours", "0"]).is_err());
    }
}

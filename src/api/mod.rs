//! Fetch adapter for the alarm backend.
//!
//! This module turns one HTTP exchange into a [`FetchOutcome`].  It knows
//! nothing about timers or cards: pollers in [`crate::sync`] and the one-shot
//! commands in [`crate::command`] both go through [`ApiClient`].
//!
//! ## For contributors — adding a new endpoint
//!
//! 1. Add a request builder to `endpoints.rs` (path segments are
//!    percent-encoded for you by [`ApiClient::url`]).
//! 2. If the payload needs more than a plain `serde` derive, add a decode
//!    function next to the payload type in `types.rs`.
//! 3. Poll it by building a [`crate::sync::Subscription`], or call
//!    [`ApiClient::fetch`] / [`ApiClient::ack`] directly for a one-shot.
//!
//! The HTTP stack sits behind the [`Transport`] trait so tests can script
//! responses without a server.

mod endpoints;
mod http;
mod types;

pub use endpoints::SensorKind;
pub use http::HttpTransport;
pub use types::{
    decode_json, AlarmTime, Capture, Detection, DeviceList, LastMessage, SensorHistory,
    SensorPoint, TimerTime,
};

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::error::{FetchError, FetchOutcome};

/// A fully resolved request.  Query strings and path parameters are already
/// substituted.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Get(Url),
    Post(Url, Value),
}

impl Request {
    pub fn url(&self) -> &Url {
        match self {
            Request::Get(url) | Request::Post(url, _) => url,
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Request::Get(_) => "GET",
            Request::Post(..) => "POST",
        }
    }
}

/// Status line and body of a response, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// The request never produced a response.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Something that can perform one HTTP exchange.
///
/// Implementations must not retry; a failed exchange is reported as-is and
/// the caller decides what to do next.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &Request) -> Result<RawResponse, TransportError>;
}

/// Typed front door to the backend.
///
/// Cheap to clone: the base URL is small and the transport is shared.
#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    /// Bind a base URL to a transport.
    ///
    /// The base must be an `http`/`https` URL that can carry path segments;
    /// any path prefix on it (e.g. `https://host/alarm/`) is kept.
    pub fn new(base: Url, transport: Arc<dyn Transport>) -> anyhow::Result<Self> {
        anyhow::ensure!(
            matches!(base.scheme(), "http" | "https") && !base.cannot_be_a_base(),
            "api url must be an http(s) url, got {base}"
        );
        Ok(Self { base, transport })
    }

    /// Append `segments` to the base path, percent-encoding each one.
    pub fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        // Cannot fail: `new` rejected cannot-be-a-base URLs.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Perform `request` and return its JSON body.
    ///
    /// A 2xx body of `{"status": <anything but "success">, "message": ..}`
    /// is an [`FetchError::Application`] failure, not a success.
    pub async fn fetch(&self, request: &Request) -> FetchOutcome<Value> {
        let response = self.exchange(request).await?;
        let body: Value = serde_json::from_slice(&response.body)?;
        check_status(&body)?;
        Ok(body)
    }

    /// Perform `request` when any 2xx body counts as success.
    ///
    /// Empty and non-JSON bodies are accepted; an explicit error status in a
    /// JSON body still fails.
    pub async fn ack(&self, request: &Request) -> FetchOutcome<()> {
        let response = self.exchange(request).await?;
        if let Ok(body) = serde_json::from_slice::<Value>(&response.body) {
            check_status(&body)?;
        }
        Ok(())
    }

    async fn exchange(&self, request: &Request) -> FetchOutcome<RawResponse> {
        debug!(method = request.method(), url = %request.url(), "request");
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !(200..300).contains(&response.status) {
            return Err(FetchError::Http(response.status));
        }
        Ok(response)
    }
}

fn check_status(body: &Value) -> FetchOutcome<()> {
    match body.get("status") {
        None => Ok(()),
        Some(Value::String(s)) if s == "success" => Ok(()),
        Some(_) => {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("request failed");
            Err(FetchError::Application(message.to_string()))
        }
    }
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------

/// A scripted [`Transport`] shared by the unit tests of several modules.
#[cfg(test)]
pub mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    /// One scripted reply: wait `delay` (on tokio's clock), then answer.
    #[derive(Clone)]
    pub struct Reply {
        pub delay: Duration,
        pub result: Result<RawResponse, String>,
    }

    impl Reply {
        pub fn json(body: Value) -> Self {
            Self {
                delay: Duration::ZERO,
                result: Ok(RawResponse {
                    status: 200,
                    body: body.to_string().into_bytes(),
                }),
            }
        }

        pub fn status(status: u16, body: &str) -> Self {
            Self {
                delay: Duration::ZERO,
                result: Ok(RawResponse {
                    status,
                    body: body.as_bytes().to_vec(),
                }),
            }
        }

        pub fn network(msg: &str) -> Self {
            Self {
                delay: Duration::ZERO,
                result: Err(msg.to_string()),
            }
        }

        pub fn after(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    /// Replays queued replies in order, repeating `fallback` once the queue
    /// is drained.  Records every request and when it was sent.
    pub struct ScriptedTransport {
        queue: Mutex<VecDeque<Reply>>,
        fallback: Reply,
        log: Mutex<Vec<(tokio::time::Instant, Request)>>,
    }

    impl ScriptedTransport {
        pub fn new(fallback: Reply) -> Arc<Self> {
            Arc::new(Self {
                queue: Mutex::new(VecDeque::new()),
                fallback,
                log: Mutex::new(Vec::new()),
            })
        }

        pub fn push(&self, reply: Reply) {
            self.queue.lock().unwrap().push_back(reply);
        }

        pub fn requests(&self) -> Vec<(tokio::time::Instant, Request)> {
            self.log.lock().unwrap().clone()
        }

        pub fn urls(&self) -> Vec<String> {
            self.requests()
                .into_iter()
                .map(|(_, r)| r.url().to_string())
                .collect()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: &Request) -> Result<RawResponse, TransportError> {
            self.log
                .lock()
                .unwrap()
                .push((tokio::time::Instant::now(), request.clone()));
            let reply = self
                .queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone());
            if !reply.delay.is_zero() {
                tokio::time::sleep(reply.delay).await;
            }
            reply.result.map_err(TransportError)
        }
    }

    pub fn client(transport: Arc<ScriptedTransport>) -> ApiClient {
        ApiClient::new(Url::parse("http://alarm.test:5502").unwrap(), transport).unwrap()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::testing::{client, Reply, ScriptedTransport};
    use super::*;
    use serde_json::json;

    fn get(api: &ApiClient) -> Request {
        Request::Get(api.url(&["api", "devices"]))
    }

    #[test]
    fn rejects_non_http_base() {
        let transport = ScriptedTransport::new(Reply::json(json!({})));
        let base = Url::parse("mailto:alarm@example.com").unwrap();
        assert!(ApiClient::new(base, transport).is_err());
    }

    #[test]
    fn url_keeps_base_path_prefix_and_encodes_segments() {
        let transport = ScriptedTransport::new(Reply::json(json!({})));
        let api = ApiClient::new(Url::parse("https://host/alarm/?x=1").unwrap(), transport).unwrap();
        let url = api.url(&["api", "send_toggle", "desk lamp/2"]);
        assert_eq!(url.as_str(), "https://host/alarm/api/send_toggle/desk%20lamp%2F2");
    }

    #[test]
    fn url_on_bare_host() {
        let api = client(ScriptedTransport::new(Reply::json(json!({}))));
        assert_eq!(
            api.url(&["api", "timer-time"]).as_str(),
            "http://alarm.test:5502/api/timer-time"
        );
    }

    #[tokio::test]
    async fn fetch_returns_json_body_on_2xx() {
        let api = client(ScriptedTransport::new(Reply::json(json!({"devices": ["lamp1"]}))));
        let body = api.fetch(&get(&api)).await.unwrap();
        assert_eq!(body, json!({"devices": ["lamp1"]}));
    }

    #[tokio::test]
    async fn explicit_success_status_is_success() {
        let api = client(ScriptedTransport::new(Reply::json(
            json!({"status": "success", "devices": []}),
        )));
        assert!(api.fetch(&get(&api)).await.is_ok());
    }

    #[tokio::test]
    async fn error_status_is_application_error() {
        let api = client(ScriptedTransport::new(Reply::json(
            json!({"status": "error", "message": "no detection"}),
        )));
        assert_eq!(
            api.fetch(&get(&api)).await,
            Err(FetchError::Application("no detection".into()))
        );
    }

    #[tokio::test]
    async fn error_status_without_message_gets_generic_text() {
        let api = client(ScriptedTransport::new(Reply::json(json!({"status": "error"}))));
        assert_eq!(
            api.fetch(&get(&api)).await,
            Err(FetchError::Application("request failed".into()))
        );
    }

    #[tokio::test]
    async fn non_2xx_is_http_error_even_with_json_body() {
        let api = client(ScriptedTransport::new(Reply::status(
            500,
            r#"{"status":"error","message":"Failed to get device list"}"#,
        )));
        assert_eq!(api.fetch(&get(&api)).await, Err(FetchError::Http(500)));
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let api = client(ScriptedTransport::new(Reply::status(200, "<html>")));
        assert!(matches!(api.fetch(&get(&api)).await, Err(FetchError::Decode(_))));
    }

    #[tokio::test]
    async fn transport_failure_is_network_error() {
        let api = client(ScriptedTransport::new(Reply::network("connection refused")));
        assert_eq!(
            api.fetch(&get(&api)).await,
            Err(FetchError::Network("connection refused".into()))
        );
    }

    #[tokio::test]
    async fn ack_accepts_empty_body() {
        let api = client(ScriptedTransport::new(Reply::status(204, "")));
        assert_eq!(api.ack(&get(&api)).await, Ok(()));
    }

    #[tokio::test]
    async fn ack_still_reports_application_errors() {
        let api = client(ScriptedTransport::new(Reply::json(
            json!({"status": "error", "message": "WebSocket server not running"}),
        )));
        assert_eq!(
            api.ack(&get(&api)).await,
            Err(FetchError::Application("WebSocket server not running".into()))
        );
    }
}

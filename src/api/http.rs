//! The production [`Transport`], backed by `reqwest`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{RawResponse, Request, Transport, TransportError};

/// Async HTTP client with a fixed per-request timeout.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self::from_client(client))
    }

    /// Wrap an already configured client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &Request) -> Result<RawResponse, TransportError> {
        let builder = match request {
            Request::Get(url) => self.client.get(url.clone()),
            Request::Post(url, body) => self.client.post(url.clone()).json(body),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests against a real socket
// ---------------------------------------------------------------------------

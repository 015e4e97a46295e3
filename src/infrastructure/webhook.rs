//! HTTP notifier posting messages to a chat webhook.
//!
//! Wire contract: `POST <uri>` with `accept: application/json` and a UTF-8
//! JSON body `{"text": "<message>"}`. Only status 200 counts as delivered.

use crate::application::ports::Notifier;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const APPLICATION_JSON: &str = "application/json";

/// Reasons a single delivery attempt failed.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("failed to serialize chat message: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to send chat message: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("chat webhook rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    text: &'a str,
}

/// Notifier delivering messages to a chat webhook over HTTP.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: Client,
    uri: Url,
}

impl WebhookClient {
    /// Create a client for `uri` with a per-request timeout.
    pub fn new(uri: Url, request_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self { client, uri })
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// Post one message.
    pub async fn send(&self, text: &str) -> Result<(), DeliveryError> {
        let body = serde_json::to_vec(&ChatMessage { text })?;

        let response = self
            .client
            .post(self.uri.clone())
            .header(ACCEPT, APPLICATION_JSON)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

impl Notifier for WebhookClient {
    type Error = DeliveryError;

    async fn notify(&self, text: &str) -> Result<(), DeliveryError> {
        self.send(text).await
    }
}

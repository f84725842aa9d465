//! Reqwest-backed email sender adapter.
//!
//! This adapter owns transport details only: request serialisation, timeout
//! and HTTP error mapping, and decoding the provider acknowledgement. The
//! provider is an HTTP function that accepts a JSON body and relays it to the
//! mail system.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{EmailReceipt, EmailRequest, EmailSender, EmailSenderError};

const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON body posted to the email function.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailDispatchDto<'a> {
    to: &'a str,
    title: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification_id: Option<uuid::Uuid>,
}

/// Acknowledgement body returned by the email function on success.
///
/// The body is optional; an empty 2xx response is still a successful send.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct EmailAckDto {
    #[serde(default)]
    provider_id: Option<String>,
}

/// Email sender adapter that performs HTTP POST requests against one endpoint.
pub struct HttpEmailSender {
    client: Client,
    endpoint: Url,
}

impl HttpEmailSender {
    /// Build an adapter with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url) -> Result<Self, reqwest::Error> {
        Self::with_timeout(endpoint, DEFAULT_SEND_TIMEOUT)
    }

    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_timeout(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, request: &EmailRequest) -> Result<EmailReceipt, EmailSenderError> {
        let body = EmailDispatchDto {
            to: request.to.as_ref(),
            title: &request.title,
            message: &request.message,
            notification_id: request.notification_id.map(|id| *id.as_uuid()),
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let payload = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, payload.as_ref()));
        }

        Ok(parse_receipt(payload.as_ref()))
    }
}

fn parse_receipt(body: &[u8]) -> EmailReceipt {
    let ack: EmailAckDto = serde_json::from_slice(body).unwrap_or_default();
    EmailReceipt {
        provider_id: ack.provider_id,
    }
}

fn map_transport_error(error: reqwest::Error) -> EmailSenderError {
    if error.is_timeout() {
        EmailSenderError::transport(format!("send timed out: {error}"))
    } else {
        EmailSenderError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> EmailSenderError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    if status.is_client_error() {
        EmailSenderError::rejected(message)
    } else {
        EmailSenderError::upstream(message)
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

//! HTTP client for the Pusher Channels REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::auth::signed_params;
use super::{validate_trigger, PusherClient};
use crate::config::{Credentials, PusherSettings};
use crate::error::{ErrorCode, PusherableError, PusherableResult};

#[derive(Serialize)]
struct TriggerBody<'a> {
    name: &'a str,
    channels: &'a [String],
    /// Pusher expects the event data as a JSON-encoded string.
    data: &'a str,
}

/// Pusher client that publishes over the REST API.
#[derive(Clone)]
pub struct HttpPusher {
    client: Client,
    credentials: Credentials,
    base_url: String,
}

impl HttpPusher {
    /// Create a client; fails if any credential is missing.
    pub fn new(settings: &PusherSettings) -> PusherableResult<Self> {
        let credentials = settings.credentials()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| {
                PusherableError::configuration(
                    ErrorCode::ConfInvalidClient,
                    format!("Failed to create HTTP client: {}", e),
                )
            })?;

        Ok(Self {
            client,
            credentials,
            base_url: settings.api_base_url(),
        })
    }

    /// Application id requests are sent for.
    pub fn app_id(&self) -> &str {
        &self.credentials.app_id
    }

    fn events_path(&self) -> String {
        format!("/apps/{}/events", self.credentials.app_id)
    }

    fn signed_url(&self, path: &str, body: &str, timestamp: i64) -> PusherableResult<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path)).map_err(|e| {
            PusherableError::configuration(
                ErrorCode::ConfInvalidClient,
                format!("Invalid Pusher URL {}{}: {}", self.base_url, path, e),
            )
        })?;

        let params = signed_params(
            &self.credentials.key,
            self.credentials.secret.expose_secret(),
            "POST",
            path,
            body,
            timestamp,
        )?;
        url.query_pairs_mut().extend_pairs(params.iter());
        Ok(url)
    }
}

#[async_trait]
impl PusherClient for HttpPusher {
    async fn trigger(
        &self,
        channels: &[String],
        event_name: &str,
        data: &Value,
    ) -> PusherableResult<()> {
        let encoded = serde_json::to_string(data)?;
        validate_trigger(channels, event_name, &encoded)?;

        let body = serde_json::to_string(&TriggerBody {
            name: event_name,
            channels,
            data: &encoded,
        })?;
        let path = self.events_path();
        let url = self.signed_url(&path, &body, chrono::Utc::now().timestamp())?;

        debug!(
            app_id = %self.credentials.app_id,
            event = %event_name,
            channels = ?channels,
            bytes = encoded.len(),
            "Triggering Pusher event"
        );

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(PusherableError::network)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        warn!(
            status = %status.as_u16(),
            event = %event_name,
            body = %text,
            "Pusher rejected trigger"
        );
        Err(PusherableError::from_http_status(status.as_u16(), &text))
    }
}

//! Messaging client trait and the Pusher REST implementation.
//!
//! [`PusherClient::trigger`] is the only network boundary in the crate.
//! Limits mirror the ones the Pusher API enforces, so bad input is rejected
//! locally without a round trip.

mod auth;
mod http;

pub use auth::{body_md5, sign};
pub use http::HttpPusher;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{ErrorCode, PusherableError, PusherableResult};

/// Maximum channels per trigger call.
pub const MAX_CHANNELS: usize = 100;

/// Maximum length of a channel name.
pub const MAX_CHANNEL_NAME_LEN: usize = 200;

/// Maximum length of an event name.
pub const MAX_EVENT_NAME_LEN: usize = 200;

/// Maximum size of the encoded event data in bytes.
pub const MAX_DATA_BYTES: usize = 10_240;

static CHANNEL_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_=@,.;]+$").expect("valid channel name pattern"));

/// Client for publishing events to channels.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PusherClient: Send + Sync {
    /// Publish one event with `data` to every channel in `channels`.
    async fn trigger(
        &self,
        channels: &[String],
        event_name: &str,
        data: &Value,
    ) -> PusherableResult<()>;
}

/// Check a channel name against the characters and length Pusher accepts.
pub fn validate_channel(channel: &str) -> PusherableResult<()> {
    if channel.len() > MAX_CHANNEL_NAME_LEN {
        return Err(PusherableError::validation(
            ErrorCode::ValInvalidChannel,
            format!("Channel too long: {}", channel),
        ));
    }
    if !CHANNEL_NAME.is_match(channel) {
        return Err(PusherableError::validation(
            ErrorCode::ValInvalidChannel,
            format!("Invalid channel: {}", channel),
        ));
    }
    Ok(())
}

/// Validate a trigger request before it is sent.
pub(crate) fn validate_trigger(
    channels: &[String],
    event_name: &str,
    encoded_data: &str,
) -> PusherableResult<()> {
    if channels.is_empty() || channels.len() > MAX_CHANNELS {
        return Err(PusherableError::validation(
            ErrorCode::ValInvalidChannel,
            format!(
                "Trigger needs between 1 and {} channels, got {}",
                MAX_CHANNELS,
                channels.len()
            ),
        ));
    }
    for channel in channels {
        validate_channel(channel)?;
    }
    if event_name.is_empty() || event_name.len() > MAX_EVENT_NAME_LEN {
        return Err(PusherableError::validation(
            ErrorCode::ValInvalidEventName,
            format!("Event name must be 1 to {} characters", MAX_EVENT_NAME_LEN),
        ));
    }
    if encoded_data.len() > MAX_DATA_BYTES {
        return Err(PusherableError::validation(
            ErrorCode::ValPayloadTooLarge,
            format!(
                "Event data is {} bytes, limit is {}",
                encoded_data.len(),
                MAX_DATA_BYTES
            ),
        ));
    }
    Ok(())
}

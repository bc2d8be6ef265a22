//! Error types for pusherable operations.
//!
//! Configuration problems are kept apart from transport failures so that a
//! hosting view can tell "this deployment is misconfigured" from "Pusher
//! rejected or did not answer the request".

use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for pusherable operations.
pub type PusherableResult<T> = Result<T, PusherableError>;

/// Main error type for all pusherable operations.
#[derive(Error, Debug)]
pub enum PusherableError {
    /// Required settings are missing or invalid.
    #[error("Configuration error: {message}")]
    Configuration { message: String, code: ErrorCode },

    /// Input rejected before anything was sent.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        details: HashMap<String, String>,
    },

    /// Pusher refused the credentials or the signature.
    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Transport failure or unexpected response from Pusher.
    #[error("Network error: {message}")]
    Network {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Configuration (CONF_xxx)
    ConfMissingCredentials,
    ConfMissingEventName,
    ConfInvalidFile,
    ConfInvalidClient,

    // Validation (VAL_xxx)
    ValMissingField,
    ValNotAnObject,
    ValInvalidChannel,
    ValInvalidEventName,
    ValPayloadTooLarge,
    ValRejected,

    // Authentication (AUTH_xxx)
    AuthRejected,

    // Network (NET_xxx)
    NetTimeout,
    NetConnectionFailed,
    NetUnexpectedStatus,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfMissingCredentials => "CONF_001",
            ErrorCode::ConfMissingEventName => "CONF_002",
            ErrorCode::ConfInvalidFile => "CONF_003",
            ErrorCode::ConfInvalidClient => "CONF_004",
            ErrorCode::ValMissingField => "VAL_001",
            ErrorCode::ValNotAnObject => "VAL_002",
            ErrorCode::ValInvalidChannel => "VAL_003",
            ErrorCode::ValInvalidEventName => "VAL_004",
            ErrorCode::ValPayloadTooLarge => "VAL_005",
            ErrorCode::ValRejected => "VAL_006",
            ErrorCode::AuthRejected => "AUTH_001",
            ErrorCode::NetTimeout => "NET_001",
            ErrorCode::NetConnectionFailed => "NET_002",
            ErrorCode::NetUnexpectedStatus => "NET_003",
        }
    }
}

impl PusherableError {
    /// Create a configuration error.
    pub fn configuration(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            code,
        }
    }

    /// Create a validation error.
    pub fn validation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code,
            details: HashMap::new(),
        }
    }

    /// Create a missing-field error for a model.
    pub fn missing_field(model: &str, field: &str) -> Self {
        let mut details = HashMap::new();
        details.insert("model".to_string(), model.to_string());
        details.insert("field".to_string(), field.to_string());
        Self::Validation {
            message: format!("{} has no field named '{}'", model, field),
            code: ErrorCode::ValMissingField,
            details,
        }
    }

    /// Create a network error from a transport failure.
    pub fn network(err: reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            ErrorCode::NetTimeout
        } else {
            ErrorCode::NetConnectionFailed
        };
        Self::Network {
            message: err.to_string(),
            code,
            source: Some(Box::new(err)),
        }
    }

    /// Get the error code.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Configuration { code, .. } => Some(*code),
            Self::Validation { code, .. } => Some(*code),
            Self::Authentication { code, .. } => Some(*code),
            Self::Network { code, .. } => Some(*code),
            Self::Io(_) | Self::Serialization(_) => None,
        }
    }

    /// True for errors caused by missing or invalid settings.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self.code()? {
            ErrorCode::ConfMissingCredentials => Some(
                "Make sure PUSHER_APP_ID, PUSHER_KEY and PUSHER_SECRET are set in your settings",
            ),
            ErrorCode::ConfMissingEventName => {
                Some("Configure an event name for this hook in HookEvents")
            }
            ErrorCode::AuthRejected => Some("Please check your Pusher key and secret"),
            _ => None,
        }
    }

    /// Convert from a non-success HTTP status returned by the Pusher API.
    pub fn from_http_status(status: u16, body: &str) -> Self {
        match status {
            400 | 413 => Self::Validation {
                message: body.to_string(),
                code: ErrorCode::ValRejected,
                details: HashMap::new(),
            },
            401 | 403 => Self::Authentication {
                message: body.to_string(),
                code: ErrorCode::AuthRejected,
                source: None,
            },
            _ => Self::Network {
                message: format!("HTTP {}: {}", status, body),
                code: ErrorCode::NetUnexpectedStatus,
                source: None,
            },
        }
    }
}

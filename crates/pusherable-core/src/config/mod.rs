//! Pusher settings.
//!
//! Credentials are optional at load time and only checked when a client is
//! first needed, so a process can start without them and fail on the first
//! notification instead.

use once_cell::sync::Lazy;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

use crate::error::{ErrorCode, PusherableError, PusherableResult};

/// Default API host when neither a host nor a cluster is configured.
pub const DEFAULT_HOST: &str = "api.pusherapp.com";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 5;

static GLOBAL: Lazy<PusherSettings> = Lazy::new(PusherSettings::from_env);

/// Settings for the Pusher Channels API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PusherSettings {
    /// Application id.
    pub app_id: Option<String>,
    /// Public key, also embedded in subscription scripts.
    pub key: Option<String>,
    /// Secret used to sign API requests.
    #[serde(deserialize_with = "deserialize_secret")]
    pub secret: Option<SecretString>,
    /// Cluster name such as `eu` or `mt1`.
    pub cluster: Option<String>,
    /// Explicit API host, overrides the cluster.
    pub host: Option<String>,
    /// Explicit API port.
    pub port: Option<u16>,
    /// Use https.
    pub ssl: bool,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::new))
}

impl Default for PusherSettings {
    fn default() -> Self {
        Self {
            app_id: None,
            key: None,
            secret: None,
            cluster: None,
            host: None,
            port: None,
            ssl: true,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Validated credentials, produced by [`PusherSettings::credentials`].
#[derive(Debug, Clone)]
pub struct Credentials {
    pub app_id: String,
    pub key: String,
    pub secret: SecretString,
}

impl PusherSettings {
    /// Process-wide settings, read from the environment on first access.
    pub fn global() -> &'static PusherSettings {
        &GLOBAL
    }

    /// Load settings from environment variables.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        settings.app_id = non_empty_var("PUSHER_APP_ID");
        settings.key = non_empty_var("PUSHER_KEY");
        settings.secret = non_empty_var("PUSHER_SECRET").map(SecretString::new);
        settings.cluster = non_empty_var("PUSHER_CLUSTER");
        settings.host = non_empty_var("PUSHER_HOST");

        if let Some(port) = non_empty_var("PUSHER_PORT") {
            match port.parse() {
                Ok(port) => settings.port = Some(port),
                Err(_) => tracing::warn!(port = %port, "Ignoring invalid PUSHER_PORT"),
            }
        }
        if let Some(ssl) = non_empty_var("PUSHER_SSL") {
            settings.ssl = !matches!(ssl.to_lowercase().as_str(), "false" | "0" | "no");
        }
        if let Some(timeout) = non_empty_var("PUSHER_TIMEOUT") {
            match timeout.parse() {
                Ok(secs) => settings.timeout_secs = secs,
                Err(_) => tracing::warn!(timeout = %timeout, "Ignoring invalid PUSHER_TIMEOUT"),
            }
        }

        settings
    }

    /// Load settings from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> PusherableResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());
        let invalid = |e: String| PusherableError::configuration(ErrorCode::ConfInvalidFile, e);

        match ext {
            Some("toml") => toml::from_str(&content).map_err(|e| invalid(e.to_string())),
            Some("json") => serde_json::from_str(&content).map_err(|e| invalid(e.to_string())),
            Some("yaml" | "yml") => {
                serde_yaml::from_str(&content).map_err(|e| invalid(e.to_string()))
            }
            _ => Err(invalid(
                "Unsupported settings file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Builder: set the three required credentials.
    pub fn with_credentials(
        mut self,
        app_id: impl Into<String>,
        key: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        self.app_id = Some(app_id.into());
        self.key = Some(key.into());
        self.secret = Some(SecretString::new(secret.into()));
        self
    }

    /// Builder: set the cluster.
    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = Some(cluster.into());
        self
    }

    /// Builder: set an explicit host and port.
    pub fn with_host(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = Some(host.into());
        self.port = Some(port);
        self
    }

    /// Builder: toggle https.
    pub fn with_ssl(mut self, ssl: bool) -> Self {
        self.ssl = ssl;
        self
    }

    /// Check that app id, key and secret are all present and non-empty.
    pub fn credentials(&self) -> PusherableResult<Credentials> {
        use secrecy::ExposeSecret;

        let app_id = self.app_id.as_deref().filter(|s| !s.is_empty());
        let key = self.key.as_deref().filter(|s| !s.is_empty());
        let secret = self
            .secret
            .as_ref()
            .filter(|s| !s.expose_secret().is_empty());

        match (app_id, key, secret) {
            (Some(app_id), Some(key), Some(secret)) => Ok(Credentials {
                app_id: app_id.to_string(),
                key: key.to_string(),
                secret: secret.clone(),
            }),
            _ => Err(PusherableError::configuration(
                ErrorCode::ConfMissingCredentials,
                "Pusher settings are not defined. Make sure PUSHER_APP_ID, \
                 PUSHER_KEY and PUSHER_SECRET are set in your settings.",
            )),
        }
    }

    /// Host the API requests go to.
    pub fn api_host(&self) -> String {
        match (&self.host, &self.cluster) {
            (Some(host), _) => host.clone(),
            (None, Some(cluster)) => format!("api-{}.pusher.com", cluster),
            (None, None) => DEFAULT_HOST.to_string(),
        }
    }

    /// Port the API requests go to.
    pub fn api_port(&self) -> u16 {
        self.port.unwrap_or(if self.ssl { 443 } else { 80 })
    }

    /// Base URL such as `https://api-eu.pusher.com:443`.
    pub fn api_base_url(&self) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.api_host(), self.api_port())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;

    #[test]
    fn test_missing_credentials() {
        let err = PusherSettings::default().credentials().unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(err.code(), Some(ErrorCode::ConfMissingCredentials));

        let partial = PusherSettings {
            app_id: Some("42".to_string()),
            key: Some("key".to_string()),
            ..Default::default()
        };
        assert!(partial.credentials().is_err());
    }

    #[test]
    fn test_empty_credential_counts_as_missing() {
        let settings = PusherSettings::default().with_credentials("42", "", "secret");
        assert!(settings.credentials().is_err());
    }

    #[test]
    fn test_credentials() {
        let settings = PusherSettings::default().with_credentials("42", "key", "secret");
        let creds = settings.credentials().unwrap();
        assert_eq!(creds.app_id, "42");
        assert_eq!(creds.key, "key");
        assert_eq!(creds.secret.expose_secret(), "secret");
    }

    #[test]
    fn test_api_host_resolution() {
        let settings = PusherSettings::default();
        assert_eq!(settings.api_base_url(), "https://api.pusherapp.com:443");

        let settings = PusherSettings::default().with_cluster("eu");
        assert_eq!(settings.api_host(), "api-eu.pusher.com");

        let settings = PusherSettings::default()
            .with_cluster("eu")
            .with_host("127.0.0.1", 8080)
            .with_ssl(false);
        assert_eq!(settings.api_base_url(), "http://127.0.0.1:8080");

        let settings = PusherSettings::default().with_ssl(false);
        assert_eq!(settings.api_port(), 80);
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let settings = PusherSettings::default().with_credentials("42", "key", "hunter2");
        assert!(!format!("{:?}", settings).contains("hunter2"));
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "app_id = \"42\"\nkey = \"key\"\nsecret = \"secret\"\ncluster = \"eu\""
        )
        .unwrap();

        let settings = PusherSettings::from_file(file.path()).unwrap();
        assert_eq!(settings.cluster.as_deref(), Some("eu"));
        assert!(settings.ssl);
        assert_eq!(settings.timeout_secs, 5);
        assert!(settings.credentials().is_ok());
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "app_id: \"42\"\nssl: false\nport: 8080").unwrap();

        let settings = PusherSettings::from_file(file.path()).unwrap();
        assert_eq!(settings.api_base_url(), "http://api.pusherapp.com:8080");
        assert!(settings.credentials().is_err());
    }

    #[test]
    fn test_unsupported_file_format() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let err = PusherSettings::from_file(file.path()).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ConfInvalidFile));
    }
}

//! Notification composition and dispatch.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::channel::channel_name;
use crate::client::{HttpPusher, PusherClient};
use crate::config::PusherSettings;
use crate::error::PusherableResult;
use crate::model::{Actor, Model};
use crate::serializer::{to_json_map, FieldSelection};

/// Builds the payload sent along with an event.
///
/// Replace [`DefaultPayload`] to change what subscribers receive.
pub trait BuildPayload: Send + Sync {
    fn build(&self, object: Map<String, Value>, actor: &Actor) -> Value;
}

/// `{"object": <fields>, "user": <display name>}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPayload;

impl BuildPayload for DefaultPayload {
    fn build(&self, object: Map<String, Value>, actor: &Actor) -> Value {
        json!({
            "object": object,
            "user": actor.display_name(),
        })
    }
}

/// Publishes model notifications for one view.
///
/// The client is created on first use from the settings and then reused for
/// the lifetime of the notifier.
pub struct Notifier {
    settings: Arc<PusherSettings>,
    client: OnceCell<Arc<dyn PusherClient>>,
    payload: Arc<dyn BuildPayload>,
}

impl Notifier {
    /// Create a notifier that builds an [`HttpPusher`] on first use.
    pub fn new(settings: Arc<PusherSettings>) -> Self {
        Self {
            settings,
            client: OnceCell::new(),
            payload: Arc::new(DefaultPayload),
        }
    }

    /// Create a notifier with an already constructed client.
    pub fn with_client(settings: Arc<PusherSettings>, client: Arc<dyn PusherClient>) -> Self {
        let notifier = Self::new(settings);
        // A fresh cell is always empty.
        let _ = notifier.client.set(client);
        notifier
    }

    /// Builder: replace the payload shape.
    pub fn with_payload_builder(mut self, payload: Arc<dyn BuildPayload>) -> Self {
        self.payload = payload;
        self
    }

    pub fn settings(&self) -> &PusherSettings {
        &self.settings
    }

    /// Whether a client is attached.
    pub fn has_client(&self) -> bool {
        self.client.get().is_some()
    }

    /// Return the attached client, creating it from the settings if needed.
    ///
    /// Fails with a configuration error when credentials are missing.
    pub fn ensure_client(&self) -> PusherableResult<&Arc<dyn PusherClient>> {
        self.client.get_or_try_init(|| {
            let client = HttpPusher::new(&self.settings)?;
            debug!(app_id = %client.app_id(), "Created Pusher client");
            Ok(Arc::new(client) as Arc<dyn PusherClient>)
        })
    }

    /// Build the payload for a serialized object.
    pub fn build_payload(&self, object: Map<String, Value>, actor: &Actor) -> Value {
        self.payload.build(object, actor)
    }

    /// Publish `payload` as `event_name` on a single channel.
    ///
    /// Client errors are returned unchanged.
    pub async fn publish(
        &self,
        channel: &str,
        event_name: &str,
        payload: &Value,
    ) -> PusherableResult<()> {
        let client = self.ensure_client()?;
        client
            .trigger(&[channel.to_string()], event_name, payload)
            .await?;
        info!(channel = %channel, event = %event_name, "Published notification");
        Ok(())
    }

    /// Serialize `object` and publish it on its channel.
    pub async fn notify<M>(
        &self,
        event_name: &str,
        object: &M,
        selection: &FieldSelection,
        actor: &Actor,
    ) -> PusherableResult<()>
    where
        M: Model + Sync,
    {
        self.ensure_client()?;
        let channel = channel_name(object);
        let data = to_json_map(object, selection)?;
        let payload = self.build_payload(data, actor);
        self.publish(&channel, event_name, &payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockPusherClient;
    use crate::error::ErrorCode;
    use serde::Serialize;
    use tokio_test::assert_ok;

    #[derive(Serialize)]
    struct Task {
        id: u64,
        title: String,
    }

    impl Model for Task {
        fn type_name(&self) -> &str {
            "Task"
        }
        fn pk(&self) -> String {
            self.id.to_string()
        }
    }

    fn task() -> Task {
        Task {
            id: 7,
            title: "Ship it".to_string(),
        }
    }

    #[test]
    fn test_ensure_client_requires_credentials() {
        let notifier = Notifier::new(Arc::new(PusherSettings::default()));
        let err = notifier.ensure_client().err().unwrap();
        assert_eq!(err.code(), Some(ErrorCode::ConfMissingCredentials));
        assert!(!notifier.has_client());
    }

    #[test]
    fn test_ensure_client_is_idempotent() {
        let settings = PusherSettings::default().with_credentials("42", "key", "secret");
        let notifier = Notifier::new(Arc::new(settings));
        let first = Arc::clone(notifier.ensure_client().unwrap());
        let second = Arc::clone(notifier.ensure_client().unwrap());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_injected_client_skips_credentials() {
        let notifier = Notifier::with_client(
            Arc::new(PusherSettings::default()),
            Arc::new(MockPusherClient::new()),
        );
        assert!(notifier.has_client());
        assert_ok!(notifier.ensure_client());
    }

    #[test]
    fn test_build_payload() {
        let notifier = Notifier::new(Arc::new(PusherSettings::default()));
        let mut object = Map::new();
        object.insert("id".to_string(), json!(7));

        let payload = notifier.build_payload(object.clone(), &Actor::Anonymous);
        assert_eq!(payload["user"], "Anonymous User");
        assert_eq!(payload["object"]["id"], 7);

        let payload = notifier.build_payload(object, &Actor::user("alice"));
        assert_eq!(payload["user"], "alice");
    }

    #[test]
    fn test_custom_payload_builder() {
        struct Flat;
        impl BuildPayload for Flat {
            fn build(&self, mut object: Map<String, Value>, actor: &Actor) -> Value {
                object.insert("by".to_string(), json!(actor.display_name()));
                Value::Object(object)
            }
        }

        let notifier = Notifier::new(Arc::new(PusherSettings::default()))
            .with_payload_builder(Arc::new(Flat));
        let payload = notifier.build_payload(Map::new(), &Actor::user("bob"));
        assert_eq!(payload, json!({"by": "bob"}));
    }

    #[tokio::test]
    async fn test_notify_publishes_once() {
        let mut client = MockPusherClient::new();
        client
            .expect_trigger()
            .times(1)
            .withf(|channels, event, data| {
                channels == ["task_7"]
                    && event == "update"
                    && data["user"] == "alice"
                    && data["object"]["title"] == "Ship it"
            })
            .returning(|_, _, _| Ok(()));

        let notifier = Notifier::with_client(Arc::new(PusherSettings::default()), Arc::new(client));
        assert_ok!(
            notifier
                .notify("update", &task(), &FieldSelection::All, &Actor::user("alice"))
                .await
        );
    }

    #[tokio::test]
    async fn test_notify_without_credentials_fails_before_network() {
        let notifier = Notifier::new(Arc::new(PusherSettings::default()));
        let err = notifier
            .notify("update", &task(), &FieldSelection::All, &Actor::Anonymous)
            .await
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_client_errors_propagate() {
        let mut client = MockPusherClient::new();
        client
            .expect_trigger()
            .times(1)
            .returning(|_, _, _| Err(crate::error::PusherableError::from_http_status(401, "nope")));

        let notifier = Notifier::with_client(Arc::new(PusherSettings::default()), Arc::new(client));
        let err = notifier
            .notify("update", &task(), &FieldSelection::All, &Actor::Anonymous)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::AuthRejected));
    }
}

//! View lifecycle hooks.
//!
//! A hosting view calls one [`LifecycleNotifier`] method at each extension
//! point of its request handling:
//!
//! | Hook | Called | Default event |
//! |---|---|---|
//! | [`Hook::UpdatePending`] | on entry, before the save | `update_pending` |
//! | [`Hook::UpdateFailed`] | on invalid input, before the error response | `update_failed` |
//! | [`Hook::UpdateSucceeded`] | after the save | `update_succeeded` |
//! | [`Hook::Viewed`] | after rendering | `viewed` |
//! | [`Hook::DeletePending`] | on entry, before the delete | `delete_pending` |
//! | [`Hook::DeleteSucceeded`] | after the delete, with a [`Snapshot`] | `delete_succeeded` |
//!
//! Every hook performs the same sequence: ensure the client, resolve the
//! event name, derive the channel, serialize and publish. Configuration
//! errors are returned immediately.

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;

use tracing::debug;

use crate::error::{ErrorCode, PusherableError, PusherableResult};
use crate::model::{Actor, Model};
use crate::notifier::Notifier;
use crate::serializer::FieldSelection;

/// Extension point in a view's request handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    UpdatePending,
    UpdateFailed,
    UpdateSucceeded,
    Viewed,
    DeletePending,
    DeleteSucceeded,
}

impl Hook {
    pub const ALL: [Hook; 6] = [
        Hook::UpdatePending,
        Hook::UpdateFailed,
        Hook::UpdateSucceeded,
        Hook::Viewed,
        Hook::DeletePending,
        Hook::DeleteSucceeded,
    ];

    /// Event name published by default for this hook.
    pub fn default_event_name(&self) -> &'static str {
        match self {
            Hook::UpdatePending => "update_pending",
            Hook::UpdateFailed => "update_failed",
            Hook::UpdateSucceeded => "update_succeeded",
            Hook::Viewed => "viewed",
            Hook::DeletePending => "delete_pending",
            Hook::DeleteSucceeded => "delete_succeeded",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_event_name())
    }
}

/// Event name configured for each hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookEvents {
    names: HashMap<Hook, String>,
}

impl Default for HookEvents {
    fn default() -> Self {
        Self {
            names: Hook::ALL
                .iter()
                .map(|hook| (*hook, hook.default_event_name().to_string()))
                .collect(),
        }
    }
}

impl HookEvents {
    /// No hook has an event name.
    pub fn empty() -> Self {
        Self {
            names: HashMap::new(),
        }
    }

    /// Short names (`update`, `view`, `delete`); pending and failed hooks
    /// are left unset.
    pub fn legacy() -> Self {
        Self::empty()
            .with_event(Hook::UpdateSucceeded, "update")
            .with_event(Hook::Viewed, "view")
            .with_event(Hook::DeleteSucceeded, "delete")
    }

    /// Builder: set the event name for a hook.
    pub fn with_event(mut self, hook: Hook, name: impl Into<String>) -> Self {
        self.names.insert(hook, name.into());
        self
    }

    /// Builder: unset the event name for a hook.
    pub fn without(mut self, hook: Hook) -> Self {
        self.names.remove(&hook);
        self
    }

    /// Configured event name; errors when unset or blank.
    pub fn resolve(&self, hook: Hook) -> PusherableResult<&str> {
        self.names
            .get(&hook)
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                PusherableError::configuration(
                    ErrorCode::ConfMissingEventName,
                    format!("No Pusher event name configured for the {} hook", hook),
                )
            })
    }
}

/// Copy of an object taken before it is changed or deleted.
///
/// Used to announce objects that can no longer be loaded once the base
/// operation has run.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<M>(M);

impl<M: Clone> Snapshot<M> {
    pub fn capture(object: &M) -> Self {
        Self(object.clone())
    }
}

impl<M> Snapshot<M> {
    pub fn into_inner(self) -> M {
        self.0
    }
}

impl<M> Deref for Snapshot<M> {
    type Target = M;

    fn deref(&self) -> &M {
        &self.0
    }
}

/// Lifecycle hooks for one view: notifier, event names and field selection.
pub struct LifecycleNotifier {
    notifier: Notifier,
    events: HookEvents,
    fields: FieldSelection,
}

impl LifecycleNotifier {
    pub fn new(notifier: Notifier) -> Self {
        Self {
            notifier,
            events: HookEvents::default(),
            fields: FieldSelection::All,
        }
    }

    /// Builder: set the event names.
    pub fn with_events(mut self, events: HookEvents) -> Self {
        self.events = events;
        self
    }

    /// Builder: restrict the serialized fields.
    pub fn with_fields(mut self, fields: FieldSelection) -> Self {
        self.fields = fields;
        self
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn events(&self) -> &HookEvents {
        &self.events
    }

    /// Event name for `hook`.
    pub fn resolve_event_name(&self, hook: Hook) -> PusherableResult<&str> {
        self.events.resolve(hook)
    }

    async fn dispatch<M>(&self, hook: Hook, object: &M, actor: &Actor) -> PusherableResult<()>
    where
        M: Model + Sync,
    {
        self.notifier.ensure_client()?;
        let event = self.resolve_event_name(hook)?;
        debug!(
            hook = %hook,
            event = %event,
            model = %object.type_name(),
            pk = %object.pk(),
            "Dispatching lifecycle notification"
        );
        self.notifier.notify(event, object, &self.fields, actor).await
    }

    /// Announce an update before it is applied.
    ///
    /// Returns a snapshot of the object as it was on entry.
    pub async fn update_pending<M>(&self, object: &M, actor: &Actor) -> PusherableResult<Snapshot<M>>
    where
        M: Model + Clone + Sync,
    {
        let snapshot = Snapshot::capture(object);
        self.dispatch(Hook::UpdatePending, &*snapshot, actor).await?;
        Ok(snapshot)
    }

    /// Announce rejected input. Call before building the error response.
    pub async fn update_failed<M>(&self, object: &M, actor: &Actor) -> PusherableResult<()>
    where
        M: Model + Sync,
    {
        self.dispatch(Hook::UpdateFailed, object, actor).await
    }

    /// Announce a saved object.
    pub async fn update_succeeded<M>(&self, object: &M, actor: &Actor) -> PusherableResult<()>
    where
        M: Model + Sync,
    {
        self.dispatch(Hook::UpdateSucceeded, object, actor).await
    }

    /// Announce a rendered detail view.
    pub async fn viewed<M>(&self, object: &M, actor: &Actor) -> PusherableResult<()>
    where
        M: Model + Sync,
    {
        self.dispatch(Hook::Viewed, object, actor).await
    }

    /// Announce a delete before it runs.
    ///
    /// The returned snapshot is what [`delete_succeeded`](Self::delete_succeeded)
    /// expects once the object is gone.
    pub async fn delete_pending<M>(&self, object: &M, actor: &Actor) -> PusherableResult<Snapshot<M>>
    where
        M: Model + Clone + Sync,
    {
        let snapshot = Snapshot::capture(object);
        self.dispatch(Hook::DeletePending, &*snapshot, actor).await?;
        Ok(snapshot)
    }

    /// Announce a completed delete using the object captured beforehand.
    pub async fn delete_succeeded<M>(
        &self,
        snapshot: &Snapshot<M>,
        actor: &Actor,
    ) -> PusherableResult<()>
    where
        M: Model + Sync,
    {
        self.dispatch(Hook::DeleteSucceeded, &**snapshot, actor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::PusherClient;
    use crate::config::PusherSettings;
    use async_trait::async_trait;
    use serde::Serialize;
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Serialize)]
    struct Task {
        id: u64,
        title: String,
        done: bool,
    }

    impl Model for Task {
        fn type_name(&self) -> &str {
            "Task"
        }
        fn pk(&self) -> String {
            self.id.to_string()
        }
    }

    #[derive(Debug, Clone)]
    struct Published {
        channels: Vec<String>,
        event: String,
        data: Value,
    }

    #[derive(Default)]
    struct RecordingClient {
        published: Mutex<Vec<Published>>,
    }

    impl RecordingClient {
        fn published(&self) -> Vec<Published> {
            self.published.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PusherClient for RecordingClient {
        async fn trigger(
            &self,
            channels: &[String],
            event_name: &str,
            data: &Value,
        ) -> PusherableResult<()> {
            self.published.lock().unwrap().push(Published {
                channels: channels.to_vec(),
                event: event_name.to_string(),
                data: data.clone(),
            });
            Ok(())
        }
    }

    fn hooks(client: Arc<RecordingClient>) -> LifecycleNotifier {
        LifecycleNotifier::new(Notifier::with_client(
            Arc::new(PusherSettings::default()),
            client,
        ))
    }

    fn task(id: u64) -> Task {
        Task {
            id,
            title: "Write tests".to_string(),
            done: false,
        }
    }

    #[test]
    fn test_default_and_legacy_event_names() {
        let events = HookEvents::default();
        for hook in Hook::ALL {
            assert_eq!(events.resolve(hook).unwrap(), hook.default_event_name());
        }

        let legacy = HookEvents::legacy();
        assert_eq!(legacy.resolve(Hook::UpdateSucceeded).unwrap(), "update");
        assert_eq!(legacy.resolve(Hook::Viewed).unwrap(), "view");
        assert_eq!(legacy.resolve(Hook::DeleteSucceeded).unwrap(), "delete");
        assert!(legacy.resolve(Hook::UpdatePending).is_err());
    }

    #[test]
    fn test_blank_event_name_is_configuration_error() {
        let events = HookEvents::default().with_event(Hook::Viewed, "  ");
        let err = events.resolve(Hook::Viewed).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ConfMissingEventName));
        assert!(err.to_string().contains("viewed"));
    }

    #[tokio::test]
    async fn test_removed_hook_is_not_published() {
        let client = Arc::new(RecordingClient::default());
        let hooks = hooks(client.clone())
            .with_events(HookEvents::default().without(Hook::UpdatePending));
        assert!(hooks.notifier().has_client());

        let err = hooks
            .update_pending(&task(7), &Actor::Anonymous)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ConfMissingEventName));
        hooks.update_succeeded(&task(7), &Actor::Anonymous).await.unwrap();

        let events: Vec<String> = client.published().into_iter().map(|p| p.event).collect();
        assert_eq!(events, vec!["update_succeeded"]);
    }

    #[tokio::test]
    async fn test_update_succeeded_publishes_saved_fields() {
        let client = Arc::new(RecordingClient::default());
        let hooks = hooks(client.clone());

        let mut saved = task(7);
        saved.done = true;
        hooks
            .update_succeeded(&saved, &Actor::user("alice"))
            .await
            .unwrap();

        let published = client.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].channels, vec!["task_7".to_string()]);
        assert_eq!(published[0].event, "update_succeeded");
        assert_eq!(published[0].data["object"]["done"], true);
        assert_eq!(published[0].data["user"], "alice");
    }

    #[tokio::test]
    async fn test_legacy_update_event() {
        let client = Arc::new(RecordingClient::default());
        let hooks = hooks(client.clone()).with_events(HookEvents::legacy());

        hooks.update_succeeded(&task(7), &Actor::Anonymous).await.unwrap();
        assert_eq!(client.published()[0].event, "update");
        assert_eq!(client.published()[0].data["user"], "Anonymous User");
    }

    #[tokio::test]
    async fn test_unset_event_publishes_nothing() {
        let client = Arc::new(RecordingClient::default());
        let hooks = hooks(client.clone()).with_events(HookEvents::legacy());

        let err = hooks
            .update_pending(&task(7), &Actor::Anonymous)
            .await
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(client.published().is_empty());
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_event_lookup() {
        let hooks = LifecycleNotifier::new(Notifier::new(Arc::new(PusherSettings::default())))
            .with_events(HookEvents::empty());
        let err = hooks.viewed(&task(1), &Actor::Anonymous).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ConfMissingCredentials));
    }

    #[tokio::test]
    async fn test_delete_announces_removed_object() {
        let client = Arc::new(RecordingClient::default());
        let hooks = hooks(client.clone());
        let mut store: HashMap<u64, Task> = HashMap::new();
        store.insert(3, task(3));

        let snapshot = hooks
            .delete_pending(&store[&3], &Actor::user("bob"))
            .await
            .unwrap();
        store.remove(&3);
        assert!(store.get(&3).is_none());
        hooks
            .delete_succeeded(&snapshot, &Actor::user("bob"))
            .await
            .unwrap();

        let published = client.published();
        let events: Vec<&str> = published.iter().map(|p| p.event.as_str()).collect();
        assert_eq!(events, vec!["delete_pending", "delete_succeeded"]);
        assert_eq!(published[1].channels, vec!["task_3".to_string()]);
        assert_eq!(published[1].data["object"]["id"], 3);
        assert_eq!(published[1].data["object"]["title"], "Write tests");
    }

    #[tokio::test]
    async fn test_failed_update_notifies_without_saving() {
        let client = Arc::new(RecordingClient::default());
        let hooks = hooks(client.clone());
        let mut store: HashMap<u64, Task> = HashMap::new();
        store.insert(7, task(7));

        let actor = Actor::user("alice");
        let snapshot = hooks.update_pending(&store[&7], &actor).await.unwrap();
        let new_title = "";
        if new_title.is_empty() {
            hooks.update_failed(&*snapshot, &actor).await.unwrap();
        } else {
            store.get_mut(&7).unwrap().title = new_title.to_string();
        }

        assert_eq!(store[&7].title, "Write tests");
        let events: Vec<String> = client.published().into_iter().map(|p| p.event).collect();
        assert_eq!(events, vec!["update_pending", "update_failed"]);
    }

    #[tokio::test]
    async fn test_field_selection_applies_to_hooks() {
        let client = Arc::new(RecordingClient::default());
        let hooks = hooks(client.clone()).with_fields(FieldSelection::only(["id", "title"]));

        hooks.viewed(&task(5), &Actor::Anonymous).await.unwrap();
        let object = client.published()[0].data["object"].clone();
        assert_eq!(object.as_object().unwrap().len(), 2);
        assert!(object.get("done").is_none());
    }

    #[test]
    fn test_snapshot_is_independent_of_later_changes() {
        let mut original = task(9);
        let snapshot = Snapshot::capture(&original);
        original.title = "Changed".to_string();
        assert_eq!(snapshot.title, "Write tests");
        assert_eq!(snapshot.into_inner().id, 9);
    }
}

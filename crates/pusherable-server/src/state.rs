//! Server state management.

use std::collections::HashMap;
use std::sync::Arc;

use pusherable_core::{
    FieldSelection, HookEvents, LifecycleNotifier, Notifier, PusherClient, PusherSettings,
};
use tokio::sync::RwLock;

use crate::model::Task;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<RwLock<AppStateInner>>,
    settings: Arc<PusherSettings>,
    client: Option<Arc<dyn PusherClient>>,
    events: HookEvents,
    fields: FieldSelection,
}

pub struct AppStateInner {
    pub tasks: HashMap<u64, Task>,
    pub next_id: u64,
}

impl AppState {
    /// Create a new application state.
    pub fn new(settings: Arc<PusherSettings>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(AppStateInner {
                tasks: HashMap::new(),
                next_id: 1,
            })),
            settings,
            client: None,
            events: HookEvents::default(),
            fields: FieldSelection::All,
        }
    }

    /// Use `client` for every request instead of building one per request.
    pub fn with_client(mut self, client: Arc<dyn PusherClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the event names the views publish.
    pub fn with_events(mut self, events: HookEvents) -> Self {
        self.events = events;
        self
    }

    /// Restrict the task fields sent in notifications.
    pub fn with_fields(mut self, fields: FieldSelection) -> Self {
        self.fields = fields;
        self
    }

    pub fn settings(&self) -> &PusherSettings {
        &self.settings
    }

    /// Whether Pusher credentials are present.
    pub fn is_configured(&self) -> bool {
        self.settings.credentials().is_ok()
    }

    /// Lifecycle hooks for one request.
    pub fn hooks(&self) -> LifecycleNotifier {
        let notifier = match &self.client {
            Some(client) => Notifier::with_client(self.settings.clone(), client.clone()),
            None => Notifier::new(self.settings.clone()),
        };
        LifecycleNotifier::new(notifier)
            .with_events(self.events.clone())
            .with_fields(self.fields.clone())
    }

    /// Store a new task with the next free id.
    pub async fn create_task(&self, title: String) -> Task {
        let mut guard = self.inner.write().await;
        let task = Task::new(guard.next_id, title);
        guard.next_id += 1;
        guard.tasks.insert(task.id, task.clone());
        task
    }

    /// Store `task`, replacing any task with the same id.
    pub async fn save_task(&self, task: Task) -> Task {
        let mut guard = self.inner.write().await;
        guard.next_id = guard.next_id.max(task.id + 1);
        guard.tasks.insert(task.id, task.clone());
        task
    }

    /// Replace a stored task; `None` when it was removed in the meantime.
    pub async fn save_existing(&self, task: Task) -> Option<Task> {
        let mut guard = self.inner.write().await;
        let slot = guard.tasks.get_mut(&task.id)?;
        *slot = task.clone();
        Some(task)
    }

    pub async fn get_task(&self, id: u64) -> Option<Task> {
        self.inner.read().await.tasks.get(&id).cloned()
    }

    pub async fn list_tasks(&self) -> Vec<Task> {
        let guard = self.inner.read().await;
        let mut tasks: Vec<Task> = guard.tasks.values().cloned().collect();
        tasks.sort_by_key(|t| t.id);
        tasks
    }

    pub async fn remove_task(&self, id: u64) -> Option<Task> {
        self.inner.write().await.tasks.remove(&id)
    }
}

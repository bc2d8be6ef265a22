//! Task model hosted by the demo views.

use chrono::{DateTime, NaiveDate, Utc};
use pusherable_core::Model;
use serde::{Deserialize, Serialize};

/// Longest accepted task title.
pub const MAX_TITLE_LEN: usize = 200;

/// A to-do item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    pub done: bool,
    pub due: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            done: false,
            due: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_due(mut self, due: NaiveDate) -> Self {
        self.due = Some(due);
        self
    }
}

impl Model for Task {
    fn type_name(&self) -> &str {
        "Task"
    }

    fn pk(&self) -> String {
        self.id.to_string()
    }
}

/// Update form for a task. Missing fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskForm {
    pub title: Option<String>,
    pub done: Option<bool>,
    pub due: Option<NaiveDate>,
}

impl TaskForm {
    /// Validate the form, returning field errors keyed by field name.
    pub fn validate(&self) -> Result<(), serde_json::Map<String, serde_json::Value>> {
        let mut errors = serde_json::Map::new();
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                errors.insert("title".to_string(), "This field may not be blank.".into());
            } else if title.chars().count() > MAX_TITLE_LEN {
                errors.insert(
                    "title".to_string(),
                    format!("Ensure this field has no more than {} characters.", MAX_TITLE_LEN)
                        .into(),
                );
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Apply the form to `task`, returning the updated copy.
    pub fn apply(&self, task: &Task) -> Task {
        let mut updated = task.clone();
        if let Some(title) = &self.title {
            updated.title = title.trim().to_string();
        }
        if let Some(done) = self.done {
            updated.done = done;
        }
        if self.due.is_some() {
            updated.due = self.due;
        }
        updated.updated_at = Utc::now();
        updated
    }
}

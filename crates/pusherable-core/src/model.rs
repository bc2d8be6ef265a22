//! Model descriptor and acting-user types.

use serde::Serialize;

/// Placeholder display name for unauthenticated users.
pub const ANONYMOUS_USER: &str = "Anonymous User";

/// A data-model instance that can be announced on a channel.
///
/// The type name and primary key are supplied explicitly by the implementor;
/// field values come from the `Serialize` implementation. A field the
/// implementation omits (for example through `skip_serializing_if`) counts as
/// missing when a [`FieldSelection::Only`](crate::FieldSelection::Only) names it.
pub trait Model: Serialize {
    /// Type name, e.g. `"Task"`. Lower-cased when building channel names.
    fn type_name(&self) -> &str;

    /// Primary key rendered as a string.
    fn pk(&self) -> String;
}

/// The user on whose behalf a view runs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Actor {
    #[default]
    Anonymous,
    Authenticated { username: String },
}

impl Actor {
    /// Create an authenticated actor.
    pub fn user(username: impl Into<String>) -> Self {
        Self::Authenticated {
            username: username.into(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    /// Username, or [`ANONYMOUS_USER`] for anonymous actors.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Anonymous => ANONYMOUS_USER,
            Self::Authenticated { username } => username,
        }
    }
}

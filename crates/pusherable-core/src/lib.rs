//! pusherable-core - Pusher notifications for CRUD view lifecycles.
//!
//! This crate provides the lifecycle hooks a web view calls around its
//! update, detail and delete operations, the serializer and channel naming
//! they rely on, the Pusher REST client, and the browser subscription
//! snippets.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pusherable_core::{Actor, LifecycleNotifier, Notifier, PusherSettings};
//!
//! let settings = Arc::new(PusherSettings::from_env());
//! let hooks = LifecycleNotifier::new(Notifier::new(settings));
//!
//! // After the task has been saved
//! hooks.update_succeeded(&task, &Actor::user("alice")).await?;
//! ```

pub mod channel;
pub mod client;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod notifier;
pub mod serializer;
pub mod subscription;

// Re-export commonly used types
pub use channel::channel_name;
pub use client::{HttpPusher, PusherClient};
pub use config::{Credentials, PusherSettings};
pub use error::{ErrorCode, PusherableError, PusherableResult};
pub use lifecycle::{Hook, HookEvents, LifecycleNotifier, Snapshot};
pub use model::{Actor, Model, ANONYMOUS_USER};
pub use notifier::{BuildPayload, DefaultPayload, Notifier};
pub use serializer::{to_json_map, FieldSelection};
pub use subscription::{script_tag, subscribe_script};

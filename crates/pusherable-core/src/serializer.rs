//! Model to JSON mapping conversion.

use serde_json::{Map, Value};

use crate::error::{ErrorCode, PusherableError, PusherableResult};
use crate::model::Model;

/// Which fields of a model end up in a notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldSelection {
    /// Every serialized field.
    #[default]
    All,
    /// Only the listed fields. Each must exist on the model.
    Only(Vec<String>),
    /// Every field except the listed ones.
    Except(Vec<String>),
}

impl FieldSelection {
    pub fn only<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(fields.into_iter().map(Into::into).collect())
    }

    pub fn except<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Except(fields.into_iter().map(Into::into).collect())
    }
}

/// Serialize `object` into a JSON object restricted by `selection`.
///
/// Fields are the keys the `Serialize` implementation emits. A listed field
/// that is skipped during serialization is reported as missing.
pub fn to_json_map<M: Model + ?Sized>(
    object: &M,
    selection: &FieldSelection,
) -> PusherableResult<Map<String, Value>> {
    let mut fields = match serde_json::to_value(object)? {
        Value::Object(fields) => fields,
        other => {
            return Err(PusherableError::validation(
                ErrorCode::ValNotAnObject,
                format!(
                    "{} serialized to {} instead of an object",
                    object.type_name(),
                    json_kind(&other)
                ),
            ))
        }
    };

    match selection {
        FieldSelection::All => Ok(fields),
        FieldSelection::Only(names) => {
            let mut selected = Map::new();
            for name in names {
                let value = fields
                    .remove(name)
                    .ok_or_else(|| PusherableError::missing_field(object.type_name(), name))?;
                selected.insert(name.clone(), value);
            }
            Ok(selected)
        }
        FieldSelection::Except(names) => {
            for name in names {
                fields.remove(name);
            }
            Ok(fields)
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

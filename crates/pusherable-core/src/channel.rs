//! Channel naming: `<model_name>_<primary_key>`.

use crate::model::Model;

/// Channel an instance's notifications are published on.
///
/// The subscription script uses the same function, so both ends agree on
/// the name without any extra coordination.
pub fn channel_name<M: Model + ?Sized>(object: &M) -> String {
    format!("{}_{}", object.type_name().to_lowercase(), object.pk())
}

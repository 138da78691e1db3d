//! Server-wins merging of authoritative fields into local items.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::domain::request::ParsedBody;

/// Authoritative field values reported for one item.
pub type FieldOverlay = Map<String, Value>;

/// A server response that reports authoritative fields per item.
///
/// Fields present in the overlay replace the optimistic local values; fields
/// the server omitted keep whatever the local update wrote.
pub trait Reconcile<K> {
    /// Authoritative fields keyed by item.
    fn authoritative_fields(&self) -> Vec<(K, FieldOverlay)>;
}

impl<K> Reconcile<K> for () {
    fn authoritative_fields(&self) -> Vec<(K, FieldOverlay)> {
        Vec::new()
    }
}

impl<K, T: Reconcile<K>> Reconcile<K> for Vec<T> {
    fn authoritative_fields(&self) -> Vec<(K, FieldOverlay)> {
        self.iter()
            .flat_map(|item| Reconcile::<K>::authoritative_fields(item))
            .collect()
    }
}

/// A JSON object carrying an `id`, or an array of such objects. Other bodies
/// report nothing.
impl<K: DeserializeOwned> Reconcile<K> for ParsedBody {
    fn authoritative_fields(&self) -> Vec<(K, FieldOverlay)> {
        match self.as_json() {
            Some(Value::Object(fields)) => keyed_overlay(fields).into_iter().collect(),
            Some(Value::Array(entries)) => entries
                .iter()
                .filter_map(Value::as_object)
                .filter_map(keyed_overlay)
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn keyed_overlay<K: DeserializeOwned>(fields: &Map<String, Value>) -> Option<(K, FieldOverlay)> {
    let key = fields.get("id").cloned()?;
    let key = serde_json::from_value(key).ok()?;
    Some((key, fields.clone()))
}

/// Overlay `fields` on the serialized form of `current` and decode the result.
pub(crate) fn merge_fields<V>(current: &V, fields: &FieldOverlay) -> Result<V, serde_json::Error>
where
    V: Serialize + DeserializeOwned,
{
    let mut merged = serde_json::to_value(current)?;
    if let Value::Object(object) = &mut merged {
        for (field, value) in fields {
            object.insert(field.clone(), value.clone());
        }
    }
    serde_json::from_value(merged)
}

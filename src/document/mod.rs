//! The envelope persisted inside the pull request description.
//!
//! ```json
//! {
//!   "metadata": { "version": 3, "lastModifiedDate": "2024-05-01T10:00:00Z" },
//!   "files": ["src/lib.rs"],
//!   "presentation": { "visuals": [] }
//! }
//! ```
//!
//! `files` is omitted when no file ordering was recorded and
//! `lastModifiedDate` when the document was never saved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::PresentationData;

/// Save bookkeeping carried alongside the presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Incremented on every save.
    #[serde(default)]
    pub version: u64,
    /// Time of the most recent save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_date: Option<DateTime<Utc>>,
}

impl Metadata {
    /// Records a save made at `now`.
    pub const fn record_save(&mut self, now: DateTime<Utc>) {
        self.version = self.version.saturating_add(1);
        self.last_modified_date = Some(now);
    }
}

/// Top-level export envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Save bookkeeping.
    #[serde(default)]
    pub metadata: Metadata,
    /// Diff file order, when one was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
    /// The serialized presentation.
    #[serde(default)]
    pub presentation: PresentationData,
}

impl Document {
    /// Decodes an envelope from JSON.
    ///
    /// # Errors
    ///
    /// Returns the decoder error when `value` is not an object or one of the
    /// envelope fields has the wrong shape. Individual visuals are not
    /// validated here.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Encodes the envelope as JSON.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Largest identity [`max_embedded_id`] reports. Larger ids would leave the
/// identity generator no room to issue fresh values, so they are ignored.
pub const MAX_SEED_ID: u64 = u64::MAX - 0xFFFF_FFFF;

/// Largest numeric identity found anywhere in `value`.
///
/// An object with a non-empty `id` contributes that id and is not searched
/// further; every other object and array is searched recursively. Ids that
/// are not decimal integers, or exceed [`MAX_SEED_ID`], are ignored.
#[must_use]
pub fn max_embedded_id(value: &Value) -> Option<u64> {
    match value {
        Value::Object(object) => match object.get("id").and_then(numeric_id) {
            Some(id) => Some(id),
            None if object.get("id").is_some_and(is_present) => None,
            None => object.values().filter_map(max_embedded_id).max(),
        },
        Value::Array(items) => items.iter().filter_map(max_embedded_id).max(),
        _ => None,
    }
}

fn numeric_id(value: &Value) -> Option<u64> {
    let id = match value {
        Value::String(text) => text.trim().parse().ok(),
        Value::Number(number) => number.as_u64(),
        _ => None,
    }?;
    if id > MAX_SEED_ID {
        tracing::warn!("ignoring identity {id} when reseeding; it leaves no room for new ids");
        return None;
    }
    Some(id)
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(text) => !text.is_empty(),
        _ => true,
    }
}

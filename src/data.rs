use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Separator between identity field values when forming a unique key.
/// No escaping is applied; callers must pick identity fields that cannot
/// produce ambiguous joins.
pub const KEY_SEPARATOR: &str = "-";

/// One row of chart data: an opaque mapping of field name to string/number
/// value. Read-only to the engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataRecord(Map<String, Value>);

impl DataRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// The field rendered as text. Strings pass through, numbers are
    /// formatted; other JSON types are treated as absent.
    pub fn field_text(&self, name: &str) -> Option<Cow<'_, str>> {
        match self.0.get(name)? {
            Value::String(text) => Some(Cow::Borrowed(text.as_str())),
            Value::Number(number) => Some(Cow::Owned(number.to_string())),
            _ => None,
        }
    }

    /// Field names and raw values, in the record's own order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// The field as a number, accepting JSON numbers and numeric strings.
    pub fn field_number(&self, name: &str) -> Option<f64> {
        match self.0.get(name)? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for DataRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Joins the record's identity field values with [`KEY_SEPARATOR`].
/// A missing field contributes an empty segment and is logged.
pub fn derive_key(record: &DataRecord, identity_fields: &[String]) -> String {
    let segments = identity_fields
        .iter()
        .map(|field| match record.field_text(field) {
            Some(text) => text,
            None => {
                tracing::warn!(field = %field, "identity field missing from record");
                Cow::Borrowed("")
            }
        })
        .collect::<Vec<_>>();
    segments.join(KEY_SEPARATOR)
}

/// The record's value at the classifier field, empty (and logged) when absent.
pub fn derive_classifier(record: &DataRecord, classifier_field: &str) -> String {
    match record.field_text(classifier_field) {
        Some(text) => text.into_owned(),
        None => {
            tracing::warn!(field = classifier_field, "classifier field missing from record");
            String::new()
        }
    }
}

/// The record's raw size value, zero (and logged) when absent or non-numeric.
pub fn size_value(record: &DataRecord, size_field: &str) -> f32 {
    match record.field_number(size_field) {
        Some(value) if value.is_finite() => value as f32,
        _ => {
            tracing::warn!(field = size_field, "size field missing or non-numeric");
            0.0
        }
    }
}

/// Joins the configured tooltip field values with newlines. Missing fields
/// contribute an empty line.
pub fn tooltip_text(record: &DataRecord, tooltip_fields: &[String]) -> String {
    tooltip_fields
        .iter()
        .map(|field| {
            record
                .field_text(field)
                .unwrap_or(Cow::Borrowed(""))
                .into_owned()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

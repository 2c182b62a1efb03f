//! Full and reduced views of an exemption record.

use serde_json::{Map, Value};

use crate::filter::FilterMode;
use crate::record::ExemptionRecord;

/// A projected record as returned to API callers.
pub type ProjectedRecord = Map<String, Value>;

/// Project one record.
///
/// With `show_all` every top-level field is kept: objects are carried over
/// structurally, every other value is rendered as display text (numbers and
/// booleans lose their JSON type, null becomes `""`). Otherwise only `name`,
/// `displayName` and, when `mode` shows expiry, a non-null `expiresOn`.
pub fn project(record: &ExemptionRecord, show_all: bool, mode: FilterMode) -> ProjectedRecord {
    if show_all {
        full(record)
    } else {
        reduced(record, mode)
    }
}

fn full(record: &ExemptionRecord) -> ProjectedRecord {
    record
        .fields()
        .iter()
        .map(|(key, value)| {
            let projected = match value {
                Value::Object(_) => value.clone(),
                other => Value::String(display_text(other)),
            };
            (key.clone(), projected)
        })
        .collect()
}

fn reduced(record: &ExemptionRecord, mode: FilterMode) -> ProjectedRecord {
    let mut out = Map::new();
    if let Some(name) = record.fields().get("name") {
        let _ = out.insert("name".into(), text_or_null(name));
    }
    if let Some(display_name) = record.property("displayName") {
        let _ = out.insert("displayName".into(), text_or_null(display_name));
    }
    if mode.shows_expiry() {
        if let Some(expires_on) = record.property("expiresOn").filter(|v| !v.is_null()) {
            let _ = out.insert("expiresOn".into(), text_or_null(expires_on));
        }
    }
    out
}

/// Display text of a non-object value.
fn display_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn text_or_null(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::String(_) => value.clone(),
        other => Value::String(display_text(other)),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

//! Schema-flexible exemption records.
//!
//! The management API does not fix the exemption schema, so a record is kept
//! as the JSON object it arrived as. Accessors read the handful of fields the
//! pipeline cares about without imposing a struct on the rest.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ExemptionError;

/// Prefix every listed exemption id must carry to be returned.
pub const SUBSCRIPTION_ID_PREFIX: &str = "/subscriptions";

/// One policy exemption exactly as returned by the management API.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExemptionRecord(Map<String, Value>);

/// Outcome of checking a listed record's `id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdScope {
    /// `id` is a non-empty string under `/subscriptions`.
    Subscription,
    /// `id` is null, empty, not a string, or outside `/subscriptions`.
    Foreign,
}

impl ExemptionRecord {
    /// Wrap an already-parsed JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Underlying JSON object.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Top-level `name`, when it is a string.
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    /// The nested `properties` object, when present and an object.
    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.0.get("properties").and_then(Value::as_object)
    }

    /// Raw value of `properties.{key}`.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties().and_then(|props| props.get(key))
    }

    /// `properties.expiresOn` as text; null and non-string values read as absent.
    pub fn expires_on(&self) -> Option<&str> {
        self.property("expiresOn").and_then(Value::as_str)
    }

    /// `properties.policyAssignmentId` as text.
    pub fn policy_assignment_id(&self) -> Option<&str> {
        self.property("policyAssignmentId").and_then(Value::as_str)
    }

    /// Classify the record's `id`.
    ///
    /// A record with no `id` key at all is malformed and stops the whole
    /// listing; any other unusable `id` only excludes this record.
    pub fn id_scope(&self) -> Result<IdScope, ExemptionError> {
        let Some(id) = self.0.get("id") else {
            return Err(ExemptionError::Malformed(
                "policy exemption item is missing 'id' property".into(),
            ));
        };
        let scoped = id
            .as_str()
            .is_some_and(|id| id.starts_with(SUBSCRIPTION_ID_PREFIX));
        Ok(if scoped {
            IdScope::Subscription
        } else {
            IdScope::Foreign
        })
    }

    /// Copy of this record with `properties.expiresOn` set.
    ///
    /// `properties` is created when missing and replaced when it is not an
    /// object; every other field is carried over untouched.
    #[must_use]
    pub fn with_expires_on(&self, expires_on: &str) -> Self {
        let mut fields = self.0.clone();
        let props = fields
            .entry("properties")
            .or_insert_with(|| Value::Object(Map::new()));
        if !props.is_object() {
            *props = Value::Object(Map::new());
        }
        if let Value::Object(props) = props {
            let _ = props.insert("expiresOn".into(), Value::String(expires_on.into()));
        }
        Self(fields)
    }
}

impl TryFrom<Value> for ExemptionRecord {
    type Error = ExemptionError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(ExemptionError::InvalidPayload(format!(
                "expected a JSON object, got {}",
                kind_name(&other)
            ))),
        }
    }
}

impl From<ExemptionRecord> for Value {
    fn from(record: ExemptionRecord) -> Self {
        record.into_value()
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

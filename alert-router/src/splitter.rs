//! Partitions an alert webhook payload by alert status.
//!
//! A payload carries a batch of alerts that may mix `firing` and `resolved`
//! events. The splitter produces one payload-shaped group per status so each
//! can be delivered downstream on its own:
//!
//! ```text
//! {status: x, groupLabels: {..}, alerts: [F1, R1, F2]}
//!   ├─ {status: firing,   groupLabels: {..}, alerts: [F1, F2]}
//!   └─ {status: resolved, groupLabels: {..}, alerts: [R1]}
//! ```
//!
//! Every top-level field other than `alerts` is copied verbatim into each
//! group, and field order is preserved.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

const STATUS_FIELD: &str = "status";
const ALERTS_FIELD: &str = "alerts";

#[derive(Error, Debug, PartialEq)]
pub enum SplitError {
    #[error("invalid alerts format: `alerts` must be an array")]
    InvalidFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertStatus {
    Firing,
    Resolved,
}

impl AlertStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Firing => "firing",
            AlertStatus::Resolved => "resolved",
        }
    }

    /// Status of a single alert. `None` for anything that is not an object
    /// with a `firing` or `resolved` status.
    fn of(alert: &Value) -> Option<Self> {
        match alert.get(STATUS_FIELD)?.as_str()? {
            "firing" => Some(AlertStatus::Firing),
            "resolved" => Some(AlertStatus::Resolved),
            _ => None,
        }
    }
}

/// An incoming webhook body. Only `status` and `alerts` are interpreted; all
/// other fields are carried along untouched.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct AlertPayload(Map<String, Value>);

impl AlertPayload {
    pub fn status(&self) -> Option<&str> {
        self.0.get(STATUS_FIELD).and_then(Value::as_str)
    }

    pub fn alerts(&self) -> Option<&Value> {
        self.0.get(ALERTS_FIELD)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for AlertPayload {
    fn from(fields: Map<String, Value>) -> Self {
        AlertPayload(fields)
    }
}

/// A payload holding only alerts of one status. Serializes as the bare JSON
/// object.
#[derive(Clone, Debug, PartialEq)]
pub struct AlertGroup {
    status: AlertStatus,
    fields: Map<String, Value>,
}

impl AlertGroup {
    fn new(status: AlertStatus, mut fields: Map<String, Value>, alerts: Vec<Value>) -> Self {
        // Replacing an existing key keeps its position
        fields.insert(STATUS_FIELD.into(), status.as_str().into());
        fields.insert(ALERTS_FIELD.into(), Value::Array(alerts));
        AlertGroup { status, fields }
    }

    pub fn status(&self) -> AlertStatus {
        self.status
    }

    pub fn alerts(&self) -> &[Value] {
        self.fields
            .get(ALERTS_FIELD)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl Serialize for AlertGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

/// Splits `payload` into a firing group and a resolved group, in that order.
///
/// Groups without alerts are omitted, so the result has zero, one or two
/// entries. Alerts whose status is neither `firing` nor `resolved` are
/// dropped.
pub fn split(payload: AlertPayload) -> Result<Vec<AlertGroup>, SplitError> {
    let mut fields = payload.0;
    let alerts = match fields.shift_remove(ALERTS_FIELD) {
        Some(Value::Array(alerts)) => alerts,
        _ => return Err(SplitError::InvalidFormat),
    };

    let mut firing = Vec::new();
    let mut resolved = Vec::new();
    let mut dropped = 0usize;

    for alert in alerts {
        match AlertStatus::of(&alert) {
            Some(AlertStatus::Firing) => firing.push(alert),
            Some(AlertStatus::Resolved) => resolved.push(alert),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::debug!(dropped, "Dropped alerts without a firing or resolved status");
    }

    let mut groups = Vec::with_capacity(2);
    for (status, alerts) in [
        (AlertStatus::Firing, firing),
        (AlertStatus::Resolved, resolved),
    ] {
        if !alerts.is_empty() {
            groups.push(AlertGroup::new(status, fields.clone(), alerts));
        }
    }

    Ok(groups)
}

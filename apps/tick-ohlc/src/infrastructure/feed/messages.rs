//! Webhook Message Types
//!
//! The feed wraps every delivery in a two-level JSON envelope:
//!
//! ```json
//! {
//!   "event": "received",
//!   "message": "{\"events\":[{\"tid\":1,\"price\":\"10\",...}]}"
//! }
//! ```
//!
//! `message` is itself a JSON document encoded as a string. Only the
//! `received` event carries trades; other events (subscription lifecycle,
//! pings) are acknowledged and dropped.

use serde_json::Value;

/// Envelope event that carries trade data.
pub const RECEIVED_EVENT: &str = "received";

/// Outer webhook envelope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebhookEnvelope {
    /// Event kind, when present and a string.
    pub event: Option<String>,
    /// Raw `message` value, when present.
    pub message: Option<Value>,
}

impl WebhookEnvelope {
    /// Extract the envelope fields from a parsed body.
    ///
    /// Non-object bodies yield an envelope with no event.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::default();
        };
        Self {
            event: map
                .remove("event")
                .and_then(|v| v.as_str().map(str::to_owned)),
            message: map.remove("message"),
        }
    }

    /// Whether this delivery carries trades.
    #[must_use]
    pub fn is_received(&self) -> bool {
        self.event.as_deref() == Some(RECEIVED_EVENT)
    }
}

/// Inner message carried by a `received` envelope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedMessage {
    /// Candidate tick values; `None` when `events` is missing or not a list.
    pub events: Option<Vec<Value>>,
}

impl FeedMessage {
    /// Extract the `events` list from a parsed message.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        let events = match value {
            Value::Object(mut map) => match map.remove("events") {
                Some(Value::Array(events)) => Some(events),
                _ => None,
            },
            _ => None,
        };
        Self { events }
    }
}

/// JavaScript-style falsiness: `null`, `false`, `0` and `""`.
///
/// The feed's own tooling treats these as "not provided", so the decoder
/// does too.
#[must_use]
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_none_or(|f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

//! Webhook Delivery Codec
//!
//! Decodes an authenticated request body into either an ignored delivery
//! or a batch of candidate ticks. Malformed JSON at either envelope level
//! is a `DecodeError`; a missing or non-list `events` field is an empty
//! batch.

use serde_json::Value;
use thiserror::Error;

use super::messages::{FeedMessage, WebhookEnvelope, is_falsy};
use crate::application::dto::TradeTickDto;

/// Errors raised while decoding a delivery.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Body is not valid JSON.
    #[error("malformed body: {0}")]
    MalformedBody(#[source] serde_json::Error),

    /// Body parsed to an empty value.
    #[error("body is empty")]
    EmptyBody,

    /// `message` is missing or empty on a `received` delivery.
    #[error("message is missing")]
    MissingMessage,

    /// `message` is present but not a JSON-encoded string.
    #[error("message must be a JSON-encoded string")]
    MessageNotString,

    /// `message` string is not valid JSON.
    #[error("malformed message: {0}")]
    MalformedMessage(#[source] serde_json::Error),
}

/// A decoded webhook delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// Event kind other than `received`; acknowledged without processing.
    Ignored {
        /// The event kind, if it was a string.
        event: Option<String>,
    },
    /// Candidate ticks, in delivery order. May be empty.
    Batch(Vec<TradeTickDto>),
}

/// Decode a raw webhook body.
///
/// # Errors
///
/// Returns `DecodeError` if either envelope level is malformed or empty.
pub fn decode_delivery(body: &[u8]) -> Result<Delivery, DecodeError> {
    let body: Value = serde_json::from_slice(body).map_err(DecodeError::MalformedBody)?;
    if is_falsy(&body) {
        return Err(DecodeError::EmptyBody);
    }

    let envelope = WebhookEnvelope::from_value(body);
    if !envelope.is_received() {
        return Ok(Delivery::Ignored {
            event: envelope.event,
        });
    }

    let raw = match envelope.message {
        Some(Value::String(raw)) if !raw.is_empty() => raw,
        Some(ref m) if !is_falsy(m) => return Err(DecodeError::MessageNotString),
        _ => return Err(DecodeError::MissingMessage),
    };

    let message: Value = serde_json::from_str(&raw).map_err(DecodeError::MalformedMessage)?;
    if is_falsy(&message) {
        return Err(DecodeError::MissingMessage);
    }

    let ticks = FeedMessage::from_value(message)
        .events
        .unwrap_or_default()
        .into_iter()
        .map(TradeTickDto::from_value)
        .collect();

    Ok(Delivery::Batch(ticks))
}

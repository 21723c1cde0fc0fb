//! Market Data Feed Webhook
//!
//! Inbound side of the push path: signature verification, envelope types
//! and the delivery decoder.

pub mod codec;
pub mod messages;
pub mod signature;

pub use codec::{DecodeError, Delivery, decode_delivery};
pub use messages::{FeedMessage, RECEIVED_EVENT, WebhookEnvelope};
pub use signature::{SIGNATURE_HEADER, SignatureError, SignatureVerifier, WebhookSecret};

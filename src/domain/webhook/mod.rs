//! Webhook domain module.
//!
//! The verification handshake and the platform-neutral shape of an inbound message.

mod inbound;
mod verification;

pub use inbound::{InboundMessage, MalformedPayload};
pub use verification::{VerificationError, VerificationRequest, WebhookVerifier, SUBSCRIBE_MODE};

//! Notifier Core Types
//!
//! Domain types for the push-notification relay: targets, devices,
//! notification payloads, provider responses, and the error envelope.

mod envelope;
mod message;
mod push;
mod target;

pub use envelope::*;
pub use message::*;
pub use push::*;
pub use target::*;

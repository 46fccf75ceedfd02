//! Shared wire types for the share-work file protocol.

pub mod command;
pub mod envelope;

pub use command::{Command, CommandError, field, operation};
pub use envelope::{DecodeError, ENCODING, Envelope, EnvelopeType, Payload, REASON_KEY, encode_error};

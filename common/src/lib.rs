//! Shared primitives for netgate.
//!
//! Everything in here is used by both the host library and the desktop
//! binary: call-site tracking for errors, status-code classification for
//! the HTTP collaborators, and a wrapper that keeps credentials out of
//! logs and out of the wire protocol.

pub mod error;
pub mod http_status;
pub mod redacted_secret;

#[cfg(test)]
mod tests;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use http_status::HttpStatusCode;
pub use redacted_secret::RedactedSecret;

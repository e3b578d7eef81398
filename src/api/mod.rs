//! Quqi remote API: envelope handling, typed payloads and actions.

mod actions;
pub mod client;
pub mod envelope;
pub mod error;
pub mod types;

pub use actions::ByteStream;
pub use client::ApiClient;
pub use envelope::Envelope;
pub use error::ApiErrorCode;

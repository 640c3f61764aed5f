//! Streaming client for the agent playground run endpoint.
//!
//! The run endpoint answers with a chunked body of back-to-back JSON objects.
//! [`drive_stream`] pulls fragments from any byte stream, decodes them with
//! [`json_stream::JsonObjectDecoder`], and pushes each message into a
//! [`MessageSink`]. [`PlaygroundApiClient`] wires that loop to `reqwest`.
//!
//! This crate carries no authentication logic; callers supply the user id
//! they want attached to runs and session listings.

pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod request;
pub mod sessions;
pub mod url;

pub use client::PlaygroundApiClient;
pub use config::PlaygroundApiConfig;
pub use driver::{drive_stream, CallbackSink, CancellationSignal, MessageSink, StreamOutcome};
pub use error::PlaygroundApiError;
pub use request::{RunBody, RunRequest};
pub use sessions::SessionEntry;
pub use url::{agent_endpoint, normalize_base_url};

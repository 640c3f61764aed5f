//! Incremental extraction of back-to-back JSON objects from an unframed text stream.
//!
//! The wire format carries no delimiters and no length prefixes, so the decoder
//! treats the whole response body as one growing buffer and finds object
//! boundaries by brace matching. Fragmentation is arbitrary: an object may span
//! any number of fragments, and a fragment boundary may split a multi-byte
//! UTF-8 sequence (see [`Utf8Carry`]).

pub mod decoder;
pub mod utf8;

pub use decoder::JsonObjectDecoder;
pub use utf8::Utf8Carry;

//! A runtime dialect-driven codec for the MAVLink wire protocol.
//!
//! Unlike generated-binding MAVLink crates, this one never runs codegen
//! against a fixed dialect at build time. Instead, [`dialect::Catalog::load`]
//! compiles one or more dialect XML documents into an immutable, shareable
//! [`dialect::Catalog`] at runtime, and every other component — the
//! [`encoder`], the [`decoder`], and the [`channel::Channel`] that wraps
//! both — works against that catalog rather than against generated structs.
//! A decoded message is an open, name-keyed record ([`value::FieldMap`])
//! rather than a per-message Rust type.
//!
//! # Layout
//! - [`checksum`] — the X.25 CRC-16 used by every frame's trailing checksum.
//! - [`types`] / [`value`] — the primitive wire-type and runtime value model
//!   shared by the rest of the crate.
//! - [`dialect`] — parses dialect XML and compiles it into a [`dialect::Catalog`],
//!   computing each message's wire order and CRC_EXTRA once up front.
//! - [`encoder`] — turns a field record into a framed byte sequence.
//! - [`decoder`] — a resumable, byte-fed state machine that turns an
//!   interleaved v1/v2 byte stream back into field records.
//! - [`signing`] — MAVLink 2 message signing (truncated SHA-256 + a
//!   monotonic per-stream timestamp).
//! - [`channel`] — a serialized per-endpoint wrapper tying the catalog,
//!   encoder, decoder, signing state, and statistics together.
//! - [`error`] — the structured error types every fallible operation returns.
//! - [`record`] / [`stats`] — the decoded-message and statistics types
//!   returned to callers.
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![deny(clippy::all)]
#![warn(clippy::use_self)]

pub mod channel;
pub mod checksum;
pub mod decoder;
pub mod dialect;
pub mod encoder;
pub mod error;
pub mod record;
#[cfg(feature = "signing")]
pub mod signing;
pub mod stats;
pub mod types;
pub mod value;

pub use channel::{Channel, ChannelConfig, ChannelError, ChannelEvent};
#[cfg(feature = "signing")]
pub use channel::SignatureContext;
pub use dialect::Catalog;
pub use encoder::MessageKey;
pub use error::{DecodeError, DialectError, EncodeError};
pub use record::{DecodedMessage, Protocol};
pub use stats::Statistics;
pub use value::{BitmaskValue, EnumValue, FieldMap, FieldValue};

//! Error types for dialect loading and for channel-level encode/decode
//! operations. Both tiers carry structured payloads rather than opaque
//! strings so callers can match on the variant (see `SPEC_FULL.md` §10.2).

use thiserror::Error;

/// Fatal errors raised while compiling one or more dialect XML documents
/// into a [`crate::dialect::Catalog`]. Any of these aborts construction.
#[derive(Error, Debug)]
pub enum DialectError {
    #[error("malformed dialect XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("message id {id} is declared by both {first_name:?} and {second_name:?}")]
    DuplicateMessageId {
        id: u32,
        first_name: String,
        second_name: String,
    },

    #[error("enum {group:?} entry {name:?} is declared with two different values ({first} and {second})")]
    DuplicateEnumEntry {
        group: String,
        name: String,
        first: u32,
        second: u32,
    },

    #[error("field {field:?} of message {message:?} references unknown enum group {group:?}")]
    UnknownEnumGroup {
        message: String,
        field: String,
        group: String,
    },

    #[error("message {message:?} field {field:?} has unrecognized wire type {type_name:?}")]
    UnknownWireType {
        message: String,
        field: String,
        type_name: String,
    },

    #[error("message {0:?} declares more than the 64 fields MAVLink permits")]
    TooManyFields(String),

    #[error("<message> element is missing a required {0:?} attribute")]
    MissingAttribute(&'static str),

    #[error("{0:?} attribute {1:?} is not a valid integer")]
    InvalidAttribute(&'static str, String),
}

/// Errors raised while encoding an application-supplied field record into a
/// wire frame. The channel remains usable after any of these (`SPEC_FULL.md` §7).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("no message with id or name {0:?} in the loaded dialect catalog")]
    UnknownMessage(String),

    #[error("message {message:?} declares extension fields and cannot be encoded under MAVLink 1")]
    BadProtocol { message: String },

    #[error("field {field:?} of message {message:?} is out of range for its declared type")]
    FieldOutOfRange { message: String, field: String },

    #[error("field {field:?} of message {message:?} is not declared by the dialect")]
    FieldUnknown { message: String, field: String },

    #[error("encoded payload for message {message:?} ({len} bytes) exceeds the maximum of {max} bytes")]
    Overflow {
        message: String,
        len: usize,
        max: usize,
    },
}

/// Errors and framing anomalies surfaced while decoding a byte stream. All
/// are recoverable: the decoder discards the offending frame and returns to
/// `IDLE`, ready to resynchronize on the next start-of-frame marker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("no message with id {0} in the loaded dialect catalog")]
    UnknownMessage(u32),

    #[error("checksum mismatch for message id {message_id} (expected {expected:#06x}, got {got:#06x})")]
    BadChecksum {
        message_id: u32,
        expected: u16,
        got: u16,
    },

    #[error("payload length {got} does not match the declared length {expected} for message id {message_id}")]
    BadLength {
        message_id: u32,
        expected: usize,
        got: usize,
    },

    #[error("signature verification failed for message id {message_id}")]
    BadSignature { message_id: u32 },

    #[error("channel cannot be downgraded from MAVLink 2 to MAVLink 1")]
    BadProtocol,
}

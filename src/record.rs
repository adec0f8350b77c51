//! The decoded message record a successful [`crate::decoder::Decoder`] step
//! or [`crate::channel::Channel::feed`] call produces.

use crate::value::FieldMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Protocol {
    V1,
    V2,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecodedMessage {
    pub message_id: u32,
    pub message_name: String,
    pub fields: FieldMap,
    pub protocol: Protocol,
    pub sequence: u8,
    pub system_id: u8,
    pub component_id: u8,
    /// Present only for signed MAVLink 2 frames.
    pub link_id: Option<u8>,
    /// Present only for signed MAVLink 2 frames: `Some(true)` if the
    /// signature verified, `Some(false)` if it didn't but the channel's
    /// accept-predicate chose to emit the frame anyway (`SPEC_FULL.md` §9
    /// open question).
    pub signature_valid: Option<bool>,
}

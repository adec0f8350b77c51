//! The byte-at-a-time decoder state machine (`SPEC_FULL.md` §4.4): accepts an
//! interleaved stream of MAVLink 1 and MAVLink 2 frames, recovers from
//! framing errors by backing off exactly one byte and re-examining the rest
//! of the buffered bytes as a possible start-of-frame, and emits decoded
//! records or structured errors.
//!
//! Signature verification needs the channel's signing key and accept
//! predicate, neither of which this module knows about, so `feed` takes a
//! callback invoked once per signed v2 frame; [`crate::channel::Channel`]
//! supplies it, keeping the decoder itself free of any crypto dependency.

use crate::checksum::frame_crc;
use crate::dialect::{Catalog, FieldSpec, MessageSpec};
use crate::error::DecodeError;
use crate::record::{DecodedMessage, Protocol};
use crate::types::WireType;
use crate::value::{BitmaskValue, EnumValue, FieldMap, FieldValue};
use std::collections::BTreeSet;

/// One event produced while feeding bytes into the decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeEvent {
    Frame(DecodedMessage),
    Error(DecodeError),
}

/// What a signed v2 frame needs verified, handed to the channel's callback.
pub struct SigRequest<'a> {
    pub message_id: u32,
    pub system_id: u8,
    pub component_id: u8,
    pub link_id: u8,
    pub timestamp: u64,
    pub signature: [u8; 6],
    /// The frame bytes from (and including) the length field through the
    /// checksum, i.e. everything `compute_signature` hashes except the
    /// leading start-of-frame marker.
    pub signed_bytes: &'a [u8],
}

/// The channel's verdict on a signed frame (`SPEC_FULL.md` §9 open question:
/// the dual "accepted but marked invalid" outcome is preserved deliberately).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigVerdict {
    Valid,
    AcceptedInvalid,
    Rejected,
}

/// A resumable byte-fed decoder for one dialect catalog. Owns a persistent
/// buffer so a frame split across multiple `feed` calls survives in between.
pub struct Decoder {
    catalog: Catalog,
    buf: Vec<u8>,
}

impl Decoder {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            buf: Vec::new(),
        }
    }

    /// Feeds a chunk of bytes, driving the state machine forward and
    /// returning every event produced along the way (zero, one, or several).
    pub fn feed(
        &mut self,
        bytes: &[u8],
        mut on_signature: impl FnMut(SigRequest) -> SigVerdict,
    ) -> Vec<DecodeEvent> {
        let mut events = Vec::new();
        for &byte in bytes {
            self.push_byte(byte, &mut on_signature, &mut events);
        }
        events
    }

    fn push_byte(
        &mut self,
        byte: u8,
        on_signature: &mut dyn FnMut(SigRequest) -> SigVerdict,
        events: &mut Vec<DecodeEvent>,
    ) {
        if self.buf.is_empty() {
            if byte == 0xFE || byte == 0xFD {
                self.buf.push(byte);
            }
            // IDLE: any other byte is discarded without comment.
            return;
        }
        self.buf.push(byte);
        self.drive(on_signature, events);
    }

    fn drive(
        &mut self,
        on_signature: &mut dyn FnMut(SigRequest) -> SigVerdict,
        events: &mut Vec<DecodeEvent>,
    ) {
        loop {
            match attempt_parse(&self.catalog, &self.buf, on_signature) {
                Attempt::Incomplete => return,
                Attempt::Fail(event) => {
                    events.push(event);
                    // Back off exactly the candidate start-of-frame byte;
                    // the rest of the buffer is re-examined from IDLE.
                    self.buf.remove(0);
                    self.trim_to_next_candidate();
                    if self.buf.is_empty() {
                        return;
                    }
                }
                Attempt::Done(event) => {
                    events.push(event);
                    self.buf.clear();
                    return;
                }
            }
        }
    }

    fn trim_to_next_candidate(&mut self) {
        while let Some(&b) = self.buf.first() {
            if b == 0xFE || b == 0xFD {
                break;
            }
            self.buf.remove(0);
        }
    }
}

enum Attempt {
    Incomplete,
    Fail(DecodeEvent),
    Done(DecodeEvent),
}

fn attempt_parse(
    catalog: &Catalog,
    buf: &[u8],
    on_signature: &mut dyn FnMut(SigRequest) -> SigVerdict,
) -> Attempt {
    if buf.len() < 2 {
        return Attempt::Incomplete;
    }
    let is_v2 = buf[0] == 0xFD;
    let len = buf[1] as usize;
    let header_total = if is_v2 { 10 } else { 6 };
    if buf.len() < header_total {
        return Attempt::Incomplete;
    }

    let (seq, system_id, component_id, msg_id, incompat) = if is_v2 {
        let incompat = buf[2];
        let seq = buf[4];
        let sysid = buf[5];
        let compid = buf[6];
        let msg_id = buf[7] as u32 | (buf[8] as u32) << 8 | (buf[9] as u32) << 16;
        (seq, sysid, compid, msg_id, incompat)
    } else {
        (buf[2], buf[3], buf[4], buf[5] as u32, 0u8)
    };

    let Some(msg) = catalog.message_by_id(msg_id) else {
        return Attempt::Fail(DecodeEvent::Error(DecodeError::UnknownMessage(msg_id)));
    };

    if !is_v2 && len != msg.declared_payload_len {
        return Attempt::Fail(DecodeEvent::Error(DecodeError::BadLength {
            message_id: msg_id,
            expected: msg.declared_payload_len,
            got: len,
        }));
    }

    let payload_end = header_total + len;
    let checksum_end = payload_end + 2;
    if buf.len() < checksum_end {
        return Attempt::Incomplete;
    }

    let crc = frame_crc(&buf[1..payload_end], msg.crc_extra);
    let observed_crc = u16::from_le_bytes([buf[payload_end], buf[payload_end + 1]]);
    if crc != observed_crc {
        return Attempt::Fail(DecodeEvent::Error(DecodeError::BadChecksum {
            message_id: msg_id,
            expected: crc,
            got: observed_crc,
        }));
    }

    let signed = is_v2 && (incompat & 0x01 != 0);
    let (link_id, signature_valid) = if signed {
        let sig_end = checksum_end + 13;
        if buf.len() < sig_end {
            return Attempt::Incomplete;
        }
        let link_id = buf[checksum_end];
        let timestamp = read_u48_le(&buf[checksum_end + 1..checksum_end + 7]);
        let mut signature = [0u8; 6];
        signature.copy_from_slice(&buf[checksum_end + 7..sig_end]);
        let request = SigRequest {
            message_id: msg_id,
            system_id,
            component_id,
            link_id,
            timestamp,
            signature,
            signed_bytes: &buf[1..checksum_end],
        };
        match on_signature(request) {
            SigVerdict::Valid => (Some(link_id), Some(true)),
            SigVerdict::AcceptedInvalid => (Some(link_id), Some(false)),
            SigVerdict::Rejected => {
                return Attempt::Fail(DecodeEvent::Error(DecodeError::BadSignature {
                    message_id: msg_id,
                }));
            }
        }
    } else {
        (None, None)
    };

    let raw_payload = &buf[header_total..payload_end];
    let fields = if is_v2 {
        let mut full = raw_payload.to_vec();
        full.resize(msg.max_payload_len, 0);
        decode_payload(catalog, msg, &full, true)
    } else {
        decode_payload(catalog, msg, raw_payload, false)
    };

    let protocol = if is_v2 { Protocol::V2 } else { Protocol::V1 };
    Attempt::Done(DecodeEvent::Frame(DecodedMessage {
        message_id: msg_id,
        message_name: msg.name.clone(),
        fields,
        protocol,
        sequence: seq,
        system_id,
        component_id,
        link_id,
        signature_valid,
    }))
}

fn read_u48_le(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf[..6].copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

fn decode_payload(
    catalog: &Catalog,
    msg: &MessageSpec,
    payload: &[u8],
    include_extensions: bool,
) -> FieldMap {
    let mut map = FieldMap::new();
    let mut offset = 0usize;
    for field in &msg.fields_wire {
        if field.is_extension && !include_extensions {
            continue;
        }
        let len = field.shape.byte_len();
        let slice = &payload[offset..offset + len];
        offset += len;
        map.insert(field.name.clone(), decode_field(catalog, field, slice));
    }
    map
}

fn decode_field(catalog: &Catalog, field: &FieldSpec, bytes: &[u8]) -> FieldValue {
    if field.shape.is_array() {
        let width = field.shape.element.width();
        let elements = bytes
            .chunks(width)
            .map(|chunk| decode_scalar(catalog, field, chunk))
            .collect();
        FieldValue::Array(elements)
    } else {
        decode_scalar(catalog, field, bytes)
    }
}

fn decode_scalar(catalog: &Catalog, field: &FieldSpec, bytes: &[u8]) -> FieldValue {
    if let Some(group_name) = &field.enum_group {
        let raw = decode_numeric_u32(bytes);
        if field.is_bitmask {
            let mut known = BTreeSet::new();
            let mut matched_mask = 0u32;
            if let Some(group) = catalog.enum_group(group_name) {
                for (name, value) in group.entries() {
                    if value != 0 && raw & value == value {
                        known.insert(name.to_string());
                        matched_mask |= value;
                    }
                }
            }
            let unknown_bits = raw & !matched_mask;
            return FieldValue::Bitmask(BitmaskValue::new(known, unknown_bits, raw));
        }
        let tag = catalog
            .enum_group(group_name)
            .and_then(|g| g.tag_for(raw))
            .map(str::to_string);
        return FieldValue::Enum(match tag {
            Some(tag) => EnumValue::Known { tag, value: raw },
            None => EnumValue::Raw(raw),
        });
    }

    match field.shape.element {
        WireType::UInt8 => FieldValue::UInt8(bytes[0]),
        WireType::Int8 => FieldValue::Int8(bytes[0] as i8),
        WireType::UInt16 => FieldValue::UInt16(u16::from_le_bytes([bytes[0], bytes[1]])),
        WireType::Int16 => FieldValue::Int16(i16::from_le_bytes([bytes[0], bytes[1]])),
        WireType::UInt32 => FieldValue::UInt32(u32::from_le_bytes(bytes[..4].try_into().unwrap())),
        WireType::Int32 => FieldValue::Int32(i32::from_le_bytes(bytes[..4].try_into().unwrap())),
        WireType::UInt64 => FieldValue::UInt64(u64::from_le_bytes(bytes[..8].try_into().unwrap())),
        WireType::Int64 => FieldValue::Int64(i64::from_le_bytes(bytes[..8].try_into().unwrap())),
        WireType::Float => FieldValue::Float(f32::from_le_bytes(bytes[..4].try_into().unwrap())),
        WireType::Double => FieldValue::Double(f64::from_le_bytes(bytes[..8].try_into().unwrap())),
        WireType::Char => FieldValue::Char(bytes[0]),
    }
}

fn decode_numeric_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    let w = bytes.len().min(4);
    buf[..w].copy_from_slice(&bytes[..w]);
    u32::from_le_bytes(buf)
}

//! Serializes a field record into a framed byte sequence for a chosen
//! protocol version (`SPEC_FULL.md` §4.3).

use crate::checksum::frame_crc;
use crate::dialect::{Catalog, FieldSpec, MessageSpec};
use crate::error::EncodeError;
use crate::record::Protocol;
#[cfg(feature = "signing")]
use crate::signing::{compute_signature, SigningKey};
use crate::types::WireType;
use crate::value::{FieldMap, FieldValue};

pub const MAVLINK_IFLAG_SIGNED: u8 = 0x01;

/// Resolves a message by numeric id or by name.
pub enum MessageKey<'a> {
    Id(u32),
    Name(&'a str),
}

/// A just-encoded frame, before the channel appends a signing trailer (the
/// channel needs its own mutable signing clock for that step).
pub struct EncodedFrame {
    pub bytes: Vec<u8>,
    /// True if the encoder set the "signed" incompatibility flag, meaning
    /// the channel must still append the signing trailer.
    pub needs_signature: bool,
}

pub fn resolve<'a>(catalog: &'a Catalog, key: &MessageKey) -> Result<&'a MessageSpec, EncodeError> {
    match key {
        MessageKey::Id(id) => catalog
            .message_by_id(*id)
            .ok_or_else(|| EncodeError::UnknownMessage(id.to_string())),
        MessageKey::Name(name) => catalog
            .message_by_name(name)
            .ok_or_else(|| EncodeError::UnknownMessage((*name).to_string())),
    }
}

fn cast_numeric(message: &str, field: &FieldSpec, n: u64) -> Result<Vec<u8>, EncodeError> {
    let width = field.shape.element.width();
    let max: u64 = if width >= 8 { u64::MAX } else { (1u64 << (width * 8)) - 1 };
    if n > max {
        return Err(EncodeError::FieldOutOfRange {
            message: message.to_string(),
            field: field.name.clone(),
        });
    }
    Ok(match width {
        1 => vec![n as u8],
        2 => (n as u16).to_le_bytes().to_vec(),
        4 => (n as u32).to_le_bytes().to_vec(),
        8 => n.to_le_bytes().to_vec(),
        _ => unreachable!("wire types are 1, 2, 4, or 8 bytes wide"),
    })
}

fn scalar_bytes(message: &str, field: &FieldSpec, value: &FieldValue) -> Result<Vec<u8>, EncodeError> {
    use WireType::*;
    match (field.shape.element, value) {
        (UInt8, FieldValue::UInt8(v)) => Ok(vec![*v]),
        (Int8, FieldValue::Int8(v)) => Ok(vec![*v as u8]),
        (UInt16, FieldValue::UInt16(v)) => Ok(v.to_le_bytes().to_vec()),
        (Int16, FieldValue::Int16(v)) => Ok(v.to_le_bytes().to_vec()),
        (UInt32, FieldValue::UInt32(v)) => Ok(v.to_le_bytes().to_vec()),
        (Int32, FieldValue::Int32(v)) => Ok(v.to_le_bytes().to_vec()),
        (UInt64, FieldValue::UInt64(v)) => Ok(v.to_le_bytes().to_vec()),
        (Int64, FieldValue::Int64(v)) => Ok(v.to_le_bytes().to_vec()),
        (Float, FieldValue::Float(v)) => Ok(v.to_le_bytes().to_vec()),
        (Double, FieldValue::Double(v)) => Ok(v.to_le_bytes().to_vec()),
        (Char, FieldValue::Char(v)) => Ok(vec![*v]),
        (_, FieldValue::Enum(e)) => cast_numeric(message, field, e.numeric() as u64),
        (_, FieldValue::Bitmask(b)) => cast_numeric(message, field, b.to_bits() as u64),
        _ => Err(EncodeError::FieldOutOfRange {
            message: message.to_string(),
            field: field.name.clone(),
        }),
    }
}

fn field_bytes(message: &str, field: &FieldSpec, values: &FieldMap) -> Result<Vec<u8>, EncodeError> {
    let Some(value) = values.get(&field.name) else {
        return Ok(vec![0u8; field.shape.byte_len()]);
    };

    if field.shape.is_array() {
        let FieldValue::Array(elements) = value else {
            return Err(EncodeError::FieldOutOfRange {
                message: message.to_string(),
                field: field.name.clone(),
            });
        };
        if elements.len() > field.shape.array_len {
            return Err(EncodeError::FieldOutOfRange {
                message: message.to_string(),
                field: field.name.clone(),
            });
        }
        let mut out = Vec::with_capacity(field.shape.byte_len());
        for element in elements {
            out.extend(scalar_bytes(message, field, element)?);
        }
        out.resize(field.shape.byte_len(), 0);
        Ok(out)
    } else {
        scalar_bytes(message, field, value)
    }
}

/// Drops trailing zero bytes from a v2 payload, never below length 1
/// (`SPEC_FULL.md` §4.3 step 4; matches the reference implementation's
/// `utils::remove_trailing_zeroes`).
fn truncate_trailing_zeroes(payload: &[u8]) -> usize {
    let mut len = payload.len();
    while len > 1 && payload[len - 1] == 0 {
        len -= 1;
    }
    len
}

/// Builds the unsigned portion of a frame (everything through the checksum).
/// `sign_outgoing` only controls whether the "signed" incompatibility flag is
/// set on a v2 frame; the caller (the channel) is responsible for appending
/// the actual signing trailer, since that requires per-channel signing
/// state this function does not have access to.
#[allow(clippy::too_many_arguments)]
pub fn encode_frame(
    msg: &MessageSpec,
    fields: &FieldMap,
    protocol: Protocol,
    sequence: u8,
    system_id: u8,
    component_id: u8,
    sign_outgoing: bool,
) -> Result<EncodedFrame, EncodeError> {
    if msg.has_extensions && matches!(protocol, Protocol::V1) {
        return Err(EncodeError::BadProtocol {
            message: msg.name.clone(),
        });
    }

    for key in fields.keys() {
        if msg.field(key).is_none() {
            return Err(EncodeError::FieldUnknown {
                message: msg.name.clone(),
                field: key.clone(),
            });
        }
    }

    let include_extensions = matches!(protocol, Protocol::V2);
    let mut payload = Vec::with_capacity(msg.max_payload_len);
    for field in &msg.fields_wire {
        if field.is_extension && !include_extensions {
            continue;
        }
        payload.extend(field_bytes(&msg.name, field, fields)?);
    }

    if payload.len() > u8::MAX as usize {
        return Err(EncodeError::Overflow {
            message: msg.name.clone(),
            len: payload.len(),
            max: u8::MAX as usize,
        });
    }

    let mut bytes = Vec::with_capacity(payload.len() + 25);
    let needs_signature;
    match protocol {
        Protocol::V1 => {
            needs_signature = false;
            bytes.push(0xFE);
            bytes.push(payload.len() as u8);
            bytes.push(sequence);
            bytes.push(system_id);
            bytes.push(component_id);
            bytes.push((msg.id & 0xFF) as u8);
        }
        Protocol::V2 => {
            let truncated_len = truncate_trailing_zeroes(&payload);
            payload.truncate(truncated_len);
            needs_signature = sign_outgoing;
            let incompat = if sign_outgoing { MAVLINK_IFLAG_SIGNED } else { 0 };
            bytes.push(0xFD);
            bytes.push(payload.len() as u8);
            bytes.push(incompat);
            bytes.push(0); // compat flags
            bytes.push(sequence);
            bytes.push(system_id);
            bytes.push(component_id);
            let id = msg.id.to_le_bytes();
            bytes.extend_from_slice(&id[0..3]);
        }
    }
    bytes.extend_from_slice(&payload);

    let crc = frame_crc(&bytes[1..], msg.crc_extra);
    bytes.extend_from_slice(&crc.to_le_bytes());

    Ok(EncodedFrame {
        bytes,
        needs_signature,
    })
}

/// Appends the 13-byte signing trailer to an already-built v2 frame.
#[cfg(feature = "signing")]
pub fn append_signature(frame: &mut Vec<u8>, key: &SigningKey, link_id: u8, timestamp: u64) {
    let signature = compute_signature(key, &frame[1..], link_id, timestamp);
    frame.push(link_id);
    frame.extend_from_slice(&timestamp.to_le_bytes()[..6]);
    frame.extend_from_slice(&signature);
}

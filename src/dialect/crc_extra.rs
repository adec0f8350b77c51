//! Computes a message's CRC_EXTRA seed: an 8-bit fold of a CRC-16 digest over
//! the message name and its core (non-extension) fields in wire order.
//! Reproduces the reference compiler's `extra_crc` digest order exactly,
//! including its "type" field name special case (dialect XML reserves
//! `type` as an attribute name; the field itself keeps that name for CRC
//! purposes even though it can't be used verbatim as a Rust identifier).

use crate::checksum::Checksum;
use crate::dialect::catalog::FieldSpec;

pub fn compute(message_name: &str, core_fields_in_wire_order: &[FieldSpec]) -> u8 {
    let mut crc = Checksum::init();
    crc.update_slice(message_name.as_bytes());
    crc.update_slice(b" ");

    for field in core_fields_in_wire_order {
        crc.update_slice(field.shape.element.primitive_name().as_bytes());
        crc.update_slice(b" ");
        crc.update_slice(field.name.as_bytes());
        crc.update_slice(b" ");
        if field.shape.is_array() {
            crc.update(field.shape.array_len as u8);
        }
    }

    let crcval = crc.finalize_raw();
    ((crcval & 0xFF) ^ (crcval >> 8)) as u8
}

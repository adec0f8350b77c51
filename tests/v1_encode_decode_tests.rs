//! MAVLink 1 specific framing behavior (`SPEC_FULL.md` §8 scenarios 1, 2, 4):
//! the exact scenario-1 byte sequence, incremental byte-at-a-time decoding,
//! and the v1/extension-field incompatibility.

mod test_shared;

use mavwire::channel::{Channel, ChannelConfig, ChannelEvent};
use mavwire::dialect::Catalog;
use mavwire::encoder::MessageKey;
use mavwire::error::EncodeError;
use mavwire::value::{FieldMap, FieldValue};
use test_shared::{catalog, heartbeat_fields};

// A HEARTBEAT with no enum or bitmask fields, matching the scenario's plain
// uint8/uint32 fields exactly so the encoded bytes (and CRC_EXTRA=50) line up
// with the literal sequence in the specification.
const SCENARIO_HEARTBEAT_XML: &str = r#"
    <mavlink>
      <messages>
        <message id="0" name="HEARTBEAT">
          <field type="uint32_t" name="custom_mode"></field>
          <field type="uint8_t" name="type"></field>
          <field type="uint8_t" name="autopilot"></field>
          <field type="uint8_t" name="base_mode"></field>
          <field type="uint8_t" name="system_status"></field>
          <field type="uint8_t" name="mavlink_version"></field>
        </message>
      </messages>
    </mavlink>
"#;

fn scenario_fields() -> FieldMap {
    let mut fields = FieldMap::new();
    fields.insert("custom_mode".into(), FieldValue::UInt32(0));
    fields.insert("type".into(), FieldValue::UInt8(1));
    fields.insert("autopilot".into(), FieldValue::UInt8(2));
    fields.insert("base_mode".into(), FieldValue::UInt8(0));
    fields.insert("system_status".into(), FieldValue::UInt8(4));
    fields.insert("mavlink_version".into(), FieldValue::UInt8(3));
    fields
}

const SCENARIO_1_BYTES: [u8; 17] = [
    0xFE, 0x09, 0x00, 0x63, 0x58, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x02, 0x00, 0x04, 0x03, 0x43, 0x03,
];

#[test]
fn scenario_1_encodes_the_exact_byte_sequence() {
    let catalog = Catalog::load([SCENARIO_HEARTBEAT_XML]).unwrap();
    let mut channel = Channel::new(
        catalog,
        ChannelConfig {
            system_id: 99,
            component_id: 88,
            ..ChannelConfig::default()
        },
    );

    let sent = channel
        .encode(MessageKey::Name("HEARTBEAT"), &scenario_fields())
        .unwrap();
    assert_eq!(sent.bytes, SCENARIO_1_BYTES);
}

#[test]
fn scenario_2_emits_exactly_one_record_after_the_seventeenth_byte() {
    let catalog = Catalog::load([SCENARIO_HEARTBEAT_XML]).unwrap();
    let mut channel = Channel::new(catalog, ChannelConfig::default());

    for (i, &byte) in SCENARIO_1_BYTES.iter().enumerate() {
        let events = channel.feed(&[byte]);
        if i < SCENARIO_1_BYTES.len() - 1 {
            assert!(events.is_empty(), "byte {i} should not complete a frame yet");
        } else {
            assert_eq!(events.len(), 1);
            let ChannelEvent::Message(decoded) = &events[0] else {
                panic!("expected a decoded message, got {:?}", events[0]);
            };
            assert_eq!(decoded.message_name, "HEARTBEAT");
            assert_eq!(decoded.system_id, 99);
            assert_eq!(decoded.component_id, 88);
            assert_eq!(decoded.sequence, 0);
            assert_eq!(decoded.fields.get("type"), Some(&FieldValue::UInt8(1)));
            assert_eq!(decoded.fields.get("autopilot"), Some(&FieldValue::UInt8(2)));
        }
    }
}

#[test]
fn scenario_4_extension_bearing_message_cannot_be_encoded_under_v1() {
    let catalog = catalog();
    let mut channel = Channel::new(catalog, ChannelConfig::default());

    let mut fields = FieldMap::new();
    fields.insert("x".into(), FieldValue::UInt32(1));
    fields.insert("y".into(), FieldValue::UInt32(2));
    fields.insert("z".into(), FieldValue::UInt8(3));

    let err = channel
        .encode(MessageKey::Name("CMD_EXT"), &fields)
        .unwrap_err();
    assert!(matches!(err, EncodeError::BadProtocol { message } if message == "CMD_EXT"));
    assert_eq!(channel.statistics().bad_protocol, 1);
    assert_eq!(channel.statistics().frames_encoded, 0);
}

#[test]
fn heartbeat_round_trip_still_holds_through_the_shared_fixture_dialect() {
    let catalog = catalog();
    let mut sender = Channel::new(catalog.clone(), ChannelConfig::default());
    let mut receiver = Channel::new(catalog, ChannelConfig::default());

    let sent = sender
        .encode(MessageKey::Name("HEARTBEAT"), &heartbeat_fields())
        .unwrap();
    assert_eq!(sent.bytes[0], 0xFE);
    let events = receiver.feed(&sent.bytes);
    assert_eq!(events.len(), 1);
}

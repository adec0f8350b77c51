//! A small hand-written dialect shared by the cross-module behavioral tests
//! under `tests/`, mirroring a slice of the real `common.xml` dialect:
//! `HEARTBEAT` (the scenario from `SPEC_FULL.md` §8), a bitmask-flagged
//! field (`base_mode`), a plain enum field (`autopilot`), and an
//! extension-bearing message (`CMD_EXT`) to exercise the v1/v2 split.

use mavwire::dialect::Catalog;
use mavwire::value::{BitmaskValue, EnumValue, FieldMap, FieldValue};
use std::collections::BTreeSet;

pub const DIALECT_XML: &str = r#"
    <mavlink>
      <enums>
        <enum name="MAV_AUTOPILOT">
          <entry name="MAV_AUTOPILOT_GENERIC" value="0"/>
          <entry name="MAV_AUTOPILOT_ARDUPILOTMEGA" value="3"/>
        </enum>
        <enum name="MAV_MODE_FLAG" bitmask="true">
          <entry name="MAV_MODE_FLAG_CUSTOM_MODE_ENABLED" value="1"/>
          <entry name="MAV_MODE_FLAG_STABILIZE_ENABLED" value="16"/>
          <entry name="MAV_MODE_FLAG_GUIDED_ENABLED" value="8"/>
        </enum>
      </enums>
      <messages>
        <message id="0" name="HEARTBEAT">
          <field type="uint32_t" name="custom_mode">A bitfield for autopilot-specific flags.</field>
          <field type="uint8_t" name="type">Vehicle type.</field>
          <field type="uint8_t" name="autopilot" enum="MAV_AUTOPILOT">Autopilot type.</field>
          <field type="uint8_t" name="base_mode" enum="MAV_MODE_FLAG">System mode bitmask.</field>
          <field type="uint8_t" name="system_status">System status.</field>
          <field type="uint8_t" name="mavlink_version">MAVLink version.</field>
        </message>
        <message id="5" name="CMD_EXT">
          <field type="uint32_t" name="x">Core field.</field>
          <field type="uint32_t" name="y">Core field.</field>
          <extensions/>
          <field type="uint8_t" name="z">Extension-only field, v2 only.</field>
        </message>
      </messages>
    </mavlink>
"#;

pub fn catalog() -> Catalog {
    Catalog::load([DIALECT_XML]).expect("fixture dialect must parse")
}

pub fn heartbeat_fields() -> FieldMap {
    let mut fields = FieldMap::new();
    fields.insert("custom_mode".into(), FieldValue::UInt32(0));
    fields.insert("type".into(), FieldValue::UInt8(1));
    fields.insert(
        "autopilot".into(),
        FieldValue::Enum(EnumValue::Known {
            tag: "MAV_AUTOPILOT_ARDUPILOTMEGA".into(),
            value: 3,
        }),
    );
    let mut known = BTreeSet::new();
    known.insert("MAV_MODE_FLAG_STABILIZE_ENABLED".to_string());
    known.insert("MAV_MODE_FLAG_GUIDED_ENABLED".to_string());
    fields.insert(
        "base_mode".into(),
        FieldValue::Bitmask(BitmaskValue::new(known, 0, 24)),
    );
    fields.insert("system_status".into(), FieldValue::UInt8(4));
    fields.insert("mavlink_version".into(), FieldValue::UInt8(3));
    fields
}

//! The immutable, shared runtime catalog built by the dialect compiler:
//! messages-by-id, messages-by-name, and enum groups, each carrying the wire
//! order and CRC_EXTRA precomputed so the encoder/decoder never recompute
//! them per frame.

use crate::dialect::crc_extra;
use crate::dialect::xml::{self, RawEnum, RawProfile};
use crate::error::DialectError;
use crate::types::{parse_type_attr, TypeShape};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub shape: TypeShape,
    pub enum_group: Option<String>,
    pub is_bitmask: bool,
    pub is_extension: bool,
}

#[derive(Debug, Clone)]
pub struct MessageSpec {
    pub id: u32,
    pub name: String,
    /// Fields in the order they were declared in the dialect XML.
    pub fields_declared: Vec<FieldSpec>,
    /// Core (non-extension) fields sorted by descending width, followed by
    /// extension fields in declaration order. This is the order bytes
    /// appear on the wire.
    pub fields_wire: Vec<FieldSpec>,
    pub crc_extra: u8,
    pub has_extensions: bool,
    /// Sum of core field sizes: the v1 payload length and the v2 minimum
    /// (pre-truncation) length.
    pub declared_payload_len: usize,
    /// Sum including extension fields: the v2 maximum payload length.
    pub max_payload_len: usize,
}

impl MessageSpec {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields_declared.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnumGroup {
    pub name: String,
    pub is_bitmask: bool,
    by_name: BTreeMap<String, u32>,
    by_value: HashMap<u32, String>,
}

impl EnumGroup {
    pub fn tag_for(&self, value: u32) -> Option<&str> {
        self.by_value.get(&value).map(String::as_str)
    }

    pub fn value_for(&self, tag: &str) -> Option<u32> {
        self.by_name.get(tag).copied()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, u32)> {
        self.by_name.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// The compiled, immutable dialect catalog. Cheap to clone (an `Arc` around
/// the actual tables) so sharing it across channels and threads requires no
/// locking — construction is the only mutable phase.
#[derive(Debug, Clone)]
pub struct Catalog(Arc<CatalogInner>);

#[derive(Debug)]
struct CatalogInner {
    by_id: BTreeMap<u32, MessageSpec>,
    by_name: BTreeMap<String, u32>,
    enums: BTreeMap<String, EnumGroup>,
}

impl Catalog {
    /// Parses and merges an ordered sequence of dialect XML documents.
    /// Later documents extend earlier ones; a collision on message id or
    /// enum entry value aborts the whole load (`SPEC_FULL.md` §4.2).
    pub fn load<'a>(documents: impl IntoIterator<Item = &'a str>) -> Result<Self, DialectError> {
        let mut by_id: BTreeMap<u32, MessageSpec> = BTreeMap::new();
        let mut by_name: BTreeMap<String, u32> = BTreeMap::new();
        let mut enums: BTreeMap<String, EnumGroup> = BTreeMap::new();
        let mut entry_origin: HashMap<(String, String), u32> = HashMap::new();

        let mut raw_profiles: Vec<RawProfile> = Vec::new();
        for doc in documents {
            raw_profiles.push(xml::parse_document(doc)?);
        }

        // Enum groups must be known before resolving message fields, since a
        // field's `enum` attribute may reference a group declared in an
        // earlier or later document.
        for profile in &raw_profiles {
            for raw_enum in &profile.enums {
                merge_enum(&mut enums, &mut entry_origin, raw_enum)?;
            }
        }

        for profile in &raw_profiles {
            for raw_message in &profile.messages {
                let spec = match compile_message(raw_message, &enums) {
                    Ok(spec) => spec,
                    Err(err @ (DialectError::UnknownWireType { .. }
                    | DialectError::UnknownEnumGroup { .. }
                    | DialectError::TooManyFields(_))) => {
                        log::warn!("skipping message {:?}: {err}", raw_message.name);
                        continue;
                    }
                    Err(err) => return Err(err),
                };
                if let Some(existing) = by_id.get(&spec.id) {
                    if existing.name != spec.name {
                        return Err(DialectError::DuplicateMessageId {
                            id: spec.id,
                            first_name: existing.name.clone(),
                            second_name: spec.name,
                        });
                    }
                }
                by_name.insert(spec.name.clone(), spec.id);
                by_id.insert(spec.id, spec);
            }
        }

        Ok(Self(Arc::new(CatalogInner {
            by_id,
            by_name,
            enums,
        })))
    }

    pub fn message_by_id(&self, id: u32) -> Option<&MessageSpec> {
        self.0.by_id.get(&id)
    }

    pub fn message_by_name(&self, name: &str) -> Option<&MessageSpec> {
        let id = self.0.by_name.get(name)?;
        self.0.by_id.get(id)
    }

    pub fn enum_group(&self, name: &str) -> Option<&EnumGroup> {
        self.0.enums.get(name)
    }

    pub fn messages(&self) -> impl Iterator<Item = &MessageSpec> {
        self.0.by_id.values()
    }
}

fn merge_enum(
    enums: &mut BTreeMap<String, EnumGroup>,
    entry_origin: &mut HashMap<(String, String), u32>,
    raw: &RawEnum,
) -> Result<(), DialectError> {
    let group = enums.entry(raw.name.clone()).or_insert_with(|| EnumGroup {
        name: raw.name.clone(),
        is_bitmask: raw.bitmask,
        by_name: BTreeMap::new(),
        by_value: HashMap::new(),
    });
    group.is_bitmask |= raw.bitmask;

    for entry in &raw.entries {
        let key = (raw.name.clone(), entry.name.clone());
        if let Some(&prev_value) = entry_origin.get(&key) {
            if prev_value != entry.value {
                return Err(DialectError::DuplicateEnumEntry {
                    group: raw.name.clone(),
                    name: entry.name.clone(),
                    first: prev_value,
                    second: entry.value,
                });
            }
            continue;
        }
        entry_origin.insert(key, entry.value);
        group.by_name.insert(entry.name.clone(), entry.value);
        group.by_value.insert(entry.value, entry.name.clone());
    }
    Ok(())
}

fn compile_message(
    raw: &xml::RawMessage,
    enums: &BTreeMap<String, EnumGroup>,
) -> Result<MessageSpec, DialectError> {
    if raw.fields.len() > 64 {
        return Err(DialectError::TooManyFields(raw.name.clone()));
    }

    let mut fields_declared = Vec::with_capacity(raw.fields.len());
    for f in &raw.fields {
        let shape = parse_type_attr(&f.type_attr).ok_or_else(|| DialectError::UnknownWireType {
            message: raw.name.clone(),
            field: f.name.clone(),
            type_name: f.type_attr.clone(),
        })?;
        let is_bitmask = if let Some(group) = &f.enum_group {
            let group_spec = enums.get(group).ok_or_else(|| DialectError::UnknownEnumGroup {
                message: raw.name.clone(),
                field: f.name.clone(),
                group: group.clone(),
            })?;
            group_spec.is_bitmask
        } else {
            false
        };
        fields_declared.push(FieldSpec {
            name: f.name.clone(),
            shape,
            enum_group: f.enum_group.clone(),
            is_bitmask,
            is_extension: f.is_extension,
        });
    }

    let mut core: Vec<FieldSpec> = fields_declared
        .iter()
        .filter(|f| !f.is_extension)
        .cloned()
        .collect();
    // Stable sort by descending primitive width: 8, then 4, 2, 1.
    core.sort_by_key(|f| std::cmp::Reverse(f.shape.sort_width()));

    let extensions: Vec<FieldSpec> = fields_declared
        .iter()
        .filter(|f| f.is_extension)
        .cloned()
        .collect();

    let crc_extra = crc_extra::compute(&raw.name, &core);

    let declared_payload_len: usize = core.iter().map(|f| f.shape.byte_len()).sum();
    let max_payload_len =
        declared_payload_len + extensions.iter().map(|f| f.shape.byte_len()).sum::<usize>();

    let mut fields_wire = core;
    fields_wire.extend(extensions);

    Ok(MessageSpec {
        id: raw.id,
        name: raw.name.clone(),
        fields_declared,
        fields_wire,
        crc_extra,
        has_extensions: raw.fields.iter().any(|f| f.is_extension),
        declared_payload_len,
        max_payload_len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEARTBEAT_XML: &str = r#"
        <mavlink>
          <messages>
            <message id="0" name="HEARTBEAT">
              <field type="uint8_t" name="type">Vehicle type.</field>
              <field type="uint8_t" name="autopilot">Autopilot type.</field>
              <field type="uint8_t" name="base_mode">System mode bitmask.</field>
              <field type="uint32_t" name="custom_mode">Autopilot-specific mode.</field>
              <field type="uint8_t" name="system_status">System status.</field>
              <field type="uint8_t" name="mavlink_version">MAVLink version.</field>
            </message>
          </messages>
        </mavlink>
    "#;

    #[test]
    fn loads_heartbeat_with_correct_wire_order_and_crc_extra() {
        let catalog = Catalog::load([HEARTBEAT_XML]).unwrap();
        let msg = catalog.message_by_id(0).unwrap();
        assert_eq!(msg.name, "HEARTBEAT");
        assert_eq!(msg.crc_extra, 50);
        assert_eq!(msg.declared_payload_len, 9);
        let wire_names: Vec<&str> = msg.fields_wire.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            wire_names,
            vec![
                "custom_mode",
                "type",
                "autopilot",
                "base_mode",
                "system_status",
                "mavlink_version"
            ]
        );
    }

    #[test]
    fn rejects_duplicate_message_id_with_different_names() {
        let a = r#"<mavlink><messages><message id="1" name="A"><field type="uint8_t" name="x"></field></message></messages></mavlink>"#;
        let b = r#"<mavlink><messages><message id="1" name="B"><field type="uint8_t" name="x"></field></message></messages></mavlink>"#;
        let err = Catalog::load([a, b]).unwrap_err();
        assert!(matches!(err, DialectError::DuplicateMessageId { .. }));
    }

    #[test]
    fn skips_message_with_unknown_wire_type_but_keeps_loading() {
        let xml = r#"
            <mavlink><messages>
              <message id="1" name="BAD"><field type="nonsense_t" name="x"></field></message>
              <message id="2" name="GOOD"><field type="uint8_t" name="y"></field></message>
            </messages></mavlink>
        "#;
        let catalog = Catalog::load([xml]).unwrap();
        assert!(catalog.message_by_id(1).is_none());
        assert!(catalog.message_by_name("BAD").is_none());
        assert!(catalog.message_by_id(2).is_some());
    }

    #[test]
    fn extension_fields_are_excluded_from_crc_extra_and_appended_last() {
        let xml = r#"
            <mavlink><messages>
              <message id="2" name="WITH_EXT">
                <field type="uint32_t" name="a"></field>
                <field type="uint8_t" name="b"></field>
                <extensions/>
                <field type="uint16_t" name="c"></field>
              </message>
            </messages></mavlink>
        "#;
        let with_ext = Catalog::load([xml]).unwrap();
        let without_ext_xml = r#"
            <mavlink><messages>
              <message id="2" name="WITH_EXT">
                <field type="uint32_t" name="a"></field>
                <field type="uint8_t" name="b"></field>
              </message>
            </messages></mavlink>
        "#;
        let without_ext = Catalog::load([without_ext_xml]).unwrap();
        let msg = with_ext.message_by_id(2).unwrap();
        let baseline = without_ext.message_by_id(2).unwrap();
        assert_eq!(msg.crc_extra, baseline.crc_extra);
        assert!(msg.has_extensions);
        assert_eq!(msg.fields_wire.last().unwrap().name, "c");
        assert_eq!(msg.declared_payload_len, 5);
        assert_eq!(msg.max_payload_len, 7);
    }
}

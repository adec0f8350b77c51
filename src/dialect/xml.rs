//! Reads a single dialect XML document into an unresolved [`RawProfile`].
//!
//! Tokenizing the markup itself is `quick_xml`'s job; this module only
//! interprets the already-tokenized event stream the way the reference
//! MAVLink code generator's `parse_profile` does, minus the `<include>`
//! file-following it performs — here the caller supplies the ordered
//! sequence of documents directly (`SPEC_FULL.md` §4.2), so there is nothing
//! left for an `<include>` element to resolve.

use crate::error::DialectError;
use crate::types::parse_type_attr;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

#[derive(Debug, Clone, Default)]
pub struct RawField {
    pub name: String,
    pub type_attr: String,
    pub enum_group: Option<String>,
    pub is_extension: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RawMessage {
    pub id: u32,
    pub name: String,
    pub fields: Vec<RawField>,
}

#[derive(Debug, Clone, Default)]
pub struct RawEnumEntry {
    pub name: String,
    pub value: u32,
}

#[derive(Debug, Clone, Default)]
pub struct RawEnum {
    pub name: String,
    pub bitmask: bool,
    pub entries: Vec<RawEnumEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct RawProfile {
    pub messages: Vec<RawMessage>,
    pub enums: Vec<RawEnum>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    Mavlink,
    Enums,
    Enum,
    Entry,
    Messages,
    Message,
    Field,
    Extensions,
    Other,
}

fn identify(name: &[u8]) -> Element {
    match name {
        b"mavlink" => Element::Mavlink,
        b"enums" => Element::Enums,
        b"enum" => Element::Enum,
        b"entry" => Element::Entry,
        b"messages" => Element::Messages,
        b"message" => Element::Message,
        b"field" => Element::Field,
        b"extensions" => Element::Extensions,
        _ => Element::Other,
    }
}

fn attr_value(
    e: &quick_xml::events::BytesStart<'_>,
    key: &[u8],
) -> Option<String> {
    e.attributes().flatten().find_map(|a| {
        if a.key.into_inner() == key {
            Some(String::from_utf8_lossy(&a.value).into_owned())
        } else {
            None
        }
    })
}

fn parse_int_attr(raw: &str, attr_name: &'static str) -> Result<u32, DialectError> {
    let (digits, radix) = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .map(|d| (d, 16))
        .unwrap_or((raw, 10));
    u32::from_str_radix(digits, radix)
        .map_err(|_| DialectError::InvalidAttribute(attr_name, raw.to_string()))
}

/// Parses one dialect XML document into a [`RawProfile`].
pub fn parse_document(xml: &str) -> Result<RawProfile, DialectError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut profile = RawProfile::default();
    let mut stack: Vec<Element> = Vec::new();
    let mut in_extensions = false;

    let mut cur_message = RawMessage::default();
    let mut cur_field = RawField::default();
    let mut cur_enum = RawEnum::default();
    let mut cur_entry = RawEnumEntry::default();

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) => {
                let id = identify(e.name().into_inner());
                match id {
                    Element::Message => {
                        cur_message = RawMessage::default();
                        let name = attr_value(&e, b"name")
                            .ok_or(DialectError::MissingAttribute("name"))?;
                        let id_raw = attr_value(&e, b"id")
                            .ok_or(DialectError::MissingAttribute("id"))?;
                        cur_message.name = name;
                        cur_message.id = parse_int_attr(&id_raw, "id")?;
                        in_extensions = false;
                    }
                    Element::Field => {
                        cur_field = RawField {
                            is_extension: in_extensions,
                            ..Default::default()
                        };
                        if let Some(name) = attr_value(&e, b"name") {
                            cur_field.name = name;
                        }
                        if let Some(ty) = attr_value(&e, b"type") {
                            cur_field.type_attr = ty;
                        }
                        cur_field.enum_group = attr_value(&e, b"enum");
                    }
                    Element::Enum => {
                        cur_enum = RawEnum::default();
                        if let Some(name) = attr_value(&e, b"name") {
                            cur_enum.name = name;
                        }
                        cur_enum.bitmask = attr_value(&e, b"bitmask").is_some();
                    }
                    Element::Entry => {
                        cur_entry = RawEnumEntry::default();
                        if let Some(name) = attr_value(&e, b"name") {
                            cur_entry.name = name;
                        }
                        if let Some(value) = attr_value(&e, b"value") {
                            cur_entry.value = parse_int_attr(&value, "value")?;
                        }
                    }
                    Element::Extensions => in_extensions = true,
                    _ => {}
                }
                stack.push(id);
            }
            Event::Empty(e) => {
                let id = identify(e.name().into_inner());
                match id {
                    Element::Extensions => in_extensions = true,
                    Element::Field => {
                        let mut field = RawField {
                            is_extension: in_extensions,
                            ..Default::default()
                        };
                        if let Some(name) = attr_value(&e, b"name") {
                            field.name = name;
                        }
                        if let Some(ty) = attr_value(&e, b"type") {
                            field.type_attr = ty;
                        }
                        field.enum_group = attr_value(&e, b"enum");
                        cur_message.fields.push(field);
                    }
                    Element::Entry => {
                        let mut entry = RawEnumEntry::default();
                        if let Some(name) = attr_value(&e, b"name") {
                            entry.name = name;
                        }
                        if let Some(value) = attr_value(&e, b"value") {
                            entry.value = parse_int_attr(&value, "value")?;
                        }
                        cur_enum.entries.push(entry);
                    }
                    _ => {}
                }
            }
            Event::End(e) => {
                let id = identify(e.name().into_inner());
                stack.pop();
                match id {
                    Element::Message => {
                        profile.messages.push(std::mem::take(&mut cur_message));
                    }
                    Element::Field => {
                        cur_message.fields.push(std::mem::take(&mut cur_field));
                    }
                    Element::Enum => {
                        profile.enums.push(std::mem::take(&mut cur_enum));
                    }
                    Element::Entry => {
                        cur_enum.entries.push(std::mem::take(&mut cur_entry));
                    }
                    _ => {}
                }
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(profile)
}

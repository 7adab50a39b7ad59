//
// Copyright 2024 DLIS Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! The Component grammar: `Set, Template, Object+` inside an EFLR body.
//!
//! Every Component begins with a one-byte descriptor (see
//! `crate::document::Descriptor`) whose top three bits select a `Role` and
//! whose remaining bits gate which sub-fields follow. A Set introduces a
//! Template (the schema for every Object that follows, until the next Set
//! descriptor or end of body) and then zero or more Objects, each of which
//! may override any Template entry's count/representation-code/units/value,
//! or omit the Attribute entirely (role `AbsentAttribute`).

use crate::cursor::Cursor;
use crate::document::{Descriptor, Role};
use crate::error::{FormatError, Result};
use crate::object::{parse_value, rc, ObName, RepresentationCode, Value};

/// The default representation code for an Attribute whose Template entry
/// does not declare one explicitly: `IDENT` (19).
const DEFAULT_REP_CODE: u8 = 19;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum AttributeValue {
    Single(Value),
    List(Vec<Value>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum SlotKind {
    Attribute,
    Invariant,
    Absent,
}

/// A single Attribute slot, either a Template entry (the schema) or an
/// Object's own Attribute (inheriting unset fields from the Template entry
/// at the same position).
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AttributeSlot {
    pub kind: SlotKind,
    pub label: String,
    pub count: u32,
    pub rep_code: u8,
    pub units: String,
    pub value: Option<AttributeValue>,
}

impl AttributeSlot {
    fn default_for_label(label: String) -> Self {
        AttributeSlot {
            kind: SlotKind::Attribute,
            label,
            count: 1,
            rep_code: DEFAULT_REP_CODE,
            units: String::new(),
            value: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum SetRole {
    Set,
    Redundant,
    Replacement,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Set {
    pub role: SetRole,
    pub set_type: String,
    pub name: Option<String>,
    pub template: Vec<AttributeSlot>,
    pub objects: Vec<Object>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Object {
    pub name: ObName,
    pub attributes: Vec<AttributeSlot>,
}

impl Object {
    pub fn attr(&self, label: &str) -> Option<&AttributeSlot> {
        self.attributes.iter().find(|a| a.label == label)
    }

    pub fn attr_value(&self, label: &str) -> Option<&AttributeValue> {
        self.attr(label).and_then(|a| a.value.as_ref())
    }

    /// Convenience accessor for single-valued numeric attributes such as
    /// `REPRESENTATION-CODE`.
    pub fn attr_u64(&self, label: &str) -> Option<u64> {
        match self.attr_value(label)? {
            AttributeValue::Single(v) => v.as_u64(),
            AttributeValue::List(_) => None,
        }
    }

    pub fn attr_str(&self, label: &str) -> Option<&str> {
        match self.attr_value(label)? {
            AttributeValue::Single(v) => v.as_str(),
            AttributeValue::List(_) => None,
        }
    }
}

fn read_descriptor(cursor: &mut Cursor) -> Result<Descriptor> {
    Ok(Descriptor(cursor.read_u8()?))
}

fn peek_descriptor(cursor: &Cursor) -> Result<Descriptor> {
    Ok(Descriptor(cursor.peek_u8()?))
}

fn read_ident(cursor: &mut Cursor) -> Result<String> {
    cursor.apply(rc::ident_text)
}

fn read_value(cursor: &mut Cursor, code: u8) -> Result<Value> {
    let offset = cursor.offset();
    let rep = RepresentationCode::from_u8(code).ok_or_else(|| FormatError::unsupported_code(offset, code))?;
    cursor.apply(parse_value(rep))
}

/// Parses one Set, its Template, and every Object that follows it, up to
/// (but not including) the next Set-family descriptor or the end of the
/// Logical Record body.
pub fn parse_set(cursor: &mut Cursor) -> Result<Set> {
    let desc = read_descriptor(cursor)?;
    let role = match desc.role() {
        Some(Role::Set) => SetRole::Set,
        Some(Role::RedundantSet) => SetRole::Redundant,
        Some(Role::ReplacementSet) => SetRole::Replacement,
        _ => {
            return Err(FormatError::bad_descriptor(
                cursor.offset(),
                "expected a Set, Redundant-Set or Replacement-Set descriptor",
            ))
        }
    };
    if !desc.has_set_type() {
        return Err(FormatError::bad_descriptor(
            cursor.offset(),
            "Set descriptor is missing its mandatory type flag",
        ));
    }
    let set_type = read_ident(cursor)?;
    let name = if desc.has_set_name() {
        Some(read_ident(cursor)?)
    } else {
        None
    };

    let template = parse_template(cursor)?;
    let objects = parse_objects(cursor, &template)?;

    Ok(Set {
        role,
        set_type,
        name,
        template,
        objects,
    })
}

/// Parses the Template: a run of Attribute/Invariant-Attribute Components
/// terminated by the first Object descriptor.
fn parse_template(cursor: &mut Cursor) -> Result<Vec<AttributeSlot>> {
    let mut template = Vec::new();
    while !cursor.is_empty() {
        let desc = peek_descriptor(cursor)?;
        match desc.role() {
            Some(Role::Object) => break,
            Some(Role::Set) | Some(Role::RedundantSet) | Some(Role::ReplacementSet) => break,
            _ => {
                let slot = parse_attribute_slot(cursor, None)?;
                template.push(slot);
            }
        }
    }
    Ok(template)
}

/// Parses every Object until the next Set-family descriptor or end of body.
fn parse_objects(cursor: &mut Cursor, template: &[AttributeSlot]) -> Result<Vec<Object>> {
    let mut objects = Vec::new();
    while !cursor.is_empty() {
        let desc = peek_descriptor(cursor)?;
        match desc.role() {
            Some(Role::Set) | Some(Role::RedundantSet) | Some(Role::ReplacementSet) => break,
            Some(Role::Object) => objects.push(parse_object(cursor, template)?),
            _ => {
                return Err(FormatError::bad_descriptor(
                    cursor.offset(),
                    "expected an Object descriptor",
                ))
            }
        }
    }
    Ok(objects)
}

fn parse_object(cursor: &mut Cursor, template: &[AttributeSlot]) -> Result<Object> {
    let desc = read_descriptor(cursor)?;
    if desc.role() != Some(Role::Object) {
        return Err(FormatError::bad_descriptor(cursor.offset(), "expected an Object descriptor"));
    }
    if !desc.has_object_name() {
        return Err(FormatError::bad_descriptor(
            cursor.offset(),
            "Object descriptor without a name is not supported",
        ));
    }
    let name = cursor.apply(rc::obname)?;

    // Trailing Template positions may be omitted entirely: once the next
    // descriptor belongs to an Object or Set (or the body runs out), every
    // remaining Template position defaults as if it carried an
    // Absent-Attribute Component.
    let mut attributes = Vec::with_capacity(template.len());
    let mut filled = 0;
    while filled < template.len() {
        if cursor.is_empty() || is_boundary_descriptor(cursor)? {
            break;
        }
        attributes.push(parse_attribute_slot(cursor, Some(&template[filled]))?);
        filled += 1;
    }
    for entry in &template[filled..] {
        attributes.push(AttributeSlot {
            kind: SlotKind::Absent,
            label: entry.label.clone(),
            count: entry.count,
            rep_code: entry.rep_code,
            units: entry.units.clone(),
            value: None,
        });
    }

    // Attribute Components beyond the Template's length are accepted and
    // attached to the Object in order, with no Template entry to default from.
    while !cursor.is_empty() && !is_boundary_descriptor(cursor)? {
        attributes.push(parse_attribute_slot(cursor, None)?);
    }

    Ok(Object { name, attributes })
}

/// Whether the next unread descriptor starts a new Object or Set — i.e. the
/// current Object's Attribute list has ended, whether or not the Template
/// has been fully consumed.
fn is_boundary_descriptor(cursor: &Cursor) -> Result<bool> {
    let desc = peek_descriptor(cursor)?;
    Ok(matches!(
        desc.role(),
        Some(Role::Object) | Some(Role::Set) | Some(Role::RedundantSet) | Some(Role::ReplacementSet)
    ))
}

/// Parses one Attribute-family Component.
///
/// This single function replaces what the original decoder implemented as
/// three near-duplicate routines (one for a Template entry, one for an
/// Object's Attribute when a Template entry exists, one for when it does
/// not): `template_entry` is `None` only while parsing the Template itself,
/// and `Some` while parsing an Object, in which case any field the
/// Component omits is inherited from the Template entry rather than
/// defaulted from scratch.
fn parse_attribute_slot(cursor: &mut Cursor, template_entry: Option<&AttributeSlot>) -> Result<AttributeSlot> {
    let desc = read_descriptor(cursor)?;
    let role = desc.role().ok_or_else(|| {
        FormatError::bad_descriptor(cursor.offset(), "unrecognized Component descriptor role")
    })?;

    if role == Role::AbsentAttribute {
        let label = template_entry.map(|e| e.label.clone()).unwrap_or_default();
        return Ok(AttributeSlot {
            kind: SlotKind::Absent,
            label,
            count: template_entry.map(|e| e.count).unwrap_or(1),
            rep_code: template_entry.map(|e| e.rep_code).unwrap_or(DEFAULT_REP_CODE),
            units: template_entry.map(|e| e.units.clone()).unwrap_or_default(),
            value: None,
        });
    }
    if role != Role::Attribute && role != Role::InvariantAttribute {
        return Err(FormatError::bad_descriptor(
            cursor.offset(),
            "expected an Attribute, Invariant-Attribute or Absent-Attribute descriptor",
        ));
    }

    let label = if desc.has_label() {
        read_ident(cursor)?
    } else {
        template_entry
            .map(|e| e.label.clone())
            .ok_or_else(|| FormatError::bad_descriptor(cursor.offset(), "Template entry is missing its label"))?
    };

    let mut slot = template_entry
        .cloned()
        .unwrap_or_else(|| AttributeSlot::default_for_label(label.clone()));
    slot.label = label;
    slot.kind = if role == Role::InvariantAttribute {
        SlotKind::Invariant
    } else {
        SlotKind::Attribute
    };

    if desc.has_count() {
        slot.count = cursor.apply(rc::uvari)?;
    }
    if desc.has_rep_code() {
        slot.rep_code = cursor.read_u8()?;
    }
    if desc.has_units() {
        slot.units = read_ident(cursor)?;
    }
    if desc.has_value() {
        slot.value = Some(read_slot_value(cursor, slot.count, slot.rep_code)?);
    } else {
        slot.value = None;
    }

    Ok(slot)
}

fn read_slot_value(cursor: &mut Cursor, count: u32, rep_code: u8) -> Result<AttributeValue> {
    if count == 1 {
        Ok(AttributeValue::Single(read_value(cursor, rep_code)?))
    } else {
        let mut values = Vec::with_capacity(count as usize);
        for _ in 0..count {
            values.push(read_value(cursor, rep_code)?);
        }
        Ok(AttributeValue::List(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin_name(id: &str) -> ObName {
        ObName { origin: 2, copy: 0, identifier: id.to_string() }
    }

    /// Builds `SET:CHANNEL(type+name) -> Template[LABEL ushort] -> Object(O1) value=7, Object(O2) absent`.
    #[test]
    fn object_inherits_template_rep_code_and_can_omit_the_attribute() {
        let mut bytes = Vec::new();
        // Set descriptor: role=Set(111), type+name present -> 1111_1000
        bytes.push(0b1111_1000);
        bytes.extend(b"\x07CHANNEL"); // IDENT "CHANNEL"
        bytes.extend(b"\x02S1"); // IDENT name "S1"

        // Template entry: Attribute(001) with label+repcode+value bits set: 0b0011_0101
        bytes.push(0b0011_0101);
        bytes.extend(b"\x05LABEL"); // label "LABEL"
        bytes.push(15); // USHORT rep code
        bytes.push(9); // value = 9

        // Object 1: name present (011 + bit0): 0b0111_0000
        bytes.push(0b0111_0000);
        bytes.extend(&[0, 0, 1]); // OBNAME origin=0 (uvari 7-bit), copy=0, ident len1 "1"
        bytes.push(b'1');
        // Attribute override: role Attribute(001), only value bit set: 0b0010_0001
        bytes.push(0b0010_0001);
        bytes.push(7); // overridden value

        // Object 2: name present
        bytes.push(0b0111_0000);
        bytes.extend(&[0, 0, 1]);
        bytes.push(b'2');
        // Attribute absent: role 000, no bits
        bytes.push(0b0000_0000);

        let mut cursor = Cursor::new(&bytes, 0);
        let set = parse_set(&mut cursor).expect("parse_set should succeed");
        assert_eq!(set.set_type, "CHANNEL");
        assert_eq!(set.name.as_deref(), Some("S1"));
        assert_eq!(set.template.len(), 1);
        assert_eq!(set.template[0].rep_code, 15);

        assert_eq!(set.objects.len(), 2);
        let obj1 = &set.objects[0];
        assert_eq!(obj1.name, origin_name("1"));
        match obj1.attr_value("LABEL") {
            Some(AttributeValue::Single(Value::UShort(7))) => {}
            other => panic!("unexpected value: {:?}", other),
        }

        let obj2 = &set.objects[1];
        assert_eq!(obj2.attributes[0].kind, SlotKind::Absent);
        assert!(obj2.attr_value("LABEL").is_none());
    }

    /// An Object that supplies no Component at all for a trailing Template
    /// position (i.e. its Attribute run ends before the next Object/Set
    /// boundary) must default that position exactly as an explicit
    /// Absent-Attribute would.
    #[test]
    fn object_may_omit_trailing_template_positions_entirely() {
        let mut bytes = Vec::new();
        bytes.push(0b1111_0000); // Set: type only
        bytes.extend(b"\x07CHANNEL");

        // Template: two entries, A and B, both USHORT.
        bytes.push(0b0011_0101); // label + repcode + value
        bytes.extend(b"\x01A");
        bytes.push(15);
        bytes.push(1);
        bytes.push(0b0011_0101);
        bytes.extend(b"\x01B");
        bytes.push(15);
        bytes.push(2);

        // Object: name, then an override for A only — no Component at all
        // follows for B before the Logical Record body ends.
        bytes.push(0b0111_0000);
        bytes.extend(&[0, 0, 1]);
        bytes.push(b'1');
        bytes.push(0b0010_0001); // A override: value only
        bytes.push(42);

        let mut cursor = Cursor::new(&bytes, 0);
        let set = parse_set(&mut cursor).expect("parse_set should succeed");
        let obj = &set.objects[0];

        assert_eq!(obj.attributes.len(), 2);
        match obj.attr_value("A") {
            Some(AttributeValue::Single(Value::UShort(42))) => {}
            other => panic!("unexpected A value: {:?}", other),
        }
        assert_eq!(obj.attributes[1].kind, SlotKind::Absent);
        assert_eq!(obj.attributes[1].label, "B");
        assert!(obj.attr_value("B").is_none());
    }

    /// An Object may carry Attribute Components beyond the Template's
    /// length; they are attached to the Object in order, unaligned to any
    /// Template position.
    #[test]
    fn object_may_carry_attributes_beyond_the_template() {
        let mut bytes = Vec::new();
        bytes.push(0b1111_0000); // Set: type only
        bytes.extend(b"\x07CHANNEL");

        bytes.push(0b0011_0101); // Template: one entry, A, USHORT
        bytes.extend(b"\x01A");
        bytes.push(15);
        bytes.push(1);

        bytes.push(0b0111_0000); // Object
        bytes.extend(&[0, 0, 1]);
        bytes.push(b'1');
        bytes.push(0b0010_0001); // A override: value only
        bytes.push(42);
        bytes.push(0b0011_0101); // extra Attribute "EXTRA", not in the Template
        bytes.extend(b"\x05EXTRA");
        bytes.push(15);
        bytes.push(99);

        let mut cursor = Cursor::new(&bytes, 0);
        let set = parse_set(&mut cursor).expect("parse_set should succeed");
        let obj = &set.objects[0];

        assert_eq!(obj.attributes.len(), 2);
        match obj.attr_value("A") {
            Some(AttributeValue::Single(Value::UShort(42))) => {}
            other => panic!("unexpected A value: {:?}", other),
        }
        match obj.attr_value("EXTRA") {
            Some(AttributeValue::Single(Value::UShort(99))) => {}
            other => panic!("unexpected EXTRA value: {:?}", other),
        }
    }
}

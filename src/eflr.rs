//
// Copyright 2024 DLIS Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Classifies decoded EFLR Sets by `set.type` into a single tagged
//! `ClassifiedEflr`, instead of a class hierarchy with one type per
//! `set.type`. The per-type schema (which labels a Set of that type is
//! expected to carry) is data (`schema::known_labels`), not a distinct Rust
//! type — new EFLR types the format adds do not require new variants here,
//! only a new schema table entry.

use crate::component::{parse_set, Object, Set, SetRole};
use crate::cursor::Cursor;
use crate::error::Result;

/// The well-known `set.type` strings this crate recognizes, grouped by the
/// EFLR kind they belong to per the logical-record-type table. Anything else
/// (including vendor-private types) decodes into `ClassifiedEflr::Private`.
pub mod set_type {
    pub const FILE_HEADER: &str = "FILE-HEADER";
    pub const ORIGIN: &str = "ORIGIN";
    pub const WELL_REFERENCE_POINT: &str = "WELL-REFERENCE-POINT";
    pub const AXIS: &str = "AXIS";
    pub const CHANNEL: &str = "CHANNEL";
    pub const FRAME: &str = "FRAME";
    pub const PATH: &str = "PATH";
    pub const CALIBRATION: &str = "CALIBRATION";
    pub const CALIBRATION_COEFFICIENT: &str = "CALIBRATION-COEFFICIENT";
    pub const CALIBRATION_MEASUREMENT: &str = "CALIBRATION-MEASUREMENT";
    pub const COMPUTATION: &str = "COMPUTATION";
    pub const EQUIPMENT: &str = "EQUIPMENT";
    pub const GROUP: &str = "GROUP";
    pub const PARAMETER: &str = "PARAMETER";
    pub const PROCESS: &str = "PROCESS";
    pub const SPLICE: &str = "SPLICE";
    pub const TOOL: &str = "TOOL";
    pub const ZONE: &str = "ZONE";
    pub const COMMENT: &str = "COMMENT";
    pub const UPDATE: &str = "UPDATE";
    pub const UNFORMATTED_DATA_IDENTIFIER: &str = "NO-FORMAT";
    pub const LONG_NAME: &str = "LONG-NAME";
}

/// Per-`set.type` schema: the Attribute labels a Set of that type is
/// expected to carry. Declared as data, not as a distinct Rust type per
/// EFLR kind, so a new type the format adds needs only a new table row.
pub fn known_labels(set_type: &str) -> &'static [&'static str] {
    match set_type {
        set_type::FILE_HEADER => &["SEQUENCE-NUMBER", "ID"],
        set_type::ORIGIN => &[
            "FILE-ID", "FILE-SET-NAME", "FILE-SET-NUMBER", "FILE-NUMBER", "FILE-TYPE",
            "PRODUCT", "VERSION", "PROGRAMS", "CREATION-TIME", "ORDER-NUMBER", "DESCENT-NUMBER",
            "RUN-NUMBER", "WELL-ID", "WELL-NAME", "FIELD-NAME", "PRODUCER-CODE", "PRODUCER-NAME",
            "COMPANY", "NAME-SPACE-NAME", "NAME-SPACE-VERSION",
        ],
        set_type::CHANNEL => &[
            "LONG-NAME", "PROPERTIES", "REPRESENTATION-CODE", "UNITS", "DIMENSION", "AXIS",
            "ELEMENT-LIMIT", "SOURCE",
        ],
        set_type::FRAME | set_type::PATH => {
            &["DESCRIPTION", "CHANNELS", "INDEX-TYPE", "DIRECTION", "SPACING", "ENCRYPTED", "INDEX-MIN", "INDEX-MAX"]
        }
        set_type::UNFORMATTED_DATA_IDENTIFIER => &["CONSUMER-NAME", "DESCRIPTION"],
        set_type::AXIS => &["AXIS-ID", "COORDINATES", "SPACING"],
        set_type::LONG_NAME => &[
            "GENERAL-MODIFIER", "QUANTITY", "QUANTITY-MODIFIER", "ALTERED-FORM", "ENTITY",
            "ENTITY-MODIFIER", "ENTITY-NUMBER", "ENTITY-PART", "ENTITY-PART-NUMBER", "GENERIC-SOURCE",
            "SOURCE-PART", "SOURCE-PART-NUMBER", "CONDITIONS", "STANDARD-SYMBOL", "PRIVATE-SYMBOL",
        ],
        _ => &[],
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GenericEflr {
    pub lr_type: u8,
    pub role: SetRole,
    pub set_type: String,
    pub set_name: Option<String>,
    pub objects: Vec<Object>,
}

/// An EFLR, classified by its `set.type`. Each known type still carries the
/// same `GenericEflr` shape; the tag exists so callers can `match` on
/// well-known kinds (e.g. `Channel`/`Frame`, needed to decode IFLRs) without
/// string-comparing `set_type` themselves. Unknown or vendor-private Sets,
/// and encrypted records regardless of type, are preserved without inspection.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum ClassifiedEflr {
    FileHeader(GenericEflr),
    Origin(GenericEflr),
    Axis(GenericEflr),
    Channel(GenericEflr),
    Frame(GenericEflr),
    Static(GenericEflr),
    Script(GenericEflr),
    Update(GenericEflr),
    UnformattedDataIdentifier(GenericEflr),
    LongName(GenericEflr),
    Specification(GenericEflr),
    Dictionary(GenericEflr),
    Private(GenericEflr),
    /// A Logical Record marked encrypted. Its body is never decoded; only
    /// the record type and its encryption packet's producer code survive.
    /// The producer code is `None` when the record was marked encrypted but
    /// carried no encryption packet.
    Encrypted { lr_type: u8, producer_code: Option<u16> },
}

impl ClassifiedEflr {
    pub fn generic(&self) -> Option<&GenericEflr> {
        match self {
            ClassifiedEflr::FileHeader(g)
            | ClassifiedEflr::Origin(g)
            | ClassifiedEflr::Axis(g)
            | ClassifiedEflr::Channel(g)
            | ClassifiedEflr::Frame(g)
            | ClassifiedEflr::Static(g)
            | ClassifiedEflr::Script(g)
            | ClassifiedEflr::Update(g)
            | ClassifiedEflr::UnformattedDataIdentifier(g)
            | ClassifiedEflr::LongName(g)
            | ClassifiedEflr::Specification(g)
            | ClassifiedEflr::Dictionary(g)
            | ClassifiedEflr::Private(g) => Some(g),
            ClassifiedEflr::Encrypted { .. } => None,
        }
    }
}

/// Classifies by logical-record-type code `t` (the type table is keyed by
/// `t`, with `set.type` only narrowing which object schema applies within
/// a kind — e.g. both `ORIGIN` and `WELL-REFERENCE-POINT` are `t=1` Origin
/// EFLRs). `t > 11` and any `t` this table does not name are Private.
fn classify(lr_type: u8, set: Set) -> ClassifiedEflr {
    let generic = GenericEflr {
        lr_type,
        role: set.role,
        set_type: set.set_type,
        set_name: set.name,
        objects: set.objects,
    };
    match lr_type {
        0 => ClassifiedEflr::FileHeader(generic),
        1 => ClassifiedEflr::Origin(generic),
        2 => ClassifiedEflr::Axis(generic),
        3 => ClassifiedEflr::Channel(generic),
        4 => ClassifiedEflr::Frame(generic),
        5 => ClassifiedEflr::Static(generic),
        6 => ClassifiedEflr::Script(generic),
        7 => ClassifiedEflr::Update(generic),
        8 => ClassifiedEflr::UnformattedDataIdentifier(generic),
        9 => ClassifiedEflr::LongName(generic),
        10 => ClassifiedEflr::Specification(generic),
        12 => ClassifiedEflr::Dictionary(generic),
        _ => ClassifiedEflr::Private(generic),
    }
}

/// Parses and classifies a single non-encrypted EFLR body.
pub fn parse_eflr(lr_type: u8, body: &[u8], base_offset: usize) -> Result<ClassifiedEflr> {
    let mut cursor = Cursor::new(body, base_offset);
    let set = parse_set(&mut cursor)?;
    Ok(classify(lr_type, set))
}

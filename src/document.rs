//
// Copyright 2024 DLIS Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # The DLIS (RP66 V1) physical document format.
//!
//! Constants and structures defined in this module represent the physical
//! framing of a DLIS byte stream, which is organized into four nested
//! layers:
//!
//! 1. Storage Unit Label (one fixed 80-byte record at the start of the file).
//! 2. Visible Records (length-prefixed framing, `0xFF` marker + version byte).
//! 3. Logical Record Segments (one or more per Logical Record, carrying an
//!    attribute bitmap and an optional trailer).
//! 4. Logical Records, reassembled from one or more segments.
//!
//! # References
//!
//! 1. API RP66 V1, Storage Unit Label and Visible Record Format.

/// The fixed length, in bytes, of a Storage Unit Label.
pub const SUL_LENGTH: usize = 80;

/// Length of the Storage Unit Label's "storage unit structure" field.
pub const SUL_STRUCTURE_LENGTH: usize = 6;

/// The only recognized value of the Storage Unit Label structure field.
pub const SUL_STRUCTURE_RECORD: &str = "RECORD";

/// A parsed Storage Unit Label.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Sul {
    /// The 4-digit sequence number of this Storage Unit.
    pub sequence_number: u32,
    /// The DLIS version string, e.g. `V1.00`.
    pub dlis_version: String,
    /// The storage unit structure; always `RECORD` for this crate.
    pub storage_unit_structure: String,
    /// Maximum Visible Record length declared by the producer.
    pub maximum_record_length: u32,
    /// Storage set identifier, free-form text padded with spaces.
    pub storage_set_identifier: String,
}

/// Marker byte that precedes every Visible Record's version byte.
pub const VR_MARKER: u8 = 0xFF;

/// The only Visible Record format version this crate accepts.
pub const VR_FORMAT_VERSION: u8 = 1;

/// Header of a single Visible Record: a big-endian length followed by the
/// marker/version pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VrHeader {
    /// Length of the Visible Record, including this 4-byte header.
    pub length: u16,
}

/// Bitmap of the eight attribute flags carried by every Logical Record
/// Segment header, in descriptor-bit order (most significant first).
///
/// Mirrors the role/presence bitmask design used for Component descriptors
/// below: a flat set of booleans decoded once from a single byte, rather
/// than a family of per-flag newtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct LrsAttributes {
    pub is_eflr: bool,
    pub has_predecessor: bool,
    pub has_successor: bool,
    pub is_encrypted: bool,
    pub has_encryption_packet: bool,
    pub has_checksum: bool,
    pub has_trailing_length: bool,
    pub has_padding: bool,
}

impl LrsAttributes {
    /// Bit 0 (MSB): Logical Record type is EFLR if set, IFLR if clear.
    const EFLR: u8 = 0b1000_0000;
    /// Bit 1: this segment is not the first segment of its Logical Record.
    const PREDECESSOR: u8 = 0b0100_0000;
    /// Bit 2: this segment is not the last segment of its Logical Record.
    const SUCCESSOR: u8 = 0b0010_0000;
    /// Bit 3: the Logical Record body is encrypted.
    const ENCRYPTED: u8 = 0b0001_0000;
    /// Bit 4: an encryption packet immediately follows the segment header.
    const ENCRYPTION_PACKET: u8 = 0b0000_1000;
    /// Bit 5: a 2-byte checksum trails the segment body.
    const CHECKSUM: u8 = 0b0000_0100;
    /// Bit 6: a trailing length field (mirroring the header length) trails the segment.
    const TRAILING_LENGTH: u8 = 0b0000_0010;
    /// Bit 7 (LSB): one or more padding bytes trail the segment.
    const PADDING: u8 = 0b0000_0001;

    pub fn from_byte(byte: u8) -> Self {
        LrsAttributes {
            is_eflr: byte & Self::EFLR != 0,
            has_predecessor: byte & Self::PREDECESSOR != 0,
            has_successor: byte & Self::SUCCESSOR != 0,
            is_encrypted: byte & Self::ENCRYPTED != 0,
            has_encryption_packet: byte & Self::ENCRYPTION_PACKET != 0,
            has_checksum: byte & Self::CHECKSUM != 0,
            has_trailing_length: byte & Self::TRAILING_LENGTH != 0,
            has_padding: byte & Self::PADDING != 0,
        }
    }
}

/// Header of a single Logical Record Segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LrsHeader {
    /// Length of this segment, including the 4-byte header.
    pub length: u16,
    pub attrs: LrsAttributes,
    /// Logical Record type; interpretation depends on `attrs.is_eflr`.
    pub lr_type: u8,
}

/// The three Component roles that introduce a new Set, and the two that
/// describe members within one, as encoded in the top 3 bits of a
/// Component descriptor byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Role {
    AbsentAttribute,
    Attribute,
    InvariantAttribute,
    Object,
    RedundantSet,
    ReplacementSet,
    Set,
}

/// A single Component descriptor byte.
///
/// The top 3 bits select the `Role`; the remaining 5 bits gate the presence
/// of sub-fields whose meaning depends on the role (label/count/representation-code/units/value
/// for Attribute-family roles, type/name for Set-family and Object roles).
/// This is intentionally a thin bitmask wrapper with accessor predicates
/// rather than a parsed struct per role, matching the Component grammar's
/// "one descriptor byte drives everything" design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor(pub u8);

impl Descriptor {
    const ROLE_MASK: u8 = 0b1110_0000;

    const BIT_0: u8 = 0b0001_0000;
    const BIT_1: u8 = 0b0000_1000;
    const BIT_2: u8 = 0b0000_0100;
    const BIT_3: u8 = 0b0000_0010;
    const BIT_4: u8 = 0b0000_0001;

    pub fn role(self) -> Option<Role> {
        match (self.0 & Self::ROLE_MASK) >> 5 {
            0b000 => Some(Role::AbsentAttribute),
            0b001 => Some(Role::Attribute),
            0b010 => Some(Role::InvariantAttribute),
            0b011 => Some(Role::Object),
            0b101 => Some(Role::RedundantSet),
            0b110 => Some(Role::ReplacementSet),
            0b111 => Some(Role::Set),
            _ => None,
        }
    }

    /// For Set-family roles: whether a `set.type` string follows.
    pub fn has_set_type(self) -> bool {
        self.0 & Self::BIT_0 != 0
    }

    /// For Set-family roles: whether a `set.name` string follows.
    pub fn has_set_name(self) -> bool {
        self.0 & Self::BIT_1 != 0
    }

    /// For the Object role: whether an Object Name follows (if clear, the
    /// previous Object's name is reused — this never occurs in practice but
    /// is preserved as a distinct case rather than silently defaulted).
    pub fn has_object_name(self) -> bool {
        self.0 & Self::BIT_0 != 0
    }

    /// For Attribute-family roles: whether a label string follows.
    pub fn has_label(self) -> bool {
        self.0 & Self::BIT_0 != 0
    }

    /// For Attribute-family roles: whether a UVARI count follows.
    pub fn has_count(self) -> bool {
        self.0 & Self::BIT_1 != 0
    }

    /// For Attribute-family roles: whether a representation-code byte follows.
    pub fn has_rep_code(self) -> bool {
        self.0 & Self::BIT_2 != 0
    }

    /// For Attribute-family roles: whether a units string follows.
    pub fn has_units(self) -> bool {
        self.0 & Self::BIT_3 != 0
    }

    /// For Attribute-family roles: whether a value follows.
    pub fn has_value(self) -> bool {
        self.0 & Self::BIT_4 != 0
    }
}

//
// Copyright 2024 DLIS Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Physical framing: Storage Unit Label, Visible Records and Logical Record
//! Segments. Each function takes the whole file buffer and an offset, and
//! returns the parsed structure alongside the offset of the next unread byte.

use nom::bytes::complete::tag;
use nom::number::complete::{be_u16, be_u8};
use nom::sequence::tuple;

use crate::document::{LrsAttributes, LrsHeader, Sul, VrHeader, SUL_LENGTH, SUL_STRUCTURE_RECORD, VR_FORMAT_VERSION, VR_MARKER};
use crate::error::{FormatError, Result};

fn short(offset: usize, what: &str) -> FormatError {
    FormatError::short_read(offset, format!("ran out of bytes while reading {}", what))
}

/// Parses the 80-byte Storage Unit Label at the start of the file.
///
/// The SUL is fixed-width ASCII text, not a binary struct, so its fields are
/// read positionally rather than through a `nom` combinator chain.
pub fn parse_sul(input: &[u8]) -> Result<Sul> {
    if input.len() < SUL_LENGTH {
        return Err(short(0, "the Storage Unit Label"));
    }
    let sul_bytes = &input[..SUL_LENGTH];

    let sequence_number_field = std::str::from_utf8(&sul_bytes[0..4])
        .ok()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .ok_or_else(|| FormatError::bad_magic(0, "Storage Unit Label sequence number is not numeric"))?;

    let dlis_version = String::from_utf8_lossy(&sul_bytes[4..9]).trim().to_string();
    let version_ok = dlis_version.len() == 5
        && dlis_version.starts_with("V1.")
        && dlis_version.as_bytes()[3].is_ascii_digit()
        && dlis_version.as_bytes()[4].is_ascii_digit();
    if !version_ok {
        return Err(FormatError::bad_version(
            4,
            format!("unsupported DLIS version string {:?}", dlis_version),
        ));
    }

    let storage_unit_structure = String::from_utf8_lossy(&sul_bytes[9..15]).trim().to_string();
    if storage_unit_structure != SUL_STRUCTURE_RECORD {
        return Err(FormatError::bad_magic(
            9,
            format!("Storage Unit Label structure field is not {:?}", SUL_STRUCTURE_RECORD),
        ));
    }

    let maximum_record_length = std::str::from_utf8(&sul_bytes[15..20])
        .ok()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .ok_or_else(|| FormatError::bad_magic(15, "Storage Unit Label maximum record length is not numeric"))?;

    let storage_set_identifier = String::from_utf8_lossy(&sul_bytes[20..80]).trim_end().to_string();

    Ok(Sul {
        sequence_number: sequence_number_field,
        dlis_version,
        storage_unit_structure,
        maximum_record_length,
        storage_set_identifier,
    })
}

/// Parses one Visible Record header: a big-endian length, a `0xFF` marker
/// and a format-version byte. Returns the header and the offset of the
/// first byte of the record's payload (the concatenated Logical Record
/// Segments).
pub fn parse_vr_header(input: &[u8], offset: usize) -> Result<(VrHeader, usize)> {
    if input.len() < offset + 4 {
        return Err(short(offset, "a Visible Record header"));
    }
    let slice = &input[offset..];
    let parse = tuple((be_u16, tag(&[VR_MARKER][..]), be_u8));
    let (_, (length, _marker, version)): (_, (u16, &[u8], u8)) =
        parse(slice).map_err(|_| FormatError::bad_magic(offset, "missing 0xFF Visible Record marker"))?;
    if version != VR_FORMAT_VERSION {
        return Err(FormatError::bad_version(
            offset + 3,
            format!("unsupported Visible Record format version {}", version),
        ));
    }
    Ok((VrHeader { length }, offset + 4))
}

/// Parses one Logical Record Segment header (4 bytes: length, attributes, type).
pub fn parse_lrs_header(input: &[u8], offset: usize) -> Result<(LrsHeader, usize)> {
    if input.len() < offset + 4 {
        return Err(short(offset, "a Logical Record Segment header"));
    }
    let slice = &input[offset..];
    let (_, (length, attr_byte, lr_type)): (_, (u16, u8, u8)) = tuple((be_u16, be_u8, be_u8))(slice)
        .map_err(|_| short(offset, "a Logical Record Segment header"))?;
    Ok((
        LrsHeader {
            length,
            attrs: LrsAttributes::from_byte(attr_byte),
            lr_type,
        },
        offset + 4,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sul() -> Vec<u8> {
        let mut v = Vec::with_capacity(SUL_LENGTH);
        v.extend(b"   1");
        v.extend(b"V1.00");
        v.extend(b"RECORD");
        v.extend(b"08192");
        v.extend(b"Default Storage Set                                      ");
        assert_eq!(v.len(), SUL_LENGTH);
        v
    }

    #[test]
    fn parses_a_well_formed_sul() {
        let bytes = sample_sul();
        let sul = parse_sul(&bytes).expect("SUL should parse");
        assert_eq!(sul.sequence_number, 1);
        assert_eq!(sul.dlis_version, "V1.00");
        assert_eq!(sul.storage_unit_structure, "RECORD");
        assert_eq!(sul.maximum_record_length, 8192);
        assert_eq!(sul.storage_set_identifier, "Default Storage Set");
    }

    #[test]
    fn rejects_bad_structure_field() {
        let mut bytes = sample_sul();
        bytes[9..15].copy_from_slice(b"BOGUS ");
        let err = parse_sul(&bytes).unwrap_err();
        assert_eq!(err.kind, crate::error::FormatErrorKind::BadMagic);
    }

    #[test]
    fn parses_visible_record_header() {
        let bytes = [0x00, 0x2C, VR_MARKER, 0x01];
        let (hdr, next) = parse_vr_header(&bytes, 0).unwrap();
        assert_eq!(hdr.length, 0x2C);
        assert_eq!(next, 4);
    }

    #[test]
    fn rejects_missing_visible_record_marker() {
        let bytes = [0x00, 0x2C, 0x00, 0x01];
        assert!(parse_vr_header(&bytes, 0).is_err());
    }

    #[test]
    fn parses_lrs_header_and_decodes_attribute_bits() {
        // EFLR, no predecessor, has successor, no encryption, has padding.
        let attr = 0b1010_0001;
        let bytes = [0x00, 0x10, attr, 5];
        let (hdr, next) = parse_lrs_header(&bytes, 0).unwrap();
        assert_eq!(hdr.length, 0x10);
        assert_eq!(hdr.lr_type, 5);
        assert!(hdr.attrs.is_eflr);
        assert!(!hdr.attrs.has_predecessor);
        assert!(hdr.attrs.has_successor);
        assert!(hdr.attrs.has_padding);
        assert_eq!(next, 4);
    }
}

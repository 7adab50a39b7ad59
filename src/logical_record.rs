//
// Copyright 2024 DLIS Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Reassembles the flat sequence of Logical Record Segments scattered
//! across Visible Records into whole Logical Records, and splits the whole
//! file into Visible Records and Segments in the first place.

use crate::document::{LrsAttributes, Sul, SUL_LENGTH};
use crate::error::{FormatError, Result};
use crate::physical::{parse_lrs_header, parse_sul, parse_vr_header};

/// One Logical Record Segment, trimmed to its body's byte range. The
/// trailer (checksum / trailing length / padding) and any encryption
/// packet have already been subtracted from the `body_start..body_end`
/// range.
#[derive(Debug, Clone, Copy)]
struct Segment {
    attrs: LrsAttributes,
    lr_type: u8,
    body_start: usize,
    body_end: usize,
    /// The producer code carried by this segment's encryption packet, if
    /// `attrs.has_encryption_packet` was set.
    encryption_producer_code: Option<u16>,
}

/// A reassembled Logical Record: either a fully materialized EFLR body, or
/// the segment ranges of an IFLR/encrypted body, decoded lazily.
#[derive(Debug, Clone)]
pub struct LogicalRecord {
    pub is_eflr: bool,
    pub encrypted: bool,
    pub lr_type: u8,
    pub body: RecordBody,
    /// Absolute offset of the first body byte, for error reporting once the
    /// body is later materialized and parsed.
    pub offset: usize,
    /// The producer code of the encryption packet carried by the record's
    /// first segment, when one is present.
    pub encryption_producer_code: Option<u16>,
}

#[derive(Debug, Clone)]
pub enum RecordBody {
    /// Already-concatenated bytes, owned outright. Used for EFLRs, which
    /// the Component grammar needs to walk eagerly to classify.
    Eager(Vec<u8>),
    /// Byte ranges into the file buffer, concatenated only when the caller
    /// actually asks for the body. Used for IFLRs and encrypted records,
    /// per the lazy-body resource policy.
    Lazy(Vec<(usize, usize)>),
}

impl RecordBody {
    pub fn materialize(&self, file: &[u8]) -> Vec<u8> {
        match self {
            RecordBody::Eager(bytes) => bytes.clone(),
            RecordBody::Lazy(ranges) => {
                let mut out = Vec::new();
                for &(start, end) in ranges {
                    out.extend_from_slice(&file[start..end]);
                }
                out
            }
        }
    }
}

/// Computes the length of the trailer (checksum + trailing length + padding)
/// that follows a segment's body, given its attribute bitmap, and validates
/// the trailing-length field against the segment's header length when one
/// is present. `seg_offset`/`seg_end` are absolute offsets into `file`.
///
/// The trailer is laid out, when all three optional fields are present, as
/// `[padding][checksum (2 bytes)][trailing length (2 bytes)]`, with the
/// trailing length field always occupying the segment's final 2 bytes. The
/// pad-count byte is therefore not always the segment's last byte: it sits
/// before whichever of the checksum/trailing-length fields are also present.
fn trailer_len(attrs: &LrsAttributes, file: &[u8], seg_offset: usize, seg_end: usize, hdr_length: u16) -> Result<usize> {
    let mut len = 0usize;
    if attrs.has_checksum {
        len += 2;
    }
    if attrs.has_trailing_length {
        len += 2;
    }
    if attrs.has_padding {
        let adjust = match (attrs.has_trailing_length, attrs.has_checksum) {
            (true, true) => 4,
            (true, false) | (false, true) => 2,
            (false, false) => 0,
        };
        let pad_count_pos = seg_end
            .checked_sub(1)
            .and_then(|p| p.checked_sub(adjust))
            .filter(|&p| p >= seg_offset)
            .ok_or_else(|| {
                FormatError::framing_invariant(seg_offset, "Logical Record Segment trailer is longer than the segment")
            })?;
        len += file[pad_count_pos] as usize;
    }
    if attrs.has_trailing_length {
        let pos = seg_end - 2;
        let trailing_length = u16::from_be_bytes([file[pos], file[pos + 1]]);
        if trailing_length != hdr_length {
            return Err(FormatError::framing_invariant(
                seg_offset,
                format!(
                    "Logical Record Segment trailing length {} does not match header length {}",
                    trailing_length, hdr_length
                ),
            ));
        }
    }
    Ok(len)
}

/// Parses the encryption packet (`UNORM` total length including this 4-byte
/// header, then a `UNORM` producer code, then a payload filling out the
/// rest of `length` bytes) starting at `offset`. Returns the producer code
/// and the absolute offset of the first byte past the packet.
fn parse_encryption_packet(file: &[u8], offset: usize) -> Result<(u16, usize)> {
    if file.len() < offset + 4 {
        return Err(FormatError::short_read(offset, "an encryption packet header"));
    }
    let length = u16::from_be_bytes([file[offset], file[offset + 1]]);
    let producer_code = u16::from_be_bytes([file[offset + 2], file[offset + 3]]);
    if length < 4 {
        return Err(FormatError::framing_invariant(
            offset,
            format!("encryption packet length {} is shorter than its own 4-byte header", length),
        ));
    }
    let end = offset + length as usize;
    if end > file.len() {
        return Err(FormatError::short_read(offset, "encryption packet extends past end of file"));
    }
    Ok((producer_code, end))
}

/// Splits `file[base..]` into Logical Record Segments, validating Visible
/// Record and Segment framing as it goes. Returned offsets are absolute
/// (relative to `file`, not to `base`).
fn split_segments(file: &[u8], base: usize) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut offset = base;

    while offset < file.len() {
        let (vr, payload_start) = parse_vr_header(file, offset)?;
        let vr_end = offset + vr.length as usize;
        if vr_end > file.len() {
            return Err(FormatError::short_read(offset, "Visible Record length extends past end of file"));
        }

        let mut seg_offset = payload_start;
        while seg_offset < vr_end {
            let (hdr, header_end) = parse_lrs_header(file, seg_offset)?;
            if hdr.length % 2 != 0 || hdr.length < 16 {
                return Err(FormatError::framing_invariant(
                    seg_offset,
                    format!(
                        "Logical Record Segment length {} must be even and at least 16",
                        hdr.length
                    ),
                ));
            }
            let seg_end = seg_offset + hdr.length as usize;
            if seg_end > vr_end {
                return Err(FormatError::framing_invariant(
                    seg_offset,
                    "Logical Record Segment extends past the end of its Visible Record",
                ));
            }
            let trailer = trailer_len(&hdr.attrs, file, seg_offset, seg_end, hdr.length)?;
            let body_end = seg_end.checked_sub(trailer).ok_or_else(|| {
                FormatError::framing_invariant(seg_offset, "Logical Record Segment trailer is longer than the segment")
            })?;

            let (body_start, encryption_producer_code) = if hdr.attrs.has_encryption_packet {
                let (producer_code, packet_end) = parse_encryption_packet(file, header_end)?;
                (packet_end, Some(producer_code))
            } else {
                (header_end, None)
            };
            if body_end < body_start {
                return Err(FormatError::framing_invariant(
                    seg_offset,
                    "Logical Record Segment body start is after its computed end",
                ));
            }

            segments.push(Segment {
                attrs: hdr.attrs,
                lr_type: hdr.lr_type,
                body_start,
                body_end,
                encryption_producer_code,
            });

            seg_offset = seg_end;
        }

        offset = vr_end;
    }

    Ok(segments)
}

/// Groups consecutive Segments into whole Logical Records, validating the
/// predecessor/successor chain and that every segment in a record agrees on
/// `is_eflr`/`encrypted`/type, then materializes or defers each body.
fn group_segments(file: &[u8], segments: &[Segment]) -> Result<Vec<LogicalRecord>> {
    let mut records = Vec::new();
    let mut i = 0;
    while i < segments.len() {
        let first = segments[i];
        if first.attrs.has_predecessor {
            return Err(FormatError::framing_invariant(
                first.body_start,
                "Logical Record Segment chain starts with a segment marked as having a predecessor",
            ));
        }

        let mut ranges = vec![(first.body_start, first.body_end)];
        let is_eflr = first.attrs.is_eflr;
        let encrypted = first.attrs.is_encrypted;
        let lr_type = first.lr_type;
        let encryption_producer_code = first.encryption_producer_code;

        let mut j = i;
        while segments[j].attrs.has_successor {
            j += 1;
            if j >= segments.len() {
                return Err(FormatError::framing_invariant(
                    segments[i].body_start,
                    "Logical Record Segment chain ends before its last segment clears has_successor",
                ));
            }
            let seg = segments[j];
            if seg.attrs.is_eflr != is_eflr || seg.attrs.is_encrypted != encrypted || seg.lr_type != lr_type {
                return Err(FormatError::framing_invariant(
                    seg.body_start,
                    "Logical Record Segment chain disagrees on type/EFLR/encrypted across segments",
                ));
            }
            if !seg.attrs.has_predecessor {
                return Err(FormatError::framing_invariant(
                    seg.body_start,
                    "non-initial Logical Record Segment is missing has_predecessor",
                ));
            }
            ranges.push((seg.body_start, seg.body_end));
        }

        // Encrypted Logical Records are never decoded regardless of type,
        // so only a non-encrypted EFLR is materialized eagerly.
        let body = if is_eflr && !encrypted {
            let mut bytes = Vec::new();
            for &(s, e) in &ranges {
                bytes.extend_from_slice(&file[s..e]);
            }
            RecordBody::Eager(bytes)
        } else {
            RecordBody::Lazy(ranges)
        };

        records.push(LogicalRecord {
            is_eflr,
            encrypted,
            lr_type,
            body,
            offset: ranges[0].0,
            encryption_producer_code,
        });

        i = j + 1;
    }

    Ok(records)
}

/// Parses the Storage Unit Label and every Logical Record in `file`.
pub fn parse_file(file: &[u8]) -> Result<(Sul, Vec<LogicalRecord>)> {
    let sul = parse_sul(file)?;
    let segments = split_segments(file, SUL_LENGTH)?;
    let records = group_segments(file, &segments)?;
    Ok((sul, records))
}

//
// Copyright 2024 DLIS Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Decodes Indirectly Formatted Logical Records (Frame Data, Unformatted
//! Data, End-of-Data, and opaque Private payloads), using the Frame/Channel
//! side tables built while classifying EFLRs.

use std::collections::HashMap;

use crate::cursor::Cursor;
use crate::error::{FormatError, Result};
use crate::object::{parse_value, rc, ObName, RepresentationCode, Value};

/// The Logical Record type codes that select an IFLR's dialect.
pub mod lr_type {
    pub const FRAME_DATA: u8 = 0;
    pub const UNFORMATTED_DATA: u8 = 1;
    pub const END_OF_DATA: u8 = 127;
}

/// A Channel's decoded metadata, keyed by its Object Name in
/// `LogicalFile::channels`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ChannelInfo {
    pub name: ObName,
    pub rep_code: RepresentationCode,
    pub dimension: Vec<u32>,
    pub units: Option<String>,
    /// `Π dimension[i]`; the number of representation-code values a single
    /// Frame Data slot for this channel carries.
    pub elements_per_slot: u32,
}

/// A Frame's decoded metadata, keyed by its Object Name in
/// `LogicalFile::frames`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FrameInfo {
    pub name: ObName,
    pub channel_names: Vec<ObName>,
    pub encrypted: bool,
}

/// One channel's worth of decoded values within a single Frame Data record.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum Slot {
    Scalar(Value),
    Vector(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FrameData {
    pub frame_number: u32,
    /// One entry per channel in the frame's declared order.
    pub slots: Vec<Slot>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct UnformattedData {
    pub descriptor: ObName,
    pub consumer_name: Option<String>,
    pub description: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EndOfData {
    pub frame_type_ref: ObName,
    /// The logical-record type of the sequence this record ends, or `None`
    /// if the producer omitted the trailing USHORT.
    pub lr_type: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum Iflr {
    FrameData { frame: ObName, data: FrameData },
    UnformattedData { descriptor: ObName, data: UnformattedData },
    EndOfData(EndOfData),
    Private { lr_type: u8, body: Vec<u8> },
}

fn read_obname(cursor: &mut Cursor) -> Result<ObName> {
    cursor.apply(rc::obname)
}

/// Computes `Π dimension[i]`, as the original decoder does: a dimension
/// Attribute with `count == 1` is a bare scalar size, not a one-element
/// product.
pub fn elements_per_slot(dimension: &[u32]) -> u32 {
    if dimension.is_empty() {
        1
    } else {
        dimension.iter().product()
    }
}

fn decode_frame_data(
    cursor: &mut Cursor,
    frame: &FrameInfo,
    channels: &HashMap<ObName, ChannelInfo>,
) -> Result<FrameData> {
    let frame_number = cursor.apply(rc::uvari)?;
    let mut slots = Vec::with_capacity(frame.channel_names.len());
    for name in &frame.channel_names {
        let info = channels.get(name).ok_or_else(|| {
            FormatError::dangling_frame_ref(
                cursor.offset(),
                format!("Frame Data references channel {:?} with no matching Channel object", name),
            )
        })?;
        let n = info.elements_per_slot.max(1) as usize;
        if n == 1 {
            slots.push(Slot::Scalar(cursor.apply(parse_value(info.rep_code))?));
        } else {
            let mut values = Vec::with_capacity(n);
            for _ in 0..n {
                values.push(cursor.apply(parse_value(info.rep_code))?);
            }
            slots.push(Slot::Vector(values));
        }
    }
    Ok(FrameData { frame_number, slots })
}

/// Decodes a single IFLR body. `frames`/`channels` are the side tables
/// accumulated from this Logical File's EFLRs so far; `noform_names` maps a
/// data-descriptor Object Name to its resolved consumer name/description
/// from the UDI EFLR, when known.
pub fn parse_iflr(
    lr_type: u8,
    body: &[u8],
    base_offset: usize,
    frames: &HashMap<ObName, FrameInfo>,
    channels: &HashMap<ObName, ChannelInfo>,
    noform_names: &HashMap<ObName, (Option<String>, Option<String>)>,
) -> Result<Iflr> {
    let mut cursor = Cursor::new(body, base_offset);
    match lr_type {
        lr_type::FRAME_DATA => {
            let frame_name = read_obname(&mut cursor)?;
            let frame = frames.get(&frame_name).ok_or_else(|| {
                FormatError::dangling_frame_ref(
                    cursor.offset(),
                    format!("Frame Data references frame {:?} with no matching Frame object", frame_name),
                )
            })?;
            if frame.encrypted {
                return Err(FormatError::encrypted_unsupported(
                    cursor.offset(),
                    format!("Frame {:?} is marked encrypted; its Frame Data is not decoded", frame_name),
                ));
            }
            let data = decode_frame_data(&mut cursor, frame, channels)?;
            Ok(Iflr::FrameData { frame: frame_name, data })
        }
        lr_type::UNFORMATTED_DATA => {
            let descriptor = read_obname(&mut cursor)?;
            let (consumer_name, description) = noform_names
                .get(&descriptor)
                .cloned()
                .unwrap_or((None, None));
            let data = cursor.remaining().to_vec();
            Ok(Iflr::UnformattedData {
                descriptor: descriptor.clone(),
                data: UnformattedData { descriptor, consumer_name, description, data },
            })
        }
        lr_type::END_OF_DATA => {
            let frame_type_ref = read_obname(&mut cursor)?;
            let lr_type = if cursor.is_empty() {
                None
            } else {
                Some(cursor.read_u8()?)
            };
            Ok(Iflr::EndOfData(EndOfData { frame_type_ref, lr_type }))
        }
        other => Ok(Iflr::Private { lr_type: other, body: body.to_vec() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(id: &str) -> ObName {
        ObName { origin: 1, copy: 0, identifier: id.to_string() }
    }

    #[test]
    fn elements_per_slot_treats_single_count_as_scalar() {
        assert_eq!(elements_per_slot(&[]), 1);
        assert_eq!(elements_per_slot(&[1]), 1);
        assert_eq!(elements_per_slot(&[2, 3]), 6);
    }

    #[test]
    fn decodes_frame_data_with_a_scalar_and_a_vector_channel() {
        let mut channels = HashMap::new();
        channels.insert(
            name("DEPT"),
            ChannelInfo {
                name: name("DEPT"),
                rep_code: RepresentationCode::FSingl,
                dimension: vec![1],
                units: None,
                elements_per_slot: 1,
            },
        );
        channels.insert(
            name("ARR"),
            ChannelInfo {
                name: name("ARR"),
                rep_code: RepresentationCode::UShort,
                dimension: vec![2],
                units: None,
                elements_per_slot: 2,
            },
        );
        let mut frames = HashMap::new();
        frames.insert(
            name("FRAME1"),
            FrameInfo { name: name("FRAME1"), channel_names: vec![name("DEPT"), name("ARR")], encrypted: false },
        );

        let mut bytes = Vec::new();
        // OBNAME: origin uvari(1), copy 0, ident "FRAME1"
        bytes.extend(&[1, 0, 6]);
        bytes.extend(b"FRAME1");
        bytes.push(5); // frame number (uvari 1 byte)
        bytes.extend(&1.5f32.to_be_bytes()); // DEPT scalar
        bytes.push(10);
        bytes.push(20); // ARR vector

        let noform = HashMap::new();
        let iflr = parse_iflr(lr_type::FRAME_DATA, &bytes, 0, &frames, &channels, &noform).unwrap();
        match iflr {
            Iflr::FrameData { frame, data } => {
                assert_eq!(frame, name("FRAME1"));
                assert_eq!(data.frame_number, 5);
                assert_eq!(data.slots.len(), 2);
                match &data.slots[0] {
                    Slot::Scalar(Value::FSingl(v)) => assert!((*v - 1.5).abs() < f32::EPSILON),
                    other => panic!("unexpected slot: {:?}", other),
                }
                match &data.slots[1] {
                    Slot::Vector(v) => assert_eq!(v.len(), 2),
                    other => panic!("unexpected slot: {:?}", other),
                }
            }
            other => panic!("unexpected iflr: {:?}", other),
        }
    }

    #[test]
    fn rejects_frame_data_for_an_unknown_frame() {
        let frames = HashMap::new();
        let channels = HashMap::new();
        let noform = HashMap::new();
        let mut bytes = vec![1, 0, 6];
        bytes.extend(b"FRAME1");
        let err = parse_iflr(lr_type::FRAME_DATA, &bytes, 0, &frames, &channels, &noform).unwrap_err();
        assert_eq!(err.kind, crate::error::FormatErrorKind::DanglingFrameRef);
    }

    #[test]
    fn decodes_end_of_data_with_and_without_trailing_type() {
        let mut bytes = vec![1, 0, 6];
        bytes.extend(b"FRAME1");
        bytes.push(9);
        let frames = HashMap::new();
        let channels = HashMap::new();
        let noform = HashMap::new();
        let iflr = parse_iflr(lr_type::END_OF_DATA, &bytes, 0, &frames, &channels, &noform).unwrap();
        match iflr {
            Iflr::EndOfData(eod) => assert_eq!(eod.lr_type, Some(9)),
            other => panic!("unexpected iflr: {:?}", other),
        }

        let mut bytes2 = vec![1, 0, 6];
        bytes2.extend(b"FRAME1");
        let iflr2 = parse_iflr(lr_type::END_OF_DATA, &bytes2, 0, &frames, &channels, &noform).unwrap();
        match iflr2 {
            Iflr::EndOfData(eod) => assert_eq!(eod.lr_type, None),
            other => panic!("unexpected iflr: {:?}", other),
        }
    }

    #[test]
    fn preserves_unrecognized_lr_types_as_private() {
        let frames = HashMap::new();
        let channels = HashMap::new();
        let noform = HashMap::new();
        let bytes = vec![1, 2, 3];
        let iflr = parse_iflr(42, &bytes, 0, &frames, &channels, &noform).unwrap();
        match iflr {
            Iflr::Private { lr_type, body } => {
                assert_eq!(lr_type, 42);
                assert_eq!(body, vec![1, 2, 3]);
            }
            other => panic!("unexpected iflr: {:?}", other),
        }
    }
}

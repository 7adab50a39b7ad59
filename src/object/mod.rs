//
// Copyright 2024 DLIS Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # The DLIS value model.
//!
//! RP66 V1 defines 27 Representation Codes. This module provides:
//!
//! 1. `RepresentationCode`, the 1..=27 code enumeration.
//! 2. `Value`, the decoded value of any Representation Code.
//! 3. The composite value types `DTime`, `ObName`, `ObjRef` and `AttRef`
//!    that several Representation Codes decode into.
//!
//! # References
//!
//! 1. API RP66 V1, Appendix B, Representation Codes.

use crate::encoding::TextEncoding;

pub(crate) mod rc;
pub use rc::parse_value;

/// A Representation Code, as a 1-based integer in `1..=27`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum RepresentationCode {
    FShort = 1,
    FSingl = 2,
    FSing1 = 3,
    FSing2 = 4,
    ISingl = 5,
    VSingl = 6,
    FDoubl = 7,
    FDoub1 = 8,
    FDoub2 = 9,
    CSingl = 10,
    CDoubl = 11,
    SShort = 12,
    SNorm = 13,
    SLong = 14,
    UShort = 15,
    UNorm = 16,
    ULong = 17,
    UVari = 18,
    Ident = 19,
    Ascii = 20,
    DTime = 21,
    Origin = 22,
    ObName = 23,
    ObjRef = 24,
    AttRef = 25,
    Status = 26,
    Units = 27,
}

impl RepresentationCode {
    /// Maps a raw code byte onto one of the 27 known codes, or `None` if it
    /// falls outside `1..=27`.
    pub fn from_u8(code: u8) -> Option<Self> {
        use RepresentationCode::*;
        Some(match code {
            1 => FShort,
            2 => FSingl,
            3 => FSing1,
            4 => FSing2,
            5 => ISingl,
            6 => VSingl,
            7 => FDoubl,
            8 => FDoub1,
            9 => FDoub2,
            10 => CSingl,
            11 => CDoubl,
            12 => SShort,
            13 => SNorm,
            14 => SLong,
            15 => UShort,
            16 => UNorm,
            17 => ULong,
            18 => UVari,
            19 => Ident,
            20 => Ascii,
            21 => DTime,
            22 => Origin,
            23 => ObName,
            24 => ObjRef,
            25 => AttRef,
            26 => Status,
            27 => Units,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// A decoded `DTIME` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct DTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub microsecond: u32,
    pub zone: TimeZoneTag,
}

/// The time-zone tag carried in the high nibble of a `DTIME` value's second byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum TimeZoneTag {
    LocalStandard,
    LocalDaylightSavings,
    GreenwichMeanTime,
}

impl TimeZoneTag {
    pub fn from_nibble(n: u8) -> Option<Self> {
        match n {
            0 => Some(TimeZoneTag::LocalStandard),
            1 => Some(TimeZoneTag::LocalDaylightSavings),
            2 => Some(TimeZoneTag::GreenwichMeanTime),
            _ => None,
        }
    }
}

/// A decoded `OBNAME`: the (origin, copy, identifier) triple that names
/// every Object in every EFLR, and doubles as the key by which Frame and
/// Channel Objects are looked up while decoding `IFLR`s.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct ObName {
    pub origin: u32,
    pub copy: u8,
    pub identifier: String,
}

/// A decoded `OBJREF`: a reference to an Object in a named Set type.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ObjRef {
    pub object_type: String,
    pub name: ObName,
}

/// A decoded `ATTREF`: an `OBJREF` further qualified by an attribute label.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AttRef {
    pub object_type: String,
    pub name: ObName,
    pub label: String,
}

/// A string decoded through the ASCII / Windows-1252 / Latin-1 fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DecodedString {
    pub text: String,
    pub encoding: TextEncoding,
}

/// The decoded value of a single Representation Code instance.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum Value {
    FShort(f64),
    FSingl(f32),
    FSing1 { value: f32, bound: f32 },
    FSing2 { value: f32, minus: f32, plus: f32 },
    ISingl(i32),
    VSingl(i32),
    FDoubl(f64),
    FDoub1 { value: f64, bound: f64 },
    FDoub2 { value: f64, minus: f64, plus: f64 },
    CSingl { real: f32, imag: f32 },
    CDoubl { real: f64, imag: f64 },
    SShort(i8),
    SNorm(i16),
    SLong(i32),
    UShort(u8),
    UNorm(u16),
    ULong(u32),
    UVari(u32),
    Ident(DecodedString),
    Ascii(DecodedString),
    DTime(DTime),
    Origin(u32),
    ObName(ObName),
    ObjRef(ObjRef),
    AttRef(AttRef),
    Status(bool),
    Units(DecodedString),
}

impl Value {
    /// Widens any integral-valued variant to `u64`. Used when a numeric
    /// Attribute (e.g. a Channel's `REPRESENTATION-CODE` or `DIMENSION`
    /// entries) may have been encoded with any of several integer codes.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::SShort(v) => Some(v as u64),
            Value::SNorm(v) => Some(v as u64),
            Value::SLong(v) => Some(v as u64),
            Value::UShort(v) => Some(v as u64),
            Value::UNorm(v) => Some(v as u64),
            Value::ULong(v) => Some(v as u64),
            Value::UVari(v) => Some(v as u64),
            Value::Origin(v) => Some(v as u64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Ident(s) | Value::Ascii(s) | Value::Units(s) => Some(&s.text),
            _ => None,
        }
    }
}

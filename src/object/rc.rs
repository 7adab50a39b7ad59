//
// Copyright 2024 DLIS Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Leaf-level `nom` parsers, one per Representation Code.

use nom::bytes::complete::take;
use nom::combinator::{map, map_opt};
use nom::number::complete::{be_f32, be_f64, be_i16, be_i32, be_i8, be_u16, be_u32, be_u8};
use nom::sequence::tuple;
use nom::IResult;

use crate::encoding::{decode_ascii, decode_ident};
use crate::object::{AttRef, DTime, DecodedString, ObjRef, ObName, RepresentationCode, TimeZoneTag, Value};

/// Parses a `UVARI`: a self-describing unsigned integer in 1, 2 or 4 bytes,
/// selected by the top two bits of the first byte.
///
/// * `0xxxxxxx` — 7-bit value in one byte.
/// * `10xxxxxx xxxxxxxx` — 14-bit value in two bytes.
/// * `11xxxxxx xxxxxxxx xxxxxxxx xxxxxxxx` — 30-bit value in four bytes.
pub fn uvari(input: &[u8]) -> IResult<&[u8], u32> {
    let (_, first) = be_u8(input)?;
    if first & 0x80 == 0 {
        map(be_u8, |b| (b & 0x7F) as u32)(input)
    } else if first & 0xC0 == 0x80 {
        map(be_u16, |v| (v & 0x3FFF) as u32)(input)
    } else {
        map(be_u32, |v| v & 0x3FFF_FFFF)(input)
    }
}

fn fshort(input: &[u8]) -> IResult<&[u8], Value> {
    map(be_i16, |raw| Value::FShort(raw as f64 / 16.0))(input)
}

fn fsingl(input: &[u8]) -> IResult<&[u8], Value> {
    map(be_f32, Value::FSingl)(input)
}

fn fsing1(input: &[u8]) -> IResult<&[u8], Value> {
    map(tuple((be_f32, be_f32)), |(value, bound)| Value::FSing1 { value, bound })(input)
}

fn fsing2(input: &[u8]) -> IResult<&[u8], Value> {
    map(tuple((be_f32, be_f32, be_f32)), |(value, minus, plus)| {
        Value::FSing2 { value, minus, plus }
    })(input)
}

fn isingl(input: &[u8]) -> IResult<&[u8], Value> {
    map(be_i32, Value::ISingl)(input)
}

fn vsingl(input: &[u8]) -> IResult<&[u8], Value> {
    map(be_i32, Value::VSingl)(input)
}

fn fdoubl(input: &[u8]) -> IResult<&[u8], Value> {
    map(be_f64, Value::FDoubl)(input)
}

fn fdoub1(input: &[u8]) -> IResult<&[u8], Value> {
    map(tuple((be_f64, be_f64)), |(value, bound)| Value::FDoub1 { value, bound })(input)
}

fn fdoub2(input: &[u8]) -> IResult<&[u8], Value> {
    map(tuple((be_f64, be_f64, be_f64)), |(value, minus, plus)| {
        Value::FDoub2 { value, minus, plus }
    })(input)
}

fn csingl(input: &[u8]) -> IResult<&[u8], Value> {
    map(tuple((be_f32, be_f32)), |(real, imag)| Value::CSingl { real, imag })(input)
}

fn cdoubl(input: &[u8]) -> IResult<&[u8], Value> {
    map(tuple((be_f64, be_f64)), |(real, imag)| Value::CDoubl { real, imag })(input)
}

fn sshort(input: &[u8]) -> IResult<&[u8], Value> {
    map(be_i8, Value::SShort)(input)
}

fn snorm(input: &[u8]) -> IResult<&[u8], Value> {
    map(be_i16, Value::SNorm)(input)
}

fn slong(input: &[u8]) -> IResult<&[u8], Value> {
    map(be_i32, Value::SLong)(input)
}

fn ushort(input: &[u8]) -> IResult<&[u8], Value> {
    map(be_u8, Value::UShort)(input)
}

fn unorm(input: &[u8]) -> IResult<&[u8], Value> {
    map(be_u16, Value::UNorm)(input)
}

fn ulong(input: &[u8]) -> IResult<&[u8], Value> {
    map(be_u32, Value::ULong)(input)
}

fn uvari_value(input: &[u8]) -> IResult<&[u8], Value> {
    map(uvari, Value::UVari)(input)
}

/// Parses a length-prefixed string: a `USHORT` byte count followed by that
/// many bytes, decoded with `decode`.
fn prefixed_string<'a>(
    input: &'a [u8],
    decode: impl Fn(&[u8]) -> Option<(String, crate::encoding::TextEncoding)>,
) -> IResult<&'a [u8], DecodedString> {
    let (input, len) = be_u8(input)?;
    let (input, bytes) = take(len as usize)(input)?;
    let (text, encoding) = decode(bytes).ok_or(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Verify,
    )))?;
    Ok((input, DecodedString { text, encoding }))
}

fn ident(input: &[u8]) -> IResult<&[u8], Value> {
    map(|i| prefixed_string(i, decode_ident), Value::Ident)(input)
}

fn ascii(input: &[u8]) -> IResult<&[u8], Value> {
    map(
        |i| prefixed_string(i, |b| Some(decode_ascii(b))),
        Value::Ascii,
    )(input)
}

fn units(input: &[u8]) -> IResult<&[u8], Value> {
    map(
        |i| prefixed_string(i, |b| Some(decode_ascii(b))),
        Value::Units,
    )(input)
}

/// Parses a `DTIME`: year, a packed month/timezone byte, day, hour, minute,
/// second, and a big-endian millisecond count.
fn dtime(input: &[u8]) -> IResult<&[u8], Value> {
    map_opt(
        tuple((be_u8, be_u8, be_u8, be_u8, be_u8, be_u8, be_u16)),
        |(y, month_tz, d, h, min, s, ms)| {
            let zone = TimeZoneTag::from_nibble(month_tz >> 4)?;
            Some(Value::DTime(DTime {
                year: 1900 + y as u16,
                month: month_tz & 0x0F,
                day: d,
                hour: h,
                minute: min,
                second: s,
                microsecond: ms as u32 * 1000,
                zone,
            }))
        },
    )(input)
}

fn origin(input: &[u8]) -> IResult<&[u8], Value> {
    map(uvari, Value::Origin)(input)
}

/// Parses an `IDENT`-coded identifier string used inside `OBNAME`/`OBJREF`/`ATTREF`,
/// and by every Component-grammar metadata field (label/type/name/units),
/// which are always `IDENT`-encoded regardless of an Attribute's own
/// representation code.
pub(crate) fn ident_text(input: &[u8]) -> IResult<&[u8], String> {
    let (input, s) = prefixed_string(input, decode_ident)?;
    Ok((input, s.text))
}

pub fn obname(input: &[u8]) -> IResult<&[u8], ObName> {
    map(tuple((uvari, be_u8, ident_text)), |(org, copy, identifier)| ObName {
        origin: org,
        copy,
        identifier,
    })(input)
}

fn obname_value(input: &[u8]) -> IResult<&[u8], Value> {
    map(obname, Value::ObName)(input)
}

pub fn objref(input: &[u8]) -> IResult<&[u8], ObjRef> {
    map(tuple((ident_text, obname)), |(object_type, name)| ObjRef { object_type, name })(input)
}

fn objref_value(input: &[u8]) -> IResult<&[u8], Value> {
    map(objref, Value::ObjRef)(input)
}

fn attref(input: &[u8]) -> IResult<&[u8], Value> {
    map(tuple((ident_text, obname, ident_text)), |(object_type, name, label)| {
        Value::AttRef(AttRef { object_type, name, label })
    })(input)
}

fn status(input: &[u8]) -> IResult<&[u8], Value> {
    map(be_u8, |b| Value::Status(b != 0))(input)
}

/// Returns the leaf parser for `code`, to be invoked against the bytes that
/// follow a Component's representation-code byte.
pub fn parse_value(code: RepresentationCode) -> fn(&[u8]) -> IResult<&[u8], Value> {
    use RepresentationCode::*;
    match code {
        FShort => fshort,
        FSingl => fsingl,
        FSing1 => fsing1,
        FSing2 => fsing2,
        ISingl => isingl,
        VSingl => vsingl,
        FDoubl => fdoubl,
        FDoub1 => fdoub1,
        FDoub2 => fdoub2,
        CSingl => csingl,
        CDoubl => cdoubl,
        SShort => sshort,
        SNorm => snorm,
        SLong => slong,
        UShort => ushort,
        UNorm => unorm,
        ULong => ulong,
        UVari => uvari_value,
        Ident => ident,
        Ascii => ascii,
        DTime => dtime,
        Origin => origin,
        ObName => obname_value,
        ObjRef => objref_value,
        AttRef => attref,
        Status => status,
        Units => units,
    }
}

//
// Copyright 2024 DLIS Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! ASCII / Windows-1252 / Latin-1 decode fallback chain used by the `IDENT`,
//! `ASCII` and `UNITS` Representation Codes.
//!
//! Producers in the wild are not always strict about staying within 7-bit
//! ASCII for string fields. Rather than reject such files outright, each
//! string codec records which of the three encodings actually succeeded so
//! callers can tell a clean field from a recovered one.

/// Which of the three chained codecs decoded a string field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum TextEncoding {
    Ascii,
    Cp1252,
    Latin1,
}

/// Maps Windows-1252 bytes `0x80..=0x9F` to Unicode scalar values. Latin-1
/// maps those bytes to `U+0080..=U+009F` (the C1 control range); Windows-1252
/// repurposes most of them for printable punctuation. Five code points in
/// this range are undefined in Windows-1252 and decode to `None`.
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), None, Some('\u{201A}'), Some('\u{0192}'),
    Some('\u{201E}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02C6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None, Some('\u{017D}'), None,
    None, Some('\u{2018}'), Some('\u{2019}'), Some('\u{201C}'),
    Some('\u{201D}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02DC}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203A}'),
    Some('\u{0153}'), None, Some('\u{017E}'), Some('\u{0178}'),
];

/// Decodes `bytes` as Windows-1252, failing if a byte falls in one of the
/// five undefined positions in `0x80..=0x9F`.
fn decode_cp1252(bytes: &[u8]) -> Option<String> {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if b < 0x80 || b >= 0xA0 {
            out.push(b as char);
        } else {
            out.push(CP1252_HIGH[(b - 0x80) as usize]?);
        }
    }
    Some(out)
}

/// Decodes `bytes` as Latin-1 (ISO-8859-1). Every byte maps directly to the
/// Unicode scalar value of the same number, so this never fails.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Decodes `bytes` with the two-step `ASCII -> Windows-1252` chain used for
/// `IDENT` values, which spec does not extend to Latin-1.
pub fn decode_ident(bytes: &[u8]) -> Option<(String, TextEncoding)> {
    if bytes.is_ascii() {
        return Some((String::from_utf8(bytes.to_vec()).ok()?, TextEncoding::Ascii));
    }
    decode_cp1252(bytes).map(|s| (s, TextEncoding::Cp1252))
}

/// Decodes `bytes` with the full three-step `ASCII -> Windows-1252 -> Latin-1`
/// chain used for `ASCII` and `UNITS` values. Latin-1 never fails, so this
/// function always succeeds.
pub fn decode_ascii(bytes: &[u8]) -> (String, TextEncoding) {
    if bytes.is_ascii() {
        if let Ok(s) = String::from_utf8(bytes.to_vec()) {
            return (s, TextEncoding::Ascii);
        }
    }
    if let Some(s) = decode_cp1252(bytes) {
        return (s, TextEncoding::Cp1252);
    }
    (decode_latin1(bytes), TextEncoding::Latin1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_clean_input_stays_ascii() {
        let (s, enc) = decode_ascii(b"HELLO WORLD");
        assert_eq!(s, "HELLO WORLD");
        assert_eq!(enc, TextEncoding::Ascii);
    }

    #[test]
    fn ident_falls_back_to_cp1252() {
        // 0x93/0x94 are the CP1252 curly quotes, undefined in plain ASCII.
        let (s, enc) = decode_ident(&[0x93, b'x', 0x94]).unwrap();
        assert_eq!(enc, TextEncoding::Cp1252);
        assert_eq!(s, "\u{201C}x\u{201D}");
    }

    #[test]
    fn ident_rejects_undefined_cp1252_byte() {
        assert!(decode_ident(&[0x81]).is_none());
    }

    #[test]
    fn ascii_falls_back_to_latin1_when_cp1252_is_undefined() {
        let (s, enc) = decode_ascii(&[0x81]);
        assert_eq!(enc, TextEncoding::Latin1);
        assert_eq!(s, "\u{0081}");
    }
}

//
// Copyright 2024 DLIS Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! A minimal read cursor over a byte slice that bridges `nom`'s
//! combinator-style leaf parsers with the imperative recursive-descent
//! grammar the Component/Logical-Record layers need (template lookups and
//! Set/Object boundaries are stateful in a way `nom` alone does not model
//! cleanly).

use nom::error::ErrorKind;
use nom::number::complete::be_u8;
use nom::IResult;

use crate::error::{FormatError, Result};

/// A cursor over `input`, tracking how many bytes of `input` have been
/// consumed plus the absolute offset of `input[0]` in the file, so that
/// every error reports a true absolute byte offset.
pub struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
    base_offset: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a [u8], base_offset: usize) -> Self {
        Cursor { input, pos: 0, base_offset }
    }

    /// Absolute offset of the next unread byte.
    pub fn offset(&self) -> usize {
        self.base_offset + self.pos
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Runs a `nom` parser against the unread remainder, advancing the
    /// cursor by however many bytes it consumed.
    ///
    /// A leaf parser that exhausts the ASCII -> Windows-1252 -> Latin-1
    /// string fallback chain (`object::rc::prefixed_string`) signals that by
    /// failing with `ErrorKind::Verify`; that case is reported as
    /// `EncodingFallbackExhausted` rather than `ShortRead`, since the bytes
    /// were present, just undecodable.
    pub fn apply<T>(&mut self, parser: impl FnOnce(&'a [u8]) -> IResult<&'a [u8], T>) -> Result<T> {
        let offset = self.offset();
        let remaining = self.remaining();
        match parser(remaining) {
            Ok((rest, value)) => {
                self.pos += remaining.len() - rest.len();
                Ok(value)
            }
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) if e.code == ErrorKind::Verify => {
                Err(FormatError::encoding_fallback_exhausted(
                    offset,
                    "string field exhausted the ASCII/Windows-1252/Latin-1 fallback chain",
                ))
            }
            Err(_) => Err(FormatError::short_read(
                offset,
                "ran out of bytes while parsing a field",
            )),
        }
    }

    /// Peeks at the next byte without consuming it.
    pub fn peek_u8(&self) -> Result<u8> {
        self.remaining()
            .first()
            .copied()
            .ok_or_else(|| FormatError::short_read(self.offset(), "expected at least one more byte"))
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.apply(be_u8)
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let offset = self.offset();
        if self.remaining().len() < n {
            return Err(FormatError::short_read(
                offset,
                format!("needed {} bytes but only {} remained", n, self.remaining().len()),
            ));
        }
        let slice = &self.remaining()[..n];
        self.pos += n;
        Ok(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormatErrorKind;
    use crate::object::rc::ident_text;

    #[test]
    fn apply_reports_short_read_when_bytes_run_out() {
        let mut cursor = Cursor::new(&[0x00], 10);
        // Only one byte supplied; a second `be_u8` runs past the end.
        cursor.apply(be_u8).unwrap();
        let err = cursor.apply(be_u8).unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::ShortRead);
    }

    #[test]
    fn apply_reports_encoding_fallback_exhausted_not_short_read() {
        // 0x81 is undefined in both plain ASCII and Windows-1252.
        let bytes = [0x01, 0x81];
        let mut cursor = Cursor::new(&bytes, 0);
        let err = cursor.apply(ident_text).unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::EncodingFallbackExhausted);
    }
}

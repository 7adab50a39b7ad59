//
// Copyright 2024 DLIS Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use std::fmt::{self, Display};

pub type Result<T> = std::result::Result<T, FormatError>;

/// The category of failure encountered while decoding a DLIS byte stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormatErrorKind {
    /// Fewer bytes remained than the current field or record required.
    ShortRead,
    /// The Storage Unit Label magic/structure markers did not match.
    BadMagic,
    /// The Storage Unit Label version string is not a supported DLIS version.
    BadVersion,
    /// A Logical Record Segment chain violated the framing invariants
    /// (predecessor/successor flags, shared attributes, matching type).
    FramingInvariant,
    /// A Representation Code outside 1..=27 was encountered.
    UnsupportedCode(u8),
    /// A Component descriptor byte could not be interpreted for its context.
    BadDescriptor,
    /// The ASCII / Windows-1252 / Latin-1 fallback chain was exhausted.
    EncodingFallbackExhausted,
    /// A Frame Data record referenced a Frame Object Name with no matching
    /// Frame EFLR object in the same Logical File.
    DanglingFrameRef,
    /// The Logical Record is encrypted and cannot be decoded.
    EncryptedUnsupported,
}

/// A single, offset-carrying error type for every failure this crate can report.
///
/// Every instance carries the absolute byte offset into the file buffer at
/// which the failure was detected, plus a human-readable description; `kind`
/// further classifies it into one of a small, closed set of failure
/// categories so callers can match on it without parsing `message`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatError {
    pub offset: usize,
    pub kind: FormatErrorKind,
    pub message: String,
}

impl FormatError {
    pub fn new(offset: usize, kind: FormatErrorKind, message: impl Into<String>) -> Self {
        FormatError {
            offset,
            kind,
            message: message.into(),
        }
    }

    pub fn short_read(offset: usize, message: impl Into<String>) -> Self {
        Self::new(offset, FormatErrorKind::ShortRead, message)
    }

    pub fn bad_magic(offset: usize, message: impl Into<String>) -> Self {
        Self::new(offset, FormatErrorKind::BadMagic, message)
    }

    pub fn bad_version(offset: usize, message: impl Into<String>) -> Self {
        Self::new(offset, FormatErrorKind::BadVersion, message)
    }

    pub fn framing_invariant(offset: usize, message: impl Into<String>) -> Self {
        Self::new(offset, FormatErrorKind::FramingInvariant, message)
    }

    pub fn unsupported_code(offset: usize, code: u8) -> Self {
        Self::new(
            offset,
            FormatErrorKind::UnsupportedCode(code),
            format!("representation code {} is outside the supported 1..=27 range", code),
        )
    }

    pub fn bad_descriptor(offset: usize, message: impl Into<String>) -> Self {
        Self::new(offset, FormatErrorKind::BadDescriptor, message)
    }

    pub fn encoding_fallback_exhausted(offset: usize, message: impl Into<String>) -> Self {
        Self::new(offset, FormatErrorKind::EncodingFallbackExhausted, message)
    }

    pub fn dangling_frame_ref(offset: usize, message: impl Into<String>) -> Self {
        Self::new(offset, FormatErrorKind::DanglingFrameRef, message)
    }

    pub fn encrypted_unsupported(offset: usize, message: impl Into<String>) -> Self {
        Self::new(offset, FormatErrorKind::EncryptedUnsupported, message)
    }
}

impl Display for FormatError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "at byte offset {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for FormatError {}

//
// Copyright 2024 DLIS Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! A native Rust decoder for RP66 V1 (DLIS) well-log interchange files.
//!
//! Call [`parse`] on a file path to get back the Storage Unit Label and the
//! list of [`LogicalFile`]s it contains. Each Logical File holds its
//! classified EFLRs ([`LogicalFile::eflr_list`]) and, unless `eflr_only` was
//! set, its decoded Frame Data ([`LogicalFile::frame_data`]) and Unformatted
//! Data ([`LogicalFile::noform_list`]).

use std::path::Path;
use std::sync::Arc;

mod component;
mod cursor;
mod document;
mod eflr;
mod encoding;
mod error;
mod iflr;
mod logical_file;
mod logical_record;
pub mod object;
pub mod output;
mod physical;

pub use component::{AttributeSlot, AttributeValue, Object as EflrObject, Set, SetRole, SlotKind};
pub use document::{Sul, SUL_LENGTH};
pub use eflr::{set_type, ClassifiedEflr, GenericEflr};
pub use error::{FormatError, FormatErrorKind, Result};
pub use iflr::{ChannelInfo, EndOfData, FrameData, FrameInfo, Iflr, Slot, UnformattedData};
pub use logical_file::LogicalFile;
pub use object::{DTime, DecodedString, ObName, ObjRef, RepresentationCode, TimeZoneTag, Value};

/// Reads and decodes a whole DLIS file: the Storage Unit Label, every
/// Visible Record and Logical Record Segment, reassembled into Logical
/// Records and split into Logical Files.
///
/// When `eflr_only` is `false`, every Logical File's IFLRs are decoded
/// eagerly too; when `true`, only EFLRs are decoded and a caller may later
/// call [`LogicalFile::load_iflr`] on individual files.
pub fn parse(path: impl AsRef<Path>, eflr_only: bool) -> Result<(Sul, Vec<LogicalFile>)> {
    let bytes = std::fs::read(path.as_ref()).map_err(|err| {
        FormatError::short_read(0, format!("could not read {:?}: {}", path.as_ref(), err))
    })?;
    parse_bytes(bytes, eflr_only)
}

/// As [`parse`], but over an in-memory buffer already read from its source.
pub fn parse_bytes(bytes: Vec<u8>, eflr_only: bool) -> Result<(Sul, Vec<LogicalFile>)> {
    let file: Arc<[u8]> = Arc::from(bytes);
    let (sul, records) = logical_record::parse_file(&file)?;
    let logical_files = logical_file::split_logical_files(file, records, eflr_only)?;
    Ok((sul, logical_files))
}

//
// Copyright 2024 DLIS Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Groups a flat sequence of Logical Records into Logical Files (split at
//! each `FILE-HEADER` EFLR), classifies each File's EFLRs, and — on request
//! — decodes its IFLRs into Frame Data, Unformatted Data and End-of-Data
//! records using the Channel/Frame side tables built while classifying.

use std::collections::HashMap;
use std::sync::Arc;

use log::{error, warn};

use crate::component::{AttributeValue, Object};
use crate::eflr::{parse_eflr, set_type, ClassifiedEflr, GenericEflr};
use crate::error::Result;
use crate::iflr::{self, ChannelInfo, EndOfData, FrameData, FrameInfo, Iflr, UnformattedData};
use crate::logical_record::LogicalRecord;
use crate::object::{ObName, RepresentationCode, Value};

fn dimension_of(obj: &Object) -> Vec<u32> {
    match obj.attr_value("DIMENSION") {
        Some(AttributeValue::Single(v)) => v.as_u64().into_iter().map(|n| n as u32).collect(),
        Some(AttributeValue::List(vs)) => vs.iter().filter_map(Value::as_u64).map(|n| n as u32).collect(),
        None => Vec::new(),
    }
}

fn channel_names_of(obj: &Object) -> Vec<ObName> {
    match obj.attr_value("CHANNELS") {
        Some(AttributeValue::Single(Value::ObName(n))) => vec![n.clone()],
        Some(AttributeValue::List(vs)) => vs
            .iter()
            .filter_map(|v| match v {
                Value::ObName(n) => Some(n.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Registers the Channel/Frame side tables populated while classifying a
/// Logical File's EFLRs, mirroring `channels[ObName]`/`frames[ObName]` from
/// the decode algorithm this crate is built from.
#[derive(Debug, Default)]
struct SideTables {
    channels: HashMap<ObName, ChannelInfo>,
    frames: HashMap<ObName, FrameInfo>,
    noform_names: HashMap<ObName, (Option<String>, Option<String>)>,
}

fn register_eflr(tables: &mut SideTables, classified: &ClassifiedEflr) {
    let generic: &GenericEflr = match classified.generic() {
        Some(g) => g,
        None => return,
    };
    match generic.set_type.as_str() {
        set_type::CHANNEL => {
            for obj in &generic.objects {
                let rep_code = obj
                    .attr_u64("REPRESENTATION-CODE")
                    .and_then(|c| RepresentationCode::from_u8(c as u8))
                    .unwrap_or(RepresentationCode::Ident);
                let dimension = dimension_of(obj);
                let elements_per_slot = iflr::elements_per_slot(&dimension);
                let units = obj.attr_str("UNITS").map(str::to_string);
                tables.channels.insert(
                    obj.name.clone(),
                    ChannelInfo { name: obj.name.clone(), rep_code, dimension, units, elements_per_slot },
                );
            }
        }
        set_type::FRAME => {
            for obj in &generic.objects {
                let encrypted = matches!(obj.attr_value("ENCRYPTED"), Some(AttributeValue::Single(Value::Status(true))));
                tables.frames.insert(
                    obj.name.clone(),
                    FrameInfo { name: obj.name.clone(), channel_names: channel_names_of(obj), encrypted },
                );
            }
        }
        set_type::UNFORMATTED_DATA_IDENTIFIER => {
            for obj in &generic.objects {
                let consumer_name = obj.attr_str("CONSUMER-NAME").map(str::to_string);
                let description = obj.attr_str("DESCRIPTION").map(str::to_string);
                tables.noform_names.insert(obj.name.clone(), (consumer_name, description));
            }
        }
        _ => {}
    }
}

/// A single decoded DLIS Logical File.
#[derive(Debug)]
pub struct LogicalFile {
    file: Arc<[u8]>,
    tables: SideTables,
    eflr_list: Vec<ClassifiedEflr>,
    /// IFLRs not yet decoded; cleared once `load_iflr` runs.
    pending_iflr: Vec<LogicalRecord>,
    frame_data: HashMap<ObName, Vec<FrameData>>,
    noform_list: Vec<UnformattedData>,
    end_of_data: Vec<EndOfData>,
    iflr_loaded: bool,
}

impl LogicalFile {
    fn from_records(file: Arc<[u8]>, records: Vec<LogicalRecord>, eflr_only: bool) -> Result<Self> {
        let mut tables = SideTables::default();
        let mut eflr_list = Vec::new();
        let mut pending_iflr = Vec::new();

        for record in records {
            if record.is_eflr {
                if record.encrypted {
                    eflr_list.push(ClassifiedEflr::Encrypted {
                        lr_type: record.lr_type,
                        producer_code: record.encryption_producer_code,
                    });
                    continue;
                }
                let bytes = record.body.materialize(&file);
                let classified = parse_eflr(record.lr_type, &bytes, record.offset)?;
                register_eflr(&mut tables, &classified);
                eflr_list.push(classified);
            } else {
                pending_iflr.push(record);
            }
        }

        let mut logical_file = LogicalFile {
            file,
            tables,
            eflr_list,
            pending_iflr,
            frame_data: HashMap::new(),
            noform_list: Vec::new(),
            end_of_data: Vec::new(),
            iflr_loaded: false,
        };
        if !eflr_only {
            logical_file.load_iflr()?;
        }
        Ok(logical_file)
    }

    /// Decodes every IFLR in this Logical File. Idempotent: a second call is
    /// a no-op, unlike the Python source this crate's algorithm is built
    /// from, whose `loadIFLR` re-parses and re-appends on every call.
    pub fn load_iflr(&mut self) -> Result<()> {
        if self.iflr_loaded {
            return Ok(());
        }
        for record in self.pending_iflr.drain(..) {
            let bytes = record.body.materialize(&self.file);
            if record.encrypted {
                warn!(
                    "skipping encrypted IFLR of type {} at offset {}",
                    record.lr_type, record.offset
                );
                continue;
            }
            let decoded = iflr::parse_iflr(
                record.lr_type,
                &bytes,
                record.offset,
                &self.tables.frames,
                &self.tables.channels,
                &self.tables.noform_names,
            );
            match decoded {
                Ok(Iflr::FrameData { frame, data }) => {
                    self.frame_data.entry(frame).or_insert_with(Vec::new).push(data);
                }
                Ok(Iflr::UnformattedData { data, .. }) => self.noform_list.push(data),
                Ok(Iflr::EndOfData(eod)) => self.end_of_data.push(eod),
                Ok(Iflr::Private { .. }) => {}
                Err(err) => {
                    error!("failed to decode IFLR at offset {}: {}", record.offset, err);
                }
            }
        }
        self.iflr_loaded = true;
        Ok(())
    }

    pub fn eflr_list(&self) -> &[ClassifiedEflr] {
        &self.eflr_list
    }

    pub fn frame_data(&self, frame: &ObName) -> Option<&[FrameData]> {
        self.frame_data.get(frame).map(Vec::as_slice)
    }

    pub fn noform_list(&self) -> &[UnformattedData] {
        &self.noform_list
    }

    pub fn end_of_data(&self) -> &[EndOfData] {
        &self.end_of_data
    }

    /// Names every Frame known in this Logical File's side table.
    pub fn frame_names(&self) -> impl Iterator<Item = &ObName> {
        self.tables.frames.keys()
    }

    pub fn frame_info(&self, frame: &ObName) -> Option<&FrameInfo> {
        self.tables.frames.get(frame)
    }

    pub fn channel_info(&self, channel: &ObName) -> Option<&ChannelInfo> {
        self.tables.channels.get(channel)
    }

    /// The `ID` attribute of this File's single `FILE-HEADER` object, if present.
    pub fn id(&self) -> Option<&str> {
        self.file_header_object().and_then(|o| o.attr_str("ID"))
    }

    /// The `SEQUENCE-NUMBER` attribute of this File's single `FILE-HEADER` object, if present.
    pub fn seq_num(&self) -> Option<&str> {
        self.file_header_object().and_then(|o| o.attr_str("SEQUENCE-NUMBER"))
    }

    fn file_header_object(&self) -> Option<&Object> {
        self.eflr_list.iter().find_map(|e| match e {
            ClassifiedEflr::FileHeader(g) => g.objects.first(),
            _ => None,
        })
    }
}

/// Splits the flat Logical Record sequence into Logical Files at each
/// non-encrypted `FILE-HEADER` EFLR (Logical Record type 0), classifying and
/// (unless `eflr_only`) decoding each File's records as it goes.
pub fn split_logical_files(file: Arc<[u8]>, records: Vec<LogicalRecord>, eflr_only: bool) -> Result<Vec<LogicalFile>> {
    const FILE_HEADER_TYPE: u8 = 0;

    let mut files = Vec::new();
    let mut current: Vec<LogicalRecord> = Vec::new();

    for record in records {
        if record.is_eflr && record.lr_type == FILE_HEADER_TYPE && !current.is_empty() {
            files.push(LogicalFile::from_records(file.clone(), std::mem::take(&mut current), eflr_only)?);
        }
        current.push(record);
    }
    if !current.is_empty() {
        files.push(LogicalFile::from_records(file, current, eflr_only)?);
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logical_record::RecordBody;

    fn file_header_record(offset: usize) -> LogicalRecord {
        // Set(FILE-HEADER) with no Template/Objects, nothing else.
        let mut bytes = Vec::new();
        bytes.push(0b1111_0000);
        bytes.extend(b"\x0BFILE-HEADER");
        LogicalRecord {
            is_eflr: true,
            encrypted: false,
            lr_type: 0,
            body: RecordBody::Eager(bytes),
            offset,
            encryption_producer_code: None,
        }
    }

    #[test]
    fn splits_one_logical_file_per_file_header() {
        let file: Arc<[u8]> = Arc::from(Vec::<u8>::new());
        let records = vec![file_header_record(0), file_header_record(100)];
        let files = split_logical_files(file, records, true).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn load_iflr_is_idempotent() {
        let file: Arc<[u8]> = Arc::from(Vec::<u8>::new());
        let records = vec![file_header_record(0)];
        let mut files = split_logical_files(file, records, true).unwrap();
        let lf = &mut files[0];
        assert!(lf.load_iflr().is_ok());
        assert!(lf.load_iflr().is_ok());
        assert!(lf.noform_list().is_empty());
    }
}

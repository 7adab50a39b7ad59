//
// Copyright 2024 DLIS Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Output serialization: every model entity is already `serde::Serialize`
//! and so exposes a neutral "to-document" projection for free. This module
//! is the bundled writer that stitches those projections into files: one
//! JSON document per Logical File's EFLRs, one CSV per Frame, and one
//! JSON + binary blob pair per Unformatted Data object.

use std::fs;
use std::path::Path;

use log::info;

use crate::logical_file::LogicalFile;
use crate::object::ObName;
use crate::output::cell::value_to_cell;
use crate::Slot;

mod cell;

fn csv_err(err: csv::Error) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, err)
}

/// Writes the full dump of one Logical File into `dir`: `<id>.json`,
/// `<origin>_<copy>_<identifier>.csv` per Frame with decoded Frame Data, and
/// `UnformattedDataLogicalRecords/<origin>_<copy>_<identifier>.json` +
/// `.bin` per Unformatted Data object.
pub fn dump_logical_file(lf: &LogicalFile, dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    write_eflr_document(lf, dir)?;
    write_frame_data(lf, dir)?;
    write_unformatted_data(lf, dir)?;
    Ok(())
}

fn write_eflr_document(lf: &LogicalFile, dir: &Path) -> std::io::Result<()> {
    let path = dir.join(format!("{}.json", lf.id().unwrap_or("UNKNOWN")));
    let file = fs::File::create(&path)?;
    serde_json::to_writer_pretty(file, lf.eflr_list()).map_err(|err| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, err)
    })?;
    info!("wrote {:?}", path);
    Ok(())
}

fn write_frame_data(lf: &LogicalFile, dir: &Path) -> std::io::Result<()> {
    let frame_names: Vec<ObName> = lf.frame_names().cloned().collect();
    for frame_name in frame_names {
        let data = match lf.frame_data(&frame_name) {
            Some(rows) if !rows.is_empty() => rows,
            _ => continue,
        };
        let frame = lf
            .frame_info(&frame_name)
            .expect("frame_data is only populated for known frames");

        let path = dir.join(format!("{}_{}_{}.csv", frame_name.origin, frame_name.copy, frame_name.identifier));
        let mut writer = csv::Writer::from_path(&path).map_err(csv_err)?;

        let mut header = vec!["frameNumber".to_string()];
        for channel_name in &frame.channel_names {
            let column = match lf.channel_info(channel_name).and_then(|c| c.units.as_deref()) {
                Some(units) if !units.is_empty() => format!("{}, {}", channel_name.identifier, units),
                _ => channel_name.identifier.clone(),
            };
            header.push(column);
        }
        writer.write_record(&header).map_err(csv_err)?;

        for row in data {
            let mut record = vec![row.frame_number.to_string()];
            for slot in &row.slots {
                record.push(match slot {
                    Slot::Scalar(v) => value_to_cell(v),
                    Slot::Vector(vs) => vs.iter().map(value_to_cell).collect::<Vec<_>>().join(";"),
                });
            }
            writer.write_record(&record).map_err(csv_err)?;
        }
        writer.flush()?;
        info!("wrote {:?}", path);
    }
    Ok(())
}

fn write_unformatted_data(lf: &LogicalFile, dir: &Path) -> std::io::Result<()> {
    let rows = lf.noform_list();
    if rows.is_empty() {
        return Ok(());
    }
    let udlr_dir = dir.join("UnformattedDataLogicalRecords");
    fs::create_dir_all(&udlr_dir)?;

    for row in rows {
        let stem = format!("{}_{}_{}", row.descriptor.origin, row.descriptor.copy, row.descriptor.identifier);
        let json_path = udlr_dir.join(format!("{}.json", stem));
        let blob_path = udlr_dir.join(&stem);

        #[derive(serde::Serialize)]
        struct Meta<'a> {
            #[serde(rename = "CONSUMER-NAME")]
            consumer_name: &'a Option<String>,
            #[serde(rename = "DESCRIPTION")]
            description: &'a Option<String>,
        }
        let meta = Meta { consumer_name: &row.consumer_name, description: &row.description };
        serde_json::to_writer_pretty(fs::File::create(&json_path)?, &meta)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        fs::write(&blob_path, &row.data)?;
        info!("wrote {:?} and {:?}", json_path, blob_path);
    }
    Ok(())
}

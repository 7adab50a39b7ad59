//
// Copyright 2024 DLIS Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Command-line front end: decodes one DLIS file, or every `*.DLIS`/`*.dlis`
//! file under a directory, and dumps each Logical File into its own
//! subdirectory of `--output`.

use std::path::{Path, PathBuf};

use clap::Parser;
use log::{error, info};

#[derive(Parser)]
#[clap(name = "dlisdump", author, version, about = "Decodes RP66 V1 (DLIS) well-log files")]
struct Args {
    /// File or directory to decode. Directories are walked recursively for `*.DLIS`/`*.dlis`.
    #[clap(long)]
    input: PathBuf,

    /// Directory to write decoded output into.
    #[clap(long, default_value = ".")]
    output: PathBuf,

    /// Decode only EFLRs; skip Frame Data and Unformatted Data.
    #[clap(long, default_value_t = false)]
    eflronly: bool,
}

fn is_dlis_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()).map(|ext| ext.eq_ignore_ascii_case("dlis")).unwrap_or(false)
}

fn collect_inputs(path: &Path, out: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    if path.is_dir() {
        for entry in std::fs::read_dir(path)? {
            collect_inputs(&entry?.path(), out)?;
        }
    } else if is_dlis_file(path) {
        out.push(path.to_path_buf());
    }
    Ok(())
}

/// Decodes one DLIS file and dumps its Logical Files under `output/<id>/`.
/// Errors are logged and do not abort a directory walk.
fn dump_one(input: &Path, output: &Path, eflronly: bool) -> anyhow::Result<()> {
    info!("decoding {:?}", input);
    let (_sul, logical_files) = dlis::parse(input, eflronly)?;
    for (index, lf) in logical_files.iter().enumerate() {
        let id = lf.id().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).unwrap_or_else(|| index.to_string());
        let dir = output.join(id);
        dlis::output::dump_logical_file(lf, &dir)?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut inputs = Vec::new();
    collect_inputs(&args.input, &mut inputs)?;
    if inputs.is_empty() && args.input.is_file() {
        inputs.push(args.input.clone());
    }
    if inputs.is_empty() {
        anyhow::bail!("no DLIS input found at {:?}", args.input);
    }

    std::fs::create_dir_all(&args.output)?;

    let mut failures = 0;
    for input in &inputs {
        if let Err(err) = dump_one(input, &args.output, args.eflronly) {
            error!("failed to decode {:?}: {}", input, err);
            failures += 1;
        }
    }

    if failures > 0 && failures == inputs.len() {
        anyhow::bail!("all {} input file(s) failed to decode", failures);
    }
    Ok(())
}

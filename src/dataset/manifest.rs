use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::runner::RunReport;
use crate::error::{PrepError, Result};

pub const MANIFEST_FILE: &str = "manifest.json";

/// Write the run report next to the split directories.
pub fn write_manifest(output_root: &Path, report: &RunReport) -> Result<PathBuf> {
    let path = output_root.join(MANIFEST_FILE);
    let file = File::create(&path).map_err(|e| PrepError::io(&path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.write_all(b"\n").map_err(|e| PrepError::io(&path, e))?;
    writer.flush().map_err(|e| PrepError::io(&path, e))?;
    Ok(path)
}

pub fn read_manifest(output_root: &Path) -> Result<RunReport> {
    let path = output_root.join(MANIFEST_FILE);
    let file = File::open(&path).map_err(|e| PrepError::io(&path, e))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

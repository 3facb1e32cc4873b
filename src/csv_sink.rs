// CSV Sink
// Writes the final table to a flat file. Output goes to <path>.tmp first and is
// renamed into place, so a failed run never leaves a half-written file.

use crate::error::EtlError;
use crate::model::{BankRecord, BankTable, OUTPUT_COLUMNS};
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Overwrite `path` with a header row plus one row per record
pub fn write_csv(table: &BankTable, path: &Path) -> Result<(), EtlError> {
    let tmp = tmp_path(path);

    if let Err(e) = write_rows(table, &tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        EtlError::io(format!("cannot move CSV into place at {}", path.display()), e)
    })
}

fn write_rows(table: &BankTable, path: &Path) -> Result<(), EtlError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| EtlError::io(format!("cannot create {}", path.display()), e))?;

    // Header written by hand so an empty table still gets one
    wtr.write_record(OUTPUT_COLUMNS)?;
    for record in table {
        wtr.serialize(record)?;
    }

    wtr.flush()
        .map_err(|e| EtlError::io(format!("cannot flush {}", path.display()), e))
}

/// Read a CSV produced by `write_csv` back into a table
pub fn read_csv(path: &Path) -> Result<BankTable, EtlError> {
    let mut rdr = csv::Reader::from_path(path)
        .map_err(|e| EtlError::io_at("read csv", format!("cannot open {}", path.display()), e))?;

    let mut records = Vec::new();
    for (line_num, result) in rdr.deserialize::<BankRecord>().enumerate() {
        let record = result.map_err(|e| {
            EtlError::io_at("read csv", format!("bad row at line {} of {}", line_num + 2, path.display()), e)
        })?;
        records.push(record);
    }

    Ok(BankTable::from(records))
}

/// SHA-256 of the file contents, lower-case hex
pub fn csv_digest(path: &Path) -> Result<String, EtlError> {
    let bytes = fs::read(path).map_err(|e| EtlError::io(format!("cannot read {}", path.display()), e))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

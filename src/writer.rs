use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::error;

use crate::error::{Result, YnabifyError};
use crate::models::{Transaction, OUTPUT_COLUMNS};

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Base output path: the destination as given, or `<source stem>_ynab`
/// next to the source. The source extension is kept; [`output_path`]
/// replaces it.
pub fn output_base(src: &Path, destination: Option<&Path>) -> PathBuf {
    match destination {
        Some(dest) => dest.to_path_buf(),
        None => {
            let mut name = src.file_stem().map(OsString::from).unwrap_or_default();
            name.push("_ynab");
            if let Some(ext) = src.extension() {
                name.push(".");
                name.push(ext);
            }
            src.with_file_name(name)
        }
    }
}

/// Final `.csv` path, suffixed with `_<group>` when a file holds several accounts.
pub fn output_path(base: &Path, group: Option<&str>) -> PathBuf {
    match group {
        None => base.with_extension("csv"),
        Some(group) => {
            let stem = base
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let group = group.replace(['/', '\\'], "_");
            base.with_file_name(format!("{stem}_{group}.csv"))
        }
    }
}

/// Serialize one account's transactions, BOM included.
pub fn render(transactions: &[Transaction]) -> Result<Vec<u8>> {
    let mut buf = BOM.to_vec();
    {
        let mut wtr = csv::Writer::from_writer(&mut buf);
        wtr.write_record(OUTPUT_COLUMNS)?;
        for t in transactions {
            wtr.write_record([
                t.date.format("%Y-%m-%d").to_string(),
                t.payee.clone(),
                t.memo.clone(),
                t.outflow.to_string(),
                t.inflow.to_string(),
            ])?;
        }
        wtr.flush()?;
    }
    Ok(buf)
}

/// Write `contents`, retrying while the file is locked by another program
/// (typically a spreadsheet that still has it open).
pub fn write_with_retry(
    path: &Path,
    contents: &[u8],
    attempts: u32,
    delay: Duration,
) -> Result<()> {
    retry(path, attempts, delay, || std::fs::write(path, contents))
}

fn retry(
    path: &Path,
    attempts: u32,
    delay: Duration,
    mut op: impl FnMut() -> io::Result<()>,
) -> Result<()> {
    let attempts = attempts.max(1);
    for attempt in 1..=attempts {
        match op() {
            Ok(()) => return Ok(()),
            Err(e) if is_locked(&e) => {
                error!("Cannot write to {}. Please close the file.", path.display());
                if attempt < attempts {
                    thread::sleep(delay);
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(YnabifyError::WriteLocked {
        path: path.to_path_buf(),
        attempts,
    })
}

fn is_locked(err: &io::Error) -> bool {
    // ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION
    err.kind() == io::ErrorKind::PermissionDenied
        || (cfg!(windows) && matches!(err.raw_os_error(), Some(32 | 33)))
}

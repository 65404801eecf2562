mod raiffeisen;
mod swisscard;
mod ynab;

use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{Result, YnabifyError};
use crate::models::AccountGroups;
use crate::table::{has_extension, RawTable, Row};

pub use raiffeisen::RaiffeisenCsv;
pub use swisscard::SwisscardXlsx;
pub use ynab::YnabXlsx;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let s: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '\'' | '\u{2019}' | ' '))
        .collect();
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return Decimal::from_str(inner).ok().map(|d| -d);
    }
    Decimal::from_str(&s).ok()
}

/// Parse with the format's own pattern. Spreadsheet readers render native
/// date cells as ISO dates, so those are accepted as well.
pub fn parse_date(raw: &str, pattern: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, pattern)
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

fn required<'a>(path: &Path, row: &Row<'a>, column: &str) -> Result<&'a str> {
    row.get(column).ok_or_else(|| YnabifyError::MissingValue {
        path: path.to_path_buf(),
        row: row.number(),
        column: column.to_string(),
    })
}

fn amount_cell(path: &Path, row: &Row<'_>, column: &str) -> Result<Decimal> {
    let raw = required(path, row, column)?;
    parse_amount(raw).ok_or_else(|| YnabifyError::InvalidAmount {
        path: path.to_path_buf(),
        row: row.number(),
        value: raw.to_string(),
    })
}

/// Like [`amount_cell`], but an empty cell counts as zero.
fn optional_amount_cell(path: &Path, row: &Row<'_>, column: &str) -> Result<Decimal> {
    match row.get(column) {
        None => Ok(Decimal::ZERO),
        Some(_) => amount_cell(path, row, column),
    }
}

fn date_cell(path: &Path, row: &Row<'_>, column: &str, pattern: &str) -> Result<NaiveDate> {
    let raw = required(path, row, column)?;
    parse_date(raw, pattern).ok_or_else(|| YnabifyError::InvalidDate {
        path: path.to_path_buf(),
        row: row.number(),
        value: raw.to_string(),
    })
}

/// Common applicability gate: extension, existence, loadable table.
/// Load failures mean "not this format", never an error.
fn sniff(
    path: &Path,
    ext: &str,
    load: impl FnOnce(&Path) -> Result<RawTable>,
) -> Option<RawTable> {
    if !has_extension(path, ext) || !path.exists() {
        return None;
    }
    match load(path) {
        Ok(table) => {
            debug!(
                "{}: {} rows, columns {:?}",
                path.display(),
                table.len(),
                table.headers()
            );
            Some(table)
        }
        Err(e) => {
            debug!("{} could not be loaded as {ext}: {e}", path.display());
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Importer kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImporterKind {
    SwisscardXlsx,
    RaiffeisenCsv,
    YnabXlsx,
}

impl ImporterKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::SwisscardXlsx => "swisscard_xlsx",
            Self::RaiffeisenCsv => "raiffeisen_csv",
            Self::YnabXlsx => "ynab_xlsx",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SwisscardXlsx => "Swisscard credit card (XLSX)",
            Self::RaiffeisenCsv => "Raiffeisen account statement (CSV)",
            Self::YnabXlsx => "YNAB-formatted spreadsheet (XLSX)",
        }
    }

    pub fn can_parse(&self, file_path: &Path) -> bool {
        match self {
            Self::SwisscardXlsx => SwisscardXlsx::can_parse(file_path),
            Self::RaiffeisenCsv => RaiffeisenCsv::can_parse(file_path),
            Self::YnabXlsx => YnabXlsx::can_parse(file_path),
        }
    }

    pub fn open(&self, file_path: &Path) -> Result<Importer> {
        Ok(match self {
            Self::SwisscardXlsx => Importer::Swisscard(SwisscardXlsx::new(file_path)?),
            Self::RaiffeisenCsv => Importer::Raiffeisen(RaiffeisenCsv::new(file_path)?),
            Self::YnabXlsx => Importer::Ynab(YnabXlsx::new(file_path)?),
        })
    }
}

/// Detection order; the first importer that accepts a file wins.
pub const ALL_IMPORTERS: &[ImporterKind] = &[
    ImporterKind::SwisscardXlsx,
    ImporterKind::RaiffeisenCsv,
    ImporterKind::YnabXlsx,
];

pub fn get_by_key(key: &str) -> Option<ImporterKind> {
    ALL_IMPORTERS.iter().find(|i| i.key() == key).copied()
}

pub fn get_for_file(file_path: &Path) -> Option<ImporterKind> {
    ALL_IMPORTERS.iter().copied().find(|imp| {
        let accepted = imp.can_parse(file_path);
        let verdict = if accepted { "accepted" } else { "rejected" };
        debug!("{}: {} {verdict}", imp.key(), file_path.display());
        accepted
    })
}

/// A constructed importer owning its loaded table.
#[derive(Debug)]
pub enum Importer {
    Swisscard(SwisscardXlsx),
    Raiffeisen(RaiffeisenCsv),
    Ynab(YnabXlsx),
}

impl Importer {
    pub fn kind(&self) -> ImporterKind {
        match self {
            Self::Swisscard(_) => ImporterKind::SwisscardXlsx,
            Self::Raiffeisen(_) => ImporterKind::RaiffeisenCsv,
            Self::Ynab(_) => ImporterKind::YnabXlsx,
        }
    }

    pub fn transactions(&self) -> Result<AccountGroups> {
        match self {
            Self::Swisscard(p) => p.transactions(),
            Self::Raiffeisen(p) => p.transactions(),
            Self::Ynab(p) => p.transactions(),
        }
    }
}

use std::path::{Path, PathBuf};

use crate::error::{Result, YnabifyError};
use crate::models::{main_group, AccountGroups, Transaction};
use crate::table::{load_xlsx, RawTable};

use super::{date_cell, optional_amount_cell, required, sniff};

const DATE: &str = "Date";
const MEMO: &str = "Memo";
const OUTFLOW: &str = "Outflow";
const INFLOW: &str = "Inflow";
const REQUIRED_COLUMNS: [&str; 4] = [DATE, MEMO, OUTFLOW, INFLOW];

const DATE_FORMAT: &str = "%d.%m.%Y";

/// A spreadsheet already laid out in YNAB columns. Any `Payee` column is
/// ignored; payees are always derived from the memo.
#[derive(Debug)]
pub struct YnabXlsx {
    path: PathBuf,
    table: RawTable,
}

impl YnabXlsx {
    fn detect(path: &Path) -> Option<RawTable> {
        sniff(path, "xlsx", load_xlsx).filter(|table| table.has_columns(&REQUIRED_COLUMNS))
    }

    pub fn can_parse(path: &Path) -> bool {
        Self::detect(path).is_some()
    }

    pub fn new(path: &Path) -> Result<Self> {
        let table = Self::detect(path).ok_or_else(|| YnabifyError::Parse {
            path: path.to_path_buf(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            table,
        })
    }

    pub fn transactions(&self) -> Result<AccountGroups> {
        let mut transactions = Vec::new();
        for row in self.table.rows() {
            let date = date_cell(&self.path, &row, DATE, DATE_FORMAT)?;
            let memo = required(&self.path, &row, MEMO)?.to_string();
            let outflow = optional_amount_cell(&self.path, &row, OUTFLOW)?;
            let inflow = optional_amount_cell(&self.path, &row, INFLOW)?;
            // Net the two columns so at most one side survives.
            transactions.push(Transaction::from_signed(date, memo, outflow - inflow));
        }
        Ok(main_group(transactions))
    }
}

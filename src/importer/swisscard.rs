use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, YnabifyError};
use crate::models::{main_group, AccountGroups, Transaction};
use crate::table::{load_xlsx, RawTable};

use super::{amount_cell, date_cell, required, sniff};

/// Header set of one export language, addressed by logical role.
#[derive(Debug)]
pub struct Columns {
    pub date: &'static str,
    pub description: &'static str,
    pub amount: &'static str,
    pub status: &'static str,
    /// Status value of booked (not pending) transactions.
    pub posted: &'static str,
    pub date_format: &'static str,
}

impl Columns {
    pub fn required(&self) -> [&'static str; 4] {
        [self.date, self.description, self.amount, self.status]
    }
}

const GERMAN: Columns = Columns {
    date: "Transaktionsdatum",
    description: "Beschreibung",
    amount: "Betrag",
    status: "Status",
    posted: "Gebucht",
    date_format: "%d.%m.%Y",
};

const ENGLISH: Columns = Columns {
    date: "Transaction date",
    description: "Description",
    amount: "Amount",
    status: "Status",
    posted: "Posted",
    date_format: "%d.%m.%Y",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    German,
    English,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::German, Language::English];

    pub fn columns(self) -> &'static Columns {
        match self {
            Self::German => &GERMAN,
            Self::English => &ENGLISH,
        }
    }

    /// First variant whose whole header set is present.
    fn matching(table: &RawTable) -> Option<Language> {
        Self::ALL
            .into_iter()
            .find(|lang| table.has_columns(&lang.columns().required()))
    }

    pub fn resolve(table: &RawTable, path: &Path) -> Result<Language> {
        Self::matching(table).ok_or_else(|| YnabifyError::Language {
            path: path.to_path_buf(),
        })
    }
}

/// Swisscard credit card export. One row per transaction, positive
/// amounts are charges.
#[derive(Debug)]
pub struct SwisscardXlsx {
    path: PathBuf,
    table: RawTable,
    language: Language,
}

impl SwisscardXlsx {
    fn detect(path: &Path) -> Option<RawTable> {
        sniff(path, "xlsx", load_xlsx).filter(|table| Language::matching(table).is_some())
    }

    pub fn can_parse(path: &Path) -> bool {
        Self::detect(path).is_some()
    }

    pub fn new(path: &Path) -> Result<Self> {
        let table = Self::detect(path).ok_or_else(|| YnabifyError::Parse {
            path: path.to_path_buf(),
        })?;
        Self::from_table(path, table)
    }

    pub fn from_table(path: &Path, table: RawTable) -> Result<Self> {
        let language = Language::resolve(&table, path)?;
        debug!("{}: {language:?} headers", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            table,
            language,
        })
    }

    #[cfg(test)]
    pub fn language(&self) -> Language {
        self.language
    }

    pub fn transactions(&self) -> Result<AccountGroups> {
        let cols = self.language.columns();
        let mut transactions = Vec::new();
        for row in self.table.rows() {
            if row.get(cols.status) != Some(cols.posted) {
                continue;
            }
            let date = date_cell(&self.path, &row, cols.date, cols.date_format)?;
            let memo = required(&self.path, &row, cols.description)?.to_string();
            let amount = amount_cell(&self.path, &row, cols.amount)?;
            transactions.push(Transaction::from_signed(date, memo, amount));
        }
        Ok(main_group(transactions))
    }
}

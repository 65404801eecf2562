use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{Result, YnabifyError};
use crate::models::{empty_groups, AccountGroups, Transaction};
use crate::table::{load_csv, RawTable};

use super::{amount_cell, parse_date, required, sniff};

const IBAN: &str = "IBAN";
const BOOKED_AT: &str = "Booked At";
const TEXT: &str = "Text";
const AMOUNT: &str = "Credit/Debit Amount";
const REQUIRED_COLUMNS: [&str; 4] = [IBAN, BOOKED_AT, TEXT, AMOUNT];

const DELIMITER: u8 = b';';

/// Raiffeisen e-banking CSV export.
///
/// A booking row carries the IBAN; rows below it without an IBAN are
/// details (e.g. the individual payments of a collective order) and are
/// folded into the booking's memo. Several accounts may be interleaved.
#[derive(Debug)]
pub struct RaiffeisenCsv {
    path: PathBuf,
    table: RawTable,
}

impl RaiffeisenCsv {
    fn detect(path: &Path) -> Option<RawTable> {
        sniff(path, "csv", |p| load_csv(p, DELIMITER))
            .filter(|table| table.has_columns(&REQUIRED_COLUMNS))
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

    #[cfg(test)]
    pub fn from_table(path: &Path, table: RawTable) -> Self {
        Self {
            path: path.to_path_buf(),
            table,
        }
    }

    /// Walks the rows bottom-up, accumulating detail text until the booking
    /// row above it closes the transaction. Detail rows above the first
    /// booking row belong to nothing and are dropped with a warning.
    pub fn transactions(&self) -> Result<AccountGroups> {
        if self.table.is_empty() {
            return Ok(empty_groups());
        }
        let mut groups = AccountGroups::new();
        let mut memo: Option<String> = None;

        for row in self.table.rows().rev() {
            let Some(iban) = row.get(IBAN) else {
                if let Some(detail) = row.get(TEXT) {
                    memo = Some(prepend(detail, memo.take()));
                }
                continue;
            };

            let text = required(&self.path, &row, TEXT)?;
            let folded = prepend(text, memo.take());
            let booked_at = required(&self.path, &row, BOOKED_AT)?;
            let day = booked_at.get(..10).unwrap_or(booked_at);
            let date = parse_date(day, "%Y-%m-%d").ok_or_else(|| YnabifyError::InvalidDate {
                path: self.path.clone(),
                row: row.number(),
                value: booked_at.to_string(),
            })?;
            let amount = amount_cell(&self.path, &row, AMOUNT)?;

            groups
                .entry(iban.to_string())
                .or_insert_with(Vec::new)
                .push(Transaction::from_signed(date, folded, amount));
        }

        if let Some(dropped) = memo {
            warn!(
                "{}: detail rows before the first booking were dropped: {dropped}",
                self.path.display()
            );
        }

        if groups.is_empty() {
            return Ok(empty_groups());
        }
        for transactions in groups.values_mut() {
            transactions.reverse();
        }
        Ok(groups)
    }
}

fn prepend(text: &str, rest: Option<String>) -> String {
    match rest {
        Some(rest) => format!("{text}, {rest}"),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::tests::{dec, RAIFFEISEN_CSV};
    use crate::models::MAIN_ACCOUNT;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    const HEADER: &str = "IBAN;Booked At;Text;Credit/Debit Amount\n";

    fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn cells(row: &[&str]) -> Vec<Option<String>> {
        row.iter().map(|c| Some(c.to_string())).collect()
    }

    fn in_memory(rows: &[&[&str]]) -> RaiffeisenCsv {
        let table = RawTable::new(
            REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows.iter().map(|r| cells(r)).collect(),
        );
        RaiffeisenCsv::from_table(Path::new("statement.csv"), table)
    }

    #[test]
    fn test_can_parse_rejects() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!RaiffeisenCsv::can_parse(&dir.path().join("missing.csv")));

        let txt = write_csv(dir.path(), "statement.txt", RAIFFEISEN_CSV);
        assert!(!RaiffeisenCsv::can_parse(&txt));

        let empty = write_csv(dir.path(), "empty.csv", "");
        assert!(!RaiffeisenCsv::can_parse(&empty));

        let other = write_csv(dir.path(), "other.csv", "Date;Text;Amount\n2024-01-01;x;1\n");
        assert!(!RaiffeisenCsv::can_parse(&other));
    }

    #[test]
    fn test_can_parse_uppercase_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "STATEMENT.CSV", RAIFFEISEN_CSV);
        assert!(RaiffeisenCsv::can_parse(&path));
    }

    #[test]
    fn test_new_rejects_unparseable_file() {
        let dir = tempfile::tempdir().unwrap();
        let txt = write_csv(dir.path(), "foreign.txt", "hello");
        assert!(matches!(
            RaiffeisenCsv::new(&txt),
            Err(YnabifyError::Parse { .. })
        ));
    }

    #[test]
    fn test_groups_by_iban_and_folds_details() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "statement.csv", RAIFFEISEN_CSV);
        let groups = RaiffeisenCsv::new(&path).unwrap().transactions().unwrap();

        assert_eq!(groups.len(), 2);
        let main = &groups["CH1234567890123456789"];
        assert_eq!(main.len(), 3);
        assert_eq!(groups["CH1234567890123456788"].len(), 1);

        // File order is preserved within an account.
        assert_eq!(main[0].memo, "Coop Pronto Bern");
        assert_eq!(main[0].date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(main[1].memo, "Collective order, Rent March, Electricity Q1");
        assert_eq!(main[1].date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(main[2].memo, "Migros Zuerich");

        for t in main {
            assert!(!t.memo.is_empty());
            assert!(t.inflow >= Decimal::ZERO && t.outflow >= Decimal::ZERO);
            assert!(t.inflow.is_zero() || t.outflow.is_zero());
        }
        assert_eq!(main[0].inflow, dec("12.50"));
        assert_eq!(groups["CH1234567890123456788"][0].outflow, dec("6400.00"));
    }

    #[test]
    fn test_folding_two_bookings_with_detail() {
        let parser = in_memory(&[
            &["CHX", "2024-03-02 00:00:00.0", "newer", "-5"],
            &["", "", "fee", ""],
            &["CHX", "2024-03-01 00:00:00.0", "older", "-3"],
        ]);
        let groups = parser.transactions().unwrap();
        let txns = &groups["CHX"];
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].memo, "newer, fee");
        assert_eq!(txns[0].inflow, dec("5"));
        assert_eq!(txns[1].memo, "older");
        assert_eq!(txns[1].inflow, dec("3"));
    }

    #[test]
    fn test_leading_detail_rows_are_dropped() {
        let parser = in_memory(&[
            &["", "", "orphan detail", ""],
            &["CHX", "2024-03-01 00:00:00.0", "booking", "7.10"],
        ]);
        let groups = parser.transactions().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups["CHX"].len(), 1);
        assert_eq!(groups["CHX"][0].memo, "booking");
        assert_eq!(groups["CHX"][0].outflow, dec("7.10"));
    }

    #[test]
    fn test_only_detail_rows_yield_empty_main() {
        let parser = in_memory(&[&["", "", "orphan", ""]]);
        let groups = parser.transactions().unwrap();
        assert_eq!(groups.len(), 1);
        assert!(groups[MAIN_ACCOUNT].is_empty());
    }

    #[test]
    fn test_header_only_file_yields_empty_main() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "empty_bill.csv", HEADER);
        let groups = RaiffeisenCsv::new(&path).unwrap().transactions().unwrap();
        assert_eq!(groups.len(), 1);
        assert!(groups[MAIN_ACCOUNT].is_empty());
    }

    #[test]
    fn test_bad_booked_at_aborts() {
        let parser = in_memory(&[&["CHX", "05.03.2024", "booking", "1.00"]]);
        match parser.transactions() {
            Err(YnabifyError::InvalidDate { row, value, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(value, "05.03.2024");
            }
            other => panic!("expected invalid date, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_amount_aborts() {
        let parser = in_memory(&[&["CHX", "2024-03-05", "booking", ""]]);
        assert!(matches!(
            parser.transactions(),
            Err(YnabifyError::MissingValue { .. })
        ));
    }

    #[test]
    fn test_booking_without_text_aborts() {
        let parser = in_memory(&[
            &["CHX", "2024-03-02 00:00:00.0", "", "-5"],
            &["", "", "fee", ""],
        ]);
        match parser.transactions() {
            Err(YnabifyError::MissingValue { row, column, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(column, TEXT);
            }
            other => panic!("expected missing value, got {other:?}"),
        }
    }

    #[test]
    fn test_detail_without_text_is_skipped() {
        let parser = in_memory(&[
            &["CHX", "2024-03-02 00:00:00.0", "newer", "-5"],
            &["", "2024-03-02 00:00:00.0", "", ""],
            &["", "", "fee", ""],
            &["", "", "", "0.00"],
        ]);
        let txns = &parser.transactions().unwrap()["CHX"];
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].memo, "newer, fee");
    }

    #[test]
    fn test_zero_amount_is_kept() {
        let parser = in_memory(&[&["CHX", "2024-03-05", "fee waived", "0.00"]]);
        let txns = &parser.transactions().unwrap()["CHX"];
        assert_eq!(txns.len(), 1);
        assert!(txns[0].inflow.is_zero() && txns[0].outflow.is_zero());
    }
}

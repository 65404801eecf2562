use std::path::Path;

use calamine::{Data, Reader};
use chrono::NaiveDate;

use crate::error::{Result, YnabifyError};

/// A loaded statement: a header row plus string cells, `None` for empty cells.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

/// Borrowed view of one data row, addressed by column name.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a RawTable,
    cells: &'a [Option<String>],
    index: usize,
}

impl<'a> Row<'a> {
    /// Cell value, `None` when the cell is empty or the column is unknown.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.table.column_index(column)?;
        self.cells.get(idx)?.as_deref()
    }

    /// 1-based data row number, for error messages.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row.into_iter()
                    .map(|cell| cell.filter(|v| !v.is_empty()))
                    .collect::<Vec<_>>()
            })
            .filter(|row| row.iter().any(Option::is_some))
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    pub fn has_columns(&self, columns: &[&str]) -> bool {
        columns.iter().all(|c| self.has_column(c))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[cfg(test)]
    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        let cells = self.rows.get(index)?;
        Some(Row {
            table: self,
            cells,
            index,
        })
    }

    pub fn rows(&self) -> impl DoubleEndedIterator<Item = Row<'_>> + ExactSizeIterator {
        self.rows.iter().enumerate().map(move |(index, cells)| Row {
            table: self,
            cells,
            index,
        })
    }

    fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

/// Load by extension: `.csv` as comma-delimited text, anything else as a workbook.
pub fn load(path: &Path) -> Result<RawTable> {
    if has_extension(path, "csv") {
        load_csv(path, b',')
    } else {
        load_xlsx(path)
    }
}

pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .map_or(false, |e| e.eq_ignore_ascii_case(ext))
}

/// Load a delimited text file. The first record is the header.
pub fn load_csv(path: &Path, delimiter: u8) -> Result<RawTable> {
    let bytes = std::fs::read(path)?;
    let text = decode(&bytes);

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(YnabifyError::EmptySource {
            path: path.to_path_buf(),
        });
    }

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(|f| Some(f.to_string())).collect());
    }
    Ok(RawTable::new(headers, rows))
}

/// Statements come either as UTF-8 (optionally with a BOM) or as Windows-1252.
fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            text.into_owned()
        }
    }
}

/// Load the first worksheet of a workbook. The first row is the header.
pub fn load_xlsx(path: &Path) -> Result<RawTable> {
    let workbook_err = |message: String| YnabifyError::Workbook {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook =
        calamine::open_workbook_auto(path).map_err(|e| workbook_err(e.to_string()))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| workbook_err(e.to_string()))?,
        None => {
            return Err(YnabifyError::EmptySource {
                path: path.to_path_buf(),
            })
        }
    };

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Err(YnabifyError::EmptySource {
            path: path.to_path_buf(),
        });
    };
    let headers: Vec<String> = header_row
        .iter()
        .map(|c| cell_to_string(c).unwrap_or_default())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(YnabifyError::EmptySource {
            path: path.to_path_buf(),
        });
    }

    let data = rows
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();
    Ok(RawTable::new(headers, data))
}

fn cell_to_string(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(f.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => {
            excel_serial_to_date(dt.as_f64()).map(|d| d.format("%Y-%m-%d").to_string())
        }
        Data::DateTimeIso(s) => Some(s.chars().take(10).collect()),
        Data::DurationIso(s) => Some(s.clone()),
        _ => None,
    }
}

pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::Duration::days(serial.trunc() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    fn table(headers: &[&str], rows: &[&[Option<&str>]]) -> RawTable {
        RawTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.map(str::to_string)).collect())
                .collect(),
        )
    }

    #[test]
    fn test_row_access_by_column() {
        let t = table(&["A", "B"], &[&[Some("1"), Some("")], &[None, Some("x")]]);
        assert_eq!(t.len(), 2);
        let first = t.row(0).unwrap();
        assert_eq!(first.get("A"), Some("1"));
        assert_eq!(first.get("B"), None);
        assert_eq!(first.get("C"), None);
        assert_eq!(t.row(1).unwrap().number(), 2);
    }

    #[test]
    fn test_short_rows_are_padded_and_blank_rows_dropped() {
        let t = table(&["A", "B"], &[&[Some("1")], &[None, None], &[Some("2"), Some("3")]]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.row(0).unwrap().get("B"), None);
        let last: Vec<_> = t.rows().rev().map(|r| r.get("A")).collect();
        assert_eq!(last, vec![Some("2"), Some("1")]);
    }

    #[test]
    fn test_has_columns() {
        let t = table(&["IBAN", "Text"], &[]);
        assert!(t.has_columns(&["IBAN", "Text"]));
        assert!(!t.has_columns(&["IBAN", "Booked At"]));
        assert!(t.is_empty());
    }

    #[test]
    fn test_load_csv_semicolon() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stmt.csv");
        std::fs::write(&path, "IBAN;Text;Amount\nCH1;Coffee;-4.50\n;detail;\n").unwrap();
        let t = load_csv(&path, b';').unwrap();
        assert_eq!(t.headers(), &["IBAN", "Text", "Amount"]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.row(0).unwrap().get("Amount"), Some("-4.50"));
        assert_eq!(t.row(1).unwrap().get("IBAN"), None);
    }

    #[test]
    fn test_load_csv_strips_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.csv");
        std::fs::write(&path, "\u{feff}from,to\nmigros,Migros\n").unwrap();
        let t = load(&path).unwrap();
        assert!(t.has_column("from"));
    }

    #[test]
    fn test_load_csv_windows_1252() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ansi.csv");
        // "Zürich" with ü encoded as 0xFC
        std::fs::write(&path, b"Text\nZ\xFCrich\n").unwrap();
        let t = load_csv(&path, b';').unwrap();
        assert_eq!(t.row(0).unwrap().get("Text"), Some("Zürich"));
    }

    #[test]
    fn test_load_csv_empty_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(
            load_csv(&path, b';'),
            Err(YnabifyError::EmptySource { .. })
        ));
    }

    #[test]
    fn test_load_xlsx_renders_cells_as_strings() {
        let t = load_xlsx(&fixture("ynab.xlsx")).unwrap();
        assert_eq!(t.headers(), &["Date", "Payee", "Memo", "Outflow", "Inflow"]);
        assert_eq!(t.len(), 3);
        let first = t.row(0).unwrap();
        assert_eq!(first.get("Date"), Some("10.01.2024"));
        assert_eq!(first.get("Outflow"), Some("1850"));
        assert_eq!(first.get("Inflow"), None);
        assert_eq!(t.row(2).unwrap().get("Outflow"), Some("87.45"));
    }

    #[test]
    fn test_load_xlsx_rejects_non_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.xlsx");
        std::fs::write(&path, "not a zip").unwrap();
        assert!(matches!(
            load_xlsx(&path),
            Err(YnabifyError::Workbook { .. })
        ));
    }

    #[test]
    fn test_excel_serial_to_date() {
        assert_eq!(
            excel_serial_to_date(45667.0),
            NaiveDate::from_ymd_opt(2025, 1, 10)
        );
    }
}

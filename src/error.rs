use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum YnabifyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Cannot parse {}", .path.display())]
    Parse { path: PathBuf },

    #[error("Cannot determine the header language of {}", .path.display())]
    Language { path: PathBuf },

    #[error("{} is empty", .path.display())]
    EmptySource { path: PathBuf },

    #[error("Failed to open XLSX {}: {message}", .path.display())]
    Workbook { path: PathBuf, message: String },

    #[error("{}: row {row} has no value in column '{column}'", .path.display())]
    MissingValue {
        path: PathBuf,
        row: usize,
        column: String,
    },

    #[error("{}: row {row} has an invalid date '{value}'", .path.display())]
    InvalidDate {
        path: PathBuf,
        row: usize,
        value: String,
    },

    #[error("{}: row {row} has an invalid amount '{value}'", .path.display())]
    InvalidAmount {
        path: PathBuf,
        row: usize,
        value: String,
    },

    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error("Cannot handle file: {}", .path.display())]
    NoParser { path: PathBuf },

    #[error("Mapping {}: {message}", .path.display())]
    Mapping { path: PathBuf, message: String },

    #[error("Cannot write to {} after {attempts} attempts. Please close the file.", .path.display())]
    WriteLocked { path: PathBuf, attempts: u32 },
}

pub type Result<T> = std::result::Result<T, YnabifyError>;

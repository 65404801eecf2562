pub mod convert;

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "ynabify",
    version,
    about = "Convert bank and credit-card statement exports into YNAB import files."
)]
pub struct Cli {
    /// Statement export to convert (CSV or XLSX)
    pub src: String,

    /// Mapping table with `from`/`to` columns used to derive payees
    /// (default: ./mapping.xlsx, created from the bundled example if missing)
    #[arg(short, long)]
    pub mapping: Option<String>,

    /// Output path stem (default: <src stem>_ynab next to the source)
    #[arg(short, long)]
    pub destination: Option<String>,

    /// Importer format key, skipping detection (swisscard_xlsx, raiffeisen_csv, ynab_xlsx)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Log debug output
    #[arg(short, long)]
    pub verbose: bool,
}

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Account key used when a source format has no account column of its own.
pub const MAIN_ACCOUNT: &str = "main";

/// Column order of the YNAB import file.
pub const OUTPUT_COLUMNS: [&str; 5] = ["Date", "Payee", "Memo", "Outflow", "Inflow"];

/// One normalized transaction, as every importer hands it to the writer.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub payee: String,
    pub memo: String,
    pub inflow: Decimal,
    pub outflow: Decimal,
}

impl Transaction {
    /// Build a transaction from a signed statement amount.
    ///
    /// Negative amounts become inflow, positive amounts outflow. Both sides
    /// are zero only for a zero amount.
    pub fn from_signed(date: NaiveDate, memo: String, amount: Decimal) -> Self {
        let (inflow, outflow) = if amount < Decimal::ZERO {
            (-amount, Decimal::ZERO)
        } else if amount > Decimal::ZERO {
            (Decimal::ZERO, amount)
        } else {
            (Decimal::ZERO, Decimal::ZERO)
        };
        Self {
            date,
            payee: String::new(),
            memo,
            inflow,
            outflow,
        }
    }
}

/// Transactions keyed by account identifier, each list in file order.
pub type AccountGroups = BTreeMap<String, Vec<Transaction>>;

/// Everything under the single `"main"` key.
pub fn main_group(transactions: Vec<Transaction>) -> AccountGroups {
    let mut groups = AccountGroups::new();
    groups.insert(MAIN_ACCOUNT.to_string(), transactions);
    groups
}

/// The result for a file that produced no transactions.
pub fn empty_groups() -> AccountGroups {
    main_group(Vec::new())
}

/// A `from` → `to` row of the mapping table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionRule {
    pub from: String,
    pub to: String,
}

impl SubstitutionRule {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

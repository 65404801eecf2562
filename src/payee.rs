use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, YnabifyError};
use crate::models::{AccountGroups, SubstitutionRule};
use crate::table::{self, has_extension};

const EXAMPLE_MAPPING_XLSX: &[u8] = include_bytes!("../assets/mapping_example.xlsx");
const EXAMPLE_MAPPING_CSV: &str = include_str!("../assets/mapping_example.csv");

fn matches(text: &str, pattern: &str) -> bool {
    !pattern.is_empty() && text.to_lowercase().contains(&pattern.to_lowercase())
}

/// Replacement of the longest rule pattern found in `text` (case-insensitive).
///
/// Equal-length matches go to the rule listed first. Returns an empty string
/// when nothing matches.
pub fn resolve(text: &str, rules: &[SubstitutionRule]) -> String {
    let mut best: Option<(usize, &SubstitutionRule)> = None;
    for rule in rules {
        if !matches(text, &rule.from) {
            continue;
        }
        let len = rule.from.chars().count();
        if best.map_or(true, |(best_len, _)| len > best_len) {
            best = Some((len, rule));
        }
    }
    best.map(|(_, rule)| rule.to.clone()).unwrap_or_default()
}

/// Fill every transaction's payee from its memo.
pub fn annotate(groups: &mut AccountGroups, rules: &[SubstitutionRule]) {
    for transaction in groups.values_mut().flatten() {
        transaction.payee = resolve(&transaction.memo, rules);
    }
}

/// Read the `from`/`to` mapping table (`.xlsx` or `.csv`).
pub fn load_rules(path: &Path) -> Result<Vec<SubstitutionRule>> {
    let table = table::load(path)?;
    if !table.has_columns(&["from", "to"]) {
        return Err(YnabifyError::Mapping {
            path: path.to_path_buf(),
            message: "expected columns 'from' and 'to'".to_string(),
        });
    }

    let rules: Vec<SubstitutionRule> = table
        .rows()
        .filter_map(|row| {
            let from = row.get("from")?;
            Some(SubstitutionRule::new(from, row.get("to").unwrap_or_default()))
        })
        .collect();
    debug!("Loaded {} mapping rules from {}", rules.len(), path.display());
    Ok(rules)
}

/// Write the bundled example mapping to `path` if nothing is there yet.
/// Returns whether a file was created.
pub fn seed_mapping(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    if has_extension(path, "csv") {
        std::fs::write(path, EXAMPLE_MAPPING_CSV)?;
    } else {
        std::fs::write(path, EXAMPLE_MAPPING_XLSX)?;
    }
    info!("Created example mapping at {}", path.display());
    Ok(true)
}

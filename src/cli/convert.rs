use std::path::Path;

use comfy_table::{Cell, Table};
use rust_decimal::Decimal;
use tracing::info;

use crate::error::{Result, YnabifyError};
use crate::fmt::amount;
use crate::importer::{get_by_key, get_for_file};
use crate::payee::{annotate, load_rules, resolve, seed_mapping};
use crate::settings::{load_settings, shellexpand_path};
use crate::writer::{output_base, output_path, render, write_with_retry};

pub fn run(
    src: &str,
    mapping: Option<&str>,
    destination: Option<&str>,
    format: Option<&str>,
) -> Result<()> {
    let settings = load_settings();
    let src_path = shellexpand_path(src);

    let kind = if let Some(key) = format {
        get_by_key(key).ok_or_else(|| YnabifyError::UnknownFormat(key.to_string()))?
    } else {
        get_for_file(&src_path).ok_or_else(|| YnabifyError::NoParser {
            path: src_path.clone(),
        })?
    };
    let importer = kind.open(&src_path)?;
    info!("Reading {} as {}", src_path.display(), importer.kind().name());

    let mapping_path = shellexpand_path(mapping.unwrap_or(settings.mapping.as_str()));
    seed_mapping(&mapping_path)?;
    let rules = load_rules(&mapping_path)?;

    let base = output_base(&src_path, destination.map(Path::new));
    let mut groups = importer.transactions()?;
    annotate(&mut groups, &rules);

    let multiple = groups.len() > 1;
    let mut summary = Table::new();
    summary.set_header(vec!["Account", "Name", "Transactions", "Outflow", "Inflow", "File"]);

    for (account, transactions) in &groups {
        let resolved = resolve(account, &rules);
        let name = if resolved.is_empty() { account.as_str() } else { resolved.as_str() };
        let out_path = output_path(&base, multiple.then_some(name));

        let contents = render(transactions)?;
        write_with_retry(
            &out_path,
            &contents,
            settings.write_attempts,
            settings.retry_delay(),
        )?;
        info!("Wrote to {}", out_path.display());

        let outflow: Decimal = transactions.iter().map(|t| t.outflow).sum();
        let inflow: Decimal = transactions.iter().map(|t| t.inflow).sum();
        summary.add_row(vec![
            Cell::new(account),
            Cell::new(name),
            Cell::new(transactions.len()),
            Cell::new(amount(outflow)),
            Cell::new(amount(inflow)),
            Cell::new(out_path.display()),
        ]);
    }

    println!("{summary}");
    Ok(())
}

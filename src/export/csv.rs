use crate::error::Res;
use crate::export::{Cell, Table};
use anyhow::{anyhow, Context};

/// A header row, then one row per record. Money cells use their display text.
pub(super) fn render(table: &Table) -> Res<Vec<u8>> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&table.headers)
        .context("Unable to write the CSV header")?;
    for (i, row) in table.rows.iter().enumerate() {
        writer
            .write_record(row.iter().map(Cell::text))
            .with_context(|| format!("Unable to write CSV row {i}"))?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow!("Unable to finish the CSV document: {}", e.error()))
}

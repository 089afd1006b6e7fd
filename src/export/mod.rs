//! Export adapters. Each adapter turns a `Table`, built from the current view, into a document.
//!
//! A `Table` holds exactly the visible columns, already formatted for display. The adapters only
//! lay it out: CSV, an xlsx workbook, a paginated PDF or a plain-text print view.

mod csv;
mod pdf;
mod print;
mod xlsx;

pub use print::{chart, item_chart, render as render_text};

use crate::clock::Clock;
use crate::error::{ErrorType, IntoResult, Res, Result};
use crate::model::{Amount, CustomerRecord, InventoryItem, ItemReport, Ledger, Sale};
use crate::utils;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The document formats a view can be exported to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Pdf,
    /// A plain-text table for the terminal or a printer.
    Print,
}

serde_plain::derive_display_from_serialize!(ExportFormat);
serde_plain::derive_fromstr_from_deserialize!(ExportFormat);

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Print => "txt",
        }
    }
}

/// One table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Count(u64),
    Money(Amount),
}

impl Cell {
    pub fn text(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Count(n) => n.to_string(),
            Cell::Money(a) => a.to_string(),
        }
    }

    fn is_numeric(&self) -> bool {
        !matches!(self, Cell::Text(_))
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

/// The visible columns of a view, ready to be laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub title: String,
    /// A second heading line, e.g. `Customer: Ada`.
    pub subtitle: Option<String>,
    /// The worksheet name used by the xlsx adapter.
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

const DATE_FORMAT: &str = "%Y-%m-%d";

impl Table {
    /// The sales table. A missing item shows as `Unknown` and an empty customer name as
    /// `Anonymous`.
    pub fn sales(rows: &[Sale]) -> Self {
        let rows = rows
            .iter()
            .map(|sale| {
                let customer = if sale.customer_name().is_empty() {
                    "Anonymous"
                } else {
                    sale.customer_name()
                };
                vec![
                    Cell::from(sale.item_name().unwrap_or("Unknown")),
                    Cell::from(customer),
                    Cell::Count(u64::from(sale.quantity())),
                    Cell::from(sale.sale_type().as_str()),
                    Cell::from(sale.date().format(DATE_FORMAT).to_string()),
                ]
            })
            .collect();
        Table {
            title: "Sales Report".into(),
            subtitle: None,
            sheet_name: "Sales".into(),
            headers: headers(&["Item", "Customer", "Quantity", "Sale Type", "Date"]),
            rows,
        }
    }

    /// A customer's transactions.
    pub fn ledger(ledger: &Ledger) -> Self {
        let rows = ledger
            .transactions
            .records()
            .iter()
            .map(|t| {
                let (item, price) = match &t.item {
                    Some(item) => (Cell::from(item.name.as_str()), Cell::Money(item.price)),
                    None => (Cell::from("Unknown"), Cell::from("-")),
                };
                vec![
                    Cell::from(t.date.format(DATE_FORMAT).to_string()),
                    item,
                    Cell::Count(u64::from(t.quantity)),
                    price,
                    Cell::from(t.sale_type.as_str()),
                ]
            })
            .collect();
        Table {
            title: "Customer Ledger".into(),
            subtitle: ledger
                .customer
                .as_ref()
                .map(|c| format!("Customer: {}", c.name)),
            sheet_name: "Transactions".into(),
            headers: headers(&["Date", "Item", "Quantity", "Price", "Sale Type"]),
            rows,
        }
    }

    /// The per-item report, followed by a `Total` row.
    pub fn items(items: &[ItemReport]) -> Self {
        let mut rows: Vec<Vec<Cell>> = items
            .iter()
            .map(|i| {
                vec![
                    Cell::from(i.name.as_str()),
                    Cell::from(i.description.as_str()),
                    Cell::Count(i.total_sold),
                    Cell::Money(i.revenue),
                ]
            })
            .collect();
        rows.push(vec![
            Cell::from("Total"),
            Cell::from(""),
            Cell::Count(ItemReport::units_sold(items)),
            Cell::Money(items.iter().map(|i| &i.revenue).sum()),
        ]);
        Table {
            title: "Items Sales Report".into(),
            subtitle: None,
            sheet_name: "Items".into(),
            headers: headers(&["Item", "Description", "Total Sold", "Revenue"]),
            rows,
        }
    }

    pub fn inventory(items: &[InventoryItem]) -> Self {
        let rows = items
            .iter()
            .map(|i| {
                vec![
                    Cell::from(i.id.as_str()),
                    Cell::from(i.name.as_str()),
                    Cell::from(i.description.as_str()),
                    Cell::Count(u64::from(i.quantity)),
                    Cell::Money(i.price),
                ]
            })
            .collect();
        Table {
            title: "Inventory".into(),
            subtitle: None,
            sheet_name: "Inventory".into(),
            headers: headers(&["ID", "Name", "Description", "Quantity", "Price"]),
            rows,
        }
    }

    pub fn customers(customers: &[CustomerRecord]) -> Self {
        let rows = customers
            .iter()
            .map(|c| {
                vec![
                    Cell::from(c.id.as_str()),
                    Cell::from(c.name.as_str()),
                    Cell::from(c.address.as_str()),
                    Cell::from(c.mobile.as_str()),
                ]
            })
            .collect();
        Table {
            title: "Customers".into(),
            subtitle: None,
            sheet_name: "Customers".into(),
            headers: headers(&["ID", "Name", "Address", "Mobile"]),
            rows,
        }
    }
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Lays out `table` in the given format.
pub fn render(format: ExportFormat, table: &Table) -> Result<Vec<u8>> {
    render_inner(format, table)
        .with_context(|| format!("Unable to export '{}' as {format}", table.title))
        .pub_result(ErrorType::Export)
}

fn render_inner(format: ExportFormat, table: &Table) -> Res<Vec<u8>> {
    match format {
        ExportFormat::Csv => csv::render(table),
        ExportFormat::Xlsx => xlsx::render(table),
        ExportFormat::Pdf => pdf::render(table),
        ExportFormat::Print => Ok(print::render(table).into_bytes()),
    }
}

/// `<prefix>_<timestamp>.<ext>`. The timestamp is ISO 8601 UTC with `:` replaced by `-`, e.g.
/// `sales_report_2024-03-09T14-05-00.123Z.csv`.
pub fn timestamped_name(prefix: &str, format: ExportFormat, clock: &dyn Clock) -> String {
    let stamp = clock.now().format("%Y-%m-%dT%H-%M-%S%.3fZ");
    format!("{prefix}_{stamp}.{}", format.extension())
}

/// `CustomerLedger.<ext>`.
pub fn ledger_name(format: ExportFormat) -> String {
    format!("CustomerLedger.{}", format.extension())
}

/// Renders `table` and writes it to `dir/file_name`. Returns the path written.
pub async fn write(
    format: ExportFormat,
    table: &Table,
    dir: &Path,
    file_name: &str,
) -> Result<PathBuf> {
    let bytes = render(format, table)?;
    let path = dir.join(file_name);
    debug!("Writing {} bytes to {}", bytes.len(), path.display());
    utils::write(&path, bytes)
        .await
        .pub_result(ErrorType::Filesystem)?;
    Ok(path)
}

use crate::error::Res;
use crate::export::{Cell, Table};
use anyhow::Context;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook};

const MONEY_FORMAT: &str = "$#,##0.00";

/// A single worksheet named after the table, with a bold header row. Counts and money are written
/// as numbers so that the spreadsheet can sum them.
pub(super) fn render(table: &Table) -> Res<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let money = Format::new().set_num_format(MONEY_FORMAT);

    let sheet = workbook.add_worksheet();
    sheet
        .set_name(table.sheet_name.as_str())
        .with_context(|| format!("Invalid worksheet name '{}'", table.sheet_name))?;

    for (col, header) in table.headers.iter().enumerate() {
        sheet.write_string_with_format(0, column(col)?, header.as_str(), &bold)?;
    }

    for (i, cells) in table.rows.iter().enumerate() {
        let row = u32::try_from(i + 1).context("Too many rows for a worksheet")?;
        for (col, cell) in cells.iter().enumerate() {
            let col = column(col)?;
            match cell {
                Cell::Text(s) => sheet.write_string(row, col, s.as_str())?,
                Cell::Count(n) => sheet.write_number(row, col, *n as f64)?,
                Cell::Money(a) => sheet.write_number_with_format(
                    row,
                    col,
                    a.rounded().to_f64().unwrap_or_default(),
                    &money,
                )?,
            };
        }
    }
    sheet.autofit();

    workbook
        .save_to_buffer()
        .context("Unable to build the xlsx workbook")
}

fn column(i: usize) -> Res<u16> {
    u16::try_from(i).context("Too many columns for a worksheet")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SaleType;
    use crate::report::tests::sale;

    #[test]
    fn test_xlsx_is_a_zip_document() {
        let table = Table::sales(&[sale("1", Some("Lamp"), "Ada", 2, "2024-01-02", SaleType::Cash)]);
        let bytes = render(&table).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_invalid_sheet_name_is_an_error() {
        let mut table = Table::sales(&[]);
        table.sheet_name = "bad/name".into();
        assert!(render(&table).is_err());
    }
}

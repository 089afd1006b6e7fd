use crate::export::{Cell, Table};
use crate::model::ItemReport;
use crate::report::ChartBucket;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt::Write;

const BAR_WIDTH: u64 = 40;

/// A fixed-width, pipe-delimited table. Numeric columns are right-aligned.
///
/// ```text
/// Sales Report
///
/// | Item | Customer | Quantity | Sale Type | Date       |
/// |------|----------|----------|-----------|------------|
/// | Lamp | Ada      |        2 | Cash      | 2024-01-02 |
/// ```
pub fn render(table: &Table) -> String {
    let rows: Vec<Vec<(String, bool)>> = table
        .rows
        .iter()
        .map(|r| r.iter().map(|c| (c.text(), c.is_numeric())).collect())
        .collect();

    let mut widths: Vec<usize> = table.headers.iter().map(|h| width(h)).collect();
    for row in &rows {
        for (i, (text, _)) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(width(text));
            }
        }
    }

    let mut out = String::new();
    out.push_str(&table.title);
    out.push('\n');
    if let Some(subtitle) = &table.subtitle {
        out.push_str(subtitle);
        out.push('\n');
    }
    out.push('\n');

    let header: Vec<(String, bool)> = table.headers.iter().map(|h| (h.clone(), false)).collect();
    line(&mut out, &header, &widths);
    out.push('|');
    for w in &widths {
        out.push_str(&"-".repeat(w + 2));
        out.push('|');
    }
    out.push('\n');

    if rows.is_empty() {
        out.push_str("(no records)\n");
    }
    for row in &rows {
        line(&mut out, row, &widths);
    }
    out
}

fn line(out: &mut String, cells: &[(String, bool)], widths: &[usize]) {
    out.push('|');
    for (i, w) in widths.iter().enumerate() {
        let (text, numeric) = cells
            .get(i)
            .map(|(t, n)| (t.as_str(), *n))
            .unwrap_or(("", false));
        let pad = " ".repeat(w.saturating_sub(width(text)));
        if numeric {
            let _ = write!(out, " {pad}{text} |");
        } else {
            let _ = write!(out, " {text}{pad} |");
        }
    }
    out.push('\n');
}

fn width(s: &str) -> usize {
    s.chars().count()
}

/// A horizontal bar chart of quantity per period, scaled so the largest bar is 40 characters.
pub fn chart(buckets: &[ChartBucket]) -> String {
    if buckets.is_empty() {
        return "(no sales in range)\n".to_string();
    }
    let max = buckets.iter().map(|b| b.total_quantity).max().unwrap_or(0);
    let key_width = buckets.iter().map(|b| width(&b.period_key)).max().unwrap_or(0);

    let mut out = String::new();
    for b in buckets {
        let bar = count_bar(b.total_quantity, max);
        let _ = writeln!(
            out,
            "{:<key_width$} | {bar} {}",
            b.period_key, b.total_quantity
        );
    }
    out
}

/// Units sold and revenue per item, as two bars each. The two series are scaled separately, each
/// so that its largest bar is 40 characters.
///
/// ```text
/// Lamp  | Sold    ######################################## 6
///       | Revenue ############## $149.94
/// ```
pub fn item_chart(items: &[ItemReport]) -> String {
    if items.is_empty() {
        return "(no items sold)\n".to_string();
    }
    let max_sold = items.iter().map(|i| i.total_sold).max().unwrap_or(0);
    let max_revenue = items
        .iter()
        .map(|i| i.revenue.value())
        .max()
        .unwrap_or(Decimal::ZERO);
    let name_width = items.iter().map(|i| width(&i.name)).max().unwrap_or(0);

    let mut out = String::new();
    for item in items {
        let sold = count_bar(item.total_sold, max_sold);
        let revenue = money_bar(item.revenue.value(), max_revenue);
        let _ = writeln!(
            out,
            "{:<name_width$} | Sold    {sold} {}",
            item.name, item.total_sold
        );
        let _ = writeln!(out, "{:<name_width$} | Revenue {revenue} {}", "", item.revenue);
    }
    out
}

fn count_bar(value: u64, max: u64) -> String {
    let len = (u128::from(value) * u128::from(BAR_WIDTH)).div_ceil(u128::from(max.max(1)));
    "#".repeat(usize::try_from(len).unwrap_or(0))
}

fn money_bar(value: Decimal, max: Decimal) -> String {
    if value <= Decimal::ZERO || max <= Decimal::ZERO {
        return String::new();
    }
    let len = value
        .checked_div(max)
        .and_then(|share| share.checked_mul(Decimal::from(BAR_WIDTH)))
        .map(|len| len.ceil())
        .and_then(|len| len.to_usize())
        .unwrap_or(0);
    "#".repeat(len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SaleType;
    use crate::report::tests::sale;

    #[test]
    fn test_print_layout() {
        let table = Table::sales(&[
            sale("1", Some("Lamp"), "Ada", 2, "2024-01-02", SaleType::Cash),
            sale("2", None, "", 12, "2024-01-03", SaleType::Online),
        ]);
        let expected = "\
Sales Report

| Item    | Customer  | Quantity | Sale Type | Date       |
|---------|-----------|----------|-----------|------------|
| Lamp    | Ada       |        2 | Cash      | 2024-01-02 |
| Unknown | Anonymous |       12 | Online    | 2024-01-03 |
";
        assert_eq!(render(&table), expected);
    }

    #[test]
    fn test_print_empty_table() {
        let text = render(&Table::sales(&[]));
        assert!(text.ends_with("(no records)\n"), "{text}");
    }

    #[test]
    fn test_print_subtitle() {
        let mut table = Table::sales(&[]);
        table.subtitle = Some("Customer: Ada".into());
        assert!(render(&table).starts_with("Sales Report\nCustomer: Ada\n\n|"));
    }

    #[test]
    fn test_chart() {
        let buckets = vec![
            ChartBucket {
                period_key: "2024-01".into(),
                total_quantity: 10,
            },
            ChartBucket {
                period_key: "2024-02".into(),
                total_quantity: 5,
            },
        ];
        let text = chart(&buckets);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], format!("2024-01 | {} 10", "#".repeat(40)));
        assert_eq!(lines[1], format!("2024-02 | {} 5", "#".repeat(20)));
    }

    #[test]
    fn test_empty_chart() {
        assert_eq!(chart(&[]), "(no sales in range)\n");
    }

    fn item(name: &str, sold: u64, revenue: &str) -> ItemReport {
        ItemReport {
            id: name.to_lowercase(),
            name: name.into(),
            description: String::new(),
            total_sold: sold,
            revenue: revenue.parse().unwrap(),
        }
    }

    #[test]
    fn test_item_chart_layout() {
        let text = item_chart(&[item("Lamp", 6, "149.94"), item("Chair", 3, "448.5")]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                format!("Lamp  | Sold    {} 6", "#".repeat(40)),
                // 149.94 / 448.5 of 40 is 13.37, rounded up
                format!("      | Revenue {} $149.94", "#".repeat(14)),
                format!("Chair | Sold    {} 3", "#".repeat(20)),
                format!("      | Revenue {} $448.50", "#".repeat(40)),
            ]
        );
    }

    #[test]
    fn test_item_chart_extremes() {
        assert_eq!(item_chart(&[]), "(no items sold)\n");
        let text = item_chart(&[item("Bulk", u64::MAX, "0"), item("One", 1, "-5")]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], format!("Bulk | Sold    {} {}", "#".repeat(40), u64::MAX));
        assert_eq!(lines[1], "     | Revenue  $0.00");
        assert_eq!(lines[2], "One  | Sold    # 1");
        assert_eq!(lines[3], "     | Revenue  -$5.00");
    }
}

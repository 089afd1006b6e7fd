//! The sales report pipeline: filter, then sort, then bucket by period.
//!
//! Everything here is pure. Sales arrive already validated, so none of these functions can fail.

mod bucket;
mod filter;
mod sort;

pub use bucket::{aggregate, period_key, ChartBucket, ChartPeriod};
pub use filter::filter;
pub use sort::{compare, sort, SortDirection, SortKey, SortState};

use crate::model::Sale;
use serde::Serialize;

/// What the user asked to see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportQuery {
    pub filter: String,
    pub sort: SortState,
    pub period: ChartPeriod,
}

/// The derived table rows and chart buckets for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesView {
    pub rows: Vec<Sale>,
    pub buckets: Vec<ChartBucket>,
    pub total_quantity: u64,
}

/// Applies `query` to `sales`. Buckets are computed from the filtered rows, so the chart always
/// agrees with the table. Sorting does not change the buckets.
pub fn derive_view(sales: &[Sale], query: &ReportQuery) -> SalesView {
    let mut rows = filter(sales, &query.filter);
    if let Some(key) = query.sort.key() {
        sort(&mut rows, key, query.sort.direction());
    }
    let buckets = aggregate(&rows, query.period);
    let total_quantity = rows.iter().map(|s| u64::from(s.quantity())).sum();
    SalesView {
        rows,
        buckets,
        total_quantity,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{Amount, SaleItem, SaleType};
    use chrono::NaiveDate;

    /// Builds a sale for tests. `item` is the item name, or `None` for a missing item.
    pub(crate) fn sale(
        id: &str,
        item: Option<&str>,
        customer: &str,
        quantity: u32,
        date: &str,
        sale_type: SaleType,
    ) -> Sale {
        let item = item.map(|name| SaleItem {
            id: format!("item-{name}"),
            name: name.to_string(),
            description: String::new(),
            price: Amount::new(rust_decimal::Decimal::from(10)),
        });
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        Sale::new(id, item, quantity, date, sale_type, customer)
    }

    pub(crate) fn ids(sales: &[Sale]) -> Vec<&str> {
        sales.iter().map(|s| s.id()).collect()
    }

    fn fixture() -> Vec<Sale> {
        vec![
            sale("1", Some("Lamp"), "Ada", 2, "2024-01-02", SaleType::Cash),
            sale("2", Some("Desk"), "Linus", 3, "2024-01-03", SaleType::Card),
            sale("3", None, "Ada", 4, "2024-02-04", SaleType::Customer),
        ]
    }

    #[test]
    fn test_monthly_view() {
        let query = ReportQuery {
            period: ChartPeriod::Month,
            ..ReportQuery::default()
        };
        let view = derive_view(&fixture(), &query);
        assert_eq!(ids(&view.rows), ["1", "2", "3"]);
        let buckets: Vec<(&str, u64)> = view
            .buckets
            .iter()
            .map(|b| (b.period_key.as_str(), b.total_quantity))
            .collect();
        assert_eq!(buckets, [("2024-01", 5), ("2024-02", 4)]);
        assert_eq!(view.total_quantity, 9);
    }

    #[test]
    fn test_chart_follows_filter() {
        let query = ReportQuery {
            filter: "ada".into(),
            period: ChartPeriod::Day,
            ..ReportQuery::default()
        };
        let view = derive_view(&fixture(), &query);
        assert_eq!(ids(&view.rows), ["1", "3"]);
        let keys: Vec<&str> = view.buckets.iter().map(|b| b.period_key.as_str()).collect();
        assert_eq!(keys, ["2024-01-02", "2024-02-04"]);
        assert_eq!(view.total_quantity, 6);
    }

    #[test]
    fn test_sort_changes_rows_but_not_buckets() {
        let unsorted = derive_view(&fixture(), &ReportQuery::default());
        let query = ReportQuery {
            sort: SortState::from_clicks([SortKey::Quantity, SortKey::Quantity]),
            ..ReportQuery::default()
        };
        let sorted = derive_view(&fixture(), &query);
        assert_eq!(ids(&sorted.rows), ["3", "2", "1"]);
        assert_eq!(sorted.buckets, unsorted.buckets);
    }

    #[test]
    fn test_input_is_not_modified() {
        let sales = fixture();
        let before = sales.clone();
        let query = ReportQuery {
            filter: "a".into(),
            sort: SortState::new(SortKey::Date, SortDirection::Desc),
            period: ChartPeriod::Year,
        };
        let _ = derive_view(&sales, &query);
        assert_eq!(sales, before);
    }

    #[test]
    fn test_empty_sales() {
        let view = derive_view(&[], &ReportQuery::default());
        assert!(view.rows.is_empty());
        assert!(view.buckets.is_empty());
        assert_eq!(view.total_quantity, 0);
    }
}

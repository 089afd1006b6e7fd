//! Time-bucketed quantity totals for the sales chart.

use crate::model::Sale;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The granularity of the chart's time axis.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ChartPeriod {
    #[default]
    Day,
    Month,
    Year,
}

serde_plain::derive_display_from_serialize!(ChartPeriod);
serde_plain::derive_fromstr_from_deserialize!(ChartPeriod);

/// The bucket label for `date`: `YYYY-MM-DD`, `YYYY-MM` or `YYYY`. Labels are zero-padded, so they
/// sort in chronological order as plain strings.
pub fn period_key(date: NaiveDate, period: ChartPeriod) -> String {
    let format = match period {
        ChartPeriod::Day => "%Y-%m-%d",
        ChartPeriod::Month => "%Y-%m",
        ChartPeriod::Year => "%Y",
    };
    date.format(format).to_string()
}

/// Total quantity sold in one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartBucket {
    pub period_key: String,
    pub total_quantity: u64,
}

/// Sums quantities per period. The result is ascending by `period_key` and holds only periods that
/// have at least one sale. The order of `sales` does not affect the result.
pub fn aggregate(sales: &[Sale], period: ChartPeriod) -> Vec<ChartBucket> {
    let mut totals: BTreeMap<String, u64> = BTreeMap::new();
    for sale in sales {
        *totals.entry(period_key(sale.date(), period)).or_default() += u64::from(sale.quantity());
    }
    totals
        .into_iter()
        .map(|(period_key, total_quantity)| ChartBucket {
            period_key,
            total_quantity,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SaleType;
    use crate::report::tests::sale;

    fn buckets(sales: &[Sale], period: ChartPeriod) -> Vec<(String, u64)> {
        aggregate(sales, period)
            .into_iter()
            .map(|b| (b.period_key, b.total_quantity))
            .collect()
    }

    #[test]
    fn test_period_keys() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(period_key(date, ChartPeriod::Day), "2024-03-07");
        assert_eq!(period_key(date, ChartPeriod::Month), "2024-03");
        assert_eq!(period_key(date, ChartPeriod::Year), "2024");
    }

    #[test]
    fn test_same_day_sums() {
        let sales = vec![
            sale("1", Some("A"), "", 3, "2024-01-01", SaleType::Cash),
            sale("2", Some("B"), "", 5, "2024-01-01", SaleType::Card),
        ];
        assert_eq!(
            buckets(&sales, ChartPeriod::Day),
            vec![("2024-01-01".to_string(), 8)]
        );
    }

    #[test]
    fn test_order_of_input_does_not_matter() {
        let mut sales = vec![
            sale("1", None, "", 1, "2024-02-03", SaleType::Cash),
            sale("2", None, "", 2, "2023-12-31", SaleType::Cash),
            sale("3", None, "", 4, "2024-02-03", SaleType::Cash),
            sale("4", None, "", 8, "2024-01-15", SaleType::Cash),
        ];
        let forward = aggregate(&sales, ChartPeriod::Day);
        sales.reverse();
        assert_eq!(forward, aggregate(&sales, ChartPeriod::Day));
        let keys: Vec<&str> = forward.iter().map(|b| b.period_key.as_str()).collect();
        assert_eq!(keys, ["2023-12-31", "2024-01-15", "2024-02-03"]);
    }

    #[test]
    fn test_coarser_periods_merge_buckets() {
        let sales = vec![
            sale("1", None, "", 2, "2024-01-02", SaleType::Cash),
            sale("2", None, "", 3, "2024-01-03", SaleType::Cash),
            sale("3", None, "", 4, "2024-02-04", SaleType::Cash),
            sale("4", None, "", 1, "2025-02-04", SaleType::Cash),
        ];
        let day = aggregate(&sales, ChartPeriod::Day);
        let month = aggregate(&sales, ChartPeriod::Month);
        let year = aggregate(&sales, ChartPeriod::Year);
        assert!(month.len() <= day.len());
        assert!(year.len() <= month.len());
        assert_eq!(
            buckets(&sales, ChartPeriod::Year),
            vec![("2024".to_string(), 9), ("2025".to_string(), 1)]
        );

        let total = |bs: &[ChartBucket]| bs.iter().map(|b| b.total_quantity).sum::<u64>();
        assert_eq!(total(&day), 10);
        assert_eq!(total(&month), 10);
        assert_eq!(total(&year), 10);
    }

    #[test]
    fn test_empty_input_has_no_buckets() {
        assert!(aggregate(&[], ChartPeriod::Month).is_empty());
    }

    #[test]
    fn test_bucket_wire_shape() {
        let bucket = ChartBucket {
            period_key: "2024-01".into(),
            total_quantity: 5,
        };
        assert_eq!(
            serde_json::to_value(bucket).unwrap(),
            serde_json::json!({"periodKey": "2024-01", "totalQuantity": 5})
        );
    }
}

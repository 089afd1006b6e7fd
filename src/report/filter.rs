use crate::model::Sale;

/// Returns the sales whose customer name, item name or sale type contains `query`, ignoring case.
/// Input order is kept. An empty query keeps everything.
pub fn filter(sales: &[Sale], query: &str) -> Vec<Sale> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return sales.to_vec();
    }
    sales
        .iter()
        .filter(|sale| matches(sale, &needle))
        .cloned()
        .collect()
}

/// `needle` must already be lower-cased.
fn matches(sale: &Sale, needle: &str) -> bool {
    sale.customer_name().to_lowercase().contains(needle)
        || sale
            .item_name()
            .unwrap_or_default()
            .to_lowercase()
            .contains(needle)
        || sale.sale_type().as_str().to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::{ids, sale};
    use crate::model::SaleType;

    fn fixture() -> Vec<Sale> {
        vec![
            sale("1", Some("Desk Lamp"), "Ada", 1, "2024-01-01", SaleType::Cash),
            sale("2", Some("Chair"), "Grace Hopper", 2, "2024-01-02", SaleType::Card),
            sale("3", None, "", 3, "2024-01-03", SaleType::Online),
            sale("4", Some("Lamp Shade"), "Linus", 4, "2024-01-04", SaleType::Customer),
        ]
    }

    #[test]
    fn test_empty_query_keeps_everything_in_order() {
        assert_eq!(ids(&filter(&fixture(), "")), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_matches_item_name_ignoring_case() {
        assert_eq!(ids(&filter(&fixture(), "LAMP")), vec!["1", "4"]);
    }

    #[test]
    fn test_matches_customer_name() {
        assert_eq!(ids(&filter(&fixture(), "hopper")), vec!["2"]);
    }

    #[test]
    fn test_matches_sale_type_ignoring_case() {
        assert_eq!(ids(&filter(&fixture(), "cash")), vec!["1"]);
        assert_eq!(ids(&filter(&fixture(), "ONLINE")), vec!["3"]);
    }

    #[test]
    fn test_missing_item_is_treated_as_empty_name() {
        // Sale 3 has no item; it must not break the filter and must not match an item query.
        assert_eq!(ids(&filter(&fixture(), "chair")), vec!["2"]);
    }

    #[test]
    fn test_no_match() {
        assert!(filter(&fixture(), "zzz").is_empty());
    }

    #[test]
    fn test_idempotent() {
        for query in ["", "a", "lamp", "cus", "zzz"] {
            let once = filter(&fixture(), query);
            let twice = filter(&once, query);
            assert_eq!(once, twice, "query {query:?}");
        }
    }
}

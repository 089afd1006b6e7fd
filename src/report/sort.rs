//! Column sorting for the sales table.
//!
//! Sorting is stable in both directions: sales with equal keys keep their relative input order.
//! A sale with no item sorts before every sale that has one when sorting by item name ascending,
//! and after them when descending.

use crate::model::Sale;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A sortable column of the sales table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// The item name.
    Item,
    /// The customer name.
    Customer,
    Quantity,
    SaleType,
    Date,
}

serde_plain::derive_display_from_serialize!(SortKey);
serde_plain::derive_fromstr_from_deserialize!(SortKey);

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

serde_plain::derive_display_from_serialize!(SortDirection);
serde_plain::derive_fromstr_from_deserialize!(SortDirection);

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// The sort applied to the sales table, driven by clicks on column headers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    key: Option<SortKey>,
    direction: SortDirection,
}

impl SortState {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self {
            key: Some(key),
            direction,
        }
    }

    /// A click on the `key` header. The same key flips the direction; a different key starts
    /// ascending.
    pub fn toggle(self, key: SortKey) -> Self {
        let direction = match self.key {
            Some(current) if current == key => self.direction.flipped(),
            _ => SortDirection::Asc,
        };
        Self {
            key: Some(key),
            direction,
        }
    }

    /// Applies a sequence of header clicks, starting from no sort.
    pub fn from_clicks(keys: impl IntoIterator<Item = SortKey>) -> Self {
        keys.into_iter()
            .fold(SortState::default(), |state, key| state.toggle(key))
    }

    pub fn key(&self) -> Option<SortKey> {
        self.key
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

/// Three-way comparison of two sales on `key`, ascending.
pub fn compare(a: &Sale, b: &Sale, key: SortKey) -> Ordering {
    match key {
        // `None < Some(_)`, which gives the null-first policy.
        SortKey::Item => a.item_name().cmp(&b.item_name()),
        SortKey::Customer => a.customer_name().cmp(b.customer_name()),
        SortKey::Quantity => a.quantity().cmp(&b.quantity()),
        SortKey::SaleType => a.sale_type().as_str().cmp(b.sale_type().as_str()),
        SortKey::Date => a.date().cmp(&b.date()),
    }
}

/// Sorts `sales` in place. The sort is stable.
pub fn sort(sales: &mut [Sale], key: SortKey, direction: SortDirection) {
    match direction {
        SortDirection::Asc => sales.sort_by(|a, b| compare(a, b, key)),
        SortDirection::Desc => sales.sort_by(|a, b| compare(b, a, key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SaleType;
    use crate::report::tests::{ids, sale};

    fn distinct() -> Vec<Sale> {
        vec![
            sale("1", Some("Chair"), "Bob", 5, "2024-03-01", SaleType::Cash),
            sale("2", Some("Apple"), "Dee", 1, "2024-01-15", SaleType::Card),
            sale("3", Some("Desk"), "Ann", 9, "2024-02-10", SaleType::Online),
            sale("4", Some("Bulb"), "Cal", 3, "2023-12-31", SaleType::Customer),
        ]
    }

    fn sorted(mut sales: Vec<Sale>, key: SortKey, direction: SortDirection) -> Vec<Sale> {
        sort(&mut sales, key, direction);
        sales
    }

    #[test]
    fn test_sort_each_key_ascending() {
        let asc = SortDirection::Asc;
        assert_eq!(ids(&sorted(distinct(), SortKey::Item, asc)), ["2", "4", "1", "3"]);
        assert_eq!(ids(&sorted(distinct(), SortKey::Customer, asc)), ["3", "1", "4", "2"]);
        assert_eq!(ids(&sorted(distinct(), SortKey::Quantity, asc)), ["2", "4", "1", "3"]);
        // Card < Cash < Customer < Online
        assert_eq!(ids(&sorted(distinct(), SortKey::SaleType, asc)), ["2", "1", "4", "3"]);
        assert_eq!(ids(&sorted(distinct(), SortKey::Date, asc)), ["4", "2", "3", "1"]);
    }

    #[test]
    fn test_descending_is_exact_reverse_without_ties() {
        for key in [
            SortKey::Item,
            SortKey::Customer,
            SortKey::Quantity,
            SortKey::SaleType,
            SortKey::Date,
        ] {
            let asc = sorted(distinct(), key, SortDirection::Asc);
            let desc = sorted(asc.clone(), key, SortDirection::Desc);
            let mut reversed = asc;
            reversed.reverse();
            assert_eq!(desc, reversed, "key {key}");
        }
    }

    #[test]
    fn test_stable_with_ties_in_both_directions() {
        let sales = vec![
            sale("a", Some("X"), "", 2, "2024-01-01", SaleType::Cash),
            sale("b", Some("X"), "", 1, "2024-01-01", SaleType::Cash),
            sale("c", Some("X"), "", 2, "2024-01-01", SaleType::Cash),
            sale("d", Some("X"), "", 1, "2024-01-01", SaleType::Cash),
        ];
        assert_eq!(
            ids(&sorted(sales.clone(), SortKey::Quantity, SortDirection::Asc)),
            ["b", "d", "a", "c"]
        );
        assert_eq!(
            ids(&sorted(sales, SortKey::Quantity, SortDirection::Desc)),
            ["a", "c", "b", "d"]
        );
    }

    #[test]
    fn test_missing_items_sort_first_ascending_and_last_descending() {
        let sales = vec![
            sale("1", Some("Bulb"), "", 1, "2024-01-01", SaleType::Cash),
            sale("2", None, "", 1, "2024-01-01", SaleType::Cash),
            sale("3", Some("Apple"), "", 1, "2024-01-01", SaleType::Cash),
            sale("4", None, "", 1, "2024-01-01", SaleType::Cash),
            sale("5", Some(""), "", 1, "2024-01-01", SaleType::Cash),
        ];
        assert_eq!(
            ids(&sorted(sales.clone(), SortKey::Item, SortDirection::Asc)),
            ["2", "4", "5", "3", "1"]
        );
        assert_eq!(
            ids(&sorted(sales, SortKey::Item, SortDirection::Desc)),
            ["1", "3", "5", "2", "4"]
        );
    }

    #[test]
    fn test_toggle_same_key_flips_direction() {
        let state = SortState::default().toggle(SortKey::Date);
        assert_eq!(state, SortState::new(SortKey::Date, SortDirection::Asc));
        let state = state.toggle(SortKey::Date);
        assert_eq!(state, SortState::new(SortKey::Date, SortDirection::Desc));
        let state = state.toggle(SortKey::Date);
        assert_eq!(state.direction(), SortDirection::Asc);
    }

    #[test]
    fn test_toggle_new_key_resets_to_ascending() {
        let state = SortState::from_clicks([SortKey::Date, SortKey::Date, SortKey::Quantity]);
        assert_eq!(state, SortState::new(SortKey::Quantity, SortDirection::Asc));
    }

    #[test]
    fn test_no_clicks_means_no_sort() {
        let state = SortState::from_clicks([]);
        assert_eq!(state.key(), None);
    }

    #[test]
    fn test_sort_key_text() {
        assert_eq!(SortKey::SaleType.to_string(), "sale-type");
        assert_eq!("item".parse::<SortKey>().unwrap(), SortKey::Item);
    }
}

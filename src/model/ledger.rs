use crate::model::{Amount, CustomerRecord, Decoded};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One item's pre-aggregated totals from `GET /report`. The backend does the summing; we only
/// display it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemReport {
    pub id: String,
    pub name: String,
    pub description: String,
    pub total_sold: u64,
    pub revenue: Amount,
}

impl ItemReport {
    /// Units sold across `items`, saturating at `u64::MAX`.
    pub fn units_sold(items: &[ItemReport]) -> u64 {
        items
            .iter()
            .fold(0u64, |total, i| total.saturating_add(i.total_sold))
    }
}

/// The item a ledger transaction refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(serialize_with = "Amount::serialize_number")]
    pub price: Amount,
}

/// One row of a customer ledger. It has the same wire shape that the backend sent, so it can be
/// echoed back in `ledgerDetails` when emailing a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "itemId")]
    pub item: Option<TransactionItem>,
    pub quantity: u32,
    pub customer_name: String,
    /// Free text on this screen; the ledger endpoint does not constrain it.
    pub sale_type: String,
    pub date: NaiveDate,
}

impl Transaction {
    /// Price times quantity, or zero when the item is missing.
    pub fn line_total(&self) -> Amount {
        self.item
            .as_ref()
            .map(|i| i.price * u64::from(self.quantity))
            .unwrap_or_default()
    }
}

/// The transaction history and running balance for one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    pub customer: Option<CustomerRecord>,
    pub transactions: Decoded<Transaction>,
    pub total_balance: Amount,
}

impl Ledger {
    /// Sum of line totals over the valid transactions. This is useful for checking the balance that
    /// the backend reports.
    pub fn computed_total(&self) -> Amount {
        self.transactions.records().iter().map(|t| t.line_total()).sum()
    }
}

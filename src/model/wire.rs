//! Raw JSON shapes returned by the backend, and their validation into the typed model.
//!
//! Lists are validated one element at a time. An element that fails is logged and recorded as
//! `Rejected`, and the rest of the list is still returned.

use crate::error::Res;
use crate::model::{
    Amount, CustomerRecord, Decoded, InventoryItem, ItemReport, Ledger, Rejected, Sale,
    SaleCustomer, SaleItem, SaleType, Transaction, TransactionItem,
};
use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use tracing::warn;

/// A number as the backend may send it: an integer, a float or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Number {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Number {
    fn count(&self, field: &str) -> Res<u64> {
        match self {
            Number::Int(n) => u64::try_from(*n)
                .with_context(|| format!("{field} must not be negative, got {n}")),
            Number::Float(f) if f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64 => {
                Ok(*f as u64)
            }
            Number::Float(f) => bail!("{field} must be a non-negative whole number, got {f}"),
            Number::Text(s) => s
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{field} is not a non-negative whole number: '{s}'")),
        }
    }

    fn quantity(&self) -> Res<u32> {
        let n = self.count("quantity")?;
        u32::try_from(n).with_context(|| format!("quantity {n} is too large"))
    }

    fn amount(&self, field: &str) -> Res<Amount> {
        match self {
            Number::Int(n) => Ok(Amount::new(Decimal::from(*n))),
            Number::Float(f) => Amount::from_str(&f.to_string())
                .with_context(|| format!("{field} is not a valid amount: {f}")),
            Number::Text(s) => {
                Amount::from_str(s).with_context(|| format!("{field} is not a valid amount: '{s}'"))
            }
        }
    }
}

/// A reference that the backend may or may not have populated with the referenced document.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Ref<T> {
    Populated(T),
    Id(String),
}

impl<T> Ref<T> {
    fn populated(self) -> Option<T> {
        match self {
            Ref::Populated(t) => Some(t),
            Ref::Id(_) => None,
        }
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp. Timestamps are reduced to their UTC date.
pub(crate) fn parse_date(s: &str) -> Res<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|_| anyhow!("unparseable date '{s}'"))
}

fn parse_sale_type(s: &str) -> Res<SaleType> {
    match s.trim().to_ascii_lowercase().as_str() {
        "cash" => Ok(SaleType::Cash),
        "card" => Ok(SaleType::Card),
        "online" => Ok(SaleType::Online),
        "customer" => Ok(SaleType::Customer),
        _ => bail!("unknown sale type '{s}'"),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Validates one JSON value as `R` and converts it to `T`.
pub(crate) fn decode<R, T>(value: Value) -> Res<T>
where
    R: DeserializeOwned,
    T: TryFrom<R, Error = anyhow::Error>,
{
    let raw: R = serde_json::from_value(value).context("unexpected record shape")?;
    T::try_from(raw)
}

/// Validates each element of a JSON list. `what` names the records in log messages.
pub(crate) fn decode_list<R, T>(what: &str, value: Value) -> Res<Decoded<T>>
where
    R: DeserializeOwned,
    T: TryFrom<R, Error = anyhow::Error>,
{
    let items = match value {
        Value::Array(items) => items,
        other => bail!("Expected a list of {what}, got {}", json_kind(&other)),
    };

    let mut records = Vec::with_capacity(items.len());
    let mut rejected = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        let id = item.get("_id").and_then(Value::as_str).map(str::to_string);
        match decode::<R, T>(item) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(
                    "Skipping {what} record {index} ({}): {e:#}",
                    id.as_deref().unwrap_or("no id")
                );
                rejected.push(Rejected {
                    index,
                    id,
                    reason: format!("{e:#}"),
                });
            }
        }
    }
    Ok(Decoded::with_rejected(records, rejected))
}

// =============================================================================
// Sales
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawSaleItem {
    #[serde(rename = "_id", default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    price: Option<Number>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCustomerRef {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawSale {
    #[serde(rename = "_id", default)]
    id: String,
    #[serde(rename = "itemId", default)]
    item: Option<Ref<RawSaleItem>>,
    #[serde(rename = "customerId", default)]
    customer: Option<Ref<RawCustomerRef>>,
    quantity: Number,
    date: String,
    sale_type: String,
    #[serde(default)]
    customer_name: Option<String>,
}

impl TryFrom<RawSaleItem> for SaleItem {
    type Error = anyhow::Error;

    fn try_from(raw: RawSaleItem) -> Res<Self> {
        let price = match raw.price {
            Some(p) => p.amount("item price")?,
            None => Amount::ZERO,
        };
        Ok(SaleItem {
            id: raw.id,
            name: raw.name,
            description: raw.description.unwrap_or_default(),
            price,
        })
    }
}

impl TryFrom<RawSale> for Sale {
    type Error = anyhow::Error;

    fn try_from(raw: RawSale) -> Res<Self> {
        let date = parse_date(&raw.date)?;
        let quantity = raw.quantity.quantity()?;
        let sale_type = parse_sale_type(&raw.sale_type)?;
        let item = raw
            .item
            .and_then(Ref::populated)
            .map(SaleItem::try_from)
            .transpose()?;
        let sale = Sale::new(
            raw.id,
            item,
            quantity,
            date,
            sale_type,
            raw.customer_name.unwrap_or_default(),
        );
        Ok(match raw.customer.and_then(Ref::populated) {
            Some(c) => sale.with_customer(SaleCustomer {
                name: c.name.unwrap_or_default(),
                address: c.address.unwrap_or_default(),
            }),
            None => sale,
        })
    }
}

// =============================================================================
// Inventory, customers and the items report
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawInventoryItem {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    quantity: Number,
    price: Number,
}

impl TryFrom<RawInventoryItem> for InventoryItem {
    type Error = anyhow::Error;

    fn try_from(raw: RawInventoryItem) -> Res<Self> {
        Ok(InventoryItem {
            quantity: raw.quantity.quantity()?,
            price: raw.price.amount("price")?,
            id: raw.id,
            name: raw.name,
            description: raw.description.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCustomer {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    mobile: Option<String>,
}

impl TryFrom<RawCustomer> for CustomerRecord {
    type Error = anyhow::Error;

    fn try_from(raw: RawCustomer) -> Res<Self> {
        Ok(CustomerRecord {
            id: raw.id,
            name: raw.name,
            address: raw.address.unwrap_or_default(),
            mobile: raw.mobile.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawItemReport {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    total_sold: Number,
    revenue: Number,
}

impl TryFrom<RawItemReport> for ItemReport {
    type Error = anyhow::Error;

    fn try_from(raw: RawItemReport) -> Res<Self> {
        Ok(ItemReport {
            total_sold: raw.total_sold.count("totalSold")?,
            revenue: raw.revenue.amount("revenue")?,
            id: raw.id,
            name: raw.name,
            description: raw.description.unwrap_or_default(),
        })
    }
}

// =============================================================================
// Ledger
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawTransactionItem {
    #[serde(rename = "_id", default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    price: Option<Number>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawTransaction {
    #[serde(rename = "_id", default)]
    id: String,
    #[serde(rename = "itemId", default)]
    item: Option<Ref<RawTransactionItem>>,
    quantity: Number,
    #[serde(default)]
    customer_name: Option<String>,
    #[serde(default)]
    sale_type: Option<String>,
    date: String,
}

impl TryFrom<RawTransaction> for Transaction {
    type Error = anyhow::Error;

    fn try_from(raw: RawTransaction) -> Res<Self> {
        let item = match raw.item.and_then(Ref::populated) {
            Some(i) => Some(TransactionItem {
                price: match i.price {
                    Some(p) => p.amount("item price")?,
                    None => Amount::ZERO,
                },
                id: i.id,
                name: i.name,
            }),
            None => None,
        };
        Ok(Transaction {
            id: raw.id,
            item,
            quantity: raw.quantity.quantity()?,
            customer_name: raw.customer_name.unwrap_or_default(),
            sale_type: raw.sale_type.unwrap_or_default(),
            date: parse_date(&raw.date)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawLedger {
    #[serde(default)]
    customer: Option<RawCustomer>,
    #[serde(default)]
    transactions: Option<Value>,
    #[serde(default)]
    total_balance: Option<Number>,
}

impl TryFrom<RawLedger> for Ledger {
    type Error = anyhow::Error;

    fn try_from(raw: RawLedger) -> Res<Self> {
        let customer = raw.customer.map(CustomerRecord::try_from).transpose()?;
        let transactions = match raw.transactions {
            Some(value) => decode_list::<RawTransaction, Transaction>("ledger transaction", value)?,
            None => Decoded::default(),
        };
        let total_balance = match raw.total_balance {
            Some(n) => n.amount("totalBalance")?,
            None => Amount::ZERO,
        };
        Ok(Ledger {
            customer,
            transactions,
            total_balance,
        })
    }
}

// =============================================================================
// Auth
// =============================================================================

/// The body returned by `/login`, `/register` and `/refresh-token`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    #[serde(default)]
    pub(crate) refresh_token: Option<String>,
    #[serde(default)]
    pub(crate) message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sales(value: Value) -> Decoded<Sale> {
        decode_list::<RawSale, Sale>("sale", value).unwrap()
    }

    #[test]
    fn test_decode_populated_sale() {
        let decoded = sales(json!([{
            "_id": "s1",
            "itemId": {"_id": "i1", "name": "Lamp", "description": "Desk lamp", "price": 19.99},
            "customerId": {"name": "Ada", "address": "1 Loop Rd"},
            "quantity": 2,
            "date": "2024-01-01T00:00:00.000Z",
            "saleType": "Card",
            "customerName": "Ada"
        }]));
        assert!(decoded.rejected().is_empty());
        let sale = &decoded.records()[0];
        assert_eq!(sale.id(), "s1");
        assert_eq!(sale.item_name(), Some("Lamp"));
        assert_eq!(sale.item().unwrap().price.to_string(), "$19.99");
        assert_eq!(sale.customer().unwrap().address, "1 Loop Rd");
        assert_eq!(sale.quantity(), 2);
        assert_eq!(sale.date(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(sale.sale_type(), SaleType::Card);
    }

    #[test]
    fn test_missing_and_unpopulated_items_are_tolerated() {
        let decoded = sales(json!([
            {"_id": "a", "itemId": null, "quantity": 1, "date": "2024-01-01", "saleType": "Cash", "customerName": "x"},
            {"_id": "b", "quantity": 1, "date": "2024-01-01", "saleType": "Cash", "customerName": "x"},
            {"_id": "c", "itemId": "65a1f0", "quantity": 1, "date": "2024-01-01", "saleType": "Cash", "customerName": null}
        ]));
        assert_eq!(decoded.records().len(), 3);
        assert!(decoded.records().iter().all(|s| s.item().is_none()));
        assert_eq!(decoded.records()[2].customer_name(), "");
    }

    #[test]
    fn test_bad_records_are_isolated() {
        let decoded = sales(json!([
            {"_id": "ok1", "quantity": 3, "date": "2024-01-01", "saleType": "Cash", "customerName": ""},
            {"_id": "bad-date", "quantity": 3, "date": "next tuesday", "saleType": "Cash", "customerName": ""},
            {"_id": "bad-qty", "quantity": -1, "date": "2024-01-01", "saleType": "Cash", "customerName": ""},
            {"_id": "bad-type", "quantity": 1, "date": "2024-01-01", "saleType": "Barter", "customerName": ""},
            {"quantity": "7", "date": "2024-01-02", "saleType": "online", "customerName": ""}
        ]));
        let ids: Vec<&str> = decoded.records().iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["ok1", ""]);
        assert_eq!(decoded.records()[1].quantity(), 7);
        assert_eq!(decoded.records()[1].sale_type(), SaleType::Online);

        let rejected: Vec<(usize, Option<&str>)> = decoded
            .rejected()
            .iter()
            .map(|r| (r.index, r.id.as_deref()))
            .collect();
        assert_eq!(
            rejected,
            vec![
                (1, Some("bad-date")),
                (2, Some("bad-qty")),
                (3, Some("bad-type"))
            ]
        );
        assert!(decoded.rejected()[0].reason.contains("unparseable date"));
        assert_eq!(
            decoded.rejected_note().unwrap(),
            "3 records were skipped because they failed validation"
        );
    }

    #[test]
    fn test_non_list_is_an_error() {
        let result = decode_list::<RawSale, Sale>("sale", json!({"message": "oops"}));
        let message = result.unwrap_err().to_string();
        assert!(message.contains("got an object"), "{message}");
    }

    #[test]
    fn test_timestamp_with_offset_uses_utc_date() {
        let date = parse_date("2024-03-01T01:30:00+05:00").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_decode_inventory_accepts_string_numbers() {
        let decoded = decode_list::<RawInventoryItem, InventoryItem>(
            "inventory item",
            json!([{"_id": "i1", "name": "Lamp", "quantity": "12", "price": "19.5"}]),
        )
        .unwrap();
        let item = &decoded.records()[0];
        assert_eq!(item.quantity, 12);
        assert_eq!(item.price.to_string(), "$19.50");
        assert_eq!(item.description, "");
    }

    #[test]
    fn test_decode_ledger() {
        let ledger: Ledger = decode::<RawLedger, Ledger>(json!({
            "customer": {"_id": "c1", "name": "Ada", "address": "1 Loop Rd", "mobile": "555"},
            "transactions": [
                {"_id": "t1", "itemId": {"_id": "i1", "name": "Lamp", "price": 10}, "quantity": 2,
                 "customerName": "Ada", "saleType": "Customer", "date": "2024-05-01"},
                {"_id": "t2", "quantity": 1, "date": "bogus"}
            ],
            "totalBalance": 20
        }))
        .unwrap();
        assert_eq!(ledger.customer.as_ref().unwrap().name, "Ada");
        assert_eq!(ledger.transactions.records().len(), 1);
        assert_eq!(ledger.transactions.rejected().len(), 1);
        assert_eq!(ledger.total_balance.to_string(), "$20.00");
        assert_eq!(ledger.computed_total(), ledger.total_balance);
    }
}

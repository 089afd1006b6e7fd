//! Inventory items and customers, plus the form bodies used to create and edit them.

use crate::model::Amount;
use serde::{Deserialize, Serialize};

/// A row from `GET /inventory`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Units in stock.
    pub quantity: u32,
    pub price: Amount,
}

/// A row from `GET /customers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    pub id: String,
    pub name: String,
    pub address: String,
    pub mobile: String,
}

/// The body of `POST /inventory` and `PUT /inventory`. `id` is only sent on update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemForm {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub quantity: u32,
    pub price: Amount,
}

/// The body of `POST /customers` and `PUT /customers`. `id` is only sent on update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerForm {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub address: String,
    pub mobile: String,
}

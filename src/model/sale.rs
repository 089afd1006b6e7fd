use crate::model::Amount;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How a sale was paid for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
pub enum SaleType {
    #[default]
    Cash,
    Card,
    Online,
    /// Sold on account to a named customer. The record-sale form offers this alongside `Cash`.
    Customer,
}

serde_plain::derive_display_from_serialize!(SaleType);
serde_plain::derive_fromstr_from_deserialize!(SaleType);

impl SaleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleType::Cash => "Cash",
            SaleType::Card => "Card",
            SaleType::Online => "Online",
            SaleType::Customer => "Customer",
        }
    }
}

/// The item a sale refers to, as populated by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Amount,
}

/// The customer a sale refers to, when it was not a walk-in sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleCustomer {
    pub name: String,
    pub address: String,
}

/// A recorded sale. Sales are never modified after they have been fetched; the report pipeline
/// only derives new views from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    id: String,
    /// `None` when the backend returned a null or unpopulated item reference.
    item: Option<SaleItem>,
    customer: Option<SaleCustomer>,
    quantity: u32,
    date: NaiveDate,
    sale_type: SaleType,
    customer_name: String,
}

impl Sale {
    pub fn new(
        id: impl Into<String>,
        item: Option<SaleItem>,
        quantity: u32,
        date: NaiveDate,
        sale_type: SaleType,
        customer_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            item,
            customer: None,
            quantity,
            date,
            sale_type,
            customer_name: customer_name.into(),
        }
    }

    pub fn with_customer(mut self, customer: SaleCustomer) -> Self {
        self.customer = Some(customer);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn item(&self) -> Option<&SaleItem> {
        self.item.as_ref()
    }

    /// The item name, if the item reference is present.
    pub fn item_name(&self) -> Option<&str> {
        self.item.as_ref().map(|i| i.name.as_str())
    }

    pub fn customer(&self) -> Option<&SaleCustomer> {
        self.customer.as_ref()
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn sale_type(&self) -> SaleType {
        self.sale_type
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }
}

/// The body of `POST /sales`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    pub item_id: String,
    pub quantity: u32,
    pub date: NaiveDate,
    pub sale_type: SaleType,
    pub customer_name: String,
}

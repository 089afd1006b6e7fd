//! Types that represent the core data model, such as `Sale` and `Ledger`.
//!
//! Backend responses are untyped JSON. They are converted into these types at the API boundary
//! (see `wire`). A record that fails validation is set aside in `Decoded::rejected` instead of
//! failing the whole response.

mod amount;
mod catalog;
mod ledger;
mod sale;
pub(crate) mod wire;

pub use amount::{Amount, AmountError};
pub use catalog::{CustomerForm, CustomerRecord, InventoryItem, ItemForm};
pub use ledger::{ItemReport, Ledger, Transaction, TransactionItem};
pub use sale::{NewSale, Sale, SaleCustomer, SaleItem, SaleType};

use serde::Serialize;

/// A backend record that could not be validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejected {
    /// Position of the record in the backend's list.
    pub index: usize,
    /// The record's `_id`, if it had one.
    pub id: Option<String>,
    pub reason: String,
}

/// The valid records of a backend list, plus the ones that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decoded<T> {
    records: Vec<T>,
    rejected: Vec<Rejected>,
}

impl<T> Default for Decoded<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<T> Decoded<T> {
    /// All records valid.
    pub fn new(records: Vec<T>) -> Self {
        Self {
            records,
            rejected: Vec::new(),
        }
    }

    pub fn with_rejected(records: Vec<T>, rejected: Vec<Rejected>) -> Self {
        Self { records, rejected }
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn rejected(&self) -> &[Rejected] {
        &self.rejected
    }

    pub fn into_records(self) -> Vec<T> {
        self.records
    }

    /// A short note about skipped records, suitable for appending to a command message.
    pub fn rejected_note(&self) -> Option<String> {
        match self.rejected.len() {
            0 => None,
            1 => Some("1 record was skipped because it failed validation".to_string()),
            n => Some(format!(
                "{n} records were skipped because they failed validation"
            )),
        }
    }
}

//! `eventory customers` handlers.

use crate::api::ApiClient;
use crate::commands::{with_note, Out};
use crate::export::{self, Table};
use crate::model::{CustomerForm, CustomerRecord};
use crate::Result;

/// Lists the customers, or those matching `query` when it is not blank.
pub async fn customers_list(client: &ApiClient, query: &str) -> Result<Out<Vec<CustomerRecord>>> {
    let fetched = client.search_customers(query).await?;
    let note = fetched.rejected_note();
    println!("{}", export::render_text(&Table::customers(fetched.records())));
    let message = format!("{} customers", fetched.records().len());
    Ok(Out::new(with_note(message, note), fetched.into_records()))
}

pub async fn customers_add(client: &ApiClient, customer: &CustomerForm) -> Result<Out<()>> {
    let reply = client.add_customer(customer).await?;
    Ok(reply
        .unwrap_or_else(|| format!("Added {}", customer.name))
        .into())
}

pub async fn customers_update(client: &ApiClient, customer: &CustomerForm) -> Result<Out<()>> {
    let reply = client.update_customer(customer).await?;
    Ok(reply
        .unwrap_or_else(|| format!("Updated {}", customer.name))
        .into())
}

pub async fn customers_delete(client: &ApiClient, id: &str) -> Result<Out<()>> {
    let reply = client.delete_customer(id).await?;
    Ok(reply.unwrap_or_else(|| format!("Deleted {id}")).into())
}

//! `eventory inventory` handlers.

use crate::api::ApiClient;
use crate::commands::{with_note, Out};
use crate::export::{self, Table};
use crate::model::{InventoryItem, ItemForm};
use crate::Result;

/// Lists the inventory, or the items matching `query` when it is not blank.
pub async fn inventory_list(client: &ApiClient, query: &str) -> Result<Out<Vec<InventoryItem>>> {
    let fetched = client.search_inventory(query).await?;
    let note = fetched.rejected_note();
    println!("{}", export::render_text(&Table::inventory(fetched.records())));
    let message = format!("{} items", fetched.records().len());
    Ok(Out::new(with_note(message, note), fetched.into_records()))
}

pub async fn inventory_add(client: &ApiClient, item: &ItemForm) -> Result<Out<()>> {
    let reply = client.add_item(item).await?;
    Ok(reply
        .unwrap_or_else(|| format!("Added {}", item.name))
        .into())
}

pub async fn inventory_update(client: &ApiClient, item: &ItemForm) -> Result<Out<()>> {
    let reply = client.update_item(item).await?;
    Ok(reply
        .unwrap_or_else(|| format!("Updated {}", item.name))
        .into())
}

pub async fn inventory_delete(client: &ApiClient, id: &str) -> Result<Out<()>> {
    let reply = client.delete_item(id).await?;
    Ok(reply.unwrap_or_else(|| format!("Deleted {id}")).into())
}

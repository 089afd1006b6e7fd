use crate::api::ApiClient;
use crate::args::ItemsArgs;
use crate::commands::{with_note, write_exports, Out};
use crate::export::{self, Table};
use crate::model::{Amount, ItemReport};
use crate::{Config, Result};
use serde::Serialize;
use std::path::PathBuf;

/// What `eventory items` produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsOutput {
    pub items: Vec<ItemReport>,
    pub total_sold: u64,
    /// Summed at full precision; only the display rounds.
    pub revenue: Amount,
    pub exported: Vec<PathBuf>,
}

/// Handles `eventory items`. The backend does the per-item summing; only the total row is
/// computed here. The printed view ends with a bar chart of units sold and revenue per item.
pub async fn items(
    config: &Config,
    client: &ApiClient,
    args: &ItemsArgs,
) -> Result<Out<ItemsOutput>> {
    let fetched = client.item_report().await?;
    let note = fetched.rejected_note();
    let items = fetched.records();

    let table = Table::items(items);
    if args.export().prints() {
        println!("{}", export::render_text(&table));
        println!("Units sold and revenue by item");
        print!("{}", export::item_chart(items));
    }
    let clock = client.session().clock();
    let exported = write_exports(config, args.export(), &table, |format| {
        export::timestamped_name("items_report", format, clock)
    })
    .await?;

    let total_sold = ItemReport::units_sold(items);
    let revenue: Amount = items.iter().map(|i| &i.revenue).sum();
    let message = format!(
        "{} items, {total_sold} units sold, {revenue} revenue",
        items.len()
    );
    let output = ItemsOutput {
        items: items.to_vec(),
        total_sold,
        revenue,
        exported,
    };
    Ok(Out::new(with_note(message, note), output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use clap::Parser;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_items_totals() {
        let env = TestEnv::logged_in().await;
        let args = ItemsArgs::parse_from(["items"]);
        let out = items(env.config(), env.client(), &args).await.unwrap();
        assert_eq!(out.message(), "3 items, 21 units sold, $344.94 revenue");
        let output = out.structure().unwrap();
        let lamp = &output.items[0];
        assert_eq!(lamp.name, "Desk Lamp");
        assert_eq!(lamp.total_sold, 6);
        assert_eq!(lamp.revenue.to_string(), "$149.94");
    }

    #[tokio::test]
    async fn test_items_export_pdf() {
        let env = TestEnv::logged_in().await;
        let dir = TempDir::new().unwrap();
        let args = ItemsArgs::parse_from([
            "items",
            "--export",
            "pdf",
            "--out",
            dir.path().to_str().unwrap(),
        ]);
        let out = items(env.config(), env.client(), &args).await.unwrap();
        let exported = &out.structure().unwrap().exported;
        assert_eq!(
            exported,
            &[dir.path().join("items_report_2024-06-01T12-00-00.000Z.pdf")]
        );
        assert!(std::fs::read(&exported[0]).unwrap().starts_with(b"%PDF"));
    }
}

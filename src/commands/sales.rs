use crate::api::{self, ApiClient};
use crate::args::SalesArgs;
use crate::commands::{with_note, write_exports, Out};
use crate::export::{self, Table};
use crate::report::{self, ChartBucket};
use crate::{Config, Result};
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

/// What `eventory sales` produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOutput {
    /// Rows in the filtered view.
    pub rows: usize,
    pub total_quantity: u64,
    pub buckets: Vec<ChartBucket>,
    pub exported: Vec<PathBuf>,
    /// The address the view was emailed to.
    pub emailed: Option<String>,
}

/// Handles `eventory sales`: fetches every sale, derives the filtered and sorted view with its
/// chart, then prints, exports and emails it as requested.
pub async fn sales(
    config: &Config,
    client: &ApiClient,
    args: &SalesArgs,
) -> Result<Out<SalesOutput>> {
    if let Some(email) = args.email() {
        api::validate_email(email)?;
    }

    let fetched = client.sales().await?;
    let note = fetched.rejected_note();
    let query = args.query();
    debug!("Deriving the sales view for {query:?}");
    let view = report::derive_view(fetched.records(), &query);

    let table = Table::sales(&view.rows);
    if args.export().prints() {
        println!("{}", export::render_text(&table));
        println!("Sales by {}", query.period);
        print!("{}", export::chart(&view.buckets));
    }

    let clock = client.session().clock();
    let exported = write_exports(config, args.export(), &table, |format| {
        export::timestamped_name("sales_report", format, clock)
    })
    .await?;

    let emailed = match args.email() {
        Some(email) => {
            let reply = client
                .send_sales_email(email, args.subject(), &view.rows)
                .await?;
            debug!("Email reply: {}", reply.as_deref().unwrap_or("none"));
            Some(email.to_string())
        }
        None => None,
    };

    let mut message = format!(
        "Showing {} of {} sales, {} units in total",
        view.rows.len(),
        fetched.records().len(),
        view.total_quantity
    );
    if let Some(email) = &emailed {
        message.push_str(&format!(", emailed to {email}"));
    }
    let output = SalesOutput {
        rows: view.rows.len(),
        total_quantity: view.total_quantity,
        buckets: view.buckets,
        exported,
        emailed,
    };
    Ok(Out::new(with_note(message, note), output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ChartPeriod;
    use crate::test::TestEnv;
    use crate::ErrorType;
    use clap::Parser;
    use serde_json::Value;
    use tempfile::TempDir;

    fn args(extra: &[&str]) -> SalesArgs {
        SalesArgs::parse_from(std::iter::once("sales").chain(extra.iter().copied()))
    }

    #[tokio::test]
    async fn test_sales_view_skips_invalid_records() {
        let env = TestEnv::logged_in().await;
        let out = sales(env.config(), env.client(), &args(&["--period", "month"]))
            .await
            .unwrap();
        assert_eq!(
            out.message(),
            "Showing 6 of 6 sales, 25 units in total. \
            1 record was skipped because it failed validation"
        );
        let output = out.structure().unwrap();
        let buckets: Vec<(&str, u64)> = output
            .buckets
            .iter()
            .map(|b| (b.period_key.as_str(), b.total_quantity))
            .collect();
        assert_eq!(buckets, [("2024-01", 6), ("2024-02", 9), ("2024-03", 10)]);
        assert!(output.exported.is_empty());
    }

    #[tokio::test]
    async fn test_filter_drives_chart() {
        let env = TestEnv::logged_in().await;
        let out = sales(env.config(), env.client(), &args(&["--filter", "ADA"]))
            .await
            .unwrap();
        let output = out.structure().unwrap();
        assert_eq!(output.rows, 2);
        assert_eq!(output.total_quantity, 7);
        assert_eq!(output.buckets.len(), 2);
        assert_eq!(args(&[]).query().period, ChartPeriod::Day);
    }

    #[tokio::test]
    async fn test_export_csv_and_xlsx() {
        let env = TestEnv::logged_in().await;
        let out_dir = TempDir::new().unwrap();
        let out_path = out_dir.path().to_str().unwrap();
        let out = sales(
            env.config(),
            env.client(),
            &args(&["--export", "csv", "--export", "xlsx", "--out", out_path]),
        )
        .await
        .unwrap();
        let exported = &out.structure().unwrap().exported;
        assert_eq!(
            exported,
            &[
                out_dir.path().join("sales_report_2024-06-01T12-00-00.000Z.csv"),
                out_dir.path().join("sales_report_2024-06-01T12-00-00.000Z.xlsx"),
            ]
        );
        let csv = std::fs::read_to_string(&exported[0]).unwrap();
        assert!(csv.starts_with("Item,Customer,Quantity,Sale Type,Date\n"));
        assert!(csv.contains("Unknown,Linus,5,Online,2024-02-20"));
        assert_eq!(csv.lines().count(), 7);
    }

    #[tokio::test]
    async fn test_default_export_dir() {
        let env = TestEnv::logged_in().await;
        let out = sales(env.config(), env.client(), &args(&["--export", "pdf"]))
            .await
            .unwrap();
        let path = &out.structure().unwrap().exported[0];
        assert!(path.starts_with(env.config().exports()));
        assert!(std::fs::read(path).unwrap().starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_email_sends_sorted_view() {
        let env = TestEnv::logged_in().await;
        let out = sales(
            env.config(),
            env.client(),
            &args(&[
                "--filter",
                "cash",
                "--sort",
                "quantity",
                "--sort",
                "quantity",
                "--email",
                "boss@example.com",
                "--subject",
                "Cash sales",
            ]),
        )
        .await
        .unwrap();
        assert_eq!(
            out.structure().unwrap().emailed.as_deref(),
            Some("boss@example.com")
        );
        let outbox = env.backend().outbox();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0]["subject"], "Cash sales");
        let quantities: Vec<u64> = outbox[0]["sales"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|s| s.get("quantity").and_then(Value::as_u64))
            .collect();
        assert_eq!(quantities, [10, 2]);
    }

    #[tokio::test]
    async fn test_bad_email_is_checked_first() {
        // Not logged in: the address is rejected before the missing session is noticed.
        let env = TestEnv::new().await;
        let err = sales(env.config(), env.client(), &args(&["--email", "nobody"]))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
    }
}

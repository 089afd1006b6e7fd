use crate::api::{self, ApiClient};
use crate::args::LedgerArgs;
use crate::commands::{with_note, write_exports, Out};
use crate::export::{self, Table};
use crate::model::Ledger;
use crate::{Config, Result};
use tracing::warn;

const NO_TRANSACTIONS: &str = "No transactions available for this customer.";

/// Handles `eventory ledger`: shows a customer's details, transactions and balance, then exports
/// and emails the ledger as requested.
pub async fn ledger(
    config: &Config,
    client: &ApiClient,
    args: &LedgerArgs,
) -> Result<Out<Ledger>> {
    if let Some(email) = args.email() {
        api::validate_email(email)?;
    }

    let ledger = client.ledger(args.customer_id()).await?;
    let note = ledger.transactions.rejected_note();
    let computed = ledger.computed_total();
    if ledger.transactions.rejected().is_empty() && computed != ledger.total_balance {
        warn!(
            "The backend reports a balance of {} but the transactions add up to {computed}",
            ledger.total_balance
        );
    }

    let table = Table::ledger(&ledger);
    let empty = ledger.transactions.records().is_empty();
    if args.export().prints() {
        if let Some(customer) = &ledger.customer {
            println!("Customer: {}", customer.name);
            println!("Address:  {}", customer.address);
            println!("Mobile:   {}", customer.mobile);
            println!();
        }
        if empty {
            println!("{NO_TRANSACTIONS}");
        } else {
            println!("{}", export::render_text(&table));
        }
        println!("Total balance: {}", ledger.total_balance);
    }

    let exported = write_exports(config, args.export(), &table, export::ledger_name).await?;

    let mut message = if empty {
        NO_TRANSACTIONS.to_string()
    } else {
        format!(
            "{} transactions, total balance {}",
            ledger.transactions.records().len(),
            ledger.total_balance
        )
    };
    for path in &exported {
        message.push_str(&format!(", exported {}", path.display()));
    }
    if let Some(email) = args.email() {
        client
            .send_ledger_email(args.customer_id(), email, &ledger)
            .await?;
        message.push_str(&format!(", emailed to {email}"));
    }
    Ok(Out::new(with_note(message, note), ledger))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CustomerForm;
    use crate::test::TestEnv;
    use crate::ErrorType;
    use clap::Parser;
    use tempfile::TempDir;

    fn args(extra: &[&str]) -> LedgerArgs {
        LedgerArgs::parse_from(std::iter::once("ledger").chain(extra.iter().copied()))
    }

    #[tokio::test]
    async fn test_ledger() {
        let env = TestEnv::logged_in().await;
        let out = ledger(env.config(), env.client(), &args(&["--customer-id", "cust-1"]))
            .await
            .unwrap();
        assert_eq!(out.message(), "2 transactions, total balance $109.71");
        let ledger = out.structure().unwrap();
        assert_eq!(
            ledger.customer.as_ref().map(|c| c.name.as_str()),
            Some("Ada Lovelace")
        );
        assert_eq!(ledger.computed_total(), ledger.total_balance);
    }

    #[tokio::test]
    async fn test_ledger_export_and_email() {
        let env = TestEnv::logged_in().await;
        let dir = TempDir::new().unwrap();
        let out = ledger(
            env.config(),
            env.client(),
            &args(&[
                "--customer-id",
                "cust-2",
                "--export",
                "xlsx",
                "--out",
                dir.path().to_str().unwrap(),
                "--email",
                "grace@example.com",
            ]),
        )
        .await
        .unwrap();
        assert!(dir.path().join("CustomerLedger.xlsx").is_file());
        assert!(out.message().ends_with(", emailed to grace@example.com"));

        let outbox = env.backend().outbox();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0]["customerId"], "cust-2");
        assert_eq!(outbox[0]["ledgerDetails"].as_array().map(Vec::len), Some(1));
        assert!(outbox[0]["ledgerDetails"][0]["itemId"]["price"].is_number());
    }

    #[tokio::test]
    async fn test_ledger_without_transactions() {
        let env = TestEnv::logged_in().await;
        env.client()
            .add_customer(&CustomerForm {
                id: None,
                name: "Katherine Johnson".into(),
                address: String::new(),
                mobile: String::new(),
            })
            .await
            .unwrap();
        let out = ledger(
            env.config(),
            env.client(),
            &args(&["--customer-id", "customer-new-1"]),
        )
        .await
        .unwrap();
        assert_eq!(out.message(), NO_TRANSACTIONS);
        assert_eq!(out.structure().unwrap().total_balance.to_string(), "$0.00");
    }

    #[tokio::test]
    async fn test_empty_email_is_validation_error() {
        let env = TestEnv::logged_in().await;
        let err = ledger(
            env.config(),
            env.client(),
            &args(&["--customer-id", "cust-1", "--email", ""]),
        )
        .await
        .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
        assert!(env.backend().outbox().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_customer() {
        let env = TestEnv::logged_in().await;
        let err = ledger(env.config(), env.client(), &args(&["--customer-id", "cust-9"]))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Network);
    }
}

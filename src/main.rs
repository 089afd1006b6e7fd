use clap::Parser;
use eventory::args::{Args, Command, CustomersCommand, InventoryCommand};
use eventory::{api, commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().eventory_home().path();

    // This allows for running the program without a backend. When EVENTORY_IN_TEST_MODE is set
    // and non-empty, the mode will be Mode::Test, otherwise it will be Mode::Http.
    let mode = Mode::from_env();

    if let Command::Init(init_args) = args.command() {
        commands::init(home, init_args.base_url()).await?.print();
        return Ok(());
    }

    let config = Config::load(home).await?;
    let client = api::client(&config, mode).await?;

    // Route to appropriate command handler
    let _: () = match args.command() {
        // Handled above, before the config exists.
        Command::Init(_) => {}

        Command::Login(login_args) => {
            commands::login(&client, login_args.username(), login_args.password())
                .await?
                .print()
        }

        Command::Register(register_args) => commands::register(
            &client,
            register_args.username(),
            register_args.email(),
            register_args.password(),
            register_args.confirm_password(),
        )
        .await?
        .print(),

        Command::Logout => commands::logout(&client).await?.print(),

        Command::Sales(sales_args) => commands::sales(&config, &client, sales_args)
            .await?
            .print(),

        Command::RecordSale(sale_args) => commands::record_sale(&client, sale_args)
            .await?
            .print(),

        Command::Items(items_args) => commands::items(&config, &client, items_args)
            .await?
            .print(),

        Command::Ledger(ledger_args) => commands::ledger(&config, &client, ledger_args)
            .await?
            .print(),

        Command::Inventory(inventory_args) => match inventory_args.action() {
            InventoryCommand::List => commands::inventory_list(&client, "").await?.print(),
            InventoryCommand::Search(search) => {
                commands::inventory_list(&client, search.query())
                    .await?
                    .print()
            }
            InventoryCommand::Add(item) => commands::inventory_add(&client, &item.form(None))
                .await?
                .print(),
            InventoryCommand::Update(item) => commands::inventory_update(&client, &item.form())
                .await?
                .print(),
            InventoryCommand::Delete(id) => commands::inventory_delete(&client, id.id())
                .await?
                .print(),
        },

        Command::Customers(customers_args) => match customers_args.action() {
            CustomersCommand::List => commands::customers_list(&client, "").await?.print(),
            CustomersCommand::Search(search) => {
                commands::customers_list(&client, search.query())
                    .await?
                    .print()
            }
            CustomersCommand::Add(customer) => {
                commands::customers_add(&client, &customer.form(None))
                    .await?
                    .print()
            }
            CustomersCommand::Update(customer) => {
                commands::customers_update(&client, &customer.form())
                    .await?
                    .print()
            }
            CustomersCommand::Delete(id) => commands::customers_delete(&client, id.id())
                .await?
                .print(),
        },
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

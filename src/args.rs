//! These structs provide the CLI interface for the eventory CLI.

use crate::export::ExportFormat;
use crate::model::{Amount, CustomerForm, ItemForm, SaleType};
use crate::report::{ChartPeriod, ReportQuery, SortKey, SortState};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// eventory: A command-line front end for the Eventory inventory and sales backend.
///
/// Log in once with `eventory login`, then browse and export sales reports, record sales, and
/// manage inventory items and customers. Reports can be written as CSV, Excel or PDF, printed to
/// the terminal, or emailed through the backend.
///
/// Run `eventory init` first to create the home directory and point it at your backend.
#[derive(Debug, Parser, Clone)]
#[command(version)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory and the configuration file.
    ///
    /// This is the first command you should run. Pass --base-url if your backend is not running
    /// at http://localhost:5000/api.
    Init(InitArgs),
    /// Log in and store the session tokens.
    Login(LoginArgs),
    /// Create an account. If the backend issues tokens you are logged in as well.
    Register(RegisterArgs),
    /// Forget the stored session tokens.
    Logout,
    /// Show the sales table and chart, and optionally export or email them.
    Sales(SalesArgs),
    /// Record a sale.
    RecordSale(RecordSaleArgs),
    /// Show per-item totals from the backend's sales report.
    Items(ItemsArgs),
    /// Show a customer's ledger, and optionally export or email it.
    Ledger(LedgerArgs),
    /// List, search, add, update or delete inventory items.
    Inventory(InventoryArgs),
    /// List, search, add, update or delete customers.
    Customers(CustomersArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where eventory configuration and session tokens are held. Defaults to
    /// ~/eventory
    #[arg(long, env = "EVENTORY_HOME", default_value_t = default_eventory_home())]
    eventory_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, eventory_home: PathBuf) -> Self {
        Self {
            log_level,
            eventory_home: eventory_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn eventory_home(&self) -> &DisplayPath {
        &self.eventory_home
    }
}

/// (Not shown): Args for the `eventory init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The base URL of the Eventory REST backend, e.g. https://shop.example.com/api
    #[arg(long)]
    base_url: Option<String>,
}

impl InitArgs {
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }
}

/// (Not shown): Args for the `eventory login` command.
#[derive(Debug, Parser, Clone)]
pub struct LoginArgs {
    #[arg(long)]
    username: String,

    /// Read from EVENTORY_PASSWORD when not given.
    #[arg(long, env = "EVENTORY_PASSWORD", hide_env_values = true)]
    password: String,
}

impl LoginArgs {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

/// (Not shown): Args for the `eventory register` command.
#[derive(Debug, Parser, Clone)]
pub struct RegisterArgs {
    #[arg(long)]
    username: String,

    #[arg(long)]
    email: String,

    #[arg(long, env = "EVENTORY_PASSWORD", hide_env_values = true)]
    password: String,

    /// Must match --password.
    #[arg(long)]
    confirm_password: String,
}

impl RegisterArgs {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn confirm_password(&self) -> &str {
        &self.confirm_password
    }
}

/// Where and how to export a view. Shared by `sales`, `items` and `ledger`.
#[derive(Debug, Parser, Clone, Default)]
pub struct ExportArgs {
    /// Export the view. May be given more than once. `print` writes the plain-text table to
    /// stdout; the other formats are written as files.
    #[arg(long, value_enum)]
    export: Vec<ExportFormat>,

    /// The directory exported files are written to. Defaults to $EVENTORY_HOME/exports
    #[arg(long)]
    out: Option<PathBuf>,
}

impl ExportArgs {
    pub fn formats(&self) -> &[ExportFormat] {
        &self.export
    }

    pub fn out(&self) -> Option<&Path> {
        self.out.as_deref()
    }

    /// Whether the view should be printed to stdout: when `print` is requested, or when nothing
    /// is.
    pub fn prints(&self) -> bool {
        self.export.is_empty() || self.export.contains(&ExportFormat::Print)
    }

    /// The requested formats that produce files.
    pub fn files(&self) -> impl Iterator<Item = ExportFormat> + '_ {
        self.export
            .iter()
            .copied()
            .filter(|f| *f != ExportFormat::Print)
    }
}

/// (Not shown): Args for the `eventory sales` command.
#[derive(Debug, Parser, Clone)]
pub struct SalesArgs {
    /// Only show sales whose customer name, item name or sale type contains this text (case
    /// insensitive).
    #[arg(long, default_value = "")]
    filter: String,

    /// Sort by a column. Each use acts like a click on the column header: naming the same column
    /// again flips the direction, naming a new one sorts ascending by it.
    #[arg(long, value_enum)]
    sort: Vec<SortKey>,

    /// The chart's time axis.
    #[arg(long, value_enum, default_value_t = ChartPeriod::Day)]
    period: ChartPeriod,

    #[clap(flatten)]
    export: ExportArgs,

    /// Email the filtered and sorted rows to this address.
    #[arg(long)]
    email: Option<String>,

    /// The subject of the email.
    #[arg(long, default_value = "Sales Report")]
    subject: String,
}

impl SalesArgs {
    pub fn query(&self) -> ReportQuery {
        ReportQuery {
            filter: self.filter.clone(),
            sort: SortState::from_clicks(self.sort.iter().copied()),
            period: self.period,
        }
    }

    pub fn export(&self) -> &ExportArgs {
        &self.export
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// (Not shown): Args for the `eventory record-sale` command.
#[derive(Debug, Parser, Clone)]
pub struct RecordSaleArgs {
    /// The `_id` of the inventory item sold.
    #[arg(long)]
    item_id: String,

    #[arg(long)]
    quantity: u32,

    /// The sale date, YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,

    #[arg(long, value_enum, default_value_t = SaleType::Cash)]
    sale_type: SaleType,

    /// Required when --sale-type is Customer.
    #[arg(long, default_value = "")]
    customer_name: String,
}

impl RecordSaleArgs {
    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn sale_type(&self) -> SaleType {
        self.sale_type
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }
}

/// (Not shown): Args for the `eventory items` command.
#[derive(Debug, Parser, Clone)]
pub struct ItemsArgs {
    #[clap(flatten)]
    export: ExportArgs,
}

impl ItemsArgs {
    pub fn export(&self) -> &ExportArgs {
        &self.export
    }
}

/// (Not shown): Args for the `eventory ledger` command.
#[derive(Debug, Parser, Clone)]
pub struct LedgerArgs {
    /// The `_id` of the customer.
    #[arg(long)]
    customer_id: String,

    #[clap(flatten)]
    export: ExportArgs,

    /// Email the ledger to this address.
    #[arg(long)]
    email: Option<String>,
}

impl LedgerArgs {
    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn export(&self) -> &ExportArgs {
        &self.export
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

/// (Not shown): Args for the `eventory inventory` command.
#[derive(Debug, Parser, Clone)]
pub struct InventoryArgs {
    #[command(subcommand)]
    action: InventoryCommand,
}

impl InventoryArgs {
    pub fn action(&self) -> &InventoryCommand {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum InventoryCommand {
    /// List every item.
    List,
    /// List the items whose name or description contains the query.
    Search(SearchArgs),
    /// Add an item.
    Add(ItemArgs),
    /// Replace an item's fields.
    Update(UpdateItemArgs),
    /// Delete an item.
    Delete(IdArgs),
}

/// (Not shown): Args for the `eventory customers` command.
#[derive(Debug, Parser, Clone)]
pub struct CustomersArgs {
    #[command(subcommand)]
    action: CustomersCommand,
}

impl CustomersArgs {
    pub fn action(&self) -> &CustomersCommand {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum CustomersCommand {
    /// List every customer.
    List,
    /// List the customers whose name, address or mobile contains the query.
    Search(SearchArgs),
    /// Add a customer.
    Add(CustomerArgs),
    /// Replace a customer's fields.
    Update(UpdateCustomerArgs),
    /// Delete a customer.
    Delete(IdArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct SearchArgs {
    /// An empty query lists everything.
    #[arg(default_value = "")]
    query: String,
}

impl SearchArgs {
    pub fn query(&self) -> &str {
        &self.query
    }
}

#[derive(Debug, Parser, Clone)]
pub struct IdArgs {
    /// The record's `_id`.
    id: String,
}

impl IdArgs {
    pub fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Parser, Clone)]
pub struct ItemArgs {
    #[arg(long)]
    name: String,

    #[arg(long, default_value = "")]
    description: String,

    /// Units in stock.
    #[arg(long, default_value_t = 0)]
    quantity: u32,

    /// The unit price, e.g. 24.99 or $1,249.00
    #[arg(long)]
    price: Amount,
}

impl ItemArgs {
    pub fn form(&self, id: Option<String>) -> ItemForm {
        ItemForm {
            id,
            name: self.name.clone(),
            description: self.description.clone(),
            quantity: self.quantity,
            price: self.price,
        }
    }
}

#[derive(Debug, Parser, Clone)]
pub struct UpdateItemArgs {
    /// The item's `_id`.
    id: String,

    #[clap(flatten)]
    item: ItemArgs,
}

impl UpdateItemArgs {
    pub fn form(&self) -> ItemForm {
        self.item.form(Some(self.id.clone()))
    }
}

#[derive(Debug, Parser, Clone)]
pub struct CustomerArgs {
    #[arg(long)]
    name: String,

    #[arg(long, default_value = "")]
    address: String,

    #[arg(long, default_value = "")]
    mobile: String,
}

impl CustomerArgs {
    pub fn form(&self, id: Option<String>) -> CustomerForm {
        CustomerForm {
            id,
            name: self.name.clone(),
            address: self.address.clone(),
            mobile: self.mobile.clone(),
        }
    }
}

#[derive(Debug, Parser, Clone)]
pub struct UpdateCustomerArgs {
    /// The customer's `_id`.
    id: String,

    #[clap(flatten)]
    customer: CustomerArgs,
}

impl UpdateCustomerArgs {
    pub fn form(&self) -> CustomerForm {
        self.customer.form(Some(self.id.clone()))
    }
}

fn default_eventory_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("eventory"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --eventory-home or EVENTORY_HOME instead of relying on the \
                default eventory home directory. If you continue using the program right now, \
                you may have problems!",
            );
            PathBuf::from("eventory")
        }
    })
}

/// A `PathBuf` that clap can show as a default value.
#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

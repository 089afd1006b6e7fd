//! Command handlers for the eventory CLI.
//!
//! Each handler stands in for one screen of the front end. Rendered tables and charts go to
//! stdout; the outcome of the command is returned as an `Out`.

mod auth;
mod customers;
mod init;
mod inventory;
mod items;
mod ledger;
mod record_sale;
mod sales;

use crate::args::ExportArgs;
use crate::error::{ErrorType, IntoResult};
use crate::export::{self, ExportFormat, Table};
use crate::{utils, Config, Result};
use serde::Serialize;
use std::fmt::Debug;
use std::path::PathBuf;
use tracing::{debug, info};

pub use auth::{login, logout, register};
pub use customers::{customers_add, customers_delete, customers_list, customers_update};
pub use init::init;
pub use inventory::{inventory_add, inventory_delete, inventory_list, inventory_update};
pub use items::{items, ItemsOutput};
pub use ledger::ledger;
pub use record_sale::record_sale;
pub use sales::{sales, SalesOutput};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

fn with_note(message: String, note: Option<String>) -> String {
    match note {
        Some(note) => format!("{message}. {note}"),
        None => message,
    }
}

/// Writes `table` once per file format in `export`, naming each file with `name`. Returns the
/// paths written.
async fn write_exports<F>(
    config: &Config,
    export: &ExportArgs,
    table: &Table,
    name: F,
) -> Result<Vec<PathBuf>>
where
    F: Fn(ExportFormat) -> String,
{
    let formats: Vec<ExportFormat> = export.files().collect();
    if formats.is_empty() {
        return Ok(Vec::new());
    }
    let dir = export.out().unwrap_or(config.exports());
    utils::make_dir(dir).await.pub_result(ErrorType::Filesystem)?;

    let mut written = Vec::with_capacity(formats.len());
    for format in formats {
        let path = export::write(format, table, dir, &name(format)).await?;
        info!("Exported {format} to {}", path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Decoded, Rejected};

    #[test]
    fn test_rejected_note_is_appended() {
        let decoded: Decoded<u8> = Decoded::with_rejected(
            vec![1],
            vec![Rejected {
                index: 3,
                id: Some("s3".into()),
                reason: "bad date".into(),
            }],
        );
        let note = decoded.rejected_note();
        assert_eq!(
            with_note("Fetched 1 sale".into(), note),
            "Fetched 1 sale. 1 record was skipped because it failed validation"
        );
        assert_eq!(with_note("Done".into(), None), "Done");
    }

    #[test]
    fn test_out_from_message() {
        let out: Out<()> = "hello".into();
        assert_eq!(out.message(), "hello");
        assert!(out.structure().is_none());
    }
}

use crate::commands::Out;
use crate::{Config, Result};
use std::path::Path;

/// Creates the home directory, its subdirectories and an initial `config.json`.
///
/// # Arguments
/// - `eventory_home` - The directory that will be the root of the home directory, e.g.
///   `$HOME/eventory`
/// - `base_url` - The Eventory REST backend, e.g. `https://shop.example.com/api`. The default
///   local backend is used when `None`.
///
/// # Errors
/// - Returns an error if the base URL is invalid or any file operations fail.
pub async fn init(eventory_home: &Path, base_url: Option<&str>) -> Result<Out<()>> {
    let config = Config::create(eventory_home, base_url).await?;
    Ok(format!(
        "Created {} using the backend at {}",
        config.root().display(),
        config.base_url()
    )
    .into())
}

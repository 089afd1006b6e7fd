//! Session command handlers.
//!
//! - `eventory login` - exchange credentials for tokens and store them
//! - `eventory register` - create an account
//! - `eventory logout` - forget the stored tokens

use crate::api::{ApiClient, Registered};
use crate::commands::Out;
use crate::Result;
use tracing::debug;

/// Handles `eventory login`. The tokens are stored in the session's token store.
pub async fn login(client: &ApiClient, username: &str, password: &str) -> Result<Out<()>> {
    let tokens = client.login(username, password).await?;
    if let Some(at) = tokens.refresh_expires_at() {
        debug!("The refresh token expires at {at}");
    }
    Ok(format!("Logged in as {username}").into())
}

/// Handles `eventory register`. The password confirmation is checked before anything is sent.
pub async fn register(
    client: &ApiClient,
    username: &str,
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<Out<Registered>> {
    let registered = client.register(username, email, password, confirm).await?;
    let mut message = registered
        .message
        .clone()
        .unwrap_or_else(|| format!("Registered {username}"));
    if !registered.logged_in {
        message.push_str(". Run 'eventory login' to start a session");
    }
    Ok(Out::new(message, registered))
}

/// Handles `eventory logout`.
pub async fn logout(client: &ApiClient) -> Result<Out<()>> {
    client.logout().await?;
    Ok("Logged out".into())
}

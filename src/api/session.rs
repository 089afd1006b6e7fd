//! Session tokens and where they are kept.

use crate::clock::Clock;
use crate::error::{Error, ErrorType, IntoResult, Res, Result};
use crate::utils;
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, trace};

const ACCESS_TTL_DAYS: i64 = 1;
const REGISTER_ACCESS_TTL_MINUTES: i64 = 15;
const REFRESH_TTL_DAYS: i64 = 7;

/// How long the access token from a login lasts.
pub fn login_access_ttl() -> Duration {
    Duration::days(ACCESS_TTL_DAYS)
}

/// Registration hands out a short-lived access token; the refresh token still lasts seven days.
pub fn register_access_ttl() -> Duration {
    Duration::minutes(REGISTER_ACCESS_TTL_MINUTES)
}

/// The access and refresh tokens issued by the backend, with the times they stop being usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tokens {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    access_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    refresh_expires_at: Option<DateTime<Utc>>,
}

impl Tokens {
    /// Tokens issued at `now`: the access token lasts one day and the refresh token seven.
    pub fn issued(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self::issued_for(access_token, refresh_token, now, login_access_ttl())
    }

    /// Tokens issued at `now` whose access token lasts `access_ttl`.
    pub fn issued_for(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        now: DateTime<Utc>,
        access_ttl: Duration,
    ) -> Self {
        let refresh_expires_at = refresh_token
            .as_ref()
            .map(|_| now + Duration::days(REFRESH_TTL_DAYS));
        Self {
            access_token: access_token.into(),
            refresh_token,
            access_expires_at: Some(now + access_ttl),
            refresh_expires_at,
        }
    }

    /// Replaces the access token, issued at `now`. The refresh token and its expiry are kept.
    pub fn with_access(self, access_token: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            access_expires_at: Some(now + Duration::days(ACCESS_TTL_DAYS)),
            ..self
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn access_expires_at(&self) -> Option<DateTime<Utc>> {
        self.access_expires_at
    }

    pub fn refresh_expires_at(&self) -> Option<DateTime<Utc>> {
        self.refresh_expires_at
    }

    /// A token with no recorded expiry is treated as valid; the backend has the final say.
    pub fn access_valid(&self, now: DateTime<Utc>) -> bool {
        self.access_expires_at.map_or(true, |at| now < at)
    }

    pub fn refresh_valid(&self, now: DateTime<Utc>) -> bool {
        self.refresh_token.is_some() && self.refresh_expires_at.map_or(true, |at| now < at)
    }
}

/// Where tokens are kept between requests.
#[async_trait::async_trait]
pub trait TokenStore: Debug + Send + Sync {
    /// `None` when nobody is logged in.
    async fn load(&self) -> anyhow::Result<Option<Tokens>>;
    async fn save(&self, tokens: &Tokens) -> anyhow::Result<()>;
    async fn clear(&self) -> anyhow::Result<()>;
}

/// Keeps tokens in a JSON file that only the owner can read.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Res<Option<Tokens>> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            trace!("No token file at {}", self.path.display());
            return Ok(None);
        }
        let tokens: Tokens = utils::deserialize(&self.path).await?;
        Ok(Some(tokens))
    }

    async fn save(&self, tokens: &Tokens) -> Res<()> {
        if let Some(parent) = self.path.parent() {
            utils::make_dir(parent).await?;
        }
        let json = serde_json::to_string_pretty(tokens).context("Unable to serialize tokens")?;
        utils::write(&self.path, json).await?;
        utils::restrict_permissions(&self.path)?;
        debug!("Tokens saved to {}", self.path.display());
        Ok(())
    }

    async fn clear(&self) -> Res<()> {
        utils::remove_file(&self.path).await
    }
}

/// Keeps tokens in memory only.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<Option<Tokens>>,
}

impl MemoryTokenStore {
    pub fn with_tokens(tokens: Tokens) -> Self {
        Self {
            tokens: Mutex::new(Some(tokens)),
        }
    }
}

#[async_trait::async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Res<Option<Tokens>> {
        Ok(self.tokens.lock().await.clone())
    }

    async fn save(&self, tokens: &Tokens) -> Res<()> {
        *self.tokens.lock().await = Some(tokens.clone());
        Ok(())
    }

    async fn clear(&self) -> Res<()> {
        *self.tokens.lock().await = None;
        Ok(())
    }
}

/// The logged-in user's tokens plus the clock used to judge their expiry. There is no global token
/// state; a `Session` is handed to each `ApiClient`.
#[derive(Debug, Clone)]
pub struct Session {
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
}

impl Session {
    pub fn new(store: Arc<dyn TokenStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The stored tokens. Not being logged in is an `Auth` error.
    pub async fn tokens(&self) -> Result<Tokens> {
        self.store
            .load()
            .await
            .pub_result(ErrorType::Filesystem)?
            .ok_or_else(|| Error::msg(ErrorType::Auth, "Not logged in, run 'eventory login' first"))
    }

    /// Stores freshly issued tokens, replacing any previous session. The access token is treated
    /// as expired once `access_ttl` has passed.
    pub async fn begin(
        &self,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        access_ttl: Duration,
    ) -> Result<Tokens> {
        let tokens = Tokens::issued_for(access_token, refresh_token, self.now(), access_ttl);
        self.store
            .save(&tokens)
            .await
            .pub_result(ErrorType::Filesystem)?;
        Ok(tokens)
    }

    /// Stores a refreshed access token.
    pub async fn update_access(&self, access_token: impl Into<String>) -> Result<Tokens> {
        let tokens = self.tokens().await?.with_access(access_token, self.now());
        self.store
            .save(&tokens)
            .await
            .pub_result(ErrorType::Filesystem)?;
        Ok(tokens)
    }

    /// Forgets the stored tokens.
    pub async fn end(&self) -> Result<()> {
        self.store.clear().await.pub_result(ErrorType::Filesystem)
    }
}

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use jiff::Timestamp;
use tokio::sync::{Mutex, RwLock, RwLockWriteGuard};
use tracing::{debug, warn};

use crate::config::Config;
use crate::errors::Error;

use super::envelope::{SameSite, StoredToken, TokenSnapshot};
use super::jwt::{Claims, decode_jwt_payload};

/// Holds the access/refresh token pair, each under its own key and expiry.
///
/// Memory is the source of truth. The optional token file mirrors it; a failed
/// write is reported to the caller but the in-memory change stands.
pub struct TokenStore {
    access_key: String,
    refresh_key: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
    secure: bool,
    entries: RwLock<BTreeMap<String, StoredToken>>,
    file: Option<PathBuf>,
    // held from snapshot to rename so files land in mutation order
    writes: Mutex<()>,
}

impl TokenStore {
    /// Builds a store from `config`, loading the persisted snapshot when
    /// `token_file` is set.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let entries = match config.token_file.as_deref() {
            Some(path) => load_snapshot(path)?,
            None => BTreeMap::new(),
        };
        Ok(Self {
            access_key: config.token_key.clone(),
            refresh_key: config.refresh_token_key.clone(),
            access_ttl: Duration::from_secs(config.access_token_ttl_secs),
            refresh_ttl: Duration::from_secs(config.refresh_token_ttl_secs),
            secure: config.secure_cookies(),
            entries: RwLock::new(entries),
            file: config.token_file.clone(),
            writes: Mutex::new(()),
        })
    }

    pub async fn access_token(&self) -> Option<String> {
        self.read_live(&self.access_key).await
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.read_live(&self.refresh_key).await
    }

    /// Replaces both tokens under a single write lock, then mirrors them to the
    /// token file once the lock is released.
    pub async fn set_tokens(
        &self,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Result<(), Error> {
        let now = Timestamp::now();
        let mut entries = self.entries.write().await;
        entries.insert(
            self.access_key.clone(),
            self.stored(access_token.into(), now, self.access_ttl),
        );
        entries.insert(
            self.refresh_key.clone(),
            self.stored(refresh_token.into(), now, self.refresh_ttl),
        );
        debug!(access_key = %self.access_key, "token.set");
        self.persist(entries).await
    }

    pub async fn clear_tokens(&self) -> Result<(), Error> {
        let mut entries = self.entries.write().await;
        let removed = entries.remove(&self.access_key).is_some()
            | entries.remove(&self.refresh_key).is_some();
        if !removed {
            return Ok(());
        }
        debug!(access_key = %self.access_key, "token.clear");
        self.persist(entries).await
    }

    /// True when the access token is absent, undecodable, or expires within `threshold`.
    pub async fn is_access_token_expiring_soon(&self, threshold: Duration) -> bool {
        match self.claims().await {
            Some(claims) => claims.expires_within(threshold, Timestamp::now().as_millisecond()),
            None => true,
        }
    }

    pub async fn claims(&self) -> Option<Claims> {
        let token = self.access_token().await?;
        decode_jwt_payload(&token)
    }

    /// The stored entry for the access token, including its transport flags.
    pub async fn access_entry(&self) -> Option<StoredToken> {
        self.entries.read().await.get(&self.access_key).cloned()
    }

    async fn read_live(&self, key: &str) -> Option<String> {
        let now = Timestamp::now();
        self.entries
            .read()
            .await
            .get(key)
            .filter(|token| token.is_live(now))
            .map(|token| token.value.clone())
    }

    fn stored(&self, value: String, now: Timestamp, ttl: Duration) -> StoredToken {
        StoredToken {
            value,
            expires_at: now.checked_add(ttl).unwrap_or(Timestamp::MAX),
            secure: self.secure,
            same_site: SameSite::Strict,
        }
    }

    async fn persist(
        &self,
        entries: RwLockWriteGuard<'_, BTreeMap<String, StoredToken>>,
    ) -> Result<(), Error> {
        let Some(path) = self.file.as_deref() else {
            return Ok(());
        };
        let snapshot = TokenSnapshot {
            entries: entries.clone(),
        };
        let _writing = self.writes.lock().await;
        drop(entries);

        write_snapshot(path, &snapshot).await.inspect_err(|err| {
            warn!(path = %path.display(), error = %err, "token.persist_failed");
        })
    }
}

async fn write_snapshot(path: &Path, snapshot: &TokenSnapshot) -> Result<(), Error> {
    let staging = path.with_extension("tmp");
    tokio::fs::write(&staging, serde_json::to_vec_pretty(snapshot)?).await?;
    tokio::fs::rename(&staging, path).await?;
    Ok(())
}

fn load_snapshot(path: &Path) -> Result<BTreeMap<String, StoredToken>, Error> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let snapshot: TokenSnapshot = serde_json::from_str(&contents)?;
            Ok(snapshot.live(Timestamp::now()))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(err) => Err(err.into()),
    }
}

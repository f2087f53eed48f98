use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

/// A stored token with its own expiry and transport flags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub value: String,
    pub expires_at: Timestamp,
    pub secure: bool,
    pub same_site: SameSite,
}

impl StoredToken {
    pub fn is_live(&self, now: Timestamp) -> bool {
        now < self.expires_at
    }
}

/// On-disk form of the token store.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TokenSnapshot {
    pub entries: BTreeMap<String, StoredToken>,
}

impl TokenSnapshot {
    /// Keeps only entries still live at `now`.
    pub fn live(self, now: Timestamp) -> BTreeMap<String, StoredToken> {
        self.entries
            .into_iter()
            .filter(|(_, token)| token.is_live(now))
            .collect()
    }
}

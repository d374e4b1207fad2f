use std::{
    collections::HashMap,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use {
    anyhow::Result,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize, Serializer},
};

/// A credential issued by the identity provider, as persisted on disk.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoredToken {
    #[serde(serialize_with = "serialize_secret")]
    pub access_token: Secret<String>,
    /// Unix timestamp (seconds) after which the token is no longer valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

impl std::fmt::Debug for StoredToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredToken")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl StoredToken {
    pub fn new(access_token: impl Into<String>, expires_at: Option<u64>) -> Self {
        Self {
            access_token: Secret::new(access_token.into()),
            expires_at,
        }
    }

    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|ts| ts <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(unix_now())
    }
}

pub fn serialize_secret<S: Serializer>(secret: &Secret<String>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(secret.expose_secret())
}

/// Current unix time in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// File-based token storage at `~/.config/textrelay/session.json`,
/// keyed by profile name.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new() -> Self {
        let path = textrelay_config::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("session.json");
        Self { path }
    }

    /// Create a token store at a specific path (useful for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn load(&self, profile: &str) -> Option<StoredToken> {
        self.read_all().remove(profile)
    }

    pub fn save(&self, profile: &str, token: &StoredToken) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut map = self.read_all();
        map.insert(profile.to_string(), token.clone());

        let data = serde_json::to_string_pretty(&map)?;
        std::fs::write(&self.path, &data)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// Remove `profile`. An unreadable store is rewritten without it.
    pub fn delete(&self, profile: &str) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }

        let mut map = self.read_all();
        map.remove(profile);

        let data = serde_json::to_string_pretty(&map)?;
        std::fs::write(&self.path, &data)?;
        Ok(())
    }

    pub fn list(&self) -> Vec<String> {
        let mut profiles: Vec<String> = self.read_all().into_keys().collect();
        profiles.sort();
        profiles
    }

    fn read_all(&self) -> HashMap<String, StoredToken> {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|d| serde_json::from_str(&d).ok())
            .unwrap_or_default()
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

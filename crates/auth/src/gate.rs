//! Session capability consumed by the sender.
//!
//! The identity provider is external; these types only answer "is a session
//! active", "give me a credential for this request" and "end the session".

use {
    anyhow::Result,
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    tracing::debug,
};

use {
    crate::storage::TokenStore,
    textrelay_config::SessionConfig,
};

/// Short-lived bearer credential. Fetched fresh for every submission.
#[derive(Clone)]
pub struct Credential(Secret<String>);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Secret::new(token.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

impl From<Secret<String>> for Credential {
    fn from(secret: Secret<String>) -> Self {
        Self(secret)
    }
}

#[async_trait]
pub trait SessionGate: Send + Sync {
    /// Whether a session is currently active. When false, sending must not be offered.
    fn is_authenticated(&self) -> bool;

    /// Produce a credential for one request, or `None` if no valid session exists now.
    async fn credential(&self) -> Option<Credential>;

    /// Terminate the session.
    async fn sign_out(&self) -> Result<()>;
}

/// Session backed by the on-disk [`TokenStore`].
#[derive(Debug, Clone)]
pub struct TokenSession {
    store: TokenStore,
    profile: String,
}

impl TokenSession {
    pub fn new(store: TokenStore, profile: impl Into<String>) -> Self {
        Self {
            store,
            profile: profile.into(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        let store = match &config.token_file {
            Some(path) => TokenStore::with_path(path.clone()),
            None => TokenStore::new(),
        };
        Self::new(store, config.profile.clone())
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    fn current(&self) -> Option<Credential> {
        let token = self.store.load(&self.profile)?;
        if token.is_expired() {
            debug!(profile = %self.profile, "stored session has expired");
            return None;
        }
        Some(token.access_token.into())
    }
}

#[async_trait]
impl SessionGate for TokenSession {
    fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    async fn credential(&self) -> Option<Credential> {
        self.current()
    }

    async fn sign_out(&self) -> Result<()> {
        self.store.delete(&self.profile)
    }
}

/// Session with a fixed credential, e.g. from `TEXTRELAY_TOKEN`.
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    token: Option<Credential>,
}

impl StaticSession {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()).map(Credential::new),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionGate for StaticSession {
    fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    async fn credential(&self) -> Option<Credential> {
        self.token.clone()
    }

    async fn sign_out(&self) -> Result<()> {
        Ok(())
    }
}

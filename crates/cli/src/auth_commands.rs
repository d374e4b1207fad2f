use std::io::Read;

use {
    anyhow::Result,
    clap::Subcommand,
    textrelay_auth::{SessionGate, StoredToken, TokenSession, TokenStore, unix_now},
};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store a credential issued by the identity provider.
    Login {
        /// Access token. Use "-" to read it from stdin.
        #[arg(long)]
        token: String,
        /// Seconds until the token expires.
        #[arg(long)]
        expires_in: Option<u64>,
    },
    /// Show stored sessions and whether they are still valid.
    Status,
    /// End the current session.
    Logout,
}

pub async fn handle_auth(action: AuthAction, session: &TokenSession) -> Result<()> {
    match action {
        AuthAction::Login { token, expires_in } => login(session, &token, expires_in),
        AuthAction::Status => status(session.store()),
        AuthAction::Logout => logout(session).await,
    }
}

fn login(session: &TokenSession, token: &str, expires_in: Option<u64>) -> Result<()> {
    let token = if token == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf.trim().to_string()
    } else {
        token.to_string()
    };
    anyhow::ensure!(!token.is_empty(), "token must not be empty");

    let expires_at = expires_in.map(|secs| unix_now().saturating_add(secs));
    session
        .store()
        .save(session.profile(), &StoredToken::new(token, expires_at))?;

    println!("Signed in as profile {}", session.profile());
    Ok(())
}

fn status(store: &TokenStore) -> Result<()> {
    let profiles = store.list();
    if profiles.is_empty() {
        println!("No active sessions.");
        return Ok(());
    }
    let now = unix_now();
    for profile in profiles {
        if let Some(token) = store.load(&profile) {
            println!("{profile} [{}]", describe_expiry(token.expires_at, now));
        }
    }
    Ok(())
}

async fn logout(session: &TokenSession) -> Result<()> {
    session.sign_out().await?;
    println!("Signed out of profile {}", session.profile());
    Ok(())
}

fn describe_expiry(expires_at: Option<u64>, now: u64) -> String {
    match expires_at {
        None => "no expiry".to_string(),
        Some(ts) if ts > now => {
            let remaining = ts - now;
            let hours = remaining / 3600;
            let mins = (remaining % 3600) / 60;
            format!("valid ({hours}h {mins}m remaining)")
        },
        Some(_) => "expired".to_string(),
    }
}

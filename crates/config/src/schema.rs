//! Config schema types (relay endpoint, relay contract, session source).
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Relay endpoint used when no config file says otherwise.
pub const DEFAULT_RELAY_URL: &str = "https://proxy.api.permit.io/proxy/9cab406f273644cb84d6800ae00025cc?url=https://api.nexmo.com/v1/messages";

/// Sender identifier used when no config file says otherwise.
pub const DEFAULT_SENDER_ID: &str = "14157386102";

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextrelayConfig {
    pub relay: RelayConfig,
    pub session: SessionConfig,
}

/// Relay endpoint and the versioned contract it speaks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Full URL the send request is POSTed to.
    pub url: String,

    /// Fixed `from` identifier placed in every request.
    pub sender_id: String,

    /// Contract preset; individual fields below override it.
    pub contract: ContractVersion,

    /// Override the status code treated as success.
    pub success_status: Option<u16>,

    /// Override how the credential is placed in the `Authorization` header.
    pub auth_scheme: Option<AuthScheme>,

    /// Override the name of the message type field in the request body.
    pub message_type_field: Option<MessageTypeField>,

    /// Request timeout in seconds. No timeout when unset.
    pub timeout_secs: Option<u64>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_RELAY_URL.into(),
            sender_id: DEFAULT_SENDER_ID.into(),
            contract: ContractVersion::default(),
            success_status: None,
            auth_scheme: None,
            message_type_field: None,
            timeout_secs: None,
        }
    }
}

impl RelayConfig {
    /// Resolve the preset plus any per-field overrides.
    pub fn contract(&self) -> RelayContract {
        let base = self.contract.preset();
        RelayContract {
            success_status: self.success_status.unwrap_or(base.success_status),
            auth_scheme: self.auth_scheme.unwrap_or(base.auth_scheme),
            message_type_field: self.message_type_field.unwrap_or(base.message_type_field),
        }
    }
}

/// Known relay/provider API generations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractVersion {
    /// Raw token header, `200 OK`, camelCase `messageType`.
    Legacy,
    /// `Bearer` header, `202 Accepted`, snake_case `message_type`.
    #[default]
    V1,
}

impl ContractVersion {
    pub fn preset(self) -> RelayContract {
        match self {
            Self::Legacy => RelayContract {
                success_status: 200,
                auth_scheme: AuthScheme::Raw,
                message_type_field: MessageTypeField::CamelCase,
            },
            Self::V1 => RelayContract {
                success_status: 202,
                auth_scheme: AuthScheme::Bearer,
                message_type_field: MessageTypeField::SnakeCase,
            },
        }
    }
}

impl std::str::FromStr for ContractVersion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "v1" => Ok(Self::V1),
            other => anyhow::bail!("unknown relay contract: {other}"),
        }
    }
}

/// How the credential is carried in the `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    /// `Authorization: <token>`
    Raw,
    /// `Authorization: Bearer <token>`
    Bearer,
}

impl AuthScheme {
    pub fn header_value(self, token: &str) -> String {
        match self {
            Self::Raw => token.to_string(),
            Self::Bearer => format!("Bearer {token}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageTypeField {
    /// `messageType`
    CamelCase,
    /// `message_type`
    SnakeCase,
}

impl MessageTypeField {
    pub fn key(self) -> &'static str {
        match self {
            Self::CamelCase => "messageType",
            Self::SnakeCase => "message_type",
        }
    }
}

/// Fully resolved contract parameters handed to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayContract {
    pub success_status: u16,
    pub auth_scheme: AuthScheme,
    pub message_type_field: MessageTypeField,
}

impl Default for RelayContract {
    fn default() -> Self {
        ContractVersion::default().preset()
    }
}

/// Where the session credential comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Profile key inside the token store.
    pub profile: String,

    /// Override the token store location.
    pub token_file: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            profile: "default".into(),
            token_file: None,
        }
    }
}

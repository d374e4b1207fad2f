//! One-shot authenticated send through the relay.
//!
//! Each call makes exactly one POST. The HTTP result is classified into
//! success, a remote rejection (with the relay's `detail` text when present),
//! or a transport failure. Nothing is retried.

use std::time::Duration;

use {
    reqwest::{Client, header::AUTHORIZATION},
    serde_json::Value,
    tracing::debug,
};

use {
    crate::request::SendRequest,
    textrelay_auth::{Credential, SessionGate},
    textrelay_config::{RelayConfig, RelayContract},
};

/// Message shown when the relay rejects a send without a `detail`.
pub const GENERIC_SEND_ERROR: &str = "Error sending message";

/// Message shown when no credential could be obtained.
pub const NO_TOKEN: &str = "No token";

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The session gate had no credential; no request was made.
    #[error("No token")]
    AuthUnavailable,

    /// The relay answered with something other than the success status.
    #[error("{message}")]
    RemoteRejected { status: u16, message: String },

    /// No response was received.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Pick the user-facing message out of a rejection body.
///
/// Only a non-blank string `detail` on a JSON object is surfaced.
pub fn rejection_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(Value::as_object)
        .and_then(|o| o.get("detail"))
        .and_then(Value::as_str)
        .filter(|d| !d.trim().is_empty())
        .map_or_else(|| GENERIC_SEND_ERROR.to_string(), str::to_string)
}

/// Client for the relay endpoint, configured for one contract version.
#[derive(Debug, Clone)]
pub struct RelaySender {
    client: Client,
    url: String,
    sender_id: String,
    contract: RelayContract,
}

impl RelaySender {
    #[must_use]
    pub fn new(url: impl Into<String>, sender_id: impl Into<String>, contract: RelayContract) -> Self {
        Self::with_client(Client::new(), url, sender_id, contract)
    }

    #[must_use]
    pub fn with_client(
        client: Client,
        url: impl Into<String>,
        sender_id: impl Into<String>,
        contract: RelayContract,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            sender_id: sender_id.into(),
            contract,
        }
    }

    /// Build a sender from the `[relay]` config section.
    pub fn from_config(config: &RelayConfig) -> reqwest::Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self::with_client(
            builder.build()?,
            config.url.clone(),
            config.sender_id.clone(),
            config.contract(),
        ))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn contract(&self) -> RelayContract {
        self.contract
    }

    pub fn request(&self, to: &str, text: &str) -> SendRequest {
        SendRequest::new(
            self.sender_id.as_str(),
            to,
            text,
            self.contract.message_type_field,
        )
    }

    /// POST one message with an already obtained credential.
    pub async fn send(&self, to: &str, text: &str, credential: &Credential) -> Result<(), SendError> {
        let request = self.request(to, text);
        debug!(url = %self.url, "sending message through relay");

        let response = self
            .client
            .post(&self.url)
            .header(
                AUTHORIZATION,
                self.contract.auth_scheme.header_value(credential.expose()),
            )
            .json(&request)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status == self.contract.success_status {
            debug!(status, "relay accepted message");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let message = rejection_message(&body);
        debug!(status, "relay rejected message");
        Err(SendError::RemoteRejected { status, message })
    }

    /// Fetch a fresh credential from `gate`, then send.
    ///
    /// Returns [`SendError::AuthUnavailable`] without touching the network
    /// when the gate has no credential.
    pub async fn send_with_session(
        &self,
        gate: &dyn SessionGate,
        to: &str,
        text: &str,
    ) -> Result<(), SendError> {
        let Some(credential) = gate.credential().await else {
            debug!("no credential available, skipping send");
            return Err(SendError::AuthUnavailable);
        };
        self.send(to, text, &credential).await
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        serde_json::json,
        textrelay_auth::StaticSession,
        textrelay_config::ContractVersion,
        wiremock::{
            Mock, MockServer, ResponseTemplate,
            matchers::{body_json, header, method, path},
        },
    };

    const SENDER: &str = "14157386102";

    fn sender_for(server: &MockServer, version: ContractVersion) -> RelaySender {
        RelaySender::new(format!("{}/send", server.uri()), SENDER, version.preset())
    }

    #[test]
    fn rejection_message_uses_detail() {
        assert_eq!(rejection_message(r#"{"detail":"invalid recipient"}"#), "invalid recipient");
    }

    #[test]
    fn rejection_message_falls_back() {
        assert_eq!(rejection_message(""), GENERIC_SEND_ERROR);
        assert_eq!(rejection_message("<html>bad gateway</html>"), GENERIC_SEND_ERROR);
        assert_eq!(rejection_message(r#"{"title":"Bad"}"#), GENERIC_SEND_ERROR);
        assert_eq!(rejection_message(r#"{"detail":null}"#), GENERIC_SEND_ERROR);
        assert_eq!(rejection_message(r#"{"detail":5}"#), GENERIC_SEND_ERROR);
    }

    #[test]
    fn rejection_message_ignores_non_object_bodies() {
        assert_eq!(rejection_message(r#"["detail"]"#), GENERIC_SEND_ERROR);
        assert_eq!(rejection_message(r#"["Service unavailable"]"#), GENERIC_SEND_ERROR);
        assert_eq!(rejection_message(r#""detail""#), GENERIC_SEND_ERROR);
    }

    #[test]
    fn rejection_message_ignores_blank_detail() {
        assert_eq!(rejection_message(r#"{"detail":""}"#), GENERIC_SEND_ERROR);
        assert_eq!(rejection_message(r#"{"detail":"   "}"#), GENERIC_SEND_ERROR);
    }

    #[tokio::test]
    async fn v1_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(header("authorization", "Bearer tok-1"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "from": SENDER,
                "to": "+15551234567",
                "text": "hello",
                "channel": "sms",
                "message_type": "text",
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        sender_for(&server, ContractVersion::V1)
            .send("+15551234567", "hello", &Credential::new("tok-1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn legacy_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(header("authorization", "tok-1"))
            .and(body_json(json!({
                "from": SENDER,
                "to": "+15551234567",
                "text": "hello",
                "channel": "sms",
                "messageType": "text",
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        sender_for(&server, ContractVersion::Legacy)
            .send("+15551234567", "hello", &Credential::new("tok-1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn other_2xx_is_not_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let err = sender_for(&server, ContractVersion::V1)
            .send("x", "y", &Credential::new("t"))
            .await
            .unwrap_err();
        match err {
            SendError::RemoteRejected { status, message } => {
                assert_eq!(status, 200);
                assert_eq!(message, GENERIC_SEND_ERROR);
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn detail_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"detail": "invalid recipient"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = sender_for(&server, ContractVersion::V1)
            .send("bogus", "hello", &Credential::new("t"))
            .await
            .unwrap_err();
        assert!(matches!(err, SendError::RemoteRejected { status: 400, .. }));
        assert_eq!(err.to_string(), "invalid recipient");
    }

    #[tokio::test]
    async fn empty_error_body_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = sender_for(&server, ContractVersion::V1)
            .send("x", "y", &Credential::new("t"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), GENERIC_SEND_ERROR);
    }

    #[tokio::test]
    async fn missing_credential_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202))
            .expect(0)
            .mount(&server)
            .await;

        let err = sender_for(&server, ContractVersion::V1)
            .send_with_session(&StaticSession::signed_out(), "x", "y")
            .await
            .unwrap_err();
        assert!(matches!(err, SendError::AuthUnavailable));
        assert_eq!(err.to_string(), NO_TOKEN);
    }

    #[tokio::test]
    async fn session_credential_is_used() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer from-session"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        sender_for(&server, ContractVersion::V1)
            .send_with_session(&StaticSession::new(Some("from-session".into())), "x", "y")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unreachable_relay_is_transport_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let sender = RelaySender::new(
            format!("http://127.0.0.1:{port}/send"),
            SENDER,
            RelayContract::default(),
        );

        let err = sender.send("x", "y", &Credential::new("t")).await.unwrap_err();
        let SendError::Transport(inner) = &err else {
            panic!("expected transport error, got {err:?}");
        };
        assert_eq!(err.to_string(), inner.to_string());
    }

    #[test]
    fn from_config_resolves_contract() {
        let config = RelayConfig {
            url: "http://relay.test/send".into(),
            contract: ContractVersion::Legacy,
            timeout_secs: Some(5),
            ..Default::default()
        };
        let sender = RelaySender::from_config(&config).unwrap();
        assert_eq!(sender.url(), "http://relay.test/send");
        assert_eq!(sender.contract(), ContractVersion::Legacy.preset());
        assert_eq!(sender.request("a", "b").sender(), config.sender_id);
    }
}

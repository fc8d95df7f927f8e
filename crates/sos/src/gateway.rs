//! SMS gateways

use async_trait::async_trait;
use guardian_rust_session::SessionRepository;
use log::{debug, warn};
use reqwest::Client;
use url::Url;

use crate::alert::EmergencyAlert;
use crate::{Result, SosError};

/// Backend path of the authenticated SMS proxy
pub const PROXY_SEND_PATH: &str = "/api/sos/send";

/// What the gateway answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayReceipt {
    pub status: u16,
    pub body: String,
}

/// Delivers an alert to its recipient
#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send(&self, alert: &EmergencyAlert) -> Result<GatewayReceipt>;
}

async fn receipt(response: reqwest::Response) -> Result<GatewayReceipt> {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if !status.is_success() {
        warn!("SMS gateway rejected alert with status {}", status);
        return Err(SosError::GatewayError {
            status: status.as_u16(),
            message: body,
        });
    }

    debug!("SMS gateway accepted alert: {}", body);
    Ok(GatewayReceipt {
        status: status.as_u16(),
        body,
    })
}

/// Sends through the backend, authenticated with the session token.
///
/// The SMS provider credential stays on the server.
#[derive(Debug, Clone)]
pub struct ProxySmsGateway {
    endpoint: Url,
    http_client: Client,
    repository: SessionRepository,
}

impl ProxySmsGateway {
    pub fn new(base_url: &str, http_client: Client, repository: SessionRepository) -> Result<Self> {
        let base = base_url.trim_end_matches('/');
        let endpoint = Url::parse(&format!("{}{}", base, PROXY_SEND_PATH))?;
        Ok(Self {
            endpoint,
            http_client,
            repository,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SmsGateway for ProxySmsGateway {
    async fn send(&self, alert: &EmergencyAlert) -> Result<GatewayReceipt> {
        let token = self
            .repository
            .token()
            .await?
            .ok_or(SosError::Unauthenticated)?;

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .bearer_auth(token)
            .form(&[
                ("to", alert.recipient.as_str()),
                ("message", alert.message.as_str()),
            ])
            .send()
            .await?;

        receipt(response).await
    }
}

/// Posts straight to a bulk SMS provider.
///
/// The provider token comes from configuration. Shipping it inside a client
/// build exposes it to every user, so this gateway belongs on the server side
/// of [`ProxySmsGateway`] or in operator tooling.
#[derive(Clone)]
pub struct BulkSmsGateway {
    endpoint: Url,
    api_token: String,
    http_client: Client,
}

impl BulkSmsGateway {
    pub fn new(endpoint: &str, api_token: &str, http_client: Client) -> Result<Self> {
        Ok(Self {
            endpoint: Url::parse(endpoint)?,
            api_token: api_token.to_string(),
            http_client,
        })
    }
}

impl std::fmt::Debug for BulkSmsGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkSmsGateway")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl SmsGateway for BulkSmsGateway {
    async fn send(&self, alert: &EmergencyAlert) -> Result<GatewayReceipt> {
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .form(&[
                ("token", self.api_token.as_str()),
                ("to", alert.recipient.as_str()),
                ("message", alert.message.as_str()),
            ])
            .send()
            .await?;

        receipt(response).await
    }
}

use reqwest::{Client as ReqwestClient, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;

use crate::config::CloudflareConfig;
use crate::utils::{ExportError, ExportResult};

/// Ruleset phase holding user-defined firewall rules
pub const CUSTOM_FIREWALL_PHASE: &str = "http_request_firewall_custom";

/// Represents a Cloudflare API response
#[derive(Debug, Deserialize)]
pub struct CloudflareResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<CloudflareError>,
    #[serde(default)]
    pub messages: Vec<serde_json::Value>,
    pub result: Option<T>,
}

impl<T> CloudflareResponse<T> {
    /// First reported error message, for logging
    pub fn error_summary(&self) -> String {
        self.errors
            .first()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

/// Represents a Cloudflare API error
#[derive(Debug, Deserialize)]
pub struct CloudflareError {
    pub code: i32,
    pub message: String,
}

impl fmt::Display for CloudflareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// Zone entry as returned by `GET /zones`
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub account: ZoneAccount,
}

/// Owning account of a zone
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZoneAccount {
    #[serde(default)]
    pub name: String,
}

/// A zone selected for export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    pub id: String,
    pub name: String,
    pub account_name: String,
}

impl From<ZoneRecord> for Zone {
    fn from(record: ZoneRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            account_name: record.account.name,
        }
    }
}

/// Phase entrypoint ruleset
#[derive(Debug, Default, Deserialize)]
pub struct Ruleset {
    #[serde(default)]
    pub rules: Vec<FirewallRule>,
}

/// Represents a Cloudflare custom firewall rule
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FirewallRule {
    pub id: String,
    #[serde(default)]
    pub version: String,
    pub action: String,
    #[serde(default)]
    pub expression: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

/// Client for interacting with Cloudflare's API
pub struct CloudflareClient {
    client: ReqwestClient,
    api_token: String,
    base_url: String,
}

impl CloudflareClient {
    /// Creates a new Cloudflare client
    pub fn new(config: &CloudflareConfig) -> ExportResult<Self> {
        Ok(Self {
            client: ReqwestClient::builder()
                .timeout(config.request_timeout())
                .build()?,
            api_token: config.api_token.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetches one page of zones visible to the token
    pub async fn list_zones(
        &self,
        page: u32,
        per_page: u32,
    ) -> ExportResult<CloudflareResponse<Vec<ZoneRecord>>> {
        let url = format!("{}/zones", self.base_url);

        let response = self.client
            .get(&url)
            .bearer_auth(&self.api_token)
            .query(&[("page", page), ("per_page", per_page)])
            .send()
            .await?;

        Self::decode(response).await
    }

    /// Fetches the custom firewall entrypoint ruleset of a zone
    pub async fn get_custom_ruleset(
        &self,
        zone_id: &str,
    ) -> ExportResult<CloudflareResponse<Ruleset>> {
        let url = format!(
            "{}/zones/{}/rulesets/phases/{}/entrypoint",
            self.base_url, zone_id, CUSTOM_FIREWALL_PHASE
        );

        let response = self.client
            .get(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ExportResult<T> {
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(ExportError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

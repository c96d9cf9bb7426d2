//! Shared HTTP plumbing for the Bedrock Runtime API.
//!
//! Both the embedding client and the generation provider authenticate with a
//! Bedrock API key sent as a Bearer token. The key is wrapped in
//! [`SecretString`] and only exposed when building the `Authorization` header.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Prefix used to identify Bedrock API keys.
const KEY_PREFIX: &str = "bedrock-api-key-";

/// Failure of one Bedrock HTTP exchange, before it is mapped onto the
/// caller's error vocabulary.
#[derive(Debug, thiserror::Error)]
pub(crate) enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse response: {0}")]
    Decode(String),

    #[error("invalid endpoint: {0}")]
    Endpoint(String),
}

pub(crate) struct BedrockTransport {
    client: reqwest::Client,
    bearer: SecretString,
    region: String,
    endpoint: String,
}

// Intentionally no Debug: the bearer token must never be formatted.

impl BedrockTransport {
    /// Build a transport for `region`.
    ///
    /// If the key starts with `bedrock-api-key-`, the prefix is stripped and
    /// the remainder is used as the Bearer token. When the token's embedded
    /// credential scope names a region, that region wins.
    pub(crate) fn new(api_key: &SecretString, region: &str) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;

        let raw_key = api_key.expose_secret();
        let token = raw_key.strip_prefix(KEY_PREFIX).unwrap_or(raw_key);
        let region = detect_region_from_token(token).unwrap_or_else(|| region.to_string());
        let endpoint = format!("https://bedrock-runtime.{region}.amazonaws.com");

        Ok(Self {
            client,
            bearer: SecretString::from(token.to_string()),
            region,
            endpoint,
        })
    }

    /// Point the transport at a different base URL (VPC endpoint, proxy).
    pub(crate) fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub(crate) fn region(&self) -> &str {
        &self.region
    }

    /// `{endpoint}/{segments...}` with each segment percent-encoded.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<reqwest::Url, TransportError> {
        let mut url = reqwest::Url::parse(&self.endpoint)
            .map_err(|e| TransportError::Endpoint(format!("{}: {e}", self.endpoint)))?;
        url.path_segments_mut()
            .map_err(|_| TransportError::Endpoint(self.endpoint.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) async fn get_json<R: DeserializeOwned>(&self, url: reqwest::Url) -> Result<R, TransportError> {
        tracing::debug!(%url, region = %self.region, "Bedrock GET");
        self.execute(self.client.get(url)).await
    }

    pub(crate) async fn post_json<B, R>(&self, url: reqwest::Url, body: &B) -> Result<R, TransportError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        tracing::debug!(%url, region = %self.region, "Bedrock POST");
        self.execute(self.client.post(url).json(body)).await
    }

    async fn execute<R: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<R, TransportError> {
        let response = request
            .header("Authorization", format!("Bearer {}", self.bearer.expose_secret()))
            .header("Content-Type", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Bedrock API error response");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

/// Try to extract the AWS region from a base64-encoded presigned URL token.
///
/// The token decodes to a URL like:
/// `bedrock.amazonaws.com/?...&X-Amz-Credential=AKIA.../20260212/us-east-1/bedrock/aws4_request&...`
fn detect_region_from_token(token: &str) -> Option<String> {
    use base64::Engine;
    let decoded = base64::engine::general_purpose::STANDARD.decode(token).ok()?;
    let text = String::from_utf8(decoded).ok()?;

    let cred_start = text.find("X-Amz-Credential=")?;
    let cred_value = &text[cred_start + "X-Amz-Credential=".len()..];
    // <access-key>/<date>/<region>/<service>/aws4_request, possibly URL-encoded
    let cred_value = cred_value.replace("%2F", "/");
    let parts: Vec<&str> = cred_value.split('/').collect();
    if parts.len() >= 3 {
        let region = parts[2].split('&').next().unwrap_or(parts[2]);
        tracing::info!(region = %region, "Detected region from Bedrock bearer token");
        Some(region.to_string())
    } else {
        None
    }
}

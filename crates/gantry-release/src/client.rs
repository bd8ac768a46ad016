//! Release host client
//!
//! Provides integration with the release-hosting API: resolving a
//! release's upload endpoint and uploading archives as named assets.
//! The two calls are kept behind the [`ReleaseHost`] trait so pipelines
//! can run against in-memory fakes in tests.

use crate::error::PublishError;
use crate::release::{strip_url_template, AssetRef, Release};
use crate::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Content type used for every uploaded archive.
pub const ASSET_CONTENT_TYPE: &str = "application/octet-stream";

/// Release host configuration
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Base URL of the release API (includes the repository path)
    pub api_base: String,
    /// Authentication token (optional for read-only hosts)
    pub token: Option<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        HostConfig {
            api_base: std::env::var("GANTRY_API_BASE").unwrap_or_else(|_| {
                "https://api.github.com/repos/stevedores-org/gantry".to_string()
            }),
            token: std::env::var("GANTRY_TOKEN").ok(),
        }
    }
}

impl HostConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific API base
    pub fn new(api_base: &str) -> Self {
        HostConfig {
            api_base: api_base.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Set authentication token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }
}

/// Operations the pipeline needs from a release host.
///
/// Resolving the upload endpoint is an idempotent read and safe to repeat
/// concurrently from independent jobs. Uploading is not idempotent: a
/// second upload with the same asset name fails with
/// [`PublishError::NameCollision`] rather than overwriting.
#[async_trait]
pub trait ReleaseHost: Send + Sync {
    /// Resolve the upload endpoint for a release.
    async fn resolve_upload_url(&self, release: &Release) -> Result<String>;

    /// Upload archive bytes as a named asset on the resolved endpoint.
    async fn upload_asset(&self, endpoint: &str, asset_name: &str, bytes: Vec<u8>)
        -> Result<AssetRef>;
}

/// HTTP client for the release-hosting API
pub struct ReleaseClient {
    config: HostConfig,
    http_client: reqwest::Client,
}

/// Release resource as returned by the host API.
#[derive(Debug, Deserialize)]
struct ReleaseResource {
    upload_url: Option<String>,
}

impl ReleaseClient {
    /// Create a new release client
    pub fn new(config: HostConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("gantry/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        ReleaseClient {
            config,
            http_client,
        }
    }

    /// Create client from environment variables
    pub fn from_env() -> Self {
        Self::new(HostConfig::from_env())
    }

    fn bearer(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

/// Append the asset name query to a resolved upload endpoint.
fn asset_upload_url(endpoint: &str, asset_name: &str) -> String {
    format!("{}?name={}", endpoint.trim_end_matches('/'), asset_name)
}

#[async_trait]
impl ReleaseHost for ReleaseClient {
    async fn resolve_upload_url(&self, release: &Release) -> Result<String> {
        // The event payload may already carry the endpoint template.
        if let Some(url) = release.normalized_upload_url() {
            debug!(release_id = release.id, "Upload endpoint taken from event payload");
            return Ok(url);
        }

        let url = format!("{}/releases/{}", self.config.api_base, release.id);
        debug!(release_id = release.id, %url, "Resolving upload endpoint");

        let response = self.bearer(self.http_client.get(&url)).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(PublishError::Auth {
                status: status.as_u16(),
            });
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PublishError::ReleaseNotFound {
                release_id: release.id,
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let resource: ReleaseResource = response.json().await?;
        match resource.upload_url {
            Some(template) => Ok(strip_url_template(&template)),
            None => Err(PublishError::MissingUploadEndpoint {
                release_id: release.id,
            }),
        }
    }

    async fn upload_asset(
        &self,
        endpoint: &str,
        asset_name: &str,
        bytes: Vec<u8>,
    ) -> Result<AssetRef> {
        let url = asset_upload_url(endpoint, asset_name);
        info!(asset = %asset_name, size = bytes.len(), "Uploading release asset");

        let response = self
            .bearer(self.http_client.post(&url))
            .header(reqwest::header::CONTENT_TYPE, ASSET_CONTENT_TYPE)
            .body(bytes)
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(PublishError::Auth {
                status: status.as_u16(),
            });
        }
        // Hosts report an asset-name collision as an unprocessable entity.
        if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY
            || status == reqwest::StatusCode::CONFLICT
        {
            warn!(asset = %asset_name, "Asset name already exists on release");
            return Err(PublishError::NameCollision {
                name: asset_name.to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let asset: AssetRef = response.json().await?;
        info!(asset = %asset.name, asset_id = asset.id, "Asset uploaded");
        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_config_default() {
        let config = HostConfig::default();
        assert!(!config.api_base.is_empty());
    }

    #[test]
    fn test_host_config_new_trims_trailing_slash() {
        let config = HostConfig::new("https://api.example.com/repos/org/repo/");
        assert_eq!(config.api_base, "https://api.example.com/repos/org/repo");
        assert!(config.token.is_none());
    }

    #[test]
    fn test_host_config_with_token() {
        let config = HostConfig::new("https://api.example.com").with_token("secret-token");
        assert_eq!(config.token, Some("secret-token".to_string()));
    }

    #[test]
    fn test_asset_upload_url() {
        assert_eq!(
            asset_upload_url(
                "https://uploads.example.com/releases/1/assets",
                "cfn-guard-v2-linux.tar.gz"
            ),
            "https://uploads.example.com/releases/1/assets?name=cfn-guard-v2-linux.tar.gz"
        );
    }

    #[test]
    fn test_asset_content_type_is_binary() {
        assert_eq!(ASSET_CONTENT_TYPE, "application/octet-stream");
    }
}

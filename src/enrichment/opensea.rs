//! OpenSea single-asset endpoint client.
//!
//! `GET {base}/asset/{contract}/{token_id}/` returns the asset JSON. Only
//! the numeric asset `id` is required; every other field may be absent or
//! `null`.

use std::time::Duration;

use serde::Deserialize;

use super::{AssetMetadata, AssetSource};
use crate::config::MigrationConfig;
use crate::error::{EnrichmentError, MigrationError};

#[derive(Debug, Deserialize)]
struct AssetResponse {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    token_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    external_link: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    image_preview_url: Option<String>,
    #[serde(default)]
    image_thumbnail_url: Option<String>,
    #[serde(default)]
    image_original_url: Option<String>,
    #[serde(default)]
    animation_url: Option<String>,
    #[serde(default)]
    animation_original_url: Option<String>,
    #[serde(default)]
    token_metadata: Option<String>,
    #[serde(default)]
    collection: Option<CollectionRef>,
    #[serde(default)]
    creator: Option<CreatorRef>,
}

#[derive(Debug, Deserialize)]
struct CollectionRef {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatorRef {
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    user: Option<CreatorUser>,
}

#[derive(Debug, Deserialize)]
struct CreatorUser {
    #[serde(default)]
    username: Option<String>,
}

impl AssetMetadata {
    /// Decodes an asset response body.
    ///
    /// # Errors
    ///
    /// Returns [`EnrichmentError::Decode`] if the body is not an asset JSON
    /// object and [`EnrichmentError::MissingAssetId`] if `id` is absent.
    pub fn from_json(body: &str) -> Result<Self, EnrichmentError> {
        let response: AssetResponse =
            serde_json::from_str(body).map_err(|e| EnrichmentError::Decode(e.to_string()))?;
        let id = response.id.ok_or(EnrichmentError::MissingAssetId)?;
        let (creator_address, creator_username) = match response.creator {
            Some(creator) => (creator.address, creator.user.and_then(|user| user.username)),
            None => (None, None),
        };

        Ok(Self {
            id,
            token_id: response.token_id,
            name: response.name,
            description: response.description,
            external_link: response.external_link,
            image_url: response.image_url,
            image_preview_url: response.image_preview_url,
            image_thumbnail_url: response.image_thumbnail_url,
            image_original_url: response.image_original_url,
            animation_url: response.animation_url,
            animation_original_url: response.animation_original_url,
            token_metadata_url: response.token_metadata,
            collection_name: response.collection.and_then(|c| c.name),
            creator_address,
            creator_username,
        })
    }
}

/// HTTP client for the OpenSea asset API.
#[derive(Debug, Clone)]
pub struct OpenSeaClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl OpenSeaClient {
    /// Builds a client from the enrichment settings in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::HttpClient`] if the TLS backend cannot be
    /// initialized.
    pub fn new(config: &MigrationConfig) -> Result<Self, MigrationError> {
        let timeout = config.enrichment_timeout();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gallery-migrate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MigrationError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.opensea_api_url.trim_end_matches('/').to_string(),
            api_key: config.opensea_api_key.clone(),
            timeout,
        })
    }

    /// URL of the asset endpoint for one token.
    #[must_use]
    pub fn asset_url(&self, contract_address: &str, token_id: &str) -> String {
        format!("{}/asset/{contract_address}/{token_id}/", self.base_url)
    }

    fn transport_error(&self, err: &reqwest::Error) -> EnrichmentError {
        if err.is_timeout() {
            EnrichmentError::Timeout(self.timeout)
        } else {
            EnrichmentError::Request(err.to_string())
        }
    }
}

impl AssetSource for OpenSeaClient {
    async fn fetch_asset(
        &self,
        contract_address: &str,
        token_id: &str,
    ) -> Result<AssetMetadata, EnrichmentError> {
        let url = self.asset_url(contract_address, token_id);
        let mut request = self.http.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header("X-API-KEY", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%url, status = status.as_u16(), "asset request rejected");
            return Err(EnrichmentError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(&e))?;
        AssetMetadata::from_json(&body)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::Router;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;

    use super::*;

    const FULL_ASSET: &str = r#"{
        "id": 26000331,
        "token_id": "1137",
        "name": "Chromie Squiggle #1137",
        "description": null,
        "external_link": "https://artblocks.io",
        "image_url": "https://img/full.png",
        "image_preview_url": "https://img/preview.png",
        "image_thumbnail_url": "https://img/thumb.png",
        "image_original_url": "https://img/original.png",
        "animation_url": null,
        "animation_original_url": null,
        "token_metadata": "https://api.artblocks.io/token/1137",
        "collection": { "name": "Chromie Squiggle" },
        "creator": { "address": "0xcreator", "user": { "username": "snowfro" } }
    }"#;

    #[test]
    fn decodes_nested_fields() {
        let Ok(asset) = AssetMetadata::from_json(FULL_ASSET) else {
            panic!("asset should decode");
        };
        assert_eq!(asset.id, 26_000_331);
        assert_eq!(asset.collection_name.as_deref(), Some("Chromie Squiggle"));
        assert_eq!(asset.creator_address.as_deref(), Some("0xcreator"));
        assert_eq!(asset.creator_username.as_deref(), Some("snowfro"));
        assert!(asset.animation_url.is_none());
        assert!(asset.description.is_none());
    }

    #[test]
    fn missing_id_is_an_enrichment_failure() {
        let result = AssetMetadata::from_json(r#"{ "name": "no id", "creator": null }"#);
        assert_eq!(result, Err(EnrichmentError::MissingAssetId));
    }

    #[test]
    fn non_json_body_is_a_decode_failure() {
        let result = AssetMetadata::from_json("<html>rate limited</html>");
        assert!(matches!(result, Err(EnrichmentError::Decode(_))));
    }

    #[test]
    fn asset_url_has_no_double_slash() {
        let config = MigrationConfig {
            opensea_api_url: "https://api.opensea.io/api/v1/".to_string(),
            ..MigrationConfig::default()
        };
        let Ok(client) = OpenSeaClient::new(&config) else {
            panic!("client should build");
        };
        assert_eq!(
            client.asset_url("0xabc", "7"),
            "https://api.opensea.io/api/v1/asset/0xabc/7/"
        );
    }

    async fn asset_handler(
        Path((contract, token)): Path<(String, String)>,
        headers: HeaderMap,
    ) -> impl IntoResponse {
        if headers.get("x-api-key").is_none_or(|v| v != "secret") {
            return (StatusCode::UNAUTHORIZED, String::new());
        }
        match (contract.as_str(), token.as_str()) {
            ("0xgood", _) => (StatusCode::OK, FULL_ASSET.to_string()),
            ("0xnoid", _) => (StatusCode::OK, r#"{"name":"x"}"#.to_string()),
            ("0xslow", _) => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                (StatusCode::OK, FULL_ASSET.to_string())
            }
            _ => (StatusCode::NOT_FOUND, String::new()),
        }
    }

    async fn spawn_stub() -> String {
        let app = Router::new().route("/api/v1/asset/{contract}/{token}/", get(asset_handler));
        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}/api/v1")
    }

    fn client_for(base: String, api_key: Option<&str>) -> OpenSeaClient {
        let config = MigrationConfig {
            opensea_api_url: base,
            opensea_api_key: api_key.map(str::to_string),
            enrichment_timeout_secs: 1,
            ..MigrationConfig::default()
        };
        let Ok(client) = OpenSeaClient::new(&config) else {
            panic!("client should build");
        };
        client
    }

    #[tokio::test]
    async fn fetches_asset_from_endpoint() {
        let client = client_for(spawn_stub().await, Some("secret"));
        let Ok(asset) = client.fetch_asset("0xgood", "1137").await else {
            panic!("fetch should succeed");
        };
        assert_eq!(asset.token_id.as_deref(), Some("1137"));
    }

    #[tokio::test]
    async fn status_and_body_failures_are_typed() {
        let client = client_for(spawn_stub().await, Some("secret"));
        assert_eq!(
            client.fetch_asset("0xmissing", "1").await,
            Err(EnrichmentError::Status(404))
        );
        assert_eq!(
            client.fetch_asset("0xnoid", "1").await,
            Err(EnrichmentError::MissingAssetId)
        );

        let anonymous = client_for(spawn_stub().await, None);
        assert_eq!(
            anonymous.fetch_asset("0xgood", "1").await,
            Err(EnrichmentError::Status(401))
        );
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let client = client_for(spawn_stub().await, Some("secret"));
        assert_eq!(
            client.fetch_asset("0xslow", "1").await,
            Err(EnrichmentError::Timeout(Duration::from_secs(1)))
        );
    }
}

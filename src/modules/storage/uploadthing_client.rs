//! UploadThing storage client
//!
//! Talks to the UploadThing REST API for uploads, URL lookups, deletion and
//! listing. Signed ingest URLs and callback signatures are computed locally
//! with HMAC-SHA256 keyed by the API key.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine};
use bytes::Bytes;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;
use tracing::{debug, info, warn};

use super::provider::{
    FileUrl, PrepareUploadRequest, PresignedUpload, StorageProvider, StoredFile, UploadFile,
    UploadFileResult, UploadMetadata, UploadedFile,
};
use crate::core::config::UploadThingConfig;
use crate::core::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

const API_KEY_HEADER: &str = "x-uploadthing-api-key";
const VERSION_HEADER: &str = "x-uploadthing-version";
const SDK_VERSION: &str = "6.13.3";
const SIGNATURE_PREFIX: &str = "hmac-sha256=";
const DEFAULT_REGION: &str = "sea1";

/// Decoded contents of `UPLOADTHING_TOKEN`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadThingCredentials {
    pub api_key: String,
    pub app_id: String,
    #[serde(default)]
    pub regions: Vec<String>,
}

impl UploadThingCredentials {
    /// Decode a base64 JSON token of the form `{"apiKey", "appId", "regions"}`
    pub fn from_token(token: &str) -> Result<Self> {
        let token = token.trim().trim_matches('\'').trim_matches('"');
        let decoded = general_purpose::STANDARD
            .decode(token)
            .or_else(|_| general_purpose::STANDARD_NO_PAD.decode(token))
            .map_err(|e| AppError::Internal(format!("UPLOADTHING_TOKEN is not base64: {}", e)))?;

        let credentials: Self = serde_json::from_slice(&decoded).map_err(|e| {
            AppError::Internal(format!("UPLOADTHING_TOKEN has an invalid payload: {}", e))
        })?;

        if credentials.api_key.is_empty() || credentials.app_id.is_empty() {
            return Err(AppError::Internal(
                "UPLOADTHING_TOKEN is missing apiKey or appId".to_string(),
            ));
        }

        Ok(credentials)
    }

    pub fn region(&self) -> &str {
        self.regions
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_REGION)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadFilesRequest<'a> {
    files: Vec<FileDescriptorRequest<'a>>,
    metadata: &'a UploadMetadata,
    acl: &'static str,
    content_disposition: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileDescriptorRequest<'a> {
    name: &'a str,
    size: usize,
    #[serde(rename = "type")]
    mime_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct UploadFilesResponse {
    data: Vec<PresignedFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PresignedFile {
    key: String,
    /// Presigned `PUT` target
    url: String,
    file_url: String,
    #[serde(default)]
    custom_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileKeysRequest<'a> {
    file_keys: &'a [String],
}

#[derive(Debug, Deserialize)]
struct FileUrlsResponse {
    data: Vec<FileUrl>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteFilesResponse {
    success: bool,
    #[serde(default)]
    deleted_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListFilesResponse {
    files: Vec<StoredFile>,
    #[serde(default)]
    has_more: bool,
}

/// UploadThing-backed [`StorageProvider`]
pub struct UploadThingClient {
    credentials: Option<UploadThingCredentials>,
    api_url: String,
    presigned_url_expiry_secs: u64,
    http_client: Client,
}

impl UploadThingClient {
    /// Create a client from configuration.
    ///
    /// A missing or undecodable token does not fail construction: the client
    /// starts in degraded mode and every storage call returns an error.
    pub fn new(config: UploadThingConfig, http_client: Client) -> Self {
        let credentials = match config.token.as_deref() {
            Some(token) => match UploadThingCredentials::from_token(token) {
                Ok(credentials) => Some(credentials),
                Err(e) => {
                    warn!("Ignoring UPLOADTHING_TOKEN: {}", e);
                    None
                }
            },
            None => None,
        };

        if let Some(credentials) = &credentials {
            info!(
                "UploadThing client initialized for app: {}, region: {}",
                credentials.app_id,
                credentials.region()
            );
        }

        Self {
            credentials,
            api_url: config.api_url,
            presigned_url_expiry_secs: config.presigned_url_expiry_secs,
            http_client,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    fn credentials(&self) -> Result<&UploadThingCredentials> {
        self.credentials.as_ref().ok_or_else(|| {
            AppError::ExternalServiceError("UploadThing token is not configured".to_string())
        })
    }

    /// POST a JSON body to an UploadThing API route and decode the response
    async fn api_request<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let credentials = self.credentials()?;
        let url = format!("{}{}", self.api_url, path);

        debug!("UploadThing request: POST {}", path);

        let response = self
            .http_client
            .post(&url)
            .header(API_KEY_HEADER, &credentials.api_key)
            .header(VERSION_HEADER, SDK_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("UploadThing request to {} failed: {}", path, e);
                AppError::ExternalServiceError(format!("UploadThing request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("UploadThing API error on {}: HTTP {} - {}", path, status, body);
            return Err(AppError::ExternalServiceError(format!(
                "UploadThing API error: HTTP {}",
                status
            )));
        }

        response.json::<R>().await.map_err(|e| {
            tracing::error!("Failed to parse UploadThing response from {}: {}", path, e);
            AppError::ExternalServiceError(format!("Failed to parse UploadThing response: {}", e))
        })
    }

    /// Hex HMAC-SHA256 of `payload` keyed by the API key
    fn sign(api_key: &str, payload: &[u8]) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(api_key.as_bytes())
            .map_err(|e| AppError::Internal(format!("HMAC key error: {}", e)))?;
        mac.update(payload);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    async fn put_object(&self, url: &str, data: Bytes, content_type: &str) -> Result<()> {
        let response = self
            .http_client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Upload request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Upload rejected: HTTP {}",
                response.status()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl StorageProvider for UploadThingClient {
    async fn upload_files(
        &self,
        files: Vec<UploadFile>,
        metadata: &UploadMetadata,
    ) -> Result<Vec<UploadFileResult>> {
        let response: UploadFilesResponse = {
            let request = UploadFilesRequest {
                files: files
                    .iter()
                    .map(|f| FileDescriptorRequest {
                        name: &f.name,
                        size: f.data.len(),
                        mime_type: &f.mime_type,
                        custom_id: f.custom_id.as_deref(),
                    })
                    .collect(),
                metadata,
                acl: "public-read",
                content_disposition: "inline",
            };
            self.api_request("/v6/uploadFiles", &request).await?
        };

        let mut results = Vec::with_capacity(files.len());
        for (file, target) in files.into_iter().zip(response.data) {
            let size = file.data.len() as u64;
            match self.put_object(&target.url, file.data, &file.mime_type).await {
                Ok(()) => {
                    debug!("Uploaded '{}' as key '{}'", file.name, target.key);
                    results.push(UploadFileResult::success(UploadedFile {
                        key: target.key,
                        url: target.file_url,
                        name: file.name,
                        size,
                        custom_id: target.custom_id,
                    }));
                }
                Err(e) => {
                    warn!("Upload of '{}' failed: {}", file.name, e);
                    results.push(UploadFileResult::failure(e.to_string()));
                }
            }
        }

        Ok(results)
    }

    async fn generate_signed_url(&self, key: &str) -> Result<Option<String>> {
        let credentials = self.credentials()?;
        let expiry_millis = i64::try_from(self.presigned_url_expiry_secs)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);
        let expires = Utc::now().timestamp_millis().saturating_add(expiry_millis);

        let unsigned = format!(
            "https://{}.ingest.uploadthing.com/{}?expires={}&x-ut-identifier={}",
            credentials.region(),
            urlencoding::encode(key),
            expires,
            urlencoding::encode(&credentials.app_id)
        );
        let signature = Self::sign(&credentials.api_key, unsigned.as_bytes())?;

        Ok(Some(format!(
            "{}&signature={}{}",
            unsigned, SIGNATURE_PREFIX, signature
        )))
    }

    async fn get_file_urls(&self, keys: &[String]) -> Result<Vec<FileUrl>> {
        let response: FileUrlsResponse = self
            .api_request("/v6/getFileUrl", &FileKeysRequest { file_keys: keys })
            .await?;
        Ok(response.data)
    }

    async fn delete_files(&self, keys: &[String]) -> Result<()> {
        let response: DeleteFilesResponse = self
            .api_request("/v6/deleteFiles", &FileKeysRequest { file_keys: keys })
            .await?;

        if !response.success {
            return Err(AppError::ExternalServiceError(format!(
                "UploadThing did not delete files: {:?}",
                keys
            )));
        }

        debug!("Deleted {} file(s) from UploadThing", response.deleted_count);
        Ok(())
    }

    async fn list_files(&self) -> Result<Vec<StoredFile>> {
        let response: ListFilesResponse = self.api_request("/v6/listFiles", &json!({})).await?;

        if response.has_more {
            debug!("UploadThing listing has more pages; returning first page only");
        }

        Ok(response.files)
    }

    async fn prepare_upload(&self, request: PrepareUploadRequest) -> Result<Vec<PresignedUpload>> {
        self.api_request("/v6/prepareUpload", &request).await
    }

    fn verify_signature(&self, payload: &[u8], signature: &str) -> bool {
        let Some(credentials) = self.credentials.as_ref() else {
            return false;
        };
        let Some(expected) = signature
            .strip_prefix(SIGNATURE_PREFIX)
            .and_then(|hex_sig| hex::decode(hex_sig).ok())
        else {
            return false;
        };

        match HmacSha256::new_from_slice(credentials.api_key.as_bytes()) {
            Ok(mut mac) => {
                mac.update(payload);
                mac.verify_slice(&expected).is_ok()
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const API_KEY: &str = "sk_live_test";

    fn token() -> String {
        general_purpose::STANDARD.encode(
            json!({ "apiKey": API_KEY, "appId": "app123", "regions": ["fra1"] }).to_string(),
        )
    }

    fn config(token: Option<String>) -> UploadThingConfig {
        UploadThingConfig {
            token,
            api_url: "http://127.0.0.1:9".to_string(),
            presigned_url_expiry_secs: 3600,
            request_timeout: None,
            callback_url: "http://localhost:3006/api/files/profile-image".to_string(),
        }
    }

    #[test]
    fn test_credentials_from_token() {
        let credentials = UploadThingCredentials::from_token(&token()).unwrap();
        assert_eq!(credentials.api_key, API_KEY);
        assert_eq!(credentials.app_id, "app123");
        assert_eq!(credentials.region(), "fra1");

        let quoted = format!("'{}'", token());
        assert!(UploadThingCredentials::from_token(&quoted).is_ok());
    }

    #[test]
    fn test_credentials_default_region() {
        let token = general_purpose::STANDARD
            .encode(json!({ "apiKey": API_KEY, "appId": "app123" }).to_string());
        let credentials = UploadThingCredentials::from_token(&token).unwrap();
        assert_eq!(credentials.region(), DEFAULT_REGION);
    }

    #[test]
    fn test_credentials_invalid_token() {
        assert!(UploadThingCredentials::from_token("not base64 !!").is_err());

        let no_key = general_purpose::STANDARD.encode(json!({ "appId": "app123" }).to_string());
        assert!(UploadThingCredentials::from_token(&no_key).is_err());
    }

    #[tokio::test]
    async fn test_signed_url_format() {
        let client = UploadThingClient::new(config(Some(token())), Client::new());

        let url = client
            .generate_signed_url("profiles/user-1/1700000000000-a.jpg")
            .await
            .unwrap()
            .unwrap();

        assert!(url.starts_with(
            "https://fra1.ingest.uploadthing.com/profiles%2Fuser-1%2F1700000000000-a.jpg?expires="
        ));
        assert!(url.contains("&x-ut-identifier=app123"));

        let (unsigned, signature) = url.split_once("&signature=").unwrap();
        assert!(signature.starts_with(SIGNATURE_PREFIX));
        assert!(client.verify_signature(unsigned.as_bytes(), signature));
    }

    #[tokio::test]
    async fn test_signed_url_expiry_saturates() {
        let mut config = config(Some(token()));
        config.presigned_url_expiry_secs = u64::MAX;
        let client = UploadThingClient::new(config, Client::new());

        let url = client.generate_signed_url("k.jpg").await.unwrap().unwrap();

        assert!(url.contains(&format!("?expires={}&", i64::MAX)));
    }

    #[test]
    fn test_verify_signature() {
        let client = UploadThingClient::new(config(Some(token())), Client::new());
        let body = br#"{"status":"uploaded"}"#;
        let signature = format!(
            "{}{}",
            SIGNATURE_PREFIX,
            UploadThingClient::sign(API_KEY, body).unwrap()
        );

        assert!(client.verify_signature(body, &signature));
        assert!(!client.verify_signature(b"tampered", &signature));
        assert!(!client.verify_signature(body, "hmac-sha256=zz"));
        assert!(!client.verify_signature(body, "sha1=abc"));
    }

    #[tokio::test]
    async fn test_degraded_mode_without_token() {
        let client = UploadThingClient::new(config(None), Client::new());
        assert!(!client.is_configured());

        let result = client.list_files().await;
        assert!(matches!(result, Err(AppError::ExternalServiceError(_))));
        assert!(matches!(
            client.generate_signed_url("k").await,
            Err(AppError::ExternalServiceError(_))
        ));
        assert!(!client.verify_signature(b"body", "hmac-sha256=00"));
    }

    #[test]
    fn test_invalid_token_starts_degraded() {
        let client = UploadThingClient::new(config(Some("garbage".to_string())), Client::new());
        assert!(!client.is_configured());
    }
}

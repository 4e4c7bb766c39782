#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::Path,
    http::{header, HeaderMap, StatusCode},
    routing::put,
    Router,
};
use fake::faker::internet::en::SafeEmail;
use fake::Fake;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use std::sync::{Arc, Mutex};

use crate::core::error::{AppError, Result};
use crate::modules::storage::{
    FileUrl, PrepareUploadRequest, PresignedUpload, StorageProvider, StoredFile, UploadFile,
    UploadFileResult, UploadMetadata, UploadedFile,
};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";

/// Signature the mock provider accepts for completion callbacks
pub const TEST_CALLBACK_SIGNATURE: &str = "hmac-sha256=test-signature";

pub fn create_token(secret: &str, claims: serde_json::Value) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// Valid one-hour token for the given role
pub fn bearer_token(role: &str) -> String {
    let email: String = SafeEmail().fake();
    create_token(
        TEST_JWT_SECRET,
        json!({
            "role": role,
            "email": email,
            "uuid": "123456789101",
            "exp": chrono::Utc::now().timestamp() + 3600,
        }),
    )
}

/// How the mock answers the direct `upload_files` call
#[derive(Debug, Clone)]
pub enum DirectUpload {
    /// Every file is stored under this URL
    Succeed(String),
    /// The call succeeds but each item carries an error
    ItemError,
    /// The call itself fails
    Fail,
}

/// Recording fake of the storage provider
pub struct MockStorageProvider {
    pub direct_upload: DirectUpload,
    /// Base for signed URLs (`{base}/ingest/{key}`); `None` yields no URL
    pub signed_url_base: Option<String>,
    /// URL resolved by `get_file_urls`; `None` resolves nothing
    pub resolved_url: Option<String>,
    pub delete_fails: bool,
    pub listing: Option<Vec<StoredFile>>,

    pub uploads: Mutex<Vec<(Vec<UploadFile>, UploadMetadata)>>,
    pub signed_url_keys: Mutex<Vec<String>>,
    pub file_url_keys: Mutex<Vec<Vec<String>>>,
    pub deleted_keys: Mutex<Vec<Vec<String>>>,
    pub prepare_requests: Mutex<Vec<PrepareUploadRequest>>,
}

impl MockStorageProvider {
    pub fn new(direct_upload: DirectUpload) -> Self {
        Self {
            direct_upload,
            signed_url_base: None,
            resolved_url: None,
            delete_fails: false,
            listing: Some(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            signed_url_keys: Mutex::new(Vec::new()),
            file_url_keys: Mutex::new(Vec::new()),
            deleted_keys: Mutex::new(Vec::new()),
            prepare_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_signed_urls(mut self, base: &str, resolved_url: Option<&str>) -> Self {
        self.signed_url_base = Some(base.to_string());
        self.resolved_url = resolved_url.map(str::to_string);
        self
    }

    pub fn with_failing_delete(mut self) -> Self {
        self.delete_fails = true;
        self
    }

    pub fn with_listing(mut self, listing: Option<Vec<StoredFile>>) -> Self {
        self.listing = listing;
        self
    }

    pub fn uploaded_keys(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .flat_map(|(files, _)| files.iter().filter_map(|f| f.custom_id.clone()))
            .collect()
    }

    pub fn signed_url_keys(&self) -> Vec<String> {
        self.signed_url_keys.lock().unwrap().clone()
    }

    pub fn deleted_keys(&self) -> Vec<Vec<String>> {
        self.deleted_keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageProvider for MockStorageProvider {
    async fn upload_files(
        &self,
        files: Vec<UploadFile>,
        metadata: &UploadMetadata,
    ) -> Result<Vec<UploadFileResult>> {
        self.uploads
            .lock()
            .unwrap()
            .push((files.clone(), metadata.clone()));

        match &self.direct_upload {
            DirectUpload::Succeed(url) => Ok(files
                .into_iter()
                .map(|f| {
                    UploadFileResult::success(UploadedFile {
                        key: f.custom_id.clone().unwrap_or_default(),
                        url: url.clone(),
                        size: f.data.len() as u64,
                        name: f.name,
                        custom_id: f.custom_id,
                    })
                })
                .collect()),
            DirectUpload::ItemError => Ok(files
                .iter()
                .map(|_| UploadFileResult::failure("direct upload rejected"))
                .collect()),
            DirectUpload::Fail => Err(AppError::ExternalServiceError(
                "direct upload unavailable".to_string(),
            )),
        }
    }

    async fn generate_signed_url(&self, key: &str) -> Result<Option<String>> {
        self.signed_url_keys.lock().unwrap().push(key.to_string());
        Ok(self
            .signed_url_base
            .as_ref()
            .map(|base| format!("{}/ingest/{}", base, key)))
    }

    async fn get_file_urls(&self, keys: &[String]) -> Result<Vec<FileUrl>> {
        self.file_url_keys.lock().unwrap().push(keys.to_vec());
        Ok(self
            .resolved_url
            .iter()
            .zip(keys)
            .map(|(url, key)| FileUrl {
                key: key.clone(),
                url: url.clone(),
            })
            .collect())
    }

    async fn delete_files(&self, keys: &[String]) -> Result<()> {
        self.deleted_keys.lock().unwrap().push(keys.to_vec());
        if self.delete_fails {
            return Err(AppError::ExternalServiceError("delete failed".to_string()));
        }
        Ok(())
    }

    async fn list_files(&self) -> Result<Vec<StoredFile>> {
        self.listing
            .clone()
            .ok_or_else(|| AppError::ExternalServiceError("listing unavailable".to_string()))
    }

    async fn prepare_upload(&self, request: PrepareUploadRequest) -> Result<Vec<PresignedUpload>> {
        let uploads = request
            .files
            .iter()
            .enumerate()
            .map(|(i, f)| PresignedUpload {
                key: format!("web-key-{}", i),
                url: format!("https://sea1.ingest.uploadthing.com/web-key-{}", i),
                name: f.name.clone(),
                custom_id: None,
            })
            .collect();
        self.prepare_requests.lock().unwrap().push(request);
        Ok(uploads)
    }

    fn verify_signature(&self, _payload: &[u8], signature: &str) -> bool {
        signature == TEST_CALLBACK_SIGNATURE
    }
}

/// A `PUT` received by the ingest stub: key and `Content-Type`
pub type IngestRequest = (String, Option<String>, usize);

pub struct IngestStub {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<IngestRequest>>>,
}

/// Local HTTP server standing in for the signed-URL ingest endpoint
pub async fn spawn_ingest_stub(status: StatusCode) -> IngestStub {
    let requests: Arc<Mutex<Vec<IngestRequest>>> = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&requests);

    let app = Router::new().route(
        "/ingest/{*key}",
        put(
            move |Path(key): Path<String>, headers: HeaderMap, body: Bytes| {
                let recorded = Arc::clone(&recorded);
                async move {
                    let content_type = headers
                        .get(header::CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    recorded.lock().unwrap().push((key, content_type, body.len()));
                    status
                }
            },
        ),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    IngestStub {
        base_url: format!("http://{}", addr),
        requests,
    }
}

/// Small valid-looking PNG payload
pub fn png_bytes() -> Bytes {
    let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    data.extend(std::iter::repeat(0u8).take(64));
    Bytes::from(data)
}

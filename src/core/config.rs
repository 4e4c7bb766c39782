use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub auth: AuthConfig,
    pub uploadthing: UploadThingConfig,
    pub static_files: StaticFilesConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// HMAC secret used to verify HS256 bearer tokens
    pub jwt_secret: String,
    pub jwt_leeway: Duration,
}

/// UploadThing storage configuration
#[derive(Debug, Clone)]
pub struct UploadThingConfig {
    /// Base64-encoded UploadThing token (apiKey, appId, regions).
    /// `None` runs the service in degraded mode: every storage call fails.
    pub token: Option<String>,
    /// REST API base URL
    pub api_url: String,
    /// Lifetime of generated signed upload URLs in seconds
    pub presigned_url_expiry_secs: u64,
    /// Per-request timeout for upstream calls (transport default when unset)
    pub request_timeout: Option<Duration>,
    /// URL UploadThing calls back after a web SDK upload completes
    pub callback_url: String,
}

#[derive(Debug, Clone)]
pub struct StaticFilesConfig {
    /// Directory served under `/uploads`
    pub dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        let app = AppConfig::from_env()?;
        let uploadthing = UploadThingConfig::from_env(app.port)?;

        Ok(Config {
            app,
            auth: AuthConfig::from_env()?,
            uploadthing,
            static_files: StaticFilesConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_PORT: u16 = 3006;

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| Self::DEFAULT_PORT.to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AuthConfig {
    const DEFAULT_JWT_LEEWAY_SECS: u64 = 60; // 1 minute

    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "JWT_SECRET is not defined in environment variables".to_string())?;

        let jwt_leeway_secs = env::var("JWT_LEEWAY")
            .unwrap_or_else(|_| Self::DEFAULT_JWT_LEEWAY_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "JWT_LEEWAY must be a valid number".to_string())?;

        Ok(Self {
            jwt_secret,
            jwt_leeway: Duration::from_secs(jwt_leeway_secs),
        })
    }
}

impl UploadThingConfig {
    const DEFAULT_API_URL: &'static str = "https://api.uploadthing.com";
    const DEFAULT_PRESIGNED_URL_EXPIRY_SECS: u64 = 3600; // 1 hour

    pub fn from_env(port: u16) -> Result<Self, String> {
        let token = env::var("UPLOADTHING_TOKEN").ok().filter(|s| !s.is_empty());

        let api_url = env::var("UPLOADTHING_API_URL")
            .unwrap_or_else(|_| Self::DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let presigned_url_expiry_secs = env::var("UPLOADTHING_PRESIGNED_URL_EXPIRY_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_PRESIGNED_URL_EXPIRY_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "UPLOADTHING_PRESIGNED_URL_EXPIRY_SECS must be a valid number".to_string())?;

        let request_timeout = match env::var("UPLOADTHING_TIMEOUT_SECS") {
            Ok(value) if !value.is_empty() => Some(Duration::from_secs(
                value
                    .parse::<u64>()
                    .map_err(|_| "UPLOADTHING_TIMEOUT_SECS must be a valid number".to_string())?,
            )),
            _ => None,
        };

        let callback_url = env::var("UPLOADTHING_CALLBACK_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}/api/files/profile-image", port));

        Ok(Self {
            token,
            api_url,
            presigned_url_expiry_secs,
            request_timeout,
            callback_url,
        })
    }
}

impl StaticFilesConfig {
    pub fn from_env() -> Result<Self, String> {
        let dir = env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".to_string());

        Ok(Self { dir })
    }
}

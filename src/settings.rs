//! Runtime settings and API key resolution.
//!
//! Handles:
//! - dotenv loading (`.env.local` → `.env`, cwd first, then config dir)
//! - API keys (env var first, then OS keychain via the keyring crate)
//! - OCR provider selection
//! - library location and HTTP timeout

use crate::books::{BooksClient, DEFAULT_BOOKS_API_URL};
use crate::ocr::{
    OcrProvider, OcrSpaceRecognizer, TextRecognizer, VisionRecognizer, DEFAULT_OCR_SPACE_API_URL,
    DEFAULT_VISION_API_URL,
};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Name used for the config dir, data dir and keychain service.
pub const APP_NAME: &str = "book-scanner";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("No {service} API key configured. Set {env_key} or run `book-scanner key set {service} <KEY>`")]
    MissingKey { service: ApiService, env_key: &'static str },
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
    #[error("Invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Remote services that take an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiService {
    Books,
    Vision,
    OcrSpace,
}

impl ApiService {
    pub fn id(&self) -> &'static str {
        match self {
            ApiService::Books => "books",
            ApiService::Vision => "vision",
            ApiService::OcrSpace => "ocr-space",
        }
    }

    pub fn env_key(&self) -> &'static str {
        match self {
            ApiService::Books => "GOOGLE_BOOKS_API_KEY",
            ApiService::Vision => "VISION_API_KEY",
            ApiService::OcrSpace => "OCR_SPACE_API_KEY",
        }
    }
}

impl From<OcrProvider> for ApiService {
    fn from(provider: OcrProvider) -> Self {
        match provider {
            OcrProvider::Vision => ApiService::Vision,
            OcrProvider::OcrSpace => ApiService::OcrSpace,
        }
    }
}

impl fmt::Display for ApiService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ApiService {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "books" | "google-books" => Ok(ApiService::Books),
            "vision" => Ok(ApiService::Vision),
            "ocr-space" | "ocrspace" => Ok(ApiService::OcrSpace),
            other => Err(format!(
                "Unknown service: {}. Use 'books', 'vision' or 'ocr-space'.",
                other
            )),
        }
    }
}

/// Everything the commands need to build clients and open the library.
#[derive(Debug, Clone)]
pub struct Settings {
    pub books_api_url: String,
    pub books_api_key: Option<String>,
    pub vision_api_url: String,
    pub vision_api_key: Option<String>,
    pub ocr_space_api_url: String,
    pub ocr_space_api_key: Option<String>,
    pub ocr_provider: OcrProvider,
    pub library_dir: PathBuf,
    pub http_timeout: Duration,
}

impl Settings {
    /// Read settings from the environment, falling back to the keychain for
    /// API keys and to defaults for everything else.
    pub fn from_env() -> Result<Self, SettingsError> {
        let ocr_provider = match env_value("OCR_PROVIDER") {
            Some(p) => p.parse::<OcrProvider>().map_err(|reason| SettingsError::Invalid {
                name: "OCR_PROVIDER",
                reason,
            })?,
            None => OcrProvider::default(),
        };

        let http_timeout = match env_value("HTTP_TIMEOUT_SECS") {
            Some(raw) => parse_timeout(&raw)?,
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let settings = Self {
            books_api_url: env_value("BOOKS_API_URL").unwrap_or_else(|| DEFAULT_BOOKS_API_URL.to_string()),
            books_api_key: resolve_api_key(ApiService::Books),
            vision_api_url: env_value("VISION_API_URL").unwrap_or_else(|| DEFAULT_VISION_API_URL.to_string()),
            vision_api_key: resolve_api_key(ApiService::Vision),
            ocr_space_api_url: env_value("OCR_SPACE_API_URL")
                .unwrap_or_else(|| DEFAULT_OCR_SPACE_API_URL.to_string()),
            ocr_space_api_key: resolve_api_key(ApiService::OcrSpace),
            ocr_provider,
            library_dir: env_value("BOOK_SCANNER_LIBRARY_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(default_library_dir),
            http_timeout,
        };

        log::info!(
            "[SETTINGS] ocr_provider={} library_dir={} books_key={} vision_key={} ocr_space_key={}",
            settings.ocr_provider,
            settings.library_dir.display(),
            settings.books_api_key.is_some(),
            settings.vision_api_key.is_some(),
            settings.ocr_space_api_key.is_some()
        );
        Ok(settings)
    }

    /// Key for the given OCR provider, or a `MissingKey` error naming it.
    pub fn ocr_api_key(&self, provider: OcrProvider) -> Result<&str, SettingsError> {
        let key = match provider {
            OcrProvider::Vision => self.vision_api_key.as_deref(),
            OcrProvider::OcrSpace => self.ocr_space_api_key.as_deref(),
        };
        let service = ApiService::from(provider);
        key.ok_or(SettingsError::MissingKey {
            service,
            env_key: service.env_key(),
        })
    }

    /// Shared HTTP client with the configured timeout.
    pub fn http_client(&self) -> Result<reqwest::Client, SettingsError> {
        Ok(reqwest::Client::builder()
            .timeout(self.http_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?)
    }

    /// Google Books client. The API key is optional for the volumes endpoint.
    pub fn books_client(&self, http: reqwest::Client) -> BooksClient {
        BooksClient::new(http, &self.books_api_url, self.books_api_key.clone())
    }

    /// Recognizer for `provider`. Both OCR services require a key.
    pub fn recognizer(
        &self,
        provider: OcrProvider,
        http: reqwest::Client,
    ) -> Result<Box<dyn TextRecognizer>, SettingsError> {
        let key = self.ocr_api_key(provider)?;
        Ok(match provider {
            OcrProvider::Vision => Box::new(VisionRecognizer::new(http, &self.vision_api_url, key)),
            OcrProvider::OcrSpace => {
                Box::new(OcrSpaceRecognizer::new(http, &self.ocr_space_api_url, key))
            }
        })
    }
}

/// Load `.env.local` or `.env`, first match wins: current directory, then
/// the app's config directory. Runs before logging is initialised, so the
/// loaded path is returned for the caller to log.
pub fn load_dotenv() -> Option<PathBuf> {
    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Some(config) = config_dir() {
        roots.push(config);
    }

    for root in roots {
        for env_file in [".env.local", ".env"] {
            let path = root.join(env_file);
            if path.exists() {
                if let Err(e) = dotenvy::from_path(&path) {
                    eprintln!("[STARTUP] Failed to load {}: {}", path.display(), e);
                    return None;
                }
                return Some(path);
            }
        }
    }
    None
}

/// `~/.config/book-scanner` (platform equivalent).
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|c| c.join(APP_NAME))
}

/// `~/.local/share/book-scanner` (platform equivalent), or `./book-scanner`.
pub fn default_library_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Find an API key: environment first, then the OS keychain.
pub fn resolve_api_key(service: ApiService) -> Option<String> {
    if let Some(key) = env_value(service.env_key()) {
        return Some(key);
    }

    match keyring::Entry::new(APP_NAME, service.id()).and_then(|entry| entry.get_password()) {
        Ok(key) if !key.is_empty() => {
            log::info!("[SETTINGS] Loaded {} key from OS keychain", service);
            Some(key)
        }
        Ok(_) | Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            log::warn!("[SETTINGS] Keychain lookup for {} failed: {}", service, e);
            None
        }
    }
}

/// Store an API key in the OS keychain.
pub fn save_api_key(service: ApiService, api_key: &str) -> Result<(), SettingsError> {
    if api_key.trim().is_empty() {
        return Err(SettingsError::Invalid {
            name: "API key",
            reason: "must not be empty".to_string(),
        });
    }
    let entry = keyring::Entry::new(APP_NAME, service.id())?;
    entry.set_password(api_key.trim())?;
    log::info!("[SETTINGS] API key saved for {}", service);
    Ok(())
}

/// Whole seconds, at least one. Zero would fail every request immediately.
fn parse_timeout(raw: &str) -> Result<Duration, SettingsError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(SettingsError::Invalid {
            name: "HTTP_TIMEOUT_SECS",
            reason: "must be at least 1 second".to_string(),
        }),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => Err(SettingsError::Invalid {
            name: "HTTP_TIMEOUT_SECS",
            reason: format!("'{}' is not a number of seconds", raw),
        }),
    }
}

/// Non-empty environment variable.
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

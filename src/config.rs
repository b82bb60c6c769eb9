use crate::errors::ConfigError;
use reqwest::header::HeaderValue;
use std::{env, path::PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

pub const REMOTE_URL_VAR: &str = "SUPABASE_URL";
pub const REMOTE_KEY_VAR: &str = "SUPABASE_ANON_KEY";

const DEFAULT_PORT: u16 = 8080;

/// Endpoint and public key for the hosted tribute table.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub url: String,
    pub anon_key: String,
}

impl RemoteConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Empty values count as missing. The key must be usable as a header.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let url = required(REMOTE_URL_VAR)?.trim_end_matches('/').to_string();
        let anon_key = required(REMOTE_KEY_VAR)?;
        if HeaderValue::from_str(&format!("Bearer {anon_key}")).is_err() {
            return Err(ConfigError::InvalidHeader(REMOTE_KEY_VAR));
        }

        Ok(Self { url, anon_key })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendKind {
    #[default]
    File,
    Remote,
}

impl BackendKind {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "file" => Ok(BackendKind::File),
            "remote" => Ok(BackendKind::Remote),
            _ => Err(ConfigError::Invalid {
                name: "TRIBUTES_BACKEND",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub data_path: PathBuf,
    pub backend: BackendKind,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let backend = match env::var("TRIBUTES_BACKEND") {
            Ok(value) => BackendKind::parse(&value)?,
            Err(_) => BackendKind::default(),
        };

        Ok(Self {
            port,
            data_path: resolve_data_path(),
            backend,
        })
    }
}

pub fn resolve_data_path() -> PathBuf {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return PathBuf::from(path);
    }

    PathBuf::from("data/tributes.json")
}

/// Label written into the packaging artifact.
pub fn environment_label() -> String {
    env::var("APP_ENV")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "production".to_string())
}

/// Loads the first `.env` found into the process environment. Existing
/// variables win. Returns the file that was loaded.
pub fn load_dotenv() -> Option<&'static str> {
    [".env", "../.env"]
        .into_iter()
        .find(|path| dotenvy::from_filename(path).is_ok())
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// `.env` first, so `RUST_LOG` from the file reaches the log filter.
pub fn init_environment() {
    let loaded = load_dotenv();
    init_tracing();
    match loaded {
        Some(path) => tracing::info!("loaded .env from {path}"),
        None => tracing::debug!("no .env file found, using process environment"),
    }
}

// Configuration
// Credentials file (JSON) layered with KAYIT__* environment overrides, read once at start

use crate::store::airtable::DEFAULT_API_URL;
use crate::store::{AirtableStore, RecordStore, SqliteStore, RECORD_ID_FIELD};
use ::config::{Environment, File, FileFormat};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const CONFIG_PATH_VAR: &str = "KAYIT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "secrets.json";
const ENV_PREFIX: &str = "KAYIT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Airtable,
    Sqlite,
}

#[derive(Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: Backend,

    #[serde(default)]
    pub airtable_api_key: Option<String>,

    #[serde(default)]
    pub airtable_base_id: Option<String>,

    #[serde(default = "default_table_name")]
    pub table_name: String,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_confirmation_field")]
    pub confirmation_field: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,

    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

fn default_table_name() -> String {
    "Registrations".to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_confirmation_field() -> String {
    RECORD_ID_FIELD.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("registrations.db")
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8501
}

fn default_session_idle_secs() -> u64 {
    30 * 60
}

// Keeps the API key out of logs
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("backend", &self.backend)
            .field("airtable_api_key", &self.airtable_api_key.as_ref().map(|_| "***"))
            .field("airtable_base_id", &self.airtable_base_id)
            .field("table_name", &self.table_name)
            .field("api_url", &self.api_url)
            .field("confirmation_field", &self.confirmation_field)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("sqlite_path", &self.sqlite_path)
            .field("bind", &self.bind)
            .field("port", &self.port)
            .field("session_idle_secs", &self.session_idle_secs)
            .finish()
    }
}

impl Config {
    /// `KAYIT_CONFIG` if set, otherwise `secrets.json` in the working directory
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading config from {}", path.display());

        let settings = ::config::Config::builder()
            .add_source(File::from(path).format(FileFormat::Json).required(true))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        settings
            .try_deserialize()
            .context("failed to deserialize config")
    }

    /// Parse a JSON document without environment overrides
    pub fn from_json(json: &str) -> Result<Self> {
        ::config::Config::builder()
            .add_source(File::from_str(json, FileFormat::Json))
            .build()
            .context("failed to parse config")?
            .try_deserialize()
            .context("failed to deserialize config")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// How long an untouched web form session is kept
    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// Human-readable target for startup banners
    pub fn store_description(&self) -> String {
        match self.backend {
            Backend::Airtable => format!(
                "airtable {}/{}",
                self.airtable_base_id.as_deref().unwrap_or("<no base>"),
                self.table_name
            ),
            Backend::Sqlite => format!("sqlite {}", self.sqlite_path.display()),
        }
    }

    pub fn open_store(&self) -> Result<Arc<dyn RecordStore>> {
        match self.backend {
            Backend::Airtable => {
                let api_key = required(&self.airtable_api_key, "airtable_api_key")?;
                let base_id = required(&self.airtable_base_id, "airtable_base_id")?;
                let store = AirtableStore::new(
                    &self.api_url,
                    base_id,
                    &self.table_name,
                    api_key,
                    self.request_timeout(),
                )?;
                info!(endpoint = store.endpoint(), "using airtable store");
                Ok(Arc::new(store))
            }
            Backend::Sqlite => {
                let store = SqliteStore::open(&self.sqlite_path)?;
                info!(path = %self.sqlite_path.display(), "using sqlite store");
                Ok(Arc::new(store))
            }
        }
    }
}

fn required<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => bail!("missing '{key}' in configuration"),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_credentials() {
        let config = Config::from_json(
            r#"{ "airtable_api_key": "keyABC", "airtable_base_id": "appXYZ" }"#,
        )
        .unwrap();

        assert_eq!(config.backend, Backend::Airtable);
        assert_eq!(config.table_name, "Registrations");
        assert_eq!(config.confirmation_field, "id");
        assert_eq!(config.api_url, "https://api.airtable.com/v0");
        assert_eq!(config.port, 8501);
        assert_eq!(config.listen_address(), "0.0.0.0:8501");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.session_idle(), Duration::from_secs(1800));
    }

    #[test]
    fn test_table_name_override() {
        let config = Config::from_json(
            r#"{ "airtable_api_key": "k", "airtable_base_id": "b", "table_name": "Kayitlar" }"#,
        )
        .unwrap();

        assert_eq!(config.table_name, "Kayitlar");
        assert_eq!(config.store_description(), "airtable b/Kayitlar");
    }

    #[test]
    fn test_sqlite_backend_needs_no_credentials() {
        let config = Config::from_json(
            r#"{ "backend": "sqlite", "sqlite_path": "/tmp/kayit.db", "port": 9000 }"#,
        )
        .unwrap();

        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.sqlite_path, PathBuf::from("/tmp/kayit.db"));
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_airtable_without_key_fails_to_open() {
        let config = Config::from_json(r#"{ "airtable_base_id": "appXYZ" }"#).unwrap();

        let err = config.open_store().err().unwrap();
        assert!(err.to_string().contains("airtable_api_key"));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let config = Config::from_json(
            r#"{ "airtable_api_key": "keySECRET", "airtable_base_id": "appXYZ" }"#,
        )
        .unwrap();

        let printed = format!("{config:?}");
        assert!(!printed.contains("keySECRET"));
        assert!(printed.contains("appXYZ"));
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        std::fs::write(
            &path,
            r#"{ "airtable_api_key": "k", "airtable_base_id": "b", "table_name": "Dosya", "port": 9000 }"#,
        )
        .unwrap();

        std::env::set_var("KAYIT__TABLE_NAME", "Ortam");
        let loaded = Config::load(&path);
        std::env::remove_var("KAYIT__TABLE_NAME");

        let config = loaded.unwrap();
        assert_eq!(config.table_name, "Ortam");
        assert_eq!(config.airtable_base_id.as_deref(), Some("b"));
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = Config::load(Path::new("/nonexistent/kayit-secrets.json"));
        assert!(result.is_err());
    }
}

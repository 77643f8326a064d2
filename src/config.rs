use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configured endpoint
pub const ENDPOINT_ENV: &str = "CITECHAT_ENDPOINT";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the answering service; questions go to `<endpoint>/query`
    pub endpoint: String,

    /// Base URL the reference documents are served from (defaults to `endpoint`)
    pub documents_base_url: Option<String>,

    /// Reference document filenames listed in the sidebar
    pub documents: Vec<String>,

    /// Title shown in the header bar
    pub title: String,

    /// Optional request timeout; unset means no timeout
    pub request_timeout_secs: Option<u64>,

    /// Citechat home directory
    #[serde(skip)]
    pub citechat_home: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        Config {
            endpoint: "http://localhost:8000".to_string(),
            documents_base_url: None,
            documents: default_documents(),
            title: "Poc - Assistente digitale".to_string(),
            request_timeout_secs: None,
            citechat_home: home.join(".citechat"),
        }
    }
}

fn default_documents() -> Vec<String> {
    [
        "ITAS-1.pdf",
        "ITAS-2.pdf",
        "ITAS-3.pdf",
        "ITAS-4.pdf",
        "ITAS-5.pdf",
        "ITAS-6.pdf",
        "ITAS-7.pdf",
        "ITAS-8-per-CP.pdf",
    ]
    .iter()
    .map(|name| name.to_string())
    .collect()
}

impl Config {
    /// Load configuration from `~/.citechat/config.toml`, falling back to defaults
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        let citechat_home = home.join(".citechat");

        fs::create_dir_all(&citechat_home)
            .context("Failed to create .citechat directory")?;

        let mut config = Self::load_from(&citechat_home.join("config.toml"))?;
        config.citechat_home = citechat_home;
        Ok(config)
    }

    /// Load configuration from an explicit file; a missing file yields defaults.
    /// The session token and log stay under `~/.citechat` wherever the file lives.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        } else {
            Config::default()
        };

        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            if !endpoint.trim().is_empty() {
                config.endpoint = endpoint;
            }
        }

        Ok(config)
    }

    /// Full URL questions are posted to
    pub fn query_url(&self) -> String {
        format!("{}/query", self.endpoint.trim_end_matches('/'))
    }

    /// Link to a reference document under `/pdfs/`
    pub fn document_url(&self, document: &str) -> String {
        let base = self
            .documents_base_url
            .as_deref()
            .unwrap_or(&self.endpoint)
            .trim_end_matches('/');
        format!("{}/pdfs/{}", base, document)
    }

    pub fn session_path(&self) -> PathBuf {
        self.citechat_home.join("session.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.citechat_home.join("citechat.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Serializes tests that read or write the process environment
    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[test]
    fn missing_file_yields_defaults() {
        let _env = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();

        assert_eq!(config.documents.len(), 8);
        assert_eq!(config.documents[7], "ITAS-8-per-CP.pdf");
        assert!(config.request_timeout_secs.is_none());
        assert_eq!(config.citechat_home, Config::default().citechat_home);
    }

    #[test]
    fn session_and_log_paths_ignore_config_location() {
        let _env = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "title = \"Elsewhere\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        let home = Config::default().citechat_home;

        assert_eq!(config.title, "Elsewhere");
        assert_eq!(config.session_path(), home.join("session.json"));
        assert_eq!(config.log_path(), home.join("citechat.log"));
        assert!(!config.session_path().starts_with(dir.path()));
    }

    #[test]
    fn endpoint_env_overrides_file_unless_blank() {
        let _env = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "endpoint = \"http://from-file:9000\"\n").unwrap();

        unsafe { std::env::set_var(ENDPOINT_ENV, "http://from-env:7000") };
        let overridden = Config::load_from(&path).unwrap();

        unsafe { std::env::set_var(ENDPOINT_ENV, "   ") };
        let blank = Config::load_from(&path).unwrap();

        unsafe { std::env::remove_var(ENDPOINT_ENV) };
        let unset = Config::load_from(&path).unwrap();

        assert_eq!(overridden.endpoint, "http://from-env:7000");
        assert_eq!(overridden.query_url(), "http://from-env:7000/query");
        assert_eq!(blank.endpoint, "http://from-file:9000");
        assert_eq!(unset.endpoint, "http://from-file:9000");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let _env = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "documents_base_url = \"https://docs.example.com/\"\ndocuments = [\"guide.pdf\"]\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.documents, vec!["guide.pdf"]);
        assert_eq!(config.title, "Poc - Assistente digitale");
        assert_eq!(
            config.document_url("guide.pdf"),
            "https://docs.example.com/pdfs/guide.pdf"
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        let _env = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "documents = 12").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn urls_ignore_trailing_slash() {
        let config = Config {
            endpoint: "https://qa.example.com/".to_string(),
            ..Config::default()
        };

        assert_eq!(config.query_url(), "https://qa.example.com/query");
        assert_eq!(
            config.document_url("ITAS-1.pdf"),
            "https://qa.example.com/pdfs/ITAS-1.pdf"
        );
    }
}

//! YAML configuration for gdsync
//!
//! ```yaml
//! sync:
//!   root: ~/GoogleDrive
//!   workers: 4
//!   state_db: ~/.local/share/gdsync/state.db
//! drive:
//!   api_base_url: https://www.googleapis.com
//!   access_token_env: GDSYNC_ACCESS_TOKEN
//!   folder_id: root
//! logging:
//!   level: info
//!   json: false
//! ```
//!
//! Every field is optional; missing ones take the defaults shown above.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Complete gdsync configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub drive: DriveConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Local directory mirrored to Drive
    pub root: PathBuf,
    /// Reconciliation workers. Changes are bucketed by identity, so each
    /// identity is always handled by the same worker.
    pub workers: usize,
    /// SQLite database holding the baseline and open conflicts
    pub state_db: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Drive API host; `/drive/v3` and `/upload/drive/v3` are appended
    pub api_base_url: String,
    /// Environment variable holding an already-issued OAuth access token
    pub access_token_env: String,
    /// Folder new files are created in (`root` is My Drive)
    pub folder_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when neither `-v` nor `RUST_LOG` is given
    pub level: String,
    /// JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
        let data = dirs::data_local_dir().unwrap_or_else(|| home.join(".local/share"));
        Self {
            root: home.join("GoogleDrive"),
            workers: 4,
            state_db: data.join("gdsync").join("state.db"),
        }
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://www.googleapis.com".to_string(),
            access_token_env: "GDSYNC_ACCESS_TOKEN".to_string(),
            folder_id: "root".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Failure to read a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl Config {
    /// Reads and parses the YAML file at `path`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [`Config::load`], but any failure yields the defaults
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// `$XDG_CONFIG_HOME/gdsync/config.yaml` or the platform equivalent
    pub fn default_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("gdsync").join("config.yaml")
    }
}

/// One problem found by [`Config::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted field name, e.g. `sync.workers`
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

const MAX_WORKERS: usize = 64;

impl Config {
    /// Checks every field and returns all problems; empty means valid
    ///
    /// A `sync.root` starting with `~` is not checked for existence since
    /// the CLI expands it later.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut check = |ok: bool, field: &str, message: String| {
            if !ok {
                errors.push(ValidationError::new(field, message));
            }
        };

        check(
            (1..=MAX_WORKERS).contains(&self.sync.workers),
            "sync.workers",
            format!("must be between 1 and {MAX_WORKERS}, got {}", self.sync.workers),
        );
        check(
            self.sync.root.starts_with("~") || self.sync.root.is_dir(),
            "sync.root",
            format!("not a directory: {}", self.sync.root.display()),
        );
        check(
            !self.sync.state_db.as_os_str().is_empty(),
            "sync.state_db",
            "must not be empty".to_string(),
        );

        let url = self.drive.api_base_url.as_str();
        check(
            url.starts_with("https://") || url.starts_with("http://"),
            "drive.api_base_url",
            format!("not an http(s) URL: '{url}'"),
        );
        check(
            !self.drive.access_token_env.trim().is_empty(),
            "drive.access_token_env",
            "must name an environment variable".to_string(),
        );
        check(
            !self.drive.folder_id.trim().is_empty(),
            "drive.folder_id",
            "must not be empty".to_string(),
        );

        check(
            LOG_LEVELS.contains(&self.logging.level.as_str()),
            "logging.level",
            format!(
                "unknown level '{}' (expected one of {})",
                self.logging.level,
                LOG_LEVELS.join("/")
            ),
        );

        errors
    }
}

/// Programmatic construction starting from [`Config::default`]
///
/// ```rust,no_run
/// use gdsync_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .sync_workers(8)
///     .drive_folder_id("0AbCdEf")
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync_root(mut self, root: PathBuf) -> Self {
        self.config.sync.root = root;
        self
    }

    pub fn sync_workers(mut self, workers: usize) -> Self {
        self.config.sync.workers = workers;
        self
    }

    pub fn sync_state_db(mut self, path: PathBuf) -> Self {
        self.config.sync.state_db = path;
        self
    }

    pub fn drive_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.drive.api_base_url = url.into();
        self
    }

    pub fn drive_access_token_env(mut self, var: impl Into<String>) -> Self {
        self.config.drive.access_token_env = var.into();
        self
    }

    pub fn drive_folder_id(mut self, id: impl Into<String>) -> Self {
        self.config.drive.folder_id = id.into();
        self
    }

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_json(mut self, json: bool) -> Self {
        self.config.logging.json = json;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }

    /// Builds, returning the validation errors if there are any
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let errors = self.config.validate();
        if errors.is_empty() {
            Ok(self.config)
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn yaml_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn fields(config: &Config) -> Vec<String> {
        config.validate().into_iter().map(|e| e.field).collect()
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert!(cfg.sync.root.ends_with("GoogleDrive"));
        assert_eq!(cfg.sync.workers, 4);
        assert!(cfg.sync.state_db.ends_with("gdsync/state.db"));
        assert_eq!(cfg.drive.api_base_url, "https://www.googleapis.com");
        assert_eq!(cfg.drive.access_token_env, "GDSYNC_ACCESS_TOKEN");
        assert_eq!(cfg.drive.folder_id, "root");
        assert_eq!(cfg.logging.level, "info");
        assert!(!cfg.logging.json);
    }

    #[test]
    fn test_defaults_only_fail_on_missing_root() {
        let unexpected: Vec<_> = fields(&Config::default())
            .into_iter()
            .filter(|f| f != "sync.root")
            .collect();
        assert!(unexpected.is_empty(), "{unexpected:?}");
    }

    #[test]
    fn test_load_full_file() {
        let file = yaml_file(
            r#"
sync:
  root: /srv/drive
  workers: 2
  state_db: /var/lib/gdsync/state.db
drive:
  api_base_url: http://localhost:8080
  access_token_env: MY_TOKEN
  folder_id: 0AbCdEf
logging:
  level: debug
  json: true
"#,
        );

        let cfg = Config::load(file.path()).unwrap();

        assert_eq!(cfg.sync.root, PathBuf::from("/srv/drive"));
        assert_eq!(cfg.sync.workers, 2);
        assert_eq!(cfg.sync.state_db, PathBuf::from("/var/lib/gdsync/state.db"));
        assert_eq!(cfg.drive.api_base_url, "http://localhost:8080");
        assert_eq!(cfg.drive.access_token_env, "MY_TOKEN");
        assert_eq!(cfg.drive.folder_id, "0AbCdEf");
        assert_eq!(cfg.logging.level, "debug");
        assert!(cfg.logging.json);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let file = yaml_file("sync:\n  workers: 7\n");

        let cfg = Config::load(file.path()).unwrap();

        assert_eq!(cfg.sync.workers, 7);
        assert_eq!(cfg.drive.folder_id, "root");
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_load_errors() {
        let missing = Config::load(Path::new("/nonexistent/gdsync.yaml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));

        let file = yaml_file("sync: [workers: {{{");
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));

        let cfg = Config::load_or_default(Path::new("/nonexistent/gdsync.yaml"));
        assert_eq!(cfg.sync.workers, 4);
    }

    #[test]
    fn test_validate_worker_bounds() {
        let mut cfg = Config::default();
        cfg.sync.workers = 0;
        assert!(fields(&cfg).contains(&"sync.workers".to_string()));

        cfg.sync.workers = MAX_WORKERS + 1;
        assert!(fields(&cfg).contains(&"sync.workers".to_string()));

        cfg.sync.workers = MAX_WORKERS;
        assert!(!fields(&cfg).contains(&"sync.workers".to_string()));
    }

    #[test]
    fn test_validate_root() {
        let mut cfg = Config::default();
        cfg.sync.root = PathBuf::from("/definitely/not/here");
        assert!(fields(&cfg).contains(&"sync.root".to_string()));

        cfg.sync.root = PathBuf::from("~/not/expanded/yet");
        assert!(!fields(&cfg).contains(&"sync.root".to_string()));
    }

    #[test]
    fn test_validate_drive_settings() {
        let mut cfg = Config::default();
        cfg.drive.api_base_url = "ftp://example.com".into();
        cfg.drive.access_token_env = "  ".into();
        cfg.drive.folder_id = String::new();

        let fields = fields(&cfg);
        assert!(fields.contains(&"drive.api_base_url".to_string()));
        assert!(fields.contains(&"drive.access_token_env".to_string()));
        assert!(fields.contains(&"drive.folder_id".to_string()));
    }

    #[test]
    fn test_validate_log_level() {
        let mut cfg = Config::default();
        cfg.logging.level = "verbose".into();

        let errors = cfg.validate();
        let err = errors.iter().find(|e| e.field == "logging.level").unwrap();
        assert!(err.message.contains("verbose"));
        assert_eq!(
            err.to_string(),
            "logging.level: unknown level 'verbose' (expected one of trace/debug/info/warn/error)"
        );
    }

    #[test]
    fn test_builder() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ConfigBuilder::new()
            .sync_root(dir.path().to_path_buf())
            .sync_workers(8)
            .drive_api_base_url("http://127.0.0.1:9000")
            .drive_folder_id("0AbCdEf")
            .logging_level("warn")
            .logging_json(true)
            .build_validated()
            .unwrap();

        assert_eq!(cfg.sync.workers, 8);
        assert_eq!(cfg.drive.api_base_url, "http://127.0.0.1:9000");
        assert_eq!(cfg.drive.folder_id, "0AbCdEf");
        assert_eq!(cfg.logging.level, "warn");
        assert!(cfg.logging.json);
    }

    #[test]
    fn test_builder_reports_every_error() {
        let errors = ConfigBuilder::new()
            .sync_root(PathBuf::from("/definitely/not/here"))
            .sync_workers(0)
            .build_validated()
            .unwrap_err();

        assert!(errors.iter().any(|e| e.field == "sync.workers"));
        assert!(errors.iter().any(|e| e.field == "sync.root"));
    }
}

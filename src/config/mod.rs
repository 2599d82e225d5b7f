//! Configuration management.
//!
//! Settings are read from an optional TOML file and then overridden by
//! environment variables prefixed with `ARXIV_SHELF__`, using `__` between
//! section and key (`ARXIV_SHELF__LIBRARY__PATH=/srv/books`). Anything not set
//! falls back to the defaults below.

mod file_config;

pub use file_config::{read_config_file, render_config, write_default_config, ConfigFileError};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::import::{
    DocumentFetcher, EbookConvert, ImportPipeline, DEFAULT_CONVERTER, DEFAULT_CONVERT_TIMEOUT,
};
use crate::library::{open_library, BookFormat, DEFAULT_CALIBREDB};
use crate::sources::{ArxivSource, PaperSource, ARXIV_API_URL};
use crate::utils::{HttpClient, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};

/// Name of the config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "arxiv-shelf.toml";

const ENV_PREFIX: &str = "ARXIV_SHELF";
const ENV_SEPARATOR: &str = "__";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub converter: ConverterConfig,

    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub scratch: ScratchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Search API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_endpoint() -> String {
    ARXIV_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Document download settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// External converter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverterConfig {
    #[serde(default = "default_converter")]
    pub program: String,

    /// Appended after the input and output paths
    #[serde(default)]
    pub extra_args: Vec<String>,

    #[serde(default = "default_convert_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub output_format: BookFormat,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: default_converter(),
            extra_args: Vec::new(),
            timeout_secs: default_convert_timeout_secs(),
            output_format: BookFormat::default(),
        }
    }
}

fn default_converter() -> String {
    DEFAULT_CONVERTER.to_string()
}

fn default_convert_timeout_secs() -> u64 {
    DEFAULT_CONVERT_TIMEOUT.as_secs()
}

/// Which kind of library receives imported books
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryBackend {
    #[default]
    Calibre,
    Directory,
}

/// Library settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryConfig {
    #[serde(default)]
    pub backend: LibraryBackend,

    /// Library location; a leading `~` is the home directory
    #[serde(default = "default_library_path")]
    pub path: String,

    #[serde(default = "default_calibredb")]
    pub calibredb: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            backend: LibraryBackend::default(),
            path: default_library_path(),
            calibredb: default_calibredb(),
        }
    }
}

impl LibraryConfig {
    /// `path` with `~` expanded
    pub fn resolved_path(&self) -> PathBuf {
        expand_home(&self.path)
    }
}

fn default_library_path() -> String {
    "~/Calibre Library".to_string()
}

fn default_calibredb() -> String {
    DEFAULT_CALIBREDB.to_string()
}

/// Staging area settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScratchConfig {
    /// Parent for per-import scratch directories; the system temp dir if unset
    #[serde(default)]
    pub directory: Option<String>,
}

impl ScratchConfig {
    pub fn resolved_directory(&self) -> Option<PathBuf> {
        self.directory.as_deref().map(expand_home)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `text` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

/// Expand a leading `~` to the home directory.
///
/// Paths without one, and paths when no home directory is known, are
/// returned as they are.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = match path {
        "~" => "",
        p => match p.strip_prefix("~/") {
            Some(rest) => rest,
            None => return PathBuf::from(p),
        },
    };
    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => PathBuf::from(path),
    }
}

/// Load configuration from an optional file plus the environment
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path).format(config::FileFormat::Toml));
    }
    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

/// Find a config file in the usual places
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    default_config_path().filter(|p| p.is_file())
}

/// `<config dir>/arxiv-shelf/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("arxiv-shelf").join("config.toml"))
}

impl Config {
    /// Search source for the configured endpoint
    pub fn arxiv_source(&self) -> Result<ArxivSource, reqwest::Error> {
        let client = HttpClient::with_settings(
            &self.search.user_agent,
            Duration::from_secs(self.search.timeout_secs),
        )?;
        Ok(ArxivSource::with_client(
            Arc::new(client),
            self.search.endpoint.clone(),
        ))
    }

    /// Converter for the configured program
    pub fn converter(&self) -> EbookConvert {
        EbookConvert::new(self.converter.program.clone())
            .extra_args(self.converter.extra_args.clone())
            .timeout(Duration::from_secs(self.converter.timeout_secs))
    }

    /// Import pipeline resolving documents through `source`
    pub fn import_pipeline(
        &self,
        source: Arc<dyn PaperSource>,
    ) -> Result<ImportPipeline, reqwest::Error> {
        let client = HttpClient::with_settings(
            &self.search.user_agent,
            Duration::from_secs(self.fetch.timeout_secs),
        )?;
        Ok(ImportPipeline::new(
            source,
            DocumentFetcher::new(Arc::new(client)),
            Arc::new(self.converter()),
            open_library(&self.library),
        )
        .format(self.converter.output_format)
        .scratch_parent(self.scratch.resolved_directory()))
    }
}

//! Reading and writing the TOML configuration file.
//!
//! # Configuration File Format
//!
//! ```toml
//! [search]
//! endpoint = "http://export.arxiv.org/api/query"
//! timeout_secs = 15
//! user_agent = "arxiv-shelf/0.1.0"
//!
//! [fetch]
//! timeout_secs = 15
//!
//! [converter]
//! program = "ebook-convert"
//! extra_args = []
//! timeout_secs = 600
//! output_format = "epub"
//!
//! [library]
//! backend = "calibre"
//! path = "~/Calibre Library"
//! calibredb = "calibredb"
//!
//! [scratch]
//! directory = "/var/tmp"
//!
//! [logging]
//! level = "info"
//! format = "text"
//! ```

use std::path::Path;

use super::Config;

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("{0} already exists (use --force to overwrite)")]
    Exists(String),
}

/// Parse a TOML config file without environment overrides
pub fn read_config_file(path: &Path) -> Result<Config, ConfigFileError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigFileError::Io(e.to_string()))?;

    toml::from_str(&content).map_err(|e| ConfigFileError::Parse(e.to_string()))
}

/// Render a configuration as TOML
pub fn render_config(config: &Config) -> Result<String, ConfigFileError> {
    toml::to_string_pretty(config).map_err(|e| ConfigFileError::Serialize(e.to_string()))
}

/// Write the default configuration to `path`.
///
/// An existing file is only replaced when `force` is set. Missing parent
/// directories are created.
pub fn write_default_config(path: &Path, force: bool) -> Result<(), ConfigFileError> {
    if path.exists() && !force {
        return Err(ConfigFileError::Exists(path.display().to_string()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
    }

    let content = render_config(&Config::default())?;
    std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))?;
    tracing::debug!(path = %path.display(), "Wrote default config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LibraryBackend;
    use tempfile::tempdir;

    #[test]
    fn test_write_default_and_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        write_default_config(&path, false).unwrap();
        let loaded = read_config_file(&path).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_write_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[library]\nbackend = \"directory\"\n").unwrap();

        let err = write_default_config(&path, false).unwrap_err();
        assert!(matches!(err, ConfigFileError::Exists(_)));
        assert_eq!(
            read_config_file(&path).unwrap().library.backend,
            LibraryBackend::Directory
        );

        write_default_config(&path, true).unwrap();
        assert_eq!(
            read_config_file(&path).unwrap().library.backend,
            LibraryBackend::Calibre
        );
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[fetch]\ntimeout_secs = 30\n").unwrap();

        let config = read_config_file(&path).unwrap();
        assert_eq!(config.fetch.timeout_secs, 30);
        assert_eq!(config.search, Config::default().search);
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.toml");
        std::fs::write(&path, "invalid = toml = content").unwrap();

        assert!(matches!(
            read_config_file(&path),
            Err(ConfigFileError::Parse(_))
        ));
    }

    #[test]
    fn test_render_contains_sections() {
        let rendered = render_config(&Config::default()).unwrap();
        assert!(rendered.contains("[converter]"));
        assert!(rendered.contains("program = \"ebook-convert\""));
        assert!(rendered.contains("backend = \"calibre\""));
    }
}

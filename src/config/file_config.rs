//! Configuration file discovery and generation.
//!
//! # Configuration File Format
//!
//! ```toml
//! [harvest]
//! metadata_dir = "./metadata"
//! api_url = "https://export.arxiv.org/api/query"
//! page_size = 100
//! max_empty_pages = 3
//! page_delay_secs = 5
//! write_delay_secs = 5
//! default_max_results = 100
//!
//! [retry]
//! max_attempts = 5
//! backoff = "linear"
//! unavailable_step_secs = 10
//! failure_step_secs = 5
//!
//! [probe]
//! base_url = "https://storage.googleapis.com/arxiv-dataset/"
//! paths = ["", "tarpdfs/", "arxiv/acc-phys/pdf/9411/9411001v1.pdf"]
//! timeout_secs = 10
//! links_sample = 3
//!
//! [logging]
//! level = "info"
//! format = "text"
//! file = "./arxiv_query.log"
//! ```

use std::path::{Path, PathBuf};

use super::Config;

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "arxiv-harvest.toml";

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("{0} already exists")]
    Exists(PathBuf),
}

/// `<config_dir>/arxiv-harvest/config.toml` for the current user
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("arxiv-harvest").join("config.toml"))
}

/// First existing config file: the working directory, then the user config dir
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    default_config_path().filter(|path| path.is_file())
}

/// Write `config` as TOML, creating parent directories.
///
/// An existing file is only replaced when `overwrite` is set.
pub fn save_config(config: &Config, path: &Path, overwrite: bool) -> Result<(), ConfigFileError> {
    if path.exists() && !overwrite {
        return Err(ConfigFileError::Exists(path.to_path_buf()));
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
        }
    }
    std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;
    use tempfile::tempdir;

    #[test]
    fn test_save_then_load_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf").join("config.toml");

        save_config(&Config::default(), &path, false).unwrap();
        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded, Config::default());

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("[harvest]"));
        assert!(text.contains("backoff = \"linear\""));
        assert!(!text.contains("file ="));
    }

    #[test]
    fn test_save_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "# mine\n").unwrap();

        assert!(matches!(
            save_config(&Config::default(), &path, false),
            Err(ConfigFileError::Exists(_))
        ));
        save_config(&Config::default(), &path, true).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("[retry]"));
    }

    #[test]
    fn test_default_config_path_shape() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("arxiv-harvest/config.toml"));
        }
    }
}

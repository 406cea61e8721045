use crate::classify::CategoryTable;
use crate::merge::{MergeLayout, MergeOptions};
use crate::naming::NameMap;
use serde::{Deserialize, Serialize};
use shopcrawl_scanner::renderer::DEFAULT_USER_AGENT;
use shopcrawl_scanner::{Pacing, ProductSelectors};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Where `shopcrawl init` writes the configuration by default.
pub const DEFAULT_CONFIG_PATH: &str = "~/.config/shopcrawl/config.json";

/// The bundled configuration, including the category rules and name map
/// for the reference shop.
pub const DEFAULT_CONFIG: &str = include_str!("../defaults/config.json");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlSettings {
    pub base_url: String,
    pub output_dir: String,
    pub jsonl: Option<String>,
    pub state_dir: Option<String>,
    pub max_pages: Option<usize>,
    pub min_delay_secs: f64,
    pub max_delay_secs: f64,
    pub max_retries: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            base_url: "https://eshop.eca.ir".to_string(),
            output_dir: "scraped_data".to_string(),
            jsonl: None,
            state_dir: Some("scraped_data/.state".to_string()),
            max_pages: None,
            min_delay_secs: 3.0,
            max_delay_secs: 8.0,
            max_retries: 2,
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CrawlSettings {
    pub fn pacing(&self) -> Result<Pacing> {
        Pacing::from_secs_f64(self.min_delay_secs, self.max_delay_secs)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeSettings {
    pub input_root: String,
    pub output_root: String,
    pub layout: MergeLayout,
    pub max_files: Option<usize>,
    pub min_chars: usize,
    pub keep_source_url: bool,
    pub name_map: NameMap,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            input_root: "scraped_data".to_string(),
            output_root: "merged_dataset".to_string(),
            layout: MergeLayout::Nested,
            max_files: None,
            min_chars: crate::clean::MIN_CONTENT_CHARS,
            keep_source_url: false,
            name_map: NameMap::new(),
        }
    }
}

impl MergeSettings {
    /// Merge options with both roots run through `~`/env expansion.
    pub fn to_options(&self) -> MergeOptions {
        MergeOptions {
            input_root: expand_path(&self.input_root),
            output_root: expand_path(&self.output_root),
            layout: self.layout,
            max_files: self.max_files,
            min_chars: self.min_chars,
            keep_source_url: self.keep_source_url,
            name_map: self.name_map.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopcrawlConfig {
    pub crawl: CrawlSettings,
    pub selectors: ProductSelectors,
    pub categories: CategoryTable,
    pub merge: MergeSettings,
}

impl ShopcrawlConfig {
    /// The configuration shipped with the binary.
    pub fn bundled() -> Result<Self> {
        Self::parse(DEFAULT_CONFIG, Path::new("<bundled>"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading config from {}", path.display());
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Load `path` when given, otherwise the bundled defaults.
    pub fn load_or_bundled(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::bundled(),
        }
    }

    fn parse(text: &str, path: &Path) -> Result<Self> {
        let config: ShopcrawlConfig = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that can't be expressed in the JSON shape alone. Category
    /// table problems are already caught while deserializing.
    pub fn validate(&self) -> Result<()> {
        self.crawl.pacing()?;
        if self.crawl.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".to_string()));
        }
        if self.crawl.output_dir.trim().is_empty() {
            return Err(ConfigError::Invalid("output_dir must not be empty".to_string()));
        }
        self.selectors
            .compile()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }
}

/// Expand `~` and environment variables. Unexpandable input is used as-is.
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).as_ref()),
    }
}

/// Write the bundled configuration to `path`, creating parent directories.
/// An existing file is only replaced when `force` is set.
pub fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(ConfigError::Invalid(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, DEFAULT_CONFIG).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_config_is_valid() {
        let config = ShopcrawlConfig::bundled().unwrap();
        assert_eq!(config.categories.fallback(), "miscellaneous");
        assert!(!config.categories.rules().is_empty());
        assert!(!config.merge.name_map.is_empty());
        assert_eq!(config.crawl.max_retries, 2);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ShopcrawlConfig = serde_json::from_str(r#"{"crawl":{"max_pages":5}}"#).unwrap();
        assert_eq!(config.crawl.max_pages, Some(5));
        assert_eq!(config.crawl.timeout_secs, 30);
        assert_eq!(config.selectors, ProductSelectors::default());
        assert_eq!(config.merge.min_chars, 20);
    }

    #[test]
    fn test_expand_path_leaves_plain_paths() {
        assert_eq!(expand_path("merged_dataset"), PathBuf::from("merged_dataset"));
    }
}

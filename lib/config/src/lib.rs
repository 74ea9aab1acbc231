use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const DEFAULT_CACHE_CAPACITY: usize = 128;
const DEFAULT_MIN_TOKEN_LENGTH: usize = 2;

#[derive(Serialize, Deserialize, Default, Clone, Debug)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub prefectures: Vec<PrefectureConfig>,
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SearchConfig {
    pub cache_capacity: Option<usize>,
    pub min_token_length: Option<usize>,
    pub tokenizer_backend: Option<String>,
}

/// One entry in the router's static prefecture → index directory table.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PrefectureConfig {
    /// The token accepted as `prefecture` in search requests, e.g. `"東京都"`.
    pub token: String,
    pub display_name: String,
    pub index_path: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct JournalConfig {
    pub root: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ExportConfig {
    pub root: Option<String>,
}

impl Config {
    /// Returns the configured LRU cache capacity or the default value (128).
    pub fn get_cache_capacity(&self) -> usize {
        self.search.cache_capacity.unwrap_or(DEFAULT_CACHE_CAPACITY)
    }

    /// Returns the configured minimum retained token length or the default (2).
    pub fn get_min_token_length(&self) -> usize {
        self.search
            .min_token_length
            .unwrap_or(DEFAULT_MIN_TOKEN_LENGTH)
    }

    /// Returns the configured tokenizer backend name, or `None` to auto-detect.
    pub fn get_tokenizer_backend(&self) -> Option<&str> {
        self.search.tokenizer_backend.as_deref()
    }

    /// Returns the configured (or default) journal root directory.
    pub fn get_journal_root(&self) -> &str {
        self.journal.root.as_deref().unwrap_or("./data/journal")
    }

    /// Returns the configured (or default) export cache root directory.
    pub fn get_export_root(&self) -> &str {
        self.export.root.as_deref().unwrap_or("./data/export_cache")
    }
}

impl Config {
    /// Creates a new config object, loading `src` (or the
    /// `SEARCH_CONFIG` environment variable, or the default config file
    /// path) and falling back to a freshly-saved default when the file
    /// is missing or empty.
    pub fn new(src: Option<PathBuf>) -> Result<Self, String> {
        let config_file = src
            .or_else(|| std::env::var("SEARCH_CONFIG").map(|i| Path::new(&i).to_owned()).ok())
            .unwrap_or(Self::get_config_file()?);

        let config = if !config_file.exists()
            || fs::metadata(&config_file).map(|i| i.len()).unwrap_or(1) == 0
        {
            log::info!("no config found at {}, writing defaults", config_file.display());
            Self::default().save()?
        } else {
            let conf_data = fs::read_to_string(&config_file).map_err(|e| e.to_string())?;
            toml::from_str(&conf_data).map_err(|e| e.to_string())?
        };

        Ok(config)
    }

    fn save(self) -> Result<Self, String> {
        let config_file = Self::get_config_file()?;
        let s = toml::to_string_pretty(&self).map_err(|e| e.to_string())?;
        fs::write(&config_file, s).map_err(|e| e.to_string())?;
        Ok(self)
    }

    /// Creates missing folders and returns the config file path.
    pub fn get_config_file() -> Result<PathBuf, String> {
        let conf_dir: PathBuf = Path::new("./").join("data");
        if !conf_dir.exists() {
            fs::create_dir_all(&conf_dir).map_err(|e| e.to_string())?;
        }
        Ok(conf_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::default();
        assert_eq!(config.get_cache_capacity(), DEFAULT_CACHE_CAPACITY);
        assert_eq!(config.get_min_token_length(), DEFAULT_MIN_TOKEN_LENGTH);
        assert_eq!(config.get_tokenizer_backend(), None);
        assert_eq!(config.get_journal_root(), "./data/journal");
    }

    #[test]
    fn explicit_values_override_defaults() {
        let mut config = Config::default();
        config.search.cache_capacity = Some(64);
        config.search.tokenizer_backend = Some("dictionary".to_string());
        assert_eq!(config.get_cache_capacity(), 64);
        assert_eq!(config.get_tokenizer_backend(), Some("dictionary"));
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = Config::default();
        config.prefectures.push(PrefectureConfig {
            token: "東京都".to_string(),
            display_name: "東京都".to_string(),
            index_path: "./data/index/tokyo".to_string(),
        });

        let serialized = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.prefectures.len(), 1);
        assert_eq!(parsed.prefectures[0].token, "東京都");
    }
}

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = ".env.toml";
/// Profile used when `settings.default_model` is unset.
pub const FALLBACK_MODEL: &str = "phi3-mini";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_BASE_URL: &str = "http://localhost:1234/v1";
pub const DEFAULT_API_KEY: &str = "lm-studio";

/// The `.env.toml` document.
///
/// Sections and fields this crate does not know about are carried in the
/// `extra` tables so a load/save cycle never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub models: IndexMap<String, ModelProfile>,
    #[serde(default, skip_serializing_if = "Settings::is_empty")]
    pub settings: Settings,
    #[serde(default, skip_serializing_if = "LmStudioConfig::is_empty")]
    pub lm_studio: LmStudioConfig,
    #[serde(flatten)]
    pub extra: toml::Table,
}

/// One `[models.<key>]` entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelProfile {
    /// Identifier the model server knows the model by.
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl ModelProfile {
    pub fn new(name: impl Into<String>, timeout: u64, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timeout: Some(timeout),
            description: Some(description.into()),
            extra: toml::Table::new(),
        }
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    pub fn description_or_default(&self) -> &str {
        self.description.as_deref().unwrap_or("No description")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub default_model: Option<String>,
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl Settings {
    fn is_empty(&self) -> bool {
        self.default_model.is_none() && self.extra.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LmStudioConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl LmStudioConfig {
    fn is_empty(&self) -> bool {
        self.base_url.is_none() && self.api_key.is_none() && self.extra.is_empty()
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or(DEFAULT_API_KEY)
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// A model profile with the server connection settings merged in.
#[derive(Clone, PartialEq)]
pub struct ModelConfig {
    pub key: String,
    pub name: String,
    pub timeout_secs: u64,
    pub description: Option<String>,
    pub base_url: String,
    pub api_key: String,
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("timeout_secs", &self.timeout_secs)
            .field("description", &self.description)
            .field("base_url", &self.base_url)
            .field("api_key", &mask_secret(&self.api_key))
            .finish()
    }
}

impl ModelConfig {
    /// Model id as the OpenAI-compatible endpoint expects it (no `openai/` routing prefix).
    pub fn api_model(&self) -> &str {
        self.name.strip_prefix("openai/").unwrap_or(&self.name)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn mask_secret(s: &str) -> String {
    if s.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", s.chars().take(2).collect::<String>())
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse config: {e}")))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::config(format!("Failed to serialize config: {e}")))
    }

    /// Name of the default profile, falling back to [`FALLBACK_MODEL`].
    pub fn current_model(&self) -> &str {
        self.settings
            .default_model
            .as_deref()
            .unwrap_or(FALLBACK_MODEL)
    }

    /// `(key, description)` pairs in document order.
    pub fn list_models(&self) -> Vec<(&str, &str)> {
        self.models
            .iter()
            .map(|(key, profile)| (key.as_str(), profile.description_or_default()))
            .collect()
    }

    /// Resolve a profile by key (or the default) and merge in `[lm_studio]`.
    pub fn model_config(&self, name: Option<&str>) -> Result<ModelConfig> {
        let key = name.unwrap_or_else(|| self.current_model());
        let profile = self
            .models
            .get(key)
            .ok_or_else(|| Error::model_not_found(key, self.models.keys()))?;

        Ok(ModelConfig {
            key: key.to_string(),
            name: profile.name.clone(),
            timeout_secs: profile.timeout_secs(),
            description: profile.description.clone(),
            base_url: self.lm_studio.base_url().to_string(),
            api_key: self.lm_studio.api_key().to_string(),
        })
    }

    /// Point `settings.default_model` at an existing key.
    pub fn set_default_model(&mut self, key: &str) -> Result<&ModelProfile> {
        let Some(profile) = self.models.get(key) else {
            return Err(Error::model_not_found(key, self.models.keys()));
        };
        self.settings.default_model = Some(key.to_string());
        Ok(profile)
    }
}

/// Location of the configuration document on disk.
///
/// Every operation reads the file fresh and mutations rewrite it in full.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    /// Resolve `path` against the working directory and its ancestors.
    pub fn locate(path: &Path) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::locate_from(path, &cwd)
    }

    pub fn locate_from(path: &Path, start: &Path) -> Result<Self> {
        if path.is_absolute() {
            return if path.is_file() {
                Ok(Self::at(path))
            } else {
                Err(Error::ConfigNotFound {
                    path: path.to_path_buf(),
                })
            };
        }

        start
            .ancestors()
            .map(|dir| dir.join(path))
            .find(|candidate| candidate.is_file())
            .map(|found| {
                debug!(path = %found.display(), "located config file");
                Self { path: found }
            })
            .ok_or_else(|| Error::ConfigNotFound {
                path: path.to_path_buf(),
            })
    }

    /// Use `path` verbatim without searching.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Config> {
        if !self.path.is_file() {
            return Err(Error::ConfigNotFound {
                path: self.path.clone(),
            });
        }
        let content = std::fs::read_to_string(&self.path)?;
        debug!(path = %self.path.display(), bytes = content.len(), "read config");
        toml::from_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse config {}: {e}",
                self.path.display()
            ))
        })
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        let content = config.to_toml()?;
        std::fs::write(&self.path, content)?;
        debug!(path = %self.path.display(), models = config.models.len(), "wrote config");
        Ok(())
    }
}

//! Layered configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g. `APP_SEARCH__MAX_ROWS`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;

pub const DEFAULT_ROWS: usize = 10;
pub const DEFAULT_MAX_ROWS: usize = 100;
pub const DEFAULT_RRF_ALPHA: f32 = 0.5;
pub const DEFAULT_MAX_FEATURES: usize = 20_000;
pub const DEFAULT_MODEL_NAME: &str = "all-MiniLM-L6-v2";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub catalog: CatalogSettings,
    pub sparse: SparseSettings,
    pub dense: DenseSettings,
    pub search: SearchSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// JSON array of catalog items. Empty means the built-in demo catalog.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SparseSettings {
    pub enabled: bool,
    /// Vocabulary cap; only the most frequent terms get a dimension.
    pub max_features: usize,
}

impl Default for SparseSettings {
    fn default() -> Self {
        Self { enabled: true, max_features: DEFAULT_MAX_FEATURES }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedBackend {
    /// Sentence-transformer weights run through candle.
    Candle,
    /// Deterministic token-hashing embedder, no model files needed.
    Hashing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenseSettings {
    pub enabled: bool,
    pub backend: EmbedBackend,
    pub model_name: String,
    /// Directory holding `config.json`, `tokenizer.json` and the weights.
    pub model_dir: String,
    pub max_len: usize,
    pub batch_size: usize,
    /// Output dimension of the hashing backend.
    pub hashing_dim: usize,
    pub show_progress: bool,
}

impl Default for DenseSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: EmbedBackend::Candle,
            model_name: DEFAULT_MODEL_NAME.to_string(),
            model_dir: format!("models/{DEFAULT_MODEL_NAME}"),
            max_len: 256,
            batch_size: 32,
            hashing_dim: 384,
            show_progress: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub default_rows: usize,
    pub max_rows: usize,
    pub default_alpha: f32,
    /// Reject out-of-range `rows`/`alpha` instead of clamping them.
    pub strict_params: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_rows: DEFAULT_ROWS,
            max_rows: DEFAULT_MAX_ROWS,
            default_alpha: DEFAULT_RRF_ALPHA,
            strict_params: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8000 }
    }
}

impl Settings {
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.search.max_rows == 0 {
            return Err(Error::InvalidConfig("search.max_rows must be at least 1".into()));
        }
        if self.search.default_rows == 0 || self.search.default_rows > self.search.max_rows {
            return Err(Error::InvalidConfig(format!(
                "search.default_rows must be within 1..={}",
                self.search.max_rows
            )));
        }
        if !(self.search.default_alpha.is_finite() && self.search.default_alpha > 0.0) {
            return Err(Error::InvalidConfig("search.default_alpha must be a positive number".into()));
        }
        if self.sparse.max_features == 0 {
            return Err(Error::InvalidConfig("sparse.max_features must be at least 1".into()));
        }
        if self.dense.batch_size == 0 || self.dense.max_len == 0 || self.dense.hashing_dim == 0 {
            return Err(Error::InvalidConfig(
                "dense.batch_size, dense.max_len and dense.hashing_dim must be positive".into(),
            ));
        }
        Ok(())
    }
}

pub struct Config {
    figment: Figment,
    base_dir: PathBuf,
}

impl Config {
    /// Load `config.toml` from the working directory plus the `RUST_ENV` overlay.
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        let base_dir = env::current_dir()?;
        let figment = Self::layered(&base_dir.join("config.toml"), &env_name);
        let config = Self { figment, base_dir };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    /// Load an explicit config file; its directory becomes the base for relative paths.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!("config file {}", path.display())).into());
        }
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(env::current_dir, |p| Ok(p.to_path_buf()))?;
        let figment = Self::layered(path, &env_name);
        let config = Self { figment, base_dir };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    /// Wrap an already assembled figment (tests, embedding in other tools).
    pub fn from_figment(figment: Figment, base_dir: impl Into<PathBuf>) -> Self {
        let figment = Figment::from(Serialized::defaults(Settings::default())).merge(figment);
        Self { figment, base_dir: base_dir.into() }
    }

    fn layered(file: &Path, env_name: &str) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file(file));
        let overlay = match env_name {
            "dev" | "development" => Some("config.dev.toml"),
            "prod" | "production" => Some("config.prod.toml"),
            "test" | "testing" => Some("config.test.toml"),
            _ => None,
        };
        if let Some(name) = overlay {
            figment = figment.merge(Toml::file(file.with_file_name(name)));
        }
        figment.merge(Env::prefixed("APP_").split("__"))
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// The full typed settings tree, validated.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Expand and resolve a configured path against the config's base directory.
    pub fn resolve_path<S: AsRef<str>>(&self, p: S) -> PathBuf {
        resolve_with_base(&self.base_dir, p)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        if matches!(env, "prod" | "production") {
            let backend: EmbedBackend = self.get("dense.backend")?;
            if backend == EmbedBackend::Hashing {
                tracing::warn!("dense.backend = \"hashing\" in production; semantic quality will be poor");
            }
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

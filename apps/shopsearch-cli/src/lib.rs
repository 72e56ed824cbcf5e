//! shopsearch-cli
//!
//! Wiring shared by the `shopsearch` binary and its tests: configuration to
//! a ready `SearchService`, the HTTP router, and logging setup.
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shopsearch_core::config::{Config, Settings};
use shopsearch_core::Catalog;
use shopsearch_embed::EmbedderOptions;
use shopsearch_hybrid::{configured_embedder, SearchService, ServiceOptions};

pub mod http;

/// `RUST_LOG` wins unless `--verbose` asks for debug output. Logs go to
/// stderr so `query --json` keeps stdout clean.
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Explicit file if given, otherwise `config.toml` in the working directory.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(p) => Config::load_from(p),
        None => Config::load(),
    }
}

/// The configured catalog file, or the built-in demo catalog when unset.
pub fn load_catalog(config: &Config, settings: &Settings) -> anyhow::Result<Catalog> {
    if settings.catalog.path.trim().is_empty() {
        tracing::info!("using built-in demo catalog");
        return Ok(Catalog::seed());
    }
    let path = config.resolve_path(&settings.catalog.path);
    let catalog = Catalog::from_json_file(&path)?;
    tracing::info!(path = %path.display(), items = catalog.len(), "loaded catalog");
    Ok(catalog)
}

pub fn build_service(config: &Config) -> anyhow::Result<SearchService> {
    let settings = config.settings()?;
    let catalog = load_catalog(config, &settings)?;
    let model_dir = config.resolve_path(&settings.dense.model_dir);
    let factory = configured_embedder(EmbedderOptions::from_settings(&settings.dense, model_dir));
    Ok(SearchService::new(Arc::new(catalog), ServiceOptions::from_settings(&settings), factory))
}

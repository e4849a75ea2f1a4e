//! Runtime server configuration, deserialised from `config.toml` layered
//! with `CURIO_`-prefixed environment variables.

use std::{
  collections::HashMap,
  path::{Path, PathBuf},
  time::Duration,
};

use curio_core::category::{CategoryAliases, NewCategory};
use curio_pipeline::ApprovalPolicy;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  pub store_path:       PathBuf,
  pub analysis:         AnalysisConfig,
  #[serde(default)]
  pub approval:         ApprovalConfig,
  /// Seeded at start-up when no category of the same name exists.
  #[serde(default)]
  pub categories:       Vec<CategorySeed>,
  /// Free-text hint (any case) → canonical category name.
  #[serde(default)]
  pub category_aliases: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
  pub description_url:   String,
  pub image_quality_url: String,
  #[serde(default)]
  pub api_key:           Option<String>,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs:      u64,
}

impl AnalysisConfig {
  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApprovalConfig {
  pub max_allocation_attempts: u32,
  pub bulk_limit:              usize,
  pub reviewer:                String,
}

impl Default for ApprovalConfig {
  fn default() -> Self {
    let policy = ApprovalPolicy::default();
    Self {
      max_allocation_attempts: policy.max_allocation_attempts,
      bulk_limit:              policy.bulk_limit,
      reviewer:                "admin".into(),
    }
  }
}

impl ApprovalConfig {
  pub fn policy(&self) -> ApprovalPolicy {
    ApprovalPolicy {
      max_allocation_attempts: self.max_allocation_attempts,
      bulk_limit:              self.bulk_limit,
    }
  }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CategorySeed {
  pub name:   String,
  #[serde(default)]
  pub slug:   Option<String>,
  #[serde(default)]
  pub prefix: Option<String>,
}

impl From<CategorySeed> for NewCategory {
  fn from(seed: CategorySeed) -> Self {
    Self { name: seed.name, slug: seed.slug, prefix: seed.prefix }
  }
}

impl ServerConfig {
  /// Load from an optional TOML file plus the environment
  /// (`CURIO_PORT`, `CURIO_ANALYSIS__API_KEY`, ...).
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("CURIO")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()?
      .try_deserialize()
  }

  pub fn aliases(&self) -> CategoryAliases {
    CategoryAliases::from(self.category_aliases.clone())
  }
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 8080 }

fn default_timeout_secs() -> u64 { 60 }

/// Expand a leading `~/` to `$HOME`.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

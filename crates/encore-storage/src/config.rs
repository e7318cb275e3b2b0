use encore_config::{CONFIG_BACKEND, ConfigError, PATHS};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const SECTION: &str = "storage";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
  pub db_path: PathBuf,
  pub journal_mode: Option<String>,
}

impl Default for StorageConfig {
  fn default() -> Self {
    let db_path = PATHS.data_dir.join("encore.db");
    StorageConfig { db_path, journal_mode: Some("WAL".to_string()) }
  }
}

impl StorageConfig {
  pub fn load() -> Result<Self, ConfigError> {
    CONFIG_BACKEND.load_or_init_section(SECTION)
  }

  pub fn database_url(&self) -> String {
    self.db_path.to_string_lossy().into_owned()
  }
}

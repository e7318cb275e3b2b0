use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that relocates everything under one directory
/// (portable installs, tests).
pub const BASE_DIR_ENV: &str = "ENCORE_BASE_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("toml error: {0}")]
  Toml(#[from] toml::de::Error),
  #[error("toml encode error: {0}")]
  TomlEncode(#[from] toml_edit::ser::Error),
  #[error("directories error: could not determine home directory")]
  Directories,
  #[error("other: {0}")]
  Other(String),
}

#[derive(Debug, Clone)]
pub struct EncorePaths {
  pub base_dir: PathBuf,
  pub config_dir: PathBuf,
  pub data_dir: PathBuf,
}

impl EncorePaths {
  pub fn new() -> Result<Self, ConfigError> {
    match std::env::var(BASE_DIR_ENV) {
      Ok(env_base) => Self::at(PathBuf::from(env_base)),
      Err(_) => {
        let proj_dirs = ProjectDirs::from("com", "encore", "encore").ok_or(ConfigError::Directories)?;
        let paths = Self {
          base_dir: proj_dirs.config_dir().to_path_buf(),
          config_dir: proj_dirs.config_dir().to_path_buf(),
          data_dir: proj_dirs.data_dir().to_path_buf(),
        };
        paths.ensure_dirs()?;
        Ok(paths)
      }
    }
  }

  /// Lays out `config/` and `data/` under `base`.
  pub fn at(base: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let base = base.as_ref();
    let paths =
      Self { base_dir: base.to_path_buf(), config_dir: base.join("config"), data_dir: base.join("data") };
    paths.ensure_dirs()?;
    Ok(paths)
  }

  pub fn detect() -> Result<Self, ConfigError> {
    Self::new()
  }

  pub fn config_file(&self) -> PathBuf {
    self.config_dir.join("encore.toml")
  }

  fn ensure_dirs(&self) -> Result<(), ConfigError> {
    std::fs::create_dir_all(&self.config_dir)?;
    std::fs::create_dir_all(&self.data_dir)?;
    Ok(())
  }
}

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use toml_edit::{DocumentMut, Item};

use crate::io::atomic_write_str;
use crate::paths::{ConfigError, EncorePaths};

/// Section-oriented access to the config file. Every crate owns one
/// `[section]` and never reads another's.
pub trait ConfigBackend {
  fn load_section<T: DeserializeOwned>(&self, section: &str) -> Result<T, ConfigError>;
  fn save_section<T: Serialize>(&self, section: &str, value: &T) -> Result<(), ConfigError>;
}

pub struct TomlConfigBackend {
  paths: EncorePaths,
}

impl TomlConfigBackend {
  pub fn new(paths: EncorePaths) -> Self {
    Self { paths }
  }

  /// Reads `[section]`, falling back to `T::default()` when the file or
  /// the section is missing.
  pub fn load_section_with_default<T>(&self, section: &str) -> Result<T, ConfigError>
  where
    T: DeserializeOwned + Default,
  {
    match self.read_table()? {
      Some(table) => match table.get(section) {
        Some(value) => decode(section, value.clone()),
        None => Ok(T::default()),
      },
      None => Ok(T::default()),
    }
  }

  /// Loads `[section]` (or its defaults) and writes it back, so a fresh
  /// install ends up with a complete, editable file.
  pub fn load_or_init_section<T>(&self, section: &str) -> Result<T, ConfigError>
  where
    T: DeserializeOwned + Serialize + Default,
  {
    let value = self.load_section_with_default(section)?;
    self.save_section(section, &value)?;
    Ok(value)
  }

  fn read_table(&self) -> Result<Option<toml::Table>, ConfigError> {
    match fs::read_to_string(self.paths.config_file()) {
      Ok(content) => Ok(Some(toml::from_str(&content)?)),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }
}

fn decode<T: DeserializeOwned>(section: &str, value: toml::Value) -> Result<T, ConfigError> {
  value.try_into().map_err(|e| ConfigError::Other(format!("decode section [{section}]: {e}")))
}

impl ConfigBackend for TomlConfigBackend {
  fn load_section<T: DeserializeOwned>(&self, section: &str) -> Result<T, ConfigError> {
    let path = self.paths.config_file();
    let table = self.read_table()?.ok_or_else(|| ConfigError::Other(format!("missing config file {path:?}")))?;
    let value = table
      .get(section)
      .ok_or_else(|| ConfigError::Other(format!("missing section [{section}] in {path:?}")))?;
    decode(section, value.clone())
  }

  fn save_section<T: Serialize>(&self, section: &str, value: &T) -> Result<(), ConfigError> {
    let path = self.paths.config_file();

    // Edit the existing document in place so comments and ordering survive.
    let mut doc: DocumentMut = match fs::read_to_string(&path) {
      Ok(content) => content
        .parse::<DocumentMut>()
        .map_err(|e| ConfigError::Other(format!("parse {path:?}: {e}")))?,
      Err(e) if e.kind() == ErrorKind::NotFound => DocumentMut::new(),
      Err(e) => return Err(e.into()),
    };

    let encoded = toml_edit::ser::to_document(value)?;
    doc[section] = Item::Table(encoded.as_table().clone());

    atomic_write_str(&path, &doc.to_string())?;
    Ok(())
  }
}

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Identifier of a song inside one theme's funnel.
///
/// Stable across every tier move: promoting or demoting a song never
/// changes its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SongId(Uuid);

impl SongId {
  /// Generates a fresh identifier.
  pub fn new() -> Self {
    SongId(Uuid::new_v4())
  }

  pub fn from_uuid(u: Uuid) -> Self {
    SongId(u)
  }

  pub fn as_uuid(&self) -> Uuid {
    self.0
  }
}

impl Default for SongId {
  fn default() -> Self {
    Self::new()
  }
}

impl From<Uuid> for SongId {
  fn from(u: Uuid) -> Self {
    SongId(u)
  }
}

impl From<SongId> for Uuid {
  fn from(id: SongId) -> Self {
    id.0
  }
}

impl FromStr for SongId {
  type Err = uuid::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Uuid::parse_str(s.trim()).map(SongId)
  }
}

impl fmt::Display for SongId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

/// Identifier of a theme (one Music League round).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThemeId(Uuid);

impl ThemeId {
  pub fn new() -> Self {
    ThemeId(Uuid::new_v4())
  }

  pub fn from_uuid(u: Uuid) -> Self {
    ThemeId(u)
  }

  pub fn as_uuid(&self) -> Uuid {
    self.0
  }
}

impl Default for ThemeId {
  fn default() -> Self {
    Self::new()
  }
}

impl From<Uuid> for ThemeId {
  fn from(u: Uuid) -> Self {
    ThemeId(u)
  }
}

impl From<ThemeId> for Uuid {
  fn from(id: ThemeId) -> Self {
    id.0
  }
}

impl FromStr for ThemeId {
  type Err = uuid::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Uuid::parse_str(s.trim()).map(ThemeId)
  }
}

impl fmt::Display for ThemeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

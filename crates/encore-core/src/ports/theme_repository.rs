use crate::domain::{Theme, ThemeId};

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
  #[error("storage error: {0}")]
  Storage(String),
  #[error("corrupt record: {0}")]
  Corrupt(String),
}

/// Durable home of themes, keyed by id.
///
/// The in-memory theme is the source of truth; implementations mirror it
/// on every save and know nothing about funnel rules.
pub trait ThemeRepository {
  fn save_theme(&self, theme: &Theme) -> Result<(), RepoError>;
  fn find_theme(&self, id: ThemeId) -> Result<Option<Theme>, RepoError>;
  /// Most recently updated first.
  fn list_themes(&self) -> Result<Vec<Theme>, RepoError>;
  /// Returns whether a theme was deleted.
  fn delete_theme(&self, id: ThemeId) -> Result<bool, RepoError>;
}

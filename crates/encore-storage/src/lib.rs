pub mod config;
pub mod models;
pub mod schema;

use std::cell::RefCell;

use chrono::{DateTime, SecondsFormat, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info};

use encore_core::domain::{Theme, ThemeId};
use encore_core::ports::{RepoError, ThemeRepository};

use crate::config::StorageConfig;
use crate::models::{NewThemeRow, ThemeRow};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub struct SqliteThemeRepository {
  conn: RefCell<SqliteConnection>,
}

impl SqliteThemeRepository {
  /// Opens (or creates) the database and brings its schema up to date.
  pub fn new(database_url: &str) -> Result<Self, RepoError> {
    let mut conn = SqliteConnection::establish(database_url).map_err(|e| RepoError::Storage(e.to_string()))?;
    let applied = conn.run_pending_migrations(MIGRATIONS).map_err(|e| RepoError::Storage(e.to_string()))?;
    if !applied.is_empty() {
      info!(count = applied.len(), "applied database migrations");
    }
    Ok(Self { conn: RefCell::new(conn) })
  }

  pub fn new_from_config(config: &StorageConfig) -> Result<Self, RepoError> {
    if let Some(parent) = config.db_path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| RepoError::Storage(e.to_string()))?;
    }
    let repo = Self::new(&config.database_url())?;
    if let Some(mode) = &config.journal_mode {
      repo.set_journal_mode(mode)?;
    }
    Ok(repo)
  }

  fn set_journal_mode(&self, mode: &str) -> Result<(), RepoError> {
    if !mode.chars().all(|c| c.is_ascii_alphabetic()) {
      return Err(RepoError::Storage(format!("invalid journal mode: {mode}")));
    }
    let mut conn = self.conn.borrow_mut();
    conn.batch_execute(&format!("PRAGMA journal_mode = {mode};")).map_err(|e| RepoError::Storage(e.to_string()))
  }
}

fn timestamp(at: DateTime<Utc>) -> String {
  // Fixed width so that text ordering is chronological.
  at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn theme_to_new_row(theme: &Theme) -> Result<NewThemeRow, RepoError> {
  let payload = serde_json::to_string(theme).map_err(|e| RepoError::Storage(e.to_string()))?;
  Ok(NewThemeRow {
    id: theme.id.to_string(),
    title: theme.title.clone(),
    raw_theme: theme.raw_theme.clone(),
    status: theme.status.as_str().to_string(),
    payload,
    created_at: timestamp(theme.created_at),
    updated_at: timestamp(theme.updated_at),
  })
}

/// Decodes the payload and refuses funnels that break tier capacity or
/// single membership.
fn row_to_theme(row: ThemeRow) -> Result<Theme, RepoError> {
  let theme: Theme =
    serde_json::from_str(&row.payload).map_err(|e| RepoError::Corrupt(format!("theme {}: {e}", row.id)))?;
  theme.check_invariants().map_err(|e| RepoError::Corrupt(format!("theme {}: {e}", row.id)))?;
  Ok(theme)
}

impl ThemeRepository for SqliteThemeRepository {
  fn save_theme(&self, theme: &Theme) -> Result<(), RepoError> {
    use crate::schema::themes::dsl::*;

    let new_row = theme_to_new_row(theme)?;
    let mut conn = self.conn.borrow_mut();

    diesel::insert_into(themes)
      .values(&new_row)
      .on_conflict(id)
      .do_update()
      .set((
        title.eq(&new_row.title),
        raw_theme.eq(&new_row.raw_theme),
        status.eq(&new_row.status),
        payload.eq(&new_row.payload),
        updated_at.eq(&new_row.updated_at),
      ))
      .execute(&mut *conn)
      .map_err(|e| RepoError::Storage(e.to_string()))?;

    debug!(theme = %theme.id, "saved theme");
    Ok(())
  }

  fn find_theme(&self, theme_id: ThemeId) -> Result<Option<Theme>, RepoError> {
    use crate::schema::themes::dsl::*;

    let mut conn = self.conn.borrow_mut();
    let row_opt = themes
      .filter(id.eq(theme_id.to_string()))
      .first::<ThemeRow>(&mut *conn)
      .optional()
      .map_err(|e| RepoError::Storage(e.to_string()))?;

    row_opt.map(row_to_theme).transpose()
  }

  fn list_themes(&self) -> Result<Vec<Theme>, RepoError> {
    use crate::schema::themes::dsl::*;

    let mut conn = self.conn.borrow_mut();
    let rows = themes
      .order(updated_at.desc())
      .load::<ThemeRow>(&mut *conn)
      .map_err(|e| RepoError::Storage(e.to_string()))?;

    rows.into_iter().map(row_to_theme).collect()
  }

  fn delete_theme(&self, theme_id: ThemeId) -> Result<bool, RepoError> {
    use crate::schema::themes::dsl::*;

    let mut conn = self.conn.borrow_mut();
    let deleted = diesel::delete(themes.filter(id.eq(theme_id.to_string())))
      .execute(&mut *conn)
      .map_err(|e| RepoError::Storage(e.to_string()))?;

    Ok(deleted > 0)
  }
}

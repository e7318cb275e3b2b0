use crate::schema::themes;

use diesel::prelude::*;

#[derive(Debug, Queryable)]
#[diesel(table_name = themes)]
pub struct ThemeRow {
  pub id: String,
  pub title: String,
  pub raw_theme: String,
  pub status: String,
  /// The whole theme as JSON. The other columns only serve listing.
  pub payload: String,
  pub created_at: String,
  pub updated_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = themes)]
pub struct NewThemeRow {
  pub id: String,
  pub title: String,
  pub raw_theme: String,
  pub status: String,
  pub payload: String,
  pub created_at: String,
  pub updated_at: String,
}

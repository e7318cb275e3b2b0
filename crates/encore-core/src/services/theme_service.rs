use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;

use crate::domain::{
  HallPass, Phase, PhaseThresholds, Song, SongId, SongRatings, Theme, ThemeId, ThemeStatus, Tier,
};
use crate::errors::{CoreError, FunnelError};
use crate::funnel::{
  BatchOutcome, HallPassEntry, SongSuggestion, SuggestionOutcome, TierAction, accept_suggestions,
  apply_tier_action_values, apply_tier_actions,
};
use crate::ports::{PlaylistSnapshot, PlaylistSync, ThemeRepository};

/// State container for all themes.
///
/// Each mutation loads the theme, applies one funnel operation, saves it
/// only when the operation succeeded and returns the new snapshot.
/// Callers run one operation at a time; there is no locking.
pub struct ThemeService<R>
where
  R: ThemeRepository,
{
  repo: R,
  thresholds: PhaseThresholds,
}

impl<R> ThemeService<R>
where
  R: ThemeRepository,
{
  pub fn new(repo: R, thresholds: PhaseThresholds) -> Self {
    Self { repo, thresholds }
  }

  pub fn thresholds(&self) -> &PhaseThresholds {
    &self.thresholds
  }

  // -------- QUERY (read) --------

  pub fn get_theme(&self, id: ThemeId) -> Result<Theme, CoreError> {
    self
      .repo
      .find_theme(id)
      .map_err(|e| CoreError::Repository(e.to_string()))?
      .ok_or(CoreError::ThemeNotFound(id))
  }

  pub fn list_themes(&self) -> Result<Vec<Theme>, CoreError> {
    self.repo.list_themes().map_err(|e| CoreError::Repository(e.to_string()))
  }

  /// Phase of a theme, or `Idle` when no theme is given.
  pub fn phase(&self, id: Option<ThemeId>) -> Result<Phase, CoreError> {
    let theme = id.map(|id| self.get_theme(id)).transpose()?;
    Ok(Phase::for_theme(theme.as_ref(), &self.thresholds))
  }

  // -------- theme lifecycle --------

  pub fn create_theme(&self, raw_theme: &str, title: Option<String>) -> Result<Theme, CoreError> {
    let mut theme = Theme::new(raw_theme);
    if let Some(title) = title {
      theme.title = title;
    }
    self.save(&theme)?;
    info!(theme = %theme.id, title = %theme.title, "created theme");
    Ok(theme)
  }

  pub fn delete_theme(&self, id: ThemeId) -> Result<(), CoreError> {
    if !self.repo.delete_theme(id).map_err(|e| CoreError::Repository(e.to_string()))? {
      return Err(CoreError::ThemeNotFound(id));
    }
    info!(theme = %id, "deleted theme");
    Ok(())
  }

  pub fn rename_theme(&self, id: ThemeId, title: String) -> Result<Theme, CoreError> {
    self.edit(id, |theme| theme.title = title)
  }

  pub fn set_status(&self, id: ThemeId, status: ThemeStatus) -> Result<Theme, CoreError> {
    self.edit(id, |theme| theme.status = status)
  }

  pub fn set_deadline(&self, id: ThemeId, deadline: Option<DateTime<Utc>>) -> Result<Theme, CoreError> {
    self.edit(id, |theme| theme.deadline = deadline)
  }

  pub fn set_interpretation(
    &self,
    id: ThemeId,
    interpretation: Option<String>,
    strategy: Option<String>,
  ) -> Result<Theme, CoreError> {
    self.edit(id, |theme| {
      theme.interpretation = interpretation;
      theme.strategy = strategy;
    })
  }

  // -------- funnel mutations --------

  pub fn promote_song(&self, id: ThemeId, song: SongId, target: Tier, reason: &str) -> Result<Theme, CoreError> {
    self.update(id, |theme| theme.promote_song(song, target, reason)).map(|(theme, _)| theme)
  }

  pub fn demote_song(&self, id: ThemeId, song: SongId, target: Tier, reason: &str) -> Result<Theme, CoreError> {
    self.update(id, |theme| theme.demote_song(song, target, reason)).map(|(theme, _)| theme)
  }

  pub fn remove_song_from_tier(&self, id: ThemeId, song: SongId, tier: Tier) -> Result<Theme, CoreError> {
    self.update(id, |theme| theme.remove_song_from_tier(song, tier)).map(|(theme, _)| theme)
  }

  pub fn reject_candidate(&self, id: ThemeId, song: SongId, note: Option<String>) -> Result<Theme, CoreError> {
    self.update(id, |theme| theme.reject_candidate(song, note)).map(|(theme, _)| theme)
  }

  pub fn toggle_muted(&self, id: ThemeId, song: SongId) -> Result<(Theme, bool), CoreError> {
    self.update(id, |theme| theme.toggle_muted(song))
  }

  pub fn set_eliminated(&self, id: ThemeId, song: SongId, eliminated: bool) -> Result<Theme, CoreError> {
    self.update(id, |theme| theme.set_eliminated(song, eliminated)).map(|(theme, _)| theme)
  }

  pub fn rate_song(&self, id: ThemeId, song: SongId, ratings: Option<SongRatings>) -> Result<Theme, CoreError> {
    self.update(id, |theme| theme.rate_song(song, ratings)).map(|(theme, _)| theme)
  }

  pub fn reorder_songs_in_tier(&self, id: ThemeId, tier: Tier, ordered: &[SongId]) -> Result<Theme, CoreError> {
    self.update(id, |theme| theme.reorder_songs_in_tier(tier, ordered)).map(|(theme, _)| theme)
  }

  pub fn add_song_from_collection(&self, id: ThemeId, song: Song) -> Result<(Theme, SongId), CoreError> {
    self.update(id, |theme| theme.add_song_from_collection(song))
  }

  pub fn use_hall_pass(
    &self,
    id: ThemeId,
    pass: HallPass,
    entry: HallPassEntry,
    reason: &str,
  ) -> Result<(Theme, SongId), CoreError> {
    self.update(id, |theme| theme.use_hall_pass(pass, entry, reason))
  }

  /// Applies an assistant batch. Individual refusals are reported in the
  /// outcome, not as an error.
  pub fn apply_tier_actions(
    &self,
    id: ThemeId,
    actions: Vec<TierAction>,
  ) -> Result<(Theme, BatchOutcome), CoreError> {
    self.apply_batch(id, |theme| apply_tier_actions(theme, actions))
  }

  /// Applies an assistant batch still in JSON form. Elements that do not
  /// decode are skipped as malformed.
  pub fn apply_tier_action_values(
    &self,
    id: ThemeId,
    values: Vec<Value>,
  ) -> Result<(Theme, BatchOutcome), CoreError> {
    self.apply_batch(id, |theme| apply_tier_action_values(theme, values))
  }

  pub fn accept_suggestions(
    &self,
    id: ThemeId,
    suggestions: Vec<SongSuggestion>,
  ) -> Result<(Theme, SuggestionOutcome), CoreError> {
    self.update(id, |theme| Ok(accept_suggestions(theme, suggestions)))
  }

  // -------- playlist mirror --------

  /// Mirrors the shortlist through `sync` and stores the returned link.
  pub async fn sync_playlist<S>(&self, id: ThemeId, sync: &S) -> Result<Theme, CoreError>
  where
    S: PlaylistSync,
  {
    let mut theme = self.get_theme(id)?;
    let snapshot = PlaylistSnapshot::from_theme(&theme);

    let link = sync
      .sync_playlist(theme.spotify_playlist.as_ref(), &snapshot)
      .await
      .map_err(|e| CoreError::Sync(e.to_string()))?;

    info!(theme = %id, playlist = %link.playlist_id, tracks = snapshot.tracks.len(), "synced playlist");
    theme.spotify_playlist = Some(link);
    self.save(&theme)?;
    Ok(theme)
  }

  // -------- plumbing --------

  fn apply_batch(
    &self,
    id: ThemeId,
    op: impl FnOnce(&mut Theme) -> BatchOutcome,
  ) -> Result<(Theme, BatchOutcome), CoreError> {
    let (theme, outcome) = self.update(id, |theme| Ok(op(theme)))?;
    info!(
      theme = %id,
      applied = outcome.applied.len(),
      skipped = outcome.skipped.len(),
      "applied tier actions"
    );
    Ok((theme, outcome))
  }

  fn save(&self, theme: &Theme) -> Result<(), CoreError> {
    self.repo.save_theme(theme).map_err(|e| CoreError::Repository(e.to_string()))
  }

  fn update<T>(
    &self,
    id: ThemeId,
    op: impl FnOnce(&mut Theme) -> Result<T, FunnelError>,
  ) -> Result<(Theme, T), CoreError> {
    let mut theme = self.get_theme(id)?;
    let value = op(&mut theme)?;
    self.save(&theme)?;
    Ok((theme, value))
  }

  fn edit(&self, id: ThemeId, op: impl FnOnce(&mut Theme)) -> Result<Theme, CoreError> {
    self
      .update(id, |theme| {
        op(theme);
        theme.updated_at = Utc::now();
        Ok(())
      })
      .map(|(theme, _)| theme)
  }
}

use async_trait::async_trait;

use crate::domain::{PlaylistLink, SongId, Theme, ThemeId, Tier};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
  #[error("not authorized: {0}")]
  Unauthorized(String),

  #[error("remote error: {0}")]
  Remote(String),

  #[error("internal error: {0}")]
  Internal(String),
}

/// One entry of the mirrored playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistTrack {
  pub song_id: SongId,
  pub tier: Tier,
  pub title: String,
  pub artist: String,
  pub spotify_uri: Option<String>,
}

/// What the streaming playlist should contain: the pick, then finalists
/// and semifinalists in rank order. Muted and eliminated songs are left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistSnapshot {
  pub theme_id: ThemeId,
  pub name: String,
  pub tracks: Vec<PlaylistTrack>,
}

impl PlaylistSnapshot {
  pub fn from_theme(theme: &Theme) -> Self {
    let tracks = [Tier::Pick, Tier::Finalists, Tier::Semifinalists]
      .into_iter()
      .flat_map(|tier| theme.ranked_songs(tier).into_iter().map(move |song| (tier, song)))
      .filter(|(_, song)| !song.is_muted && !song.is_eliminated)
      .map(|(tier, song)| PlaylistTrack {
        song_id: song.id,
        tier,
        title: song.title.clone(),
        artist: song.artist.clone(),
        spotify_uri: song.links.spotify_uri.clone(),
      })
      .collect();

    PlaylistSnapshot { theme_id: theme.id, name: theme.title.clone(), tracks }
  }
}

/// Port to the streaming-service playlist mirror.
///
/// The adapter owns authentication, retries and rate limits. It receives
/// the previous link (if any) and returns the link to store on the theme.
#[async_trait]
pub trait PlaylistSync: Send + Sync {
  async fn sync_playlist(
    &self,
    existing: Option<&PlaylistLink>,
    snapshot: &PlaylistSnapshot,
  ) -> Result<PlaylistLink, SyncError>;
}

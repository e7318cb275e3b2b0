use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, str::FromStr};
use thiserror::Error;

use crate::domain::hall_pass::HallPasses;
use crate::domain::ids::{SongId, ThemeId};
use crate::domain::phase::{Phase, PhaseThresholds, TierCounts};
use crate::domain::song::{Song, same_text};
use crate::domain::tier::Tier;

/// One Music League round and its four-tier funnel.
///
/// The tier containers are the only record of where a song sits. They are
/// private so that every change goes through the funnel engine, which
/// checks capacity and single-membership before touching anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
  pub id: ThemeId,
  /// The prompt exactly as the league published it.
  pub raw_theme: String,
  /// User-editable display title.
  pub title: String,
  pub interpretation: Option<String>,
  pub strategy: Option<String>,

  pick: Option<Song>,
  finalists: Vec<Song>,
  semifinalists: Vec<Song>,
  candidates: Vec<Song>,

  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub status: ThemeStatus,
  /// Submission deadline, display only.
  pub deadline: Option<DateTime<Utc>>,
  /// Written by the playlist sync collaborator, never by the funnel.
  pub spotify_playlist: Option<PlaylistLink>,

  #[serde(default)]
  hall_passes: HallPasses,
  #[serde(default)]
  rejections: Vec<Rejection>,
}

/// User-controlled lifecycle, unrelated to [`Phase`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeStatus {
  #[default]
  Active,
  Submitted,
  Archived,
}

impl ThemeStatus {
  pub const fn as_str(self) -> &'static str {
    match self {
      ThemeStatus::Active => "active",
      ThemeStatus::Submitted => "submitted",
      ThemeStatus::Archived => "archived",
    }
  }
}

impl fmt::Display for ThemeStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ThemeStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "active" => Ok(ThemeStatus::Active),
      "submitted" => Ok(ThemeStatus::Submitted),
      "archived" => Ok(ThemeStatus::Archived),
      other => Err(format!("invalid theme status: {other}")),
    }
  }
}

/// Where the theme's shortlist was last mirrored on the streaming service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistLink {
  pub playlist_id: String,
  pub url: Option<String>,
  pub last_synced_at: DateTime<Utc>,
}

/// A song the user swiped away. Suggestions matching it are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
  pub title: String,
  pub artist: String,
  pub note: Option<String>,
  pub rejected_at: DateTime<Utc>,
}

/// A song together with the tier holding it, computed at read time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TieredSong<'a> {
  pub tier: Tier,
  pub song: &'a Song,
}

/// A broken funnel invariant. The engine never produces one; this exists
/// to validate themes loaded from outside.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
  #[error("{tier} holds {len} songs, capacity is {capacity}")]
  OverCapacity { tier: Tier, len: usize, capacity: usize },
  #[error("song {song} is in both {first} and {second}")]
  DuplicateSong { song: SongId, first: Tier, second: Tier },
}

impl Theme {
  pub fn new(raw_theme: impl Into<String>) -> Self {
    let raw_theme = raw_theme.into();
    let now = Utc::now();

    Theme {
      id: ThemeId::new(),
      title: raw_theme.trim().to_string(),
      raw_theme,
      interpretation: None,
      strategy: None,
      pick: None,
      finalists: Vec::new(),
      semifinalists: Vec::new(),
      candidates: Vec::new(),
      created_at: now,
      updated_at: now,
      status: ThemeStatus::Active,
      deadline: None,
      spotify_playlist: None,
      hall_passes: HallPasses::default(),
      rejections: Vec::new(),
    }
  }

  // -------- QUERY (read) --------

  /// Songs of `tier` in container order.
  pub fn songs_in(&self, tier: Tier) -> &[Song] {
    match tier {
      Tier::Pick => self.pick.as_slice(),
      Tier::Finalists => &self.finalists,
      Tier::Semifinalists => &self.semifinalists,
      Tier::Candidates => &self.candidates,
    }
  }

  /// Songs of `tier` sorted by rank; unranked songs follow in container order.
  pub fn ranked_songs(&self, tier: Tier) -> Vec<&Song> {
    let mut songs: Vec<&Song> = self.songs_in(tier).iter().collect();
    // stable sort keeps container order among equal keys
    songs.sort_by_key(|s| (s.rank.is_none(), s.rank.unwrap_or(0)));
    songs
  }

  pub fn pick(&self) -> Option<&Song> {
    self.pick.as_ref()
  }

  pub fn counts(&self) -> TierCounts {
    TierCounts {
      candidates: self.candidates.len(),
      semifinalists: self.semifinalists.len(),
      finalists: self.finalists.len(),
      pick: usize::from(self.pick.is_some()),
    }
  }

  pub fn song_count(&self) -> usize {
    self.counts().total()
  }

  pub fn phase(&self, thresholds: &PhaseThresholds) -> Phase {
    Phase::infer(self.counts(), thresholds)
  }

  pub fn hall_passes(&self) -> HallPasses {
    self.hall_passes
  }

  pub fn rejections(&self) -> &[Rejection] {
    &self.rejections
  }

  /// Every song, highest tier first.
  pub fn all_songs(&self) -> impl Iterator<Item = TieredSong<'_>> {
    Tier::ALL
      .into_iter()
      .rev()
      .flat_map(move |tier| self.songs_in(tier).iter().map(move |song| TieredSong { tier, song }))
  }

  /// The tier currently holding `id`.
  pub fn tier_of(&self, id: SongId) -> Option<Tier> {
    self.find_song(id).map(|found| found.tier)
  }

  pub fn find_song(&self, id: SongId) -> Option<TieredSong<'_>> {
    self.all_songs().find(|found| found.song.id == id)
  }

  /// Title+artist lookup across all tiers, case-insensitive and exact.
  pub fn find_by_title_artist(&self, title: &str, artist: &str) -> Option<TieredSong<'_>> {
    self.all_songs().find(|found| found.song.matches(title, artist))
  }

  pub fn is_rejected(&self, title: &str, artist: &str) -> bool {
    self.rejections.iter().any(|r| same_text(&r.title, title) && same_text(&r.artist, artist))
  }

  /// Verifies capacity limits and single membership.
  pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
    let mut seen: HashMap<SongId, Tier> = HashMap::new();

    for tier in Tier::ALL {
      let songs = self.songs_in(tier);
      if songs.len() > tier.capacity() {
        return Err(InvariantViolation::OverCapacity { tier, len: songs.len(), capacity: tier.capacity() });
      }
      for song in songs {
        if let Some(first) = seen.insert(song.id, tier) {
          return Err(InvariantViolation::DuplicateSong { song: song.id, first, second: tier });
        }
      }
    }

    Ok(())
  }

  // -------- container plumbing for the funnel engine --------

  pub(crate) fn has_room(&self, tier: Tier) -> bool {
    self.songs_in(tier).len() < tier.capacity()
  }

  pub(crate) fn contains(&self, tier: Tier, id: SongId) -> bool {
    self.songs_in(tier).iter().any(|s| s.id == id)
  }

  /// Removes `id` from `tier`, clearing its rank.
  pub(crate) fn take(&mut self, tier: Tier, id: SongId) -> Option<Song> {
    let mut song = if tier == Tier::Pick {
      if !self.pick.as_ref().is_some_and(|s| s.id == id) {
        return None;
      }
      self.pick.take()?
    } else {
      let songs = self.vec_mut(tier)?;
      let pos = songs.iter().position(|s| s.id == id)?;
      songs.remove(pos)
    };
    song.rank = None;
    Some(song)
  }

  /// Appends to `tier`. Callers check capacity and membership first.
  pub(crate) fn put(&mut self, tier: Tier, song: Song) {
    match self.vec_mut(tier) {
      Some(songs) => songs.push(song),
      None => self.pick = Some(song),
    }
  }

  pub(crate) fn song_mut(&mut self, id: SongId) -> Option<&mut Song> {
    self
      .pick
      .iter_mut()
      .chain(self.finalists.iter_mut())
      .chain(self.semifinalists.iter_mut())
      .chain(self.candidates.iter_mut())
      .find(|s| s.id == id)
  }

  /// The list container of `tier`; `None` for the single pick slot.
  pub(crate) fn vec_mut(&mut self, tier: Tier) -> Option<&mut Vec<Song>> {
    match tier {
      Tier::Finalists => Some(&mut self.finalists),
      Tier::Semifinalists => Some(&mut self.semifinalists),
      Tier::Candidates => Some(&mut self.candidates),
      Tier::Pick => None,
    }
  }

  pub(crate) fn hall_passes_mut(&mut self) -> &mut HallPasses {
    &mut self.hall_passes
  }

  pub(crate) fn push_rejection(&mut self, rejection: Rejection) {
    self.rejections.push(rejection);
  }

  pub(crate) fn touch(&mut self) {
    self.updated_at = Utc::now();
  }
}

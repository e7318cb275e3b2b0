use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::ids::SongId;
use crate::domain::tier::Tier;

/// A song under consideration for a theme.
///
/// The song does not know which tier it sits in: that is decided by the
/// theme container holding it (see [`crate::domain::theme::Theme::tier_of`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
  pub id: SongId,

  pub title: String,
  pub artist: String,
  pub album: Option<String>,
  pub year: Option<u16>,
  pub genre: Option<String>,

  /// Why the song fits the theme.
  #[serde(default)]
  pub reason: String,
  /// Probing follow-up question for the user.
  pub question: Option<String>,

  #[serde(default)]
  pub links: StreamingLinks,

  /// Muted songs keep their slot but are left out of playlist exports.
  #[serde(default)]
  pub is_muted: bool,
  /// Soft-deleted. Distinct from `is_muted`.
  #[serde(default)]
  pub is_eliminated: bool,
  /// 1-based position inside a ranked tier. `None` sorts after ranked songs.
  pub rank: Option<u32>,
  /// Append-only.
  #[serde(default)]
  pub promotion_history: Vec<PromotionRecord>,
  pub ratings: Option<SongRatings>,
}

impl Song {
  pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
    Song {
      id: SongId::new(),
      title: title.into(),
      artist: artist.into(),
      album: None,
      year: None,
      genre: None,
      reason: String::new(),
      question: None,
      links: StreamingLinks::default(),
      is_muted: false,
      is_eliminated: false,
      rank: None,
      promotion_history: Vec::new(),
      ratings: None,
    }
  }

  pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
    self.reason = reason.into();
    self
  }

  /// Case-insensitive exact match on title and artist, ignoring
  /// surrounding whitespace.
  pub fn matches(&self, title: &str, artist: &str) -> bool {
    same_text(&self.title, title) && same_text(&self.artist, artist)
  }

  pub(crate) fn record_move(&mut self, from_tier: Tier, to_tier: Tier, reason: String, at: DateTime<Utc>) {
    self.promotion_history.push(PromotionRecord { from_tier, to_tier, reason, timestamp: at });
  }
}

pub(crate) fn same_text(a: &str, b: &str) -> bool {
  a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// External references. The funnel never looks inside them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingLinks {
  pub spotify_uri: Option<String>,
  pub youtube_url: Option<String>,
  pub songlink_url: Option<String>,
}

/// One entry of a song's tier history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionRecord {
  pub from_tier: Tier,
  pub to_tier: Tier,
  pub reason: String,
  pub timestamp: DateTime<Utc>,
}

/// Two independent 1–5 scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongRatings {
  /// How well the song fits the theme.
  pub theme_fit: Score,
  /// General quality, regardless of the theme.
  pub quality: Score,
}

/// An integer score from 1 to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Score(u8);

impl Score {
  pub const MIN: u8 = 1;
  pub const MAX: u8 = 5;

  /// Returns `None` outside `1..=5`.
  pub fn new(value: u8) -> Option<Self> {
    (Self::MIN..=Self::MAX).contains(&value).then_some(Score(value))
  }

  pub fn get(self) -> u8 {
    self.0
  }
}

impl TryFrom<u8> for Score {
  type Error = String;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Score::new(value).ok_or_else(|| format!("score out of range 1..=5: {value}"))
  }
}

impl From<Score> for u8 {
  fn from(score: Score) -> Self {
    score.0
  }
}

impl fmt::Display for Score {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for _ in 0..self.0 {
      write!(f, "★")?;
    }
    for _ in self.0..Self::MAX {
      write!(f, "☆")?;
    }
    Ok(())
  }
}

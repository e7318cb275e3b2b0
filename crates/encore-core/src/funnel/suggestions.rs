use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::domain::ids::SongId;
use crate::domain::song::{Song, StreamingLinks};
use crate::domain::theme::Theme;
use crate::domain::tier::Tier;
use crate::errors::FunnelError;

/// A new candidate proposed by the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongSuggestion {
  pub title: String,
  pub artist: String,
  #[serde(default)]
  pub album: Option<String>,
  #[serde(default)]
  pub year: Option<u16>,
  #[serde(default)]
  pub genre: Option<String>,
  #[serde(default)]
  pub reason: String,
  #[serde(default)]
  pub question: Option<String>,
}

impl From<SongSuggestion> for Song {
  fn from(s: SongSuggestion) -> Self {
    Song {
      album: s.album,
      year: s.year,
      genre: s.genre,
      question: s.question,
      links: StreamingLinks::default(),
      ..Song::new(s.title, s.artist).with_reason(s.reason)
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionSkip {
  AlreadyInFunnel(Tier),
  PreviouslyRejected,
  Rejected(FunnelError),
}

impl fmt::Display for SuggestionSkip {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SuggestionSkip::AlreadyInFunnel(tier) => write!(f, "already in {tier}"),
      SuggestionSkip::PreviouslyRejected => write!(f, "previously rejected"),
      SuggestionSkip::Rejected(err) => write!(f, "{err}"),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionOutcome {
  pub added: Vec<SongId>,
  pub skipped: Vec<(SongSuggestion, SuggestionSkip)>,
}

/// Adds suggestions to candidates, dropping duplicates and anything the
/// user already rejected for this theme.
pub fn accept_suggestions<I>(theme: &mut Theme, suggestions: I) -> SuggestionOutcome
where
  I: IntoIterator<Item = SongSuggestion>,
{
  let mut outcome = SuggestionOutcome::default();

  for suggestion in suggestions {
    if let Some(found) = theme.find_by_title_artist(&suggestion.title, &suggestion.artist) {
      let tier = found.tier;
      outcome.skipped.push((suggestion, SuggestionSkip::AlreadyInFunnel(tier)));
      continue;
    }
    if theme.is_rejected(&suggestion.title, &suggestion.artist) {
      debug!(title = %suggestion.title, "dropping rejected suggestion");
      outcome.skipped.push((suggestion, SuggestionSkip::PreviouslyRejected));
      continue;
    }

    match theme.add_song_from_collection(Song::from(suggestion.clone())) {
      Ok(id) => outcome.added.push(id),
      Err(err) => outcome.skipped.push((suggestion, SuggestionSkip::Rejected(err))),
    }
  }

  outcome
}

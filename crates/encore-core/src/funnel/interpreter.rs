//! Applies assistant-proposed tier moves.
//!
//! The assistant never sees song ids, so every action names its song by
//! title and artist. Actions that cannot be resolved or that the engine
//! refuses are skipped one by one; the rest of the batch still runs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

use crate::domain::ids::SongId;
use crate::domain::theme::{Theme, TieredSong};
use crate::domain::tier::Tier;
use crate::errors::FunnelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierActionKind {
  Promote,
  Demote,
  Remove,
}

impl fmt::Display for TierActionKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TierActionKind::Promote => write!(f, "promote"),
      TierActionKind::Demote => write!(f, "demote"),
      TierActionKind::Remove => write!(f, "remove"),
    }
  }
}

/// One move proposed by the assistant, in its own JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierAction {
  pub action: TierActionKind,
  pub song_title: String,
  pub song_artist: String,
  /// Missing means "the adjacent tier in the action's direction".
  #[serde(default)]
  pub to_tier: Option<Tier>,
  #[serde(default)]
  pub reason: Option<String>,
}

/// Why an action was left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
  /// No song in the funnel has that title and artist.
  NoMatch,
  /// The requested tier is not one step away (or there is no step).
  NotAdjacent { from: Tier, to: Option<Tier> },
  /// The engine refused the move.
  Rejected(FunnelError),
  /// The item did not decode as a tier action.
  Malformed(String),
}

impl fmt::Display for SkipReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SkipReason::NoMatch => write!(f, "no matching song in the funnel"),
      SkipReason::NotAdjacent { from, to: Some(to) } => write!(f, "{from} -> {to} is not a single step"),
      SkipReason::NotAdjacent { from, to: None } => write!(f, "no tier to move to from {from}"),
      SkipReason::Rejected(err) => write!(f, "{err}"),
      SkipReason::Malformed(err) => write!(f, "malformed action: {err}"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedAction {
  pub action: TierAction,
  pub song_id: SongId,
  pub from: Tier,
  /// `None` for removals.
  pub to: Option<Tier>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedAction {
  /// Position in the batch, starting at 0.
  pub index: usize,
  /// `None` when the item could not be decoded.
  pub action: Option<TierAction>,
  pub reason: SkipReason,
}

/// What happened to a batch, in input order. Fed back to the user and to
/// the assistant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
  pub applied: Vec<AppliedAction>,
  pub skipped: Vec<SkippedAction>,
}

/// Resolves a title+artist reference against every tier.
///
/// Exact after trimming and lowercasing. Near misses are not matches.
pub fn find_song_by_title_artist<'a>(theme: &'a Theme, title: &str, artist: &str) -> Option<TieredSong<'a>> {
  theme.find_by_title_artist(title, artist)
}

/// Applies `actions` in order, skipping the ones that do not resolve.
pub fn apply_tier_actions<I>(theme: &mut Theme, actions: I) -> BatchOutcome
where
  I: IntoIterator<Item = TierAction>,
{
  apply_batch(theme, actions.into_iter().map(Ok))
}

/// Like [`apply_tier_actions`] for raw assistant JSON. Each element is
/// decoded on its own, so a malformed one is skipped instead of failing
/// the whole batch.
pub fn apply_tier_action_values<I>(theme: &mut Theme, values: I) -> BatchOutcome
where
  I: IntoIterator<Item = Value>,
{
  apply_batch(theme, values.into_iter().map(|v| serde_json::from_value(v).map_err(|e| e.to_string())))
}

fn apply_batch<I>(theme: &mut Theme, entries: I) -> BatchOutcome
where
  I: Iterator<Item = Result<TierAction, String>>,
{
  let mut outcome = BatchOutcome::default();

  for (index, entry) in entries.enumerate() {
    let action = match entry {
      Ok(action) => action,
      Err(err) => {
        warn!(index, error = %err, "malformed tier action");
        outcome.skipped.push(SkippedAction { index, action: None, reason: SkipReason::Malformed(err) });
        continue;
      }
    };

    match apply_one(theme, &action) {
      Ok((song_id, from, to)) => {
        debug!(theme = %theme.id, %song_id, kind = %action.action, "applied tier action");
        outcome.applied.push(AppliedAction { action, song_id, from, to });
      }
      Err(reason) => {
        match &reason {
          SkipReason::NoMatch => {
            debug!(title = %action.song_title, artist = %action.song_artist, "tier action matched no song")
          }
          other => warn!(title = %action.song_title, kind = %action.action, reason = %other, "skipped tier action"),
        }
        outcome.skipped.push(SkippedAction { index, action: Some(action), reason });
      }
    }
  }

  outcome
}

fn apply_one(theme: &mut Theme, action: &TierAction) -> Result<(SongId, Tier, Option<Tier>), SkipReason> {
  let (id, from) = find_song_by_title_artist(theme, &action.song_title, &action.song_artist)
    .map(|found| (found.song.id, found.tier))
    .ok_or(SkipReason::NoMatch)?;
  let reason = action.reason.clone().unwrap_or_default();

  match action.action {
    TierActionKind::Promote => {
      let to = step(from, from.next(), action.to_tier)?;
      theme.promote_song(id, to, reason).map_err(SkipReason::Rejected)?;
      Ok((id, from, Some(to)))
    }
    TierActionKind::Demote => {
      let to = step(from, from.previous(), action.to_tier)?;
      theme.demote_song(id, to, reason).map_err(SkipReason::Rejected)?;
      Ok((id, from, Some(to)))
    }
    TierActionKind::Remove => {
      theme.remove_song_from_tier(id, from).map_err(SkipReason::Rejected)?;
      Ok((id, from, None))
    }
  }
}

/// Picks the destination: the requested tier if it is the adjacent one,
/// the adjacent one if nothing was requested.
fn step(from: Tier, adjacent: Option<Tier>, requested: Option<Tier>) -> Result<Tier, SkipReason> {
  match (adjacent, requested) {
    (Some(adjacent), None) => Ok(adjacent),
    (Some(adjacent), Some(requested)) if adjacent == requested => Ok(adjacent),
    (_, requested) => Err(SkipReason::NotAdjacent { from, to: requested }),
  }
}

//! Single-song tier transitions.
//!
//! Every operation validates all of its preconditions before touching the
//! theme, so a refused call leaves the funnel exactly as it found it. A full
//! tier never evicts anyone: capacity is a precondition, not a policy.

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::domain::hall_pass::HallPass;
use crate::domain::ids::SongId;
use crate::domain::song::{Song, SongRatings};
use crate::domain::theme::{Rejection, Theme};
use crate::domain::tier::Tier;
use crate::errors::FunnelError;

/// What a hall pass lifts into its target tier.
#[derive(Debug, Clone, PartialEq)]
pub enum HallPassEntry {
  /// A song not yet in the funnel.
  NewSong(Song),
  /// A song currently sitting in candidates.
  Candidate(SongId),
}

impl Theme {
  /// Moves a song exactly one tier up.
  ///
  /// A new pick never displaces the current one: the caller demotes the
  /// existing pick first.
  pub fn promote_song(
    &mut self,
    id: SongId,
    target: Tier,
    reason: impl Into<String>,
  ) -> Result<(), FunnelError> {
    let from = self.locate(id)?;
    if from == target {
      return Err(FunnelError::InvalidTransition(format!("song {id} is already in {target}")));
    }
    if from.next() != Some(target) {
      return Err(FunnelError::InvalidTransition(format!(
        "cannot promote from {from} to {target}, only one step up is allowed"
      )));
    }
    self.ensure_room(target)?;

    self.relocate(id, from, target, reason.into())?;
    debug!(theme = %self.id, song = %id, %from, to = %target, "promoted song");
    Ok(())
  }

  /// Moves a song exactly one tier down.
  ///
  /// Applies the same capacity precondition as promotion even though no
  /// lower tier is smaller than the one above it.
  pub fn demote_song(
    &mut self,
    id: SongId,
    target: Tier,
    reason: impl Into<String>,
  ) -> Result<(), FunnelError> {
    let from = self.locate(id)?;
    if from == target {
      return Err(FunnelError::InvalidTransition(format!("song {id} is already in {target}")));
    }
    if from.previous() != Some(target) {
      return Err(FunnelError::InvalidTransition(format!(
        "cannot demote from {from} to {target}, only one step down is allowed"
      )));
    }
    self.ensure_room(target)?;

    self.relocate(id, from, target, reason.into())?;
    debug!(theme = %self.id, song = %id, %from, to = %target, "demoted song");
    Ok(())
  }

  /// Deletes a song from the named tier and hands it back.
  pub fn remove_song_from_tier(&mut self, id: SongId, tier: Tier) -> Result<Song, FunnelError> {
    let song = self.take(tier, id).ok_or_else(|| FunnelError::NotFound(format!("song {id} in {tier}")))?;
    self.touch();
    debug!(theme = %self.id, song = %id, %tier, "removed song");
    Ok(song)
  }

  /// Swipe-reject: removes a candidate and remembers it so it is not
  /// suggested again.
  pub fn reject_candidate(&mut self, id: SongId, note: Option<String>) -> Result<Song, FunnelError> {
    let song = self.remove_song_from_tier(id, Tier::Candidates)?;
    self.push_rejection(Rejection {
      title: song.title.clone(),
      artist: song.artist.clone(),
      note,
      rejected_at: Utc::now(),
    });
    Ok(song)
  }

  /// Flips the muted flag and returns the new value. The song keeps its slot.
  pub fn toggle_muted(&mut self, id: SongId) -> Result<bool, FunnelError> {
    let song = self.song_mut(id).ok_or_else(|| FunnelError::NotFound(format!("song {id}")))?;
    song.is_muted = !song.is_muted;
    let muted = song.is_muted;
    self.touch();
    Ok(muted)
  }

  pub fn set_eliminated(&mut self, id: SongId, eliminated: bool) -> Result<(), FunnelError> {
    let song = self.song_mut(id).ok_or_else(|| FunnelError::NotFound(format!("song {id}")))?;
    song.is_eliminated = eliminated;
    self.touch();
    Ok(())
  }

  /// Sets or clears both scores of a song.
  pub fn rate_song(&mut self, id: SongId, ratings: Option<SongRatings>) -> Result<(), FunnelError> {
    let song = self.song_mut(id).ok_or_else(|| FunnelError::NotFound(format!("song {id}")))?;
    song.ratings = ratings;
    self.touch();
    Ok(())
  }

  /// Rewrites the ranks of a ranked tier as `1..=N` in the given order.
  ///
  /// `ordered` must be exactly the tier's current membership. A subset,
  /// a repeated id or an id from elsewhere is refused as a whole.
  pub fn reorder_songs_in_tier(&mut self, tier: Tier, ordered: &[SongId]) -> Result<(), FunnelError> {
    if !tier.is_ranked() {
      return Err(FunnelError::InvalidOrder(format!("{tier} is not a ranked tier")));
    }

    let mut listed = HashSet::with_capacity(ordered.len());
    for id in ordered {
      if !self.contains(tier, *id) {
        return Err(FunnelError::NotFound(format!("song {id} in {tier}")));
      }
      if !listed.insert(*id) {
        return Err(FunnelError::InvalidOrder(format!("song {id} listed twice")));
      }
    }
    let members = self.songs_in(tier).len();
    if ordered.len() != members {
      return Err(FunnelError::InvalidOrder(format!(
        "{tier} holds {members} songs but {} were ordered",
        ordered.len()
      )));
    }

    let positions: HashMap<SongId, usize> = ordered.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    if let Some(songs) = self.vec_mut(tier) {
      songs.sort_by_key(|s| positions.get(&s.id).copied().unwrap_or(usize::MAX));
      for (pos, song) in songs.iter_mut().enumerate() {
        song.rank = Some(pos as u32 + 1);
      }
    }
    self.touch();
    debug!(theme = %self.id, %tier, "reordered tier");
    Ok(())
  }

  /// Adds an externally sourced song to candidates.
  pub fn add_song_from_collection(&mut self, mut song: Song) -> Result<SongId, FunnelError> {
    self.ensure_new(&song)?;
    self.ensure_room(Tier::Candidates)?;

    let id = song.id;
    song.rank = None;
    self.put(Tier::Candidates, song);
    self.touch();
    debug!(theme = %self.id, song = %id, "added candidate");
    Ok(id)
  }

  /// Spends a hall pass to drop a song straight into the pass's target
  /// tier. Each pass works once per theme.
  pub fn use_hall_pass(
    &mut self,
    pass: HallPass,
    entry: HallPassEntry,
    reason: impl Into<String>,
  ) -> Result<SongId, FunnelError> {
    if !self.hall_passes().is_available(pass) {
      return Err(FunnelError::HallPassExhausted(pass));
    }
    let target = pass.target_tier();

    match &entry {
      HallPassEntry::NewSong(song) => self.ensure_new(song)?,
      HallPassEntry::Candidate(id) => match self.tier_of(*id) {
        Some(Tier::Candidates) => {}
        Some(tier) => {
          return Err(FunnelError::InvalidTransition(format!(
            "hall passes only lift candidates, song {id} is in {tier}"
          )));
        }
        None => return Err(FunnelError::NotFound(format!("song {id} in candidates"))),
      },
    }
    self.ensure_room(target)?;

    let mut song = match entry {
      HallPassEntry::NewSong(song) => song,
      HallPassEntry::Candidate(id) => self
        .take(Tier::Candidates, id)
        .ok_or_else(|| FunnelError::NotFound(format!("song {id} in candidates")))?,
    };
    let id = song.id;
    song.rank = None;
    let reason = reason.into();
    let note = if reason.trim().is_empty() { pass.to_string() } else { format!("{pass}: {reason}") };
    song.record_move(Tier::Candidates, target, note, Utc::now());
    self.put(target, song);
    self.hall_passes_mut().consume(pass);
    self.touch();
    debug!(theme = %self.id, song = %id, %pass, "used hall pass");
    Ok(id)
  }

  // -------- preconditions --------

  fn locate(&self, id: SongId) -> Result<Tier, FunnelError> {
    self.tier_of(id).ok_or_else(|| FunnelError::NotFound(format!("song {id}")))
  }

  fn ensure_room(&self, target: Tier) -> Result<(), FunnelError> {
    if target == Tier::Pick {
      if let Some(current) = self.pick() {
        return Err(FunnelError::InvalidTransition(format!(
          "pick is already \"{}\" by {}, demote it first",
          current.title, current.artist
        )));
      }
    }
    if !self.has_room(target) {
      return Err(FunnelError::CapacityExceeded { tier: target, capacity: target.capacity() });
    }
    Ok(())
  }

  fn ensure_new(&self, song: &Song) -> Result<(), FunnelError> {
    if let Some(tier) = self.tier_of(song.id) {
      return Err(FunnelError::InvalidTransition(format!("song {} is already in {tier}", song.id)));
    }
    if let Some(found) = self.find_by_title_artist(&song.title, &song.artist) {
      return Err(FunnelError::InvalidTransition(format!(
        "\"{}\" by {} is already in {}",
        found.song.title, found.song.artist, found.tier
      )));
    }
    Ok(())
  }

  /// Removes from `from`, logs the move and appends to `to`.
  fn relocate(&mut self, id: SongId, from: Tier, to: Tier, reason: String) -> Result<(), FunnelError> {
    let mut song = self.take(from, id).ok_or_else(|| FunnelError::NotFound(format!("song {id} in {from}")))?;
    song.record_move(from, to, reason, Utc::now());
    self.put(to, song);
    self.touch();
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn theme_with(tier: Tier, n: usize) -> (Theme, Vec<SongId>) {
    let mut theme = Theme::new("test");
    let ids = (0..n)
      .map(|i| {
        let song = Song::new(format!("Song {i}"), "Artist");
        let id = song.id;
        theme.put(tier, song);
        id
      })
      .collect();
    (theme, ids)
  }

  #[test]
  fn promote_moves_and_records_history() {
    let (mut theme, ids) = theme_with(Tier::Candidates, 1);
    let before = theme.updated_at;

    theme.promote_song(ids[0], Tier::Semifinalists, "strong opener").unwrap();

    assert_eq!(theme.tier_of(ids[0]), Some(Tier::Semifinalists));
    assert!(theme.songs_in(Tier::Candidates).is_empty());
    let song = &theme.songs_in(Tier::Semifinalists)[0];
    assert_eq!(song.promotion_history.len(), 1);
    assert_eq!(song.promotion_history[0].from_tier, Tier::Candidates);
    assert_eq!(song.promotion_history[0].to_tier, Tier::Semifinalists);
    assert_eq!(song.promotion_history[0].reason, "strong opener");
    assert!(theme.updated_at >= before);
  }

  #[test]
  fn promote_refuses_skips_and_same_tier() {
    let (mut theme, ids) = theme_with(Tier::Candidates, 1);
    let snapshot = theme.clone();

    let skip = theme.promote_song(ids[0], Tier::Finalists, "");
    assert!(matches!(skip, Err(FunnelError::InvalidTransition(_))));
    let same = theme.promote_song(ids[0], Tier::Candidates, "");
    assert!(matches!(same, Err(FunnelError::InvalidTransition(_))));
    assert_eq!(theme, snapshot);
  }

  #[test]
  fn promote_into_full_tier_is_blocked() {
    let (mut theme, _) = theme_with(Tier::Semifinalists, 8);
    let extra = Song::new("Extra", "Artist");
    let extra_id = extra.id;
    theme.put(Tier::Candidates, extra);
    let snapshot = theme.clone();

    let result = theme.promote_song(extra_id, Tier::Semifinalists, "");
    assert_eq!(result, Err(FunnelError::CapacityExceeded { tier: Tier::Semifinalists, capacity: 8 }));
    assert_eq!(theme, snapshot);
  }

  #[test]
  fn pick_is_never_displaced() {
    let (mut theme, ids) = theme_with(Tier::Finalists, 2);
    theme.promote_song(ids[0], Tier::Pick, "").unwrap();

    let result = theme.promote_song(ids[1], Tier::Pick, "");
    assert!(matches!(result, Err(FunnelError::InvalidTransition(_))));
    assert_eq!(theme.pick().map(|s| s.id), Some(ids[0]));

    theme.demote_song(ids[0], Tier::Finalists, "changed my mind").unwrap();
    theme.promote_song(ids[1], Tier::Pick, "").unwrap();
    assert_eq!(theme.pick().map(|s| s.id), Some(ids[1]));
    assert!(theme.check_invariants().is_ok());
  }

  #[test]
  fn demote_only_one_step() {
    let (mut theme, ids) = theme_with(Tier::Finalists, 1);
    let result = theme.demote_song(ids[0], Tier::Candidates, "");
    assert!(matches!(result, Err(FunnelError::InvalidTransition(_))));

    theme.demote_song(ids[0], Tier::Semifinalists, "").unwrap();
    assert_eq!(theme.tier_of(ids[0]), Some(Tier::Semifinalists));
  }

  #[test]
  fn demote_clears_rank() {
    let (mut theme, ids) = theme_with(Tier::Finalists, 2);
    theme.reorder_songs_in_tier(Tier::Finalists, &[ids[1], ids[0]]).unwrap();
    theme.demote_song(ids[0], Tier::Semifinalists, "").unwrap();
    assert_eq!(theme.songs_in(Tier::Semifinalists)[0].rank, None);
  }

  #[test]
  fn unknown_song_is_not_found() {
    let (mut theme, _) = theme_with(Tier::Candidates, 1);
    let ghost = SongId::new();
    assert!(matches!(theme.promote_song(ghost, Tier::Semifinalists, ""), Err(FunnelError::NotFound(_))));
    assert!(matches!(theme.toggle_muted(ghost), Err(FunnelError::NotFound(_))));
    assert!(matches!(theme.remove_song_from_tier(ghost, Tier::Candidates), Err(FunnelError::NotFound(_))));
  }

  #[test]
  fn remove_requires_the_named_tier() {
    let (mut theme, ids) = theme_with(Tier::Candidates, 1);
    let wrong = theme.remove_song_from_tier(ids[0], Tier::Finalists);
    assert!(matches!(wrong, Err(FunnelError::NotFound(_))));

    let removed = theme.remove_song_from_tier(ids[0], Tier::Candidates).unwrap();
    assert_eq!(removed.id, ids[0]);
    assert_eq!(theme.song_count(), 0);
  }

  #[test]
  fn reject_remembers_the_song() {
    let (mut theme, ids) = theme_with(Tier::Candidates, 1);
    theme.reject_candidate(ids[0], Some("too obvious".into())).unwrap();

    assert_eq!(theme.song_count(), 0);
    assert!(theme.is_rejected("song 0", "ARTIST"));
    assert_eq!(theme.rejections()[0].note.as_deref(), Some("too obvious"));
  }

  #[test]
  fn muted_song_keeps_its_slot() {
    let (mut theme, ids) = theme_with(Tier::Semifinalists, 8);
    assert!(theme.toggle_muted(ids[3]).unwrap());
    assert_eq!(theme.songs_in(Tier::Semifinalists).len(), 8);
    assert_eq!(theme.tier_of(ids[3]), Some(Tier::Semifinalists));
    assert!(!theme.toggle_muted(ids[3]).unwrap());
  }

  #[test]
  fn eliminated_song_keeps_its_slot() {
    let (mut theme, ids) = theme_with(Tier::Finalists, 4);

    theme.set_eliminated(ids[1], true).unwrap();
    assert!(theme.songs_in(Tier::Finalists)[1].is_eliminated);
    assert_eq!(theme.tier_of(ids[1]), Some(Tier::Finalists));
    assert_eq!(theme.songs_in(Tier::Finalists).len(), 4);

    theme.set_eliminated(ids[1], false).unwrap();
    assert!(!theme.songs_in(Tier::Finalists)[1].is_eliminated);
    assert!(matches!(theme.set_eliminated(SongId::new(), true), Err(FunnelError::NotFound(_))));
  }

  #[test]
  fn ratings_can_be_set_and_cleared() {
    use crate::domain::song::Score;

    let (mut theme, ids) = theme_with(Tier::Candidates, 2);
    let ratings = SongRatings { theme_fit: Score::new(5).unwrap(), quality: Score::new(2).unwrap() };

    theme.rate_song(ids[0], Some(ratings)).unwrap();
    assert_eq!(theme.songs_in(Tier::Candidates)[0].ratings, Some(ratings));
    assert_eq!(theme.tier_of(ids[0]), Some(Tier::Candidates));
    assert_eq!(theme.songs_in(Tier::Candidates)[1].ratings, None);

    theme.rate_song(ids[0], None).unwrap();
    assert_eq!(theme.songs_in(Tier::Candidates)[0].ratings, None);
    assert!(matches!(theme.rate_song(SongId::new(), Some(ratings)), Err(FunnelError::NotFound(_))));
  }

  #[test]
  fn reorder_round_trips() {
    let (mut theme, ids) = theme_with(Tier::Semifinalists, 4);
    let order = vec![ids[2], ids[0], ids[3], ids[1]];

    theme.reorder_songs_in_tier(Tier::Semifinalists, &order).unwrap();

    let read_back: Vec<SongId> = theme.ranked_songs(Tier::Semifinalists).iter().map(|s| s.id).collect();
    assert_eq!(read_back, order);
    let ranks: Vec<Option<u32>> = theme.songs_in(Tier::Semifinalists).iter().map(|s| s.rank).collect();
    assert_eq!(ranks, vec![Some(1), Some(2), Some(3), Some(4)]);
  }

  #[test]
  fn reorder_rejects_partial_or_foreign_lists() {
    let (mut theme, ids) = theme_with(Tier::Finalists, 3);
    let snapshot = theme.clone();

    let subset = theme.reorder_songs_in_tier(Tier::Finalists, &[ids[1], ids[0]]);
    assert!(matches!(subset, Err(FunnelError::InvalidOrder(_))));
    let repeated = theme.reorder_songs_in_tier(Tier::Finalists, &[ids[0], ids[0], ids[1]]);
    assert!(matches!(repeated, Err(FunnelError::InvalidOrder(_))));
    let foreign = theme.reorder_songs_in_tier(Tier::Finalists, &[ids[0], ids[1], SongId::new()]);
    assert!(matches!(foreign, Err(FunnelError::NotFound(_))));
    let unranked = theme.reorder_songs_in_tier(Tier::Candidates, &[]);
    assert!(matches!(unranked, Err(FunnelError::InvalidOrder(_))));

    assert_eq!(theme, snapshot);
  }

  #[test]
  fn add_from_collection_checks_duplicates_and_capacity() {
    let (mut theme, _) = theme_with(Tier::Candidates, 29);
    theme.add_song_from_collection(Song::new("Fresh", "Band")).unwrap();

    let dup = theme.add_song_from_collection(Song::new("fresh", "band"));
    assert!(matches!(dup, Err(FunnelError::InvalidTransition(_))));
    let full = theme.add_song_from_collection(Song::new("Another", "Band"));
    assert_eq!(full, Err(FunnelError::CapacityExceeded { tier: Tier::Candidates, capacity: 30 }));
  }

  #[test]
  fn hall_pass_lifts_a_candidate_once() {
    let (mut theme, ids) = theme_with(Tier::Candidates, 2);

    let lifted = theme.use_hall_pass(HallPass::Semifinals, HallPassEntry::Candidate(ids[0]), "gut call").unwrap();
    assert_eq!(lifted, ids[0]);
    assert_eq!(theme.tier_of(ids[0]), Some(Tier::Semifinalists));
    let history = &theme.songs_in(Tier::Semifinalists)[0].promotion_history;
    assert_eq!(history[0].reason, "semifinals hall pass: gut call");

    let again = theme.use_hall_pass(HallPass::Semifinals, HallPassEntry::Candidate(ids[1]), "");
    assert_eq!(again, Err(FunnelError::HallPassExhausted(HallPass::Semifinals)));
    assert!(theme.hall_passes().is_available(HallPass::Finals));
  }

  #[test]
  fn hall_pass_without_reason_records_just_the_pass() {
    let (mut theme, ids) = theme_with(Tier::Candidates, 1);
    theme.use_hall_pass(HallPass::Finals, HallPassEntry::Candidate(ids[0]), "").unwrap();

    let history = &theme.songs_in(Tier::Finalists)[0].promotion_history;
    assert_eq!(history[0].reason, "finals hall pass");
    assert_eq!((history[0].from_tier, history[0].to_tier), (Tier::Candidates, Tier::Finalists));
  }

  #[test]
  fn failed_hall_pass_is_not_consumed() {
    let (mut theme, _) = theme_with(Tier::Semifinalists, 8);
    let result = theme.use_hall_pass(HallPass::Semifinals, HallPassEntry::NewSong(Song::new("X", "Y")), "");
    assert_eq!(result, Err(FunnelError::CapacityExceeded { tier: Tier::Semifinalists, capacity: 8 }));
    assert!(theme.hall_passes().is_available(HallPass::Semifinals));

    let (mut theme, ids) = theme_with(Tier::Semifinalists, 1);
    let result = theme.use_hall_pass(HallPass::Finals, HallPassEntry::Candidate(ids[0]), "");
    assert!(matches!(result, Err(FunnelError::InvalidTransition(_))));
    assert!(theme.hall_passes().is_available(HallPass::Finals));
  }
}

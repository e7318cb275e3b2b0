use encore_core::FunnelError;
use encore_core::domain::{HallPass, Phase, PhaseThresholds, Song, SongId, Theme, Tier};
use encore_core::funnel::{HallPassEntry, SkipReason, TierAction, TierActionKind, apply_tier_actions};

fn add(theme: &mut Theme, title: &str, artist: &str) -> SongId {
  theme.add_song_from_collection(Song::new(title, artist)).unwrap()
}

fn add_at(theme: &mut Theme, tier: Tier, title: &str) -> SongId {
  let id = add(theme, title, "Various");
  let mut current = Tier::Candidates;
  while current != tier {
    let next = current.next().unwrap();
    theme.promote_song(id, next, "setup").unwrap();
    current = next;
  }
  id
}

#[test]
fn new_theme_brainstorms_until_eight_candidates() {
  let thresholds = PhaseThresholds::default();
  let mut theme = Theme::new("Songs about the sea");
  assert!(theme.songs_in(Tier::Candidates).is_empty());
  assert_eq!(theme.phase(&thresholds), Phase::Brainstorm);

  for i in 0..7 {
    add(&mut theme, &format!("Wave {i}"), "Ocean");
  }
  assert_eq!(theme.phase(&thresholds), Phase::Brainstorm);

  add(&mut theme, "Wave 7", "Ocean");
  assert_eq!(theme.phase(&thresholds), Phase::Refine);
}

#[test]
fn promoting_into_full_semifinalists_fails() {
  let mut theme = Theme::new("full");
  for i in 0..8 {
    add_at(&mut theme, Tier::Semifinalists, &format!("Semi {i}"));
  }
  let waiting = add(&mut theme, "Waiting", "Line");

  let result = theme.promote_song(waiting, Tier::Semifinalists, "");
  assert_eq!(result, Err(FunnelError::CapacityExceeded { tier: Tier::Semifinalists, capacity: 8 }));
  assert_eq!(theme.songs_in(Tier::Semifinalists).len(), 8);
  assert_eq!(theme.tier_of(waiting), Some(Tier::Candidates));
}

#[test]
fn occupied_pick_must_be_demoted_first() {
  let mut theme = Theme::new("one winner");
  let b = add_at(&mut theme, Tier::Pick, "B");
  let a = add_at(&mut theme, Tier::Finalists, "A");

  let result = theme.promote_song(a, Tier::Pick, "");
  assert!(matches!(result, Err(FunnelError::InvalidTransition(_))));
  assert_eq!(theme.pick().map(|s| s.id), Some(b));

  theme.demote_song(b, Tier::Finalists, "").unwrap();
  theme.promote_song(a, Tier::Pick, "").unwrap();
  assert_eq!(theme.pick().map(|s| s.id), Some(a));
}

#[test]
fn finals_hall_pass_works_exactly_once() {
  let mut theme = Theme::new("skip the line");
  for i in 0..8 {
    add_at(&mut theme, Tier::Semifinalists, &format!("Semi {i}"));
  }
  assert!(theme.songs_in(Tier::Finalists).is_empty());

  let first = theme.use_hall_pass(HallPass::Finals, HallPassEntry::NewSong(Song::new("Late", "Entry")), "");
  let id = first.unwrap();
  assert_eq!(theme.tier_of(id), Some(Tier::Finalists));
  assert!(!theme.hall_passes().is_available(HallPass::Finals));

  let second = theme.use_hall_pass(HallPass::Finals, HallPassEntry::NewSong(Song::new("Later", "Entry")), "");
  assert_eq!(second, Err(FunnelError::HallPassExhausted(HallPass::Finals)));
  assert!(theme.hall_passes().is_available(HallPass::Semifinals));
}

#[test]
fn semifinals_pass_is_single_use_and_independent() {
  let mut theme = Theme::new("skip");
  let a = add(&mut theme, "A", "x");
  let b = add(&mut theme, "B", "x");

  theme.use_hall_pass(HallPass::Semifinals, HallPassEntry::Candidate(a), "").unwrap();
  let again = theme.use_hall_pass(HallPass::Semifinals, HallPassEntry::Candidate(b), "");
  assert_eq!(again, Err(FunnelError::HallPassExhausted(HallPass::Semifinals)));

  theme.use_hall_pass(HallPass::Finals, HallPassEntry::Candidate(b), "").unwrap();
  assert_eq!(theme.tier_of(b), Some(Tier::Finalists));
}

#[test]
fn tier_action_batch_applies_what_matches() {
  let mut theme = Theme::new("batch");
  let x = add(&mut theme, "Song X", "Artist Y");
  theme.promote_song(x, Tier::Semifinalists, "").unwrap();

  let actions = vec![
    TierAction {
      action: TierActionKind::Promote,
      song_title: "Song X".into(),
      song_artist: "Artist Y".into(),
      to_tier: Some(Tier::Finalists),
      reason: Some("clear favourite".into()),
    },
    TierAction {
      action: TierActionKind::Promote,
      song_title: "NoSuchSong".into(),
      song_artist: "NoSuchArtist".into(),
      to_tier: Some(Tier::Finalists),
      reason: None,
    },
  ];

  let outcome = apply_tier_actions(&mut theme, actions);
  assert_eq!(outcome.applied.len(), 1);
  assert_eq!(outcome.skipped.len(), 1);
  assert_eq!(outcome.skipped[0].reason, SkipReason::NoMatch);
  assert_eq!(theme.tier_of(x), Some(Tier::Finalists));
}

#[test]
fn demoting_the_pick_records_history() {
  let mut theme = Theme::new("regret");
  let id = add_at(&mut theme, Tier::Pick, "Chosen");

  theme.demote_song(id, Tier::Finalists, "second thoughts").unwrap();

  assert!(theme.pick().is_none());
  let song = theme.songs_in(Tier::Finalists).iter().find(|s| s.id == id).unwrap();
  let last = song.promotion_history.last().unwrap();
  assert_eq!((last.from_tier, last.to_tier), (Tier::Pick, Tier::Finalists));
  assert_eq!(last.reason, "second thoughts");
}

#[test]
fn promoting_onto_own_tier_is_rejected() {
  let mut theme = Theme::new("idempotence");
  let id = add_at(&mut theme, Tier::Finalists, "Stay");
  let result = theme.promote_song(id, Tier::Finalists, "");
  assert!(matches!(result, Err(FunnelError::InvalidTransition(_))));
  assert_eq!(theme.songs_in(Tier::Finalists).len(), 1);
}

#[test]
fn invariants_hold_through_a_long_session() {
  let mut theme = Theme::new("stress");
  let ids: Vec<SongId> = (0..30).map(|i| add(&mut theme, &format!("S{i}"), "x")).collect();
  assert!(theme.add_song_from_collection(Song::new("overflow", "x")).is_err());

  // push every song as far up as it will go; most attempts are refused
  for round in 0..4 {
    for id in &ids {
      if let Some(next) = theme.tier_of(*id).and_then(Tier::next) {
        let _ = theme.promote_song(*id, next, format!("round {round}"));
      }
      theme.check_invariants().unwrap();
    }
  }

  let counts = theme.counts();
  assert_eq!((counts.pick, counts.finalists, counts.semifinalists), (1, 4, 8));
  assert_eq!(counts.total(), 30);

  for id in &ids {
    if let Some(prev) = theme.tier_of(*id).and_then(Tier::previous) {
      let _ = theme.demote_song(*id, prev, "");
    }
    theme.check_invariants().unwrap();
  }

  // finalists were full, so the pick had nowhere to go
  let pick = theme.pick().map(|s| s.id).unwrap();
  assert_eq!(
    theme.demote_song(pick, Tier::Finalists, ""),
    Err(FunnelError::CapacityExceeded { tier: Tier::Finalists, capacity: 4 })
  );
  assert_eq!(theme.songs_in(Tier::Semifinalists).len(), 0);
}

#[test]
fn phase_depends_only_on_counts() {
  let thresholds = PhaseThresholds::default();
  let mut left = Theme::new("left");
  let mut right = Theme::new("right");

  for i in 0..3 {
    add_at(&mut left, Tier::Semifinalists, &format!("L{i}"));
    add_at(&mut right, Tier::Semifinalists, &format!("R{}", 2 - i));
  }
  add_at(&mut left, Tier::Finalists, "LF");
  add_at(&mut right, Tier::Finalists, "RF");

  assert_eq!(left.counts(), right.counts());
  assert_eq!(left.phase(&thresholds), right.phase(&thresholds));
  assert_eq!(left.phase(&thresholds), Phase::Decide);
}

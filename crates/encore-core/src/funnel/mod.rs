//! The funnel state machine: engine operations on [`crate::domain::Theme`],
//! the assistant tier-action interpreter and suggestion intake.

pub mod engine;
pub mod interpreter;
pub mod suggestions;

pub use engine::HallPassEntry;
pub use interpreter::{
  AppliedAction, BatchOutcome, SkipReason, SkippedAction, TierAction, TierActionKind, apply_tier_action_values,
  apply_tier_actions, find_song_by_title_artist,
};
pub use suggestions::{SongSuggestion, SuggestionOutcome, SuggestionSkip, accept_suggestions};

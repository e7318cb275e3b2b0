// crates/encore-core/src/errors.rs
use thiserror::Error;

use crate::domain::hall_pass::HallPass;
use crate::domain::ids::ThemeId;
use crate::domain::tier::Tier;

/// A funnel operation that was refused.
///
/// Every variant is recoverable: the theme is left exactly as it was before
/// the call. The UI turns these into toasts and the tier-action interpreter
/// records them as skip reasons.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FunnelError {
  #[error("{tier} is full ({capacity} songs)")]
  CapacityExceeded { tier: Tier, capacity: usize },

  #[error("invalid transition: {0}")]
  InvalidTransition(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("{0} already used")]
  HallPassExhausted(HallPass),

  #[error("invalid order: {0}")]
  InvalidOrder(String),
}

/// Error of the Encore core service layer.
///
/// Upper layers (CLI, etc.) map this to user messages or logs.
#[derive(Debug, Error)]
pub enum CoreError {
  #[error(transparent)]
  Funnel(#[from] FunnelError),

  #[error("repository error: {0}")]
  Repository(String),

  #[error("playlist sync error: {0}")]
  Sync(String),

  #[error("theme {0} not found")]
  ThemeNotFound(ThemeId),
}

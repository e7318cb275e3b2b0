use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::theme::Theme;
use crate::domain::tier::{SEMIFINALISTS_CAPACITY, Tier};

/// Coarse progress label of a theme's funnel.
///
/// Derived from tier occupancy on every read and never stored. It only
/// frames the UI and the assistant prompt; no operation is gated on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
  /// No active theme.
  Idle,
  Brainstorm,
  Refine,
  Decide,
  Complete,
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = match self {
      Phase::Idle => "idle",
      Phase::Brainstorm => "brainstorm",
      Phase::Refine => "refine",
      Phase::Decide => "decide",
      Phase::Complete => "complete",
    };
    f.write_str(text)
  }
}

/// Default candidate count at which brainstorming is considered done.
pub const DEFAULT_CANDIDATES_FOR_REFINE: usize = SEMIFINALISTS_CAPACITY;
/// Default semifinalist count that also puts the theme in refine.
pub const DEFAULT_SEMIFINALISTS_FOR_REFINE: usize = SEMIFINALISTS_CAPACITY;
/// Default finalist count at which the decision is underway.
pub const DEFAULT_FINALISTS_FOR_DECIDE: usize = 1;

/// Occupancy thresholds driving [`Phase`] inference.
///
/// Loaded from the `[funnel]` config section by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseThresholds {
  pub candidates_for_refine: usize,
  pub semifinalists_for_refine: usize,
  pub finalists_for_decide: usize,
}

impl Default for PhaseThresholds {
  fn default() -> Self {
    PhaseThresholds {
      candidates_for_refine: DEFAULT_CANDIDATES_FOR_REFINE,
      semifinalists_for_refine: DEFAULT_SEMIFINALISTS_FOR_REFINE,
      finalists_for_decide: DEFAULT_FINALISTS_FOR_DECIDE,
    }
  }
}

impl PhaseThresholds {
  /// Raises every threshold to at least one song, so that an empty funnel
  /// always reads as `Brainstorm`.
  pub fn normalized(self) -> Self {
    PhaseThresholds {
      candidates_for_refine: self.candidates_for_refine.max(1),
      semifinalists_for_refine: self.semifinalists_for_refine.max(1),
      finalists_for_decide: self.finalists_for_decide.max(1),
    }
  }
}

/// Number of songs per tier. Everything phase inference looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TierCounts {
  pub candidates: usize,
  pub semifinalists: usize,
  pub finalists: usize,
  pub pick: usize,
}

impl TierCounts {
  pub fn get(&self, tier: Tier) -> usize {
    match tier {
      Tier::Candidates => self.candidates,
      Tier::Semifinalists => self.semifinalists,
      Tier::Finalists => self.finalists,
      Tier::Pick => self.pick,
    }
  }

  pub fn total(&self) -> usize {
    self.candidates + self.semifinalists + self.finalists + self.pick
  }
}

impl Phase {
  /// Infers the phase from tier occupancy alone.
  pub fn infer(counts: TierCounts, thresholds: &PhaseThresholds) -> Phase {
    let thresholds = thresholds.normalized();
    if counts.pick > 0 {
      Phase::Complete
    } else if counts.finalists >= thresholds.finalists_for_decide {
      Phase::Decide
    } else if counts.semifinalists >= thresholds.semifinalists_for_refine
      || counts.candidates >= thresholds.candidates_for_refine
    {
      Phase::Refine
    } else {
      Phase::Brainstorm
    }
  }

  /// Like [`Phase::infer`], reporting `Idle` when there is no theme.
  pub fn for_theme(theme: Option<&Theme>, thresholds: &PhaseThresholds) -> Phase {
    match theme {
      Some(theme) => Phase::infer(theme.counts(), thresholds),
      None => Phase::Idle,
    }
  }
}

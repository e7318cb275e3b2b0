use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::domain::tier::Tier;

/// A single-use token that lets a song skip one step of the funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HallPass {
  /// Straight into semifinalists, skipping the candidates promotion.
  Semifinals,
  /// Straight into finalists, skipping semifinalists.
  Finals,
}

impl HallPass {
  pub const fn target_tier(self) -> Tier {
    match self {
      HallPass::Semifinals => Tier::Semifinalists,
      HallPass::Finals => Tier::Finalists,
    }
  }
}

impl fmt::Display for HallPass {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      HallPass::Semifinals => write!(f, "semifinals hall pass"),
      HallPass::Finals => write!(f, "finals hall pass"),
    }
  }
}

impl FromStr for HallPass {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "semifinals" | "semifinalists" | "semis" => Ok(HallPass::Semifinals),
      "finals" | "finalists" => Ok(HallPass::Finals),
      other => Err(format!("invalid hall pass: {other}")),
    }
  }
}

/// Remaining hall passes of one theme. Both start available and are
/// never replenished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HallPasses {
  pub semifinals: bool,
  pub finals: bool,
}

impl Default for HallPasses {
  fn default() -> Self {
    HallPasses { semifinals: true, finals: true }
  }
}

impl HallPasses {
  pub fn is_available(&self, pass: HallPass) -> bool {
    match pass {
      HallPass::Semifinals => self.semifinals,
      HallPass::Finals => self.finals,
    }
  }

  pub(crate) fn consume(&mut self, pass: HallPass) {
    match pass {
      HallPass::Semifinals => self.semifinals = false,
      HallPass::Finals => self.finals = false,
    }
  }

  pub fn remaining(&self) -> usize {
    usize::from(self.semifinals) + usize::from(self.finals)
  }
}

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Maximum number of songs in [`Tier::Candidates`].
pub const CANDIDATES_CAPACITY: usize = 30;
/// Maximum number of songs in [`Tier::Semifinalists`].
pub const SEMIFINALISTS_CAPACITY: usize = 8;
/// Maximum number of songs in [`Tier::Finalists`].
pub const FINALISTS_CAPACITY: usize = 4;
/// The pick slot holds a single song.
pub const PICK_CAPACITY: usize = 1;

/// One of the four funnel buckets.
///
/// The variant order is the funnel order: a song moves up from
/// `Candidates` towards `Pick` one step at a time, so `Ord` doubles as
/// "further along the funnel".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
  #[serde(alias = "candidate")]
  Candidates,
  #[serde(alias = "semifinalist", alias = "semis")]
  Semifinalists,
  #[serde(alias = "finalist", alias = "finals")]
  Finalists,
  Pick,
}

impl Tier {
  /// All tiers, lowest first.
  pub const ALL: [Tier; 4] = [Tier::Candidates, Tier::Semifinalists, Tier::Finalists, Tier::Pick];

  pub const fn capacity(self) -> usize {
    match self {
      Tier::Candidates => CANDIDATES_CAPACITY,
      Tier::Semifinalists => SEMIFINALISTS_CAPACITY,
      Tier::Finalists => FINALISTS_CAPACITY,
      Tier::Pick => PICK_CAPACITY,
    }
  }

  /// The tier a promotion from `self` lands in. `Pick` has none.
  pub const fn next(self) -> Option<Tier> {
    match self {
      Tier::Candidates => Some(Tier::Semifinalists),
      Tier::Semifinalists => Some(Tier::Finalists),
      Tier::Finalists => Some(Tier::Pick),
      Tier::Pick => None,
    }
  }

  /// The tier a demotion from `self` lands in. `Candidates` has none.
  pub const fn previous(self) -> Option<Tier> {
    match self {
      Tier::Candidates => None,
      Tier::Semifinalists => Some(Tier::Candidates),
      Tier::Finalists => Some(Tier::Semifinalists),
      Tier::Pick => Some(Tier::Finalists),
    }
  }

  /// Whether the songs of this tier carry a user-defined rank.
  pub const fn is_ranked(self) -> bool {
    matches!(self, Tier::Semifinalists | Tier::Finalists)
  }

  pub const fn as_str(self) -> &'static str {
    match self {
      Tier::Candidates => "candidates",
      Tier::Semifinalists => "semifinalists",
      Tier::Finalists => "finalists",
      Tier::Pick => "pick",
    }
  }
}

impl fmt::Display for Tier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Error produced when a string does not name a [`Tier`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid tier: {input}")]
pub struct TierParseError {
  pub input: String,
}

impl FromStr for Tier {
  type Err = TierParseError;

  /// Accepts the canonical lowercase names plus the singular and short
  /// forms that show up in assistant output ("finalist", "semis").
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let normalized = s.trim().to_lowercase();

    let tier = match normalized.as_str() {
      "candidates" | "candidate" => Tier::Candidates,
      "semifinalists" | "semifinalist" | "semis" => Tier::Semifinalists,
      "finalists" | "finalist" | "finals" => Tier::Finalists,
      "pick" => Tier::Pick,
      _ => return Err(TierParseError { input: s.to_string() }),
    };

    Ok(tier)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn adjacency_follows_funnel_order() {
    assert_eq!(Tier::Candidates.next(), Some(Tier::Semifinalists));
    assert_eq!(Tier::Pick.next(), None);
    assert_eq!(Tier::Candidates.previous(), None);
    assert_eq!(Tier::Pick.previous(), Some(Tier::Finalists));

    for tier in Tier::ALL {
      if let Some(next) = tier.next() {
        assert!(next > tier);
        assert_eq!(next.previous(), Some(tier));
      }
    }
  }

  #[test]
  fn capacities_match_the_funnel_shape() {
    let caps: Vec<usize> = Tier::ALL.iter().map(|t| t.capacity()).collect();
    assert_eq!(caps, vec![30, 8, 4, 1]);
  }

  #[test]
  fn parses_loose_names() {
    assert_eq!(" Finalist ".parse::<Tier>().unwrap(), Tier::Finalists);
    assert_eq!("semis".parse::<Tier>().unwrap(), Tier::Semifinalists);
    assert!("shortlist".parse::<Tier>().is_err());
  }

  #[test]
  fn serde_accepts_the_same_names_as_from_str() {
    let names =
      ["candidates", "candidate", "semifinalists", "semifinalist", "semis", "finalists", "finalist", "finals", "pick"];
    for name in names {
      let parsed: Tier = name.parse().unwrap();
      let decoded: Tier = serde_json::from_str(&format!("\"{name}\"")).unwrap();
      assert_eq!(decoded, parsed, "{name}");
    }
  }
}

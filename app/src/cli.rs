use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use encore_core::domain::{HallPass, ThemeStatus, Tier};

#[derive(Parser, Debug)]
#[command(name = "encore", version, about = "Shortlist songs for Music League rounds")]
pub struct CliArgs {
  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Start a new theme from the league's prompt.
  New {
    raw_theme: String,
    #[arg(long)]
    title: Option<String>,
  },
  /// List themes, most recently touched first.
  List,
  /// Print a theme's funnel.
  Show { theme: String },
  /// Add a song to candidates.
  Add {
    theme: String,
    #[command(flatten)]
    song: SongArgs,
  },
  Promote {
    theme: String,
    song: String,
    tier: Tier,
    #[arg(long, default_value = "")]
    reason: String,
  },
  Demote {
    theme: String,
    song: String,
    tier: Tier,
    #[arg(long, default_value = "")]
    reason: String,
  },
  /// Drop a song from the funnel.
  Remove { theme: String, song: String, tier: Tier },
  /// Swipe a candidate away and remember not to suggest it again.
  Reject {
    theme: String,
    song: String,
    #[arg(long)]
    note: Option<String>,
  },
  /// Toggle the muted flag.
  Mute { theme: String, song: String },
  /// Mark a song as out of the running (or back in with --undo).
  Eliminate {
    theme: String,
    song: String,
    #[arg(long)]
    undo: bool,
  },
  /// Score a song 1-5 on theme fit and quality.
  Rate {
    theme: String,
    song: String,
    #[arg(long, requires = "quality", value_parser = clap::value_parser!(u8).range(1..=5))]
    fit: Option<u8>,
    #[arg(long, requires = "fit", value_parser = clap::value_parser!(u8).range(1..=5))]
    quality: Option<u8>,
  },
  /// Rank a tier. Every song of the tier must be listed exactly once.
  Reorder {
    theme: String,
    tier: Tier,
    #[arg(required = true)]
    songs: Vec<String>,
  },
  /// Skip a step with a hall pass, for a candidate or a brand new song.
  HallPass {
    theme: String,
    pass: HallPass,
    /// Candidate to move. Omit to add a new song with --title/--artist.
    song: Option<String>,
    #[command(flatten)]
    new_song: NewSongArgs,
    #[arg(long, default_value = "")]
    reason: String,
  },
  /// Apply a JSON array of assistant tier actions.
  Apply { theme: String, actions: PathBuf },
  /// Add a JSON array of assistant song suggestions as candidates.
  Suggest { theme: String, suggestions: PathBuf },
  Status { theme: String, status: ThemeStatus },
  /// Change the display title. The league's prompt is kept as is.
  Rename { theme: String, title: String },
  /// Set the submission deadline (RFC 3339), or clear it when omitted.
  Deadline { theme: String, at: Option<DateTime<Utc>> },
  /// Record how the theme is read and the plan for it. Omitted flags keep
  /// their current value.
  Interpret {
    theme: String,
    #[arg(long)]
    interpretation: Option<String>,
    #[arg(long)]
    strategy: Option<String>,
    #[arg(long, conflicts_with_all = ["interpretation", "strategy"])]
    clear: bool,
  },
  Delete { theme: String },
}

#[derive(Args, Debug)]
pub struct SongArgs {
  #[arg(long)]
  pub title: String,
  #[arg(long)]
  pub artist: String,
  #[arg(long)]
  pub album: Option<String>,
  #[arg(long)]
  pub year: Option<u16>,
  #[arg(long, default_value = "")]
  pub reason: String,
}

#[derive(Args, Debug)]
pub struct NewSongArgs {
  #[arg(long, conflicts_with = "song", requires = "artist")]
  pub title: Option<String>,
  #[arg(long, conflicts_with = "song", requires = "title")]
  pub artist: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::CommandFactory;

  #[test]
  fn cli_definition_is_consistent() {
    CliArgs::command().debug_assert();
  }

  #[test]
  fn parses_tier_and_pass_names() {
    let args = CliArgs::try_parse_from(["encore", "promote", "abc", "1f2e", "semis", "--reason", "catchy"]).unwrap();
    match args.command {
      Command::Promote { tier, reason, .. } => {
        assert_eq!(tier, Tier::Semifinalists);
        assert_eq!(reason, "catchy");
      }
      other => panic!("unexpected command {other:?}"),
    }

    let args = CliArgs::try_parse_from(["encore", "hall-pass", "abc", "finals", "--title", "T", "--artist", "A"]).unwrap();
    assert!(matches!(args.command, Command::HallPass { pass: HallPass::Finals, song: None, .. }));
  }

  #[test]
  fn deadline_is_optional_and_parsed_as_a_timestamp() {
    let args = CliArgs::try_parse_from(["encore", "deadline", "abc", "2026-03-01T18:00:00Z"]).unwrap();
    match args.command {
      Command::Deadline { at: Some(at), .. } => assert_eq!(at.to_rfc3339(), "2026-03-01T18:00:00+00:00"),
      other => panic!("unexpected command {other:?}"),
    }
    assert!(matches!(
      CliArgs::try_parse_from(["encore", "deadline", "abc"]).unwrap().command,
      Command::Deadline { at: None, .. }
    ));
    assert!(CliArgs::try_parse_from(["encore", "deadline", "abc", "next friday"]).is_err());
  }

  #[test]
  fn rating_needs_both_scores() {
    assert!(CliArgs::try_parse_from(["encore", "rate", "abc", "def", "--fit", "4"]).is_err());
    assert!(CliArgs::try_parse_from(["encore", "rate", "abc", "def", "--fit", "6", "--quality", "2"]).is_err());
  }
}

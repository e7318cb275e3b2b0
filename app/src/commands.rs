use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use serde_json::Value;
use std::path::Path;
use tracing::info;

use encore_core::domain::{Score, Song, SongId, SongRatings, Theme, ThemeId, Tier};
use encore_core::funnel::{BatchOutcome, HallPassEntry, SongSuggestion, SuggestionOutcome};
use encore_core::ports::ThemeRepository;
use encore_core::services::ThemeService;

use crate::cli::{Command, NewSongArgs, SongArgs};
use crate::resolve;

/// Runs one command and returns what should be printed.
pub fn run<R: ThemeRepository>(service: &ThemeService<R>, command: Command) -> Result<String> {
  match command {
    Command::New { raw_theme, title } => {
      let theme = service.create_theme(&raw_theme, title).context("failed to create theme")?;
      Ok(format!("created {} {}", theme.id, theme.title))
    }
    Command::List => {
      let themes = service.list_themes()?;
      Ok(render_list(&themes, service))
    }
    Command::Show { theme } => {
      let theme = load(service, &theme)?;
      Ok(render_theme(&theme, service))
    }
    Command::Add { theme, song } => {
      let id = theme_id(service, &theme)?;
      let (theme, song_id) = service.add_song_from_collection(id, new_song(song))?;
      Ok(format!("added {song_id} to candidates ({} songs)", theme.song_count()))
    }
    Command::Promote { theme, song, tier, reason } => {
      let (id, song) = song_ref(service, &theme, &song)?;
      let theme = service.promote_song(id, song, tier, &reason)?;
      Ok(render_theme(&theme, service))
    }
    Command::Demote { theme, song, tier, reason } => {
      let (id, song) = song_ref(service, &theme, &song)?;
      let theme = service.demote_song(id, song, tier, &reason)?;
      Ok(render_theme(&theme, service))
    }
    Command::Remove { theme, song, tier } => {
      let (id, song) = song_ref(service, &theme, &song)?;
      let theme = service.remove_song_from_tier(id, song, tier)?;
      Ok(render_theme(&theme, service))
    }
    Command::Reject { theme, song, note } => {
      let (id, song) = song_ref(service, &theme, &song)?;
      let theme = service.reject_candidate(id, song, note)?;
      Ok(format!("rejected {song}, {} rejections on record", theme.rejections().len()))
    }
    Command::Mute { theme, song } => {
      let (id, song) = song_ref(service, &theme, &song)?;
      let (_, muted) = service.toggle_muted(id, song)?;
      Ok(format!("{song} is now {}", if muted { "muted" } else { "unmuted" }))
    }
    Command::Eliminate { theme, song, undo } => {
      let (id, song) = song_ref(service, &theme, &song)?;
      service.set_eliminated(id, song, !undo)?;
      Ok(format!("{song} is {}", if undo { "back in the running" } else { "eliminated" }))
    }
    Command::Rate { theme, song, fit, quality } => {
      let (id, song) = song_ref(service, &theme, &song)?;
      let ratings = match (fit.and_then(Score::new), quality.and_then(Score::new)) {
        (Some(theme_fit), Some(quality)) => Some(SongRatings { theme_fit, quality }),
        _ => None,
      };
      service.rate_song(id, song, ratings)?;
      Ok(match ratings {
        Some(r) => format!("{song} rated fit {} quality {}", r.theme_fit, r.quality),
        None => format!("{song} ratings cleared"),
      })
    }
    Command::Reorder { theme, tier, songs } => {
      let current = load(service, &theme)?;
      let ordered = songs.iter().map(|s| resolve::song_id(&current, s)).collect::<Result<Vec<_>>>()?;
      let theme = service.reorder_songs_in_tier(current.id, tier, &ordered)?;
      Ok(render_theme(&theme, service))
    }
    Command::HallPass { theme, pass, song, new_song: NewSongArgs { title, artist }, reason } => {
      let current = load(service, &theme)?;
      let entry = match (song, title, artist) {
        (Some(song), _, _) => HallPassEntry::Candidate(resolve::song_id(&current, &song)?),
        (None, Some(title), Some(artist)) => HallPassEntry::NewSong(Song::new(title, artist)),
        _ => anyhow::bail!("give either a candidate or --title and --artist"),
      };
      let (theme, song_id) = service.use_hall_pass(current.id, pass, entry, &reason)?;
      info!(theme = %theme.id, song = %song_id, %pass, "used hall pass");
      Ok(format!("{song_id} is now in {}", pass.target_tier()))
    }
    Command::Apply { theme, actions } => {
      let id = theme_id(service, &theme)?;
      let actions: Vec<Value> = read_json(&actions)?;
      let (_, outcome) = service.apply_tier_action_values(id, actions)?;
      Ok(render_batch(&outcome))
    }
    Command::Suggest { theme, suggestions } => {
      let id = theme_id(service, &theme)?;
      let suggestions: Vec<SongSuggestion> = read_json(&suggestions)?;
      let (_, outcome) = service.accept_suggestions(id, suggestions)?;
      Ok(render_suggestions(&outcome))
    }
    Command::Status { theme, status } => {
      let id = theme_id(service, &theme)?;
      let theme = service.set_status(id, status)?;
      Ok(format!("{} is {}", theme.title, theme.status))
    }
    Command::Rename { theme, title } => {
      let id = theme_id(service, &theme)?;
      let theme = service.rename_theme(id, title)?;
      Ok(format!("renamed to {}", theme.title))
    }
    Command::Deadline { theme, at } => {
      let id = theme_id(service, &theme)?;
      let theme = service.set_deadline(id, at)?;
      Ok(match theme.deadline {
        Some(at) => format!("deadline set to {}", at.to_rfc3339()),
        None => "deadline cleared".to_string(),
      })
    }
    Command::Interpret { theme, interpretation, strategy, clear } => {
      let current = load(service, &theme)?;
      let (interpretation, strategy) = if clear {
        (None, None)
      } else {
        (interpretation.or(current.interpretation), strategy.or(current.strategy))
      };
      let theme = service.set_interpretation(current.id, interpretation, strategy)?;
      Ok(render_theme(&theme, service))
    }
    Command::Delete { theme } => {
      let id = theme_id(service, &theme)?;
      service.delete_theme(id)?;
      Ok(format!("deleted {id}"))
    }
  }
}

fn new_song(args: SongArgs) -> Song {
  Song { album: args.album, year: args.year, ..Song::new(args.title, args.artist).with_reason(args.reason) }
}

fn theme_id<R: ThemeRepository>(service: &ThemeService<R>, input: &str) -> Result<ThemeId> {
  let themes = service.list_themes()?;
  resolve::theme_id(&themes, input)
}

fn load<R: ThemeRepository>(service: &ThemeService<R>, input: &str) -> Result<Theme> {
  let id = theme_id(service, input)?;
  Ok(service.get_theme(id)?)
}

fn song_ref<R: ThemeRepository>(
  service: &ThemeService<R>,
  theme: &str,
  song: &str,
) -> Result<(ThemeId, SongId)> {
  let theme = load(service, theme)?;
  let song = resolve::song_id(&theme, song)?;
  Ok((theme.id, song))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
  let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
  serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn short(id: impl ToString) -> String {
  id.to_string().chars().take(8).collect()
}

fn render_list<R: ThemeRepository>(themes: &[Theme], service: &ThemeService<R>) -> String {
  if themes.is_empty() {
    return "no themes yet".to_string();
  }
  let mut out = String::new();
  for theme in themes {
    let counts = theme.counts();
    let _ = writeln!(
      out,
      "{}  {:<9} {:<10} {}/{}/{}/{}  {}",
      short(theme.id),
      theme.status,
      theme.phase(service.thresholds()),
      counts.candidates,
      counts.semifinalists,
      counts.finalists,
      counts.pick,
      theme.title
    );
  }
  out
}

pub fn render_theme<R: ThemeRepository>(theme: &Theme, service: &ThemeService<R>) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "{}  [{}, {}]", theme.title, theme.status, theme.phase(service.thresholds()));
  let _ = writeln!(out, "id {}", theme.id);
  if let Some(deadline) = theme.deadline {
    let _ = writeln!(out, "deadline {}", deadline.to_rfc3339());
  }
  if let Some(interpretation) = &theme.interpretation {
    let _ = writeln!(out, "reading: {interpretation}");
  }
  if let Some(strategy) = &theme.strategy {
    let _ = writeln!(out, "plan: {strategy}");
  }

  let passes = theme.hall_passes();
  let used = |available: bool| if available { "available" } else { "used" };
  let _ = writeln!(out, "hall passes: semifinals {}, finals {}", used(passes.semifinals), used(passes.finals));

  for tier in Tier::ALL.iter().rev().copied() {
    let songs = theme.ranked_songs(tier);
    let _ = writeln!(out, "\n{tier} ({}/{})", songs.len(), tier.capacity());
    for (i, song) in songs.iter().enumerate() {
      let mut line = format!("  {}  {} - {}", short(song.id), song.title, song.artist);
      if tier.is_ranked() && song.rank.is_some() {
        line = format!("{:>2}.{line}", i + 1);
      }
      if song.is_muted {
        line.push_str(" [muted]");
      }
      if song.is_eliminated {
        line.push_str(" [out]");
      }
      if let Some(r) = song.ratings {
        let _ = write!(line, " fit {} quality {}", r.theme_fit, r.quality);
      }
      let _ = writeln!(out, "{line}");
    }
  }
  out
}

fn render_batch(outcome: &BatchOutcome) -> String {
  let mut out = format!("{} applied, {} skipped\n", outcome.applied.len(), outcome.skipped.len());
  for applied in &outcome.applied {
    let to = applied.to.map(|t| t.to_string()).unwrap_or_else(|| "removed".into());
    let _ = writeln!(out, "  ok    {} {}: {} -> {to}", applied.action.action, applied.action.song_title, applied.from);
  }
  for skipped in &outcome.skipped {
    let _ = match &skipped.action {
      Some(action) => writeln!(out, "  skip  {} {}: {}", action.action, action.song_title, skipped.reason),
      None => writeln!(out, "  skip  item {}: {}", skipped.index + 1, skipped.reason),
    };
  }
  out
}

fn render_suggestions(outcome: &SuggestionOutcome) -> String {
  let mut out = format!("{} added, {} skipped\n", outcome.added.len(), outcome.skipped.len());
  for (suggestion, why) in &outcome.skipped {
    let _ = writeln!(out, "  skip  {} - {}: {why}", suggestion.title, suggestion.artist);
  }
  out
}

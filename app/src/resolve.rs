//! Turns the ids typed on the command line into domain ids. Both themes
//! and songs may be given as a full UUID or any unambiguous prefix of one.

use anyhow::{Result, anyhow, bail};

use encore_core::domain::{SongId, Theme, ThemeId};

fn unique<T: Copy>(kind: &str, input: &str, matches: Vec<T>) -> Result<T> {
  match matches.as_slice() {
    [one] => Ok(*one),
    [] => bail!("no {kind} matches {input:?}"),
    many => bail!("{input:?} is ambiguous: {} {kind}s match", many.len()),
  }
}

pub fn theme_id(themes: &[Theme], input: &str) -> Result<ThemeId> {
  if let Ok(id) = input.parse::<ThemeId>() {
    return Ok(id);
  }
  let prefix = input.trim().to_lowercase();
  if prefix.is_empty() {
    return Err(anyhow!("empty theme id"));
  }
  let matches = themes.iter().map(|t| t.id).filter(|id| id.to_string().starts_with(&prefix)).collect();
  unique("theme", input, matches)
}

pub fn song_id(theme: &Theme, input: &str) -> Result<SongId> {
  if let Ok(id) = input.parse::<SongId>() {
    return Ok(id);
  }
  let prefix = input.trim().to_lowercase();
  if prefix.is_empty() {
    return Err(anyhow!("empty song id"));
  }
  let matches =
    theme.all_songs().map(|found| found.song.id).filter(|id| id.to_string().starts_with(&prefix)).collect();
  unique("song", input, matches)
}

#[cfg(test)]
mod tests {
  use super::*;
  use encore_core::domain::Song;

  #[test]
  fn resolves_song_prefixes_within_a_theme() {
    let mut theme = Theme::new("prefixes");
    let id = theme.add_song_from_collection(Song::new("One", "A")).unwrap();
    let full = id.to_string();

    assert_eq!(song_id(&theme, &full).unwrap(), id);
    assert_eq!(song_id(&theme, &full[..8].to_uppercase()).unwrap(), id);
    assert!(song_id(&theme, "zzzz").is_err());
  }

  #[test]
  fn shared_prefix_is_ambiguous() {
    let themes = vec![Theme::new("a"), Theme::new("b")];
    let err = theme_id(&themes, "").unwrap_err();
    assert!(err.to_string().contains("empty"));

    let a = themes[0].id.to_string();
    let b = themes[1].id.to_string();
    let common: usize = a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count();
    if common > 0 {
      assert!(theme_id(&themes, &a[..common]).is_err());
    }
    assert_eq!(theme_id(&themes, &a[..common + 1]).unwrap(), themes[0].id);
  }
}

//! Show / season / episode grouping for TV show playlists
//!
//! Grouping is inferred from entry titles only, so it is best-effort:
//! two shows with the same inferred name share a group, and titles without
//! a season/episode marker land in the default season.

use crate::error::Result;
use crate::m3u_parser::{decode_text, parse_flat};
use crate::models::PlaylistEntry;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// Season label used when a title carries no season marker
pub const DEFAULT_SEASON: &str = "S01";

lazy_static! {
    /// Optional "(YYYY)" followed by "S<digits>E<digits>"
    static ref SEASON_EPISODE_REGEX: Regex =
        Regex::new(r"(?i)(?:\s*\(\s*(\d{4})\s*\))?[\s._\-]*\bS(\d{1,3})[\s._\-]*E(\d{1,4})")
            .unwrap();
}

/// What a title says about its show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleInfo {
    pub show: String,
    pub season_label: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub year: Option<u16>,
}

/// Split a title into show name and season.
///
/// `"Breaking Bad (2008) S01E02"` gives show `"Breaking Bad"`, season `"S01"`.
/// Titles without a marker are their own show in [`DEFAULT_SEASON`].
pub fn infer_title(title: &str) -> TitleInfo {
    let title = title.trim();

    if let Some(caps) = SEASON_EPISODE_REGEX.captures(title) {
        // Group 0 always exists on a successful capture
        let start = caps.get(0).map_or(0, |m| m.start());
        let prefix = title[..start]
            .trim_matches(|c: char| c.is_whitespace() || "-._:|".contains(c));
        let season = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
        let episode = caps.get(3).and_then(|m| m.as_str().parse::<u32>().ok());
        let year = caps.get(1).and_then(|m| m.as_str().parse::<u16>().ok());

        let season_label = match season {
            Some(n) => format!("S{:02}", n),
            None => DEFAULT_SEASON.to_string(),
        };

        let show = if prefix.is_empty() { title } else { prefix };

        return TitleInfo {
            show: show.to_string(),
            season_label,
            season,
            episode,
            year,
        };
    }

    TitleInfo {
        show: title.to_string(),
        season_label: DEFAULT_SEASON.to_string(),
        season: None,
        episode: None,
        year: None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Season {
    pub label: String,
    pub episodes: Vec<PlaylistEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowGroup {
    pub name: String,
    pub seasons: Vec<Season>,
}

impl ShowGroup {
    pub fn season(&self, label: &str) -> Option<&Season> {
        self.seasons.iter().find(|s| s.label == label)
    }

    pub fn episode_count(&self) -> usize {
        self.seasons.iter().map(|s| s.episodes.len()).sum()
    }

    fn push(&mut self, season_label: String, entry: PlaylistEntry) {
        match self.seasons.iter_mut().find(|s| s.label == season_label) {
            Some(season) => season.episodes.push(entry),
            None => self.seasons.push(Season {
                label: season_label,
                episodes: vec![entry],
            }),
        }
    }
}

/// Shows in first-seen order; seasons and episodes keep source order too
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowCatalog {
    shows: Vec<ShowGroup>,
    index: HashMap<String, usize>,
}

impl ShowCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry under the show and season inferred from its title
    pub fn push(&mut self, entry: PlaylistEntry) {
        let info = infer_title(&entry.title);
        self.push_to(info.show, info.season_label, entry);
    }

    /// Add an entry under an explicit show and season
    pub fn push_to(&mut self, show: String, season_label: String, entry: PlaylistEntry) {
        let idx = match self.index.get(&show) {
            Some(&idx) => idx,
            None => {
                self.shows.push(ShowGroup {
                    name: show.clone(),
                    seasons: Vec::new(),
                });
                self.index.insert(show, self.shows.len() - 1);
                self.shows.len() - 1
            }
        };
        self.shows[idx].push(season_label, entry);
    }

    pub fn shows(&self) -> &[ShowGroup] {
        &self.shows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ShowGroup> {
        self.shows.iter()
    }

    pub fn get(&self, show: &str) -> Option<&ShowGroup> {
        self.index.get(show).map(|&idx| &self.shows[idx])
    }

    pub fn episodes(&self, show: &str, season_label: &str) -> Option<&[PlaylistEntry]> {
        self.get(show)?
            .season(season_label)
            .map(|s| s.episodes.as_slice())
    }

    /// Number of shows
    pub fn len(&self) -> usize {
        self.shows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shows.is_empty()
    }

    pub fn episode_count(&self) -> usize {
        self.shows.iter().map(ShowGroup::episode_count).sum()
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut PlaylistEntry> {
        self.shows
            .iter_mut()
            .flat_map(|show| show.seasons.iter_mut())
            .flat_map(|season| season.episodes.iter_mut())
    }
}

impl FromIterator<PlaylistEntry> for ShowCatalog {
    fn from_iter<I: IntoIterator<Item = PlaylistEntry>>(iter: I) -> Self {
        let mut catalog = ShowCatalog::new();
        for entry in iter {
            catalog.push(entry);
        }
        catalog
    }
}

impl<'a> IntoIterator for &'a ShowCatalog {
    type Item = &'a ShowGroup;
    type IntoIter = std::slice::Iter<'a, ShowGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.shows.iter()
    }
}

/// Serializes as `{ show: { season: [entry, ...] } }` in insertion order
impl Serialize for ShowCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.shows.len()))?;
        for show in &self.shows {
            map.serialize_entry(&show.name, &SeasonsRef(&show.seasons))?;
        }
        map.end()
    }
}

struct SeasonsRef<'a>(&'a [Season]);

impl Serialize for SeasonsRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for season in self.0 {
            map.serialize_entry(&season.label, &season.episodes)?;
        }
        map.end()
    }
}

/// Parse playlist text and group the entries by show and season
pub fn parse_grouped(content: &str) -> ShowCatalog {
    let catalog: ShowCatalog = parse_flat(content).into_iter().collect();
    debug!(
        "Grouped {} episodes into {} shows",
        catalog.episode_count(),
        catalog.len()
    );
    catalog
}

/// Byte form of [`parse_grouped`]. Fails with `InvalidInput` on non-UTF-8 input.
pub fn parse_grouped_bytes(bytes: &[u8]) -> Result<ShowCatalog> {
    Ok(parse_grouped(decode_text(bytes)?))
}

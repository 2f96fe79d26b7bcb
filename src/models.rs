//! Data models for OlivePlayer catalogs

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Hosts whose pages are players, not media resources
const EMBED_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "youtu.be",
    "player.vimeo.com",
    "vimeo.com",
    "dailymotion.com",
    "www.dailymotion.com",
];

/// Direct media file extensions, played without a manifest
const PROGRESSIVE_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "mkv", "webm", "mov", "avi", "ts", "flv", "mpg", "mpeg", "ogv", "mp3", "aac",
    "m4a", "ogg", "wav", "flac",
];

/// Catalog section, one per playlist source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSection {
    Live,
    Movies,
    TvShows,
}

impl CatalogSection {
    pub const ALL: [CatalogSection; 3] = [
        CatalogSection::Live,
        CatalogSection::Movies,
        CatalogSection::TvShows,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogSection::Live => "live",
            CatalogSection::Movies => "movies",
            CatalogSection::TvShows => "tvshows",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            CatalogSection::Live => "Live",
            CatalogSection::Movies => "Movies",
            CatalogSection::TvShows => "TV Shows",
        }
    }

    /// TV shows are grouped by show and season, the rest are flat lists
    pub fn is_grouped(&self) -> bool {
        matches!(self, CatalogSection::TvShows)
    }
}

impl fmt::Display for CatalogSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogSection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(CatalogSection::Live),
            "movies" => Ok(CatalogSection::Movies),
            "tvshows" | "tv-shows" | "series" => Ok(CatalogSection::TvShows),
            other => Err(format!("unknown catalog section: {}", other)),
        }
    }
}

/// How a URL is played back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Hls,
    #[default]
    Progressive,
    Embed,
}

impl MediaKind {
    /// Infer the kind from the URL alone. A media extension always wins over
    /// embed hints; unknown URLs count as progressive.
    pub fn from_url(url: &Url) -> Self {
        // path() never includes the query or the fragment
        let path = url.path().to_ascii_lowercase();
        match path_extension(&path) {
            Some("m3u8") => return MediaKind::Hls,
            Some(ext) if PROGRESSIVE_EXTENSIONS.contains(&ext) => return MediaKind::Progressive,
            Some("html") | Some("htm") => return MediaKind::Embed,
            _ => {}
        }

        let host = url.host_str().unwrap_or("").to_ascii_lowercase();
        let embed_segment = path.split('/').any(|segment| segment == "embed");
        if EMBED_HOSTS.contains(&host.as_str()) || embed_segment {
            return MediaKind::Embed;
        }

        MediaKind::Progressive
    }

    /// MIME type handed to the playback widget
    pub fn mime_type(&self, url: &str) -> &'static str {
        match self {
            MediaKind::Hls => "application/x-mpegURL",
            MediaKind::Embed => "text/html",
            MediaKind::Progressive => {
                let path = Url::parse(url)
                    .map(|u| u.path().to_ascii_lowercase())
                    .unwrap_or_default();
                progressive_mime(path_extension(&path))
            }
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MediaKind::Hls => "hls",
            MediaKind::Progressive => "progressive",
            MediaKind::Embed => "embed",
        };
        f.write_str(s)
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "hls" | "application/x-mpegurl" | "application/vnd.apple.mpegurl" => Ok(MediaKind::Hls),
            "progressive" => Ok(MediaKind::Progressive),
            "embed" | "iframe" | "text/html" => Ok(MediaKind::Embed),
            _ if s.starts_with("video/") || s.starts_with("audio/") => Ok(MediaKind::Progressive),
            _ => Err(format!("unknown media kind: {}", s)),
        }
    }
}

/// Extension of the last path segment, if it has one
fn path_extension(path: &str) -> Option<&str> {
    let last = path.rsplit('/').next()?;
    let dot = last.rfind('.')?;
    let ext = &last[dot + 1..];
    if ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}

fn progressive_mime(ext: Option<&str>) -> &'static str {
    match ext {
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        Some("ts") => "video/mp2t",
        Some("flv") => "video/x-flv",
        Some("mpg") | Some("mpeg") => "video/mpeg",
        Some("ogv") => "video/ogg",
        Some("mp3") => "audio/mpeg",
        Some("aac") => "audio/aac",
        Some("m4a") => "audio/mp4",
        Some("ogg") => "audio/ogg",
        Some("wav") => "audio/wav",
        Some("flac") => "audio/flac",
        _ => "video/mp4",
    }
}

/// One playable entry from a playlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub title: String,
    pub url: String,
    pub kind: MediaKind,
    pub logo: Option<String>,  // tvg-logo
    pub group: Option<String>, // group-title
}

impl PlaylistEntry {
    pub fn mime_type(&self) -> &'static str {
        self.kind.mime_type(&self.url)
    }

    /// Source descriptor in the shape the playback widget expects
    pub fn playback_source(&self) -> PlaybackSource {
        PlaybackSource {
            src: self.url.clone(),
            media_type: self.mime_type().to_string(),
        }
    }
}

impl Serialize for PlaylistEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = 3 + self.logo.is_some() as usize + self.group.is_some() as usize;
        let mut state = serializer.serialize_struct("PlaylistEntry", len)?;
        state.serialize_field("name", &self.title)?;
        state.serialize_field("url", &self.url)?;
        state.serialize_field("type", self.mime_type())?;
        if let Some(logo) = &self.logo {
            state.serialize_field("logo", logo)?;
        }
        if let Some(group) = &self.group {
            state.serialize_field("group", group)?;
        }
        state.end()
    }
}

/// `{src, type}` pair accepted by the external player's source setter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSource {
    pub src: String,
    #[serde(rename = "type")]
    pub media_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(url: &str) -> MediaKind {
        MediaKind::from_url(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(kind("http://x/y.m3u8"), MediaKind::Hls);
        assert_eq!(kind("http://x/Y.M3U8?token=abc"), MediaKind::Hls);
        assert_eq!(kind("http://x/y.mp4"), MediaKind::Progressive);
        assert_eq!(kind("http://x/live/user/pass/1.ts"), MediaKind::Progressive);
        assert_eq!(kind("http://x/stream"), MediaKind::Progressive);
    }

    #[test]
    fn test_kind_embed() {
        assert_eq!(kind("https://www.youtube.com/watch?v=abc"), MediaKind::Embed);
        assert_eq!(kind("https://example.com/embed/12345"), MediaKind::Embed);
        assert_eq!(kind("https://example.com/movie/watch.html"), MediaKind::Embed);
    }

    #[test]
    fn test_media_extension_beats_embed_path() {
        assert_eq!(kind("https://cdn.example.com/embed/live/index.m3u8"), MediaKind::Hls);
        assert_eq!(kind("https://cdn.example.com/embed/movie.mp4"), MediaKind::Progressive);
        assert_eq!(kind("https://www.youtube.com/clips/intro.webm"), MediaKind::Progressive);
        assert_eq!(
            MediaKind::from_url(&Url::parse("https://cdn.example.com/embed/movie.mp4").unwrap())
                .mime_type("https://cdn.example.com/embed/movie.mp4"),
            "video/mp4"
        );
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(MediaKind::Hls.mime_type("http://x/y.m3u8"), "application/x-mpegURL");
        assert_eq!(MediaKind::Progressive.mime_type("http://x/y.mp4"), "video/mp4");
        assert_eq!(MediaKind::Progressive.mime_type("http://x/y.webm"), "video/webm");
        assert_eq!(MediaKind::Progressive.mime_type("http://x/stream"), "video/mp4");
        assert_eq!(MediaKind::Embed.mime_type("https://example.com/embed/1"), "text/html");
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("hls".parse::<MediaKind>(), Ok(MediaKind::Hls));
        assert_eq!("video/mp4".parse::<MediaKind>(), Ok(MediaKind::Progressive));
        assert_eq!("Embed".parse::<MediaKind>(), Ok(MediaKind::Embed));
        assert!("bogus".parse::<MediaKind>().is_err());
    }

    #[test]
    fn test_entry_serializes_as_player_record() {
        let entry = PlaylistEntry {
            title: "Channel One".to_string(),
            url: "http://example.com/one.m3u8".to_string(),
            kind: MediaKind::Hls,
            logo: None,
            group: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "Channel One",
                "url": "http://example.com/one.m3u8",
                "type": "application/x-mpegURL"
            })
        );

        let source = serde_json::to_value(entry.playback_source()).unwrap();
        assert_eq!(
            source,
            serde_json::json!({ "src": "http://example.com/one.m3u8", "type": "application/x-mpegURL" })
        );
    }

    #[test]
    fn test_section_keys() {
        assert_eq!(CatalogSection::TvShows.as_str(), "tvshows");
        assert_eq!(serde_json::to_string(&CatalogSection::TvShows).unwrap(), "\"tvshows\"");
        assert_eq!("movies".parse::<CatalogSection>(), Ok(CatalogSection::Movies));
        assert!(CatalogSection::TvShows.is_grouped());
        assert!(!CatalogSection::Live.is_grouped());
    }
}

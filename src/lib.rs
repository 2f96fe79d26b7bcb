//! OlivePlayer catalog core
//!
//! Turns extended M3U playlists into the three catalog sections shown by the
//! player: live channels, a flat movie list, and TV shows grouped by show and
//! season. Playback itself is left to an external player; entries convert
//! straight into the `{src, type}` source it expects.

pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod grouping;
pub mod m3u_parser;
pub mod models;


pub use catalog::{
    load_all_blocking, load_section, Catalog, CatalogLoader, Catalogs, LoadResult, SectionState,
};
pub use config::{AppConfig, SectionSource};
pub use error::{PlaylistError, Result};
pub use fetch::{fetch_playlist, FetchOptions};
pub use grouping::{
    infer_title, parse_grouped, parse_grouped_bytes, Season, ShowCatalog, ShowGroup, TitleInfo,
};
pub use m3u_parser::{parse_flat, parse_flat_bytes};
pub use models::{CatalogSection, MediaKind, PlaybackSource, PlaylistEntry};

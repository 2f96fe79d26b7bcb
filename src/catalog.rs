//! Per-section catalogs and their background loading
//!
//! Each section is fetched on its own worker thread and results come back
//! over a channel, so one section failing never affects the others.

use crate::config::{AppConfig, SectionSource};
use crate::error::{PlaylistError, Result};
use crate::fetch::{fetch_playlist, FetchOptions};
use crate::grouping::ShowCatalog;
use crate::m3u_parser::parse_flat;
use crate::models::{CatalogSection, MediaKind, PlaylistEntry};
use chrono::{DateTime, Local};
use log::{info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

/// Normalized contents of one section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Catalog {
    Flat(Vec<PlaylistEntry>),
    Grouped(ShowCatalog),
}

impl Catalog {
    /// Parse playlist text into the shape the section uses.
    /// `kind_override` replaces the per-entry media kind when set.
    pub fn normalize(
        section: CatalogSection,
        content: &str,
        kind_override: Option<MediaKind>,
    ) -> Self {
        let mut entries = parse_flat(content);
        if let Some(kind) = kind_override {
            for entry in &mut entries {
                entry.kind = kind;
            }
        }

        if section.is_grouped() {
            Catalog::Grouped(entries.into_iter().collect())
        } else {
            Catalog::Flat(entries)
        }
    }

    pub fn entry_count(&self) -> usize {
        match self {
            Catalog::Flat(entries) => entries.len(),
            Catalog::Grouped(shows) => shows.episode_count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }

    pub fn as_flat(&self) -> Option<&[PlaylistEntry]> {
        match self {
            Catalog::Flat(entries) => Some(entries),
            Catalog::Grouped(_) => None,
        }
    }

    pub fn as_grouped(&self) -> Option<&ShowCatalog> {
        match self {
            Catalog::Grouped(shows) => Some(shows),
            Catalog::Flat(_) => None,
        }
    }
}

/// Fetch and normalize one section synchronously
pub fn load_section(
    section: CatalogSection,
    source: &SectionSource,
    options: &FetchOptions,
) -> Result<Catalog> {
    if !source.is_configured() {
        return Err(PlaylistError::Config(format!("no playlist configured for {}", section)));
    }
    let content = fetch_playlist(&source.url, options)?;
    Ok(Catalog::normalize(section, &content, source.kind_override))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionState {
    Idle,
    Loading { request: u64 },
    Loaded { catalog: Catalog, fetched_at: DateTime<Local> },
    Failed(String),
}

impl SectionState {
    pub fn catalog(&self) -> Option<&Catalog> {
        match self {
            SectionState::Loaded { catalog, .. } => Some(catalog),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SectionState::Loading { .. })
    }
}

/// Result of a background section load
#[derive(Debug)]
pub struct LoadResult {
    pub section: CatalogSection,
    pub request: u64,
    pub result: Result<Catalog>,
}

/// Current state of all three sections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalogs {
    live: SectionState,
    movies: SectionState,
    tvshows: SectionState,
}

impl Default for Catalogs {
    fn default() -> Self {
        Self {
            live: SectionState::Idle,
            movies: SectionState::Idle,
            tvshows: SectionState::Idle,
        }
    }
}

impl Catalogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, section: CatalogSection) -> &SectionState {
        match section {
            CatalogSection::Live => &self.live,
            CatalogSection::Movies => &self.movies,
            CatalogSection::TvShows => &self.tvshows,
        }
    }

    fn state_mut(&mut self, section: CatalogSection) -> &mut SectionState {
        match section {
            CatalogSection::Live => &mut self.live,
            CatalogSection::Movies => &mut self.movies,
            CatalogSection::TvShows => &mut self.tvshows,
        }
    }

    pub fn catalog(&self, section: CatalogSection) -> Option<&Catalog> {
        self.state(section).catalog()
    }

    pub fn is_loading(&self) -> bool {
        CatalogSection::ALL.iter().any(|&s| self.state(s).is_loading())
    }

    pub fn set_loading(&mut self, section: CatalogSection, request: u64) {
        *self.state_mut(section) = SectionState::Loading { request };
    }

    /// Apply a finished load. Results from a superseded request are ignored.
    /// Returns whether the section changed.
    pub fn apply(&mut self, result: LoadResult) -> bool {
        let state = self.state_mut(result.section);
        match &*state {
            SectionState::Loading { request } if *request == result.request => {}
            _ => return false,
        }

        *state = match result.result {
            Ok(catalog) => {
                info!("[{}] Loaded {} entries", result.section, catalog.entry_count());
                SectionState::Loaded {
                    catalog,
                    fetched_at: Local::now(),
                }
            }
            Err(e) => {
                warn!("[{}] Failed to load playlist: {}", result.section, e);
                SectionState::Failed(e.to_string())
            }
        };
        true
    }
}

/// Loads sections on worker threads and hands results back through `poll`
pub struct CatalogLoader {
    options: FetchOptions,
    task_sender: Sender<LoadResult>,
    task_receiver: Receiver<LoadResult>,
    next_request: u64,
    in_flight: HashSet<u64>,
}

impl CatalogLoader {
    pub fn new(options: FetchOptions) -> Self {
        let (task_sender, task_receiver) = channel();
        Self {
            options,
            task_sender,
            task_receiver,
            next_request: 0,
            in_flight: HashSet::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.fetch_options())
    }

    /// Start loading one section; the section is marked as loading right away
    pub fn load(
        &mut self,
        catalogs: &mut Catalogs,
        section: CatalogSection,
        source: &SectionSource,
    ) {
        self.next_request += 1;
        let request = self.next_request;
        catalogs.set_loading(section, request);
        self.in_flight.insert(request);

        let source = source.clone();
        let options = self.options.clone();
        let sender = self.task_sender.clone();

        info!("[{}] Loading playlist: {}", section, source.url);
        thread::spawn(move || {
            // Always report back so waiters never block on a dead worker
            let result =
                panic::catch_unwind(AssertUnwindSafe(|| load_section(section, &source, &options)))
                    .unwrap_or_else(|_| {
                        Err(PlaylistError::Worker(format!("{} loader panicked", section)))
                    });
            let _ = sender.send(LoadResult {
                section,
                request,
                result,
            });
        });
    }

    /// Start loading every configured section
    pub fn load_all(&mut self, catalogs: &mut Catalogs, config: &AppConfig) {
        for section in CatalogSection::ALL {
            let source = config.source(section);
            if source.is_configured() {
                self.load(catalogs, section, source);
            }
        }
    }

    /// Number of loads started by this loader that have not reported back
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Apply finished loads without blocking. Returns how many sections changed.
    pub fn poll(&mut self, catalogs: &mut Catalogs) -> usize {
        let mut changed = 0;
        while let Ok(result) = self.task_receiver.try_recv() {
            if self.finish(catalogs, result) {
                changed += 1;
            }
        }
        changed
    }

    /// Block until every load started by this loader has reported back.
    /// Sections marked loading by anyone else are left alone.
    pub fn wait(&mut self, catalogs: &mut Catalogs) {
        while !self.in_flight.is_empty() {
            match self.task_receiver.recv() {
                Ok(result) => {
                    self.finish(catalogs, result);
                }
                Err(_) => break,
            }
        }
    }

    fn finish(&mut self, catalogs: &mut Catalogs, result: LoadResult) -> bool {
        self.in_flight.remove(&result.request);
        catalogs.apply(result)
    }
}

/// Load every configured section in parallel and wait for all of them
pub fn load_all_blocking(config: &AppConfig) -> Catalogs {
    let mut loader = CatalogLoader::from_config(config);
    let mut catalogs = Catalogs::new();
    loader.load_all(&mut catalogs, config);
    loader.wait(&mut catalogs);
    catalogs
}

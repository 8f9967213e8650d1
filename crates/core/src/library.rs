//! Library view: search, date and category filtering, pagination, and the
//! single-player playback state behind the public program grid.
//!
//! Everything here is generic over [`LibraryItem`] so the same rules back
//! the `/api/library` endpoint and any front end that keeps its own copy of
//! the catalog.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::types::{BroadcastDate, DbId};

/// Programs shown per page (3 columns x 3 rows).
pub const ITEMS_PER_PAGE: usize = 9;

/// Descriptions longer than this get a "read more" toggle.
pub const READ_MORE_THRESHOLD: usize = 100;

/// Read access to the fields the library view filters on.
pub trait LibraryItem {
    fn id(&self) -> DbId;
    fn name(&self) -> &str;
    fn category(&self) -> &str;
    fn description(&self) -> &str;
    fn date(&self) -> BroadcastDate;
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Active filters. Empty fields do not restrict anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryFilter {
    pub search: String,
    pub start_date: Option<BroadcastDate>,
    pub end_date: Option<BroadcastDate>,
    pub category: Option<String>,
}

impl LibraryFilter {
    /// Whether `item` passes every active filter.
    ///
    /// The search term is matched case-insensitively against name, category
    /// and description. Date bounds are inclusive. Category must match
    /// exactly.
    pub fn matches<T: LibraryItem>(&self, item: &T) -> bool {
        let term = self.search.trim().to_lowercase();
        let matches_search = term.is_empty()
            || item.name().to_lowercase().contains(&term)
            || item.category().to_lowercase().contains(&term)
            || item.description().to_lowercase().contains(&term);

        let date = item.date();
        let after_start = self.start_date.map_or(true, |start| date >= start);
        let before_end = self.end_date.map_or(true, |end| date <= end);

        let matches_category = self
            .category
            .as_deref()
            .map_or(true, |category| item.category() == category);

        matches_search && after_start && before_end && matches_category
    }

    /// Items passing the filter, in their original order.
    pub fn apply<'a, T: LibraryItem>(&self, items: &'a [T]) -> Vec<&'a T> {
        items.iter().filter(|item| self.matches(*item)).collect()
    }
}

/// Distinct categories in first-seen order.
pub fn categories<T: LibraryItem>(items: &[T]) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert(item.category()))
        .map(|item| item.category().to_string())
        .collect()
}

/// Whether a description is long enough to be collapsed.
pub fn needs_read_more(description: &str) -> bool {
    description.chars().count() > READ_MORE_THRESHOLD
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Number of pages needed for `total` items.
pub fn page_count(total: usize) -> usize {
    total.div_ceil(ITEMS_PER_PAGE)
}

/// Clamp a 1-based page number into the valid range for `total` items.
///
/// An empty result set still has page 1.
pub fn clamp_page(page: usize, total: usize) -> usize {
    page.clamp(1, page_count(total).max(1))
}

/// The slice of `items` shown on `page` (1-based, clamped).
pub fn paginate<T>(items: &[T], page: usize) -> &[T] {
    let page = clamp_page(page, items.len());
    let start = (page - 1) * ITEMS_PER_PAGE;
    let end = (start + ITEMS_PER_PAGE).min(items.len());
    &items[start.min(items.len())..end]
}

/// One page of a filtered library.
#[derive(Debug, Clone, Serialize)]
pub struct LibraryPage<T: Serialize> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_count: usize,
    pub total: usize,
    pub categories: Vec<String>,
}

/// Filter `items`, then cut out `page`.
///
/// `categories` lists every category in the unfiltered catalog, so the
/// category chips stay put while a filter is active.
pub fn query_page<T: LibraryItem + Serialize + Clone>(
    items: &[T],
    filter: &LibraryFilter,
    page: usize,
) -> LibraryPage<T> {
    let filtered: Vec<T> = filter.apply(items).into_iter().cloned().collect();
    let total = filtered.len();
    let page = clamp_page(page, total);

    LibraryPage {
        items: paginate(&filtered, page).to_vec(),
        page,
        page_count: page_count(total),
        total,
        categories: categories(items),
    }
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

/// What the audio element should do after a play/pause click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackCommand {
    Play { id: DbId, url: String },
    Pause,
}

/// Position of one entry's audio.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AudioProgress {
    pub current_time: f64,
    pub duration: f64,
}

/// Single-player state: at most one entry plays at a time.
#[derive(Debug, Clone, Default)]
pub struct PlaybackState {
    current: Option<DbId>,
    progress: HashMap<DbId, AudioProgress>,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the entry currently playing.
    pub fn current(&self) -> Option<DbId> {
        self.current
    }

    pub fn is_playing(&self, id: DbId) -> bool {
        self.current == Some(id)
    }

    /// Play/pause button pressed on entry `id`.
    ///
    /// Pressing the playing entry pauses it. Pressing any other entry
    /// switches playback to it.
    pub fn toggle(&mut self, id: DbId, url: &str) -> PlaybackCommand {
        if self.current == Some(id) {
            self.current = None;
            PlaybackCommand::Pause
        } else {
            self.current = Some(id);
            PlaybackCommand::Play {
                id,
                url: url.to_string(),
            }
        }
    }

    /// Record a time update reported by the audio element.
    pub fn update_progress(&mut self, id: DbId, current_time: f64, duration: f64) {
        let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        self.progress.insert(
            id,
            AudioProgress {
                current_time: current_time.max(0.0),
                duration,
            },
        );
    }

    pub fn progress(&self, id: DbId) -> Option<AudioProgress> {
        self.progress.get(&id).copied()
    }

    /// Seek the playing entry. Returns the clamped target time, or `None`
    /// when nothing is playing.
    pub fn seek(&mut self, time: f64) -> Option<f64> {
        let id = self.current?;
        let entry = self.progress.entry(id).or_default();
        let target = if entry.duration > 0.0 {
            time.clamp(0.0, entry.duration)
        } else {
            time.max(0.0)
        };
        entry.current_time = target;
        Some(target)
    }

    /// Forget an entry, e.g. after it was deleted. Stops it if playing.
    pub fn forget(&mut self, id: DbId) {
        if self.current == Some(id) {
            self.current = None;
        }
        self.progress.remove(&id);
    }
}

// ---------------------------------------------------------------------------
// View state
// ---------------------------------------------------------------------------

/// Complete state of the library grid.
#[derive(Debug, Clone)]
pub struct LibraryView<T> {
    entries: Vec<T>,
    filter: LibraryFilter,
    page: usize,
    expanded: HashSet<DbId>,
    pub playback: PlaybackState,
}

impl<T: LibraryItem> LibraryView<T> {
    pub fn new(entries: Vec<T>) -> Self {
        Self {
            entries,
            filter: LibraryFilter::default(),
            page: 1,
            expanded: HashSet::new(),
            playback: PlaybackState::new(),
        }
    }

    /// Replace the entries after a reload. Keeps filters, resets the page.
    pub fn set_entries(&mut self, entries: Vec<T>) {
        self.entries = entries;
        self.page = 1;
    }

    pub fn filter(&self) -> &LibraryFilter {
        &self.filter
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filter.search = search.into();
        self.page = 1;
    }

    pub fn set_date_range(&mut self, start: Option<BroadcastDate>, end: Option<BroadcastDate>) {
        self.filter.start_date = start;
        self.filter.end_date = end;
        self.page = 1;
    }

    pub fn select_category(&mut self, category: Option<String>) {
        self.filter.category = category;
        self.page = 1;
    }

    pub fn categories(&self) -> Vec<String> {
        categories(&self.entries)
    }

    pub fn filtered(&self) -> Vec<&T> {
        self.filter.apply(&self.entries)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        page_count(self.filtered().len())
    }

    /// Entries on the current page.
    pub fn visible(&self) -> Vec<&T> {
        let filtered = self.filtered();
        paginate(&filtered, self.page).to_vec()
    }

    pub fn next_page(&mut self) {
        self.page = clamp_page(self.page + 1, self.filtered().len());
    }

    pub fn prev_page(&mut self) {
        self.page = clamp_page(self.page.saturating_sub(1), self.filtered().len());
    }

    pub fn has_next_page(&self) -> bool {
        self.page < self.page_count()
    }

    pub fn has_prev_page(&self) -> bool {
        self.page > 1
    }

    /// Expand or collapse an entry's description.
    pub fn toggle_description(&mut self, id: DbId) {
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
    }

    pub fn is_expanded(&self, id: DbId) -> bool {
        self.expanded.contains(&id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Incremental city browsing state
//!
//! `CityBrowser` owns the accumulated city list and the per-city weather map
//! for one search term. It performs no I/O: callers pull [`PageRequest`]s from
//! it, run them, and feed the results back. Every request and result carries
//! the generation it was issued under, so results from a previous search are
//! dropped instead of leaking into the current one.

use std::collections::{HashMap, HashSet};

use crate::data::{City, WeatherSummary};

/// Number of cities requested per page
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// A request for one page of search results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Search generation this request belongs to
    pub generation: u64,
    /// Free-text search term
    pub query: String,
    /// Zero-based page cursor
    pub page: usize,
    /// Records per page
    pub batch_size: usize,
}

impl PageRequest {
    /// Offset of the first record on this page
    pub fn start(&self) -> usize {
        self.page * self.batch_size
    }
}

/// Weather cell state for one row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowWeather {
    /// Forecast lookup has not resolved yet
    Loading,
    /// Both bounds known
    Available { min: i32, max: i32 },
    /// Lookup failed or forecast was empty
    NotAvailable,
}

/// Accumulated browsing state for the current search term
#[derive(Debug, Clone)]
pub struct CityBrowser {
    batch_size: usize,
    search: String,
    generation: u64,
    next_page: usize,
    cities: Vec<City>,
    seen: HashSet<String>,
    weather: HashMap<String, WeatherSummary>,
    in_flight: bool,
    exhausted: bool,
    paused: bool,
    last_error: Option<String>,
}

impl CityBrowser {
    /// Creates an empty browser for the empty search term.
    ///
    /// A zero batch size is bumped to one.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            search: String::new(),
            generation: 0,
            next_page: 0,
            cities: Vec::new(),
            seen: HashSet::new(),
            weather: HashMap::new(),
            in_flight: false,
            exhausted: false,
            paused: false,
            last_error: None,
        }
    }

    /// Current search term
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Current search generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Accumulated cities in load order
    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    /// Whether a page fetch is outstanding
    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    /// Whether the upstream ran out of results for this search
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Error from the last failed page, if paging is paused
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Switches to a new search term.
    ///
    /// Returns `false` and changes nothing when the term is unchanged.
    /// Otherwise the list, the weather map and the cursor are reset and any
    /// outstanding page is abandoned.
    pub fn set_search(&mut self, term: &str) -> bool {
        if term == self.search {
            return false;
        }

        self.search = term.to_string();
        self.restart();
        true
    }

    /// Drops all accumulated state and starts the current search over
    pub fn restart(&mut self) {
        self.generation += 1;
        self.next_page = 0;
        self.cities.clear();
        self.seen.clear();
        self.weather.clear();
        self.in_flight = false;
        self.exhausted = false;
        self.paused = false;
        self.last_error = None;
    }

    /// Pulls the next page request, if one may be issued now.
    ///
    /// Returns `None` while a page is in flight, after the results are
    /// exhausted, or while paused after a failure.
    pub fn request_next_page(&mut self) -> Option<PageRequest> {
        if self.in_flight || self.exhausted || self.paused {
            return None;
        }

        self.in_flight = true;
        Some(PageRequest {
            generation: self.generation,
            query: self.search.clone(),
            page: self.next_page,
            batch_size: self.batch_size,
        })
    }

    /// Merges a fetched page.
    ///
    /// Cities whose identifier was already seen are skipped. Returns the
    /// newly merged cities, which still need their forecast lookup. Pages
    /// from a stale generation are ignored and yield nothing.
    pub fn apply_page(&mut self, generation: u64, page: usize, records: Vec<City>) -> Vec<City> {
        if generation != self.generation || !self.in_flight || page != self.next_page {
            return Vec::new();
        }

        self.in_flight = false;
        self.next_page += 1;
        if records.len() < self.batch_size {
            self.exhausted = true;
        }

        let mut fresh = Vec::new();
        for city in records {
            if self.seen.insert(city.id.clone()) {
                fresh.push(city);
            }
        }
        self.cities.extend(fresh.iter().cloned());

        fresh
    }

    /// Records a failed page fetch and pauses paging until [`resume`](Self::resume)
    pub fn page_failed(&mut self, generation: u64, error: impl Into<String>) {
        if generation != self.generation {
            return;
        }

        self.in_flight = false;
        self.paused = true;
        self.last_error = Some(error.into());
    }

    /// Clears a failure pause so the next pull may fetch again
    pub fn resume(&mut self) {
        self.paused = false;
        self.last_error = None;
    }

    /// Stores the forecast summary for a city.
    ///
    /// Returns `false` if the result belongs to a stale generation or to a
    /// city not in the list.
    pub fn apply_summary(&mut self, generation: u64, city_id: &str, summary: WeatherSummary) -> bool {
        if generation != self.generation || !self.seen.contains(city_id) {
            return false;
        }

        self.weather.insert(city_id.to_string(), summary);
        true
    }

    /// Summary recorded for a city, if its lookup has resolved
    pub fn summary(&self, city_id: &str) -> Option<&WeatherSummary> {
        self.weather.get(city_id)
    }

    /// Weather cell state for a city
    pub fn row_weather(&self, city_id: &str) -> RowWeather {
        match self.weather.get(city_id) {
            None => RowWeather::Loading,
            Some(WeatherSummary {
                min: Some(min),
                max: Some(max),
            }) => RowWeather::Available {
                min: *min,
                max: *max,
            },
            Some(_) => RowWeather::NotAvailable,
        }
    }

    /// Number of cities whose forecast lookup is still outstanding
    pub fn pending_summaries(&self) -> usize {
        self.cities.len() - self.weather.len()
    }
}

impl Default for CityBrowser {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

//! Application state management for City Weather CLI
//!
//! This module contains the main application state, handling keyboard input,
//! applying background load results, and state transitions between the city
//! table and the detail view.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::browser::CityBrowser;
use crate::cli::StartupConfig;
use crate::data::City;
use crate::detail::DetailState;
use crate::loader::{LoadHandle, LoadMessage, Loader};

/// Rows from the end of the list at which the next page is requested
pub const SENTINEL_ROWS: usize = 10;

/// Rows moved by PageUp/PageDown
const PAGE_JUMP: usize = 10;

/// Application state enum representing the current view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// Searchable city table
    Browser,
    /// Detail view for a city identifier
    Detail(String),
}

/// Whether keystrokes edit the search box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

/// Main application struct managing state and data
pub struct App {
    /// Current application state/view
    pub state: AppState,
    /// Whether the search box has focus
    pub input_mode: InputMode,
    /// Search box contents, committed with Enter
    pub search_input: String,
    /// Accumulated cities and summaries for the current search
    pub browser: CityBrowser,
    /// Index of the selected row in the city table
    pub selected_index: usize,
    /// State of the current detail lookup
    pub detail: DetailState,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    loader: Loader,
    messages: LoadHandle,
}

impl App {
    /// Creates a new App showing the city table for the empty search
    pub fn new(loader: Loader, messages: LoadHandle, batch_size: usize) -> Self {
        Self {
            state: AppState::Browser,
            input_mode: InputMode::Normal,
            search_input: String::new(),
            browser: CityBrowser::new(batch_size),
            selected_index: 0,
            detail: DetailState::Loading,
            should_quit: false,
            show_help: false,
            loader,
            messages,
        }
    }

    /// Creates a new App with the given startup configuration.
    ///
    /// Applies the initial search term and, with `--city`, starts the detail
    /// lookup right away.
    pub fn with_startup_config(
        loader: Loader,
        messages: LoadHandle,
        config: &StartupConfig,
    ) -> Self {
        let mut app = Self::new(loader, messages, config.batch_size);

        app.search_input = config.initial_search.clone();
        app.browser.set_search(&config.initial_search);

        if let Some(city_id) = &config.open_city {
            app.open_detail(city_id.clone());
        }

        app
    }

    /// Returns the currently selected city, if any
    pub fn selected_city(&self) -> Option<&City> {
        self.browser.cities().get(self.selected_index)
    }

    /// Whether the bottom of the table is close enough to load more rows.
    ///
    /// An empty table always shows the sentinel.
    pub fn sentinel_visible(&self) -> bool {
        self.selected_index + SENTINEL_ROWS >= self.browser.cities().len()
    }

    /// Issues the next page fetch if the table wants more rows
    pub fn pump(&mut self) {
        if self.state != AppState::Browser || !self.sentinel_visible() {
            return;
        }

        if let Some(request) = self.browser.request_next_page() {
            self.loader.fetch_page(request);
        }
    }

    /// Applies every message that background tasks have delivered so far
    pub fn process_messages(&mut self) {
        while let Some(message) = self.messages.try_recv() {
            self.handle_message(message);
        }
    }

    /// Waits for one background message and applies it
    pub async fn next_message(&mut self) -> bool {
        match self.messages.recv().await {
            Some(message) => {
                self.handle_message(message);
                true
            }
            None => false,
        }
    }

    /// Applies one background result to the application state
    pub fn handle_message(&mut self, message: LoadMessage) {
        match message {
            LoadMessage::PageLoaded {
                generation,
                page,
                cities,
            } => {
                let fresh = self.browser.apply_page(generation, page, cities);
                self.loader.enrich(generation, fresh);
            }
            LoadMessage::PageFailed {
                generation, error, ..
            } => {
                self.browser.page_failed(generation, error);
            }
            LoadMessage::SummaryReady {
                generation,
                city_id,
                summary,
            } => {
                self.browser.apply_summary(generation, &city_id, summary);
            }
            LoadMessage::DetailReady { city_id, state } => {
                let current = matches!(&self.state, AppState::Detail(id) if *id == city_id);
                if current && !self.detail.is_terminal() {
                    self.detail = state;
                }
            }
        }
    }

    /// Switches to the detail view for `city_id` and starts its lookup
    pub fn open_detail(&mut self, city_id: String) {
        self.detail = DetailState::Loading;
        self.state = AppState::Detail(city_id.clone());
        self.loader.load_detail(city_id);
    }

    /// Commits the search box, resetting the table if the term changed
    fn commit_search(&mut self) {
        let term = self.search_input.trim().to_string();
        if self.browser.set_search(&term) {
            self.selected_index = 0;
        }
        self.search_input = term;
        self.input_mode = InputMode::Normal;
    }

    /// Handles keyboard input and updates state accordingly
    ///
    /// # Key Bindings
    /// - `q` or `Esc` (in Browser): Quit the application
    /// - `Up`/`k`, `Down`/`j`, `PgUp`, `PgDn`, `g`, `G`: Move selection
    /// - `/`: Edit the search term (Enter commits, Esc cancels)
    /// - `Enter`: Open the selected city's detail view
    /// - `r`: Resume loading after a failed page / reload the detail view
    /// - `Esc` (in Detail): Go back to the city table
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        if key_event.modifiers.contains(KeyModifiers::CONTROL)
            && key_event.code == KeyCode::Char('c')
        {
            self.should_quit = true;
            return;
        }

        // Help overlay intercepts all keys when shown
        if self.show_help {
            if matches!(
                key_event.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
            ) {
                self.show_help = false;
            }
            return;
        }

        if self.input_mode == InputMode::Search {
            self.handle_search_key(key_event);
            return;
        }

        match self.state.clone() {
            AppState::Browser => match key_event.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.should_quit = true;
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.move_selection_up(1);
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.move_selection_down(1);
                }
                KeyCode::PageUp => {
                    self.move_selection_up(PAGE_JUMP);
                }
                KeyCode::PageDown => {
                    self.move_selection_down(PAGE_JUMP);
                }
                KeyCode::Char('g') | KeyCode::Home => {
                    self.selected_index = 0;
                }
                KeyCode::Char('G') | KeyCode::End => {
                    self.selected_index = self.browser.cities().len().saturating_sub(1);
                }
                KeyCode::Enter => {
                    if let Some(city) = self.selected_city() {
                        let id = city.id.clone();
                        self.open_detail(id);
                    }
                }
                KeyCode::Char('/') => {
                    self.input_mode = InputMode::Search;
                }
                KeyCode::Char('r') => {
                    self.browser.resume();
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                }
                _ => {}
            },
            AppState::Detail(city_id) => match key_event.code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                }
                KeyCode::Esc | KeyCode::Backspace => {
                    self.state = AppState::Browser;
                }
                KeyCode::Char('r') => {
                    self.open_detail(city_id);
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                }
                _ => {}
            },
        }
    }

    /// Edits the search box while it has focus
    fn handle_search_key(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Enter => {
                self.commit_search();
            }
            KeyCode::Esc => {
                self.search_input = self.browser.search().to_string();
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Backspace => {
                self.search_input.pop();
            }
            KeyCode::Char(c) => {
                self.search_input.push(c);
            }
            _ => {}
        }
    }

    /// Moves the selection up, stopping at the first row
    fn move_selection_up(&mut self, rows: usize) {
        self.selected_index = self.selected_index.saturating_sub(rows);
    }

    /// Moves the selection down, stopping at the last loaded row
    fn move_selection_down(&mut self, rows: usize) {
        let last = self.browser.cities().len().saturating_sub(1);
        self.selected_index = (self.selected_index + rows).min(last);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ApiKey, GeonamesClient, WeatherClient, WeatherSummary};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use reqwest::Client;

    /// Helper to create a KeyEvent for testing
    fn key_event(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    /// App whose clients point at a closed port; spawned fetches fail quietly
    fn test_app(batch_size: usize) -> App {
        let http = Client::new();
        let geonames = GeonamesClient::new(http.clone()).with_base_url("http://127.0.0.1:9/search");
        let weather =
            WeatherClient::new(http, ApiKey::new("test")).with_base_url("http://127.0.0.1:9");
        let (loader, handle) = Loader::new(geonames, weather);
        App::new(loader, handle, batch_size)
    }

    fn city(id: &str) -> City {
        City {
            id: id.to_string(),
            name: format!("City {}", id),
            country: "Testland".to_string(),
            timezone: "UTC".to_string(),
            coordinates: None,
        }
    }

    /// Pulls a page request and feeds back `ids` as its result
    fn load_page(app: &mut App, ids: &[&str]) {
        let request = app
            .browser
            .request_next_page()
            .expect("page should be requestable");
        app.handle_message(LoadMessage::PageLoaded {
            generation: request.generation,
            page: request.page,
            cities: ids.iter().map(|id| city(id)).collect(),
        });
    }

    #[tokio::test]
    async fn test_new_app_starts_in_browser() {
        let app = test_app(3);
        assert_eq!(app.state, AppState::Browser);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.browser.cities().is_empty());
        assert!(!app.should_quit);
    }

    #[tokio::test]
    async fn test_pump_requests_first_page_once() {
        let mut app = test_app(3);
        assert!(app.sentinel_visible());

        app.pump();
        assert!(app.browser.is_loading());

        let generation = app.browser.generation();
        app.pump();
        assert!(app.browser.is_loading());
        assert_eq!(app.browser.generation(), generation);
    }

    #[tokio::test]
    async fn test_pump_is_idle_in_detail_view() {
        let mut app = test_app(3);
        app.state = AppState::Detail("1".to_string());
        app.pump();
        assert!(!app.browser.is_loading());
    }

    #[tokio::test]
    async fn test_sentinel_follows_selection() {
        let ids: Vec<String> = (0..30).map(|i| i.to_string()).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let mut app = test_app(30);
        load_page(&mut app, &id_refs);

        assert!(!app.sentinel_visible());
        app.selected_index = 25;
        assert!(app.sentinel_visible());
    }

    #[tokio::test]
    async fn test_page_loaded_merges_without_duplicates() {
        let mut app = test_app(2);
        load_page(&mut app, &["1", "2"]);
        load_page(&mut app, &["2", "3"]);

        let ids: Vec<&str> = app.browser.cities().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_summary_ready_is_applied() {
        let mut app = test_app(2);
        load_page(&mut app, &["1", "2"]);

        app.handle_message(LoadMessage::SummaryReady {
            generation: app.browser.generation(),
            city_id: "1".to_string(),
            summary: WeatherSummary {
                min: Some(3),
                max: Some(9),
            },
        });

        assert_eq!(
            app.browser.summary("1"),
            Some(&WeatherSummary {
                min: Some(3),
                max: Some(9)
            })
        );
        assert!(app.browser.summary("2").is_none());
    }

    #[tokio::test]
    async fn test_page_failed_records_error() {
        let mut app = test_app(2);
        let request = app.browser.request_next_page().unwrap();
        app.handle_message(LoadMessage::PageFailed {
            generation: request.generation,
            page: request.page,
            error: "HTTP 503".to_string(),
        });

        assert_eq!(app.browser.last_error(), Some("HTTP 503"));
        app.handle_key(key_event(KeyCode::Char('r')));
        assert!(app.browser.last_error().is_none());
    }

    #[tokio::test]
    async fn test_search_mode_commit_resets_table() {
        let mut app = test_app(2);
        load_page(&mut app, &["1", "2"]);
        app.selected_index = 1;

        app.handle_key(key_event(KeyCode::Char('/')));
        assert_eq!(app.input_mode, InputMode::Search);
        for c in "oslo".chars() {
            app.handle_key(key_event(KeyCode::Char(c)));
        }
        // Keys are text while searching
        assert!(!app.should_quit);
        assert_eq!(app.search_input, "oslo");

        app.handle_key(key_event(KeyCode::Enter));
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.browser.search(), "oslo");
        assert!(app.browser.cities().is_empty());
        assert_eq!(app.selected_index, 0);
    }

    #[tokio::test]
    async fn test_search_mode_escape_cancels_edit() {
        let mut app = test_app(2);
        app.handle_key(key_event(KeyCode::Char('/')));
        app.handle_key(key_event(KeyCode::Char('x')));
        app.handle_key(key_event(KeyCode::Backspace));
        app.handle_key(key_event(KeyCode::Char('y')));
        app.handle_key(key_event(KeyCode::Esc));

        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.search_input, "");
        assert_eq!(app.browser.search(), "");
    }

    #[tokio::test]
    async fn test_stale_page_after_search_change_is_dropped() {
        let mut app = test_app(2);
        let stale = app.browser.request_next_page().unwrap();

        app.search_input = "lima".to_string();
        app.input_mode = InputMode::Search;
        app.handle_key(key_event(KeyCode::Enter));

        app.handle_message(LoadMessage::PageLoaded {
            generation: stale.generation,
            page: stale.page,
            cities: vec![city("1")],
        });
        assert!(app.browser.cities().is_empty());
    }

    #[tokio::test]
    async fn test_enter_opens_detail_for_selected_city() {
        let mut app = test_app(3);
        load_page(&mut app, &["10", "20", "30"]);
        app.handle_key(key_event(KeyCode::Down));

        app.handle_key(key_event(KeyCode::Enter));
        assert_eq!(app.state, AppState::Detail("20".to_string()));
        assert_eq!(app.detail, DetailState::Loading);
    }

    #[tokio::test]
    async fn test_enter_on_empty_table_does_nothing() {
        let mut app = test_app(3);
        app.handle_key(key_event(KeyCode::Enter));
        assert_eq!(app.state, AppState::Browser);
    }

    #[tokio::test]
    async fn test_detail_ready_for_other_city_is_ignored() {
        let mut app = test_app(3);
        app.open_detail("1".to_string());

        app.handle_message(LoadMessage::DetailReady {
            city_id: "2".to_string(),
            state: DetailState::NotFound,
        });
        assert_eq!(app.detail, DetailState::Loading);

        app.handle_message(LoadMessage::DetailReady {
            city_id: "1".to_string(),
            state: DetailState::NotFound,
        });
        assert_eq!(app.detail, DetailState::NotFound);
    }

    #[tokio::test]
    async fn test_detail_terminal_state_is_kept() {
        let mut app = test_app(3);
        app.open_detail("1".to_string());
        app.handle_message(LoadMessage::DetailReady {
            city_id: "1".to_string(),
            state: DetailState::NotFound,
        });
        app.handle_message(LoadMessage::DetailReady {
            city_id: "1".to_string(),
            state: DetailState::Error("late".to_string()),
        });
        assert_eq!(app.detail, DetailState::NotFound);
    }

    #[tokio::test]
    async fn test_detail_reload_restarts_from_loading() {
        let mut app = test_app(3);
        app.open_detail("1".to_string());
        app.handle_message(LoadMessage::DetailReady {
            city_id: "1".to_string(),
            state: DetailState::Error("boom".to_string()),
        });

        app.handle_key(key_event(KeyCode::Char('r')));
        assert_eq!(app.detail, DetailState::Loading);
        assert_eq!(app.state, AppState::Detail("1".to_string()));
    }

    #[tokio::test]
    async fn test_esc_in_detail_returns_to_browser() {
        let mut app = test_app(3);
        load_page(&mut app, &["1"]);
        app.open_detail("1".to_string());

        app.handle_key(key_event(KeyCode::Esc));
        assert_eq!(app.state, AppState::Browser);
        assert!(!app.should_quit);
        assert_eq!(app.browser.cities().len(), 1);
    }

    #[tokio::test]
    async fn test_selection_stops_at_bounds() {
        let mut app = test_app(3);
        load_page(&mut app, &["1", "2", "3"]);

        app.handle_key(key_event(KeyCode::Up));
        assert_eq!(app.selected_index, 0);

        app.handle_key(key_event(KeyCode::PageDown));
        assert_eq!(app.selected_index, 2);

        app.handle_key(key_event(KeyCode::Char('g')));
        assert_eq!(app.selected_index, 0);

        app.handle_key(key_event(KeyCode::Char('G')));
        assert_eq!(app.selected_index, 2);
    }

    #[tokio::test]
    async fn test_help_overlay_intercepts_keys() {
        let mut app = test_app(3);
        app.handle_key(key_event(KeyCode::Char('?')));
        assert!(app.show_help);

        app.handle_key(key_event(KeyCode::Char('/')));
        assert_eq!(app.input_mode, InputMode::Normal);

        app.handle_key(key_event(KeyCode::Char('q')));
        assert!(!app.show_help);
        assert!(!app.should_quit);
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let mut app = test_app(3);
        app.handle_key(key_event(KeyCode::Char('q')));
        assert!(app.should_quit);

        let mut app = test_app(3);
        app.input_mode = InputMode::Search;
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }
}

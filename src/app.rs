//! Application state and event handling.
//!
//! A single App struct owns everything for the session: the dataset and its
//! lookups are written once when the load completes, the filter state and the
//! color cache are the only mutable parts afterwards. Every input event
//! mutates exactly one filter dimension; the next frame re-filters and
//! redraws in full.

#![allow(dead_code)]

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::data::{DataCommand, DataMessage};
use crate::filter::{
    filter_records, indication_suggestions, unique_companies, FilterState, View,
};
use crate::models::{DatasetMeta, TrialRecord};
use crate::theme::CompanyPalette;

/// Input mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Normal navigation mode
    #[default]
    Normal,
    /// Typing into the free-text search field
    Search,
    /// Typing into the indication field
    Indication,
}

/// Error popup state
#[derive(Debug, Clone)]
pub struct ErrorPopup {
    pub title: String,
    pub message: String,
    /// When the error was shown
    pub shown_at: Instant,
    /// Auto-dismiss duration (None for manual dismiss)
    pub auto_dismiss: Option<Duration>,
}

impl ErrorPopup {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            shown_at: Instant::now(),
            auto_dismiss: Some(Duration::from_secs(5)),
        }
    }

    pub fn should_dismiss(&self) -> bool {
        self.auto_dismiss
            .map_or(false, |duration| self.shown_at.elapsed() > duration)
    }
}

/// Log entry for the system log pane — the session's diagnostic channel.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: Instant,
    pub message: String,
    pub level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            timestamp: Instant::now(),
            message: message.into(),
            level: LogLevel::Info,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            timestamp: Instant::now(),
            message: message.into(),
            level: LogLevel::Success,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            timestamp: Instant::now(),
            message: message.into(),
            level: LogLevel::Warning,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            timestamp: Instant::now(),
            message: message.into(),
            level: LogLevel::Error,
        }
    }
}

/// Main application state
#[derive(Debug)]
pub struct App {
    /// Whether the application should quit
    pub should_quit: bool,

    /// Current input mode
    pub input_mode: InputMode,

    /// Trial records, write-once at load
    pub trials: Vec<TrialRecord>,

    /// Company lookup and category labels, write-once at load
    pub meta: DatasetMeta,

    /// Distinct sponsor keys for the company selector, derived at load
    pub companies: Vec<String>,

    /// Indication autocomplete entries, derived at load
    pub suggestions: Vec<String>,

    /// The user's current query
    pub filters: FilterState,

    /// Company selector position: 0 = all, i = companies[i - 1]
    pub company_idx: usize,

    /// Memoized sponsor colors
    pub palette: CompanyPalette,

    /// Selected index within the filtered set
    pub selected: usize,

    /// System log messages
    pub logs: Vec<LogEntry>,
    /// Maximum number of log entries to keep
    max_logs: usize,

    /// Current error popup (if any)
    pub error_popup: Option<ErrorPopup>,

    /// Show help overlay
    pub show_help: bool,

    /// A dataset has been loaded this session
    pub loaded: bool,

    /// A load is in flight
    pub is_loading: bool,

    /// The initial load failed and nothing is shown
    pub load_failed: bool,

    /// Last successful load time
    pub last_refresh: Option<Instant>,

    /// Frame counter
    pub frame_count: u64,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Create a new application instance
    pub fn new() -> Self {
        let mut app = Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            trials: Vec::new(),
            meta: DatasetMeta::default(),
            companies: Vec::new(),
            suggestions: Vec::new(),
            filters: FilterState::default(),
            company_idx: 0,
            palette: CompanyPalette::new(),
            selected: 0,
            logs: Vec::new(),
            max_logs: 100,
            error_popup: None,
            show_help: false,
            loaded: false,
            is_loading: true,
            load_failed: false,
            last_refresh: None,
            frame_count: 0,
        };

        app.log(LogEntry::info("trialscope initialized"));
        app.log(LogEntry::info("Loading pipeline dataset..."));
        app
    }

    /// Add a log entry
    pub fn log(&mut self, entry: LogEntry) {
        self.logs.push(entry);
        if self.logs.len() > self.max_logs {
            self.logs.remove(0);
        }
    }

    /// Show an error popup and record it in the system log
    pub fn show_error(&mut self, title: impl Into<String>, message: impl Into<String>) {
        let title = title.into();
        let message = message.into();
        self.log(LogEntry::error(format!("{}: {}", title, message)));
        self.error_popup = Some(ErrorPopup::new(title, message));
    }

    pub fn dismiss_error(&mut self) {
        self.error_popup = None;
    }

    /// The filtered set feeding both views. None while the query is at its
    /// defaults (the engine is never invoked then) or before data arrives.
    pub fn visible_trials(&self) -> Option<Vec<&TrialRecord>> {
        if !self.loaded || self.filters.is_default_query() {
            return None;
        }
        Some(filter_records(&self.trials, &self.filters))
    }

    fn visible_len(&self) -> usize {
        self.visible_trials().map_or(0, |v| v.len())
    }

    /// Label for the company selector's current position.
    pub fn company_label(&self) -> String {
        match &self.filters.company {
            None => "All Organizations".to_string(),
            Some(key) => self.meta.company_label(key),
        }
    }

    /// Suggestions matching the indication input, for the autocomplete popup.
    pub fn matching_suggestions(&self) -> Vec<&str> {
        let needle = self.filters.indication_text.trim().to_lowercase();
        self.suggestions
            .iter()
            .filter(|s| needle.is_empty() || s.to_lowercase().contains(&needle))
            .take(8)
            .map(String::as_str)
            .collect()
    }

    /// Handle messages from the loader worker
    pub fn handle_data_message(&mut self, message: DataMessage) {
        match message {
            DataMessage::DatasetLoaded(dataset) => {
                let count = dataset.trials.len();
                self.meta = dataset.metadata;
                self.trials = dataset.trials;
                self.companies = unique_companies(&self.trials);
                self.suggestions =
                    indication_suggestions(&self.trials, &self.meta.cancer_groups);
                self.sync_company_selector();
                self.selected = 0;
                self.loaded = true;
                self.is_loading = false;
                self.load_failed = false;
                self.last_refresh = Some(Instant::now());
                self.log(LogEntry::success(format!(
                    "Loaded {} trial records across {} sponsors",
                    count,
                    self.companies.len()
                )));
            }
            DataMessage::Error(error) => {
                self.is_loading = false;
                if !self.loaded {
                    self.load_failed = true;
                }
                self.show_error("Dataset Load Failed", error);
            }
        }
    }

    /// Keep the selector index pointing at the filtered company after a
    /// reload; fall back to "all" if the key vanished from the data.
    fn sync_company_selector(&mut self) {
        match &self.filters.company {
            Some(key) => match self.companies.iter().position(|c| c == key) {
                Some(pos) => self.company_idx = pos + 1,
                None => {
                    self.company_idx = 0;
                    self.filters.company = None;
                }
            },
            None => self.company_idx = 0,
        }
    }

    /// Handle key events and return an optional command for the loader worker
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<DataCommand> {
        // Handle error popup dismissal
        if self.error_popup.is_some() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char(' ')) {
                self.dismiss_error();
            }
            return None;
        }

        // Handle help overlay
        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Enter) {
                self.show_help = false;
            }
            return None;
        }

        match self.input_mode {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::Search | InputMode::Indication => {
                self.handle_text_key(key);
                None
            }
        }
    }

    /// Handle keys in normal mode
    fn handle_normal_key(&mut self, key: KeyEvent) -> Option<DataCommand> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
                return Some(DataCommand::Shutdown);
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return Some(DataCommand::Shutdown);
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            KeyCode::Char('r') => {
                self.is_loading = true;
                self.load_failed = false;
                self.log(LogEntry::info("Reloading dataset..."));
                return Some(DataCommand::Reload);
            }
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Search;
            }
            KeyCode::Char('i') => {
                self.input_mode = InputMode::Indication;
            }
            KeyCode::Char('c') => {
                self.cycle_company(true);
            }
            KeyCode::Char('C') => {
                self.cycle_company(false);
            }
            KeyCode::Char('a') => {
                self.filters.domain_area = self.filters.domain_area.next();
                self.selected = 0;
            }
            KeyCode::Char('o') => {
                self.filters.role = self.filters.role.next();
                self.selected = 0;
            }
            KeyCode::Char('g') => {
                self.filters.view = View::Grid;
            }
            KeyCode::Char('t') => {
                self.filters.view = View::Timeline;
            }
            KeyCode::Tab => {
                self.filters.view = self.filters.view.toggle();
            }
            KeyCode::Char('x') => {
                self.filters.clear();
                self.company_idx = 0;
                self.selected = 0;
                self.log(LogEntry::info("Filters cleared"));
            }
            KeyCode::Char('j') | KeyCode::Down => {
                let total = self.visible_len();
                if total > 0 {
                    self.selected = (self.selected + 1) % total;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                let total = self.visible_len();
                if total > 0 {
                    self.selected = self.selected.checked_sub(1).unwrap_or(total - 1);
                }
            }
            KeyCode::Home => {
                self.selected = 0;
            }
            KeyCode::End => {
                self.selected = self.visible_len().saturating_sub(1);
            }
            _ => {}
        }

        None
    }

    /// Handle keys while typing into the search or indication field
    fn handle_text_key(&mut self, key: KeyEvent) {
        let field = match self.input_mode {
            InputMode::Search => &mut self.filters.search_text,
            InputMode::Indication => &mut self.filters.indication_text,
            InputMode::Normal => return,
        };

        match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Backspace => {
                field.pop();
                self.selected = 0;
            }
            KeyCode::Char(c) => {
                field.push(c);
                self.selected = 0;
            }
            _ => {}
        }
    }

    fn cycle_company(&mut self, forward: bool) {
        let options = self.companies.len() + 1;
        if options == 1 {
            return;
        }
        self.company_idx = if forward {
            (self.company_idx + 1) % options
        } else {
            (self.company_idx + options - 1) % options
        };
        self.filters.company = if self.company_idx == 0 {
            None
        } else {
            Some(self.companies[self.company_idx - 1].clone())
        };
        self.selected = 0;
    }

    /// Per-frame housekeeping
    pub fn tick(&mut self) {
        self.frame_count = self.frame_count.wrapping_add(1);

        if let Some(ref popup) = self.error_popup {
            if popup.should_dismiss() {
                self.error_popup = None;
            }
        }
    }

    /// Get the status bar text
    pub fn status_text(&self) -> String {
        let state = if self.is_loading {
            "Loading..."
        } else if self.load_failed {
            "Load failed"
        } else if self.loaded {
            "Ready"
        } else {
            "No data"
        };

        let last_refresh = self
            .last_refresh
            .map(|t| {
                let secs = t.elapsed().as_secs();
                if secs < 60 {
                    format!(" ({}s ago)", secs)
                } else {
                    format!(" ({}m ago)", secs / 60)
                }
            })
            .unwrap_or_default();

        format!(
            "{}{} | {} records | {} view | ?: Help | x: Clear | r: Reload | q: Quit",
            state,
            last_refresh,
            self.trials.len(),
            self.filters.view.name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Dataset;

    fn loaded_app() -> App {
        let mut app = App::new();
        let doc = r#"{
            "metadata": {
                "company_map": { "ACME": { "name": "Acme Therapeutics", "ticker": "ACME" } },
                "cancer_groups": ["Lung Cancer"]
            },
            "trials": [
                { "nct_id": "NCT001", "title": "Trial of Drug X", "indications": "NSCLC",
                  "phase": "PHASE3", "is_malignancy": true, "major_category": "Lung Cancer",
                  "actual_company": "ACME",
                  "start_date_iso": "2021-01-01", "completion_date_iso": "2024-06-01" },
                { "nct_id": "NCT002", "title": "Dermatitis Study", "indications": "Atopic Dermatitis",
                  "phase": "PHASE2", "is_malignancy": false, "actual_company": "ZETA" }
            ]
        }"#;
        let dataset: Dataset = serde_json::from_str(doc).unwrap();
        app.handle_data_message(DataMessage::DatasetLoaded(dataset));
        app
    }

    #[test]
    fn test_default_query_never_filters() {
        let app = loaded_app();
        assert!(app.loaded);
        // All primary dimensions at defaults: the engine is not invoked.
        assert!(app.visible_trials().is_none());
    }

    #[test]
    fn test_search_activates_query() {
        let mut app = loaded_app();
        app.filters.search_text = "drug x".to_string();
        let visible = app.visible_trials().unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].nct_id, "NCT001");
    }

    #[test]
    fn test_company_cycle_wraps() {
        let mut app = loaded_app();
        assert_eq!(app.companies, vec!["ACME", "ZETA"]);

        app.cycle_company(true);
        assert_eq!(app.filters.company.as_deref(), Some("ACME"));
        app.cycle_company(true);
        assert_eq!(app.filters.company.as_deref(), Some("ZETA"));
        app.cycle_company(true);
        assert_eq!(app.filters.company, None);

        app.cycle_company(false);
        assert_eq!(app.filters.company.as_deref(), Some("ZETA"));
    }

    #[test]
    fn test_company_selector_survives_reload() {
        let mut app = loaded_app();
        app.cycle_company(true); // ACME

        let dataset: Dataset = serde_json::from_str(
            r#"{"metadata": {"company_map": {}, "cancer_groups": []},
                "trials": [{"nct_id": "NCT003", "actual_company": "ZETA"}]}"#,
        )
        .unwrap();
        app.handle_data_message(DataMessage::DatasetLoaded(dataset));

        // ACME vanished from the data: selector falls back to all.
        assert_eq!(app.filters.company, None);
        assert_eq!(app.company_idx, 0);
    }

    #[test]
    fn test_load_failure_keeps_session_empty() {
        let mut app = App::new();
        app.handle_data_message(DataMessage::Error("connection refused".to_string()));
        assert!(!app.loaded);
        assert!(app.load_failed);
        assert!(app.error_popup.is_some());
        assert!(app.visible_trials().is_none());
    }

    #[test]
    fn test_text_input_routing() {
        let mut app = loaded_app();
        app.handle_key(KeyEvent::from(KeyCode::Char('/')));
        assert_eq!(app.input_mode, InputMode::Search);

        app.handle_key(KeyEvent::from(KeyCode::Char('n')));
        app.handle_key(KeyEvent::from(KeyCode::Char('c')));
        app.handle_key(KeyEvent::from(KeyCode::Char('t')));
        assert_eq!(app.filters.search_text, "nct");

        app.handle_key(KeyEvent::from(KeyCode::Backspace));
        assert_eq!(app.filters.search_text, "nc");

        app.handle_key(KeyEvent::from(KeyCode::Esc));
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_clear_resets_filters_and_selector() {
        let mut app = loaded_app();
        app.cycle_company(true);
        app.filters.search_text = "x".to_string();
        app.handle_key(KeyEvent::from(KeyCode::Char('x')));
        assert!(app.filters.is_default_query());
        assert_eq!(app.company_idx, 0);
    }

    #[test]
    fn test_selection_wraps_over_filtered_set() {
        let mut app = loaded_app();
        app.filters.domain_area = crate::filter::DomainArea::Oncology;
        assert_eq!(app.visible_len(), 1);

        app.handle_key(KeyEvent::from(KeyCode::Char('j')));
        assert_eq!(app.selected, 0); // single row wraps onto itself

        app.filters.domain_area = crate::filter::DomainArea::All;
        app.filters.search_text = "t".to_string();
        assert!(app.visible_len() >= 2);
        app.handle_key(KeyEvent::from(KeyCode::Char('j')));
        assert_eq!(app.selected, 1);
    }

    #[test]
    fn test_matching_suggestions_filtering() {
        let mut app = loaded_app();
        app.filters.indication_text = "lung".to_string();
        assert_eq!(app.matching_suggestions(), vec!["Lung Cancer"]);
    }
}

//! Per-keystroke query routing.
//!
//! [QueryRouter] is the mode state machine: an activation selects the
//! baseline (window switching or link execution), and every text change is
//! re-routed from scratch against the newly selected source. Switching
//! modes never filters the previous rows; the backing collection is always
//! rebuilt.
//!
//! Routing rules inside link mode, checked in order:
//! 1. path-shaped text enters the file explorer;
//! 2. `@key ` with a following space scopes to the web search entry whose
//!    key matches exactly (case-insensitive), the rest of the text becoming
//!    the `{word}` substitution on execution;
//! 3. `@...` without a space browses the whole web list;
//! 4. anything else substring-filters the executables, capped at 8 rows;
//! 5. empty text yields no rows.

use crate::app::snapshot::{QueryMode, ResultRow, ResultSnapshot};
use crate::config::lists::{FunctionKey, MacroAction, MacroBindings};
use crate::core::entry::{CandidateEntry, CandidateLists, IconRef};
use crate::core::explorer::{ExplorerEntry, FileExplorerNavigator};
use crate::core::filter::{IncrementalFilter, MAX_LINK_RESULTS};
use crate::core::shell::{HostShell, LaunchRequest};
use crate::core::windowing::{WindowInfo, apply_ignore_list};
use crate::utils::ensure_trailing_separator;

use std::path::Path;
use std::sync::Arc;

/// What Enter did, reported to the presenter. Only `Launched` and
/// `FocusWindow` close the launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteOutcome {
    /// The host shell accepted the launch.
    Launched,
    /// Window mode: the presenter focuses this window handle.
    FocusWindow(u64),
    /// Nothing selected, or the launch failed; the launcher stays open.
    Declined,
}

/// Backing data of one visible row, enough to execute it later.
#[derive(Debug, Clone)]
enum Row {
    Window(WindowInfo),
    Candidate(CandidateEntry),
    Explorer(ExplorerEntry),
}

/// The keystroke-to-results state machine.
pub struct QueryRouter {
    shell: Arc<dyn HostShell>,
    navigator: FileExplorerNavigator,
    macros: MacroBindings,
    ignored_titles: Vec<String>,
    mode: QueryMode,
    query: String,
    windows: Vec<WindowInfo>,
    lists: Arc<CandidateLists>,
    rows: Vec<Row>,
    selected: usize,
}

impl QueryRouter {
    pub fn new(
        shell: Arc<dyn HostShell>,
        navigator: FileExplorerNavigator,
        macros: MacroBindings,
        ignored_titles: Vec<String>,
    ) -> Self {
        QueryRouter {
            shell,
            navigator,
            macros,
            ignored_titles,
            mode: QueryMode::LinkExecute,
            query: String::new(),
            windows: Vec::new(),
            lists: Arc::new(CandidateLists::default()),
            rows: Vec::new(),
            selected: 0,
        }
    }

    /// Window-switch activation: takes the live window set from the host
    /// enumerator and shows it, minus the ignore list.
    pub fn activate_windows(&mut self, windows: Vec<WindowInfo>) -> ResultSnapshot {
        self.windows = apply_ignore_list(windows, &self.ignored_titles);
        self.mode = QueryMode::WindowSwitch;
        self.query.clear();
        self.route()
    }

    /// Link-execute activation over freshly loaded candidate lists.
    pub fn activate_links(&mut self, lists: Arc<CandidateLists>) -> ResultSnapshot {
        self.lists = lists;
        self.mode = QueryMode::LinkExecute;
        self.query.clear();
        self.route()
    }

    /// Routes one text change.
    pub fn set_query(&mut self, query: &str) -> ResultSnapshot {
        self.query = query.to_string();
        self.route()
    }

    /// Applies the macro bound to a function key, if any. Unbound keys keep
    /// their default behavior (`None`).
    pub fn press_function_key(&mut self, key: FunctionKey) -> Option<ResultSnapshot> {
        if self.mode == QueryMode::WindowSwitch {
            return None;
        }
        let action = self.macros.get(key)?.clone();
        self.mode = QueryMode::MacroExecute;
        match action {
            MacroAction::NavigateToPath(path) => {
                // An existing directory gets its trailing separator so the
                // rewritten text lists the whole directory; the re-route then
                // works like any keystroke.
                let path = if Path::new(&path).is_dir() {
                    ensure_trailing_separator(&path)
                } else {
                    path
                };
                Some(self.set_query(&path))
            }
        }
    }

    /// Tab completion, explorer mode only.
    pub fn press_tab(&mut self) -> Option<ResultSnapshot> {
        if self.mode != QueryMode::FileExplorer {
            return None;
        }
        let selected = match self.rows.get(self.selected) {
            Some(Row::Explorer(entry)) => Some(entry.clone()),
            _ => None,
        };
        let completed = self.navigator.complete(&self.query, selected.as_ref())?;
        Some(self.set_query(&completed))
    }

    pub fn select_next(&mut self) -> ResultSnapshot {
        self.move_selection(1)
    }

    pub fn select_prev(&mut self) -> ResultSnapshot {
        self.move_selection(-1)
    }

    /// Executes the selected row through the host shell.
    pub fn execute(&self) -> ExecuteOutcome {
        let Some(row) = self.rows.get(self.selected) else {
            return ExecuteOutcome::Declined;
        };
        let request = match row {
            Row::Window(window) => return ExecuteOutcome::FocusWindow(window.handle()),
            Row::Candidate(entry) => candidate_request(entry, &self.query, self.mode),
            Row::Explorer(entry) => {
                if entry.is_directory_like() {
                    LaunchRequest::OpenDirectory(entry.path().to_path_buf())
                } else {
                    LaunchRequest::OpenPath(entry.path().to_string_lossy().into_owned())
                }
            }
        };
        match self.shell.launch(&request) {
            Ok(()) => ExecuteOutcome::Launched,
            Err(e) => {
                tracing::warn!("launch declined: {}", e);
                ExecuteOutcome::Declined
            }
        }
    }

    /// Rebuilds rows and mode from the current query. The single routing
    /// point every operation funnels through.
    fn route(&mut self) -> ResultSnapshot {
        if self.mode == QueryMode::WindowSwitch {
            let filter = IncrementalFilter::new(&self.query);
            self.rows = self
                .windows
                .iter()
                .filter(|w| filter.matches_pair(w.title(), w.process_title()))
                .cloned()
                .map(Row::Window)
                .collect();
        } else if is_path_query(&self.query) {
            self.mode = QueryMode::FileExplorer;
            self.rows = self
                .navigator
                .list(&self.query)
                .into_iter()
                .map(Row::Explorer)
                .collect();
        } else if let Some((key, _)) = web_scope(&self.query) {
            self.mode = QueryMode::WebSearchScoped;
            self.rows = self
                .lists
                .web_entries()
                .iter()
                .filter(|e| e.subtitle().eq_ignore_ascii_case(key))
                .cloned()
                .map(Row::Candidate)
                .collect();
        } else if let Some(browse) = self.query.strip_prefix('@') {
            // No space yet: browse the whole web list, filtered by the text
            // typed so far.
            self.mode = QueryMode::LinkExecute;
            let filter = IncrementalFilter::new(browse);
            self.rows = filter
                .select(self.lists.web_entries())
                .into_iter()
                .cloned()
                .map(Row::Candidate)
                .collect();
        } else if !self.query.is_empty() {
            self.mode = QueryMode::LinkExecute;
            let filter = IncrementalFilter::new(&self.query);
            self.rows = filter
                .select_capped(self.lists.executables(), MAX_LINK_RESULTS)
                .into_iter()
                .cloned()
                .map(Row::Candidate)
                .collect();
        } else {
            self.mode = QueryMode::LinkExecute;
            self.rows = Vec::new();
        }
        self.selected = 0;
        self.snapshot()
    }

    fn move_selection(&mut self, delta: isize) -> ResultSnapshot {
        if !self.rows.is_empty() {
            let len = self.rows.len() as isize;
            self.selected = (self.selected as isize + delta).rem_euclid(len) as usize;

            // Explorer selection mirrors the selected path into the text
            // box, skipping the synthetic parent row.
            if self.mode == QueryMode::FileExplorer
                && let Some(Row::Explorer(entry)) = self.rows.get(self.selected)
                && entry.title() != ".."
            {
                self.query = entry.path().to_string_lossy().into_owned();
            }
        }
        self.snapshot()
    }

    fn snapshot(&self) -> ResultSnapshot {
        let rows = self
            .rows
            .iter()
            .map(|row| match row {
                Row::Window(w) => ResultRow::new(
                    w.title().to_string(),
                    w.process_title().to_string(),
                    IconRef::shell_default(),
                ),
                Row::Candidate(e) => ResultRow::new(
                    e.title().to_string(),
                    e.subtitle().to_string(),
                    e.icon().clone(),
                ),
                Row::Explorer(e) => {
                    ResultRow::new(e.title().to_string(), e.subtitle().to_string(), e.icon())
                }
            })
            .collect();
        let selected = (!self.rows.is_empty()).then_some(self.selected);
        ResultSnapshot::new(self.mode, self.query.clone(), rows, selected)
    }
}

/// Builds the launch request for a candidate row, substituting `{word}`
/// with the trailing query text.
fn candidate_request(entry: &CandidateEntry, query: &str, mode: QueryMode) -> LaunchRequest {
    let word = trailing_word(query, mode);
    if entry.is_url() {
        return LaunchRequest::OpenUrl(substitute_word(entry.target(), &word));
    }
    LaunchRequest::Run {
        target: entry.target().to_string(),
        args: entry.argument().map(|a| substitute_word(a, &word)),
    }
}

/// The text substituted into `{word}`: everything after the scope key in
/// web-scoped mode, everything after the first space otherwise.
fn trailing_word(query: &str, mode: QueryMode) -> String {
    if mode == QueryMode::WebSearchScoped
        && let Some((_, rest)) = web_scope(query)
    {
        return rest.to_string();
    }
    query
        .split_once(' ')
        .map(|(_, rest)| rest.to_string())
        .unwrap_or_default()
}

fn substitute_word(template: &str, word: &str) -> String {
    template.replace("{word}", word)
}

/// `@key rest` with a space after the key selects a web scope.
fn web_scope(query: &str) -> Option<(&str, &str)> {
    let scoped = query.strip_prefix('@')?;
    let (key, rest) = scoped.split_once(' ')?;
    Some((key, rest))
}

/// Path-shaped queries: `:` alone, `X:` with anything after, or text rooted
/// at a separator.
fn is_path_query(query: &str) -> bool {
    if query == ":" || query.starts_with('/') || query.starts_with('\\') {
        return true;
    }
    let mut chars = query.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(c), Some(':')) if c.is_ascii_alphabetic()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error;

    #[test]
    fn path_query_detection() -> Result<(), Box<dyn error::Error>> {
        assert!(is_path_query(":"));
        assert!(is_path_query("c:"));
        assert!(is_path_query("C:\\Windows"));
        assert!(is_path_query("/tmp"));
        assert!(!is_path_query("notepad"));
        assert!(!is_path_query("@g search"));
        assert!(!is_path_query("1:30"));
        assert!(!is_path_query(""));
        Ok(())
    }

    #[test]
    fn web_scope_needs_a_space() -> Result<(), Box<dyn error::Error>> {
        assert_eq!(web_scope("@g search term"), Some(("g", "search term")));
        assert_eq!(web_scope("@g"), None);
        assert_eq!(web_scope("plain"), None);
        Ok(())
    }

    #[test]
    fn word_substitution() -> Result<(), Box<dyn error::Error>> {
        assert_eq!(
            substitute_word("https://example.com/?q={word}", "search term"),
            "https://example.com/?q=search term"
        );
        assert_eq!(substitute_word("no placeholder", "x"), "no placeholder");
        Ok(())
    }
}

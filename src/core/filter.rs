//! Incremental substring filtering over candidate collections.
//!
//! This is deliberately not a relevance engine: entries are returned in their
//! source order (first match wins ties) and the only match rule is a
//! case-insensitive substring test on title or subtitle. The plain launcher
//! filter additionally truncates to [MAX_LINK_RESULTS]; explorer and web
//! paths apply their own caps.

use crate::core::entry::CandidateEntry;

/// Hard cap for the plain launcher filter list.
pub const MAX_LINK_RESULTS: usize = 8;

/// One prepared query, reusable across rows of one keystroke.
///
/// The needle is lowercased once at construction so per-row matching only
/// lowercases the haystack side.
#[derive(Debug, Clone)]
pub struct IncrementalFilter {
    needle: String,
}

impl IncrementalFilter {
    pub fn new(query: &str) -> Self {
        IncrementalFilter {
            needle: query.to_lowercase(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    /// True when the title alone matches. An empty query matches everything.
    pub fn matches_title(&self, title: &str) -> bool {
        self.needle.is_empty() || title.to_lowercase().contains(&self.needle)
    }

    /// True when either display string matches. An empty query matches everything.
    pub fn matches_pair(&self, title: &str, subtitle: &str) -> bool {
        self.needle.is_empty()
            || title.to_lowercase().contains(&self.needle)
            || subtitle.to_lowercase().contains(&self.needle)
    }

    /// Selects matching entries in source order, uncapped.
    pub fn select<'a>(&self, entries: &'a [CandidateEntry]) -> Vec<&'a CandidateEntry> {
        entries
            .iter()
            .filter(|e| self.matches_pair(e.title(), e.subtitle()))
            .collect()
    }

    /// Selects matching entries in source order, keeping at most `cap`.
    pub fn select_capped<'a>(
        &self,
        entries: &'a [CandidateEntry],
        cap: usize,
    ) -> Vec<&'a CandidateEntry> {
        let mut out = self.select(entries);
        out.truncate(cap);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entry::IconRef;

    fn entry(title: &str, subtitle: &str) -> CandidateEntry {
        CandidateEntry::app(title, subtitle, "x", IconRef::shell_default())
            .expect("non-empty target")
    }

    #[test]
    fn matches_preserve_source_order() -> Result<(), Box<dyn std::error::Error>> {
        let entries = vec![
            entry("Notepad", ""),
            entry("OneNote", ""),
            entry("Calculator", ""),
        ];

        let filter = IncrementalFilter::new("note");
        let hits: Vec<&str> = filter.select(&entries).iter().map(|e| e.title()).collect();
        assert_eq!(hits, vec!["Notepad", "OneNote"]);
        Ok(())
    }

    #[test]
    fn subtitle_also_matches() -> Result<(), Box<dyn std::error::Error>> {
        let entries = vec![entry("Editor", "notepad"), entry("Paint", "mspaint")];

        let filter = IncrementalFilter::new("NOTE");
        let hits = filter.select(&entries);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title(), "Editor");
        Ok(())
    }

    #[test]
    fn cap_truncates_but_keeps_order() -> Result<(), Box<dyn std::error::Error>> {
        let entries: Vec<_> = (0..20).map(|i| entry(&format!("app {i}"), "")).collect();

        let filter = IncrementalFilter::new("app");
        let hits = filter.select_capped(&entries, MAX_LINK_RESULTS);
        assert_eq!(hits.len(), MAX_LINK_RESULTS);
        assert_eq!(hits[0].title(), "app 0");
        assert_eq!(hits[7].title(), "app 7");
        Ok(())
    }

    #[test]
    fn empty_query_matches_everything() -> Result<(), Box<dyn std::error::Error>> {
        let filter = IncrementalFilter::new("");
        assert!(filter.is_empty());
        assert!(filter.matches_pair("anything", ""));
        assert!(filter.matches_title("anything"));
        Ok(())
    }
}

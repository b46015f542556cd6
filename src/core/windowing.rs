//! Window switcher candidates.
//!
//! The live window set comes from an external enumerator; presto only
//! consumes the title, process title and handle of each window and never
//! enumerates windows itself. The ignore list drops windows whose title
//! matches one of the configured titles exactly, case-insensitively.

/// One row handed over by the host window enumerator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    handle: u64,
    title: String,
    process_title: String,
}

impl WindowInfo {
    pub fn new(handle: u64, title: impl Into<String>, process_title: impl Into<String>) -> Self {
        WindowInfo {
            handle,
            title: title.into(),
            process_title: process_title.into(),
        }
    }

    // Accessors

    #[inline]
    pub fn handle(&self) -> u64 {
        self.handle
    }

    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[inline]
    pub fn process_title(&self) -> &str {
        &self.process_title
    }
}

/// Drops windows whose title is on the ignore list. Order is preserved.
pub fn apply_ignore_list(windows: Vec<WindowInfo>, ignored_titles: &[String]) -> Vec<WindowInfo> {
    if ignored_titles.is_empty() {
        return windows;
    }
    windows
        .into_iter()
        .filter(|w| {
            !ignored_titles
                .iter()
                .any(|t| t.eq_ignore_ascii_case(w.title()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error;

    #[test]
    fn ignore_list_matches_exact_titles_case_insensitively() -> Result<(), Box<dyn error::Error>> {
        let windows = vec![
            WindowInfo::new(1, "Program Manager", "explorer"),
            WindowInfo::new(2, "notes - Editor", "editor"),
            WindowInfo::new(3, "Settings", "systemsettings"),
        ];
        let ignored = vec!["PROGRAM MANAGER".to_string()];

        let kept = apply_ignore_list(windows, &ignored);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].handle(), 2);
        assert_eq!(kept[1].handle(), 3);
        Ok(())
    }

    #[test]
    fn substring_titles_are_not_ignored() -> Result<(), Box<dyn error::Error>> {
        let windows = vec![WindowInfo::new(1, "Program Manager Tools", "x")];
        let ignored = vec!["Program Manager".to_string()];

        // Only exact matches are dropped.
        assert_eq!(apply_ignore_list(windows, &ignored).len(), 1);
        Ok(())
    }
}

//! Candidate entry data model for presto.
//!
//! Provides the [CandidateEntry] struct which is the unit of the launcher index,
//! and the [IconRef] descriptor attached to every entry.
//!
//! Entries are created during a load pass and are immutable afterwards; a new
//! pass always publishes a brand new collection instead of patching the old one.

/// Shell library every default icon reference points at.
pub const SHELL_ICON_LIBRARY: &str = "C:\\Windows\\System32\\shell32.dll";
/// Index of the generic application icon inside the shell library.
pub const SHELL_ICON_DEFAULT_INDEX: i32 = 2;
/// Index of the globe icon inside the shell library, used for web search entries.
pub const SHELL_ICON_WEB_INDEX: i32 = 13;

/// Lazy icon descriptor. No bitmap is decoded until first render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconRef {
    path: String,
    index: i32,
    is_default: bool,
}

impl IconRef {
    /// An icon stored in a concrete file, usually at index 0.
    pub fn new(path: impl Into<String>, index: i32) -> Self {
        IconRef {
            path: path.into(),
            index,
            is_default: false,
        }
    }

    /// The well-known fallback icon for entries without one of their own.
    pub fn shell_default() -> Self {
        IconRef {
            path: SHELL_ICON_LIBRARY.to_string(),
            index: SHELL_ICON_DEFAULT_INDEX,
            is_default: true,
        }
    }

    /// The globe icon attached to web search entries.
    pub fn shell_web() -> Self {
        IconRef {
            path: SHELL_ICON_LIBRARY.to_string(),
            index: SHELL_ICON_WEB_INDEX,
            is_default: true,
        }
    }

    // Accessors

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn index(&self) -> i32 {
        self.index
    }

    #[inline]
    pub fn is_default(&self) -> bool {
        self.is_default
    }
}

/// A single launchable candidate: an application shortcut, a UWP app,
/// a web search template, or a live filesystem entry.
///
/// `target` carries the action payload (path, URL, or template). It is never
/// empty; the constructors return `None` instead of storing a placeholder, so
/// entries that failed resolution are dropped rather than indexed.
#[derive(Debug, Clone)]
pub struct CandidateEntry {
    title: String,
    subtitle: String,
    target: String,
    argument: Option<String>,
    is_url: bool,
    icon: IconRef,
}

impl CandidateEntry {
    /// An entry launched as a process or shell-opened path.
    pub fn app(
        title: impl Into<String>,
        subtitle: impl Into<String>,
        target: impl Into<String>,
        icon: IconRef,
    ) -> Option<Self> {
        Self::build(title, subtitle, target, icon, false)
    }

    /// An entry whose target is a URL opened by the default browser.
    pub fn url(
        title: impl Into<String>,
        subtitle: impl Into<String>,
        target: impl Into<String>,
        icon: IconRef,
    ) -> Option<Self> {
        Self::build(title, subtitle, target, icon, true)
    }

    fn build(
        title: impl Into<String>,
        subtitle: impl Into<String>,
        target: impl Into<String>,
        icon: IconRef,
        is_url: bool,
    ) -> Option<Self> {
        let target = target.into();
        if target.is_empty() {
            return None;
        }
        Some(CandidateEntry {
            title: title.into(),
            subtitle: subtitle.into(),
            target,
            argument: None,
            is_url,
            icon,
        })
    }

    /// Attaches extra process arguments. `{word}` inside the argument is
    /// substituted with the trailing query text on execution.
    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.argument = Some(argument.into());
        self
    }

    // Accessors

    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[inline]
    pub fn subtitle(&self) -> &str {
        &self.subtitle
    }

    #[inline]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[inline]
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    #[inline]
    pub fn is_url(&self) -> bool {
        self.is_url
    }

    #[inline]
    pub fn icon(&self) -> &IconRef {
        &self.icon
    }
}

/// The two candidate collections one load pass publishes.
///
/// `executables` holds the shortcut scan results first, then the JSON-backed
/// UWP entries; `shortcut_count` records the split so a JSON-only reload can
/// keep the scanned prefix without re-walking the filesystem. A pass always
/// publishes a whole new value, swapped in atomically behind an `Arc`.
#[derive(Debug, Default)]
pub struct CandidateLists {
    executables: Vec<CandidateEntry>,
    web_entries: Vec<CandidateEntry>,
    shortcut_count: usize,
}

impl CandidateLists {
    pub fn new(
        shortcuts: Vec<CandidateEntry>,
        uwp: Vec<CandidateEntry>,
        web_entries: Vec<CandidateEntry>,
    ) -> Self {
        let shortcut_count = shortcuts.len();
        let mut executables = shortcuts;
        executables.extend(uwp);
        CandidateLists {
            executables,
            web_entries,
            shortcut_count,
        }
    }

    /// Rebuilds the lists from this one's scanned shortcut prefix plus fresh
    /// JSON contributions.
    pub fn with_fresh_json(
        &self,
        uwp: Vec<CandidateEntry>,
        web_entries: Vec<CandidateEntry>,
    ) -> Self {
        Self::new(
            self.executables[..self.shortcut_count].to_vec(),
            uwp,
            web_entries,
        )
    }

    // Accessors

    #[inline]
    pub fn executables(&self) -> &[CandidateEntry] {
        &self.executables
    }

    #[inline]
    pub fn web_entries(&self) -> &[CandidateEntry] {
        &self.web_entries
    }

    #[inline]
    pub fn shortcut_count(&self) -> usize {
        self.shortcut_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_with_empty_target_is_dropped() -> Result<(), Box<dyn std::error::Error>> {
        assert!(CandidateEntry::app("Notepad", "", "", IconRef::shell_default()).is_none());
        assert!(CandidateEntry::url("Search", "s", "", IconRef::shell_web()).is_none());
        Ok(())
    }

    #[test]
    fn entry_constructors_set_discriminator() -> Result<(), Box<dyn std::error::Error>> {
        let app = CandidateEntry::app(
            "Notepad",
            "notepad",
            "C:\\Windows\\notepad.exe",
            IconRef::new("C:\\Windows\\notepad.exe", 0),
        )
        .ok_or("app entry")?;
        assert!(!app.is_url());
        assert!(app.argument().is_none());

        let web = CandidateEntry::url(
            "Example",
            "g",
            "https://example.com/?q={word}",
            IconRef::shell_web(),
        )
        .ok_or("url entry")?;
        assert!(web.is_url());
        assert_eq!(web.icon().index(), SHELL_ICON_WEB_INDEX);
        assert!(web.icon().is_default());
        Ok(())
    }

    #[test]
    fn argument_builder_attaches_template() -> Result<(), Box<dyn std::error::Error>> {
        let entry = CandidateEntry::app("Search", "es", "search.exe", IconRef::shell_default())
            .ok_or("entry")?
            .with_argument("-s {word}");
        assert_eq!(entry.argument(), Some("-s {word}"));
        Ok(())
    }

    #[test]
    fn default_icon_points_at_shell_library() -> Result<(), Box<dyn std::error::Error>> {
        let icon = IconRef::shell_default();
        assert_eq!(icon.path(), SHELL_ICON_LIBRARY);
        assert_eq!(icon.index(), SHELL_ICON_DEFAULT_INDEX);
        assert!(icon.is_default());

        let file_icon = IconRef::new("D:\\tool\\tool.ico", 0);
        assert!(!file_icon.is_default());
        Ok(())
    }

    fn named(title: &str) -> CandidateEntry {
        CandidateEntry::app(title, "", "t", IconRef::shell_default()).expect("entry")
    }

    #[test]
    fn lists_record_the_shortcut_split() -> Result<(), Box<dyn std::error::Error>> {
        let lists = CandidateLists::new(
            vec![named("Notepad"), named("Paint")],
            vec![named("Calculator")],
            vec![named("Search")],
        );
        assert_eq!(lists.shortcut_count(), 2);
        assert_eq!(lists.executables().len(), 3);
        assert_eq!(lists.executables()[2].title(), "Calculator");
        assert_eq!(lists.web_entries().len(), 1);
        Ok(())
    }

    #[test]
    fn json_reload_keeps_the_scanned_prefix() -> Result<(), Box<dyn std::error::Error>> {
        let lists = CandidateLists::new(
            vec![named("Notepad")],
            vec![named("Calculator")],
            vec![named("Search")],
        );

        let reloaded = lists.with_fresh_json(vec![named("Terminal")], Vec::new());
        let titles: Vec<&str> = reloaded.executables().iter().map(|e| e.title()).collect();
        assert_eq!(titles, vec!["Notepad", "Terminal"]);
        assert!(reloaded.web_entries().is_empty());
        Ok(())
    }
}

//! Explicit result state handed to the presentation layer.
//!
//! Every router operation returns a [ResultSnapshot]: the active mode, the
//! effective query text and the rows to render. The presenter diffs and
//! re-renders from snapshots; nothing in the core pushes change
//! notifications.

use crate::core::entry::IconRef;

/// Which result source is active. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    WindowSwitch,
    LinkExecute,
    WebSearchScoped,
    FileExplorer,
    /// Transient: a function key macro is being applied. Snapshots returned
    /// to the presenter have already left this mode.
    MacroExecute,
}

/// One renderable result row. Icons stay lazy references; the presenter
/// resolves them off-thread through the icon resolver.
#[derive(Debug, Clone)]
pub struct ResultRow {
    title: String,
    subtitle: String,
    icon: IconRef,
}

impl ResultRow {
    pub(crate) fn new(title: String, subtitle: String, icon: IconRef) -> Self {
        ResultRow {
            title,
            subtitle,
            icon,
        }
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
    pub fn icon(&self) -> &IconRef {
        &self.icon
    }
}

/// Full result state after one router operation.
#[derive(Debug, Clone)]
pub struct ResultSnapshot {
    mode: QueryMode,
    query: String,
    rows: Vec<ResultRow>,
    selected: Option<usize>,
}

impl ResultSnapshot {
    pub(crate) fn new(
        mode: QueryMode,
        query: String,
        rows: Vec<ResultRow>,
        selected: Option<usize>,
    ) -> Self {
        ResultSnapshot {
            mode,
            query,
            rows,
            selected,
        }
    }

    // Accessors

    #[inline]
    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    /// The query text after the operation. Tab completion and explorer
    /// selection rewrite it; the presenter mirrors it into the text box.
    #[inline]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[inline]
    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    #[inline]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

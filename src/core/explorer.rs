//! Live filesystem navigation for the explorer mode.
//!
//! Turns the typed path fragment into a bounded directory, drive or filtered
//! listing, and drives Tab completion over it. Listings are rebuilt from the
//! filesystem on every call; nothing here caches.
//!
//! The `:` query lists mounted drives. A query ending in a separator lists
//! that directory: a synthetic `..` first when a parent exists, then visible
//! subdirectories, then visible files with human-readable sizes. Text after
//! the last separator filters that listing by case-insensitive substring;
//! entering a directory takes a trailing separator, which is what Tab
//! completion appends.

use crate::core::drives::{DriveEntry, ready_drives};
use crate::core::entry::IconRef;
use crate::utils::{clamp_explorer_items, ensure_trailing_separator, is_path_separator};

use humansize::{WINDOWS, format_size};
use std::fs;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

/// What one explorer row is, beyond its display strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplorerKind {
    /// The synthetic `..` row.
    Parent,
    Drive,
    Directory,
    File,
}

/// One row of an explorer listing.
#[derive(Debug, Clone)]
pub struct ExplorerEntry {
    title: String,
    subtitle: String,
    path: PathBuf,
    kind: ExplorerKind,
}

impl ExplorerEntry {
    fn new(title: String, subtitle: String, path: PathBuf, kind: ExplorerKind) -> Self {
        ExplorerEntry {
            title,
            subtitle,
            path,
            kind,
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
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn kind(&self) -> ExplorerKind {
        self.kind
    }

    #[inline]
    pub fn is_directory_like(&self) -> bool {
        matches!(
            self.kind,
            ExplorerKind::Parent | ExplorerKind::Drive | ExplorerKind::Directory
        )
    }

    /// Lazy icon for the presenter, resolved through the usual chain.
    pub fn icon(&self) -> IconRef {
        match self.kind {
            ExplorerKind::File => IconRef::new(self.path.to_string_lossy().into_owned(), 0),
            _ => IconRef::shell_default(),
        }
    }
}

/// Navigates directories and drives from typed query text.
#[derive(Debug, Clone)]
pub struct FileExplorerNavigator {
    max_items: usize,
}

impl FileExplorerNavigator {
    /// `max_items` is clamped to the supported listing bounds.
    pub fn new(max_items: usize) -> Self {
        FileExplorerNavigator {
            max_items: clamp_explorer_items(max_items),
        }
    }

    /// Lists whatever the query points at. Unknown paths list empty.
    pub fn list(&self, query: &str) -> Vec<ExplorerEntry> {
        if query == ":" {
            let mut rows: Vec<ExplorerEntry> =
                ready_drives().into_iter().map(drive_row).collect();
            rows.truncate(self.max_items);
            return rows;
        }

        let query = normalize_bare_drive(query);
        let (dir_text, fragment) = split_dir_and_fragment(&query);
        let dir = Path::new(&dir_text);
        if dir_text.is_empty() || !dir.is_dir() {
            return Vec::new();
        }

        let mut rows = Vec::new();
        if fragment.is_empty()
            && let Some(parent) = dir.parent()
            && !parent.as_os_str().is_empty()
        {
            rows.push(ExplorerEntry::new(
                "..".to_string(),
                String::new(),
                parent.to_path_buf(),
                ExplorerKind::Parent,
            ));
        }

        let (mut dirs, mut files) = read_visible(dir);
        if !fragment.is_empty() {
            let needle = fragment.to_lowercase();
            dirs.retain(|e| e.title.to_lowercase().contains(&needle));
            files.retain(|e| e.title.to_lowercase().contains(&needle));
        }
        rows.append(&mut dirs);
        rows.append(&mut files);
        rows.truncate(self.max_items);
        rows
    }

    /// Tab completion over the current listing.
    ///
    /// One match completes to its full path (with a trailing separator for
    /// directories). Several matches complete to their longest common
    /// case-insensitive prefix; when the prefix is already typed and the
    /// selected row is directory-like, completion descends into it instead,
    /// so repeated Tab walks down the tree.
    pub fn complete(&self, query: &str, selected: Option<&ExplorerEntry>) -> Option<String> {
        if query == ":" {
            let drive = selected.filter(|e| e.kind() == ExplorerKind::Drive)?;
            return Some(drive.path().to_string_lossy().into_owned());
        }

        let query = normalize_bare_drive(query);
        let (dir_text, fragment) = split_dir_and_fragment(&query);
        let matches: Vec<ExplorerEntry> = self
            .list(&query)
            .into_iter()
            .filter(|e| e.kind() != ExplorerKind::Parent)
            .collect();

        match matches.as_slice() {
            [] => None,
            [only] => Some(completed_text(&dir_text, only)),
            many => {
                let prefix = common_prefix_ci(many);
                if prefix.eq_ignore_ascii_case(&fragment) {
                    let target = selected.filter(|e| e.is_directory_like())?;
                    Some(completed_text(&dir_text, target))
                } else {
                    Some(format!("{dir_text}{prefix}"))
                }
            }
        }
    }
}

fn drive_row(drive: DriveEntry) -> ExplorerEntry {
    let root = drive.root().clone();
    ExplorerEntry::new(
        drive.label().to_string(),
        root.to_string_lossy().into_owned(),
        root,
        ExplorerKind::Drive,
    )
}

/// A bare `X:` query means the root of that drive.
fn normalize_bare_drive(query: &str) -> String {
    let mut chars = query.chars();
    if let (Some(letter), Some(':'), None) = (chars.next(), chars.next(), chars.next())
        && letter.is_ascii_alphabetic()
    {
        return format!("{query}{MAIN_SEPARATOR}");
    }
    query.to_string()
}

/// Splits query text into the directory to list and the filter fragment.
///
/// The fragment is whatever follows the last separator.
fn split_dir_and_fragment(query: &str) -> (String, String) {
    if query.chars().last().is_some_and(is_path_separator) {
        return (query.to_string(), String::new());
    }
    match query.rfind(is_path_separator) {
        Some(pos) => (query[..=pos].to_string(), query[pos + 1..].to_string()),
        None => (String::new(), query.to_string()),
    }
}

/// Reads one directory into visible subdirectory and file rows, each sorted
/// case-insensitively by name. Unreadable entries are skipped.
fn read_visible(dir: &Path) -> (Vec<ExplorerEntry>, Vec<ExplorerEntry>) {
    let mut dirs = Vec::new();
    let mut files = Vec::new();

    let Ok(read) = fs::read_dir(dir) else {
        return (dirs, files);
    };
    for entry in read.flatten() {
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if is_hidden_or_system(&entry, &metadata) {
            continue;
        }
        let title = entry.file_name().to_string_lossy().into_owned();
        if metadata.is_dir() {
            dirs.push(ExplorerEntry::new(
                title,
                String::new(),
                entry.path(),
                ExplorerKind::Directory,
            ));
        } else {
            files.push(ExplorerEntry::new(
                title,
                file_size_label(metadata.len()),
                entry.path(),
                ExplorerKind::File,
            ));
        }
    }
    dirs.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
    files.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
    (dirs, files)
}

/// Base-1024 size text for file subtitles. humansize's `WINDOWS` preset
/// writes the kilobyte unit SI-cased as `kB`; listings use `KB`.
fn file_size_label(len: u64) -> String {
    format_size(len, WINDOWS).replace("kB", "KB")
}

#[cfg(windows)]
fn is_hidden_or_system(_entry: &fs::DirEntry, metadata: &fs::Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;
    let attrs = metadata.file_attributes();
    attrs & 0x2 != 0 || attrs & 0x4 != 0
}

#[cfg(not(windows))]
fn is_hidden_or_system(entry: &fs::DirEntry, _metadata: &fs::Metadata) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn completed_text(dir_text: &str, entry: &ExplorerEntry) -> String {
    let full = entry.path().to_string_lossy().into_owned();
    let joined = if full.starts_with(dir_text) || dir_text.is_empty() {
        full
    } else {
        format!("{dir_text}{}", entry.title())
    };
    if entry.is_directory_like() {
        ensure_trailing_separator(&joined)
    } else {
        joined
    }
}

/// Longest common case-insensitive title prefix, in the casing of the first
/// match.
fn common_prefix_ci(entries: &[ExplorerEntry]) -> String {
    let first = entries[0].title();
    let mut len = first.len();
    for entry in &entries[1..] {
        let title = entry.title();
        let mut common = 0;
        for (a, b) in first.chars().zip(title.chars()) {
            if !a.eq_ignore_ascii_case(&b) {
                break;
            }
            common += a.len_utf8();
        }
        len = len.min(common);
    }
    first[..len].to_string()
}

//! The launcher index and query engine of presto.
//!
//! This module contains the non-UI pieces:
//! - [entry]: the [CandidateEntry] data model and published [CandidateLists].
//! - [aggregator]: the cancellable load pass over every candidate source.
//! - [shortcut]: `.lnk`/`.url` decoding into candidate entries.
//! - [icon]: lazy icon resolution with its fallback chain.
//! - [explorer]: live directory/drive listings and Tab completion.
//! - [filter]: case-insensitive substring filtering in source order.
//! - [drives], [windowing], [shell]: platform seams for drive enumeration,
//!   the external window set and the host launch capability.

pub mod aggregator;
pub mod drives;
pub mod entry;
pub mod explorer;
pub mod filter;
pub mod icon;
pub mod shell;
pub mod shortcut;
pub mod windowing;

pub use aggregator::{LoadPhase, SourceAggregator};
pub use entry::{CandidateEntry, CandidateLists, IconRef};
pub use explorer::{ExplorerEntry, ExplorerKind, FileExplorerNavigator};
pub use filter::{IncrementalFilter, MAX_LINK_RESULTS};
pub use icon::{IconBitmap, IconResolver};
pub use shell::{HostShell, LaunchError, LaunchRequest, SystemShell};
pub use windowing::{WindowInfo, apply_ignore_list};

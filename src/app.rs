//! Per-keystroke application logic for presto.
//!
//! This module holds the query state machine and its explicit result state:
//! - [router]: the [QueryRouter] mode machine driven by activations and text
//!   changes.
//! - [snapshot]: the [ResultSnapshot] values every router operation returns;
//!   the presentation layer renders from these and never receives callbacks.

pub mod router;
pub mod snapshot;

pub use router::{ExecuteOutcome, QueryRouter};
pub use snapshot::{QueryMode, ResultRow, ResultSnapshot};

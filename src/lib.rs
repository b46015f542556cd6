//! Internal library crate for presto.
//!
//! The shipped application is the `presto` binary (`src/main.rs`).
//!
//! This library exists to share code between targets (binary, tests) and to
//! keep modules organized. The query engine lives in [core], the per-keystroke
//! state machine in [app], and configuration in [config]. The visual shell,
//! global hotkeys and the live window enumerator are host concerns wired in
//! by the embedder.

pub mod app;
pub mod config;
pub mod core;
pub mod utils;

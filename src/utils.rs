//! Miscellaneous utility functions for presto.
//!
//! This module holds the [helpers] submodule, which provides commonly used
//! utilities such as:
//! - Windows-style `%VAR%` environment expansion
//! - Path separator helpers for completion and navigation
//! - Clamping the explorer listing limit to safe values
//!
//! [cli] handles the binary's argument parsing.

pub mod cli;
pub mod helpers;

pub use helpers::{
    DEFAULT_EXPLORER_ITEMS, MAX_EXPLORER_ITEMS, MIN_EXPLORER_ITEMS, clamp_explorer_items,
    ensure_trailing_separator, expand_env_vars, expand_env_vars_with, get_home,
    is_path_separator,
};

//! Configuration for presto.
//!
//! - [settings]: the TOML-backed [Settings] struct handed explicitly to the
//!   aggregator and router at construction.
//! - [lists]: the optional JSON source lists (web searches, UWP apps, window
//!   ignore titles, function key macros).

pub mod lists;
pub mod settings;

pub use lists::{
    FunctionKey, MacroAction, MacroBindings, load_ignore_titles, load_macro_bindings,
    load_uwp_entries, load_web_entries,
};
pub use settings::{OnBusyActivation, Settings};

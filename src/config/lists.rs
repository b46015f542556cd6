//! JSON-backed source lists for presto.
//!
//! Four lists live in the configured lists directory, all optional:
//! - `search_list.json`: web search templates `{name, key, uri}`
//! - `uwp_list.json`: UWP app entries `{name, key, uri}`
//! - `ignore_list.json`: window titles to drop from the switcher `{name}`
//! - `func_list.json`: function key macros `{key, execute: {func, value}}`
//!
//! A missing or malformed file is an empty contribution, never an error:
//! the launcher must come up with whatever lists happen to be present.
//!
//! Macro actions are parsed once at load into the closed [MacroAction] enum;
//! unknown function names fail closed (the binding is skipped with a warning)
//! instead of being matched by string heuristics at keypress time.

use crate::core::entry::{CandidateEntry, IconRef};

use phf::phf_map;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub const SEARCH_LIST_FILE: &str = "search_list.json";
pub const UWP_LIST_FILE: &str = "uwp_list.json";
pub const IGNORE_LIST_FILE: &str = "ignore_list.json";
pub const FUNC_LIST_FILE: &str = "func_list.json";

/// One record of `search_list.json` / `uwp_list.json`.
#[derive(Deserialize, Debug)]
struct ExternalRecord {
    #[serde(default)]
    name: String,
    #[serde(default)]
    key: String,
    #[serde(default)]
    uri: String,
}

/// One record of `ignore_list.json`.
#[derive(Deserialize, Debug)]
struct IgnoreRecord {
    #[serde(default)]
    name: String,
}

/// One record of `func_list.json`.
#[derive(Deserialize, Debug)]
struct RawMacro {
    #[serde(default)]
    key: String,
    #[serde(default)]
    execute: Option<RawExecute>,
}

#[derive(Deserialize, Debug)]
struct RawExecute {
    #[serde(default)]
    func: String,
    #[serde(default)]
    value: String,
}

/// The function keys a macro can bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKey {
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
}

static FUNCTION_KEYS: phf::Map<&'static str, FunctionKey> = phf_map! {
    "f1" => FunctionKey::F1,
    "f2" => FunctionKey::F2,
    "f3" => FunctionKey::F3,
    "f4" => FunctionKey::F4,
    "f5" => FunctionKey::F5,
    "f6" => FunctionKey::F6,
    "f7" => FunctionKey::F7,
    "f8" => FunctionKey::F8,
    "f9" => FunctionKey::F9,
    "f10" => FunctionKey::F10,
    "f11" => FunctionKey::F11,
    "f12" => FunctionKey::F12,
};

impl FunctionKey {
    /// Parses a key name such as "F5", case-insensitive.
    pub fn parse(name: &str) -> Option<FunctionKey> {
        FUNCTION_KEYS.get(name.to_lowercase().as_str()).copied()
    }
}

/// What a bound function key does. Closed set, extended here when new
/// macro functions are introduced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroAction {
    /// Rewrite the query text to this path and route it as explorer input.
    NavigateToPath(String),
}

/// The parsed function key bindings of `func_list.json`.
#[derive(Debug, Default)]
pub struct MacroBindings {
    bindings: HashMap<FunctionKey, MacroAction>,
}

impl MacroBindings {
    #[inline]
    pub fn get(&self, key: FunctionKey) -> Option<&MacroAction> {
        self.bindings.get(&key)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }
}

/// Loads the web search templates, in file order.
pub fn load_web_entries(lists_dir: &Path) -> Vec<CandidateEntry> {
    read_json_list::<ExternalRecord>(&lists_dir.join(SEARCH_LIST_FILE))
        .into_iter()
        .filter_map(|rec| CandidateEntry::url(rec.name, rec.key, rec.uri, IconRef::shell_web()))
        .collect()
}

/// Loads the UWP app entries, in file order.
pub fn load_uwp_entries(lists_dir: &Path) -> Vec<CandidateEntry> {
    read_json_list::<ExternalRecord>(&lists_dir.join(UWP_LIST_FILE))
        .into_iter()
        .filter_map(|rec| {
            CandidateEntry::app(rec.name, rec.key, rec.uri, IconRef::shell_default())
        })
        .collect()
}

/// Loads the window titles excluded from the switcher list.
pub fn load_ignore_titles(lists_dir: &Path) -> Vec<String> {
    read_json_list::<IgnoreRecord>(&lists_dir.join(IGNORE_LIST_FILE))
        .into_iter()
        .filter(|rec| !rec.name.is_empty())
        .map(|rec| rec.name)
        .collect()
}

/// Loads and parses the function key macros.
///
/// A record with an unparseable key, a missing execute block, an unknown
/// function name or an empty value contributes nothing. Later records win
/// when two bind the same key.
pub fn load_macro_bindings(lists_dir: &Path) -> MacroBindings {
    let mut bindings = HashMap::new();
    for raw in read_json_list::<RawMacro>(&lists_dir.join(FUNC_LIST_FILE)) {
        let Some(key) = FunctionKey::parse(&raw.key) else {
            tracing::warn!("func_list: unknown key {:?}, skipping", raw.key);
            continue;
        };
        let Some(execute) = raw.execute else {
            continue;
        };
        let Some(action) = parse_macro_action(&execute) else {
            continue;
        };
        bindings.insert(key, action);
    }
    MacroBindings { bindings }
}

fn parse_macro_action(execute: &RawExecute) -> Option<MacroAction> {
    // "PATH_MARCO" is the legacy spelling, kept so old config files keep working.
    match execute.func.to_uppercase().as_str() {
        "PATH_MACRO" | "PATH_MARCO" => {
            if execute.value.is_empty() {
                None
            } else {
                Some(MacroAction::NavigateToPath(execute.value.clone()))
            }
        }
        other => {
            tracing::warn!("func_list: unknown function {:?}, skipping", other);
            None
        }
    }
}

/// Reads one JSON list file into records, treating every failure as an
/// empty list.
fn read_json_list<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!("list {} not read: {}", path.display(), e);
            return Vec::new();
        }
    };
    match serde_json::from_str::<Vec<T>>(&content) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!("list {} malformed: {}", path.display(), e);
            Vec::new()
        }
    }
}

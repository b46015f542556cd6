//! Helpers for presto.
//!
//! This module defines constants for the minimum, default, and maximum file explorer
//! listing limits used throughout presto. It also provides utility functions:
//! - Windows-style `%VAR%` environment expansion with an injectable lookup
//! - Path separator helpers for completion and navigation
//! - Home directory discovery
//! - Clamping the explorer listing count to safe values
//!
//! These helpers are used throughout presto.

use std::path::{MAIN_SEPARATOR, PathBuf};

/// The minimum explorer listing limit which is set to if the maximum is underset in presto.toml.
pub const MIN_EXPLORER_ITEMS: usize = 10;
/// The default explorer listing limit. Can be overwritten in the presto.toml.
pub const DEFAULT_EXPLORER_ITEMS: usize = 40;
/// The maximum explorer listing limit which is possible.
pub const MAX_EXPLORER_ITEMS: usize = 100;

/// Expands `%VAR%` references against the process environment.
///
/// Unresolved references are kept verbatim, matching the behavior of the
/// native expansion call shortcut targets were written for.
pub fn expand_env_vars(input: &str) -> String {
    expand_env_vars_with(input, |name| std::env::var(name).ok())
}

/// Expands `%VAR%` references with a caller-supplied lookup.
///
/// A `%` that does not open a resolvable `%VAR%` pair is emitted unchanged,
/// and the closing `%` of a failed pair stays eligible to open the next one.
pub fn expand_env_vars_with<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if !input.contains('%') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        match after.find('%') {
            Some(end) => {
                let name = &after[..end];
                if !name.is_empty()
                    && let Some(value) = lookup(name)
                {
                    out.push_str(&value);
                    rest = &after[end + 1..];
                } else {
                    // Keep the text up to (not including) the closing '%' so it
                    // can still open a later pair.
                    out.push('%');
                    out.push_str(name);
                    rest = &after[end..];
                }
            }
            None => {
                out.push('%');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Returns true if `c` separates path components in typed query text.
///
/// Both separators are accepted on every platform since shortcut files and
/// typed queries mix them freely.
#[inline]
pub fn is_path_separator(c: char) -> bool {
    c == '\\' || c == '/'
}

/// Appends the platform separator unless the text already ends with one.
pub fn ensure_trailing_separator(text: &str) -> String {
    if text.chars().last().is_some_and(is_path_separator) {
        text.to_string()
    } else {
        let mut out = String::with_capacity(text.len() + 1);
        out.push_str(text);
        out.push(MAIN_SEPARATOR);
        out
    }
}

/// Util function to get the home directory.
/// Used by the config path discovery in config/settings.rs.
pub fn get_home() -> Option<PathBuf> {
    dirs::home_dir()
}

/// Safely clamp the explorer listing limit.
///
/// Out-of-range values from presto.toml are pulled back into
/// [MIN_EXPLORER_ITEMS]..=[MAX_EXPLORER_ITEMS].
pub fn clamp_explorer_items(value: usize) -> usize {
    let clamped = value.clamp(MIN_EXPLORER_ITEMS, MAX_EXPLORER_ITEMS);
    if clamped != value {
        tracing::warn!(
            "explorer_max_items={} out of range ({}..={}), clamped to {}",
            value,
            MIN_EXPLORER_ITEMS,
            MAX_EXPLORER_ITEMS,
            clamped
        );
    }
    clamped
}

/// Helper utils integration tests
#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::error;

    fn lookup_from(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_expand_known_variable() -> Result<(), Box<dyn error::Error>> {
        let vars = lookup_from(&[("SystemRoot", r"C:\Windows")]);
        let expanded =
            expand_env_vars_with(r"%SystemRoot%\System32\shell32.dll", |n| {
                vars.get(n).cloned()
            });
        assert_eq!(expanded, r"C:\Windows\System32\shell32.dll");
        Ok(())
    }

    #[test]
    fn test_unknown_variable_kept_verbatim() -> Result<(), Box<dyn error::Error>> {
        let expanded = expand_env_vars_with("%NOPE%\\tool.exe", |_| None);
        assert_eq!(expanded, "%NOPE%\\tool.exe");
        Ok(())
    }

    #[test]
    fn test_double_percent_is_not_an_escape() -> Result<(), Box<dyn error::Error>> {
        let expanded = expand_env_vars_with("100%% done", |_| None);
        assert_eq!(expanded, "100%% done");
        Ok(())
    }

    #[test]
    fn test_failed_pair_closing_percent_reopens() -> Result<(), Box<dyn error::Error>> {
        // The '%' closing the failed %a pair opens the %b% pair.
        let vars = lookup_from(&[("b", "beta")]);
        let expanded = expand_env_vars_with("%a%b%", |n| vars.get(n).cloned());
        assert_eq!(expanded, "%abeta");
        Ok(())
    }

    #[test]
    fn test_expand_mixed_text() -> Result<(), Box<dyn error::Error>> {
        let vars = lookup_from(&[("USERPROFILE", "/home/crab")]);
        let expanded = expand_env_vars_with("before %USERPROFILE% after", |n| {
            vars.get(n).cloned()
        });
        assert_eq!(expanded, "before /home/crab after");
        Ok(())
    }

    #[test]
    fn test_no_percent_passthrough() -> Result<(), Box<dyn error::Error>> {
        assert_eq!(expand_env_vars_with("plain text", |_| None), "plain text");
        Ok(())
    }

    #[test]
    fn test_trailing_separator_appended_once() -> Result<(), Box<dyn error::Error>> {
        let with_sep = ensure_trailing_separator("dir");
        assert!(with_sep.ends_with(MAIN_SEPARATOR));
        assert_eq!(ensure_trailing_separator(&with_sep), with_sep);
        assert_eq!(ensure_trailing_separator("dir/"), "dir/");
        Ok(())
    }

    #[test]
    fn test_clamp_explorer_items_bounds() -> Result<(), Box<dyn error::Error>> {
        assert_eq!(clamp_explorer_items(0), MIN_EXPLORER_ITEMS);
        assert_eq!(clamp_explorer_items(55), 55);
        assert_eq!(clamp_explorer_items(10_000), MAX_EXPLORER_ITEMS);
        Ok(())
    }
}

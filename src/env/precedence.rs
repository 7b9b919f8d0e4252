//! Per-name source selection: file table vs process environment.
//!
//! The environment is read through an injected closure so the policy can
//! be exercised with synthetic environments; the codec passes
//! `std::env::var`. An environment variable only counts when it is set
//! and non-empty.

use crate::env::FlatTable;
use crate::options::DecodeOptions;

/// Resolve the value for `name` according to the three decode flags.
pub fn lookup(
    name: &str,
    table: &FlatTable,
    env_get: impl Fn(&str) -> Option<String>,
    opts: &DecodeOptions,
) -> Option<String> {
    if !opts.automatic_env {
        return table.get(name).cloned();
    }

    if opts.prefer_file_over_env {
        if let Some(value) = table.get(name) {
            return Some(value.clone());
        }
        return env_get(name).filter(|value| !value.is_empty());
    }

    match env_get(name).filter(|value| !value.is_empty()) {
        Some(value) => Some(value),
        None => table.get(name).cloned(),
    }
}

//! Human-readable entity identifiers.

use regex::Regex;

use crate::util::{to_base36, unix_millis_now};

/// Maximum number of characters kept from the entity name.
const SLUG_MAX_LEN: usize = 20;

/// Reduce a display name to the slug used inside ids.
///
/// Lowercases, drops anything that is not `[a-z0-9]` or whitespace, collapses
/// whitespace runs into `_`, and keeps the first 20 characters.
///
/// # Examples
///
/// ```
/// use taskflow_core::models::slugify;
///
/// assert_eq!(slugify("Acme Corp!"), "acme_corp");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let disallowed = Regex::new(r"[^a-z0-9\s]").expect("Invalid regex");
    let whitespace = Regex::new(r"\s+").expect("Invalid regex");

    let lowered = name.to_lowercase();
    let cleaned = disallowed.replace_all(&lowered, "");
    whitespace
        .replace_all(&cleaned, "_")
        .chars()
        .take(SLUG_MAX_LEN)
        .collect()
}

/// Build an id of the form `<prefix>_<slug>_<base36 millis>`.
#[must_use]
pub fn readable_id_at(prefix: &str, name: &str, millis: i64) -> String {
    let suffix = to_base36(u64::try_from(millis).unwrap_or_default());
    format!("{prefix}_{}_{suffix}", slugify(name))
}

/// Generate a fresh readable id using the current time.
#[must_use]
pub fn generate_readable_id(prefix: &str, name: &str) -> String {
    readable_id_at(prefix, name, unix_millis_now())
}

/// Generate a readable id that `is_taken` does not report as already used.
///
/// The time component is advanced one millisecond at a time until the id is
/// free, so ids created in quick succession never collide within a mapping.
pub fn unique_readable_id(prefix: &str, name: &str, is_taken: impl Fn(&str) -> bool) -> String {
    let mut millis = unix_millis_now();
    loop {
        let candidate = readable_id_at(prefix, name, millis);
        if !is_taken(&candidate) {
            return candidate;
        }
        millis += 1;
    }
}
